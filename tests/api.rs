mod helpers;

use chrono::Utc;
use helpers::setup::spawn_app;
use helpers::utils::{seed_dose, targets};
use medtrack_api::CRON_SECRET_HEADER;
use medtrack_api_structs::{get_service_health, run_reminder_cycle};
use medtrack_domain::{ChannelOutcome, ReminderTier};
use reqwest::StatusCode;

#[actix_web::main]
#[test]
async fn test_status_ok() {
    let app = spawn_app().await;
    let res = reqwest::get(format!("{}/", app.address))
        .await
        .expect("Expected status request to succeed");
    assert_eq!(res.status(), StatusCode::OK);
    let body: get_service_health::APIResponse = res.json().await.unwrap();
    assert_eq!(body.message, "Yo! We are up!\r\n");
}

#[actix_web::main]
#[test]
async fn test_run_reminders_requires_cron_secret() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let url = format!("{}/reminders/run", app.address);

    let res = client.post(&url).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client
        .post(&url)
        .header(CRON_SECRET_HEADER, "not-the-secret")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client
        .post(&url)
        .header(CRON_SECRET_HEADER, &app.config.cron_secret)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[actix_web::main]
#[test]
async fn test_run_reminders_sends_due_reminder_once() {
    let app = spawn_app().await;
    let dose = seed_dose(&app.ctx, Utc::now(), targets("player-7", "sam@example.com")).await;

    let client = reqwest::Client::new();
    let url = format!("{}/reminders/run", app.address);

    let res = client
        .post(&url)
        .header(CRON_SECRET_HEADER, &app.config.cron_secret)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: run_reminder_cycle::APIResponse = res.json().await.unwrap();
    assert_eq!(body.summary.scanned, 1);
    assert_eq!(body.summary.claimed, 1);
    assert_eq!(body.summary.notifications_sent, 1);
    assert_eq!(body.summary.errors, 0);
    let outcome = &body.summary.outcomes[0];
    assert_eq!(outcome.dose_id, dose.id);
    assert_eq!(outcome.tier, ReminderTier::AtTime);
    assert_eq!(outcome.push, ChannelOutcome::Sent);
    assert_eq!(outcome.email, ChannelOutcome::Sent);

    let res = client
        .post(&url)
        .header(CRON_SECRET_HEADER, &app.config.cron_secret)
        .send()
        .await
        .unwrap();
    let body: run_reminder_cycle::APIResponse = res.json().await.unwrap();
    assert_eq!(body.summary.scanned, 1);
    assert_eq!(body.summary.notifications_sent, 0);

    let pushes = app.push.sent();
    assert_eq!(pushes.len(), 1);
    assert_eq!(pushes[0].target, "player-7");
    assert_eq!(pushes[0].message.body, "Time to take Lisinopril");
    assert_eq!(app.email.sent().len(), 1);

    let notifications = app
        .ctx
        .repos
        .notifications
        .find_by_user(&dose.user_id)
        .await
        .unwrap();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].id, outcome.notification_id);
}
