use super::dispatch_notification::NotificationDispatcher;
use super::duplicate_guard::DuplicateGuard;
use crate::shared::{
    auth::protect_cron_route,
    usecase::{execute, UseCase},
};
use crate::error::MedtrackError;
use actix_web::{web, HttpRequest, HttpResponse};
use medtrack_api_structs::run_reminder_cycle::APIResponse;
use medtrack_domain::{
    reminder_lookback, CalendarDay, DispatchOutcome, ReminderCandidate, ReminderCycleSummary,
    ReminderTier,
};
use medtrack_infra::MedtrackContext;
use tracing::{error, info};

pub async fn run_reminder_cycle_controller(
    http_req: HttpRequest,
    ctx: web::Data<MedtrackContext>,
) -> Result<HttpResponse, MedtrackError> {
    protect_cron_route(&http_req, &ctx)?;

    let usecase = RunReminderCycleUseCase {
        trigger: ReminderCycleTrigger::Http,
    };
    execute(usecase, &ctx)
        .await
        .map(|summary| HttpResponse::Ok().json(APIResponse::new(summary)))
        .map_err(MedtrackError::from)
}

/// Runs a single reminder pass outside of any http request
pub async fn run_reminder_pass(
    ctx: &MedtrackContext,
    trigger: ReminderCycleTrigger,
) -> Result<ReminderCycleSummary, UseCaseError> {
    execute(RunReminderCycleUseCase { trigger }, ctx).await
}

#[derive(Debug)]
pub enum UseCaseError {
    StorageError,
}

impl From<UseCaseError> for MedtrackError {
    fn from(e: UseCaseError) -> Self {
        match e {
            UseCaseError::StorageError => Self::InternalError,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReminderCycleTrigger {
    /// Started from the command line, runs once and exits
    Oneshot,
    /// The minutely job of the server
    JobScheduler,
    /// An external scheduler calling the cron route
    Http,
}

/// Scans today's pending doses and sends every reminder tier that is due.
///
/// Only failing to fetch the doses fails the pass. Anything going wrong while
/// processing a single dose is logged and counted in the summary, and the pass
/// moves on to the next dose.
#[derive(Debug)]
pub struct RunReminderCycleUseCase {
    pub trigger: ReminderCycleTrigger,
}

#[async_trait::async_trait(?Send)]
impl UseCase for RunReminderCycleUseCase {
    type Response = ReminderCycleSummary;

    type Error = UseCaseError;

    const NAME: &'static str = "RunReminderCycle";

    async fn execute(&mut self, ctx: &MedtrackContext) -> Result<Self::Response, Self::Error> {
        let now = ctx.sys.get_utc_now();
        let day = CalendarDay::containing(now, &ctx.config.timezone);

        let candidates = ctx
            .repos
            .doses
            .fetch_pending_for_date(&day, reminder_lookback(ctx.config.tolerance_minutes))
            .await
            .map_err(|e| {
                error!("Unable to fetch pending doses for {}: {:?}", day.date, e);
                UseCaseError::StorageError
            })?;

        let mut summary = ReminderCycleSummary::new(day.date);
        summary.scanned = candidates.len();

        let guard = DuplicateGuard::new(ctx);
        let dispatcher = NotificationDispatcher::new(ctx);

        for candidate in &candidates {
            let tier = match candidate.decide(now, ctx.config.tolerance_minutes) {
                Some(tier) => tier,
                None => continue,
            };
            summary.due += 1;

            match guard.claim(candidate.dose_id(), tier).await {
                Ok(true) => summary.claimed += 1,
                Ok(false) => {
                    summary.contended += 1;
                    continue;
                }
                Err(e) => {
                    error!(
                        dose_id = %candidate.dose_id(),
                        tier = tier.as_str(),
                        "Unable to claim reminder: {:?}",
                        e
                    );
                    summary.errors += 1;
                    continue;
                }
            }

            match dispatch(ctx, &dispatcher, candidate, tier).await {
                Ok(outcome) => {
                    summary.notifications_sent += 1;
                    summary.outcomes.push(outcome);
                }
                Err(e) => {
                    error!(
                        dose_id = %candidate.dose_id(),
                        tier = tier.as_str(),
                        "Unable to dispatch reminder: {:?}",
                        e
                    );
                    summary.errors += 1;
                }
            }
        }

        info!(
            trigger = ?self.trigger,
            date = %day.date,
            scanned = summary.scanned,
            due = summary.due,
            claimed = summary.claimed,
            contended = summary.contended,
            notifications_sent = summary.notifications_sent,
            delivered_externally = summary.delivered_externally(),
            channel_failures = summary.channel_failures(),
            errors = summary.errors,
            "Reminder cycle completed"
        );

        Ok(summary)
    }
}

async fn dispatch(
    ctx: &MedtrackContext,
    dispatcher: &NotificationDispatcher,
    candidate: &ReminderCandidate,
    tier: ReminderTier,
) -> anyhow::Result<DispatchOutcome> {
    let targets = ctx
        .repos
        .doses
        .get_user_channel_targets(candidate.user_id())
        .await?;
    let outcome = dispatcher.send(candidate, tier, &targets).await?;
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_helpers::*;
    use chrono::{DateTime, NaiveDate, TimeZone, Utc};
    use medtrack_domain::{
        ChannelOutcome, ChannelTargets, DoseOccurrence, DoseStatus, Medication,
        NotificationPreference, TierPreferences, ID,
    };
    use medtrack_infra::IDoseRepo;
    use std::sync::Arc;

    async fn run(t: &TestContext) -> ReminderCycleSummary {
        run_reminder_pass(&t.ctx, ReminderCycleTrigger::Oneshot)
            .await
            .expect("Reminder cycle to succeed")
    }

    async fn notification_titles(t: &TestContext, user_id: &ID) -> Vec<String> {
        t.ctx
            .repos
            .notifications
            .find_by_user(user_id)
            .await
            .unwrap()
            .into_iter()
            .map(|n| n.title)
            .collect()
    }

    #[tokio::test]
    async fn sends_at_time_reminder_once() {
        let mut t = setup();
        let (dose, _) = seed_dose(&t.ctx, nine_am(), Default::default(), all_targets()).await;

        t.set_time(minutes_after_nine(2));
        let summary = run(&t).await;
        assert_eq!(summary.scanned, 1);
        assert_eq!(summary.due, 1);
        assert_eq!(summary.claimed, 1);
        assert_eq!(summary.notifications_sent, 1);
        assert_eq!(summary.outcomes[0].tier, ReminderTier::AtTime);
        assert_eq!(summary.outcomes[0].push, ChannelOutcome::Sent);
        assert_eq!(summary.outcomes[0].email, ChannelOutcome::Sent);

        // Next minute is still inside the at time window
        t.set_time(minutes_after_nine(3));
        let summary = run(&t).await;
        assert_eq!(summary.due, 0);
        assert_eq!(summary.notifications_sent, 0);

        assert_eq!(
            notification_titles(&t, &dose.user_id).await,
            vec!["Medication reminder".to_string()]
        );
        assert_eq!(t.push.sent().len(), 1);
        assert_eq!(t.email.sent().len(), 1);
    }

    #[tokio::test]
    async fn sends_every_tier_while_dose_is_missed() {
        let mut t = setup();
        let (dose, _) = seed_dose(&t.ctx, nine_am(), Default::default(), all_targets()).await;

        for minute in 0..70 {
            t.set_time(minutes_after_nine(minute));
            run(&t).await;
        }

        let stored = t.ctx.repos.doses.find(&dose.id).await.unwrap();
        assert_eq!(stored.sent.get(ReminderTier::AtTime), Some(nine_am()));
        assert_eq!(stored.sent.get(ReminderTier::Plus10), Some(minutes_after_nine(5)));
        assert_eq!(stored.sent.get(ReminderTier::Plus20), Some(minutes_after_nine(15)));
        assert_eq!(stored.sent.get(ReminderTier::Plus30), Some(minutes_after_nine(25)));
        assert_eq!(stored.sent.get(ReminderTier::Plus60), Some(minutes_after_nine(55)));

        let titles = notification_titles(&t, &dose.user_id).await;
        assert_eq!(titles.len(), 5);
        assert_eq!(
            titles
                .iter()
                .filter(|title| *title == "Missed dose reminder")
                .count(),
            4
        );
        let bodies: Vec<String> = t.push.sent().into_iter().map(|p| p.message.body).collect();
        assert_eq!(
            bodies,
            vec![
                "Time to take Metformin (500mg)".to_string(),
                "Reminder: you haven't taken Metformin (5 min overdue)".to_string(),
                "Reminder: you haven't taken Metformin (15 min overdue)".to_string(),
                "Reminder: you haven't taken Metformin (25 min overdue)".to_string(),
                "Reminder: you haven't taken Metformin (55 min overdue)".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn stops_reminding_once_dose_is_taken() {
        let mut t = setup();
        let (dose, _) = seed_dose(&t.ctx, nine_am(), Default::default(), all_targets()).await;

        t.set_time(minutes_after_nine(1));
        run(&t).await;
        t.ctx
            .repos
            .doses
            .update_status(&dose.id, DoseStatus::Taken)
            .await
            .unwrap();

        for minute in 2..70 {
            t.set_time(minutes_after_nine(minute));
            let summary = run(&t).await;
            assert_eq!(summary.scanned, 0);
        }
        assert_eq!(notification_titles(&t, &dose.user_id).await.len(), 1);
    }

    #[tokio::test]
    async fn respects_disabled_tiers_and_master_switch() {
        let mut t = setup();
        let only_overdue = NotificationPreference {
            tiers: TierPreferences {
                at_time: false,
                ..Default::default()
            },
            ..Default::default()
        };
        let (dose, _) = seed_dose(&t.ctx, nine_am(), only_overdue, all_targets()).await;
        let muted = NotificationPreference {
            notifications_enabled: false,
            ..Default::default()
        };
        let (muted_dose, _) = seed_dose(&t.ctx, nine_am(), muted, all_targets()).await;

        t.set_time(minutes_after_nine(2));
        let summary = run(&t).await;
        assert_eq!(summary.scanned, 1);
        assert_eq!(summary.due, 0);

        t.set_time(minutes_after_nine(10));
        let summary = run(&t).await;
        assert_eq!(summary.notifications_sent, 1);
        assert_eq!(summary.outcomes[0].tier, ReminderTier::Plus10);

        assert!(notification_titles(&t, &muted_dose.user_id).await.is_empty());
        assert_eq!(notification_titles(&t, &dose.user_id).await.len(), 1);
    }

    #[tokio::test]
    async fn overlapping_passes_do_not_duplicate() {
        let mut t = setup();
        let (dose, _) = seed_dose(&t.ctx, nine_am(), Default::default(), all_targets()).await;
        t.set_time(minutes_after_nine(1));

        let (first, second) = futures::join!(
            run_reminder_pass(&t.ctx, ReminderCycleTrigger::JobScheduler),
            run_reminder_pass(&t.ctx, ReminderCycleTrigger::Http)
        );
        let (first, second) = (first.unwrap(), second.unwrap());

        assert_eq!(first.claimed + second.claimed, 1);
        assert_eq!(first.notifications_sent + second.notifications_sent, 1);
        assert_eq!(notification_titles(&t, &dose.user_id).await.len(), 1);
        assert_eq!(t.push.sent().len(), 1);
    }

    /// Delegates to an inmemory repo, with hooks to inject failures and races
    struct ScriptedDoseRepo {
        inner: Arc<dyn IDoseRepo>,
        failing_targets_for: Option<ID>,
        take_doses_after_fetch: bool,
        fail_fetch: bool,
    }

    impl ScriptedDoseRepo {
        fn wrap(ctx: &medtrack_infra::MedtrackContext) -> Self {
            Self {
                inner: ctx.repos.doses.clone(),
                failing_targets_for: None,
                take_doses_after_fetch: false,
                fail_fetch: false,
            }
        }
    }

    #[async_trait::async_trait]
    impl IDoseRepo for ScriptedDoseRepo {
        async fn fetch_pending_for_date(
            &self,
            day: &CalendarDay,
            lookback: chrono::Duration,
        ) -> anyhow::Result<Vec<ReminderCandidate>> {
            if self.fail_fetch {
                return Err(anyhow::anyhow!("database is down"));
            }
            let candidates = self.inner.fetch_pending_for_date(day, lookback).await?;
            if self.take_doses_after_fetch {
                for candidate in &candidates {
                    self.inner
                        .update_status(candidate.dose_id(), DoseStatus::Taken)
                        .await?;
                }
            }
            Ok(candidates)
        }

        async fn claim_tier(
            &self,
            dose_id: &ID,
            tier: ReminderTier,
            sent_at: DateTime<Utc>,
        ) -> anyhow::Result<bool> {
            self.inner.claim_tier(dose_id, tier, sent_at).await
        }

        async fn get_user_channel_targets(&self, user_id: &ID) -> anyhow::Result<ChannelTargets> {
            if self.failing_targets_for.as_ref() == Some(user_id) {
                return Err(anyhow::anyhow!("query timed out"));
            }
            self.inner.get_user_channel_targets(user_id).await
        }

        async fn find(&self, dose_id: &ID) -> Option<DoseOccurrence> {
            self.inner.find(dose_id).await
        }

        async fn insert(&self, dose: &DoseOccurrence) -> anyhow::Result<()> {
            self.inner.insert(dose).await
        }

        async fn update_status(&self, dose_id: &ID, status: DoseStatus) -> anyhow::Result<()> {
            self.inner.update_status(dose_id, status).await
        }

        async fn insert_medication(&self, medication: &Medication) -> anyhow::Result<()> {
            self.inner.insert_medication(medication).await
        }

        async fn save_user_settings(
            &self,
            user_id: &ID,
            preferences: &NotificationPreference,
            targets: &ChannelTargets,
        ) -> anyhow::Result<()> {
            self.inner
                .save_user_settings(user_id, preferences, targets)
                .await
        }
    }

    #[tokio::test]
    async fn failing_dose_does_not_stop_the_pass() {
        let mut t = setup();
        let (broken, _) = seed_dose(&t.ctx, nine_am(), Default::default(), all_targets()).await;
        let (healthy, _) = seed_dose(&t.ctx, nine_am(), Default::default(), all_targets()).await;

        let mut repo = ScriptedDoseRepo::wrap(&t.ctx);
        repo.failing_targets_for = Some(broken.user_id.clone());
        t.ctx.repos.doses = Arc::new(repo);

        t.set_time(minutes_after_nine(1));
        let summary = run(&t).await;
        assert_eq!(summary.scanned, 2);
        assert_eq!(summary.claimed, 2);
        assert_eq!(summary.errors, 1);
        assert_eq!(summary.notifications_sent, 1);
        assert_eq!(summary.outcomes[0].dose_id, healthy.id);
        assert_eq!(notification_titles(&t, &healthy.user_id).await.len(), 1);
        assert!(notification_titles(&t, &broken.user_id).await.is_empty());
    }

    #[tokio::test]
    async fn skips_doses_resolved_after_fetch() {
        let mut t = setup();
        let (dose, _) = seed_dose(&t.ctx, nine_am(), Default::default(), all_targets()).await;

        let mut repo = ScriptedDoseRepo::wrap(&t.ctx);
        repo.take_doses_after_fetch = true;
        t.ctx.repos.doses = Arc::new(repo);

        t.set_time(minutes_after_nine(1));
        let summary = run(&t).await;
        assert_eq!(summary.due, 1);
        assert_eq!(summary.claimed, 0);
        assert_eq!(summary.contended, 1);
        assert!(notification_titles(&t, &dose.user_id).await.is_empty());
        assert!(t.push.sent().is_empty());
    }

    #[tokio::test]
    async fn failing_fetch_fails_the_pass() {
        let mut t = setup();
        let mut repo = ScriptedDoseRepo::wrap(&t.ctx);
        repo.fail_fetch = true;
        t.ctx.repos.doses = Arc::new(repo);

        let res = run_reminder_pass(&t.ctx, ReminderCycleTrigger::Oneshot).await;
        assert!(matches!(res, Err(UseCaseError::StorageError)));
    }

    #[tokio::test]
    async fn catches_up_missed_tiers_one_per_pass() {
        let mut t = setup();
        let (dose, _) = seed_dose(&t.ctx, nine_am(), Default::default(), all_targets()).await;

        // Nothing ran at 09:00, the first pass happens inside both the +10 and +20 windows
        t.set_time(minutes_after_nine(15));
        let summary = run(&t).await;
        assert_eq!(summary.outcomes[0].tier, ReminderTier::Plus10);

        let summary = run(&t).await;
        assert_eq!(summary.outcomes[0].tier, ReminderTier::Plus20);

        let summary = run(&t).await;
        assert_eq!(summary.due, 0);

        let stored = t.ctx.repos.doses.find(&dose.id).await.unwrap();
        assert!(!stored.sent.is_sent(ReminderTier::AtTime));
    }

    #[tokio::test]
    async fn keeps_reminding_about_late_evening_dose_after_midnight() {
        let mut t = setup();
        let late_evening = Utc.with_ymd_and_hms(2024, 1, 9, 23, 55, 0).unwrap();
        let (dose, _) = seed_dose(&t.ctx, late_evening, Default::default(), all_targets()).await;

        t.set_time(late_evening + chrono::Duration::minutes(1));
        let summary = run(&t).await;
        assert_eq!(summary.outcomes[0].tier, ReminderTier::AtTime);

        t.set_time(late_evening + chrono::Duration::minutes(11));
        let summary = run(&t).await;
        assert_eq!(summary.date, NaiveDate::from_ymd_opt(2024, 1, 10).unwrap());
        assert_eq!(summary.scanned, 1);
        assert_eq!(summary.notifications_sent, 1);
        assert_eq!(summary.outcomes[0].tier, ReminderTier::Plus10);

        t.set_time(late_evening + chrono::Duration::minutes(60));
        let summary = run(&t).await;
        assert_eq!(summary.outcomes[0].tier, ReminderTier::Plus60);
        assert_eq!(summary.delivered_externally(), 1);

        t.set_time(late_evening + chrono::Duration::minutes(66));
        let summary = run(&t).await;
        assert_eq!(summary.due, 0);

        let stored = t.ctx.repos.doses.find(&dose.id).await.unwrap();
        assert!(stored.sent.is_sent(ReminderTier::Plus60));
        assert!(!stored.sent.is_sent(ReminderTier::Plus20));
    }

    #[tokio::test]
    async fn only_scans_doses_of_the_local_day() {
        let mut t = setup();
        let yesterday = nine_am() - chrono::Duration::days(1);
        seed_dose(&t.ctx, yesterday, Default::default(), all_targets()).await;
        let (today, _) = seed_dose(&t.ctx, nine_am(), Default::default(), all_targets()).await;

        t.set_time(minutes_after_nine(1));
        let summary = run(&t).await;
        assert_eq!(summary.scanned, 1);
        assert_eq!(summary.outcomes[0].dose_id, today.id);
        assert_eq!(summary.date, nine_am().date_naive());
    }
}
