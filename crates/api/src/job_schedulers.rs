use crate::reminder::{run_reminder_pass, ReminderCycleTrigger};
use actix_web::rt::time::{interval, sleep_until, Instant};
use medtrack_infra::MedtrackContext;
use std::time::Duration;

/// Seconds until `secs_before_min` seconds before the next whole minute
pub fn get_start_delay(now_ts: usize, secs_before_min: usize) -> usize {
    let secs_to_next_minute = 60 - (now_ts / 1000) % 60;
    if secs_to_next_minute > secs_before_min {
        secs_to_next_minute - secs_before_min
    } else {
        secs_to_next_minute + (60 - secs_before_min)
    }
}

/// Runs a reminder pass at the start of every minute, each pass on its own task
pub fn start_send_reminders_job(ctx: MedtrackContext) {
    actix_web::rt::spawn(async move {
        let now = ctx.sys.get_timestamp_millis();
        let secs_to_next_run = get_start_delay(now as usize, 0);
        let start = Instant::now() + Duration::from_secs(secs_to_next_run as u64);

        sleep_until(start).await;
        let mut minutely_interval = interval(Duration::from_secs(60));
        loop {
            minutely_interval.tick().await;
            let context = ctx.clone();
            actix_web::rt::spawn(async move {
                // Errors are logged by the usecase
                let _ = run_reminder_pass(&context, ReminderCycleTrigger::JobScheduler).await;
            });
        }
    });
}
