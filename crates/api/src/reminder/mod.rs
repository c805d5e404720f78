use actix_web::web;

mod dispatch_notification;
mod duplicate_guard;
mod run_reminder_cycle;

pub use run_reminder_cycle::{run_reminder_pass, ReminderCycleTrigger};
use run_reminder_cycle::run_reminder_cycle_controller;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route(
        "/reminders/run",
        web::post().to(run_reminder_cycle_controller),
    );
}
