use crate::dtos::ReminderCycleSummaryDTO;
use medtrack_domain::ReminderCycleSummary;
use serde::{Deserialize, Serialize};

pub mod run_reminder_cycle {
    use super::*;

    #[derive(Debug, Deserialize, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct APIResponse {
        pub summary: ReminderCycleSummaryDTO,
    }

    impl APIResponse {
        pub fn new(summary: ReminderCycleSummary) -> Self {
            Self {
                summary: ReminderCycleSummaryDTO::new(summary),
            }
        }
    }
}
