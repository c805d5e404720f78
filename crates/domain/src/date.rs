use chrono::prelude::*;
use chrono_tz::Tz;
use serde::Serialize;

/// A local calendar date in some timezone together with the
/// UTC instants where that date begins and ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarDay {
    pub date: NaiveDate,
    /// Inclusive
    pub start: DateTime<Utc>,
    /// Exclusive
    pub end: DateTime<Utc>,
}

impl CalendarDay {
    pub fn new(date: NaiveDate, timezone: &Tz) -> Self {
        let next_date = date.succ_opt().unwrap_or(date);
        Self {
            date,
            start: local_midnight(date, timezone),
            end: local_midnight(next_date, timezone),
        }
    }

    /// The calendar day `now` falls on in the given timezone
    pub fn containing(now: DateTime<Utc>, timezone: &Tz) -> Self {
        let date = now.with_timezone(timezone).date_naive();
        Self::new(date, timezone)
    }
}

// Midnight does not exist on some DST transition days, in that case the first
// valid local instant after it is used.
fn local_midnight(date: NaiveDate, timezone: &Tz) -> DateTime<Utc> {
    let mut local = date.and_time(NaiveTime::MIN);
    for _ in 0..4 {
        if let Some(dt) = timezone.from_local_datetime(&local).earliest() {
            return dt.with_timezone(&Utc);
        }
        local += chrono::Duration::minutes(30);
    }
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}

pub fn format_date(date: &NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}
