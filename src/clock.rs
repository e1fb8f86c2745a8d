//! Clock abstraction threaded through resolution and recording.
use chrono::{Local, NaiveDate, NaiveTime};

/// Format used for the `date` column.
pub const DATE_FORMAT: &str = "%Y-%m-%d";
/// Format used for the `time` column (minute resolution).
pub const TIME_FORMAT: &str = "%H:%M";

/// Source of "today" and "now" for a run.
pub trait Clock {
    fn today(&self) -> NaiveDate;
    fn now(&self) -> NaiveTime;
}

/// Local wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }

    fn now(&self) -> NaiveTime {
        Local::now().time()
    }
}

/// Clock pinned to a single instant.
#[cfg(test)]
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    pub date: NaiveDate,
    pub time: NaiveTime,
}

#[cfg(test)]
impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.date
    }

    fn now(&self) -> NaiveTime {
        self.time
    }
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn format_time(time: NaiveTime) -> String {
    time.format(TIME_FORMAT).to_string()
}

/// Shift `today` by a signed number of days, saturating at the calendar edges.
pub fn shift_days(today: NaiveDate, days: i64) -> NaiveDate {
    chrono::TimeDelta::try_days(days)
        .and_then(|delta| today.checked_add_signed(delta))
        .unwrap_or(if days < 0 {
            NaiveDate::MIN
        } else {
            NaiveDate::MAX
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_are_iso_date_and_minute_time() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 1).expect("date");
        let time = NaiveTime::from_hms_opt(7, 5, 59).expect("time");
        assert_eq!(format_date(date), "2024-06-01");
        assert_eq!(format_time(time), "07:05");
    }

    #[test]
    fn shift_crosses_month_boundaries() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).expect("date");
        assert_eq!(format_date(shift_days(date, -1)), "2024-02-29");
        assert_eq!(format_date(shift_days(date, 31)), "2024-04-01");
    }
}
