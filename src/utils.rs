use crate::error::{AnalyticsError, Result};
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Timestamp layout used by every upstream date field.
pub const RECORD_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Layout of caller-facing calendar dates.
pub const CALENDAR_DATE_FORMAT: &str = "%Y-%m-%d";

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Parses an optional upstream timestamp. Absent or malformed values yield `None`.
pub fn parse_record_date(value: Option<&str>) -> Option<NaiveDateTime> {
    let raw = value?.trim();
    NaiveDateTime::parse_from_str(raw, RECORD_DATE_FORMAT).ok()
}

pub fn parse_calendar_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), CALENDAR_DATE_FORMAT).map_err(|_| {
        AnalyticsError::DateError(format!(
            "Invalid date '{}'. Expected YYYY-MM-DD",
            value
        ))
    })
}

pub fn start_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

/// Last representable second of `date` (23:59:59).
pub fn end_of_day(date: NaiveDate) -> NaiveDateTime {
    start_of_day(date) + Duration::seconds(86_399)
}

/// Inclusive reporting window `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Window {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl Window {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Result<Self> {
        if end < start {
            return Err(AnalyticsError::InvalidWindow(format!(
                "end {} is before start {}",
                end, start
            )));
        }
        Ok(Self { start, end })
    }

    /// Builds a window from calendar dates, extending the end date to 23:59:59.
    pub fn from_dates(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        Self::new(start_of_day(start), end_of_day(end))
    }

    pub fn contains(&self, moment: NaiveDateTime) -> bool {
        moment >= self.start && moment <= self.end
    }

    /// True when the raw upstream timestamp parses and falls inside the window.
    pub fn contains_record_date(&self, value: Option<&str>) -> bool {
        parse_record_date(value).is_some_and(|moment| self.contains(moment))
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Length of the window in whole days, never less than one.
    pub fn days(&self) -> f64 {
        let days = (self.duration().num_seconds() as f64 / SECONDS_PER_DAY).round();
        days.max(1.0)
    }

    /// The window of equal length that ends one second before this one starts.
    pub fn preceding(&self) -> Self {
        let end = self.start - Duration::seconds(1);
        Self {
            start: end - self.duration(),
            end,
        }
    }
}
