//! Current-versus-previous period comparison.

use crate::error::{AnalyticsError, Result};
use crate::summary::PeriodSummary;
use crate::utils::{parse_calendar_date, Window};
use chrono::{Duration, NaiveDate};
use log::debug;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A KPI value next to its previous-period value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ComparativeData {
    pub value: f64,
    pub previous_value: f64,
    pub percentage_change: f64,
}

impl ComparativeData {
    /// A zero previous value reports 100% growth when the current value is
    /// positive, and no change otherwise.
    pub fn compute(current: f64, previous: f64) -> Self {
        let percentage_change = if previous != 0.0 {
            (current - previous) / previous * 100.0
        } else if current > 0.0 {
            100.0
        } else {
            0.0
        };

        Self {
            value: current,
            previous_value: previous,
            percentage_change,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ComparativeSummary {
    pub current_period: PeriodSummary,
    pub previous_period: PeriodSummary,
    pub total_net_sales_comparative: ComparativeData,
    pub gross_profit_comparative: ComparativeData,
    pub average_ticket_comparative: ComparativeData,
}

impl ComparativeSummary {
    pub fn from_periods(current: PeriodSummary, previous: PeriodSummary) -> Self {
        Self {
            total_net_sales_comparative: ComparativeData::compute(
                current.total_net_sales,
                previous.total_net_sales,
            ),
            gross_profit_comparative: ComparativeData::compute(
                current.gross_profit,
                previous.gross_profit,
            ),
            average_ticket_comparative: ComparativeData::compute(
                current.average_ticket,
                previous.average_ticket,
            ),
            current_period: current,
            previous_period: previous,
        }
    }
}

/// The current window and the equally long window right before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ReportingPeriods {
    pub current: Window,
    pub previous: Window,
}

impl ReportingPeriods {
    pub fn from_current(current: Window) -> Self {
        Self {
            current,
            previous: current.preceding(),
        }
    }

    /// Calendar dates with the end extended to 23:59:59.
    pub fn from_dates(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        Ok(Self::from_current(Window::from_dates(start, end)?))
    }

    /// The `lookback_days` days up to and including `today`.
    pub fn default_for(today: NaiveDate, lookback_days: u32) -> Result<Self> {
        Self::from_dates(lookback_start(today, lookback_days)?, today)
    }

    /// Resolves optional `YYYY-MM-DD` query values.
    ///
    /// A missing or unparsable end date means `today`; a missing or unparsable
    /// start date means `lookback_days` before the end date.
    pub fn from_query(
        start: Option<&str>,
        end: Option<&str>,
        today: NaiveDate,
        lookback_days: u32,
    ) -> Result<Self> {
        Ok(Self::from_current(query_window(start, end, today, lookback_days)?))
    }
}

pub(crate) fn lookback_start(end: NaiveDate, lookback_days: u32) -> Result<NaiveDate> {
    end.checked_sub_signed(Duration::days(i64::from(lookback_days)))
        .ok_or_else(|| {
            AnalyticsError::DateError(format!(
                "{} days before {} is out of range",
                lookback_days, end
            ))
        })
}

/// Window for optional `YYYY-MM-DD` query values, see [`ReportingPeriods::from_query`].
pub fn query_window(
    start: Option<&str>,
    end: Option<&str>,
    today: NaiveDate,
    lookback_days: u32,
) -> Result<Window> {
    let end = match end.map(parse_calendar_date) {
        Some(Ok(date)) => date,
        Some(Err(e)) => {
            debug!("Ignoring end date: {}", e);
            today
        }
        None => today,
    };
    let start = match start.map(parse_calendar_date) {
        Some(Ok(date)) => date,
        Some(Err(e)) => {
            debug!("Ignoring start date: {}", e);
            lookback_start(end, lookback_days)?
        }
        None => lookback_start(end, lookback_days)?,
    };
    Window::from_dates(start, end)
}
