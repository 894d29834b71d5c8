//! Daily sales trend fitted by ordinary least squares.

use crate::schema::Invoice;
use crate::utils::{parse_record_date, Window};
use chrono::{Duration, NaiveDate};
use log::debug;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SalesDataPoint {
    pub date: NaiveDate,
    pub sales: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SalesForecast {
    pub historical_data: Vec<SalesDataPoint>,
    pub trend_line: Vec<SalesDataPoint>,
    /// Change in daily sales per bucket index.
    pub slope: f64,
    pub intercept: f64,
}

impl SalesForecast {
    pub fn is_empty(&self) -> bool {
        self.historical_data.is_empty()
    }

    /// Extends the fitted line `days` calendar days past the last historical day.
    ///
    /// Indices continue from the last bucket, so gaps between historical days are
    /// not reflected in the projection.
    pub fn project(&self, days: u32) -> Vec<SalesDataPoint> {
        let Some(last) = self.historical_data.last() else {
            return Vec::new();
        };
        let base = self.historical_data.len() as f64 - 1.0;

        (1..=days)
            .map(|step| SalesDataPoint {
                date: last.date + Duration::days(i64::from(step)),
                sales: self.slope * (base + f64::from(step)) + self.intercept,
            })
            .collect()
    }
}

pub struct SalesForecaster;

impl SalesForecaster {
    /// Buckets invoice totals by calendar day inside `window` and fits the trend.
    ///
    /// Fewer than two distinct days yields an empty forecast.
    pub fn from_invoices(invoices: &[Invoice], window: &Window) -> SalesForecast {
        let daily = Self::daily_totals(invoices, window);
        if daily.len() < 2 {
            debug!(
                "Only {} day(s) of sales inside the window, skipping trend fit",
                daily.len()
            );
            return SalesForecast::default();
        }

        let historical_data: Vec<SalesDataPoint> = daily
            .into_iter()
            .map(|(date, sales)| SalesDataPoint { date, sales })
            .collect();

        let (slope, intercept) = Self::fit(&historical_data);
        let trend_line = historical_data
            .iter()
            .enumerate()
            .map(|(i, point)| SalesDataPoint {
                date: point.date,
                sales: slope * i as f64 + intercept,
            })
            .collect();

        debug!(
            "Fitted sales trend over {} days: slope {:.4}, intercept {:.4}",
            historical_data.len(),
            slope,
            intercept
        );

        SalesForecast {
            historical_data,
            trend_line,
            slope,
            intercept,
        }
    }

    fn daily_totals(invoices: &[Invoice], window: &Window) -> BTreeMap<NaiveDate, f64> {
        let mut daily = BTreeMap::new();
        for inv in invoices {
            let (Some(moment), Some(total)) =
                (parse_record_date(inv.fechae.as_deref()), inv.mtototal)
            else {
                continue;
            };
            if window.contains(moment) {
                *daily.entry(moment.date()).or_insert(0.0) += total;
            }
        }
        daily
    }

    /// Least-squares fit of `sales = slope * index + intercept`.
    fn fit(points: &[SalesDataPoint]) -> (f64, f64) {
        let n = points.len() as f64;
        let (mut sum_x, mut sum_y, mut sum_xy, mut sum_xx) = (0.0, 0.0, 0.0, 0.0);
        for (i, point) in points.iter().enumerate() {
            let x = i as f64;
            sum_x += x;
            sum_y += point.sales;
            sum_xy += x * point.sales;
            sum_xx += x * x;
        }

        let denominator = n * sum_xx - sum_x * sum_x;
        if denominator == 0.0 {
            return (0.0, sum_y / n);
        }
        let slope = (n * sum_xy - sum_x * sum_y) / denominator;
        let intercept = (sum_y - slope * sum_x) / n;
        (slope, intercept)
    }
}
