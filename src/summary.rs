//! Management summary KPIs for one dataset and one reporting window.
//!
//! Sales, purchases and taxes are restricted to the window. Receivable and
//! payable balances are point-in-time values and are summed unconditionally;
//! an entry counts as overdue when its due date is before the wall-clock `now`
//! of the calculation, not the window end. Active customer and product counts
//! describe the current state of the master data and ignore the window as well.

use crate::dataset::Dataset;
use crate::ranking::{self, RankedItem, TOP_N};
use crate::schema::*;
use crate::utils::{parse_record_date, Window};
use chrono::NaiveDateTime;
use log::debug;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PeriodSummary {
    // Sales and profit
    pub total_net_sales: f64,
    pub total_net_sales_cash: f64,
    pub total_net_sales_credit: f64,
    pub cost_of_goods_sold: f64,
    pub gross_profit: f64,
    pub gross_profit_margin: f64,
    pub average_ticket: f64,
    pub total_invoices: usize,
    pub total_active_products: usize,
    pub total_active_clients: usize,

    // Receivables
    pub total_receivables: f64,
    pub overdue_receivables: f64,
    pub receivables_turnover_days: f64,
    pub receivable_percentage: f64,
    pub active_clients_with_debt: usize,
    pub total_clients_with_overdue: usize,

    // Payables
    pub total_payables: f64,
    pub overdue_payables: f64,
    pub payables_turnover_days: f64,

    // Taxes and withholdings
    pub sales_vat: f64,
    pub purchases_vat: f64,
    /// Sales VAT minus purchases VAT.
    pub vat_payable: f64,
    /// VAT withheld by customers.
    pub sales_iva_withheld: f64,
    /// VAT withheld from suppliers.
    pub purchases_iva_withheld: f64,

    /// Rankings only count line items dated inside the window (falling back to
    /// the invoice date), unlike the balances above which are point-in-time.
    pub top5_clients_by_sales: Vec<RankedItem>,
    pub top5_products_by_sales: Vec<RankedItem>,
    pub top5_products_by_profit: Vec<RankedItem>,
    pub top5_sellers_by_sales: Vec<RankedItem>,
}

fn value(amount: Option<f64>) -> f64 {
    amount.unwrap_or(0.0)
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}

pub struct PeriodCalculator<'a> {
    dataset: &'a Dataset,
    now: NaiveDateTime,
}

impl<'a> PeriodCalculator<'a> {
    pub fn new(dataset: &'a Dataset, now: NaiveDateTime) -> Self {
        Self { dataset, now }
    }

    pub fn summarize(&self, window: &Window) -> PeriodSummary {
        let mut summary = PeriodSummary::default();

        let headers: HashMap<&str, &Invoice> = self
            .dataset
            .invoices
            .iter()
            .filter_map(|inv| Some((inv.numerod.as_deref()?, inv)))
            .collect();

        self.accumulate_sales(window, &mut summary);
        let credit_purchases = self.accumulate_purchases(window, &mut summary);
        self.accumulate_receivables(window, &mut summary);
        self.accumulate_payables(window, credit_purchases, &mut summary);
        self.count_active_entities(&mut summary);
        summary.vat_payable = summary.sales_vat - summary.purchases_vat;

        let items = self.items_in_window(window, &headers);
        summary.top5_clients_by_sales =
            ranking::sales_by_client(&items, &headers, &self.dataset.customers).top(TOP_N);
        summary.top5_products_by_sales =
            ranking::sales_by_product(&items, &self.dataset.products).top(TOP_N);
        summary.top5_sellers_by_sales =
            ranking::sales_by_seller(&items, &headers, &self.dataset.sellers).top(TOP_N);
        summary.top5_products_by_profit =
            ranking::profit_by_product(&items, &self.dataset.products).top(TOP_N);

        debug!(
            "Period {} .. {}: {} invoices, net sales {:.2}, {} line items ranked",
            window.start,
            window.end,
            summary.total_invoices,
            summary.total_net_sales,
            items.len()
        );

        summary
    }

    fn accumulate_sales(&self, window: &Window, summary: &mut PeriodSummary) {
        for inv in &self.dataset.invoices {
            if !window.contains_record_date(inv.fechae.as_deref()) {
                continue;
            }
            summary.total_invoices += 1;
            summary.total_net_sales += value(inv.mtototal);
            summary.total_net_sales_credit += value(inv.credito);
            summary.total_net_sales_cash += value(inv.contado);
            summary.cost_of_goods_sold += value(inv.costoprd);
            summary.sales_vat += value(inv.mtotax);
            summary.sales_iva_withheld += value(inv.reteniva);
        }

        if summary.total_invoices > 0 {
            summary.average_ticket = summary.total_net_sales / summary.total_invoices as f64;
        }
        summary.gross_profit = summary.total_net_sales - summary.cost_of_goods_sold;
        summary.gross_profit_margin = ratio(summary.gross_profit, summary.total_net_sales) * 100.0;
    }

    /// Returns the credit purchases of the window, the payables turnover basis.
    fn accumulate_purchases(&self, window: &Window, summary: &mut PeriodSummary) -> f64 {
        let mut credit = 0.0;
        for purchase in &self.dataset.purchases {
            if !window.contains_record_date(purchase.fechae.as_deref()) {
                continue;
            }
            credit += value(purchase.credito);
            summary.purchases_vat += value(purchase.mtotax);
            summary.purchases_iva_withheld += value(purchase.reteniva);
        }
        credit
    }

    fn is_overdue(&self, due: Option<&str>) -> bool {
        parse_record_date(due).is_some_and(|due| due < self.now)
    }

    fn accumulate_receivables(&self, window: &Window, summary: &mut PeriodSummary) {
        let mut overdue_clients: HashSet<&str> = HashSet::new();

        for r in &self.dataset.receivables {
            let balance = value(r.saldo);
            if balance <= 0.0 {
                continue;
            }
            summary.total_receivables += balance;
            if self.is_overdue(r.fechav.as_deref()) {
                summary.overdue_receivables += balance;
                if let Some(client) = r.codclie.as_deref() {
                    overdue_clients.insert(client);
                }
            }
        }

        summary.total_clients_with_overdue = overdue_clients.len();
        summary.receivables_turnover_days =
            ratio(summary.total_receivables, summary.total_net_sales_credit) * window.days();
        summary.receivable_percentage =
            ratio(summary.overdue_receivables, summary.total_receivables) * 100.0;
    }

    fn accumulate_payables(
        &self,
        window: &Window,
        credit_purchases: f64,
        summary: &mut PeriodSummary,
    ) {
        for p in &self.dataset.payables {
            let balance = value(p.saldo);
            if balance <= 0.0 {
                continue;
            }
            summary.total_payables += balance;
            if self.is_overdue(p.fechav.as_deref()) {
                summary.overdue_payables += balance;
            }
        }

        summary.payables_turnover_days =
            ratio(summary.total_payables, credit_purchases) * window.days();
    }

    fn count_active_entities(&self, summary: &mut PeriodSummary) {
        for c in &self.dataset.customers {
            if is_active(c.activo) {
                summary.total_active_clients += 1;
                if value(c.saldo) > 0.0 {
                    summary.active_clients_with_debt += 1;
                }
            }
        }
        summary.total_active_products = self
            .dataset
            .products
            .iter()
            .filter(|p| is_active(p.activo))
            .count();
    }

    /// Line items dated inside the window. Items without a date of their own
    /// take the date of their invoice header.
    fn items_in_window(
        &self,
        window: &Window,
        headers: &HashMap<&str, &Invoice>,
    ) -> Vec<&'a InvoiceItem> {
        self.dataset
            .invoice_items
            .iter()
            .filter(|item| {
                let own = parse_record_date(item.fechae.as_deref());
                let date = own.or_else(|| {
                    item.numerod
                        .as_deref()
                        .and_then(|doc| headers.get(doc))
                        .and_then(|h| parse_record_date(h.fechae.as_deref()))
                });
                date.is_some_and(|d| window.contains(d))
            })
            .collect()
    }
}

/// Computes the summary of `dataset` over `window`, judging overdue balances against `now`.
pub fn calculate_period_summary(
    dataset: &Dataset,
    window: &Window,
    now: NaiveDateTime,
) -> PeriodSummary {
    PeriodCalculator::new(dataset, now).summarize(window)
}
