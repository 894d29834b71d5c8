//! Document lists and single-record lookups behind the dashboard drilldown.
//!
//! Each listing kind returns its own record type, so results travel as the
//! [`TransactionList`] sum type and consolidated listings are combined with a
//! same-variant [`TransactionList::append`].

use crate::dataset::Dataset;
use crate::error::{AnalyticsError, Result};
use crate::schema::*;
use crate::utils::Window;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum TransactionKind {
    /// Invoices still carrying a receivable balance.
    InvoicesCredit,
    /// Invoices with no open receivable.
    InvoicesCash,
    Receivables,
    Payables,
}

impl TransactionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TransactionKind::InvoicesCredit => "invoices-credit",
            TransactionKind::InvoicesCash => "invoices-cash",
            TransactionKind::Receivables => "receivables",
            TransactionKind::Payables => "payables",
        }
    }

    /// Collections a listing of this kind reads.
    pub fn required_kinds(self) -> &'static [EntityKind] {
        match self {
            TransactionKind::InvoicesCredit | TransactionKind::InvoicesCash => {
                &[EntityKind::Invoices, EntityKind::Receivables]
            }
            TransactionKind::Receivables => &[EntityKind::Receivables],
            TransactionKind::Payables => &[EntityKind::Payables],
        }
    }
}

impl FromStr for TransactionKind {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "invoices-credit" => Ok(TransactionKind::InvoicesCredit),
            "invoices-cash" => Ok(TransactionKind::InvoicesCash),
            "receivables" => Ok(TransactionKind::Receivables),
            "payables" => Ok(TransactionKind::Payables),
            _ => Err(AnalyticsError::InvalidDocumentType(s.to_string())),
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", content = "records", rename_all = "snake_case")]
pub enum TransactionList {
    Invoices(Vec<Invoice>),
    Receivables(Vec<Receivable>),
    Payables(Vec<Payable>),
}

impl TransactionList {
    pub fn empty_for(kind: TransactionKind) -> Self {
        match kind {
            TransactionKind::InvoicesCredit | TransactionKind::InvoicesCash => {
                TransactionList::Invoices(Vec::new())
            }
            TransactionKind::Receivables => TransactionList::Receivables(Vec::new()),
            TransactionKind::Payables => TransactionList::Payables(Vec::new()),
        }
    }

    /// Appends `other` when it holds the same record type.
    pub fn append(&mut self, other: TransactionList) -> Result<()> {
        match (self, other) {
            (TransactionList::Invoices(a), TransactionList::Invoices(b)) => a.extend(b),
            (TransactionList::Receivables(a), TransactionList::Receivables(b)) => a.extend(b),
            (TransactionList::Payables(a), TransactionList::Payables(b)) => a.extend(b),
            (this, other) => {
                return Err(AnalyticsError::Aggregate(format!(
                    "cannot append {} records to a {} list",
                    other.label(),
                    this.label()
                )))
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        match self {
            TransactionList::Invoices(v) => v.len(),
            TransactionList::Receivables(v) => v.len(),
            TransactionList::Payables(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn label(&self) -> &'static str {
        match self {
            TransactionList::Invoices(_) => "invoice",
            TransactionList::Receivables(_) => "receivable",
            TransactionList::Payables(_) => "payable",
        }
    }
}

/// Lists the documents of `kind` emitted inside `window`.
pub fn list_transactions(
    dataset: &Dataset,
    kind: TransactionKind,
    window: &Window,
) -> TransactionList {
    match kind {
        TransactionKind::InvoicesCredit | TransactionKind::InvoicesCash => {
            let open: HashSet<&str> = dataset
                .receivables
                .iter()
                .filter(|r| r.saldo.is_some_and(|s| s > 0.0))
                .filter_map(|r| r.numerod.as_deref())
                .collect();
            let want_credit = kind == TransactionKind::InvoicesCredit;

            let invoices = dataset
                .invoices
                .iter()
                .filter(|inv| window.contains_record_date(inv.fechae.as_deref()))
                .filter(|inv| {
                    let has_balance = inv.numerod.as_deref().is_some_and(|n| open.contains(n));
                    has_balance == want_credit
                })
                .cloned()
                .collect();
            TransactionList::Invoices(invoices)
        }
        TransactionKind::Receivables => TransactionList::Receivables(
            dataset
                .receivables
                .iter()
                .filter(|r| window.contains_record_date(r.fechae.as_deref()))
                .cloned()
                .collect(),
        ),
        TransactionKind::Payables => TransactionList::Payables(
            dataset
                .payables
                .iter()
                .filter(|p| window.contains_record_date(p.fechae.as_deref()))
                .cloned()
                .collect(),
        ),
    }
}

/// Collections read by [`transaction_detail`].
pub const DETAIL_KINDS: &[EntityKind] = &[
    EntityKind::Invoices,
    EntityKind::InvoiceItems,
    EntityKind::Customers,
    EntityKind::Sellers,
];

/// An invoice with its lines and the customer and seller it names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TransactionDetail {
    pub document: Invoice,
    pub items: Vec<InvoiceItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer: Option<Customer>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seller: Option<Seller>,
}

/// Only invoices have a detail view.
pub fn ensure_detail_document_type(doc_type: &str) -> Result<()> {
    if doc_type.trim().eq_ignore_ascii_case("invoice") {
        Ok(())
    } else {
        Err(AnalyticsError::InvalidDocumentType(doc_type.to_string()))
    }
}

fn code_matches(code: &Option<String>, wanted: &str) -> bool {
    code.as_deref() == Some(wanted)
}

pub fn transaction_detail(dataset: &Dataset, document_number: &str) -> Result<TransactionDetail> {
    let document = dataset
        .invoices
        .iter()
        .find(|inv| code_matches(&inv.numerod, document_number))
        .cloned()
        .ok_or_else(|| AnalyticsError::NotFound {
            kind: "Invoice".to_string(),
            id: document_number.to_string(),
        })?;

    let items = dataset
        .invoice_items
        .iter()
        .filter(|item| code_matches(&item.numerod, document_number))
        .cloned()
        .collect();

    let customer = document.codclie.as_deref().and_then(|code| {
        dataset
            .customers
            .iter()
            .find(|c| code_matches(&c.codclie, code))
            .cloned()
    });
    let seller = document.codvend.as_deref().and_then(|code| {
        dataset
            .sellers
            .iter()
            .find(|s| code_matches(&s.codvend, code))
            .cloned()
    });

    Ok(TransactionDetail {
        document,
        items,
        customer,
        seller,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Customer,
    Seller,
    Product,
}

impl EntityType {
    pub fn collection(self) -> EntityKind {
        match self {
            EntityType::Customer => EntityKind::Customers,
            EntityType::Seller => EntityKind::Sellers,
            EntityType::Product => EntityKind::Products,
        }
    }

    fn label(self) -> &'static str {
        match self {
            EntityType::Customer => "Customer",
            EntityType::Seller => "Seller",
            EntityType::Product => "Product",
        }
    }
}

impl FromStr for EntityType {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "customer" => Ok(EntityType::Customer),
            "seller" => Ok(EntityType::Seller),
            "product" => Ok(EntityType::Product),
            _ => Err(AnalyticsError::InvalidEntityType(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", content = "record", rename_all = "snake_case")]
pub enum EntityDetail {
    Customer(Customer),
    Seller(Seller),
    Product(Product),
}

pub fn entity_detail(dataset: &Dataset, entity: EntityType, code: &str) -> Result<EntityDetail> {
    let found = match entity {
        EntityType::Customer => dataset
            .customers
            .iter()
            .find(|c| code_matches(&c.codclie, code))
            .cloned()
            .map(EntityDetail::Customer),
        EntityType::Seller => dataset
            .sellers
            .iter()
            .find(|s| code_matches(&s.codvend, code))
            .cloned()
            .map(EntityDetail::Seller),
        EntityType::Product => dataset
            .products
            .iter()
            .find(|p| code_matches(&p.codprod, code))
            .cloned()
            .map(EntityDetail::Product),
    };

    found.ok_or_else(|| AnalyticsError::NotFound {
        kind: entity.label().to_string(),
        id: code.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn window() -> Window {
        Window::from_dates(
            NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 5, 31).unwrap(),
        )
        .unwrap()
    }

    fn invoice(number: &str, date: &str) -> Invoice {
        Invoice {
            numerod: Some(number.to_string()),
            codclie: Some("C1".to_string()),
            codvend: Some("V9".to_string()),
            fechae: Some(date.to_string()),
            ..Default::default()
        }
    }

    fn receivable(number: &str, balance: f64, date: &str) -> Receivable {
        Receivable {
            numerod: Some(number.to_string()),
            fechae: Some(date.to_string()),
            saldo: Some(balance),
            ..Default::default()
        }
    }

    fn sample() -> Dataset {
        Dataset {
            invoices: vec![
                invoice("F1", "2024-05-02 10:00:00"),
                invoice("F2", "2024-05-03 10:00:00"),
                invoice("F3", "2024-05-04 10:00:00"),
                invoice("F4", "2024-04-30 23:59:59"),
            ],
            receivables: vec![
                receivable("F1", 120.0, "2024-05-02 10:00:00"),
                receivable("F2", 0.0, "2024-05-03 10:00:00"),
                receivable("F4", 50.0, "2024-04-30 23:59:59"),
            ],
            invoice_items: vec![
                InvoiceItem {
                    numerod: Some("F1".to_string()),
                    coditem: Some("P1".to_string()),
                    ..Default::default()
                },
                InvoiceItem {
                    numerod: Some("F2".to_string()),
                    coditem: Some("P2".to_string()),
                    ..Default::default()
                },
            ],
            customers: vec![Customer {
                codclie: Some("C1".to_string()),
                descrip: Some("Acme".to_string()),
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    fn numbers(list: &TransactionList) -> Vec<&str> {
        match list {
            TransactionList::Invoices(v) => v.iter().filter_map(|i| i.numerod.as_deref()).collect(),
            _ => panic!("expected invoices"),
        }
    }

    #[test]
    fn test_parse_transaction_kind() {
        assert_eq!(
            "Invoices-Credit".parse::<TransactionKind>().unwrap(),
            TransactionKind::InvoicesCredit
        );
        assert_eq!("payables".parse::<TransactionKind>().unwrap(), TransactionKind::Payables);
        assert!(matches!(
            "purchases".parse::<TransactionKind>(),
            Err(AnalyticsError::InvalidDocumentType(t)) if t == "purchases"
        ));
    }

    #[test]
    fn test_credit_and_cash_split() {
        let dataset = sample();

        let credit = list_transactions(&dataset, TransactionKind::InvoicesCredit, &window());
        let cash = list_transactions(&dataset, TransactionKind::InvoicesCash, &window());

        assert_eq!(numbers(&credit), vec!["F1"]);
        assert_eq!(numbers(&cash), vec!["F2", "F3"]);
    }

    #[test]
    fn test_receivables_filtered_by_emission_date() {
        let list = list_transactions(&sample(), TransactionKind::Receivables, &window());
        assert_eq!(list.len(), 2);
        assert!(matches!(list, TransactionList::Receivables(_)));

        let payables = list_transactions(&sample(), TransactionKind::Payables, &window());
        assert_eq!(payables, TransactionList::Payables(Vec::new()));
    }

    #[test]
    fn test_append_same_variant_only() {
        let mut list = TransactionList::empty_for(TransactionKind::InvoicesCash);
        list.append(TransactionList::Invoices(vec![invoice("A", "x")]))
            .unwrap();
        list.append(TransactionList::Invoices(vec![invoice("B", "x")]))
            .unwrap();
        assert_eq!(list.len(), 2);

        let err = list
            .append(TransactionList::Payables(vec![Payable::default()]))
            .unwrap_err();
        assert!(matches!(err, AnalyticsError::Aggregate(_)));
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn test_transaction_detail() {
        let detail = transaction_detail(&sample(), "F1").unwrap();
        assert_eq!(detail.items.len(), 1);
        assert_eq!(detail.customer.unwrap().descrip.as_deref(), Some("Acme"));
        assert!(detail.seller.is_none());

        assert!(matches!(
            transaction_detail(&sample(), "F99"),
            Err(AnalyticsError::NotFound { .. })
        ));
        assert!(ensure_detail_document_type("Invoice").is_ok());
        assert!(ensure_detail_document_type("purchase").is_err());
    }

    #[test]
    fn test_entity_detail() {
        let found = entity_detail(&sample(), EntityType::Customer, "C1").unwrap();
        assert!(
            matches!(found, EntityDetail::Customer(ref c) if c.descrip.as_deref() == Some("Acme"))
        );

        let missing = entity_detail(&sample(), EntityType::Product, "P1").unwrap_err();
        assert_eq!(missing.to_string(), "Product with code 'P1' was not found");

        assert!(matches!(
            "supplier".parse::<EntityType>(),
            Err(AnalyticsError::InvalidEntityType(_))
        ));
    }
}
