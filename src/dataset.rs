use crate::schema::*;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// One fetched collection, tagged with its kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "records", rename_all = "snake_case")]
pub enum EntityBatch {
    Invoices(Vec<Invoice>),
    InvoiceItems(Vec<InvoiceItem>),
    Purchases(Vec<Purchase>),
    Receivables(Vec<Receivable>),
    Payables(Vec<Payable>),
    Products(Vec<Product>),
    Customers(Vec<Customer>),
    Sellers(Vec<Seller>),
}

impl EntityBatch {
    pub fn kind(&self) -> EntityKind {
        match self {
            EntityBatch::Invoices(_) => EntityKind::Invoices,
            EntityBatch::InvoiceItems(_) => EntityKind::InvoiceItems,
            EntityBatch::Purchases(_) => EntityKind::Purchases,
            EntityBatch::Receivables(_) => EntityKind::Receivables,
            EntityBatch::Payables(_) => EntityKind::Payables,
            EntityBatch::Products(_) => EntityKind::Products,
            EntityBatch::Customers(_) => EntityKind::Customers,
            EntityBatch::Sellers(_) => EntityKind::Sellers,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            EntityBatch::Invoices(v) => v.len(),
            EntityBatch::InvoiceItems(v) => v.len(),
            EntityBatch::Purchases(v) => v.len(),
            EntityBatch::Receivables(v) => v.len(),
            EntityBatch::Payables(v) => v.len(),
            EntityBatch::Products(v) => v.len(),
            EntityBatch::Customers(v) => v.len(),
            EntityBatch::Sellers(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Every entity collection pulled from one or more sources for a single request.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Dataset {
    pub invoices: Vec<Invoice>,
    pub invoice_items: Vec<InvoiceItem>,
    pub purchases: Vec<Purchase>,
    pub receivables: Vec<Receivable>,
    pub payables: Vec<Payable>,
    pub products: Vec<Product>,
    pub customers: Vec<Customer>,
    pub sellers: Vec<Seller>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends copies of `other`'s records onto the matching collections.
    pub fn merge(&mut self, other: &Dataset) {
        self.invoices.extend_from_slice(&other.invoices);
        self.invoice_items.extend_from_slice(&other.invoice_items);
        self.purchases.extend_from_slice(&other.purchases);
        self.receivables.extend_from_slice(&other.receivables);
        self.payables.extend_from_slice(&other.payables);
        self.products.extend_from_slice(&other.products);
        self.customers.extend_from_slice(&other.customers);
        self.sellers.extend_from_slice(&other.sellers);
    }

    /// Same as [`Dataset::merge`] but moves the records instead of cloning them.
    pub fn absorb(&mut self, other: Dataset) {
        let Dataset {
            invoices,
            invoice_items,
            purchases,
            receivables,
            payables,
            products,
            customers,
            sellers,
        } = other;

        self.invoices.extend(invoices);
        self.invoice_items.extend(invoice_items);
        self.purchases.extend(purchases);
        self.receivables.extend(receivables);
        self.payables.extend(payables);
        self.products.extend(products);
        self.customers.extend(customers);
        self.sellers.extend(sellers);
    }

    /// Appends a batch onto the collection of the same kind.
    pub fn insert_batch(&mut self, batch: EntityBatch) {
        match batch {
            EntityBatch::Invoices(v) => self.invoices.extend(v),
            EntityBatch::InvoiceItems(v) => self.invoice_items.extend(v),
            EntityBatch::Purchases(v) => self.purchases.extend(v),
            EntityBatch::Receivables(v) => self.receivables.extend(v),
            EntityBatch::Payables(v) => self.payables.extend(v),
            EntityBatch::Products(v) => self.products.extend(v),
            EntityBatch::Customers(v) => self.customers.extend(v),
            EntityBatch::Sellers(v) => self.sellers.extend(v),
        }
    }

    pub fn len_of(&self, kind: EntityKind) -> usize {
        match kind {
            EntityKind::Invoices => self.invoices.len(),
            EntityKind::InvoiceItems => self.invoice_items.len(),
            EntityKind::Purchases => self.purchases.len(),
            EntityKind::Receivables => self.receivables.len(),
            EntityKind::Payables => self.payables.len(),
            EntityKind::Products => self.products.len(),
            EntityKind::Customers => self.customers.len(),
            EntityKind::Sellers => self.sellers.len(),
        }
    }

    pub fn counts(&self) -> BTreeMap<String, usize> {
        EntityKind::ALL
            .iter()
            .map(|kind| (kind.to_string(), self.len_of(*kind)))
            .collect()
    }

    pub fn record_count(&self) -> usize {
        EntityKind::ALL.iter().map(|kind| self.len_of(*kind)).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.record_count() == 0
    }
}

/// Accumulator shared by the tasks of one consolidated request.
///
/// All appends go through a single lock, so per-source blocks never interleave;
/// the order of those blocks is whatever order the tasks finish in.
#[derive(Debug, Clone, Default)]
pub struct SharedDataset {
    inner: Arc<Mutex<Dataset>>,
}

impl SharedDataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn absorb(&self, part: Dataset) {
        let added = part.record_count();
        let mut guard = self.inner.lock().await;
        guard.absorb(part);
        debug!(
            "Merged {} records into consolidated dataset ({} total)",
            added,
            guard.record_count()
        );
    }

    /// Takes the accumulated dataset, leaving an empty one behind.
    pub async fn take(&self) -> Dataset {
        std::mem::take(&mut *self.inner.lock().await)
    }
}
