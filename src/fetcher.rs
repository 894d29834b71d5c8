use crate::connector::{SourceConnector, SourceHandle};
use crate::dataset::{Dataset, EntityBatch};
use crate::error::{AnalyticsError, Result};
use crate::schema::*;
use futures::future::join_all;
use log::{debug, info, warn};

/// Collections the sales forecaster reads.
pub const FORECAST_KINDS: &[EntityKind] = &[EntityKind::Invoices];

/// Collections the market basket analyzer reads.
pub const BASKET_KINDS: &[EntityKind] = &[EntityKind::InvoiceItems, EntityKind::Products];

/// Logs into `source`, tagging any failure as an authentication error.
pub async fn authenticate(
    connector: &dyn SourceConnector,
    source: &Source,
) -> Result<SourceHandle> {
    debug!("Authenticating against source '{}'", source.alias);
    connector.authenticate(source).await.map_err(|e| match e {
        AnalyticsError::Auth { .. } => e,
        other => AnalyticsError::Auth {
            alias: source.alias.clone(),
            message: other.to_string(),
        },
    })
}

/// Pulls a single collection and tags failures with the source and entity.
pub async fn fetch_collection(
    connector: &dyn SourceConnector,
    handle: &SourceHandle,
    kind: EntityKind,
) -> Result<EntityBatch> {
    let batch = match kind {
        EntityKind::Invoices => connector.fetch_invoices(handle).await.map(EntityBatch::Invoices),
        EntityKind::InvoiceItems => connector
            .fetch_invoice_items(handle)
            .await
            .map(EntityBatch::InvoiceItems),
        EntityKind::Purchases => connector
            .fetch_purchases(handle)
            .await
            .map(EntityBatch::Purchases),
        EntityKind::Receivables => connector
            .fetch_receivables(handle)
            .await
            .map(EntityBatch::Receivables),
        EntityKind::Payables => connector.fetch_payables(handle).await.map(EntityBatch::Payables),
        EntityKind::Products => connector.fetch_products(handle).await.map(EntityBatch::Products),
        EntityKind::Customers => connector
            .fetch_customers(handle)
            .await
            .map(EntityBatch::Customers),
        EntityKind::Sellers => connector.fetch_sellers(handle).await.map(EntityBatch::Sellers),
    };

    batch.map_err(|e| match e {
        AnalyticsError::Fetch { .. } => e,
        other => AnalyticsError::Fetch {
            alias: handle.alias().to_string(),
            entity: kind,
            message: other.to_string(),
        },
    })
}

/// Pulls the given collections concurrently.
///
/// Every call is awaited before anything is inspected. If any failed, the first
/// failure in `kinds` order is returned and the other results are dropped; a
/// partial dataset is never handed back.
pub async fn fetch_kinds(
    connector: &dyn SourceConnector,
    handle: &SourceHandle,
    kinds: &[EntityKind],
) -> Result<Dataset> {
    let results = join_all(
        kinds
            .iter()
            .map(|kind| fetch_collection(connector, handle, *kind)),
    )
    .await;

    let mut dataset = Dataset::new();
    for result in results {
        dataset.insert_batch(result?);
    }

    debug!(
        "Fetched {} records across {} collections from source '{}'",
        dataset.record_count(),
        kinds.len(),
        handle.alias()
    );
    Ok(dataset)
}

/// Pulls all eight collections for one handle.
pub async fn fetch_dataset(
    connector: &dyn SourceConnector,
    handle: &SourceHandle,
) -> Result<Dataset> {
    fetch_kinds(connector, handle, &EntityKind::ALL).await
}

/// Authenticates and fetches `kinds` from one source.
pub async fn fetch_source(
    connector: &dyn SourceConnector,
    source: &Source,
    kinds: &[EntityKind],
) -> Result<Dataset> {
    let handle = authenticate(connector, source).await?;
    let dataset = fetch_kinds(connector, &handle, kinds)
        .await
        .inspect_err(|e| warn!("Source '{}' failed during fetch: {}", source.alias, e))?;
    info!(
        "Source '{}' delivered {} records",
        source.alias,
        dataset.record_count()
    );
    Ok(dataset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Serves one invoice and one product, failing the listed collections.
    struct FlakyConnector {
        failing: Vec<EntityKind>,
        calls: AtomicUsize,
    }

    impl FlakyConnector {
        fn new(failing: Vec<EntityKind>) -> Self {
            Self {
                failing,
                calls: AtomicUsize::new(0),
            }
        }

        fn serve<T: Default>(&self, kind: EntityKind) -> Result<Vec<T>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.failing.contains(&kind) {
                return Err(AnalyticsError::Aggregate(format!("{} endpoint down", kind)));
            }
            Ok(vec![T::default()])
        }
    }

    #[async_trait]
    impl SourceConnector for FlakyConnector {
        async fn authenticate(&self, source: &Source) -> Result<SourceHandle> {
            if source.api_password.is_empty() {
                return Err(AnalyticsError::ConfigError("missing password".to_string()));
            }
            Ok(SourceHandle::new(source, "t"))
        }

        async fn fetch_invoices(&self, _: &SourceHandle) -> Result<Vec<Invoice>> {
            self.serve(EntityKind::Invoices)
        }
        async fn fetch_invoice_items(&self, _: &SourceHandle) -> Result<Vec<InvoiceItem>> {
            self.serve(EntityKind::InvoiceItems)
        }
        async fn fetch_purchases(&self, _: &SourceHandle) -> Result<Vec<Purchase>> {
            self.serve(EntityKind::Purchases)
        }
        async fn fetch_receivables(&self, _: &SourceHandle) -> Result<Vec<Receivable>> {
            self.serve(EntityKind::Receivables)
        }
        async fn fetch_payables(&self, _: &SourceHandle) -> Result<Vec<Payable>> {
            self.serve(EntityKind::Payables)
        }
        async fn fetch_products(&self, _: &SourceHandle) -> Result<Vec<Product>> {
            self.serve(EntityKind::Products)
        }
        async fn fetch_customers(&self, _: &SourceHandle) -> Result<Vec<Customer>> {
            self.serve(EntityKind::Customers)
        }
        async fn fetch_sellers(&self, _: &SourceHandle) -> Result<Vec<Seller>> {
            self.serve(EntityKind::Sellers)
        }
    }

    fn source(password: &str) -> Source {
        Source {
            id: 3,
            alias: "North".to_string(),
            api_url: "http://north".to_string(),
            api_user: "bi".to_string(),
            api_password: password.to_string(),
            refresh_seconds: 0,
        }
    }

    #[tokio::test]
    async fn test_fetch_dataset_collects_all_kinds() {
        let connector = FlakyConnector::new(vec![]);
        let handle = SourceHandle::new(&source("pw"), "t");

        let dataset = fetch_dataset(&connector, &handle).await.unwrap();
        assert_eq!(dataset.record_count(), 8);
        assert_eq!(connector.calls.load(Ordering::SeqCst), 8);
    }

    #[tokio::test]
    async fn test_first_failure_in_kind_order_wins() {
        let connector = FlakyConnector::new(vec![EntityKind::Sellers, EntityKind::Purchases]);
        let handle = SourceHandle::new(&source("pw"), "t");

        let err = fetch_dataset(&connector, &handle).await.unwrap_err();

        // every call still ran to completion
        assert_eq!(connector.calls.load(Ordering::SeqCst), 8);
        match err {
            AnalyticsError::Fetch { alias, entity, message } => {
                assert_eq!(alias, "North");
                assert_eq!(entity, EntityKind::Purchases);
                assert!(message.contains("purchases endpoint down"));
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_subset_fetch_and_auth_tagging() {
        let connector = FlakyConnector::new(vec![]);

        let dataset = fetch_source(&connector, &source("pw"), BASKET_KINDS).await.unwrap();
        assert_eq!(dataset.invoice_items.len(), 1);
        assert_eq!(dataset.products.len(), 1);
        assert!(dataset.invoices.is_empty());

        let err = fetch_source(&connector, &source(""), FORECAST_KINDS)
            .await
            .unwrap_err();
        assert!(err.is_auth());
        assert_eq!(err.source_alias(), Some("North"));
    }
}
