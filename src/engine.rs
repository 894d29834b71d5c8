use crate::basket::{analyze_market_basket, MarketBasketResult};
use crate::comparative::{ComparativeSummary, ReportingPeriods};
use crate::config::EngineConfig;
use crate::connector::{
    HandleCache, InMemoryHandleCache, SharedConnector, SourceDirectory, SourceHandle,
    StaticSourceDirectory,
};
use crate::dataset::{Dataset, SharedDataset};
use crate::drilldown::{
    self, EntityDetail, EntityType, TransactionDetail, TransactionKind, TransactionList,
};
use crate::error::{AnalyticsError, Result};
use crate::fanout::{join_all_or_first_error, run_blocking};
use crate::fetcher::{self, BASKET_KINDS, FORECAST_KINDS};
use crate::forecast::{SalesForecast, SalesForecaster};
use crate::schema::{EntityKind, Source};
use crate::summary::calculate_period_summary;
use crate::utils::Window;
use chrono::{NaiveDateTime, Utc};
use log::{debug, info, warn};
use std::sync::Arc;

/// Which data a request is computed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceSelection {
    Single(i64),
    /// Every configured source, merged into one dataset.
    Consolidated,
}

impl SourceSelection {
    /// Connection id 0 selects all sources.
    pub fn from_connection_id(id: i64) -> Self {
        if id == 0 {
            SourceSelection::Consolidated
        } else {
            SourceSelection::Single(id)
        }
    }
}

/// Computes the current and previous period of `dataset` concurrently.
pub async fn compare_periods(
    dataset: Dataset,
    periods: ReportingPeriods,
    now: NaiveDateTime,
) -> Result<ComparativeSummary> {
    let dataset = Arc::new(dataset);

    let current = {
        let dataset = dataset.clone();
        run_blocking(move || calculate_period_summary(&dataset, &periods.current, now))
    };
    let previous = {
        let dataset = dataset.clone();
        run_blocking(move || calculate_period_summary(&dataset, &periods.previous, now))
    };
    let (current, previous) = futures::try_join!(current, previous)?;

    Ok(ComparativeSummary::from_periods(current, previous))
}

pub type Clock = Arc<dyn Fn() -> NaiveDateTime + Send + Sync>;

/// Fetches source data on demand and turns it into dashboard analytics.
///
/// Single-source requests reuse a cached handle for the `(source, user)` pair and
/// evict it when anything downstream fails. Consolidated requests log into every
/// source afresh, fetch them concurrently and fail as a whole if any source fails.
#[derive(Clone)]
pub struct AnalyticsEngine {
    connector: SharedConnector,
    directory: Arc<dyn SourceDirectory>,
    cache: Arc<dyn HandleCache>,
    config: EngineConfig,
    clock: Clock,
}

impl AnalyticsEngine {
    pub fn new(
        connector: SharedConnector,
        directory: Arc<dyn SourceDirectory>,
        cache: Arc<dyn HandleCache>,
        config: EngineConfig,
    ) -> Self {
        Self {
            connector,
            directory,
            cache,
            config,
            clock: Arc::new(|| Utc::now().naive_utc()),
        }
    }

    /// Engine over the sources listed in `config`, with an in-memory handle cache.
    pub fn from_config(connector: SharedConnector, config: EngineConfig) -> Self {
        let directory = Arc::new(StaticSourceDirectory::new(config.sources.clone()));
        Self::new(connector, directory, Arc::new(InMemoryHandleCache::new()), config)
    }

    /// Replaces the wall clock used to judge overdue balances.
    pub fn with_clock(mut self, clock: impl Fn() -> NaiveDateTime + Send + Sync + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn now(&self) -> NaiveDateTime {
        (self.clock)()
    }

    // Data acquisition

    async fn handle_for(&self, source: &Source, user_id: i64) -> Result<SourceHandle> {
        if let Some(handle) = self.cache.get(source.id, user_id) {
            debug!("Reusing cached handle for source '{}'", source.alias);
            return Ok(handle);
        }
        let handle = fetcher::authenticate(self.connector.as_ref(), source).await?;
        self.cache.put(user_id, handle.clone());
        Ok(handle)
    }

    /// Fetches `kinds` from one source on behalf of `user_id`.
    pub async fn fetch_single(
        &self,
        source_id: i64,
        user_id: i64,
        kinds: &[EntityKind],
    ) -> Result<Dataset> {
        let source = self.directory.find_source(source_id).await?;
        let result = match self.handle_for(&source, user_id).await {
            Ok(handle) => fetcher::fetch_kinds(self.connector.as_ref(), &handle, kinds).await,
            Err(e) => Err(e),
        };

        result.inspect_err(|e| {
            warn!("Request against source '{}' failed: {}", source.alias, e);
            self.cache.invalidate(source.id, user_id);
        })
    }

    /// Fetches `kinds` from every configured source into one merged dataset.
    pub async fn fetch_consolidated(&self, kinds: &[EntityKind]) -> Result<Dataset> {
        let sources = self.directory.list_sources().await?;
        info!(
            "Consolidating {} collections across {} sources",
            kinds.len(),
            sources.len()
        );

        let shared = SharedDataset::new();
        let tasks: Vec<_> = sources
            .into_iter()
            .map(|source| {
                let connector = self.connector.clone();
                let shared = shared.clone();
                let kinds = kinds.to_vec();
                async move {
                    let part = fetcher::fetch_source(connector.as_ref(), &source, &kinds).await?;
                    shared.absorb(part).await;
                    Ok::<_, AnalyticsError>(())
                }
            })
            .collect();

        join_all_or_first_error(tasks).await?;
        let dataset = shared.take().await;
        debug!("Consolidated dataset counts: {:?}", dataset.counts());
        Ok(dataset)
    }

    async fn fetch_for(
        &self,
        selection: SourceSelection,
        user_id: i64,
        kinds: &[EntityKind],
    ) -> Result<Dataset> {
        match selection {
            SourceSelection::Single(id) => self.fetch_single(id, user_id, kinds).await,
            SourceSelection::Consolidated => self.fetch_consolidated(kinds).await,
        }
    }

    // Comparative summary

    pub async fn compare(
        &self,
        dataset: Dataset,
        periods: ReportingPeriods,
    ) -> Result<ComparativeSummary> {
        compare_periods(dataset, periods, self.now()).await
    }

    pub async fn comparative_summary(
        &self,
        source_id: i64,
        user_id: i64,
        periods: ReportingPeriods,
    ) -> Result<ComparativeSummary> {
        let dataset = self.fetch_single(source_id, user_id, &EntityKind::ALL).await?;
        self.compare(dataset, periods).await
    }

    pub async fn consolidated_summary(
        &self,
        periods: ReportingPeriods,
    ) -> Result<ComparativeSummary> {
        let dataset = self.fetch_consolidated(&EntityKind::ALL).await?;
        self.compare(dataset, periods).await
    }

    pub async fn summary_for(
        &self,
        selection: SourceSelection,
        user_id: i64,
        periods: ReportingPeriods,
    ) -> Result<ComparativeSummary> {
        match selection {
            SourceSelection::Single(id) => self.comparative_summary(id, user_id, periods).await,
            SourceSelection::Consolidated => self.consolidated_summary(periods).await,
        }
    }

    // Sales forecast

    pub async fn forecast_for(
        &self,
        selection: SourceSelection,
        user_id: i64,
        window: Window,
    ) -> Result<SalesForecast> {
        let dataset = self.fetch_for(selection, user_id, FORECAST_KINDS).await?;
        run_blocking(move || SalesForecaster::from_invoices(&dataset.invoices, &window)).await
    }

    pub async fn sales_forecast(
        &self,
        source_id: i64,
        user_id: i64,
        window: Window,
    ) -> Result<SalesForecast> {
        self.forecast_for(SourceSelection::Single(source_id), user_id, window).await
    }

    pub async fn consolidated_sales_forecast(&self, window: Window) -> Result<SalesForecast> {
        self.forecast_for(SourceSelection::Consolidated, 0, window).await
    }

    // Market basket

    pub async fn basket_for(
        &self,
        selection: SourceSelection,
        user_id: i64,
        window: Option<Window>,
    ) -> Result<Vec<MarketBasketResult>> {
        let dataset = self.fetch_for(selection, user_id, BASKET_KINDS).await?;
        run_blocking(move || {
            analyze_market_basket(&dataset.invoice_items, &dataset.products, window.as_ref())
        })
        .await
    }

    pub async fn market_basket(
        &self,
        source_id: i64,
        user_id: i64,
        window: Option<Window>,
    ) -> Result<Vec<MarketBasketResult>> {
        self.basket_for(SourceSelection::Single(source_id), user_id, window).await
    }

    pub async fn consolidated_market_basket(
        &self,
        window: Option<Window>,
    ) -> Result<Vec<MarketBasketResult>> {
        self.basket_for(SourceSelection::Consolidated, 0, window).await
    }

    // Drilldown

    pub async fn transactions(
        &self,
        source_id: i64,
        user_id: i64,
        kind: TransactionKind,
        window: Window,
    ) -> Result<TransactionList> {
        let dataset = self.fetch_single(source_id, user_id, kind.required_kinds()).await?;
        Ok(drilldown::list_transactions(&dataset, kind, &window))
    }

    /// Lists `kind` for every source and concatenates the per-source lists.
    pub async fn consolidated_transactions(
        &self,
        kind: TransactionKind,
        window: Window,
    ) -> Result<TransactionList> {
        let sources = self.directory.list_sources().await?;
        let tasks: Vec<_> = sources
            .into_iter()
            .map(|source| {
                let connector = self.connector.clone();
                async move {
                    let dataset =
                        fetcher::fetch_source(connector.as_ref(), &source, kind.required_kinds())
                            .await?;
                    Ok::<_, AnalyticsError>(drilldown::list_transactions(&dataset, kind, &window))
                }
            })
            .collect();

        let mut combined = TransactionList::empty_for(kind);
        for list in join_all_or_first_error(tasks).await? {
            combined.append(list)?;
        }
        info!("Listed {} {} across all sources", combined.len(), kind);
        Ok(combined)
    }

    pub async fn transactions_for(
        &self,
        selection: SourceSelection,
        user_id: i64,
        kind: TransactionKind,
        window: Window,
    ) -> Result<TransactionList> {
        match selection {
            SourceSelection::Single(id) => self.transactions(id, user_id, kind, window).await,
            SourceSelection::Consolidated => self.consolidated_transactions(kind, window).await,
        }
    }

    pub async fn transaction_detail(
        &self,
        source_id: i64,
        user_id: i64,
        doc_type: &str,
        document_number: &str,
    ) -> Result<TransactionDetail> {
        drilldown::ensure_detail_document_type(doc_type)?;
        let dataset = self.fetch_single(source_id, user_id, drilldown::DETAIL_KINDS).await?;
        drilldown::transaction_detail(&dataset, document_number)
    }

    pub async fn entity_detail(
        &self,
        source_id: i64,
        user_id: i64,
        entity: EntityType,
        code: &str,
    ) -> Result<EntityDetail> {
        let dataset = self.fetch_single(source_id, user_id, &[entity.collection()]).await?;
        drilldown::entity_detail(&dataset, entity, code)
    }
}
