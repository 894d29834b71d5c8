//! # Saint Analytics
//!
//! A library that pulls business records from one or many Saint ERP sources and
//! turns them into dashboard analytics.
//!
//! ## Core Concepts
//!
//! - **Source**: one configured ERP connection. The engine logs in through a
//!   [`SourceConnector`] and receives an opaque [`SourceHandle`]
//! - **Dataset**: the eight record collections (invoices, invoice items, purchases,
//!   receivables, payables, products, customers, sellers) fetched for one request
//! - **Consolidated mode**: every source is fetched concurrently and merged into a
//!   single dataset; any failing source fails the whole request
//! - **Period summary**: sales, margin, receivable, payable and tax KPIs for one
//!   window, plus top-5 rankings
//! - **Comparative summary**: the current window against the equally long window
//!   right before it
//! - **Sales forecast**: an ordinary least squares trend over daily sales
//! - **Market basket**: support and confidence of products bought together
//!
//! ## Example
//!
//! ```rust,ignore
//! use saint_analytics::*;
//! use std::sync::Arc;
//!
//! let config = EngineConfig::from_file("saint.json")?.with_env_overrides();
//! let connector = Arc::new(SaintClient::from_config(&config)?);
//! let engine = AnalyticsEngine::from_config(connector, config);
//!
//! let today = chrono::Utc::now().date_naive();
//! let periods = ReportingPeriods::default_for(today, engine.config().summary_lookback_days)?;
//! let summary = engine.summary_for(SourceSelection::Consolidated, 1, periods).await?;
//! println!("Net sales: {:.2}", summary.current_period.total_net_sales);
//! ```

pub mod basket;
pub mod comparative;
pub mod config;
pub mod connector;
pub mod dataset;
pub mod drilldown;
pub mod engine;
pub mod error;
pub mod fanout;
pub mod fetcher;
pub mod forecast;
pub mod ranking;
pub mod schema;
pub mod summary;
pub mod utils;

#[cfg(feature = "http-client")]
pub mod client;

pub use basket::{
    analyze_market_basket, analyze_with_thresholds, BasketThresholds, MarketBasketResult,
};
pub use comparative::{ComparativeData, ComparativeSummary, ReportingPeriods};
pub use config::EngineConfig;
pub use connector::{
    HandleCache, InMemoryHandleCache, NoHandleCache, SharedConnector, SourceConnector,
    SourceDirectory, SourceHandle, StaticSourceDirectory,
};
pub use dataset::{Dataset, EntityBatch, SharedDataset};
pub use drilldown::{EntityDetail, EntityType, TransactionDetail, TransactionKind, TransactionList};
pub use engine::{compare_periods, AnalyticsEngine, SourceSelection};
pub use error::{AnalyticsError, Result};
pub use forecast::{SalesDataPoint, SalesForecast, SalesForecaster};
pub use ranking::RankedItem;
pub use schema::*;
pub use summary::{calculate_period_summary, PeriodCalculator, PeriodSummary};
pub use utils::Window;

#[cfg(feature = "http-client")]
pub use client::SaintClient;
