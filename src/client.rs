//! HTTP connector for the Saint administrative API.

use crate::config::EngineConfig;
use crate::connector::{SourceConnector, SourceHandle};
use crate::error::{AnalyticsError, Result};
use crate::schema::*;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use log::{debug, info};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::json;
use std::time::Duration;

const LOGIN_PATH: &str = "/v1/main/login";
const ADMIN_PATH: &str = "/v1/adm";
const TOKEN_HEADER: &str = "Pragma";

#[derive(Clone)]
pub struct SaintClient {
    client: Client,
    api_key: String,
    api_id: String,
    terminal: String,
}

impl SaintClient {
    pub fn new(
        api_key: impl Into<String>,
        api_id: impl Into<String>,
        terminal: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            api_id: api_id.into(),
            terminal: terminal.into(),
        })
    }

    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        Self::new(
            config.api_key.clone(),
            config.api_id.clone(),
            config.terminal.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    fn url(base: &str, path: &str) -> String {
        format!("{}{}", base.trim_end_matches('/'), path)
    }

    async fn get_collection<T: DeserializeOwned>(
        &self,
        handle: &SourceHandle,
        kind: EntityKind,
    ) -> Result<Vec<T>> {
        let url = Self::url(handle.api_url(), &format!("{}/{}", ADMIN_PATH, kind.endpoint()));
        debug!("GET {} for source '{}'", url, handle.alias());

        let fetch_error = |message: String| AnalyticsError::Fetch {
            alias: handle.alias().to_string(),
            entity: kind,
            message,
        };

        let res = self
            .client
            .get(&url)
            .header(TOKEN_HEADER, handle.token())
            .send()
            .await
            .map_err(|e| fetch_error(e.to_string()))?;

        let status = res.status();
        if status != StatusCode::OK {
            let body = res.text().await.unwrap_or_default();
            return Err(fetch_error(format!("status {}: {}", status, body)));
        }

        let records: Vec<T> = res
            .json()
            .await
            .map_err(|e| fetch_error(format!("invalid response body: {}", e)))?;
        debug!(
            "Source '{}' returned {} {}",
            handle.alias(),
            records.len(),
            kind
        );
        Ok(records)
    }
}

#[async_trait]
impl SourceConnector for SaintClient {
    async fn authenticate(&self, source: &Source) -> Result<SourceHandle> {
        let auth_error = |message: String| AnalyticsError::Auth {
            alias: source.alias.clone(),
            message,
        };

        let credentials = STANDARD.encode(format!("{}:{}", source.api_user, source.api_password));
        let res = self
            .client
            .post(Self::url(&source.api_url, LOGIN_PATH))
            .header("Authorization", format!("Basic {}", credentials))
            .header("x-api-key", &self.api_key)
            .header("x-api-id", &self.api_id)
            .json(&json!({ "terminal": self.terminal }))
            .send()
            .await
            .map_err(|e| auth_error(e.to_string()))?;

        let status = res.status();
        if status != StatusCode::OK {
            let body = res.text().await.unwrap_or_default();
            return Err(auth_error(format!("status {}: {}", status, body)));
        }

        let token = res
            .headers()
            .get(TOKEN_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .trim()
            .to_string();
        if token.is_empty() {
            return Err(auth_error("login response carried no token".to_string()));
        }

        info!("Logged into source '{}'", source.alias);
        Ok(SourceHandle::new(source, token))
    }

    async fn fetch_invoices(&self, handle: &SourceHandle) -> Result<Vec<Invoice>> {
        self.get_collection(handle, EntityKind::Invoices).await
    }

    async fn fetch_invoice_items(&self, handle: &SourceHandle) -> Result<Vec<InvoiceItem>> {
        self.get_collection(handle, EntityKind::InvoiceItems).await
    }

    async fn fetch_purchases(&self, handle: &SourceHandle) -> Result<Vec<Purchase>> {
        self.get_collection(handle, EntityKind::Purchases).await
    }

    async fn fetch_receivables(&self, handle: &SourceHandle) -> Result<Vec<Receivable>> {
        self.get_collection(handle, EntityKind::Receivables).await
    }

    async fn fetch_payables(&self, handle: &SourceHandle) -> Result<Vec<Payable>> {
        self.get_collection(handle, EntityKind::Payables).await
    }

    async fn fetch_products(&self, handle: &SourceHandle) -> Result<Vec<Product>> {
        self.get_collection(handle, EntityKind::Products).await
    }

    async fn fetch_customers(&self, handle: &SourceHandle) -> Result<Vec<Customer>> {
        self.get_collection(handle, EntityKind::Customers).await
    }

    async fn fetch_sellers(&self, handle: &SourceHandle) -> Result<Vec<Seller>> {
        self.get_collection(handle, EntityKind::Sellers).await
    }
}
