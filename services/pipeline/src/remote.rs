//! Remote Reader - one bounded GET against the upstream orders endpoint
//!
//! No retries and no fallback here: any failure is returned to the caller.

use crate::config::PipelineConfig;
use crate::error::RemoteError;
use reqwest::header::AUTHORIZATION;
use serde_json::Value;
use std::time::Duration;
use tracing::{error, info, warn};

#[derive(Debug, Clone)]
pub struct RemoteReader {
    client: reqwest::Client,
    base_url: String,
    orders_path: String,
    bearer_token: Option<String>,
}

impl RemoteReader {
    pub fn new(config: &PipelineConfig) -> Result<Self, RemoteError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.remote_timeout_secs))
            .user_agent(concat!("order-pipeline/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: config.remote_base.clone(),
            orders_path: config.remote_orders_path.clone(),
            bearer_token: config.bearer_token.clone(),
        })
    }

    /// Full endpoint URL, honoring a per-call base override.
    pub fn endpoint(&self, base_override: Option<&str>) -> String {
        let base = base_override
            .map(str::trim)
            .filter(|b| !b.is_empty())
            .unwrap_or(&self.base_url);
        format!("{}{}", base.trim_end_matches('/'), self.orders_path)
    }

    /// Fetch the raw payload for `[start, end]` (upstream `basTar`/`bitTar`).
    pub async fn fetch(
        &self,
        start: &str,
        end: &str,
        base_override: Option<&str>,
    ) -> Result<Value, RemoteError> {
        self.get(
            base_override,
            &[("basTar", start.to_string()), ("bitTar", end.to_string())],
        )
        .await
    }

    /// Fetch one page of the unbounded listing (`pageIndex`/`pageSize`).
    pub async fn fetch_page(&self, page_index: u32, page_size: u32) -> Result<Value, RemoteError> {
        self.get(
            None,
            &[
                ("pageIndex", page_index.to_string()),
                ("pageSize", page_size.to_string()),
            ],
        )
        .await
    }

    async fn get(
        &self,
        base_override: Option<&str>,
        params: &[(&str, String)],
    ) -> Result<Value, RemoteError> {
        let url = self.endpoint(base_override);

        let mut request = self.client.get(&url).query(params);
        match &self.bearer_token {
            Some(token) => request = request.header(AUTHORIZATION, format!("Bearer {}", token)),
            None => warn!("REMOTE_BEARER_TOKEN not set; calling upstream without Authorization header"),
        }

        info!("Upstream GET {} params={:?}", url, params);
        let resp = request.send().await.map_err(|e| {
            error!("Upstream request failed: {}", e);
            e
        })?;

        let status = resp.status();
        info!("Upstream response status: {}", status);
        if !status.is_success() {
            // 404 bodies are often HTML pages; log the URL only
            error!("Upstream HTTP {} for {}", status.as_u16(), resp.url());
            return Err(RemoteError::Status {
                status: status.as_u16(),
                url: resp.url().to_string(),
            });
        }

        let bytes = resp.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}
