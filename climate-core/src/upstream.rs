//! Clients for the public APIs behind the backend endpoints.

use reqwest::Client;
use thiserror::Error;

use crate::config::ServerConfig;

pub mod cerulean;
pub mod firms;
pub mod open_meteo;

#[derive(Debug, Error)]
pub enum UpstreamError {
    /// Transport failure or a non-2xx answer from the public API.
    #[error(transparent)]
    Request(#[from] reqwest::Error),

    /// The public API answered, but not in the shape we extract from.
    #[error("{0}")]
    Processing(String),

    #[error("{0}")]
    NotConfigured(String),
}

/// Base URLs and credentials for the three public APIs, plus a shared client.
#[derive(Debug, Clone)]
pub struct Upstreams {
    http: Client,
    open_meteo_url: String,
    firms_url: String,
    firms_map_key: Option<String>,
    cerulean_url: String,
}

impl Upstreams {
    pub fn from_config(config: &ServerConfig) -> Self {
        let trim = |url: &str| url.trim_end_matches('/').to_string();
        Self {
            http: Client::new(),
            open_meteo_url: trim(&config.open_meteo_url),
            firms_url: trim(&config.firms_url),
            firms_map_key: config.firms_map_key.clone().filter(|k| !k.is_empty()),
            cerulean_url: trim(&config.cerulean_url),
        }
    }

    pub async fn climate(
        &self,
        latitude: &str,
        longitude: &str,
    ) -> Result<serde_json::Value, UpstreamError> {
        open_meteo::fetch_forecast(&self.http, &self.open_meteo_url, latitude, longitude).await
    }

    pub async fn fires(&self, query: &firms::FireRequest) -> Result<firms::FireBatch, UpstreamError> {
        let key = self.firms_map_key.as_deref().ok_or_else(|| {
            UpstreamError::NotConfigured("No FIRMS map key configured".to_string())
        })?;
        firms::fetch_fires(&self.http, &self.firms_url, key, query).await
    }

    pub async fn slicks(
        &self,
        query: &cerulean::SlickRequest,
    ) -> Result<cerulean::SlickBatch, UpstreamError> {
        cerulean::fetch_slicks(&self.http, &self.cerulean_url, query).await
    }
}
