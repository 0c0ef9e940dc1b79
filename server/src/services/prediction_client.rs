use std::time::Duration;

use lightmap_shared::PredictionRequest;
use reqwest::header::{ACCEPT, HeaderValue};
use serde_json::Value;
use tracing::debug;

use crate::config::{ProxyConfig, USER_AGENT};
use crate::error::{ConfigError, FetchError};

/// Client for the external prediction endpoint. Cheap to clone; clones share
/// the underlying connection pool.
#[derive(Debug, Clone)]
pub struct PredictionClient {
    http: reqwest::Client,
    url: reqwest::Url,
    timeout: Duration,
}

impl PredictionClient {
    pub fn new(http: reqwest::Client, url: reqwest::Url, timeout: Duration) -> Self {
        Self { http, url, timeout }
    }

    pub fn from_config(config: &ProxyConfig) -> Result<Self, ConfigError> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(config.upstream_connect_timeout)
            .build()?;
        Ok(Self::new(
            http,
            config.upstream_url.clone(),
            config.upstream_timeout,
        ))
    }

    pub fn url(&self) -> &reqwest::Url {
        &self.url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// POST one division/year to the prediction endpoint.
    ///
    /// The whole exchange, body included, runs under a single deadline. When it
    /// expires the request future is dropped, which aborts the connection.
    /// Any JSON body is a success and is returned as-is.
    pub async fn fetch_region(&self, region: &str, year: Option<i32>) -> Result<Value, FetchError> {
        let request = PredictionRequest {
            division: region.to_owned(),
            year,
        };

        match tokio::time::timeout(self.timeout, self.post_prediction(&request)).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout {
                region: request.division,
                after: self.timeout,
            }),
        }
    }

    async fn post_prediction(&self, request: &PredictionRequest) -> Result<Value, FetchError> {
        let network_error = |source| FetchError::Network {
            region: request.division.clone(),
            source,
        };

        let resp = self
            .http
            .post(self.url.clone())
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .json(request)
            .send()
            .await
            .map_err(network_error)?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Upstream {
                region: request.division.clone(),
                status,
            });
        }

        let body = resp.bytes().await.map_err(network_error)?;
        debug!(
            region = %request.division,
            bytes = body.len(),
            "received prediction payload"
        );

        serde_json::from_slice(&body).map_err(|source| FetchError::Decode {
            region: request.division.clone(),
            source,
        })
    }
}
