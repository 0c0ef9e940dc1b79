use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use lightmap_shared::DIVISIONS;

use crate::error::ConfigError;

pub const DEFAULT_UPSTREAM_PREDICT_URL: &str =
    "https://light-pollution-visualizer.duckdns.org/ml_model_pred/predict/";
pub const DEFAULT_UPSTREAM_TIMEOUT_MS: u64 = 90_000;
pub const DEFAULT_UPSTREAM_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_SERVER_PORT: u16 = 3000;
pub const DEFAULT_STATIC_DIR: &str = "dashboard/dist";
pub const USER_AGENT: &str = "lightmap/0.1";

pub fn upstream_predict_url() -> String {
    std::env::var("UPSTREAM_PREDICT_URL")
        .ok()
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| DEFAULT_UPSTREAM_PREDICT_URL.to_owned())
}

pub fn upstream_timeout() -> Duration {
    std::env::var("UPSTREAM_TIMEOUT_MS")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .filter(|value| *value > 0)
        .map(Duration::from_millis)
        .unwrap_or_else(|| Duration::from_millis(DEFAULT_UPSTREAM_TIMEOUT_MS))
}

pub fn upstream_connect_timeout() -> Duration {
    std::env::var("UPSTREAM_CONNECT_TIMEOUT_SECS")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .filter(|value| *value > 0)
        .map(Duration::from_secs)
        .unwrap_or_else(|| Duration::from_secs(DEFAULT_UPSTREAM_CONNECT_TIMEOUT_SECS))
}

pub fn server_port() -> u16 {
    std::env::var("SERVER_PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(DEFAULT_SERVER_PORT)
}

pub fn static_dir() -> PathBuf {
    std::env::var("STATIC_DIR")
        .ok()
        .filter(|value| !value.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_STATIC_DIR))
}

/// Ordered, duplicate-free list of divisions queried on every fan-out round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionSet(Arc<[String]>);

impl RegionSet {
    pub fn new<I, S>(names: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        if names.is_empty() {
            return Err(ConfigError::EmptyRegionSet);
        }

        let mut seen = HashSet::new();
        for (index, name) in names.iter().enumerate() {
            if name.trim().is_empty() {
                return Err(ConfigError::BlankRegion { index });
            }
            if !seen.insert(name.as_str()) {
                return Err(ConfigError::DuplicateRegion(name.clone()));
            }
        }

        Ok(Self(names.into()))
    }

    /// The seven administrative divisions shown on the dashboard.
    #[cfg(test)]
    pub fn divisions() -> Self {
        Self::new(DIVISIONS).expect("built-in division list is valid")
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.iter().any(|region| region == name)
    }
}

#[derive(Debug, Clone)]
pub struct ProxyConfig {
    pub upstream_url: reqwest::Url,
    pub upstream_timeout: Duration,
    pub upstream_connect_timeout: Duration,
    pub regions: RegionSet,
    pub server_port: u16,
    pub static_dir: PathBuf,
}

impl ProxyConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let raw_url = upstream_predict_url();
        let upstream_url =
            reqwest::Url::parse(&raw_url).map_err(|e| ConfigError::InvalidUpstreamUrl {
                url: raw_url.clone(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            upstream_url,
            upstream_timeout: upstream_timeout(),
            upstream_connect_timeout: upstream_connect_timeout(),
            regions: RegionSet::new(DIVISIONS)?,
            server_port: server_port(),
            static_dir: static_dir(),
        })
    }

    /// Defaults for everything except the prediction endpoint.
    #[cfg(test)]
    pub fn with_upstream(upstream_url: reqwest::Url) -> Self {
        Self {
            upstream_url,
            upstream_timeout: Duration::from_millis(DEFAULT_UPSTREAM_TIMEOUT_MS),
            upstream_connect_timeout: Duration::from_secs(DEFAULT_UPSTREAM_CONNECT_TIMEOUT_SECS),
            regions: RegionSet::divisions(),
            server_port: DEFAULT_SERVER_PORT,
            static_dir: PathBuf::from(DEFAULT_STATIC_DIR),
        }
    }
}
