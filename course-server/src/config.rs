//! Runtime settings read from the environment.
//!
//! A `.env` file in the working directory is loaded first when present.
//! Unset or empty provider URLs leave that provider unconfigured.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::client::{ClientConfig, ClientError};
use crate::search::SearchError;

const DEFAULT_BIND: &str = "127.0.0.1:3000";
const DEFAULT_TASK_TTL_SECS: u64 = 3600;
const DEFAULT_OUTBOUND_TIMEOUT_SECS: u64 = 10;
const DEFAULT_PROPOSER_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} must be a whole number, got {value:?}")]
    InvalidNumber { var: &'static str, value: String },

    #[error("{var} is not a socket address: {value:?}")]
    InvalidAddress { var: &'static str, value: String },

    #[error("no place search configured: set SEARCH_URL or SEARCH_FIXTURE")]
    MissingSearch,

    #[error("failed to build client: {0}")]
    Client(#[from] ClientError),

    #[error("failed to load search fixture: {0}")]
    Fixture(#[from] SearchError),
}

/// Where place search hits come from.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchSource {
    Http(ClientConfig),
    /// A JSON file of hits, for offline runs.
    Fixture(PathBuf),
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind: SocketAddr,
    pub regional_route: Option<ClientConfig>,
    pub general_route: Option<ClientConfig>,
    pub search: SearchSource,
    pub geocoder: Option<ClientConfig>,
    pub proposer: Option<ClientConfig>,
    /// How long finished task records are kept.
    pub task_ttl: Duration,
    /// Per-request timeout for search, geocoding and routing calls.
    pub outbound_timeout_secs: u64,
    /// How long one course proposal may take.
    pub proposer_timeout_secs: u64,
}

impl AppConfig {
    /// Read settings from the process environment (and `.env`).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Read settings through `lookup`, which maps a variable name to its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |var: &str| lookup(var).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let bind_text = get("COURSE_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind = bind_text.parse().map_err(|_| ConfigError::InvalidAddress {
            var: "COURSE_BIND",
            value: bind_text.clone(),
        })?;

        let number = |var: &'static str, default: u64| -> Result<u64, ConfigError> {
            match get(var) {
                None => Ok(default),
                Some(value) => value
                    .parse()
                    .map_err(|_| ConfigError::InvalidNumber { var, value }),
            }
        };
        let task_ttl = Duration::from_secs(number("TASK_TTL_SECS", DEFAULT_TASK_TTL_SECS)?);
        let outbound_timeout_secs = number("OUTBOUND_TIMEOUT_SECS", DEFAULT_OUTBOUND_TIMEOUT_SECS)?;
        let proposer_timeout_secs = number("PROPOSER_TIMEOUT_SECS", DEFAULT_PROPOSER_TIMEOUT_SECS)?;

        let endpoint = |url_var: &str, key_var: Option<&str>| {
            get(url_var).map(|url| {
                ClientConfig::new(url)
                    .with_api_key(key_var.and_then(&get))
                    .with_timeout(outbound_timeout_secs)
            })
        };

        let search = match (get("SEARCH_FIXTURE"), endpoint("SEARCH_URL", Some("SEARCH_KEY"))) {
            (Some(path), _) => SearchSource::Fixture(PathBuf::from(path)),
            (None, Some(config)) => SearchSource::Http(config),
            (None, None) => return Err(ConfigError::MissingSearch),
        };

        Ok(Self {
            bind,
            regional_route: endpoint("REGIONAL_ROUTE_URL", Some("REGIONAL_ROUTE_KEY")),
            general_route: endpoint("GENERAL_ROUTE_URL", Some("GENERAL_ROUTE_KEY")),
            search,
            geocoder: endpoint("GEOCODER_URL", None),
            proposer: endpoint("PROPOSER_URL", Some("PROPOSER_KEY"))
                .map(|c| c.with_timeout(proposer_timeout_secs)),
            task_ttl,
            outbound_timeout_secs,
            proposer_timeout_secs,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|k| vars.get(k).cloned())
    }

    #[test]
    fn defaults_with_fixture_search() {
        let config = config(&[("SEARCH_FIXTURE", "hits.json")]).unwrap();

        assert_eq!(config.bind, "127.0.0.1:3000".parse().unwrap());
        assert_eq!(config.search, SearchSource::Fixture(PathBuf::from("hits.json")));
        assert!(config.regional_route.is_none());
        assert!(config.general_route.is_none());
        assert!(config.proposer.is_none());
        assert_eq!(config.task_ttl, Duration::from_secs(3600));
        assert_eq!(config.outbound_timeout_secs, 10);
        assert_eq!(config.proposer_timeout_secs, 60);
    }

    #[test]
    fn endpoints_carry_keys_and_timeout() {
        let config = config(&[
            ("SEARCH_URL", "https://search.example/v1"),
            ("SEARCH_KEY", "s3cret"),
            ("REGIONAL_ROUTE_URL", "https://regional.example/route"),
            ("REGIONAL_ROUTE_KEY", ""),
            ("OUTBOUND_TIMEOUT_SECS", "4"),
        ])
        .unwrap();

        let SearchSource::Http(search) = &config.search else {
            panic!("expected http search, got {:?}", config.search);
        };
        assert_eq!(search.api_key.as_deref(), Some("s3cret"));
        assert_eq!(search.timeout_secs, 4);

        let regional = config.regional_route.unwrap();
        assert_eq!(regional.base_url, "https://regional.example/route");
        assert_eq!(regional.api_key, None);
        assert_eq!(regional.timeout_secs, 4);
    }

    #[test]
    fn proposer_has_its_own_timeout() {
        let default = config(&[
            ("SEARCH_FIXTURE", "a.json"),
            ("PROPOSER_URL", "https://llm.example/plan"),
            ("OUTBOUND_TIMEOUT_SECS", "5"),
        ])
        .unwrap();
        assert_eq!(default.proposer.unwrap().timeout_secs, 60);

        let tuned = config(&[
            ("SEARCH_FIXTURE", "a.json"),
            ("PROPOSER_URL", "https://llm.example/plan"),
            ("PROPOSER_TIMEOUT_SECS", "90"),
        ])
        .unwrap();
        assert_eq!(tuned.proposer_timeout_secs, 90);
        assert_eq!(tuned.proposer.unwrap().timeout_secs, 90);
    }

    #[test]
    fn fixture_takes_precedence_over_url() {
        let config = config(&[("SEARCH_FIXTURE", "a.json"), ("SEARCH_URL", "https://x")]).unwrap();
        assert!(matches!(config.search, SearchSource::Fixture(_)));
    }

    #[test]
    fn errors() {
        assert!(matches!(config(&[]), Err(ConfigError::MissingSearch)));
        assert!(matches!(
            config(&[("SEARCH_FIXTURE", "a.json"), ("TASK_TTL_SECS", "an hour")]),
            Err(ConfigError::InvalidNumber { var: "TASK_TTL_SECS", .. })
        ));
        assert!(matches!(
            config(&[("SEARCH_FIXTURE", "a.json"), ("COURSE_BIND", "localhost")]),
            Err(ConfigError::InvalidAddress { .. })
        ));
    }
}
