//! HTTP mapping adapters.

use crate::client::{ClientConfig, ClientError, JsonClient};

use super::provider::{ProviderError, RouteProvider, RouteQuery, RouteResponse};

/// Mapping provider reached over the JSON contract.
#[derive(Debug, Clone)]
pub struct HttpRouteProvider {
    client: JsonClient,
}

impl HttpRouteProvider {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        Ok(Self {
            client: JsonClient::new(config)?,
        })
    }
}

impl RouteProvider for HttpRouteProvider {
    async fn route(&self, query: &RouteQuery) -> Result<RouteResponse, ProviderError> {
        Ok(self.client.post("", query).await?)
    }
}

/// A provider slot that may be left unconfigured.
///
/// An unconfigured slot fails every call, which the router treats like
/// any other provider failure.
#[derive(Debug, Clone)]
pub enum RouteBackend {
    Http(HttpRouteProvider),
    Unconfigured(&'static str),
}

impl RouteBackend {
    /// Build from an optional endpoint config.
    pub fn from_config(name: &'static str, config: Option<ClientConfig>) -> Result<Self, ClientError> {
        match config {
            Some(config) => Ok(RouteBackend::Http(HttpRouteProvider::new(config)?)),
            None => Ok(RouteBackend::Unconfigured(name)),
        }
    }

    pub fn is_configured(&self) -> bool {
        matches!(self, RouteBackend::Http(_))
    }
}

impl RouteProvider for RouteBackend {
    async fn route(&self, query: &RouteQuery) -> Result<RouteResponse, ProviderError> {
        match self {
            RouteBackend::Http(provider) => provider.route(query).await,
            RouteBackend::Unconfigured(name) => {
                Err(ProviderError::NotConfigured(format!("{name} routing endpoint")))
            }
        }
    }
}
