use crate::error::{Error, Result};
use reqwest_middleware::{ClientBuilder as MiddlewareClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_API_VERSION: &str = "v4";
pub const DEFAULT_CONNECTION_ID: &str = "google_cloud_default";

const DEFAULT_BASE_URL: &str = "https://dfareporting.googleapis.com";
const DEFAULT_TOKEN_URI: &str = "https://iamcredentials.googleapis.com/v1";
const CONNECTION_ENV_PREFIX: &str = "CM360_CONN_";

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

/// Resolved transport and credential details for one connection id.
#[derive(Debug, Clone, Deserialize)]
pub struct Connection {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

impl Default for Connection {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            access_token: None,
            token_uri: default_token_uri(),
        }
    }
}

impl Connection {
    /// Resolve a connection id against the environment.
    ///
    /// Reads `CM360_CONN_<ID>` (id uppercased, `-` mapped to `_`) as a JSON
    /// object. A missing variable yields the default anonymous connection.
    pub fn resolve(connection_id: &str) -> Result<Self> {
        let var = format!(
            "{}{}",
            CONNECTION_ENV_PREFIX,
            connection_id.to_uppercase().replace('-', "_")
        );

        match std::env::var(&var) {
            Ok(raw) => serde_json::from_str(&raw)
                .map_err(|e| Error::Config(format!("invalid connection {}: {}", connection_id, e))),
            Err(_) => Ok(Self::default()),
        }
    }
}

/// Ordered chain of service-account identities used to mint delegated
/// short-lived credentials. The last identity is the one impersonated in
/// requests; each earlier identity must be able to mint tokens for the next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImpersonationChain(Vec<String>);

impl ImpersonationChain {
    pub fn identities(&self) -> &[String] {
        &self.0
    }

    /// The identity impersonated in requests.
    pub fn target(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    /// The identities preceding the target, in delegation order.
    pub fn delegates(&self) -> &[String] {
        match self.0.len() {
            0 | 1 => &[],
            n => &self.0[..n - 1],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for ImpersonationChain {
    fn from(account: &str) -> Self {
        Self(vec![account.to_string()])
    }
}

impl From<String> for ImpersonationChain {
    fn from(account: String) -> Self {
        Self(vec![account])
    }
}

impl From<Vec<String>> for ImpersonationChain {
    fn from(accounts: Vec<String>) -> Self {
        Self(accounts)
    }
}

#[derive(Debug, Clone)]
pub(crate) struct ClientConfig {
    pub connection_id: String,
    pub api_version: String,
    pub impersonation_chain: Option<ImpersonationChain>,
    pub timeout: Duration,
    pub report_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            connection_id: DEFAULT_CONNECTION_ID.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            impersonation_chain: None,
            timeout: Duration::from_secs(30),
            report_timeout: Duration::from_secs(3600),
        }
    }
}

#[derive(Default)]
pub struct ClientBuilder {
    config: ClientConfig,
}

impl ClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connection_id(mut self, connection_id: impl Into<String>) -> Self {
        self.config.connection_id = connection_id.into();
        self
    }

    pub fn api_version(mut self, api_version: impl Into<String>) -> Self {
        self.config.api_version = api_version.into();
        self
    }

    pub fn impersonation_chain(mut self, chain: impl Into<ImpersonationChain>) -> Self {
        self.config.impersonation_chain = Some(chain.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    pub fn report_timeout(mut self, timeout: Duration) -> Self {
        self.config.report_timeout = timeout;
        self
    }

    pub(crate) fn build_http_client(&self) -> Result<ClientWithMiddleware> {
        let retry_policy = ExponentialBackoff::builder()
            .retry_bounds(Duration::from_millis(500), Duration::from_secs(10))
            .build_with_max_retries(3);

        let reqwest_client = reqwest::Client::builder()
            .timeout(self.config.timeout)
            .build()
            .map_err(Error::Http)?;

        let client = MiddlewareClientBuilder::new(reqwest_client)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Ok(client)
    }

    pub(crate) fn get_config(&self) -> ClientConfig {
        self.config.clone()
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.config.connection_id.is_empty() {
            return Err(Error::Config("Connection id is required".to_string()));
        }

        if let Some(chain) = &self.config.impersonation_chain {
            if chain.is_empty() {
                return Err(Error::Config(
                    "Impersonation chain cannot be empty".to_string(),
                ));
            }
        }

        Ok(())
    }

    pub fn build(self) -> Result<crate::client::CampaignManagerClient> {
        crate::client::CampaignManagerClient::from_builder(self)
    }
}
