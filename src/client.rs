use crate::config::{ClientBuilder, Connection, ImpersonationChain};
use crate::error::{Error, Result};
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
pub(crate) struct DelegatedToken {
    token: String,
    expires_at: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenResponse {
    access_token: String,
    expire_time: String,
}

/// Authenticated handle over the Campaign Manager reporting API, scoped to
/// one connection, API version, and optional impersonation chain.
pub struct CampaignManagerClient {
    pub(crate) client: ClientWithMiddleware,
    pub(crate) connection: Connection,
    pub(crate) api_version: String,
    pub(crate) impersonation_chain: Option<ImpersonationChain>,
    pub(crate) delegated_token: RwLock<Option<DelegatedToken>>,
    pub(crate) report_timeout: Duration,
}

impl CampaignManagerClient {
    pub fn new(connection_id: impl Into<String>) -> Result<Self> {
        Self::builder().connection_id(connection_id).build()
    }

    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    pub(crate) fn from_builder(builder: ClientBuilder) -> Result<Self> {
        builder.validate()?;
        let config = builder.get_config();
        let client = builder.build_http_client()?;
        let connection = Connection::resolve(&config.connection_id)?;

        Ok(Self {
            client,
            connection,
            api_version: config.api_version,
            impersonation_chain: config.impersonation_chain,
            delegated_token: RwLock::new(None),
            report_timeout: config.report_timeout,
        })
    }

    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    pub(crate) fn profile_url(&self, profile_id: &str) -> String {
        format!(
            "{}/dfareporting/{}/userprofiles/{}",
            self.connection.base_url, self.api_version, profile_id
        )
    }

    async fn fetch_delegated_token(&self) -> Result<DelegatedToken> {
        let chain = self
            .impersonation_chain
            .as_ref()
            .ok_or(Error::CredentialsRequired)?;
        let target = chain.target().ok_or(Error::CredentialsRequired)?;
        let base_token = self
            .connection
            .access_token
            .as_ref()
            .ok_or(Error::CredentialsRequired)?;

        let url = format!(
            "{}/projects/-/serviceAccounts/{}:generateAccessToken",
            self.connection.token_uri, target
        );

        let delegates: Vec<String> = chain
            .delegates()
            .iter()
            .map(|account| format!("projects/-/serviceAccounts/{}", account))
            .collect();

        let body = serde_json::json!({
            "delegates": delegates,
            "scope": ["https://www.googleapis.com/auth/dfareporting"],
            "lifetime": "3600s",
        });

        tracing::debug!("Minting delegated token for {}", target);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", base_token))
            .header("Content-Type", "application/json")
            .body(body.to_string())
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to fetch delegated token".to_string());
            return Err(Error::TokenFetchFailed { status, message });
        }

        let token_response: TokenResponse = response
            .json()
            .await
            .map_err(|e| Error::BadResponse(format!("Failed to parse token response: {}", e)))?;

        let expires_at = chrono::DateTime::parse_from_rfc3339(&token_response.expire_time)
            .map_err(|_| Error::BadResponse("Invalid expireTime in token response".to_string()))?
            .timestamp()
            .max(0) as u64;

        Ok(DelegatedToken {
            token: token_response.access_token,
            expires_at,
        })
    }

    /// Token attached to outgoing requests. Mints and caches a delegated
    /// token when an impersonation chain is configured; `None` means the
    /// connection is anonymous.
    pub(crate) async fn access_token(&self) -> Result<Option<String>> {
        if self.impersonation_chain.is_none() {
            return Ok(self.connection.access_token.clone());
        }

        let current_time = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs();

        {
            let token_guard = self.delegated_token.read().await;
            if let Some(token) = token_guard.as_ref() {
                if token.expires_at > current_time + 300 {
                    return Ok(Some(token.token.clone()));
                }
            }
        }

        let new_token = self.fetch_delegated_token().await?;
        let token_string = new_token.token.clone();
        {
            let mut token_guard = self.delegated_token.write().await;
            *token_guard = Some(new_token);
        }

        Ok(Some(token_string))
    }
}
