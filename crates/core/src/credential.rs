//! Session credential acquisition.

use crate::error::CredentialFetchError;
use async_trait::async_trait;
use reqwest::{Client, Url};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, instrument};

/// Short-lived access token authorizing one realtime session.
///
/// The token is opaque to the widget. Its `Debug` output is redacted so it can
/// never end up in logs.
#[derive(Debug)]
pub struct Credential(SecretString);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(SecretString::from(token.into()))
    }

    /// Returns the raw token for use as bearer auth.
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

/// Something that can hand out a credential for the given identity.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CredentialSource: Send + Sync {
    async fn fetch_credential(&self, identity: &str) -> Result<Credential, CredentialFetchError>;
}

/// Fetches credentials from the backend's `getToken` endpoint.
#[derive(Clone, Debug)]
pub struct HttpCredentialFetcher {
    client: Client,
    backend_base_url: String,
}

impl HttpCredentialFetcher {
    pub fn new(backend_base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), backend_base_url)
    }

    pub fn with_client(client: Client, backend_base_url: impl Into<String>) -> Self {
        Self {
            client,
            backend_base_url: backend_base_url.into(),
        }
    }
}

#[async_trait]
impl CredentialSource for HttpCredentialFetcher {
    async fn fetch_credential(&self, identity: &str) -> Result<Credential, CredentialFetchError> {
        fetch_credential(&self.client, identity, &self.backend_base_url).await
    }
}

/// Performs a single `GET {backend_base_url}/getToken?name={identity}`.
///
/// The response body is taken verbatim as the token. There is no retry; a
/// failed fetch ends the session attempt.
#[instrument(skip(client), err(Display))]
pub async fn fetch_credential(
    client: &Client,
    identity: &str,
    backend_base_url: &str,
) -> Result<Credential, CredentialFetchError> {
    let base = backend_base_url.trim();
    if base.is_empty() {
        return Err(CredentialFetchError::MissingBackendUrl);
    }

    let mut url = Url::parse(&format!("{}/getToken", base.trim_end_matches('/')))
        .map_err(|e| CredentialFetchError::InvalidBackendUrl(base.to_string(), e.to_string()))?;
    url.query_pairs_mut().append_pair("name", identity);

    debug!(%url, "Requesting session token");
    let response = client
        .get(url)
        .send()
        .await
        .map_err(CredentialFetchError::Network)?;

    let status = response.status();
    if !status.is_success() {
        return Err(CredentialFetchError::Rejected(status));
    }

    let token = response
        .text()
        .await
        .map_err(CredentialFetchError::Network)?;
    debug!(token_len = token.len(), "Session token received");
    Ok(Credential::new(token))
}
