use serde::Deserialize;

use crate::config::{ClientConfig, ClientProfile};
use crate::error::TokenkeeperError;

/// The two endpoints read from an OpenID Connect discovery document.
#[derive(Debug, Deserialize)]
pub struct ProviderMetadata {
    pub authorization_endpoint: String,
    pub token_endpoint: String,
}

/// Construct the .well-known OIDC discovery URL from an issuer URL.
fn build_discovery_url(issuer: &str) -> String {
    format!(
        "{}/.well-known/openid-configuration",
        issuer.trim_end_matches('/')
    )
}

pub async fn discover_provider_metadata(
    http: &reqwest::Client,
    issuer: &str,
) -> Result<ProviderMetadata, TokenkeeperError> {
    let url = build_discovery_url(issuer);
    tracing::debug!(%url, "Fetching discovery document");
    let resp = http.get(&url).send().await.map_err(|e| {
        TokenkeeperError::DiscoveryError(format!("Failed to fetch {url}: {e}"))
    })?;

    if !resp.status().is_success() {
        return Err(TokenkeeperError::DiscoveryError(format!(
            "{url} returned status {}",
            resp.status()
        )));
    }

    resp.json().await.map_err(|e| {
        TokenkeeperError::DiscoveryError(format!("Failed to parse discovery document: {e}"))
    })
}

/// Resolve a loaded profile into endpoints and credentials.
pub async fn resolve_client_config(
    http: &reqwest::Client,
    profile: ClientProfile,
) -> Result<ClientConfig, TokenkeeperError> {
    let metadata = discover_provider_metadata(http, &profile.issuer()).await?;
    Ok(profile.into_client_config(metadata.token_endpoint, metadata.authorization_endpoint))
}
