use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::config::ClientConfig;
use crate::error::TokenkeeperError;

/// Safety margin subtracted from both expiry windows.
pub const GRACE_PERIOD_SECS: i64 = 10;

/// Token set returned by the token endpoint. Only the expiry fields are interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessTokenResponse {
    pub access_token: String,
    pub expires_in: u64,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub refresh_expires_in: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

/// Persisted token set plus the client-side time it was received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationRecord {
    pub iat: DateTime<Utc>,
    #[serde(rename = "atResponse", alias = "at_response")]
    pub at_response: AccessTokenResponse,
}

impl AuthorizationRecord {
    /// Stamp a response with the current client clock.
    pub fn issued_now(at_response: AccessTokenResponse) -> Self {
        Self {
            iat: Utc::now(),
            at_response,
        }
    }

    pub fn is_access_token_valid(&self, now: DateTime<Utc>) -> bool {
        is_within(self.iat, self.at_response.expires_in, now)
    }

    /// A refresh token without a stated lifetime is treated as expired.
    pub fn is_refresh_token_valid(&self, now: DateTime<Utc>) -> bool {
        match (&self.at_response.refresh_token, self.at_response.refresh_expires_in) {
            (Some(_), Some(secs)) => is_within(self.iat, secs, now),
            _ => false,
        }
    }
}

/// `now < iat + lifetime - grace`, saturating instead of overflowing.
fn is_within(iat: DateTime<Utc>, lifetime_secs: u64, now: DateTime<Utc>) -> bool {
    let deadline = i64::try_from(lifetime_secs)
        .ok()
        .and_then(|secs| Duration::try_seconds(secs - GRACE_PERIOD_SECS))
        .and_then(|window| iat.checked_add_signed(window));
    match deadline {
        Some(deadline) => now < deadline,
        None => true,
    }
}

pub async fn exchange_code(
    http: &reqwest::Client,
    client: &ClientConfig,
    code: &str,
    code_verifier: &str,
    redirect_uri: &str,
) -> Result<AccessTokenResponse, TokenkeeperError> {
    let mut form = vec![
        ("grant_type", "authorization_code"),
        ("client_id", client.client_id.as_str()),
    ];
    if let Some(secret) = client.client_secret.as_deref() {
        form.push(("client_secret", secret));
    }
    form.extend([
        ("redirect_uri", redirect_uri),
        ("code", code),
        ("code_verifier", code_verifier),
    ]);

    tracing::info!(endpoint = %client.token_endpoint, "Exchanging authorization code");
    token_request(http, &client.token_endpoint, &form).await
}

pub async fn refresh_token(
    http: &reqwest::Client,
    client: &ClientConfig,
    refresh_tok: &str,
) -> Result<AccessTokenResponse, TokenkeeperError> {
    let mut form = vec![
        ("grant_type", "refresh_token"),
        ("client_id", client.client_id.as_str()),
    ];
    if let Some(secret) = client.client_secret.as_deref() {
        form.push(("client_secret", secret));
    }
    form.push(("refresh_token", refresh_tok));

    tracing::info!(endpoint = %client.token_endpoint, "Refreshing access token");
    token_request(http, &client.token_endpoint, &form).await
}

async fn token_request(
    http: &reqwest::Client,
    token_endpoint: &str,
    form: &[(&str, &str)],
) -> Result<AccessTokenResponse, TokenkeeperError> {
    let resp = http
        .post(token_endpoint)
        .form(form)
        .send()
        .await
        .map_err(|e| TokenkeeperError::HttpError(format!("Token request failed: {e}")))?;

    if !resp.status().is_success() {
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        return Err(TokenkeeperError::Exchange { status, body });
    }

    resp.json().await.map_err(|e| {
        TokenkeeperError::HttpError(format!("Failed to parse token response: {e}"))
    })
}
