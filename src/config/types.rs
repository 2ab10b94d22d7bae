use serde::{Deserialize, Serialize};

/// Client profile as exported by the Keycloak admin console ("keycloak.json").
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ClientProfile {
    pub resource: String,
    #[serde(default)]
    pub credentials: Option<Credentials>,
    pub realm: String,
    pub auth_server_url: String,
    #[serde(default)]
    pub public_client: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub secret: String,
}

impl ClientProfile {
    /// Issuer URL of the profile's realm.
    pub fn issuer(&self) -> String {
        format!(
            "{}/realms/{}",
            self.auth_server_url.trim_end_matches('/'),
            self.realm
        )
    }

    pub fn client_secret(&self) -> Option<&str> {
        self.credentials.as_ref().map(|c| c.secret.as_str())
    }

    /// Confidential clients must carry a secret.
    pub fn validate(&self) -> Result<(), String> {
        if self.resource.is_empty() {
            return Err("`resource` (client id) must not be empty".into());
        }
        if self.auth_server_url.is_empty() || self.realm.is_empty() {
            return Err("`auth-server-url` and `realm` must not be empty".into());
        }
        if !self.public_client && self.client_secret().map_or(true, str::is_empty) {
            return Err(
                "`credentials.secret` is required unless `public-client` is true".into(),
            );
        }
        Ok(())
    }

    pub fn into_client_config(
        self,
        token_endpoint: String,
        authorization_endpoint: String,
    ) -> ClientConfig {
        ClientConfig {
            token_endpoint,
            authorization_endpoint,
            client_secret: self.credentials.map(|c| c.secret),
            client_id: self.resource,
        }
    }
}

/// Endpoints and credentials, resolved once per run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub token_endpoint: String,
    pub authorization_endpoint: String,
    pub client_id: String,
    pub client_secret: Option<String>,
}
