pub mod config;
pub mod error;
pub mod oauth;

pub use config::{ClientConfig, ClientProfile, Settings};
pub use error::TokenkeeperError;
pub use oauth::{TokenAcquirer, TokenCache};

/// Load `profile`, resolve its endpoints and return an access token for it.
pub async fn access_token(
    settings: &Settings,
    profile: &str,
    browser: &dyn oauth::BrowserLauncher,
) -> Result<String, TokenkeeperError> {
    let client_profile = config::load_profile(&settings.config_dir, profile)?;
    let http = reqwest::Client::new();
    let client = oauth::resolve_client_config(&http, client_profile).await?;
    TokenAcquirer::from_settings(http, settings, browser)
        .acquire(profile, &client)
        .await
}
