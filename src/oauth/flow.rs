use chrono::{DateTime, Utc};

use crate::config::{ClientConfig, Settings};
use crate::error::TokenkeeperError;
use crate::oauth::browser::BrowserLauncher;
use crate::oauth::cache::TokenCache;
use crate::oauth::callback::{authorize, ListenerOptions};
use crate::oauth::pkce::PkceMaterial;
use crate::oauth::token::{refresh_token, AccessTokenResponse, AuthorizationRecord};

/// What to do with the cached record for a profile.
#[derive(Debug, PartialEq, Eq)]
pub enum Step<'a> {
    UseCached(&'a str),
    Refresh(&'a str),
    Authorize,
}

pub fn next_step(record: Option<&AuthorizationRecord>, now: DateTime<Utc>) -> Step<'_> {
    let Some(record) = record else {
        return Step::Authorize;
    };
    if record.is_access_token_valid(now) {
        return Step::UseCached(&record.at_response.access_token);
    }
    match record.at_response.refresh_token.as_deref() {
        Some(rt) if record.is_refresh_token_valid(now) => Step::Refresh(rt),
        _ => Step::Authorize,
    }
}

/// Decides between the cache, a refresh and a full browser login for one profile.
pub struct TokenAcquirer<'a> {
    http: reqwest::Client,
    cache: TokenCache,
    listener: ListenerOptions,
    browser: &'a dyn BrowserLauncher,
}

impl<'a> TokenAcquirer<'a> {
    pub fn new(
        http: reqwest::Client,
        cache: TokenCache,
        listener: ListenerOptions,
        browser: &'a dyn BrowserLauncher,
    ) -> Self {
        Self {
            http,
            cache,
            listener,
            browser,
        }
    }

    pub fn from_settings(
        http: reqwest::Client,
        settings: &Settings,
        browser: &'a dyn BrowserLauncher,
    ) -> Self {
        Self::new(
            http,
            TokenCache::new(&settings.cache_dir),
            ListenerOptions {
                port: settings.redirect_port,
                timeout: settings.callback_timeout,
            },
            browser,
        )
    }

    /// Return a usable access token for `profile`, refreshing or logging in as needed.
    pub async fn acquire(
        &self,
        profile: &str,
        client: &ClientConfig,
    ) -> Result<String, TokenkeeperError> {
        let cached = self.cache.read(profile)?;

        let response = match next_step(cached.as_ref(), Utc::now()) {
            Step::UseCached(access_token) => {
                tracing::debug!(profile, "Using cached access token");
                return Ok(access_token.to_string());
            }
            Step::Refresh(rt) => {
                tracing::debug!(profile, "Access token expired, refreshing");
                refresh_token(&self.http, client, rt).await?
            }
            Step::Authorize => {
                tracing::debug!(profile, "No usable tokens, starting browser login");
                authorize(
                    &self.http,
                    client,
                    PkceMaterial::generate(),
                    self.listener,
                    self.browser,
                )
                .await?
            }
        };

        self.persist(profile, response)
    }

    fn persist(
        &self,
        profile: &str,
        response: AccessTokenResponse,
    ) -> Result<String, TokenkeeperError> {
        let record = AuthorizationRecord::issued_now(response);
        match self.cache.write(profile, &record) {
            Ok(()) => Ok(record.at_response.access_token),
            Err(e) => Err(TokenkeeperError::TokenNotCached {
                path: self.cache.path(profile),
                access_token: record.at_response.access_token,
                source: Box::new(e),
            }),
        }
    }
}
