pub mod http_mock;

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use chrono::{Duration, Utc};
use reqwest::Url;
use tokenkeeper::oauth::{AccessTokenResponse, AuthorizationRecord, BrowserLauncher};

/// How the simulated user's browser answers the authorization request.
#[allow(dead_code)]
#[derive(Clone)]
pub enum Reply {
    /// Redirect back with `code` and the state from the authorization URL.
    Code(&'static str),
    /// Redirect back with `code` and a different state.
    WrongState(&'static str),
    /// Redirect back with a provider error.
    Error(&'static str, &'static str),
    /// Never come back.
    Nothing,
}

/// A browser stand-in that follows the authorization URL's redirect_uri.
#[allow(dead_code)]
pub struct ScriptedBrowser {
    reply: Reply,
    opened: AtomicUsize,
    last_url: Mutex<Option<String>>,
}

#[allow(dead_code)]
impl ScriptedBrowser {
    pub fn new(reply: Reply) -> Self {
        Self {
            reply,
            opened: AtomicUsize::new(0),
            last_url: Mutex::new(None),
        }
    }

    pub fn times_opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn last_url(&self) -> Option<String> {
        self.last_url.lock().unwrap().clone()
    }
}

impl BrowserLauncher for ScriptedBrowser {
    fn open(&self, url: &str) -> std::io::Result<()> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        *self.last_url.lock().unwrap() = Some(url.to_string());

        let auth_url = Url::parse(url).unwrap();
        let param = |name: &str| {
            auth_url
                .query_pairs()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.into_owned())
                .unwrap()
        };
        let port = Url::parse(&param("redirect_uri")).unwrap().port().unwrap();
        let state = param("state");

        let query = match &self.reply {
            Reply::Code(code) => format!("code={code}&state={state}"),
            Reply::WrongState(code) => format!("code={code}&state=not-{state}"),
            Reply::Error(error, description) => {
                format!("error={error}&error_description={description}&state={state}")
            }
            Reply::Nothing => return Ok(()),
        };
        let redirect = format!("http://127.0.0.1:{port}/?{query}");
        tokio::spawn(async move {
            let _ = reqwest::get(redirect).await;
        });
        Ok(())
    }
}

#[allow(dead_code)]
pub fn free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

/// A cache record issued `age_secs` ago.
#[allow(dead_code)]
pub fn record_aged(
    access_token: &str,
    expires_in: u64,
    refresh_expires_in: u64,
    age_secs: i64,
) -> AuthorizationRecord {
    AuthorizationRecord {
        iat: Utc::now() - Duration::seconds(age_secs),
        at_response: AccessTokenResponse {
            access_token: access_token.into(),
            expires_in,
            refresh_token: Some(format!("{access_token}-refresh")),
            refresh_expires_in: Some(refresh_expires_in),
            token_type: Some("Bearer".into()),
            scope: None,
        },
    }
}

/// Write a public-client profile pointing at `auth_server_url`.
#[allow(dead_code)]
pub fn write_profile(config_dir: &Path, name: &str, auth_server_url: &str) {
    let profile = serde_json::json!({
        "realm": http_mock::REALM,
        "auth-server-url": auth_server_url,
        "resource": "tokenkeeper-test",
        "public-client": true
    });
    std::fs::create_dir_all(config_dir).unwrap();
    std::fs::write(
        config_dir.join(format!("{name}.json")),
        serde_json::to_string_pretty(&profile).unwrap(),
    )
    .unwrap();
}
