use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Duration;

use reqwest::Url;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::{timeout_at, Instant};

use crate::config::ClientConfig;
use crate::error::TokenkeeperError;
use crate::oauth::browser::{open_authorization_url, BrowserLauncher};
use crate::oauth::pkce::PkceMaterial;
use crate::oauth::token::{exchange_code, AccessTokenResponse};

pub const REDIRECT_PATH: &str = "/";

const MAX_REQUEST_HEAD: usize = 16 * 1024;

/// How long a single connection may take to send its request head. Browsers
/// open speculative connections that never send anything.
const REQUEST_READ_TIMEOUT: Duration = Duration::from_secs(5);

const SUCCESS_PAGE: &str = "<!DOCTYPE html><html><body><h1>Login successful</h1>\
    <p>You can close this window and return to the terminal.</p></body></html>";
const FAILURE_PAGE: &str = "<!DOCTYPE html><html><body><h1>Login failed</h1>\
    <p>You can close this window. Details are shown in the terminal.</p></body></html>";
const NOT_FOUND_PAGE: &str = "<!DOCTYPE html><html><body><p>Not found.</p></body></html>";
const BAD_REQUEST_PAGE: &str =
    "<!DOCTYPE html><html><body><p>Missing authorization response parameters.</p></body></html>";

#[derive(Debug, Clone, Copy)]
pub struct ListenerOptions {
    pub port: u16,
    pub timeout: Duration,
}

pub fn redirect_uri(port: u16) -> String {
    format!("http://localhost:{port}{REDIRECT_PATH}")
}

/// What the identity provider sent back to the redirect URI.
#[derive(Debug, PartialEq, Eq)]
enum Redirect {
    Denied {
        error: String,
        description: Option<String>,
    },
    Code {
        code: String,
        state: Option<String>,
    },
}

/// Non-terminating requests, answered with a fallback page.
#[derive(Debug, PartialEq, Eq)]
enum Rejection {
    NotFound,
    MethodNotAllowed,
    BadRequest,
}

impl Rejection {
    fn status_line(&self) -> &'static str {
        match self {
            Rejection::NotFound => "404 Not Found",
            Rejection::MethodNotAllowed => "405 Method Not Allowed",
            Rejection::BadRequest => "400 Bad Request",
        }
    }

    fn page(&self) -> &'static str {
        match self {
            Rejection::BadRequest => BAD_REQUEST_PAGE,
            _ => NOT_FOUND_PAGE,
        }
    }
}

pub fn build_authorization_url(
    client: &ClientConfig,
    pkce: &PkceMaterial,
    redirect_uri: &str,
) -> Result<Url, TokenkeeperError> {
    Url::parse_with_params(
        &client.authorization_endpoint,
        &[
            ("client_id", client.client_id.as_str()),
            ("redirect_uri", redirect_uri),
            ("response_type", "code"),
            ("code_challenge", pkce.code_challenge.as_str()),
            ("code_challenge_method", "S256"),
            ("state", pkce.state.as_str()),
        ],
    )
    .map_err(|e| {
        TokenkeeperError::DiscoveryError(format!(
            "Invalid authorization endpoint '{}': {e}",
            client.authorization_endpoint
        ))
    })
}

/// Loopback listener for the redirect. IPv4 is required; `::1` is served too
/// when available, since `localhost` may resolve to either.
struct RedirectListener {
    v4: TcpListener,
    v6: Option<TcpListener>,
}

impl RedirectListener {
    /// Port 0 picks an ephemeral port, which the IPv6 socket then shares.
    async fn bind(port: u16) -> std::io::Result<Self> {
        let v4 = TcpListener::bind(("127.0.0.1", port)).await?;
        let port = v4.local_addr()?.port();
        let v6 = match TcpListener::bind(("::1", port)).await {
            Ok(listener) => Some(listener),
            Err(e) => {
                tracing::debug!(port, "Not listening on [::1]: {e}");
                None
            }
        };
        Ok(Self { v4, v6 })
    }

    fn port(&self) -> std::io::Result<u16> {
        Ok(self.v4.local_addr()?.port())
    }

    async fn accept(&self) -> std::io::Result<(TcpStream, SocketAddr)> {
        match &self.v6 {
            Some(v6) => tokio::select! {
                accepted = self.v4.accept() => accepted,
                accepted = v6.accept() => accepted,
            },
            None => self.v4.accept().await,
        }
    }
}

/// Run one authorization code round trip: listen on the redirect port, send the
/// user to the provider, validate the single redirect and exchange its code.
///
/// The listening socket is closed before this returns, on every path.
pub async fn authorize(
    http: &reqwest::Client,
    client: &ClientConfig,
    pkce: PkceMaterial,
    options: ListenerOptions,
    browser: &dyn BrowserLauncher,
) -> Result<AccessTokenResponse, TokenkeeperError> {
    let listener = RedirectListener::bind(options.port).await?;
    let redirect_uri = redirect_uri(listener.port()?);
    let auth_url = build_authorization_url(client, &pkce, &redirect_uri)?;

    open_authorization_url(browser, auth_url.as_str());

    let deadline = Instant::now() + options.timeout;
    let waited = wait_for_redirect(&listener, deadline, options.timeout).await;
    drop(listener);
    let (mut stream, redirect) = waited?;

    let outcome = complete(http, client, &pkce, &redirect_uri, redirect).await;

    let page = if outcome.is_ok() { SUCCESS_PAGE } else { FAILURE_PAGE };
    if let Err(e) = write_response(&mut stream, "200 OK", page).await {
        tracing::debug!("Failed to answer the browser: {e}");
    }

    outcome
}

async fn wait_for_redirect(
    listener: &RedirectListener,
    deadline: Instant,
    timeout: Duration,
) -> Result<(TcpStream, Redirect), TokenkeeperError> {
    loop {
        let (mut stream, peer) = timeout_at(deadline, listener.accept())
            .await
            .map_err(|_| TokenkeeperError::CallbackTimeout(timeout))??;

        let read_deadline = deadline.min(Instant::now() + REQUEST_READ_TIMEOUT);
        let head = match timeout_at(read_deadline, read_request_head(&mut stream)).await {
            Ok(Ok(head)) => head,
            Ok(Err(e)) => {
                tracing::debug!(%peer, "Dropping callback connection: {e}");
                continue;
            }
            Err(_) if read_deadline == deadline => {
                return Err(TokenkeeperError::CallbackTimeout(timeout));
            }
            Err(_) => {
                tracing::debug!(%peer, "Dropping idle callback connection");
                continue;
            }
        };

        match parse_redirect(&head) {
            Ok(redirect) => return Ok((stream, redirect)),
            Err(rejection) => {
                tracing::debug!(%peer, ?rejection, "Ignoring non-redirect request");
                let _ = write_response(&mut stream, rejection.status_line(), rejection.page()).await;
            }
        }
    }
}

async fn complete(
    http: &reqwest::Client,
    client: &ClientConfig,
    pkce: &PkceMaterial,
    redirect_uri: &str,
    redirect: Redirect,
) -> Result<AccessTokenResponse, TokenkeeperError> {
    match redirect {
        Redirect::Denied { error, description } => {
            tracing::warn!(%error, "Identity provider returned an error");
            Err(TokenkeeperError::ProviderAuth { error, description })
        }
        Redirect::Code { code, state } => {
            if state.as_deref() != Some(pkce.state.as_str()) {
                tracing::error!("Callback state does not match this login attempt; refusing to exchange the code");
                return Err(TokenkeeperError::StateMismatch);
            }
            exchange_code(http, client, &code, &pkce.code_verifier, redirect_uri).await
        }
    }
}

async fn read_request_head(stream: &mut TcpStream) -> std::io::Result<String> {
    let mut buf = Vec::with_capacity(1024);
    let mut chunk = [0u8; 1024];
    loop {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        if buf.windows(4).any(|w| w == b"\r\n\r\n") || buf.len() >= MAX_REQUEST_HEAD {
            break;
        }
    }
    if buf.is_empty() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            "connection closed before a request was sent",
        ));
    }
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

fn parse_redirect(head: &str) -> Result<Redirect, Rejection> {
    // "GET /?code=...&state=... HTTP/1.1"
    let mut request_line = head.lines().next().unwrap_or_default().split_whitespace();
    let method = request_line.next().ok_or(Rejection::BadRequest)?;
    let target = request_line.next().ok_or(Rejection::BadRequest)?;

    let url = Url::parse(&format!("http://localhost{target}")).map_err(|_| Rejection::NotFound)?;
    if url.path() != REDIRECT_PATH {
        return Err(Rejection::NotFound);
    }
    if method != "GET" {
        return Err(Rejection::MethodNotAllowed);
    }

    let params: HashMap<String, String> = url.query_pairs().into_owned().collect();
    if let Some(error) = params.get("error") {
        return Ok(Redirect::Denied {
            error: error.clone(),
            description: params.get("error_description").cloned(),
        });
    }
    match params.get("code").filter(|c| !c.is_empty()) {
        Some(code) => Ok(Redirect::Code {
            code: code.clone(),
            state: params.get("state").cloned(),
        }),
        None => Err(Rejection::BadRequest),
    }
}

async fn write_response(
    stream: &mut TcpStream,
    status_line: &str,
    body: &str,
) -> std::io::Result<()> {
    let response = format!(
        "HTTP/1.1 {status_line}\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        body.len(),
        body
    );
    stream.write_all(response.as_bytes()).await?;
    stream.shutdown().await
}
