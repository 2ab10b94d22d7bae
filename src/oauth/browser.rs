/// Opens the authorization URL for the user.
pub trait BrowserLauncher: Send + Sync {
    fn open(&self, url: &str) -> std::io::Result<()>;
}

/// Launches the user's default browser.
pub struct SystemBrowser;

impl BrowserLauncher for SystemBrowser {
    fn open(&self, url: &str) -> std::io::Result<()> {
        webbrowser::open(url)
    }
}

/// Best-effort launch. The URL is always printed so the user can open it by hand.
pub fn open_authorization_url(browser: &dyn BrowserLauncher, url: &str) {
    eprintln!("Open this URL in your browser to log in:\n\n    {url}\n");
    if let Err(e) = browser.open(url) {
        tracing::warn!("Could not open browser automatically: {e}");
    }
}
