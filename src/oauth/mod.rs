pub mod browser;
pub mod cache;
pub mod callback;
pub mod discovery;
pub mod flow;
pub mod pkce;
pub mod token;

pub use browser::{BrowserLauncher, SystemBrowser};
pub use cache::TokenCache;
pub use callback::{authorize, ListenerOptions};
pub use discovery::{discover_provider_metadata, resolve_client_config, ProviderMetadata};
pub use flow::{next_step, Step, TokenAcquirer};
pub use pkce::PkceMaterial;
pub use token::{exchange_code, refresh_token, AccessTokenResponse, AuthorizationRecord};
