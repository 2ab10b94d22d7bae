pub mod profile;
pub mod settings;
pub mod types;

pub use profile::{list_profiles, load_profile};
pub use settings::Settings;
pub use types::{ClientConfig, ClientProfile};
