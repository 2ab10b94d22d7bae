use std::path::PathBuf;

use clap::{Parser, Subcommand};

use tokenkeeper::oauth::SystemBrowser;
use tokenkeeper::{Settings, TokenkeeperError};

#[derive(Parser)]
#[command(name = "tokenkeeper", version, about = "Obtain, cache and refresh OIDC access tokens")]
struct Cli {
    /// Directory holding <profile>.json client profiles
    #[arg(long, global = true, env = "TOKENKEEPER_CONFIG_DIR")]
    config_dir: Option<PathBuf>,

    /// Directory for cached token records
    #[arg(long, global = true, env = "TOKENKEEPER_CACHE_DIR")]
    cache_dir: Option<PathBuf>,

    /// Local port for the authorization redirect (must match the client's redirect URI)
    #[arg(long, global = true, env = "TOKENKEEPER_PORT")]
    port: Option<u16>,

    /// Seconds to wait for the browser login to complete
    #[arg(long, global = true, env = "TOKENKEEPER_CALLBACK_TIMEOUT")]
    timeout_secs: Option<u64>,

    /// Report errors as a JSON object on stderr
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print an access token for a profile, logging in if needed
    Token {
        /// Profile name
        #[arg(default_value = "default")]
        profile: String,
    },

    /// List configured profiles
    Profiles,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("TOKENKEEPER_LOG_LEVEL")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let json_mode = cli.json;

    if let Err(e) = run(cli).await {
        if let Some(token) = e.unpersisted_token() {
            println!("{token}");
        }
        print_error(&e, json_mode);
        std::process::exit(1);
    }
}

/// Errors always go to stderr; stdout carries nothing but the token.
fn print_error(err: &TokenkeeperError, json_mode: bool) {
    if json_mode {
        eprintln!("{}", serde_json::to_string_pretty(&err.to_json()).unwrap_or_default());
    } else {
        eprintln!("Error: {err}");
    }
}

async fn run(cli: Cli) -> Result<(), TokenkeeperError> {
    let settings = Settings::resolve(cli.config_dir, cli.cache_dir, cli.port, cli.timeout_secs);

    match cli.command {
        Commands::Token { profile } => {
            let token = tokenkeeper::access_token(&settings, &profile, &SystemBrowser).await?;
            println!("{token}");
            Ok(())
        }
        Commands::Profiles => {
            let profiles = tokenkeeper::config::list_profiles(&settings.config_dir)?;
            if profiles.is_empty() {
                eprintln!("No profiles in {}", settings.config_dir.display());
            }
            for name in profiles {
                println!("{name}");
            }
            Ok(())
        }
    }
}
