//! Command-line and environment configuration.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use clap::Parser;
use kham_core::Lexicon;

/// Default listening port.
pub const DEFAULT_PORT: u16 = 3000;

/// Default bearer token lifetime in days.
pub const DEFAULT_TOKEN_TTL_DAYS: u32 = 7;

/// Origins allowed by default: local static-file dev servers and the hosted game.
pub const DEFAULT_ALLOWED_ORIGINS: [&str; 5] = [
    "http://localhost:5500",
    "http://localhost:5501",
    "http://127.0.0.1:5500",
    "http://127.0.0.1:5501",
    "https://gamesthaiwords.netlify.app",
];

/// Server configuration.
#[derive(Debug, Clone, Parser)]
#[command(name = "kham-server", version, about = "Progress and leaderboard backend for Kham")]
pub struct Config {
    /// Port to listen on.
    #[arg(long, env = "KHAM_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Address to bind.
    #[arg(long, env = "KHAM_BIND", default_value_t = IpAddr::V4(Ipv4Addr::LOCALHOST))]
    pub bind: IpAddr,

    /// Directory for JSON persistence; in-memory only when unset.
    #[arg(long, env = "KHAM_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Allowed CORS origin; repeat or comma-separate.
    #[arg(
        long = "allowed-origin",
        env = "KHAM_ALLOWED_ORIGINS",
        value_delimiter = ',',
        default_values = DEFAULT_ALLOWED_ORIGINS
    )]
    pub allowed_origins: Vec<String>,

    /// Bearer token lifetime in days.
    #[arg(long, env = "KHAM_TOKEN_TTL_DAYS", default_value_t = DEFAULT_TOKEN_TTL_DAYS)]
    pub token_ttl_days: u32,

    /// JSON level table replacing the built-in Thai lexicon.
    #[arg(long, env = "KHAM_LEXICON")]
    pub lexicon: Option<PathBuf>,
}

impl Config {
    /// Address to bind the listener to.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }

    /// Token lifetime.
    #[must_use]
    pub fn token_ttl(&self) -> chrono::Duration {
        chrono::Duration::days(i64::from(self.token_ttl_days))
    }

    /// Load the configured lexicon, or the built-in one.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be read or is not a valid level table.
    pub fn load_lexicon(&self) -> anyhow::Result<Lexicon> {
        let Some(path) = &self.lexicon else {
            return Ok(Lexicon::thai());
        };
        let json = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read lexicon {}: {e}", path.display()))?;
        Ok(Lexicon::from_json(&json)?)
    }
}
