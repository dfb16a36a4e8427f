//! Runtime configuration read from the environment (and `.env`, if present).

use std::net::SocketAddr;
use std::path::PathBuf;

use crate::duration::Duration;
use crate::error::{Error, Result};

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
pub const DEFAULT_MAX_DURATION: &str = "8";

#[derive(Debug, Clone)]
pub struct Config {
    /// Address the HTTP surface listens on.
    pub bind_addr: SocketAddr,
    /// Capacity assumed for days pushed without one.
    pub default_max_duration: Duration,
    /// Optional JSON snapshot used to preload the store.
    pub seed_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            default_max_duration: Duration::hours(8),
            seed_file: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let bind = lookup("PLANNER_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind
            .parse()
            .map_err(|_| Error::Config(format!("PLANNER_BIND_ADDR: invalid address {bind:?}")))?;

        let max = lookup("PLANNER_DEFAULT_MAX_DURATION")
            .unwrap_or_else(|| DEFAULT_MAX_DURATION.to_string());
        let default_max_duration = max
            .parse()
            .map_err(|err| Error::Config(format!("PLANNER_DEFAULT_MAX_DURATION: {err}")))?;

        let seed_file = lookup("PLANNER_SEED_FILE")
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);

        Ok(Config {
            bind_addr,
            default_max_duration,
            seed_file,
        })
    }
}
