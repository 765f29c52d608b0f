use anyhow::{Context, Result};
use std::path::PathBuf;

pub const DATA_DIR_ENV: &str = "CREWBOARD_DATA_DIR";
pub const HOST_ENV: &str = "CREWBOARD_HOST";
pub const PORT_ENV: &str = "CREWBOARD_PORT";

pub const DEFAULT_DATA_DIR: &str = ".crewboard";
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3000;

/// Process configuration, read once at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Base directory holding state, journal and knowledge notes
    pub data_dir: PathBuf,
    pub host: String,
    pub port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl Config {
    /// Loads `.env` if present, then reads the process environment
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let port = match lookup(PORT_ENV) {
            Some(raw) => raw
                .trim()
                .parse()
                .with_context(|| format!("{} is not a valid port: {:?}", PORT_ENV, raw))?,
            None => defaults.port,
        };

        Ok(Self {
            data_dir: lookup(DATA_DIR_ENV)
                .filter(|dir| !dir.is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            host: lookup(HOST_ENV)
                .filter(|host| !host.is_empty())
                .unwrap_or(defaults.host),
            port,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
