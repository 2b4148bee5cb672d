//! Controller configuration: TOML file + command-line overrides.
//!
//! Priority: flags > config file > defaults. The resolved value is passed
//! explicitly to every component; nothing reads process-wide state.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::NomError;

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct NomConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub node: NodeConfig,
    #[serde(default)]
    pub wallet: WalletConfig,
    #[serde(default)]
    pub receive: ReceiveConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct NodeConfig {
    /// HTTP JSON-RPC endpoint of a znnd node
    #[serde(default = "default_url")]
    pub url: String,
    #[serde(default = "default_chain_id")]
    pub chain_id: u64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct WalletConfig {
    #[serde(default = "default_wallet_dir")]
    pub dir: PathBuf,
}

/// How `receive-all` drains the unreceived queue.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ReceiveConfig {
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// Abort a batch on the first failed submission instead of carrying on.
    #[serde(default)]
    pub strict: bool,
    /// Give up after this many consecutive rounds in which nothing was received.
    #[serde(default = "default_max_stalled_rounds")]
    pub max_stalled_rounds: u32,
    /// Pause before re-polling after a round without progress, multiplied
    /// by the number of such rounds in a row.
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_url() -> String {
    "http://127.0.0.1:35997".to_string()
}

fn default_chain_id() -> u64 {
    1
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_page_size() -> u32 {
    5
}

fn default_max_stalled_rounds() -> u32 {
    5
}

fn default_retry_delay_ms() -> u64 {
    2000
}

fn default_wallet_dir() -> PathBuf {
    nomctl_home().join("wallet")
}

/// `~/.nomctl`, falling back to the working directory without a home.
pub fn nomctl_home() -> PathBuf {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".nomctl")
}

pub fn default_config_path() -> PathBuf {
    nomctl_home().join("config.toml")
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            chain_id: default_chain_id(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            dir: default_wallet_dir(),
        }
    }
}

impl Default for ReceiveConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            strict: false,
            max_stalled_rounds: default_max_stalled_rounds(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

impl Default for NomConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            node: NodeConfig::default(),
            wallet: WalletConfig::default(),
            receive: ReceiveConfig::default(),
        }
    }
}

impl NomConfig {
    pub fn from_toml(s: &str) -> Result<Self, NomError> {
        let config: NomConfig = toml::from_str(s).map_err(|e| NomError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load the config file, writing the defaults out on first run.
    pub fn load_or_default(path: &Path) -> Result<Self, NomError> {
        if path.exists() {
            let s = fs::read_to_string(path)?;
            let config = Self::from_toml(&s)
                .map_err(|e| NomError::Config(format!("{}: {}", path.display(), e)))?;
            info!("Config loaded from {}", path.display());
            return Ok(config);
        }

        let config = Self::default();
        match toml::to_string_pretty(&config) {
            Ok(s) => {
                if let Err(e) = path.parent().map_or(Ok(()), create_private_dir).and_then(|_| {
                    fs::write(path, s).map_err(NomError::from)
                }) {
                    warn!("Could not write default config to {}: {}", path.display(), e);
                }
            }
            Err(e) => warn!("Could not render default config: {}", e),
        }
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), NomError> {
        if self.receive.page_size == 0 {
            return Err(NomError::Config("receive.page_size must be at least 1".to_string()));
        }
        if self.receive.max_stalled_rounds == 0 {
            return Err(NomError::Config(
                "receive.max_stalled_rounds must be at least 1".to_string(),
            ));
        }
        if self.node.url.trim().is_empty() {
            return Err(NomError::Config("node.url is empty".to_string()));
        }
        Ok(())
    }

    /// Create the wallet directory (and its parents) owner-only.
    pub fn ensure_dirs(&self) -> Result<(), NomError> {
        create_private_dir(&self.wallet.dir)
    }
}

fn create_private_dir(dir: &Path) -> Result<(), NomError> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o700);
    }
    builder.create(dir)?;
    Ok(())
}
