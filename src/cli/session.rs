//! Per-invocation context: resolved configuration plus keyStore selection.

use std::path::PathBuf;
use tracing::warn;
use zeroize::Zeroizing;

use super::Cli;
use crate::client::RpcClient;
use crate::config::{default_config_path, NomConfig};
use crate::error::{NomError, Result};
use crate::keystore::{KeyFile, KeyStoreDirectory};
use crate::signer::Signer;

pub struct Session {
    pub config: NomConfig,
    pub keystore: Option<String>,
    passphrase: Option<Zeroizing<String>>,
    pub index: u32,
}

impl Session {
    /// Load the config file named by `--config` (or the default one) and
    /// apply the command-line overrides.
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let path = cli.config.clone().unwrap_or_else(default_config_path);
        let config = NomConfig::load_or_default(&path)?;
        Self::with_config(config, cli)
    }

    pub fn with_config(mut config: NomConfig, cli: &Cli) -> Result<Self> {
        if let Some(url) = &cli.url {
            config.node.url = url.clone();
        }
        if let Some(chain_id) = cli.chain_id {
            config.node.chain_id = chain_id;
        }
        if let Some(dir) = &cli.wallet_dir {
            config.wallet.dir = dir.clone();
        }
        if cli.verbose {
            config.log_level = "debug".to_string();
        }
        config.validate()?;
        Ok(Self {
            config,
            keystore: cli.keystore.clone(),
            passphrase: cli.passphrase.clone().map(Zeroizing::new),
            index: cli.index,
        })
    }

    pub fn chain_id(&self) -> u64 {
        self.config.node.chain_id
    }

    pub fn wallet_dir(&self) -> PathBuf {
        self.config.wallet.dir.clone()
    }

    pub fn directory(&self) -> Result<KeyStoreDirectory> {
        self.config.ensure_dirs()?;
        Ok(KeyStoreDirectory::new(self.wallet_dir()))
    }

    pub fn client(&self) -> Result<RpcClient> {
        RpcClient::new(&self.config.node)
    }

    /// The `--passphrase` value, or a masked prompt on the terminal.
    pub fn passphrase(&self) -> Result<Zeroizing<String>> {
        match &self.passphrase {
            Some(p) => Ok(p.clone()),
            None => Ok(Zeroizing::new(rpassword::prompt_password("Insert passphrase: ")?)),
        }
    }

    /// Resolve the keyStore, decrypt it and bind the key at `--index`.
    pub fn signer(&self) -> Result<Signer> {
        let dir = self.directory()?;
        let path = dir.resolve(self.keystore.as_deref())?;
        let key_file = KeyFile::read(&path)?;
        let passphrase = self.passphrase()?;
        let keystore = key_file.decrypt(&passphrase).map_err(|e| {
            if matches!(e, NomError::WrongPassphrase) {
                warn!("Invalid passphrase for keyStore {}", path.display());
            }
            e
        })?;
        Ok(Signer::bind(keystore.derive_at(self.index)?))
    }
}
