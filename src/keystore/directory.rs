//! The wallet directory: a flat folder with one key file per keystore.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::{KeyFile, KeyStore};
use crate::error::NomError;

#[derive(Debug, Clone)]
pub struct KeyStoreDirectory {
    dir: PathBuf,
}

impl KeyStoreDirectory {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    /// Key file names in lexicographic order. Directories and hidden
    /// in-flight temp files are skipped.
    pub fn list(&self) -> Result<Vec<String>, NomError> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with('.') {
                continue;
            }
            names.push(name);
        }
        names.sort();
        Ok(names)
    }

    /// Pick the key file to use.
    ///
    /// - an explicit name must exist as a regular file, hidden ones included;
    /// - otherwise a single key file is selected;
    /// - zero files is [`NomError::NoKeyStore`], several is
    ///   [`NomError::AmbiguousKeyStore`].
    pub fn resolve(&self, explicit: Option<&str>) -> Result<PathBuf, NomError> {
        if let Some(name) = explicit {
            if !is_plain_name(name) {
                return Err(NomError::KeyStoreNotFound(name.to_string()));
            }
            let path = self.dir.join(name);
            return match fs::metadata(&path) {
                Ok(meta) if meta.is_file() => Ok(path),
                _ => Err(NomError::KeyStoreNotFound(name.to_string())),
            };
        }

        let mut names = self.list()?;
        match names.len() {
            0 => Err(NomError::NoKeyStore),
            1 => {
                let name = names.remove(0);
                info!("Using the default keyStore {}", name);
                Ok(self.dir.join(name))
            }
            n => {
                debug!(count = n, "several keyStores and none selected");
                Err(NomError::AmbiguousKeyStore)
            }
        }
    }

    /// Encrypt `ks` and store it under `name`, defaulting to its base address.
    pub fn store(
        &self,
        ks: &KeyStore,
        passphrase: &str,
        name: Option<&str>,
    ) -> Result<KeyFile, NomError> {
        let mut kf = ks.encrypt(passphrase)?;
        self.store_key_file(&mut kf, name)?;
        Ok(kf)
    }

    /// Write an already encrypted key file under `name`, defaulting to its
    /// base address.
    pub fn store_key_file(&self, kf: &mut KeyFile, name: Option<&str>) -> Result<PathBuf, NomError> {
        let name = match name {
            Some(n) => n.to_string(),
            None => kf.base_address().to_string(),
        };
        // hidden names would never be listed and collide with temp files
        if !is_plain_name(&name) || name.starts_with('.') {
            return Err(NomError::InvalidArgument(format!("invalid keyStore name {:?}", name)));
        }
        let path = self.dir.join(&name);
        kf.write_to(&path)?;
        Ok(path)
    }

    /// Resolve, read and decrypt in one step.
    pub fn open(&self, explicit: Option<&str>, passphrase: &str) -> Result<KeyStore, NomError> {
        let path = self.resolve(explicit)?;
        KeyFile::read(&path)?.decrypt(passphrase)
    }
}

/// Names are single path components; nothing that could escape the directory.
fn is_plain_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains('/')
        && !name.contains('\\')
}
