use clap::Subcommand;

use super::session::Session;
use crate::error::{NomError, Result};
use crate::keystore::KeyStore;

#[derive(Subcommand, Debug)]
pub enum WalletCommands {
    /// Create a keyStore from a fresh 24-word mnemonic
    CreateNew {
        #[arg(value_name = "PASSPHRASE")]
        new_passphrase: String,
        /// File name; defaults to the base address
        #[arg(value_name = "KEYSTORE_NAME")]
        name: Option<String>,
    },
    /// Create a keyStore from an existing mnemonic
    CreateFromMnemonic {
        mnemonic: String,
        #[arg(value_name = "PASSPHRASE")]
        new_passphrase: String,
        #[arg(value_name = "KEYSTORE_NAME")]
        name: Option<String>,
    },
    /// List the keyStores in the wallet directory
    List,
    /// Show the addresses at indices start..end of the selected keyStore
    DeriveAddresses { start: u32, end: u32 },
}

pub fn handle_wallet_command(cmd: WalletCommands, session: &Session) -> Result<()> {
    match cmd {
        WalletCommands::CreateNew {
            new_passphrase,
            name,
        } => {
            let ks = KeyStore::generate()?;
            create(session, &ks, &new_passphrase, name.as_deref())
        }
        WalletCommands::CreateFromMnemonic {
            mnemonic,
            new_passphrase,
            name,
        } => {
            let ks = KeyStore::from_mnemonic(&mnemonic)?;
            create(session, &ks, &new_passphrase, name.as_deref())
        }
        WalletCommands::List => {
            let names = session.directory()?.list()?;
            if names.is_empty() {
                println!("No keyStores found");
            } else {
                println!("Available keyStores:");
                for name in names {
                    println!("{}", name);
                }
            }
            Ok(())
        }
        WalletCommands::DeriveAddresses { start, end } => {
            if start >= end {
                return Err(NomError::InvalidArgument(format!(
                    "empty index range {}..{}",
                    start, end
                )));
            }
            let dir = session.directory()?;
            let passphrase = session.passphrase()?;
            let ks = dir.open(session.keystore.as_deref(), &passphrase)?;
            println!("Addresses for keyStore {}:", ks.base_address());
            for (index, address) in ks.derive_addresses(start..end)? {
                println!("  {}\t{}", index, address);
            }
            Ok(())
        }
    }
}

fn create(session: &Session, ks: &KeyStore, passphrase: &str, name: Option<&str>) -> Result<()> {
    let dir = session.directory()?;
    let kf = dir.store(ks, passphrase, name)?;
    let name = name
        .map(str::to_string)
        .unwrap_or_else(|| kf.base_address().to_string());
    println!("keyStore successfully created: {}", name);
    Ok(())
}
