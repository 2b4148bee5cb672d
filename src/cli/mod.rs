pub mod embedded;
pub mod node;
pub mod session;
pub mod tx;
pub mod wallet;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::error::Result;
use session::Session;

#[derive(Parser, Debug)]
#[command(name = "nomctl", version)]
#[command(about = "Command-line controller for the Zenon Network of Momentum", long_about = None)]
pub struct Cli {
    /// HTTP JSON-RPC URL of a znnd node
    #[arg(short = 'u', long, global = true)]
    pub url: Option<String>,
    /// Chain identifier used in new blocks
    #[arg(short = 'n', long, global = true)]
    pub chain_id: Option<u64>,
    /// keyStore file name in the wallet directory
    #[arg(short = 'k', long, global = true)]
    pub keystore: Option<String>,
    /// Passphrase for the keyStore; prompted for when absent
    #[arg(short = 'p', long, global = true)]
    pub passphrase: Option<String>,
    /// Address index
    #[arg(short = 'i', long, global = true, default_value_t = 0)]
    pub index: u32,
    /// Print detailed information about each action
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,
    /// Config file (default ~/.nomctl/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    /// Wallet directory (default ~/.nomctl/wallet)
    #[arg(long, global = true)]
    pub wallet_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Balances of the selected address
    Balance,
    /// The latest momentum
    FrontierMomentum,
    /// First page of the unreceived queue
    Unreceived,
    /// Receive every pending transfer
    ReceiveAll,
    /// keyStore management
    Wallet {
        #[command(subcommand)]
        cmd: wallet::WalletCommands,
    },
    Plasma {
        #[command(subcommand)]
        cmd: embedded::PlasmaCommands,
    },
    Pillar {
        #[command(subcommand)]
        cmd: embedded::PillarCommands,
    },
    Sentinel {
        #[command(subcommand)]
        cmd: embedded::RewardCommands,
    },
    Stake {
        #[command(subcommand)]
        cmd: embedded::RewardCommands,
    },
    Spork {
        #[command(subcommand)]
        cmd: embedded::SporkCommands,
    },
}

pub fn run(command: Commands, session: &Session) -> Result<()> {
    match command {
        Commands::Balance => node::handle_balance(session),
        Commands::FrontierMomentum => node::handle_frontier_momentum(session),
        Commands::Unreceived => node::handle_unreceived(session),
        Commands::ReceiveAll => tx::handle_receive_all(session),
        Commands::Wallet { cmd } => wallet::handle_wallet_command(cmd, session),
        Commands::Plasma { cmd } => embedded::handle_plasma_command(cmd, session),
        Commands::Pillar { cmd } => embedded::handle_pillar_command(cmd, session),
        Commands::Sentinel { cmd } => embedded::handle_sentinel_command(cmd, session),
        Commands::Stake { cmd } => embedded::handle_stake_command(cmd, session),
        Commands::Spork { cmd } => embedded::handle_spork_command(cmd, session),
    }
}
