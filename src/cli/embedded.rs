//! Embedded contract commands: plasma, pillar, sentinel, stake and spork.

use clap::Subcommand;
use num_traits::Zero;

use super::session::Session;
use crate::address::Hash;
use crate::amount::{format_amount, QSR_DECIMALS, ZNN_DECIMALS};
use crate::client::types::{PillarList, SporkList, UncollectedReward};
use crate::error::Result;
use crate::tx::{AccountBlock, Templates, TransactionSender};

const LIST_PAGE_SIZE: u32 = 1000;

#[derive(Subcommand, Debug)]
pub enum PlasmaCommands {
    /// Show plasma and fused QSR of the selected address
    Get,
}

#[derive(Subcommand, Debug)]
pub enum PillarCommands {
    /// List all pillars by rank
    List,
    /// Show uncollected pillar rewards
    Uncollected,
    /// Collect pillar rewards
    Collect,
    /// Delegate to a pillar by name
    Delegate { name: String },
    /// Remove the current delegation
    Undelegate,
}

#[derive(Subcommand, Debug)]
pub enum RewardCommands {
    /// Show uncollected rewards
    Uncollected,
    /// Collect rewards
    Collect,
}

#[derive(Subcommand, Debug)]
pub enum SporkCommands {
    /// List all sporks
    List,
    /// Create a spork
    Create { name: String, description: String },
    /// Activate a spork by id
    Activate { id: String },
}

pub fn handle_plasma_command(cmd: PlasmaCommands, session: &Session) -> Result<()> {
    match cmd {
        PlasmaCommands::Get => {
            let signer = session.signer()?;
            let info = session.client()?.plasma_get(&signer.address())?;
            println!(
                "{} has {}/{} plasma with {} QSR fused.",
                signer.address(),
                info.current_plasma,
                info.max_plasma,
                format_amount(&info.qsr_amount, QSR_DECIMALS)
            );
            Ok(())
        }
    }
}

pub fn handle_pillar_command(cmd: PillarCommands, session: &Session) -> Result<()> {
    let templates = Templates::new(session.chain_id());
    match cmd {
        PillarCommands::List => {
            let list = session.client()?.pillar_get_all(0, LIST_PAGE_SIZE)?;
            print!("{}", render_pillars(&list));
            Ok(())
        }
        PillarCommands::Uncollected => {
            let signer = session.signer()?;
            let reward = session.client()?.pillar_uncollected_reward(&signer.address())?;
            print!("{}", render_uncollected(&reward));
            Ok(())
        }
        PillarCommands::Collect => {
            publish(session, templates.pillar_collect_reward()?)?;
            println!("Done");
            println!("Use 'receive-all' to collect your Pillar reward(s) after 1 momentum");
            Ok(())
        }
        PillarCommands::Delegate { name } => {
            let block = templates.pillar_delegate(&name)?;
            println!("Delegating to Pillar {}", name);
            publish(session, block)?;
            println!("Done");
            Ok(())
        }
        PillarCommands::Undelegate => {
            let block = templates.pillar_undelegate()?;
            println!("Undelegating ...");
            publish(session, block)?;
            println!("Done");
            Ok(())
        }
    }
}

pub fn handle_sentinel_command(cmd: RewardCommands, session: &Session) -> Result<()> {
    match cmd {
        RewardCommands::Uncollected => {
            let signer = session.signer()?;
            let reward = session.client()?.sentinel_uncollected_reward(&signer.address())?;
            print!("{}", render_uncollected(&reward));
        }
        RewardCommands::Collect => {
            publish(session, Templates::new(session.chain_id()).sentinel_collect_reward()?)?;
            println!("Done");
            println!("Use 'receive-all' to collect your Sentinel reward(s) after 1 momentum");
        }
    }
    Ok(())
}

pub fn handle_stake_command(cmd: RewardCommands, session: &Session) -> Result<()> {
    match cmd {
        RewardCommands::Uncollected => {
            let signer = session.signer()?;
            let reward = session.client()?.stake_uncollected_reward(&signer.address())?;
            print!("{}", render_uncollected(&reward));
        }
        RewardCommands::Collect => {
            publish(session, Templates::new(session.chain_id()).stake_collect_reward()?)?;
            println!("Done");
            println!("Use 'receive-all' to collect your stake reward(s) after 1 momentum");
        }
    }
    Ok(())
}

pub fn handle_spork_command(cmd: SporkCommands, session: &Session) -> Result<()> {
    let templates = Templates::new(session.chain_id());
    match cmd {
        SporkCommands::List => {
            let list = session.client()?.spork_get_all(0, LIST_PAGE_SIZE)?;
            print!("{}", render_sporks(&list));
        }
        SporkCommands::Create { name, description } => {
            let block = templates.spork_create(&name, &description)?;
            println!("Creating spork...");
            publish(session, block)?;
            println!("Done");
        }
        SporkCommands::Activate { id } => {
            let id: Hash = id.parse()?;
            let block = templates.spork_activate(id)?;
            println!("Activating spork...");
            publish(session, block)?;
            println!("Done");
        }
    }
    Ok(())
}

fn publish(session: &Session, block: AccountBlock) -> Result<Hash> {
    let signer = session.signer()?;
    let client = session.client()?;
    TransactionSender::new(&client, &signer).send(block)
}

pub fn render_uncollected(reward: &UncollectedReward) -> String {
    let mut out = String::new();
    if !reward.znn_amount.is_zero() {
        out.push_str(&format!("{} ZNN\n", format_amount(&reward.znn_amount, ZNN_DECIMALS)));
    }
    if !reward.qsr_amount.is_zero() {
        out.push_str(&format!("{} QSR\n", format_amount(&reward.qsr_amount, QSR_DECIMALS)));
    }
    if out.is_empty() {
        out.push_str("No rewards to collect\n");
    }
    out
}

pub fn render_pillars(list: &PillarList) -> String {
    let mut out = String::new();
    for p in &list.list {
        out.push_str(&format!(
            "#{} Pillar {} has a delegated weight of {} ZNN\n",
            p.rank + 1,
            p.name,
            format_amount(&p.weight, ZNN_DECIMALS)
        ));
        out.push_str(&format!("    Producer address {}\n", p.producer_address));
        out.push_str(&format!(
            "    Momentums {} / {}\n",
            p.current_stats.produced_momentums, p.current_stats.expected_momentums
        ));
    }
    out
}

pub fn render_sporks(list: &SporkList) -> String {
    if list.list.is_empty() {
        return "No sporks found\n".to_string();
    }
    let mut out = String::from("Sporks:\n");
    for s in &list.list {
        out.push_str(&format!("Name: {}\n", s.name));
        out.push_str(&format!("  Description: {}\n", s.description));
        out.push_str(&format!("  Activated: {}\n", s.activated));
        if s.activated {
            out.push_str(&format!("  EnforcementHeight: {}\n", s.enforcement_height));
        }
        out.push_str(&format!("  Hash: {}\n", s.id));
    }
    out
}
