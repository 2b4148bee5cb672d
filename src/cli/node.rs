// Read-only ledger queries
use super::session::Session;
use crate::amount::format_amount;
use crate::client::types::{AccountInfo, Momentum, UnreceivedPage};
use crate::client::LedgerApi;
use crate::error::Result;

pub fn handle_balance(session: &Session) -> Result<()> {
    let signer = session.signer()?;
    let client = session.client()?;
    let info = client.account_info(&signer.address())?;
    print!("{}", render_balance(&info));
    Ok(())
}

pub fn handle_frontier_momentum(session: &Session) -> Result<()> {
    let client = session.client()?;
    let momentum = client.frontier_momentum()?;
    print!("{}", render_momentum(&momentum));
    Ok(())
}

pub fn handle_unreceived(session: &Session) -> Result<()> {
    let signer = session.signer()?;
    let client = session.client()?;
    let page = client.unreceived_blocks(&signer.address(), 0, session.config.receive.page_size)?;
    print!("{}", render_unreceived(&page));
    Ok(())
}

pub fn render_balance(info: &AccountInfo) -> String {
    let mut out = format!(
        "Balance for account-chain {} having height {}\n",
        info.address, info.account_height
    );
    if info.balance_info_map.is_empty() {
        out.push_str(&format!("  No coins or tokens at address {}\n", info.address));
    }
    for (zts, entry) in &info.balance_info_map {
        out.push_str(&format!(
            "  {} {} {} {}\n",
            format_amount(&entry.balance, entry.token_info.decimals),
            entry.token_info.token_symbol,
            entry.token_info.token_domain,
            zts
        ));
    }
    out
}

pub fn render_momentum(m: &Momentum) -> String {
    format!(
        "Momentum height: {}\nMomentum hash: {}\nMomentum previousHash: {}\nMomentum timestamp: {}\n",
        m.height, m.hash, m.previous_hash, m.timestamp
    )
}

/// Summary line for the size of the unreceived queue.
pub fn queue_summary(page: &UnreceivedPage) -> String {
    if page.is_empty() {
        "Nothing to receive".to_string()
    } else if page.more {
        format!("You have more than {} transaction(s) to receive", page.count)
    } else {
        format!("You have {} transaction(s) to receive", page.count)
    }
}

pub fn render_unreceived(page: &UnreceivedPage) -> String {
    let mut out = queue_summary(page);
    out.push('\n');
    if page.is_empty() {
        return out;
    }
    out.push_str(&format!("Showing the first {}\n", page.list.len()));
    for block in &page.list {
        out.push_str(&format!(
            "Unreceived {} {} from {} Use the hash {} to receive\n",
            format_amount(&block.amount, block.decimals()),
            block.symbol(),
            block.address,
            block.hash
        ));
    }
    out
}
