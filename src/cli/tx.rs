// Bulk receive of the unreceived queue
use tracing::warn;

use super::node::queue_summary;
use super::session::Session;
use crate::client::LedgerApi;
use crate::error::Result;
use crate::receive::{CancelToken, Outcome, ReceivePolicy, ReconcileReport, TransferReconciler};

pub fn handle_receive_all(session: &Session) -> Result<()> {
    let signer = session.signer()?;
    let client = session.client()?;
    let policy = ReceivePolicy::from(&session.config.receive);

    let page = client.unreceived_blocks(&signer.address(), 0, policy.page_size)?;
    println!("{}", queue_summary(&page));
    if page.is_empty() {
        return Ok(());
    }
    println!("Please wait ...");

    let report = TransferReconciler::new(&client, &signer, session.chain_id(), policy)
        .with_cancel(interrupt_token())
        .run();
    print!("{}", render_report(&report));
    report.ensure_complete()
}

/// Ctrl-C lets the batch in flight finish, then stops before the next poll.
fn interrupt_token() -> CancelToken {
    let token = CancelToken::new();
    let flag = token.clone();
    let installed = ctrlc::set_handler(move || {
        if !flag.is_cancelled() {
            eprintln!("Interrupted, stopping after the current batch ...");
        }
        flag.cancel();
    });
    if let Err(e) = installed {
        warn!("Could not install the Ctrl-C handler: {}", e);
    }
    token
}

pub fn render_report(report: &ReconcileReport) -> String {
    let mut out = format!(
        "Received {} transaction(s) in {} round(s)\n",
        report.received.len(),
        report.rounds
    );
    for hash in &report.received {
        out.push_str(&format!("  {}\n", hash));
    }
    for (hash, reason) in &report.failed {
        out.push_str(&format!("  Could not receive {}: {}\n", hash, reason));
    }
    let last = match &report.outcome {
        Outcome::Done => "Done".to_string(),
        Outcome::Cancelled => "Cancelled".to_string(),
        Outcome::Stalled { rounds } => {
            format!("Stopped: nothing received in {} round(s)", rounds)
        }
        Outcome::Aborted { hash, .. } => format!("Stopped at {}", hash),
        Outcome::Failed(reason) => format!("Stopped: {}", reason),
    };
    out.push_str(&last);
    out.push('\n');
    out
}
