//! Draining an address's unreceived queue.
//!
//! Each round polls page 0 of the queue, then builds, signs and publishes
//! a receive block for every entry of that page in order. Accepted entries
//! leave the queue on the node, so the next round polls page 0 again
//! instead of advancing an offset; entries that arrive mid-drain are
//! picked up the same way.
//!
//! A node keeps listing a send until the receive for it is confirmed in a
//! momentum, so an entry received earlier in the run is skipped rather than
//! resubmitted. Rounds that receive nothing back off before re-polling and
//! end the run once `max_stalled_rounds` of them happen in a row.
//!
//! ```text
//! Idle -> Polling -> Draining -> Polling -> ... -> Done
//!            |                      |
//!            +--------> Failed <----+
//! ```

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::address::Hash;
use crate::amount::format_amount;
use crate::client::types::UnreceivedBlock;
use crate::client::LedgerApi;
use crate::config::ReceiveConfig;
use crate::error::{NomError, Result};
use crate::signer::Signer;
use crate::tx::{Templates, TransactionSender};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceivePolicy {
    pub page_size: u32,
    /// Abort on the first failed submission.
    pub strict: bool,
    pub max_stalled_rounds: u32,
    /// Base pause before re-polling after a round without progress.
    pub retry_delay: Duration,
}

impl Default for ReceivePolicy {
    fn default() -> Self {
        Self::from(&ReceiveConfig::default())
    }
}

impl From<&ReceiveConfig> for ReceivePolicy {
    fn from(config: &ReceiveConfig) -> Self {
        Self {
            page_size: config.page_size.max(1),
            strict: config.strict,
            max_stalled_rounds: config.max_stalled_rounds.max(1),
            retry_delay: Duration::from_millis(config.retry_delay_ms),
        }
    }
}

/// Shared flag checked before every poll. Cancelling never interrupts a
/// batch that is already being submitted.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The queue was observed empty.
    Done,
    Cancelled,
    /// Consecutive rounds without a single accepted receive.
    Stalled { rounds: u32 },
    /// A submission failed under the strict policy.
    Aborted { hash: Hash, reason: String },
    /// Polling the queue failed.
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Number of batches drained.
    pub rounds: u32,
    /// Hashes of the published receive blocks, in submission order.
    pub received: Vec<Hash>,
    /// Send-block hashes whose receive failed, with the last error seen.
    /// An entry that later succeeded is removed.
    pub failed: Vec<(Hash, String)>,
    pub outcome: Outcome,
}

impl ReconcileReport {
    /// Turn a run that stopped before the queue was empty into its error.
    /// A cancelled run is not an error.
    pub fn ensure_complete(&self) -> Result<()> {
        match &self.outcome {
            Outcome::Done | Outcome::Cancelled => Ok(()),
            Outcome::Stalled { rounds } => Err(NomError::ReceiveStalled { rounds: *rounds }),
            Outcome::Aborted { hash, reason } => Err(NomError::ReceiveAborted {
                hash: *hash,
                reason: reason.clone(),
            }),
            Outcome::Failed(reason) => Err(NomError::ReceiveFailed(reason.clone())),
        }
    }
}

enum State {
    Polling,
    Draining(Vec<UnreceivedBlock>),
    Finished(Outcome),
}

pub struct TransferReconciler<'a, L: LedgerApi> {
    ledger: &'a L,
    signer: &'a Signer,
    templates: Templates,
    policy: ReceivePolicy,
    cancel: CancelToken,
}

impl<'a, L: LedgerApi> TransferReconciler<'a, L> {
    pub fn new(ledger: &'a L, signer: &'a Signer, chain_id: u64, policy: ReceivePolicy) -> Self {
        Self {
            ledger,
            signer,
            templates: Templates::new(chain_id),
            policy,
            cancel: CancelToken::new(),
        }
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Run until the queue is empty, the token is cancelled, or the run
    /// cannot make progress.
    ///
    /// The report always comes back, so receives that were already
    /// published stay visible when the run stops early. A failed poll ends
    /// with [`Outcome::Failed`]. A failed submission is logged and skipped
    /// unless the policy is strict, which ends with [`Outcome::Aborted`].
    pub fn run(&self) -> ReconcileReport {
        let mut report = ReconcileReport {
            rounds: 0,
            received: Vec::new(),
            failed: Vec::new(),
            outcome: Outcome::Done,
        };
        let address = self.signer.address();
        // send hashes received during this run
        let mut settled: HashSet<Hash> = HashSet::new();
        let mut stalled: u32 = 0;
        let mut state = State::Polling;

        loop {
            state = match state {
                State::Polling => {
                    if stalled > 0 && !self.policy.retry_delay.is_zero() {
                        let pause = self.policy.retry_delay * stalled;
                        debug!(?pause, stalled, "no progress, backing off");
                        thread::sleep(pause);
                    }
                    if self.cancel.is_cancelled() {
                        info!("Receive cancelled after {} round(s)", report.rounds);
                        State::Finished(Outcome::Cancelled)
                    } else {
                        match self.ledger.unreceived_blocks(&address, 0, self.policy.page_size) {
                            Ok(page) if page.is_empty() => State::Finished(Outcome::Done),
                            Ok(page) => {
                                debug!(count = page.count, more = page.more, "polled unreceived queue");
                                State::Draining(page.list)
                            }
                            Err(e) => {
                                warn!("Could not poll unreceived queue: {}", e);
                                State::Finished(Outcome::Failed(e.to_string()))
                            }
                        }
                    }
                }
                State::Draining(batch) => {
                    report.rounds += 1;
                    let mut progressed = false;
                    let mut aborted = None;
                    for entry in &batch {
                        if settled.contains(&entry.hash) {
                            debug!("{} is still listed, waiting for confirmation", entry.hash);
                            continue;
                        }
                        match self.receive_one(entry) {
                            Ok(hash) => {
                                report.failed.retain(|(h, _)| *h != entry.hash);
                                report.received.push(hash);
                                settled.insert(entry.hash);
                                progressed = true;
                            }
                            Err(e) => {
                                warn!("Error receiving {}: {}", entry.hash, e);
                                if self.policy.strict {
                                    aborted = Some(Outcome::Aborted {
                                        hash: entry.hash,
                                        reason: e.to_string(),
                                    });
                                    break;
                                }
                                record_failure(&mut report.failed, entry.hash, e.to_string());
                            }
                        }
                    }
                    if let Some(outcome) = aborted {
                        State::Finished(outcome)
                    } else if progressed {
                        stalled = 0;
                        State::Polling
                    } else {
                        stalled += 1;
                        if stalled >= self.policy.max_stalled_rounds {
                            warn!("Nothing received in {} round(s), giving up", stalled);
                            State::Finished(Outcome::Stalled { rounds: stalled })
                        } else {
                            State::Polling
                        }
                    }
                }
                State::Finished(outcome) => {
                    report.outcome = outcome;
                    return report;
                }
            };
        }
    }

    fn receive_one(&self, entry: &UnreceivedBlock) -> Result<Hash> {
        let block = self.templates.receive(entry.hash);
        let hash = TransactionSender::new(self.ledger, self.signer).send(block)?;
        info!(
            "Received {} {} from {}",
            format_amount(&entry.amount, entry.decimals()),
            entry.symbol(),
            entry.address
        );
        Ok(hash)
    }
}

fn record_failure(failed: &mut Vec<(Hash, String)>, hash: Hash, reason: String) {
    match failed.iter_mut().find(|(h, _)| *h == hash) {
        Some(slot) => slot.1 = reason,
        None => failed.push((hash, reason)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::mock::{transfer, MockLedger};
    use crate::crypto::KeyPair;

    fn signer() -> Signer {
        Signer::bind(KeyPair::derive(&[11u8; 64], 0).unwrap())
    }

    fn no_wait() -> ReceivePolicy {
        ReceivePolicy {
            retry_delay: Duration::ZERO,
            ..ReceivePolicy::default()
        }
    }

    #[test]
    fn test_empty_queue_is_done_after_one_poll() {
        let ledger = MockLedger::new();
        let signer = signer();
        let report = TransferReconciler::new(&ledger, &signer, 1, ReceivePolicy::default()).run();
        assert_eq!(report.outcome, Outcome::Done);
        assert_eq!(report.rounds, 0);
        assert_eq!(ledger.polls(), 1);
        assert!(ledger.published().is_empty());
        assert!(report.ensure_complete().is_ok());
    }

    #[test]
    fn test_two_transfers_scenario() {
        let ledger = MockLedger::new();
        let signer = signer();
        let a = transfer("znn", signer.address(), 500_000_000, "ZNN", 8);
        let b = transfer("qsr", signer.address(), 250_000_000, "QSR", 8);
        ledger.push_unreceived(a.clone());
        ledger.push_unreceived(b.clone());

        let report = TransferReconciler::new(&ledger, &signer, 1, ReceivePolicy::default()).run();

        let published = ledger.published();
        assert_eq!(published.len(), 2);
        assert_eq!(published[0].from_block_hash, a.hash);
        assert_eq!(published[1].from_block_hash, b.hash);
        assert_eq!(published[1].height, published[0].height + 1);
        assert_eq!(report.received, vec![published[0].hash, published[1].hash]);
        assert_eq!(report.outcome, Outcome::Done);
        assert_eq!(report.rounds, 1);
        // drain poll then the empty re-poll
        assert_eq!(ledger.polls(), 2);
    }

    #[test]
    fn test_terminates_within_initial_count_rounds() {
        let ledger = MockLedger::new();
        let signer = signer();
        for i in 0..23 {
            ledger.push_unreceived(transfer(&format!("t{}", i), signer.address(), i + 1, "ZNN", 8));
        }
        let report = TransferReconciler::new(&ledger, &signer, 1, no_wait()).run();
        assert_eq!(report.received.len(), 23);
        assert!(report.rounds <= 23);
        assert_eq!(report.rounds, 5);
        assert_eq!(ledger.pending(), 0);
    }

    #[test]
    fn test_arrivals_during_drain_are_received() {
        let ledger = MockLedger::new();
        let signer = signer();
        ledger.push_unreceived(transfer("first", signer.address(), 1, "ZNN", 8));
        ledger.push_arrival(transfer("late", signer.address(), 2, "QSR", 8));
        let report = TransferReconciler::new(&ledger, &signer, 1, ReceivePolicy::default()).run();
        assert_eq!(report.received.len(), 2);
        assert_eq!(report.rounds, 2);
        assert_eq!(ledger.pending(), 0);
    }

    #[test]
    fn test_unconfirmed_receives_still_listed_are_not_resubmitted() {
        let ledger = MockLedger::new();
        ledger.set_confirmation_lag(1);
        let signer = signer();
        ledger.push_unreceived(transfer("znn", signer.address(), 500_000_000, "ZNN", 8));
        ledger.push_unreceived(transfer("qsr", signer.address(), 250_000_000, "QSR", 8));

        let report = TransferReconciler::new(&ledger, &signer, 1, no_wait()).run();

        assert_eq!(report.outcome, Outcome::Done);
        assert_eq!(ledger.published().len(), 2);
        assert_eq!(report.received.len(), 2);
        assert!(report.failed.is_empty());
        // the second round only saw the two receives awaiting confirmation
        assert_eq!(report.rounds, 2);
        assert_eq!(ledger.polls(), 3);
        assert_eq!(ledger.pending(), 0);
    }

    #[test]
    fn test_slow_confirmation_within_stall_budget() {
        let ledger = MockLedger::new();
        ledger.set_confirmation_lag(3);
        let signer = signer();
        ledger.push_unreceived(transfer("znn", signer.address(), 1, "ZNN", 8));
        let policy = ReceivePolicy {
            max_stalled_rounds: 4,
            ..no_wait()
        };
        let report = TransferReconciler::new(&ledger, &signer, 1, policy).run();
        assert_eq!(report.outcome, Outcome::Done);
        assert_eq!(report.received.len(), 1);
    }

    #[test]
    fn test_failed_entry_does_not_abort_batch() {
        let ledger = MockLedger::new();
        let signer = signer();
        let bad = transfer("bad", signer.address(), 1, "ZNN", 8);
        let good = transfer("good", signer.address(), 2, "ZNN", 8);
        ledger.push_unreceived(bad.clone());
        ledger.push_unreceived(good.clone());
        ledger.fail_publish_of(bad.hash);

        let policy = ReceivePolicy {
            max_stalled_rounds: 3,
            ..no_wait()
        };
        let report = TransferReconciler::new(&ledger, &signer, 1, policy).run();

        // round 1 receives `good`; rounds 2..=4 only retry `bad`
        assert_eq!(report.outcome, Outcome::Stalled { rounds: 3 });
        assert_eq!(report.rounds, 4);
        let published = ledger.published();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].from_block_hash, good.hash);
        // what was published before the stall is still reported
        assert_eq!(report.received, vec![published[0].hash]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, bad.hash);
        assert!(matches!(
            report.ensure_complete(),
            Err(NomError::ReceiveStalled { rounds: 3 })
        ));
    }

    #[test]
    fn test_entry_that_heals_is_dropped_from_failures() {
        let ledger = MockLedger::new();
        let signer = signer();
        let flaky = transfer("flaky", signer.address(), 1, "ZNN", 8);
        ledger.push_unreceived(flaky.clone());
        ledger.push_unreceived(transfer("steady", signer.address(), 2, "ZNN", 8));
        ledger.fail_publish_times(flaky.hash, 1);

        let report = TransferReconciler::new(&ledger, &signer, 1, no_wait()).run();

        assert_eq!(report.outcome, Outcome::Done);
        assert_eq!(report.rounds, 2);
        assert_eq!(report.received.len(), 2);
        assert!(report.failed.is_empty());
        assert_eq!(ledger.published()[1].from_block_hash, flaky.hash);
    }

    #[test]
    fn test_strict_policy_aborts_on_first_failure() {
        let ledger = MockLedger::new();
        let signer = signer();
        let bad = transfer("bad", signer.address(), 1, "ZNN", 8);
        ledger.push_unreceived(bad.clone());
        ledger.push_unreceived(transfer("good", signer.address(), 2, "ZNN", 8));
        ledger.fail_publish_of(bad.hash);

        let policy = ReceivePolicy {
            strict: true,
            ..no_wait()
        };
        let report = TransferReconciler::new(&ledger, &signer, 1, policy).run();
        match &report.outcome {
            Outcome::Aborted { hash, .. } => assert_eq!(*hash, bad.hash),
            other => panic!("unexpected {:?}", other),
        }
        assert!(ledger.published().is_empty());
        assert!(matches!(
            report.ensure_complete(),
            Err(NomError::ReceiveAborted { .. })
        ));
    }

    #[test]
    fn test_poll_failure_is_surfaced() {
        let ledger = MockLedger::new();
        ledger.set_fail_polls(true);
        let signer = signer();
        let report = TransferReconciler::new(&ledger, &signer, 1, ReceivePolicy::default()).run();
        assert!(matches!(report.outcome, Outcome::Failed(ref r) if r.contains("connection refused")));
        assert_eq!(ledger.polls(), 1);
        assert!(matches!(report.ensure_complete(), Err(NomError::ReceiveFailed(_))));
    }

    #[test]
    fn test_cancel_before_first_poll() {
        let ledger = MockLedger::new();
        let signer = signer();
        ledger.push_unreceived(transfer("x", signer.address(), 1, "ZNN", 8));
        let token = CancelToken::new();
        token.cancel();
        let report = TransferReconciler::new(&ledger, &signer, 1, ReceivePolicy::default())
            .with_cancel(token)
            .run();
        assert_eq!(report.outcome, Outcome::Cancelled);
        assert_eq!(ledger.polls(), 0);
        assert_eq!(ledger.pending(), 1);
        assert!(report.ensure_complete().is_ok());
    }

    #[test]
    fn test_failure_record_is_deduplicated() {
        let mut failed = Vec::new();
        let h = Hash::digest(b"h");
        record_failure(&mut failed, h, "one".into());
        record_failure(&mut failed, h, "two".into());
        assert_eq!(failed, vec![(h, "two".to_string())]);
    }

    #[test]
    fn test_policy_from_config() {
        let cfg = ReceiveConfig {
            page_size: 0,
            strict: true,
            max_stalled_rounds: 0,
            retry_delay_ms: 250,
        };
        let policy = ReceivePolicy::from(&cfg);
        assert_eq!(policy.page_size, 1);
        assert!(policy.strict);
        assert_eq!(policy.max_stalled_rounds, 1);
        assert_eq!(policy.retry_delay, Duration::from_millis(250));
    }
}
