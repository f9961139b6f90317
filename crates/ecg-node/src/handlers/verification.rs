//! # Verification Worker
//!
//! Closes the escrow phase of newly stored records. For every
//! `VERIFICATION_REQUESTED` event:
//!
//! 1. Fetch the content hash from the content store, retrying while the
//!    store is unavailable
//! 2. Check the content parses as JSON
//! 3. Call `confirmRecord` as the verifier identity
//!
//! If the content cannot be fetched within the event's `timeoutSeconds` the
//! worker gives up and the record stays `PENDING_VERIFICATION`.

use crate::errors::{ContentStoreError, VerifierError};
use crate::ports::ContentStore;
use ecg_01_record_ledger::adapters::TxContext;
use ecg_01_record_ledger::domain::ValidityFlag;
use ecg_01_record_ledger::ports::inbound::RecordLedgerApi;
use ecg_telemetry::{metric_inc, time_histogram, VERIFICATION_DURATION, VERIFICATION_OUTCOMES};
use serde_json::Value;
use shared_bus::{ContractEvent, EventFilter, Subscription};
use shared_types::entities::RecordStatus;
use shared_types::events::{channels, RecordEvent};
use shared_types::identity::Identity;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

/// Pause between fetch attempts while the content store is unavailable.
pub const RETRY_INTERVAL: Duration = Duration::from_millis(250);

/// Identity the worker signs `confirmRecord` with unless configured.
pub const DEFAULT_VERIFIER_IDENTITY: &str =
    "x509::CN=ecg-verifier,OU=client::CN=ca.org1.example.com";

/// Bus filter for the verification requests of `contract`.
#[must_use]
pub fn request_filter(contract: &str) -> EventFilter {
    EventFilter::contract(contract).with_events([channels::VERIFICATION_REQUESTED])
}

/// What the worker did with one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationOutcome {
    /// Content retrieved and well-formed; record is `CONFIRMED`.
    Confirmed,
    /// Record is `FAILED` with these details.
    Failed { details: String },
    /// Gave up; record untouched.
    TimedOut,
}

impl VerificationOutcome {
    /// Metric label.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Confirmed => "confirmed",
            Self::Failed { .. } => "failed",
            Self::TimedOut => "timeout",
        }
    }
}

/// Counters reported when the worker stops.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct VerifierStats {
    pub requests: u64,
    pub confirmed: u64,
    pub failed: u64,
    pub timed_out: u64,
    pub errors: u64,
}

/// Bus consumer that verifies stored content and records the outcome.
pub struct VerificationHandler<C: ContentStore, A: RecordLedgerApi> {
    subscription: Subscription,
    content: C,
    ledger: A,
    verifier: Identity,
    stats: VerifierStats,
}

enum Next {
    Event(Option<ContractEvent>),
    Shutdown { sender_gone: bool },
}

impl<C: ContentStore, A: RecordLedgerApi> VerificationHandler<C, A> {
    pub fn new(subscription: Subscription, content: C, ledger: A, verifier: Identity) -> Self {
        Self {
            subscription,
            content,
            ledger,
            verifier,
            stats: VerifierStats::default(),
        }
    }

    #[must_use]
    pub fn stats(&self) -> &VerifierStats {
        &self.stats
    }

    /// Handle one request and record the outcome in stats and metrics.
    pub async fn handle(
        &mut self,
        event: &ContractEvent,
    ) -> Result<VerificationOutcome, VerifierError> {
        self.stats.requests += 1;
        let result = self.verify(event).await;

        match &result {
            Ok(outcome) => {
                match outcome {
                    VerificationOutcome::Confirmed => self.stats.confirmed += 1,
                    VerificationOutcome::Failed { .. } => self.stats.failed += 1,
                    VerificationOutcome::TimedOut => self.stats.timed_out += 1,
                }
                metric_inc!(VERIFICATION_OUTCOMES, &[outcome.label()]);
            }
            Err(e) => {
                self.stats.errors += 1;
                metric_inc!(VERIFICATION_OUTCOMES, &["error"]);
                warn!(tx_id = %event.tx_id, error = %e, "Verification request not processed");
            }
        }
        result
    }

    async fn verify(&self, event: &ContractEvent) -> Result<VerificationOutcome, VerifierError> {
        let request = match event.decode()? {
            RecordEvent::VerificationRequested(request) => request,
            other => return Err(VerifierError::UnexpectedEvent(other.event_type().to_string())),
        };
        let _timer = time_histogram!(VERIFICATION_DURATION);
        info!(
            patient_id = %request.patient_id,
            content_hash = %request.content_hash,
            timeout_secs = request.timeout_seconds,
            "Verifying stored content"
        );

        let limit = Duration::from_secs(request.timeout_seconds);
        let (validity, details) = match self.fetch(&request.content_hash, limit).await {
            None => {
                warn!(
                    patient_id = %request.patient_id,
                    timeout_secs = request.timeout_seconds,
                    "Content not retrievable in time, giving up"
                );
                return Ok(VerificationOutcome::TimedOut);
            }
            Some(Err(e)) => (ValidityFlag::INVALID, format!("content not retrievable: {e}")),
            Some(Ok(content)) => judge(&content),
        };

        let ctx = TxContext::now(self.verifier.clone());
        let status = self
            .ledger
            .confirm_record(&ctx, &request.patient_id, validity, &details)?;
        info!(patient_id = %request.patient_id, status = %status, "Verification recorded");

        Ok(match status {
            RecordStatus::Confirmed => VerificationOutcome::Confirmed,
            _ => VerificationOutcome::Failed { details },
        })
    }

    /// `None` once `limit` elapses.
    async fn fetch(
        &self,
        hash: &str,
        limit: Duration,
    ) -> Option<Result<Vec<u8>, ContentStoreError>> {
        let attempts = async {
            loop {
                match self.content.get(hash).await {
                    Err(e) if e.is_transient() => {
                        debug!(
                            content_hash = hash,
                            error = %e,
                            "Content store unavailable, retrying"
                        );
                        tokio::time::sleep(RETRY_INTERVAL).await;
                    }
                    other => return other,
                }
            }
        };
        tokio::time::timeout(limit, attempts).await.ok()
    }

    /// Consume requests until shutdown is signalled or the bus closes.
    ///
    /// A request still in flight at shutdown is abandoned.
    #[instrument(skip_all, name = "verification_worker")]
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> VerifierStats {
        info!(verifier = %self.verifier, "Verification worker started");

        loop {
            if *shutdown.borrow() {
                break;
            }

            let next = tokio::select! {
                biased;
                changed = shutdown.changed() => Next::Shutdown { sender_gone: changed.is_err() },
                event = self.subscription.recv() => Next::Event(event),
            };

            let event = match next {
                Next::Shutdown { sender_gone: true } => break,
                Next::Shutdown { sender_gone: false } => continue,
                Next::Event(None) => {
                    info!("Event bus closed");
                    break;
                }
                Next::Event(Some(event)) => event,
            };

            let finished = tokio::select! {
                biased;
                _ = shutdown.changed() => false,
                // Failures are already logged and counted.
                _ = self.handle(&event) => true,
            };
            if !finished {
                warn!(tx_id = %event.tx_id, "Verification abandoned at shutdown");
                break;
            }
        }

        info!(
            requests = self.stats.requests,
            confirmed = self.stats.confirmed,
            failed = self.stats.failed,
            timed_out = self.stats.timed_out,
            errors = self.stats.errors,
            "Verification worker stopped"
        );
        self.stats
    }
}

fn judge(content: &[u8]) -> (ValidityFlag, String) {
    match serde_json::from_slice::<Value>(content) {
        Ok(_) => (
            ValidityFlag::VALID,
            format!("content retrieved and well-formed ({} bytes)", content.len()),
        ),
        Err(e) => (
            ValidityFlag::INVALID,
            format!("content is not well-formed JSON: {e}"),
        ),
    }
}

// =============================================================================
// TESTS
// =============================================================================
