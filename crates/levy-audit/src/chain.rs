//! # Audit Chain
//!
//! Tamper-evident, append-only event chain for one calculation run.
//!
//! [`AuditChain`] is the live recorder: stages append events and each
//! event is linked to its predecessor by an HMAC-SHA256 hash. Sealing
//! consumes the recorder and yields an immutable [`SealedChain`], so
//! recording after seal is unrepresentable. A sealed chain carries a
//! chain digest over its head state; [`SealedChain::verify`] replays
//! every link and the digest against a key, detecting any mutation of
//! a persisted chain.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use levy_core::{AuditIntegrityError, ContentDigest, RunId, StageName, Timestamp};

use crate::event::{hmac_digest, AuditEvent};
use crate::key::AuditKey;

// ---------------------------------------------------------------------------
// Chain status
// ---------------------------------------------------------------------------

/// Terminal state of a sealed chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChainStatus {
    /// Every pipeline stage recorded an event before sealing.
    Complete,
    /// The run aborted mid-pipeline; events up to the failure survive.
    Incomplete,
}

impl ChainStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChainStatus::Complete => "complete",
            ChainStatus::Incomplete => "incomplete",
        }
    }
}

// ---------------------------------------------------------------------------
// Live recorder
// ---------------------------------------------------------------------------

/// Append-only recorder for one run's audit events.
///
/// Created at pipeline start, fed one event per stage, then consumed by
/// [`AuditChain::seal`] or [`AuditChain::seal_incomplete`].
#[derive(Debug)]
pub struct AuditChain {
    run_id: RunId,
    key: AuditKey,
    events: Vec<AuditEvent>,
}

impl AuditChain {
    /// Start an empty chain for `run_id` under `key`.
    pub fn new(run_id: RunId, key: AuditKey) -> Self {
        debug!(run_id = %run_id, "audit chain opened");
        Self {
            run_id,
            key,
            events: Vec::new(),
        }
    }

    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    /// Events recorded so far, in append order.
    pub fn events(&self) -> &[AuditEvent] {
        &self.events
    }

    /// Hash of the most recent event, or the genesis digest when empty.
    pub fn head(&self) -> ContentDigest {
        self.events
            .last()
            .map(|e| e.hash.clone())
            .unwrap_or_else(ContentDigest::zero)
    }

    /// Append one stage event, assigning its sequence and link hash.
    pub fn record(
        &mut self,
        stage: StageName,
        rule_version: &str,
        input_snapshot: Value,
        output_snapshot: Value,
    ) -> Result<&AuditEvent, AuditIntegrityError> {
        let sequence = self.events.len() as u64;
        let prev_hash = self.head();
        let mut event = AuditEvent {
            sequence,
            stage,
            rule_version: rule_version.to_owned(),
            input_snapshot,
            output_snapshot,
            timestamp: Timestamp::now(),
            prev_hash,
            hash: ContentDigest::zero(),
        };
        event.hash = event.compute_hash(&self.key)?;
        debug!(
            run_id = %self.run_id,
            sequence,
            stage = stage.as_str(),
            "audit event recorded"
        );
        self.events.push(event);
        Ok(self.events.last().unwrap_or_else(|| unreachable!()))
    }

    /// Seal a fully recorded chain. Consumes the recorder.
    pub fn seal(self) -> Result<SealedChain, AuditIntegrityError> {
        self.seal_with_status(ChainStatus::Complete)
    }

    /// Seal a chain after a mid-pipeline failure. Consumes the recorder.
    pub fn seal_incomplete(self) -> Result<SealedChain, AuditIntegrityError> {
        self.seal_with_status(ChainStatus::Incomplete)
    }

    fn seal_with_status(self, status: ChainStatus) -> Result<SealedChain, AuditIntegrityError> {
        let head = self.head();
        let count = self.events.len() as u64;
        let chain_digest = chain_digest(&self.key, self.run_id, &head, count, status)?;
        info!(
            run_id = %self.run_id,
            events = count,
            status = status.as_str(),
            "audit chain sealed"
        );
        Ok(SealedChain {
            run_id: self.run_id,
            status,
            events: self.events,
            head,
            chain_digest,
        })
    }
}

/// Digest binding the chain's terminal state under the audit key.
fn chain_digest(
    key: &AuditKey,
    run_id: RunId,
    head: &ContentDigest,
    count: u64,
    status: ChainStatus,
) -> Result<ContentDigest, AuditIntegrityError> {
    hmac_digest(
        key,
        &[
            run_id.to_string().as_bytes(),
            head.as_bytes(),
            &count.to_be_bytes(),
            status.as_str().as_bytes(),
        ],
    )
}

// ---------------------------------------------------------------------------
// Sealed chain
// ---------------------------------------------------------------------------

/// An immutable, persistable audit chain.
///
/// Serializes to JSON for archival. Integrity is re-checked with
/// [`SealedChain::verify`], which needs the original key; the chain
/// itself never carries key material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SealedChain {
    run_id: RunId,
    status: ChainStatus,
    events: Vec<AuditEvent>,
    head: ContentDigest,
    chain_digest: ContentDigest,
}

impl SealedChain {
    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    pub fn status(&self) -> ChainStatus {
        self.status
    }

    pub fn events(&self) -> &[AuditEvent] {
        &self.events
    }

    pub fn head(&self) -> &ContentDigest {
        &self.head
    }

    pub fn chain_digest(&self) -> &ContentDigest {
        &self.chain_digest
    }

    /// Event recorded by `stage`, if any.
    pub fn event_for(&self, stage: StageName) -> Option<&AuditEvent> {
        self.events.iter().find(|e| e.stage == stage)
    }

    /// Replay every link and the chain digest against `key`.
    ///
    /// Checks, in order and per event: contiguous sequence numbering,
    /// `prev_hash` equals the predecessor's hash (genesis digest for
    /// the first event), and the recomputed HMAC matches the stored
    /// hash. Then the head pointer and the sealed chain digest. All
    /// digest comparisons are constant-time.
    pub fn verify(&self, key: &AuditKey) -> Result<(), AuditIntegrityError> {
        let mut prev = ContentDigest::zero();
        for (index, event) in self.events.iter().enumerate() {
            let expected_sequence = index as u64;
            if event.sequence != expected_sequence {
                return Err(AuditIntegrityError::SequenceGap {
                    expected: expected_sequence,
                    actual: event.sequence,
                });
            }
            if index == 0 && !event.prev_hash.ct_eq(&ContentDigest::zero()) {
                return Err(AuditIntegrityError::GenesisMismatch);
            }
            if !event.prev_hash.ct_eq(&prev) {
                return Err(AuditIntegrityError::BrokenLink {
                    sequence: event.sequence,
                });
            }
            let recomputed = event.compute_hash(key)?;
            if !recomputed.ct_eq(&event.hash) {
                return Err(AuditIntegrityError::LinkMismatch {
                    sequence: event.sequence,
                });
            }
            prev = event.hash.clone();
        }
        if !self.head.ct_eq(&prev) {
            return Err(AuditIntegrityError::BrokenLink {
                sequence: self.events.len() as u64,
            });
        }
        let expected = chain_digest(
            key,
            self.run_id,
            &self.head,
            self.events.len() as u64,
            self.status,
        )?;
        if !expected.ct_eq(&self.chain_digest) {
            return Err(AuditIntegrityError::ChainDigestMismatch);
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
