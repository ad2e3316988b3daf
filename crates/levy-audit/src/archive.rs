//! # Audit Archive
//!
//! In-memory store of sealed chains, keyed by run. Chains are shared
//! out as `Arc` so callers can hold a chain while the archive keeps
//! accepting new runs.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use thiserror::Error;
use tracing::info;

use levy_core::{RunId, StageName};

use crate::chain::SealedChain;
use crate::event::AuditEvent;

/// Archive rejection reasons.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// A chain for this run is already stored. Sealed chains are
    /// immutable; a second submission is always a caller bug.
    #[error("run {run_id} already archived")]
    DuplicateRun {
        /// The run whose chain was submitted twice.
        run_id: RunId,
    },
}

/// Thread-safe store of sealed audit chains.
#[derive(Debug, Default)]
pub struct AuditArchive {
    chains: RwLock<HashMap<RunId, Arc<SealedChain>>>,
}

impl AuditArchive {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a sealed chain. Rejects a second chain for the same run.
    pub fn store(&self, chain: SealedChain) -> Result<Arc<SealedChain>, ArchiveError> {
        let run_id = chain.run_id();
        let mut chains = self.chains.write();
        if chains.contains_key(&run_id) {
            return Err(ArchiveError::DuplicateRun { run_id });
        }
        let chain = Arc::new(chain);
        chains.insert(run_id, Arc::clone(&chain));
        info!(run_id = %run_id, events = chain.events().len(), "audit chain archived");
        Ok(chain)
    }

    /// The sealed chain for `run_id`, if archived.
    pub fn chain(&self, run_id: RunId) -> Option<Arc<SealedChain>> {
        self.chains.read().get(&run_id).cloned()
    }

    /// The event at `sequence` in `run_id`'s chain, if both exist.
    pub fn event(&self, run_id: RunId, sequence: u64) -> Option<AuditEvent> {
        self.chain(run_id)
            .and_then(|chain| chain.events().get(sequence as usize).cloned())
    }

    /// The event `stage` recorded in `run_id`'s chain, if both exist.
    pub fn event_for_stage(&self, run_id: RunId, stage: StageName) -> Option<AuditEvent> {
        self.chain(run_id)
            .and_then(|chain| chain.event_for(stage).cloned())
    }

    /// Number of archived runs.
    pub fn len(&self) -> usize {
        self.chains.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.chains.read().is_empty()
    }
}
