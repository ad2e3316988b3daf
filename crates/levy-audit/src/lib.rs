//! # levy-audit
//!
//! Tamper-evident audit trail for the Levy calculation engine.
//!
//! Every calculation run opens an [`AuditChain`], records one event per
//! pipeline stage, and seals the chain when the run ends. Events are
//! linked by HMAC-SHA256 over their canonical JSON form, so any
//! post-hoc edit, insertion, deletion, or reordering of a persisted
//! chain is detectable by [`SealedChain::verify`] given the original
//! [`AuditKey`]. Sealed chains live in an [`AuditArchive`] keyed by
//! run.
//!
//! Sealing consumes the recorder; recording into a sealed chain is a
//! compile error, not a runtime check.

pub mod archive;
pub mod chain;
pub mod event;
pub mod key;

pub use archive::{ArchiveError, AuditArchive};
pub use chain::{AuditChain, ChainStatus, SealedChain};
pub use event::AuditEvent;
pub use key::AuditKey;
