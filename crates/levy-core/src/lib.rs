//! # levy-core — Foundational Types for the Levy Engine
//!
//! This crate provides the primitives shared by every other crate in the
//! workspace:
//!
//! - **Fixed-point monetary arithmetic** ([`Money`], [`Rate`]) with a
//!   single documented rounding policy (round-half-up, once per
//!   reportable line).
//! - **Canonical serialization** ([`CanonicalBytes`]) and **content
//!   digests** ([`ContentDigest`]) — the only sanctioned inputs to
//!   hashing.
//! - **Domain-primitive newtypes**: [`Jurisdiction`], [`TaxYear`],
//!   [`RunId`], [`FilingStatus`], [`Timestamp`].
//! - **Structured error hierarchy**: [`ValidationError`],
//!   [`RuleConfigError`], [`CalculationError`], [`AuditIntegrityError`],
//!   and the shared [`StageName`] enum.

pub mod canonical;
pub mod error;
pub mod ids;
pub mod money;

// Re-export primary types.
pub use canonical::{sha256_digest, CanonicalBytes, CanonicalizationError, ContentDigest};
pub use error::{
    AuditIntegrityError, CalculationError, RuleConfigError, StageName, ValidationError,
    ValidationKind,
};
pub use ids::{FilingStatus, Jurisdiction, RunId, TaxYear, Timestamp};
pub use money::{Money, Rate};
