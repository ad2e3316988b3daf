//! # Structured Error Hierarchy
//!
//! Four error families, matching the propagation policy of the engine:
//!
//! - [`ValidationError`] — malformed or missing required input. Raised
//!   before any audit event exists; local and immediate.
//! - [`RuleConfigError`] — a (jurisdiction, tax year) pair is unregistered
//!   or its rule data is malformed. Fatal configuration error; never a
//!   silent default.
//! - [`CalculationError`] — a pipeline stage cannot proceed. Attributed to
//!   its stage; the partial audit chain survives for forensic inspection.
//! - [`AuditIntegrityError`] — hash-chain verification mismatch. Always
//!   fatal and always surfaced, never auto-corrected.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The nine pipeline stages, in execution order.
///
/// Shared by stage errors, audit events, and tracing spans so that a
/// stage is named identically everywhere it appears.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StageName {
    /// Self-employment tax and its half-deduction.
    SelfEmploymentTax,
    /// Total income minus above-the-line adjustments.
    AdjustedGrossIncome,
    /// Standard-vs-itemized selection.
    Deductions,
    /// Qualified-business-income deduction with phased limitation.
    QualifiedBusinessIncome,
    /// Floor-at-zero taxable income.
    TaxableIncome,
    /// Ordinary brackets, preferential stacking, investment surtax.
    TaxComputation,
    /// Parallel alternative-minimum computation.
    AlternativeMinimumTax,
    /// Ordered credit application.
    Credits,
    /// Payments reconciliation and underpayment penalty.
    PaymentsAndPenalties,
}

impl StageName {
    /// The canonical string name of this stage.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SelfEmploymentTax => "SELF_EMPLOYMENT_TAX",
            Self::AdjustedGrossIncome => "ADJUSTED_GROSS_INCOME",
            Self::Deductions => "DEDUCTIONS",
            Self::QualifiedBusinessIncome => "QUALIFIED_BUSINESS_INCOME",
            Self::TaxableIncome => "TAXABLE_INCOME",
            Self::TaxComputation => "TAX_COMPUTATION",
            Self::AlternativeMinimumTax => "ALTERNATIVE_MINIMUM_TAX",
            Self::Credits => "CREDITS",
            Self::PaymentsAndPenalties => "PAYMENTS_AND_PENALTIES",
        }
    }

    /// All stages in execution order. The pipeline is built from this
    /// array; reordering here reorders the pipeline.
    pub const ORDER: [StageName; 9] = [
        Self::SelfEmploymentTax,
        Self::AdjustedGrossIncome,
        Self::Deductions,
        Self::QualifiedBusinessIncome,
        Self::TaxableIncome,
        Self::TaxComputation,
        Self::AlternativeMinimumTax,
        Self::Credits,
        Self::PaymentsAndPenalties,
    ];
}

impl std::fmt::Display for StageName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Classification of an input validation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationKind {
    /// A required field is absent.
    MissingField,
    /// A field is present but its value is not acceptable.
    InvalidValue,
    /// Two or more fields contradict each other.
    InconsistentInput,
    /// The input schema version is not supported by this engine build.
    UnsupportedVersion,
}

/// Malformed or missing required input, detected before any audit event
/// is recorded. Carries the `{field, kind, message}` triple the calling
/// service translates into user-facing text.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("validation failed for `{field}`: {message}")]
pub struct ValidationError {
    /// Dotted path of the offending input field.
    pub field: String,
    /// Failure classification.
    pub kind: ValidationKind,
    /// Diagnostic detail.
    pub message: String,
}

/// Rule-configuration failures. Fatal and fail-fast: an unregistered
/// (jurisdiction, year) pair is never answered with a default rule set.
#[derive(Error, Debug)]
pub enum RuleConfigError {
    /// No rule set registered for the requested pair.
    #[error("no rule set registered for jurisdiction {jurisdiction} tax year {tax_year}")]
    Unregistered {
        /// The requested jurisdiction code.
        jurisdiction: String,
        /// The requested tax year.
        tax_year: u16,
    },

    /// A rule set for the pair is already registered.
    #[error("rule set for jurisdiction {jurisdiction} tax year {tax_year} already registered")]
    DuplicateRegistration {
        /// The conflicting jurisdiction code.
        jurisdiction: String,
        /// The conflicting tax year.
        tax_year: u16,
    },

    /// Rule data failed load-time validation.
    #[error("malformed rule set `{source_name}`: {detail}")]
    Malformed {
        /// File name or fixture name the data came from.
        source_name: String,
        /// What failed validation.
        detail: String,
    },

    /// Rule file could not be read.
    #[error("rule file I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Rule file could not be parsed.
    #[error("rule file parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// A stage-attributed calculation failure. The pipeline halts at the
/// failing stage; the partial audit chain is sealed `INCOMPLETE` and
/// returned alongside this error.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CalculationError {
    /// The stage read a field no earlier stage has committed.
    #[error("stage {stage}: missing dependency `{field}`")]
    MissingDependency {
        /// The stage that attempted the read.
        stage: StageName,
        /// The uncommitted field.
        field: String,
    },

    /// A stage attempted to rewrite an already-committed field.
    #[error("stage {stage}: field `{field}` already committed")]
    FieldAlreadyCommitted {
        /// The stage that attempted the rewrite.
        stage: StageName,
        /// The previously committed field.
        field: String,
    },

    /// A stage produced or observed a value violating a stated invariant.
    #[error("stage {stage}: invariant violation: {detail}")]
    InvariantViolation {
        /// The stage attributed with the violation.
        stage: StageName,
        /// What was violated.
        detail: String,
    },

    /// Recording the stage's audit event failed.
    #[error("stage {stage}: audit recording failed: {detail}")]
    AuditRecord {
        /// The stage whose event could not be recorded.
        stage: StageName,
        /// Underlying failure detail.
        detail: String,
    },
}

impl CalculationError {
    /// The stage this error is attributed to.
    pub fn stage(&self) -> StageName {
        match self {
            Self::MissingDependency { stage, .. }
            | Self::FieldAlreadyCommitted { stage, .. }
            | Self::InvariantViolation { stage, .. }
            | Self::AuditRecord { stage, .. } => *stage,
        }
    }
}

/// Hash-chain integrity failures. Signals possible tampering: always
/// surfaced to the caller, never logged-and-ignored.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuditIntegrityError {
    /// A recomputed link hash does not match the stored hash.
    #[error("link hash mismatch at sequence {sequence}")]
    LinkMismatch {
        /// The first event whose hash failed recomputation.
        sequence: u64,
    },

    /// A stored `prev_hash` does not match its predecessor's hash.
    #[error("broken chain link at sequence {sequence}: prev_hash does not match predecessor")]
    BrokenLink {
        /// The event whose back-pointer is wrong.
        sequence: u64,
    },

    /// Event sequence numbers are not contiguous from zero.
    #[error("sequence gap: expected {expected}, found {actual}")]
    SequenceGap {
        /// The expected next sequence number.
        expected: u64,
        /// The sequence number actually found.
        actual: u64,
    },

    /// The first event does not chain from the well-known genesis value.
    #[error("genesis mismatch: first event does not chain from the zero digest")]
    GenesisMismatch,

    /// The sealed chain digest does not match recomputation.
    #[error("chain digest mismatch: sealed digest does not match recomputation")]
    ChainDigestMismatch,

    /// The HMAC key was rejected by the MAC implementation.
    #[error("audit key rejected: {detail}")]
    KeyRejected {
        /// Underlying rejection detail.
        detail: String,
    },

    /// An event could not be canonicalized for hashing.
    #[error("event canonicalization failed at sequence {sequence}: {detail}")]
    Canonicalization {
        /// The event that failed to canonicalize.
        sequence: u64,
        /// Underlying failure detail.
        detail: String,
    },
}
