//! # Domain-Primitive Newtypes
//!
//! Newtypes for the fundamental addressing primitives of a calculation
//! run: the jurisdiction whose rules apply, the tax year being computed,
//! the filing status, and the per-run identifier.
//!
//! ## Validation
//!
//! [`Jurisdiction`] is validated non-empty and normalized to upper case at
//! construction time. [`TaxYear`] is validated into a sane window. [`RunId`]
//! is UUID-based and always valid by construction.

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ValidationError, ValidationKind};

// -- Validating Deserialize for Jurisdiction ----------------------------------

impl<'de> Deserialize<'de> for Jurisdiction {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::new(raw).map_err(serde::de::Error::custom)
    }
}

/// A jurisdiction code: a country or country-subdivision identifier
/// (e.g. `"US"` for federal, `"US-CA"` for California).
///
/// # Validation
///
/// Must be non-empty; normalized to upper case. No further format
/// restriction is imposed because subdivision naming varies by deployment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Jurisdiction(String);

impl Jurisdiction {
    /// Create a jurisdiction code, validating non-emptiness.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] if the string is empty or
    /// whitespace-only.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let normalized = value.into().trim().to_uppercase();
        if normalized.is_empty() {
            return Err(ValidationError {
                field: "jurisdiction".to_string(),
                kind: ValidationKind::InvalidValue,
                message: "jurisdiction code must be non-empty".to_string(),
            });
        }
        Ok(Self(normalized))
    }

    /// Access the jurisdiction code string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Jurisdiction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// -- Validating Deserialize for TaxYear ---------------------------------------

impl<'de> Deserialize<'de> for TaxYear {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = u16::deserialize(deserializer)?;
        Self::new(raw).map_err(serde::de::Error::custom)
    }
}

/// A tax year, validated into `[2000, 2100]`.
///
/// Rule sets are registered per (jurisdiction, tax year) pair; a year
/// outside the window is a data-entry error, never a computable request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct TaxYear(u16);

impl TaxYear {
    /// Create a tax year, validating the window.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] if the year falls outside
    /// `[2000, 2100]`.
    pub fn new(year: u16) -> Result<Self, ValidationError> {
        if !(2000..=2100).contains(&year) {
            return Err(ValidationError {
                field: "tax_year".to_string(),
                kind: ValidationKind::InvalidValue,
                message: format!("tax year {year} outside supported window [2000, 2100]"),
            });
        }
        Ok(Self(year))
    }

    /// The year as a plain integer.
    pub fn as_u16(&self) -> u16 {
        self.0
    }

    /// The year that precedes this one.
    ///
    /// Returns `None` at the lower bound of the supported window.
    pub fn previous(&self) -> Option<TaxYear> {
        TaxYear::new(self.0 - 1).ok()
    }
}

impl std::fmt::Display for TaxYear {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A unique identifier for one calculation run.
///
/// Every run owns exactly one calculation context and one audit chain,
/// both keyed by this identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(Uuid);

impl RunId {
    /// Create a new random run identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a run identifier from an existing UUID.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Filing status of the return. Drives bracket-table, standard-deduction,
/// threshold, and phaseout selection in every rule lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilingStatus {
    /// Unmarried taxpayer.
    Single,
    /// Married couple filing one combined return.
    MarriedFilingJointly,
    /// Married taxpayer filing separately from their spouse.
    MarriedFilingSeparately,
    /// Unmarried taxpayer maintaining a household for a qualifying person.
    HeadOfHousehold,
    /// Widow(er) with a dependent child, within the statutory window.
    QualifyingSurvivingSpouse,
}

impl FilingStatus {
    /// Whether the status files together with a spouse on the same return.
    pub fn is_joint(&self) -> bool {
        matches!(
            self,
            Self::MarriedFilingJointly | Self::QualifyingSurvivingSpouse
        )
    }

    /// The canonical string name of this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::MarriedFilingJointly => "married_filing_jointly",
            Self::MarriedFilingSeparately => "married_filing_separately",
            Self::HeadOfHousehold => "head_of_household",
            Self::QualifyingSurvivingSpouse => "qualifying_surviving_spouse",
        }
    }

    /// All statuses, in declaration order. Used by rule-set completeness
    /// validation.
    pub const ALL: [FilingStatus; 5] = [
        Self::Single,
        Self::MarriedFilingJointly,
        Self::MarriedFilingSeparately,
        Self::HeadOfHousehold,
        Self::QualifyingSurvivingSpouse,
    ];
}

impl std::fmt::Display for FilingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A UTC timestamp with RFC 3339 serialization.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// The current time, truncated to the microsecond precision this
    /// type serializes at.
    pub fn now() -> Self {
        Self(Utc::now().trunc_subsecs(6))
    }

    /// Wrap an existing datetime.
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Access the underlying datetime.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339_opts(SecondsFormat::Micros, true))
    }
}

impl Serialize for Timestamp {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        let dt = DateTime::parse_from_rfc3339(&raw)
            .map_err(serde::de::Error::custom)?
            .with_timezone(&Utc);
        Ok(Self(dt))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jurisdiction_normalizes_case() {
        let j = Jurisdiction::new("us-ca").unwrap();
        assert_eq!(j.as_str(), "US-CA");
    }

    #[test]
    fn jurisdiction_rejects_empty() {
        assert!(Jurisdiction::new("").is_err());
        assert!(Jurisdiction::new("   ").is_err());
    }

    #[test]
    fn jurisdiction_serde_roundtrip() {
        let j = Jurisdiction::new("US").unwrap();
        let json = serde_json::to_string(&j).unwrap();
        let back: Jurisdiction = serde_json::from_str(&json).unwrap();
        assert_eq!(j, back);
    }

    #[test]
    fn tax_year_window() {
        assert!(TaxYear::new(2025).is_ok());
        assert!(TaxYear::new(1999).is_err());
        assert!(TaxYear::new(2101).is_err());
    }

    #[test]
    fn tax_year_previous() {
        let y = TaxYear::new(2025).unwrap();
        assert_eq!(y.previous().unwrap().as_u16(), 2024);
        assert!(TaxYear::new(2000).unwrap().previous().is_none());
    }

    #[test]
    fn tax_year_deserialize_rejects_out_of_window() {
        let result: Result<TaxYear, _> = serde_json::from_str("1970");
        assert!(result.is_err());
    }

    #[test]
    fn run_id_unique() {
        assert_ne!(RunId::new(), RunId::new());
    }

    #[test]
    fn filing_status_joint() {
        assert!(FilingStatus::MarriedFilingJointly.is_joint());
        assert!(FilingStatus::QualifyingSurvivingSpouse.is_joint());
        assert!(!FilingStatus::Single.is_joint());
        assert!(!FilingStatus::MarriedFilingSeparately.is_joint());
    }

    #[test]
    fn filing_status_serde_name() {
        let json = serde_json::to_string(&FilingStatus::HeadOfHousehold).unwrap();
        assert_eq!(json, "\"head_of_household\"");
    }

    #[test]
    fn timestamp_serde_roundtrip() {
        let ts = Timestamp::now();
        let json = serde_json::to_string(&ts).unwrap();
        let back: Timestamp = serde_json::from_str(&json).unwrap();
        assert_eq!(ts.to_string(), back.to_string());
    }
}
