//! # Built-In Federal Rule Fixture
//!
//! The US federal 2025 rule set, embedded as JSON data. Used as the
//! default registry content by the CLI and as the reference fixture by
//! the golden-scenario tests. Deployments with their own rule files load
//! them through `RuleRegistry::load_dir` instead.

use levy_core::RuleConfigError;

use crate::ruleset::JurisdictionRuleSet;

const FEDERAL_2025_JSON: &str = include_str!("../data/federal-2025.json");

/// The US federal rule set for tax year 2025.
///
/// # Errors
///
/// Returns [`RuleConfigError`] if the embedded fixture fails to parse or
/// validate — which indicates a defective build, not a runtime condition.
pub fn federal_2025() -> Result<JurisdictionRuleSet, RuleConfigError> {
    let rules: JurisdictionRuleSet = serde_json::from_str(FEDERAL_2025_JSON)?;
    rules
        .validate()
        .map_err(|detail| RuleConfigError::Malformed {
            source_name: "builtin:federal-2025".to_string(),
            detail,
        })?;
    Ok(rules)
}

#[cfg(test)]
mod tests {
    use super::*;
    use levy_core::{FilingStatus, Money};

    #[test]
    fn fixture_parses_and_validates() {
        let rules = federal_2025().unwrap();
        assert_eq!(rules.rule_version, "us-federal-2025.1");
    }

    #[test]
    fn single_standard_deduction_2025() {
        let rules = federal_2025().unwrap();
        assert_eq!(
            *rules.standard_deduction.get(FilingStatus::Single),
            Money::from_dollars(15_750)
        );
    }

    #[test]
    fn single_filer_bracket_math_is_exact() {
        // Single, $34,250 taxable: 11,925 at 10% plus 22,325 at 12%.
        let rules = federal_2025().unwrap();
        let tax = rules
            .ordinary_brackets
            .get(FilingStatus::Single)
            .tax_for(Money::from_dollars(34_250));
        assert_eq!(tax.to_line(), "3871.50".parse().unwrap());
    }

    #[test]
    fn wage_base_matches_2025() {
        let rules = federal_2025().unwrap();
        assert_eq!(
            rules.se_tax.social_security_wage_base,
            Money::from_dollars(176_100)
        );
    }

    #[test]
    fn joint_qbi_band_is_double_width() {
        let rules = federal_2025().unwrap();
        let single = rules.qbi.phase_in.get(FilingStatus::Single);
        let joint = rules.qbi.phase_in.get(FilingStatus::MarriedFilingJointly);
        assert_eq!(
            (joint.upper - joint.lower).as_decimal(),
            (single.upper - single.lower).as_decimal() * rust_decimal::Decimal::TWO
        );
    }
}
