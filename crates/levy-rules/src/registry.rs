//! # Rule Registry
//!
//! [`RuleRegistry`] resolves (jurisdiction, tax year) pairs to immutable
//! [`JurisdictionRuleSet`] values. Populated once at process start — from
//! rule files or the built-in fixture — and read-only thereafter, so
//! concurrent runs share it without synchronization (`Arc` clones).
//!
//! ## Fail-Fast Contract
//!
//! `resolve()` on an unregistered pair is a [`RuleConfigError`], never a
//! silent default. The loader rejects malformed or incomplete rule files
//! at load time rather than substituting defaults.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use levy_core::{Jurisdiction, RuleConfigError, TaxYear};

use crate::federal::federal_2025;
use crate::ruleset::JurisdictionRuleSet;

/// Registry of rule sets keyed by (jurisdiction, tax year).
#[derive(Debug, Default)]
pub struct RuleRegistry {
    rules: HashMap<(Jurisdiction, TaxYear), Arc<JurisdictionRuleSet>>,
}

impl RuleRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry preloaded with the built-in federal fixture.
    pub fn builtin() -> Result<Self, RuleConfigError> {
        let mut registry = Self::new();
        registry.register(federal_2025()?)?;
        Ok(registry)
    }

    /// Register a validated rule set.
    ///
    /// # Errors
    ///
    /// Returns [`RuleConfigError::DuplicateRegistration`] if the pair is
    /// already registered, or [`RuleConfigError::Malformed`] if the rule
    /// set fails validation.
    pub fn register(&mut self, ruleset: JurisdictionRuleSet) -> Result<(), RuleConfigError> {
        ruleset
            .validate()
            .map_err(|detail| RuleConfigError::Malformed {
                source_name: format!("{}:{}", ruleset.jurisdiction, ruleset.tax_year),
                detail,
            })?;
        let key = (ruleset.jurisdiction.clone(), ruleset.tax_year);
        if self.rules.contains_key(&key) {
            return Err(RuleConfigError::DuplicateRegistration {
                jurisdiction: key.0.to_string(),
                tax_year: key.1.as_u16(),
            });
        }
        tracing::info!(
            jurisdiction = %key.0,
            tax_year = %key.1,
            rule_version = %ruleset.rule_version,
            "registered rule set"
        );
        self.rules.insert(key, Arc::new(ruleset));
        Ok(())
    }

    /// Resolve the rule set for a pair. Fail-fast on unregistered pairs.
    pub fn resolve(
        &self,
        jurisdiction: &Jurisdiction,
        tax_year: TaxYear,
    ) -> Result<Arc<JurisdictionRuleSet>, RuleConfigError> {
        self.rules
            .get(&(jurisdiction.clone(), tax_year))
            .cloned()
            .ok_or_else(|| RuleConfigError::Unregistered {
                jurisdiction: jurisdiction.to_string(),
                tax_year: tax_year.as_u16(),
            })
    }

    /// All registered pairs with their rule versions, sorted.
    pub fn registered(&self) -> Vec<(Jurisdiction, TaxYear, String)> {
        let mut out: Vec<_> = self
            .rules
            .iter()
            .map(|((j, y), r)| (j.clone(), *y, r.rule_version.clone()))
            .collect();
        out.sort_by(|a, b| (a.0.as_str(), a.1).cmp(&(b.0.as_str(), b.1)));
        out
    }

    /// Number of registered rule sets.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Load every `*.json` rule file from a directory.
    ///
    /// Each file holds one serialized [`JurisdictionRuleSet`]. The loader
    /// fails fast on the first unreadable, unparseable, or invalid file —
    /// a partially loaded registry is never returned.
    pub fn load_dir(path: &Path) -> Result<Self, RuleConfigError> {
        let mut registry = Self::new();
        let mut entries: Vec<_> = std::fs::read_dir(path)?
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .map(|e| e.path())
            .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
            .collect();
        // Deterministic load order regardless of directory iteration order.
        entries.sort();

        if entries.is_empty() {
            return Err(RuleConfigError::Malformed {
                source_name: path.display().to_string(),
                detail: "directory contains no .json rule files".to_string(),
            });
        }

        for file in entries {
            let source_name = file.display().to_string();
            let raw = std::fs::read_to_string(&file)?;
            let ruleset: JurisdictionRuleSet =
                serde_json::from_str(&raw).map_err(|e| RuleConfigError::Malformed {
                    source_name: source_name.clone(),
                    detail: e.to_string(),
                })?;
            ruleset
                .validate()
                .map_err(|detail| RuleConfigError::Malformed {
                    source_name: source_name.clone(),
                    detail,
                })?;
            registry.register(ruleset)?;
            tracing::debug!(file = %source_name, "loaded rule file");
        }
        Ok(registry)
    }
}
