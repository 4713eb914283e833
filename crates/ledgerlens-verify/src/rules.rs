//! Accounting Consistency Rules
//!
//! Identities that must hold between statement totals, checked on the XBRL
//! figures and again on the figures read from the tables. A failed rule is a
//! warning in the report, never a reason to stop the run.

use ledgerlens_mapping::normalize_label;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Display names of the concepts the built-in rules read.
pub mod names {
    /// Total assets
    pub const TOTAL_ASSETS: &str = "Total Assets";
    /// Total liabilities
    pub const TOTAL_LIABILITIES: &str = "Total Liabilities";
    /// Total stockholders' equity
    pub const TOTAL_EQUITY: &str = "Total Stockholders Equity";
    /// Current assets
    pub const CURRENT_ASSETS: &str = "Current Assets";
    /// Current liabilities
    pub const CURRENT_LIABILITIES: &str = "Current Liabilities";
    /// Total revenue
    pub const TOTAL_REVENUE: &str = "Total Revenue";
    /// Cost of revenue
    pub const COST_OF_REVENUE: &str = "Cost of Revenue";
    /// Gross profit
    pub const GROSS_PROFIT: &str = "Gross Profit";
}

/// Figures a rule set is evaluated on, keyed by concept display name.
///
/// Lookups ignore case and punctuation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleValues {
    values: HashMap<String, f64>,
}

impl RuleValues {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a figure. The first figure recorded for a concept wins.
    pub fn insert(&mut self, concept: &str, value: f64) {
        self.values.entry(normalize_label(concept)).or_insert(value);
    }

    /// Figure for a concept.
    pub fn get(&self, concept: &str) -> Option<f64> {
        self.values.get(&normalize_label(concept)).copied()
    }

    /// Number of recorded figures.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true when nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<'a> FromIterator<(&'a str, f64)> for RuleValues {
    fn from_iter<T: IntoIterator<Item = (&'a str, f64)>>(iter: T) -> Self {
        let mut values = Self::new();
        for (concept, value) in iter {
            values.insert(concept, value);
        }
        values
    }
}

/// Which figures a rule was checked on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RuleBasis {
    /// XBRL facts
    Xbrl,
    /// Normalized table figures
    Pdf,
}

impl fmt::Display for RuleBasis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Xbrl => write!(f, "XBRL"),
            Self::Pdf => write!(f, "PDF"),
        }
    }
}

/// Result of a rule check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RuleStatus {
    /// Identity holds within tolerance
    Passed,
    /// Identity violated beyond tolerance
    Failed,
    /// Inputs missing
    Skipped,
}

impl fmt::Display for RuleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Passed => write!(f, "PASS"),
            Self::Failed => write!(f, "FAIL"),
            Self::Skipped => write!(f, "SKIPPED"),
        }
    }
}

/// Discrepancy measured by a rule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RuleCheck {
    /// Signed discrepancy, in the units of the inputs
    pub discrepancy: f64,
    /// Largest discrepancy that still passes
    pub allowed: f64,
}

impl RuleCheck {
    /// Returns true when the discrepancy is within the allowance.
    pub fn passes(&self) -> bool {
        self.discrepancy.abs() <= self.allowed
    }
}

/// Outcome of one rule on one basis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleOutcome {
    /// Rule name
    pub rule: String,
    /// Identity checked, in words
    pub description: String,
    /// Figures the rule ran on
    pub basis: RuleBasis,
    /// Pass, fail or skip
    pub status: RuleStatus,
    /// Signed discrepancy (absent when skipped)
    pub discrepancy: Option<f64>,
    /// Allowed discrepancy (absent when skipped)
    pub allowed: Option<f64>,
    /// Concepts that were missing (skipped rules only)
    pub missing: Vec<String>,
}

/// An identity between statement figures.
pub trait AccountingRule: Send + Sync + fmt::Debug {
    /// Short rule name
    fn name(&self) -> &str;

    /// The identity in words
    fn description(&self) -> &str;

    /// Display names of the concepts the rule reads
    fn required_concepts(&self) -> &[&str];

    /// Measures the discrepancy. Only called when every required concept is
    /// present; `tolerance` is relative to the rule's reference total.
    fn check(&self, values: &RuleValues, tolerance: f64) -> RuleCheck;

    /// Evaluates the rule, skipping it when inputs are missing.
    fn evaluate(&self, values: &RuleValues, basis: RuleBasis, tolerance: f64) -> RuleOutcome {
        let missing: Vec<String> = self
            .required_concepts()
            .iter()
            .filter(|c| values.get(c).is_none())
            .map(|c| c.to_string())
            .collect();

        if !missing.is_empty() {
            return RuleOutcome {
                rule: self.name().to_string(),
                description: self.description().to_string(),
                basis,
                status: RuleStatus::Skipped,
                discrepancy: None,
                allowed: None,
                missing,
            };
        }

        let check = self.check(values, tolerance);
        let status = if check.passes() {
            RuleStatus::Passed
        } else {
            tracing::warn!(
                rule = self.name(),
                %basis,
                discrepancy = check.discrepancy,
                allowed = check.allowed,
                "accounting rule failed"
            );
            RuleStatus::Failed
        };

        RuleOutcome {
            rule: self.name().to_string(),
            description: self.description().to_string(),
            basis,
            status,
            discrepancy: Some(check.discrepancy),
            allowed: Some(check.allowed),
            missing,
        }
    }
}

fn value(values: &RuleValues, concept: &str) -> f64 {
    values.get(concept).unwrap_or_default()
}

/// Assets = Liabilities + Equity, within a share of total assets.
#[derive(Debug, Clone, Copy, Default)]
pub struct BalanceSheetEquation;

impl AccountingRule for BalanceSheetEquation {
    fn name(&self) -> &str {
        "Balance Sheet Equation"
    }

    fn description(&self) -> &str {
        "Total Assets = Total Liabilities + Total Stockholders Equity"
    }

    fn required_concepts(&self) -> &[&str] {
        &[names::TOTAL_ASSETS, names::TOTAL_LIABILITIES, names::TOTAL_EQUITY]
    }

    fn check(&self, values: &RuleValues, tolerance: f64) -> RuleCheck {
        let assets = value(values, names::TOTAL_ASSETS);
        let liabilities = value(values, names::TOTAL_LIABILITIES);
        let equity = value(values, names::TOTAL_EQUITY);
        RuleCheck {
            discrepancy: assets - (liabilities + equity),
            allowed: tolerance * assets.abs(),
        }
    }
}

/// Revenue - Cost of Revenue = Gross Profit, within a share of revenue.
#[derive(Debug, Clone, Copy, Default)]
pub struct GrossProfitIdentity;

impl AccountingRule for GrossProfitIdentity {
    fn name(&self) -> &str {
        "Gross Profit Identity"
    }

    fn description(&self) -> &str {
        "Total Revenue - Cost of Revenue = Gross Profit"
    }

    fn required_concepts(&self) -> &[&str] {
        &[names::TOTAL_REVENUE, names::COST_OF_REVENUE, names::GROSS_PROFIT]
    }

    fn check(&self, values: &RuleValues, tolerance: f64) -> RuleCheck {
        let revenue = value(values, names::TOTAL_REVENUE);
        let cost = value(values, names::COST_OF_REVENUE);
        let gross = value(values, names::GROSS_PROFIT);
        RuleCheck {
            discrepancy: (revenue - cost) - gross,
            allowed: tolerance * revenue.abs(),
        }
    }
}

/// A part may not exceed its total. The discrepancy is the excess, zero when
/// the part fits.
#[derive(Debug, Clone, Copy)]
pub struct PartWithinTotal {
    name: &'static str,
    description: &'static str,
    concepts: [&'static str; 2],
}

impl PartWithinTotal {
    /// Current Assets <= Total Assets
    pub const fn current_assets() -> Self {
        Self {
            name: "Current Assets Within Total",
            description: "Current Assets <= Total Assets",
            concepts: [names::CURRENT_ASSETS, names::TOTAL_ASSETS],
        }
    }

    /// Current Liabilities <= Total Liabilities
    pub const fn current_liabilities() -> Self {
        Self {
            name: "Current Liabilities Within Total",
            description: "Current Liabilities <= Total Liabilities",
            concepts: [names::CURRENT_LIABILITIES, names::TOTAL_LIABILITIES],
        }
    }
}

impl AccountingRule for PartWithinTotal {
    fn name(&self) -> &str {
        self.name
    }

    fn description(&self) -> &str {
        self.description
    }

    fn required_concepts(&self) -> &[&str] {
        &self.concepts
    }

    fn check(&self, values: &RuleValues, tolerance: f64) -> RuleCheck {
        let part = value(values, self.concepts[0]);
        let total = value(values, self.concepts[1]);
        RuleCheck {
            discrepancy: (part.abs() - total.abs()).max(0.0),
            allowed: tolerance * total.abs(),
        }
    }
}

/// The built-in rule set.
pub fn default_rules() -> Vec<Box<dyn AccountingRule>> {
    vec![
        Box::new(BalanceSheetEquation),
        Box::new(GrossProfitIdentity),
        Box::new(PartWithinTotal::current_assets()),
        Box::new(PartWithinTotal::current_liabilities()),
    ]
}

/// Evaluates every rule on one basis.
pub fn evaluate_rules(
    rules: &[Box<dyn AccountingRule>],
    values: &RuleValues,
    basis: RuleBasis,
    tolerance: f64,
) -> Vec<RuleOutcome> {
    rules
        .iter()
        .map(|rule| rule.evaluate(values, basis, tolerance))
        .collect()
}
