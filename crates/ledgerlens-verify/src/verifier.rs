//! Cross-Verifier
//!
//! Turns accepted concept mappings into quantitative comparisons:
//!
//! accuracy = 100 * (1 - |x - p| / max(|x|, ε)), clamped to [0, 100]
//!
//! where x is the XBRL value and p the table figure in raw units. Concepts
//! that cannot be compared are reported as diagnostics, one per concept.

use crate::investigate::{Investigation, investigate};
use crate::normalize::ScaleResolver;
use crate::rules::{AccountingRule, RuleBasis, RuleOutcome, RuleValues, default_rules, evaluate_rules};
use chrono::NaiveDate;
use ledgerlens_data::{ExtractedValue, ExtractedValueStore, Period, Scale, XbrlDocument};
use ledgerlens_mapping::{ConceptMapping, MappingSet};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Verifier errors
#[derive(Debug, Error)]
pub enum VerifyError {
    /// Tolerances or thresholds out of range
    #[error("Invalid verifier configuration: {0}")]
    InvalidConfig(String),
}

/// Verifier configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifierConfig {
    /// Relative difference counted as an exact match (default: 0.005)
    pub exact_tolerance: f64,
    /// Relative difference counted as a close match (default: 0.05)
    pub close_tolerance: f64,
    /// Floor for the accuracy denominator (default: 1e-9)
    pub epsilon: f64,
    /// Declared scales further than this factor from XBRL are re-inferred (default: 100)
    pub implausible_ratio: f64,
    /// Relative tolerance of accounting rules (default: 0.01)
    pub rule_tolerance: f64,
    /// Only compare against facts for the period ending on this date
    pub target_period_end: Option<NaiveDate>,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            exact_tolerance: 0.005,
            close_tolerance: 0.05,
            epsilon: 1e-9,
            implausible_ratio: 100.0,
            rule_tolerance: 0.01,
            target_period_end: None,
        }
    }
}

impl VerifierConfig {
    /// Checks tolerances.
    pub fn validate(&self) -> Result<(), VerifyError> {
        if self.epsilon.is_nan() || self.epsilon <= 0.0 {
            return Err(VerifyError::InvalidConfig("epsilon must be positive".to_string()));
        }
        if self.exact_tolerance < 0.0 || self.close_tolerance < self.exact_tolerance {
            return Err(VerifyError::InvalidConfig(format!(
                "need 0 <= exact tolerance ({}) <= close tolerance ({})",
                self.exact_tolerance, self.close_tolerance
            )));
        }
        if self.implausible_ratio.is_nan() || self.implausible_ratio <= 1.0 {
            return Err(VerifyError::InvalidConfig(
                "implausible ratio must exceed 1".to_string(),
            ));
        }
        if self.rule_tolerance < 0.0 {
            return Err(VerifyError::InvalidConfig(
                "rule tolerance must be non-negative".to_string(),
            ));
        }
        Ok(())
    }
}

/// Agreement between a table figure and its XBRL fact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchStatus {
    /// Within the exact tolerance
    ExactMatch,
    /// Within the close tolerance
    CloseMatch,
    /// Beyond the close tolerance
    Mismatch,
}

impl MatchStatus {
    /// All statuses, best first.
    pub const fn all() -> [Self; 3] {
        [Self::ExactMatch, Self::CloseMatch, Self::Mismatch]
    }
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExactMatch => write!(f, "EXACT"),
            Self::CloseMatch => write!(f, "CLOSE"),
            Self::Mismatch => write!(f, "MISMATCH"),
        }
    }
}

/// Comparison of one mapped concept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationResult {
    /// Concept as mapped
    pub concept: String,
    /// Concept display name
    pub display_name: String,
    /// Table label the figure came from
    pub label: String,
    /// Source table
    pub source: String,
    /// XBRL value, raw units
    pub xbrl_value: f64,
    /// Table figure, raw units
    pub pdf_value: f64,
    /// Table figure as printed
    pub reported_value: f64,
    /// Scale applied to the printed figure
    pub scale: Scale,
    /// True when the scale was inferred
    pub scale_inferred: bool,
    /// XBRL unit
    pub unit: String,
    /// XBRL period
    pub period: Option<Period>,
    /// pdf_value - xbrl_value
    pub difference: f64,
    /// |difference| / max(|xbrl_value|, ε)
    pub relative_difference: f64,
    /// Accuracy percentage in [0, 100]
    pub accuracy_pct: f64,
    /// Classification
    pub status: MatchStatus,
}

/// Why a concept was not compared.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Diagnostic {
    /// The mapper found no adequate label
    Unmapped {
        /// Concept
        concept: String,
        /// Best score seen
        best_score: f64,
        /// Best label seen
        best_label: Option<String>,
    },
    /// The matched label has no value in the store
    MissingValue {
        /// Concept
        concept: String,
        /// Matched label
        label: String,
    },
    /// No XBRL fact with a resolved period and context
    NoContext {
        /// Concept
        concept: String,
    },
    /// The table figure's scale could not be established
    UnitUnknown {
        /// Concept
        concept: String,
        /// Matched label
        label: String,
        /// Figure as printed
        reported_value: f64,
        /// Declared scale, if any
        declared: Option<Scale>,
        /// XBRL value
        xbrl_value: f64,
    },
}

impl Diagnostic {
    /// Concept the diagnostic is about.
    pub fn concept(&self) -> &str {
        match self {
            Self::Unmapped { concept, .. }
            | Self::MissingValue { concept, .. }
            | Self::NoContext { concept }
            | Self::UnitUnknown { concept, .. } => concept,
        }
    }

    /// Short kind name.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Unmapped { .. } => "Unmapped",
            Self::MissingValue { .. } => "MissingValue",
            Self::NoContext { .. } => "NoContext",
            Self::UnitUnknown { .. } => "UnitUnknown",
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unmapped {
                concept,
                best_score,
                best_label,
            } => match best_label {
                Some(label) => write!(
                    f,
                    "{concept}: unmapped (best score {best_score:.3} for '{label}')"
                ),
                None => write!(f, "{concept}: unmapped (no labels)"),
            },
            Self::MissingValue { concept, label } => {
                write!(f, "{concept}: no value for label '{label}'")
            }
            Self::NoContext { concept } => write!(f, "{concept}: no XBRL fact with period and context"),
            Self::UnitUnknown {
                concept,
                label,
                reported_value,
                declared,
                xbrl_value,
            } => write!(
                f,
                "{concept}: scale of '{label}' = {reported_value} (declared: {}) cannot be reconciled with XBRL {xbrl_value}",
                declared.map_or_else(|| "none".to_string(), |s| s.to_string())
            ),
        }
    }
}

/// Everything the verifier produced for one filing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VerificationOutcome {
    /// One result per verified concept
    pub results: Vec<VerificationResult>,
    /// One diagnostic per concept that was not verified
    pub diagnostics: Vec<Diagnostic>,
    /// Accounting rule outcomes, XBRL basis first
    pub rules: Vec<RuleOutcome>,
    /// Findings for mismatches and unresolved scales
    pub investigations: Vec<Investigation>,
}

impl VerificationOutcome {
    /// Result for a concept.
    pub fn result(&self, concept: &str) -> Option<&VerificationResult> {
        self.results.iter().find(|r| r.concept == concept)
    }

    /// Diagnostic for a concept.
    pub fn diagnostic(&self, concept: &str) -> Option<&Diagnostic> {
        self.diagnostics.iter().find(|d| d.concept() == concept)
    }

    /// Number of results with a status.
    pub fn count(&self, status: MatchStatus) -> usize {
        self.results.iter().filter(|r| r.status == status).count()
    }

    /// Number of diagnostics of a kind (see [`Diagnostic::kind`]).
    pub fn count_diagnostics(&self, kind: &str) -> usize {
        self.diagnostics.iter().filter(|d| d.kind() == kind).count()
    }

    /// Mean accuracy over verified concepts.
    pub fn mean_accuracy(&self) -> Option<f64> {
        if self.results.is_empty() {
            return None;
        }
        Some(self.results.iter().map(|r| r.accuracy_pct).sum::<f64>() / self.results.len() as f64)
    }

    /// Rule outcomes on one basis.
    pub fn rules_on(&self, basis: RuleBasis) -> impl Iterator<Item = &RuleOutcome> {
        self.rules.iter().filter(move |r| r.basis == basis)
    }
}

/// Compares mapped table figures with XBRL facts.
#[derive(Debug)]
pub struct CrossVerifier {
    config: VerifierConfig,
    resolver: ScaleResolver,
    rules: Vec<Box<dyn AccountingRule>>,
}

impl Default for CrossVerifier {
    fn default() -> Self {
        Self::build(VerifierConfig::default())
    }
}

impl CrossVerifier {
    /// Creates a verifier with the built-in rules.
    pub fn new(config: VerifierConfig) -> Result<Self, VerifyError> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: VerifierConfig) -> Self {
        Self {
            config,
            resolver: ScaleResolver::new(
                config.close_tolerance,
                config.implausible_ratio,
                config.epsilon,
            ),
            rules: default_rules(),
        }
    }

    /// Replaces the rule set.
    #[must_use]
    pub fn with_rules(mut self, rules: Vec<Box<dyn AccountingRule>>) -> Self {
        self.rules = rules;
        self
    }

    /// Verifier configuration.
    pub const fn config(&self) -> &VerifierConfig {
        &self.config
    }

    /// Scale resolver in use.
    pub const fn resolver(&self) -> &ScaleResolver {
        &self.resolver
    }

    /// Status for a relative difference.
    pub fn classify(&self, relative_difference: f64) -> MatchStatus {
        if relative_difference <= self.config.exact_tolerance {
            MatchStatus::ExactMatch
        } else if relative_difference <= self.config.close_tolerance {
            MatchStatus::CloseMatch
        } else {
            MatchStatus::Mismatch
        }
    }

    /// Accuracy percentage, clamped to [0, 100].
    pub fn accuracy_pct(&self, xbrl_value: f64, pdf_value: f64) -> f64 {
        let relative = self.resolver.relative_difference(pdf_value, xbrl_value);
        (100.0 * (1.0 - relative)).clamp(0.0, 100.0)
    }

    /// Verifies every mapping of a filing.
    pub fn verify(
        &self,
        mappings: &MappingSet,
        values: &ExtractedValueStore,
        facts: &XbrlDocument,
    ) -> VerificationOutcome {
        let mut outcome = VerificationOutcome::default();
        let mut xbrl_values = RuleValues::new();
        let mut pdf_values = RuleValues::new();

        for mapping in &mappings.mappings {
            let fact = facts.primary_fact(&mapping.concept, self.config.target_period_end);
            if let Some(fact) = fact {
                xbrl_values.insert(&mapping.display_name, fact.value);
            }

            let (verified, investigation) = self.verify_one(mapping, values, facts);
            outcome.investigations.extend(investigation);
            match verified {
                Ok(result) => {
                    pdf_values.insert(&result.display_name, result.pdf_value);
                    outcome.results.push(result);
                }
                Err(diagnostic) => {
                    tracing::debug!(%diagnostic, "concept not verified");
                    outcome.diagnostics.push(diagnostic);
                }
            }
        }

        let tolerance = self.config.rule_tolerance;
        outcome
            .rules
            .extend(evaluate_rules(&self.rules, &xbrl_values, RuleBasis::Xbrl, tolerance));
        outcome
            .rules
            .extend(evaluate_rules(&self.rules, &pdf_values, RuleBasis::Pdf, tolerance));

        tracing::info!(
            verified = outcome.results.len(),
            excluded = outcome.diagnostics.len(),
            exact = outcome.count(MatchStatus::ExactMatch),
            close = outcome.count(MatchStatus::CloseMatch),
            mismatch = outcome.count(MatchStatus::Mismatch),
            "cross-verification complete"
        );
        outcome
    }

    fn verify_one(
        &self,
        mapping: &ConceptMapping,
        values: &ExtractedValueStore,
        facts: &XbrlDocument,
    ) -> (Result<VerificationResult, Diagnostic>, Option<Investigation>) {
        let concept = mapping.concept.clone();

        let Some(label) = mapping.matched_label.as_deref().filter(|_| mapping.is_matched()) else {
            let diagnostic = Diagnostic::Unmapped {
                concept,
                best_score: mapping.score,
                best_label: mapping.best_candidate().map(|c| c.label.clone()),
            };
            return (Err(diagnostic), None);
        };

        let Some(value) = find_value(values, label, mapping.source.as_deref()) else {
            let diagnostic = Diagnostic::MissingValue {
                concept,
                label: label.to_string(),
            };
            return (Err(diagnostic), None);
        };

        let Some(fact) = facts.primary_fact(&mapping.concept, self.config.target_period_end) else {
            tracing::warn!(concept = %mapping.concept, "no XBRL fact with period and context");
            return (Err(Diagnostic::NoContext { concept }), None);
        };

        let Some(resolution) = self.resolver.resolve(value, fact) else {
            tracing::warn!(
                concept = %mapping.concept,
                label,
                reported = value.value,
                xbrl = fact.value,
                "scale unknown, value not compared"
            );
            let assumed = value.unit.unwrap_or(Scale::Raw).to_raw(value.value);
            let investigation =
                investigate(&mapping.concept, fact.value, assumed, &investigation_context(value));
            let diagnostic = Diagnostic::UnitUnknown {
                concept,
                label: label.to_string(),
                reported_value: value.value,
                declared: value.unit,
                xbrl_value: fact.value,
            };
            return (Err(diagnostic), Some(investigation));
        };

        let relative_difference = self
            .resolver
            .relative_difference(resolution.normalized, fact.value);
        let status = self.classify(relative_difference);

        let investigation = (status == MatchStatus::Mismatch).then(|| {
            investigate(
                &mapping.concept,
                fact.value,
                resolution.normalized,
                &investigation_context(value),
            )
        });

        let result = VerificationResult {
            concept,
            display_name: mapping.display_name.clone(),
            label: label.to_string(),
            source: value.source.clone(),
            xbrl_value: fact.value,
            pdf_value: resolution.normalized,
            reported_value: value.value,
            scale: resolution.scale,
            scale_inferred: resolution.inferred,
            unit: fact.unit.clone(),
            period: fact.period,
            difference: resolution.normalized - fact.value,
            relative_difference,
            accuracy_pct: self.accuracy_pct(fact.value, resolution.normalized),
            status,
        };
        (Ok(result), investigation)
    }
}

fn find_value<'s>(
    values: &'s ExtractedValueStore,
    label: &str,
    source: Option<&str>,
) -> Option<&'s ExtractedValue> {
    source
        .and_then(|source| values.find_in(label, source))
        .or_else(|| values.find(label))
}

fn investigation_context(value: &ExtractedValue) -> String {
    format!("{} {}", value.source, value.label)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::RuleStatus;
    use approx::assert_relative_eq;
    use ledgerlens_data::XbrlFact;
    use ledgerlens_mapping::{ConceptMapper, Confidence};

    fn fy_end() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 9, 28).unwrap()
    }

    fn fact(concept: &str, value: f64) -> XbrlFact {
        XbrlFact::new(concept, value, "USD")
            .with_period(Period::instant(fy_end()))
            .with_context("c-bs")
    }

    fn run(
        concepts: &[&str],
        values: Vec<ExtractedValue>,
        facts: Vec<XbrlFact>,
    ) -> (MappingSet, VerificationOutcome) {
        let store: ExtractedValueStore = values.into_iter().collect();
        let doc = XbrlDocument::from_facts(facts);
        let mappings = ConceptMapper::with_defaults().map_all(concepts.iter().copied(), &store);
        let outcome = CrossVerifier::default().verify(&mappings, &store, &doc);
        (mappings, outcome)
    }

    #[test]
    fn test_exact_match_in_millions() {
        let (_, outcome) = run(
            &["Total Assets"],
            vec![ExtractedValue::new("Total assets", 364_980.0, Some(Scale::Millions), "bs")],
            vec![fact("Total Assets", 364_980e6)],
        );

        let result = outcome.result("Total Assets").unwrap();
        assert_eq!(result.status, MatchStatus::ExactMatch);
        assert_relative_eq!(result.accuracy_pct, 100.0);
        assert_eq!(result.scale, Scale::Millions);
        assert!(!result.scale_inferred);
        assert!(outcome.diagnostics.is_empty());
    }

    #[rstest::rstest]
    #[case(364_980.0, MatchStatus::ExactMatch)]
    #[case(366_000.0, MatchStatus::ExactMatch)]
    #[case(375_000.0, MatchStatus::CloseMatch)]
    #[case(400_000.0, MatchStatus::Mismatch)]
    fn test_status_boundaries(#[case] reported: f64, #[case] expected: MatchStatus) {
        let (_, outcome) = run(
            &["Total Assets"],
            vec![ExtractedValue::new("Total assets", reported, Some(Scale::Millions), "bs")],
            vec![fact("Total Assets", 364_980e6)],
        );
        assert_eq!(outcome.result("Total Assets").unwrap().status, expected);
    }

    #[test]
    fn test_mis_scaled_value_never_exceeds_100() {
        // 45,680M in XBRL, 0.4 read as raw from the table.
        let (_, outcome) = run(
            &["Total Assets"],
            vec![ExtractedValue::new("Total assets", 0.4, Some(Scale::Raw), "bs")],
            vec![fact("Total Assets", 45_680e6)],
        );

        assert!(outcome.results.iter().all(|r| r.accuracy_pct <= 100.0));
        assert!(outcome.result("Total Assets").is_none());
        assert_eq!(
            outcome.diagnostic("Total Assets").unwrap().kind(),
            "UnitUnknown"
        );
        assert_eq!(outcome.investigations.len(), 1);
    }

    #[test]
    fn test_undeclared_scale_is_inferred() {
        let (_, outcome) = run(
            &["Total Assets"],
            vec![ExtractedValue::new("Total assets", 45_680.0, None, "bs")],
            vec![fact("Total Assets", 45_680e6)],
        );
        let result = outcome.result("Total Assets").unwrap();
        assert_eq!(result.scale, Scale::Millions);
        assert!(result.scale_inferred);
        assert_eq!(result.status, MatchStatus::ExactMatch);
    }

    #[test]
    fn test_failed_mapping_reported_as_unmapped() {
        let (mappings, outcome) = run(
            &["Gross Profit"],
            vec![
                ExtractedValue::new("Total net sales", 391_035.0, Some(Scale::Millions), "is"),
                ExtractedValue::new("Research and development", 31_370.0, Some(Scale::Millions), "is"),
                ExtractedValue::new("Net income", 93_736.0, Some(Scale::Millions), "is"),
                ExtractedValue::new("Total operating expenses", 57_467.0, Some(Scale::Millions), "is"),
            ],
            vec![fact("Gross Profit", 180_683e6)],
        );

        assert_eq!(mappings.get("Gross Profit").unwrap().confidence, Confidence::Failed);
        assert!(outcome.results.is_empty());
        match outcome.diagnostic("Gross Profit").unwrap() {
            Diagnostic::Unmapped { best_score, .. } => assert!(*best_score < 0.30),
            other => panic!("unexpected diagnostic {other:?}"),
        }
    }

    #[test]
    fn test_missing_context_reported() {
        let (_, outcome) = run(
            &["Net Income"],
            vec![ExtractedValue::new("Net income", 93_736.0, Some(Scale::Millions), "is")],
            vec![XbrlFact::new("Net Income", 93_736e6, "USD")],
        );
        assert!(outcome.results.is_empty());
        assert_eq!(outcome.diagnostic("Net Income").unwrap().kind(), "NoContext");
    }

    #[test]
    fn test_target_period_filters_facts() {
        let store: ExtractedValueStore =
            vec![ExtractedValue::new("Total assets", 352_583.0, Some(Scale::Millions), "bs")]
                .into_iter()
                .collect();
        let prior = NaiveDate::from_ymd_opt(2023, 9, 30).unwrap();
        let doc = XbrlDocument::from_facts(vec![
            fact("Total Assets", 364_980e6),
            XbrlFact::new("Total Assets", 352_583e6, "USD")
                .with_period(Period::instant(prior))
                .with_context("c-py"),
        ]);
        let mappings = ConceptMapper::with_defaults().map_all(["Total Assets"], &store);

        // Latest year is 3.4% away from the printed prior-year figure.
        let latest = CrossVerifier::default().verify(&mappings, &store, &doc);
        assert_eq!(
            latest.result("Total Assets").unwrap().status,
            MatchStatus::CloseMatch
        );

        let verifier = CrossVerifier::new(VerifierConfig {
            target_period_end: Some(prior),
            ..VerifierConfig::default()
        })
        .unwrap();
        let prior_year = verifier.verify(&mappings, &store, &doc);
        assert_eq!(
            prior_year.result("Total Assets").unwrap().status,
            MatchStatus::ExactMatch
        );
    }

    #[test]
    fn test_mismatch_is_investigated() {
        let (_, outcome) = run(
            &["Total Assets"],
            vec![ExtractedValue::new("Total assets", -364_980.0, Some(Scale::Millions), "bs")],
            vec![fact("Total Assets", 364_980e6)],
        );
        let result = outcome.result("Total Assets").unwrap();
        assert_eq!(result.status, MatchStatus::Mismatch);
        assert_relative_eq!(result.accuracy_pct, 0.0);
        assert_eq!(
            outcome.investigations[0].causes,
            vec![crate::investigate::MismatchCause::SignFlip]
        );
    }

    #[test]
    fn test_rules_run_on_both_bases() {
        let (_, outcome) = run(
            &["Total Assets", "Total Liabilities", "Total Stockholders Equity"],
            vec![
                ExtractedValue::new("Total assets", 400.0, Some(Scale::Millions), "bs"),
                ExtractedValue::new("Total liabilities", 250.0, Some(Scale::Millions), "bs"),
                ExtractedValue::new("Total shareholders’ equity", 150.0, Some(Scale::Millions), "bs"),
            ],
            vec![
                fact("Total Assets", 400e6),
                fact("Total Liabilities", 250e6),
                fact("Total Stockholders Equity", 100e6),
            ],
        );

        let xbrl: Vec<_> = outcome.rules_on(RuleBasis::Xbrl).collect();
        let pdf: Vec<_> = outcome.rules_on(RuleBasis::Pdf).collect();
        assert_eq!(xbrl.len(), 4);
        assert_eq!(pdf.len(), 4);

        assert_eq!(xbrl[0].status, RuleStatus::Failed);
        assert_relative_eq!(xbrl[0].discrepancy.unwrap(), 50e6);

        // The printed statements balance even though equity disagrees with XBRL.
        assert_eq!(outcome.count(MatchStatus::Mismatch), 1);
        assert_eq!(pdf[0].status, RuleStatus::Passed);
        assert_relative_eq!(pdf[0].discrepancy.unwrap(), 0.0);
    }

    #[test]
    fn test_config_validate() {
        assert!(VerifierConfig::default().validate().is_ok());
        let inverted = VerifierConfig {
            exact_tolerance: 0.1,
            close_tolerance: 0.05,
            ..VerifierConfig::default()
        };
        assert!(CrossVerifier::new(inverted).is_err());
        let zero_eps = VerifierConfig {
            epsilon: 0.0,
            ..VerifierConfig::default()
        };
        assert!(zero_eps.validate().is_err());
    }

    #[test]
    fn test_accuracy_clamped() {
        let verifier = CrossVerifier::default();
        assert_relative_eq!(verifier.accuracy_pct(100.0, 100.0), 100.0);
        assert_relative_eq!(verifier.accuracy_pct(100.0, 90.0), 90.0);
        assert_relative_eq!(verifier.accuracy_pct(100.0, 2_600.0), 0.0);
        assert_relative_eq!(verifier.accuracy_pct(0.0, 0.0), 100.0);
    }
}
