//! Run summary: counts and percentages over one filing's mapping and
//! verification results.

use ledgerlens_mapping::{Confidence, MappingSet};
use ledgerlens_verify::{MatchStatus, RuleStatus, VerificationOutcome};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Aggregate statistics for one filing run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Filing name
    pub name: String,

    /// Version of the synonym table used for mapping
    pub table_version: String,

    /// Concepts submitted to the mapper.
    pub total_concepts: usize,

    /// Concepts with an accepted label.
    pub mapped: usize,

    /// `mapped` as a percentage of `total_concepts`.
    pub mapped_pct: f64,

    /// Mappings in the High tier.
    pub high: usize,

    /// Mappings in the Medium tier.
    pub medium: usize,

    /// Mappings in the Low tier.
    pub low: usize,

    /// Mappings in the Failed tier.
    pub failed: usize,

    /// Accepted mappings carrying a review flag.
    pub flagged: usize,

    /// Concepts with a verification result.
    pub verified: usize,

    /// Exact matches.
    pub exact: usize,

    /// Close matches.
    pub close: usize,

    /// Mismatches.
    pub mismatch: usize,

    /// `exact` as a percentage of `verified`.
    pub exact_pct: f64,

    /// `close` as a percentage of `verified`.
    pub close_pct: f64,

    /// `mismatch` as a percentage of `verified`.
    pub mismatch_pct: f64,

    /// Mean accuracy over verified concepts, absent when none were verified.
    pub mean_accuracy: Option<f64>,

    /// Concepts excluded because the mapper found no label.
    pub unmapped: usize,

    /// Concepts excluded because the matched label had no value.
    pub missing_value: usize,

    /// Concepts excluded for lack of an XBRL fact with period and context.
    pub no_context: usize,

    /// Concepts excluded because the table figure's scale was unresolved.
    pub unit_unknown: usize,

    /// Rule checks that passed (both bases).
    pub rules_passed: usize,

    /// Rule checks that failed (both bases).
    pub rules_failed: usize,

    /// Rule checks skipped for missing inputs (both bases).
    pub rules_skipped: usize,
}

/// Percentage of `part` in `whole`, zero for an empty whole.
fn pct(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

impl RunSummary {
    /// Builds the summary for one filing run.
    ///
    /// # Examples
    ///
    /// ```
    /// use ledgerlens_mapping::MappingSet;
    /// use ledgerlens_output::RunSummary;
    /// use ledgerlens_verify::VerificationOutcome;
    ///
    /// let summary = RunSummary::from_run("empty", &MappingSet::default(), &VerificationOutcome::default());
    /// assert_eq!(summary.total_concepts, 0);
    /// assert_eq!(summary.mapped_pct, 0.0);
    /// assert!(summary.mean_accuracy.is_none());
    /// ```
    pub fn from_run(
        name: impl Into<String>,
        mappings: &MappingSet,
        verification: &VerificationOutcome,
    ) -> Self {
        let total_concepts = mappings.len();
        let mapped = mappings.successful().count();
        let verified = verification.results.len();
        let exact = verification.count(MatchStatus::ExactMatch);
        let close = verification.count(MatchStatus::CloseMatch);
        let mismatch = verification.count(MatchStatus::Mismatch);
        let rules = |status: RuleStatus| {
            verification
                .rules
                .iter()
                .filter(|r| r.status == status)
                .count()
        };

        Self {
            name: name.into(),
            table_version: mappings.table_version.clone(),
            total_concepts,
            mapped,
            mapped_pct: pct(mapped, total_concepts),
            high: mappings.count(Confidence::High),
            medium: mappings.count(Confidence::Medium),
            low: mappings.count(Confidence::Low),
            failed: mappings.count(Confidence::Failed),
            flagged: mappings.flagged().count(),
            verified,
            exact,
            close,
            mismatch,
            exact_pct: pct(exact, verified),
            close_pct: pct(close, verified),
            mismatch_pct: pct(mismatch, verified),
            mean_accuracy: verification.mean_accuracy(),
            unmapped: verification.count_diagnostics("Unmapped"),
            missing_value: verification.count_diagnostics("MissingValue"),
            no_context: verification.count_diagnostics("NoContext"),
            unit_unknown: verification.count_diagnostics("UnitUnknown"),
            rules_passed: rules(RuleStatus::Passed),
            rules_failed: rules(RuleStatus::Failed),
            rules_skipped: rules(RuleStatus::Skipped),
        }
    }

    /// Concepts submitted but not verified.
    pub const fn excluded(&self) -> usize {
        self.unmapped + self.missing_value + self.no_context + self.unit_unknown
    }

    /// Returns true when every verified concept matched exactly or closely
    /// and no rule failed.
    pub const fn is_clean(&self) -> bool {
        self.mismatch == 0 && self.rules_failed == 0
    }

    fn accuracy_text(&self) -> String {
        self.mean_accuracy
            .map_or_else(|| "n/a".to_string(), |a| format!("{a:.2}%"))
    }

    /// Format as ASCII table for terminal display.
    pub fn to_ascii_table(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!("\nFiling Summary: {}\n", self.name));
        output.push_str(&format!("Synonym table: v{}\n", self.table_version));
        output.push_str(&"=".repeat(80));
        output.push('\n');

        output.push_str("\nConcept Mapping:\n");
        output.push_str(&"-".repeat(80));
        output.push('\n');
        output.push_str(&format!(
            "  Concepts:                 {}\n",
            self.total_concepts
        ));
        output.push_str(&format!(
            "  Mapped:                   {} ({:.1}%)\n",
            self.mapped, self.mapped_pct
        ));
        output.push_str(&format!(
            "{:<20} {:>12} {:>12} {:>12} {:>12}\n",
            "  Tier", "High", "Medium", "Low", "Failed"
        ));
        output.push_str(&format!(
            "{:<20} {:>12} {:>12} {:>12} {:>12}\n",
            "", self.high, self.medium, self.low, self.failed
        ));

        output.push_str("\nCross-Verification:\n");
        output.push_str(&"-".repeat(80));
        output.push('\n');
        output.push_str(&format!(
            "  Verified:                 {}\n",
            self.verified
        ));
        output.push_str(&format!(
            "  Exact matches:            {} ({:.1}%)\n",
            self.exact, self.exact_pct
        ));
        output.push_str(&format!(
            "  Close matches:            {} ({:.1}%)\n",
            self.close, self.close_pct
        ));
        output.push_str(&format!(
            "  Mismatches:               {} ({:.1}%)\n",
            self.mismatch, self.mismatch_pct
        ));
        output.push_str(&format!(
            "  Mean accuracy:            {}\n",
            self.accuracy_text()
        ));

        if self.excluded() > 0 {
            output.push_str("\nExcluded:\n");
            output.push_str(&"-".repeat(80));
            output.push('\n');
            output.push_str(&format!(
                "{:<20} {:>12} {:>12} {:>12} {:>12}\n",
                "", "Unmapped", "No value", "No context", "Unit unknown"
            ));
            output.push_str(&format!(
                "{:<20} {:>12} {:>12} {:>12} {:>12}\n",
                "", self.unmapped, self.missing_value, self.no_context, self.unit_unknown
            ));
        }

        output.push_str("\nAccounting Rules:\n");
        output.push_str(&"-".repeat(80));
        output.push('\n');
        output.push_str(&format!(
            "  Passed: {}   Failed: {}   Skipped: {}\n",
            self.rules_passed, self.rules_failed, self.rules_skipped
        ));

        output.push_str(&"=".repeat(80));
        output.push('\n');

        output
    }

    /// Format as a Markdown summary section.
    pub fn to_markdown(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!("# Filing Summary: {}\n\n", self.name));

        output.push_str("## Concept Mapping\n\n");
        output.push_str(&format!("- **Concepts:** {}\n", self.total_concepts));
        output.push_str(&format!(
            "- **Mapped:** {} ({:.1}%)\n",
            self.mapped, self.mapped_pct
        ));
        output.push_str(&format!(
            "- **Tiers:** High {}, Medium {}, Low {}, Failed {}\n",
            self.high, self.medium, self.low, self.failed
        ));
        if self.flagged > 0 {
            output.push_str(&format!("- **Flagged for review:** {}\n", self.flagged));
        }
        output.push('\n');

        output.push_str("## Cross-Verification\n\n");
        output.push_str("| Status | Count | % of Verified |\n");
        output.push_str("|--------|-------|---------------|\n");
        output.push_str(&format!(
            "| Exact match | {} | {:.1}% |\n",
            self.exact, self.exact_pct
        ));
        output.push_str(&format!(
            "| Close match | {} | {:.1}% |\n",
            self.close, self.close_pct
        ));
        output.push_str(&format!(
            "| Mismatch | {} | {:.1}% |\n",
            self.mismatch, self.mismatch_pct
        ));
        output.push('\n');
        output.push_str(&format!("- **Verified:** {}\n", self.verified));
        output.push_str(&format!("- **Mean accuracy:** {}\n", self.accuracy_text()));
        output.push_str(&format!(
            "- **Excluded:** {} (unmapped {}, no value {}, no context {}, unit unknown {})\n",
            self.excluded(),
            self.unmapped,
            self.missing_value,
            self.no_context,
            self.unit_unknown
        ));
        output.push_str(&format!(
            "- **Accounting rules:** {} passed, {} failed, {} skipped\n",
            self.rules_passed, self.rules_failed, self.rules_skipped
        ));

        output
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Filing Summary: {}", self.name)?;
        writeln!(
            f,
            "  Mapped: {}/{} ({:.1}%)",
            self.mapped, self.total_concepts, self.mapped_pct
        )?;
        writeln!(
            f,
            "  Verified: {} (exact {}, close {}, mismatch {})",
            self.verified, self.exact, self.close, self.mismatch
        )?;
        writeln!(f, "  Mean accuracy: {}", self.accuracy_text())?;
        writeln!(
            f,
            "  Rules: {} passed, {} failed, {} skipped",
            self.rules_passed, self.rules_failed, self.rules_skipped
        )?;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ledgerlens_data::Scale;
    use ledgerlens_mapping::{Candidate, ConceptMapping, MappingFlag};
    use ledgerlens_verify::{Diagnostic, RuleBasis, RuleOutcome, VerificationResult};

    pub(crate) fn mapping(
        concept: &str,
        label: Option<&str>,
        score: f64,
        confidence: Confidence,
    ) -> ConceptMapping {
        ConceptMapping {
            concept: concept.to_string(),
            display_name: concept.to_string(),
            matched_label: label.map(str::to_string),
            source: label.map(|_| "balance_sheet".to_string()),
            score,
            direct: score,
            semantic: score,
            confidence,
            flags: if confidence == Confidence::Low {
                vec![MappingFlag::PossibleSubtotal]
            } else {
                vec![]
            },
            candidates: vec![Candidate {
                label: label.unwrap_or("Net income").to_string(),
                score,
                direct: score,
                semantic: score,
            }],
        }
    }

    pub(crate) fn result(
        concept: &str,
        xbrl: f64,
        pdf: f64,
        status: MatchStatus,
    ) -> VerificationResult {
        let relative = (pdf - xbrl).abs() / xbrl.abs();
        VerificationResult {
            concept: concept.to_string(),
            display_name: concept.to_string(),
            label: concept.to_lowercase(),
            source: "balance_sheet".to_string(),
            xbrl_value: xbrl,
            pdf_value: pdf,
            reported_value: pdf / 1e6,
            scale: Scale::Millions,
            scale_inferred: false,
            unit: "USD".to_string(),
            period: None,
            difference: pdf - xbrl,
            relative_difference: relative,
            accuracy_pct: 100.0 * (1.0 - relative),
            status,
        }
    }

    pub(crate) fn sample_run() -> (MappingSet, VerificationOutcome) {
        let mappings = MappingSet {
            mappings: vec![
                mapping("Total Assets", Some("Total assets"), 1.0, Confidence::High),
                mapping("Total Revenue", Some("Total net sales"), 0.83, Confidence::Medium),
                mapping(
                    "Total Liabilities",
                    Some("Total current liabilities"),
                    0.72,
                    Confidence::Low,
                ),
                mapping("Gross Profit", None, 0.21, Confidence::Failed),
            ],
            table_version: "2024.2".to_string(),
        };
        let verification = VerificationOutcome {
            results: vec![
                result("Total Assets", 364_980e6, 364_980e6, MatchStatus::ExactMatch),
                result("Total Revenue", 391_035e6, 400_000e6, MatchStatus::CloseMatch),
            ],
            diagnostics: vec![
                Diagnostic::UnitUnknown {
                    concept: "Total Liabilities".to_string(),
                    label: "Total current liabilities".to_string(),
                    reported_value: 0.4,
                    declared: Some(Scale::Raw),
                    xbrl_value: 308_030e6,
                },
                Diagnostic::Unmapped {
                    concept: "Gross Profit".to_string(),
                    best_score: 0.21,
                    best_label: Some("Net income".to_string()),
                },
            ],
            rules: vec![RuleOutcome {
                rule: "Balance Sheet Equation".to_string(),
                description: "Total Assets = Total Liabilities + Total Stockholders Equity"
                    .to_string(),
                basis: RuleBasis::Xbrl,
                status: RuleStatus::Passed,
                discrepancy: Some(0.0),
                allowed: Some(3_649.8e6),
                missing: vec![],
            }],
            investigations: vec![],
        };
        (mappings, verification)
    }

    #[test]
    fn test_summary_counts() {
        let (mappings, verification) = sample_run();
        let summary = RunSummary::from_run("AAPL 10-K 2024", &mappings, &verification);

        assert_eq!(summary.total_concepts, 4);
        assert_eq!(summary.mapped, 3);
        assert_relative_eq!(summary.mapped_pct, 75.0);
        assert_eq!(
            (summary.high, summary.medium, summary.low, summary.failed),
            (1, 1, 1, 1)
        );
        assert_eq!(summary.flagged, 1);
        assert_eq!(summary.verified, 2);
        assert_eq!((summary.exact, summary.close, summary.mismatch), (1, 1, 0));
        assert_relative_eq!(summary.exact_pct, 50.0);
        assert_eq!(summary.unit_unknown, 1);
        assert_eq!(summary.unmapped, 1);
        assert_eq!(summary.excluded(), 2);
        assert_eq!(summary.rules_passed, 1);
        assert!(summary.is_clean());
        assert_eq!(summary.table_version, "2024.2");
    }

    #[test]
    fn test_every_concept_accounted_for() {
        let (mappings, verification) = sample_run();
        let summary = RunSummary::from_run("AAPL", &mappings, &verification);
        assert_eq!(summary.verified + summary.excluded(), summary.total_concepts);
    }

    #[test]
    fn test_mean_accuracy_bounded() {
        let (mappings, verification) = sample_run();
        let summary = RunSummary::from_run("AAPL", &mappings, &verification);
        let accuracy = summary.mean_accuracy.unwrap();
        assert!(accuracy > 98.0 && accuracy <= 100.0);
    }

    #[test]
    fn test_summary_ascii_table() {
        let (mappings, verification) = sample_run();
        let table =
            RunSummary::from_run("AAPL 10-K 2024", &mappings, &verification).to_ascii_table();

        assert!(table.contains("Filing Summary: AAPL 10-K 2024"));
        assert!(table.contains("Mapped:                   3 (75.0%)"));
        assert!(table.contains("Excluded:"));
        assert!(table.contains("Passed: 1   Failed: 0   Skipped: 0"));
        assert!(table.contains(&"=".repeat(80)));
    }

    #[test]
    fn test_summary_markdown() {
        let (mappings, verification) = sample_run();
        let markdown = RunSummary::from_run("AAPL", &mappings, &verification).to_markdown();

        assert!(markdown.starts_with("# Filing Summary: AAPL"));
        assert!(markdown.contains("| Exact match | 1 | 50.0% |"));
        assert!(markdown.contains("**Tiers:** High 1, Medium 1, Low 1, Failed 1"));
        assert!(markdown.contains("**Flagged for review:** 1"));
    }

    #[test]
    fn test_summary_display_without_results() {
        let summary = RunSummary::from_run(
            "empty",
            &MappingSet::default(),
            &VerificationOutcome::default(),
        );
        let text = summary.to_string();
        assert!(text.contains("Mapped: 0/0 (0.0%)"));
        assert!(text.contains("Mean accuracy: n/a"));
    }
}
