//! Filing reports: the human-readable mapping and verification reports plus
//! the machine-readable artifacts written next to them.

use crate::export::{
    ExportError, ExportFormat, Exporter, exclusion_rows, mapping_rows, rule_rows,
    verification_rows,
};
use crate::summary::RunSummary;
use chrono::{DateTime, Utc};
use ledgerlens_mapping::{MapperConfig, MappingSet};
use ledgerlens_verify::{
    Investigation, MatchStatus, MismatchCause, RuleBasis, VerificationOutcome, VerifierConfig,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur during report generation.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Export error.
    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A required builder field was not set.
    #[error("Missing report field: {0}")]
    MissingField(&'static str),
}

/// Everything produced for one filing run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilingReport {
    /// Filing name.
    pub name: String,

    /// Report generation timestamp.
    pub timestamp: DateTime<Utc>,

    /// Mapper settings the run used.
    pub mapper_config: MapperConfig,

    /// Verifier settings the run used.
    pub verifier_config: VerifierConfig,

    /// Aggregate statistics.
    pub summary: RunSummary,

    /// Concept mappings.
    pub mappings: MappingSet,

    /// Verification results, diagnostics and rule outcomes.
    pub verification: VerificationOutcome,
}

/// Escapes text for a Markdown table cell.
fn cell(text: &str) -> String {
    text.replace('|', "\\|").replace(['\n', '\r'], " ")
}

/// Formats a raw dollar amount in millions.
fn millions(value: f64) -> String {
    format!("${:.1}M", value / 1e6)
}

/// Formats an amount for display: per-share figures as printed, others in
/// millions.
fn amount(value: f64, unit: &str) -> String {
    if unit.contains('/') {
        format!("{value:.2}")
    } else {
        millions(value)
    }
}

impl FilingReport {
    /// Create a report with default configurations and the current time.
    pub fn new(
        name: impl Into<String>,
        mappings: MappingSet,
        verification: VerificationOutcome,
    ) -> Self {
        let name = name.into();
        Self {
            summary: RunSummary::from_run(name.clone(), &mappings, &verification),
            name,
            timestamp: Utc::now(),
            mapper_config: MapperConfig::default(),
            verifier_config: VerifierConfig::default(),
            mappings,
            verification,
        }
    }

    /// Convert report to JSON string.
    pub fn to_json(&self) -> Result<String, ReportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Concept mapping report in Markdown.
    pub fn mapping_report(&self) -> String {
        let mut output = String::new();
        let s = &self.summary;

        output.push_str(&format!("# Concept Mapping Report: {}\n\n", self.name));
        output.push_str(&format!(
            "**Generated:** {}  \n**Synonym table:** v{}\n\n",
            self.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
            self.mappings.table_version
        ));

        output.push_str("## Summary\n\n");
        output.push_str(&format!("- **Concepts:** {}\n", s.total_concepts));
        output.push_str(&format!(
            "- **Mapped:** {} ({:.1}%)\n",
            s.mapped, s.mapped_pct
        ));
        output.push_str(&format!("- **High confidence:** {}\n", s.high));
        output.push_str(&format!("- **Medium confidence:** {}\n", s.medium));
        output.push_str(&format!("- **Low confidence:** {}\n", s.low));
        output.push_str(&format!("- **Failed:** {}\n\n", s.failed));

        output.push_str("## Successful Mappings\n\n");
        if s.mapped == 0 {
            output.push_str("_None._\n\n");
        } else {
            output.push_str("| Concept | Matched Label | Score | Confidence | Source |\n");
            output.push_str("|---------|---------------|-------|------------|--------|\n");
            for m in self.mappings.successful() {
                output.push_str(&format!(
                    "| {} | {} | {:.3} | {} | {} |\n",
                    cell(&m.concept),
                    cell(m.matched_label.as_deref().unwrap_or_default()),
                    m.score,
                    m.confidence,
                    cell(m.source.as_deref().unwrap_or("-"))
                ));
            }
            output.push('\n');
        }

        if s.flagged > 0 {
            output.push_str("## Flagged Mappings\n\n");
            output.push_str("| Concept | Matched Label | Score | Flags |\n");
            output.push_str("|---------|---------------|-------|-------|\n");
            for m in self.mappings.flagged() {
                let flags = m
                    .flags
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ");
                output.push_str(&format!(
                    "| {} | {} | {:.3} | {} |\n",
                    cell(&m.concept),
                    cell(m.matched_label.as_deref().unwrap_or_default()),
                    m.score,
                    flags
                ));
            }
            output.push('\n');
        }

        output.push_str("## Failed Mappings\n\n");
        if s.failed == 0 {
            output.push_str("_None._\n\n");
        } else {
            output.push_str("| Concept | Best Label | Best Score |\n");
            output.push_str("|---------|------------|------------|\n");
            for m in self.mappings.failed() {
                output.push_str(&format!(
                    "| {} | {} | {:.3} |\n",
                    cell(&m.concept),
                    cell(m.best_candidate().map_or("-", |c| c.label.as_str())),
                    m.score
                ));
            }
            output.push('\n');
        }

        let c = &self.mapper_config;
        output.push_str("## Methodology\n\n");
        output.push_str(&format!(
            "Each concept is scored against every extracted label as \
             `{:.1} * direct + {:.1} * semantic`. Direct similarity compares the \
             normalized strings character by character; semantic similarity is the \
             keyword overlap with the concept's synonym set.\n\n",
            c.direct_weight, c.semantic_weight
        ));
        output.push_str(&format!(
            "- Scores below {:.2} fail.\n- Scores at or above {:.2} are High, the rest Medium.\n\
             - Matches that look like a subtotal of the concept are downgraded to Low.\n\
             - Ties go to the label seen first.\n",
            c.match_threshold, c.high_threshold
        ));

        output
    }

    /// Cross-verification report in Markdown.
    pub fn verification_report(&self) -> String {
        let mut output = String::new();
        let s = &self.summary;

        output.push_str(&format!("# Cross-Verification Report: {}\n\n", self.name));
        output.push_str(&format!(
            "**Generated:** {}\n\n",
            self.timestamp.format("%Y-%m-%d %H:%M:%S UTC")
        ));

        output.push_str("## Summary\n\n");
        output.push_str(&format!("- **Verified:** {}\n", s.verified));
        output.push_str(&format!(
            "- **Exact matches:** {} ({:.1}%)\n",
            s.exact, s.exact_pct
        ));
        output.push_str(&format!(
            "- **Close matches:** {} ({:.1}%)\n",
            s.close, s.close_pct
        ));
        output.push_str(&format!(
            "- **Mismatches:** {} ({:.1}%)\n",
            s.mismatch, s.mismatch_pct
        ));
        match s.mean_accuracy {
            Some(accuracy) => output.push_str(&format!("- **Mean accuracy:** {accuracy:.2}%\n")),
            None => output.push_str("- **Mean accuracy:** n/a\n"),
        }
        output.push_str(&format!(
            "- **Tolerances:** exact within {:.1}%, close within {:.1}%\n\n",
            self.verifier_config.exact_tolerance * 100.0,
            self.verifier_config.close_tolerance * 100.0
        ));

        for (status, title) in [
            (MatchStatus::ExactMatch, "Exact Matches"),
            (MatchStatus::CloseMatch, "Close Matches"),
            (MatchStatus::Mismatch, "Mismatches"),
        ] {
            let results: Vec<_> = self
                .verification
                .results
                .iter()
                .filter(|r| r.status == status)
                .collect();
            if results.is_empty() {
                continue;
            }
            output.push_str(&format!("## {title}\n\n"));
            output.push_str("| Concept | Label | XBRL | PDF | Scale | Accuracy |\n");
            output.push_str("|---------|-------|------|-----|-------|----------|\n");
            for r in results {
                let scale = if r.scale_inferred {
                    format!("{} (inferred)", r.scale)
                } else {
                    r.scale.to_string()
                };
                output.push_str(&format!(
                    "| {} | {} | {} | {} | {} | {:.2}% |\n",
                    cell(&r.concept),
                    cell(&r.label),
                    amount(r.xbrl_value, &r.unit),
                    amount(r.pdf_value, &r.unit),
                    scale,
                    r.accuracy_pct
                ));
            }
            output.push('\n');
        }

        if !self.verification.diagnostics.is_empty() {
            output.push_str("## Excluded Concepts\n\n");
            output.push_str("| Concept | Reason | Detail |\n");
            output.push_str("|---------|--------|--------|\n");
            for d in &self.verification.diagnostics {
                output.push_str(&format!(
                    "| {} | {} | {} |\n",
                    cell(d.concept()),
                    d.kind(),
                    cell(&d.to_string())
                ));
            }
            output.push('\n');
        }

        if !self.verification.investigations.is_empty() {
            output.push_str("## Mismatch Analysis\n\n");
            for i in &self.verification.investigations {
                let ratio = i
                    .ratio
                    .map_or_else(|| "n/a".to_string(), |r| format!("{r:.4}"));
                output.push_str(&format!(
                    "- **{}**: PDF/XBRL ratio {}; likely cause: {}\n",
                    i.concept,
                    ratio,
                    i.summary()
                ));
            }
            output.push('\n');
        }

        let mut causes: Vec<MismatchCause> = Vec::new();
        for cause in self.verification.investigations.iter().flat_map(|i| &i.causes) {
            if !causes.contains(cause) {
                causes.push(*cause);
            }
        }
        let unexplained = self
            .verification
            .investigations
            .iter()
            .any(Investigation::is_unexplained);
        if !causes.is_empty() || unexplained {
            output.push_str("## Recommendations\n\n");
            for cause in &causes {
                output.push_str(&format!("- **{cause}**: {}\n", cause.recommendation()));
            }
            if unexplained {
                output.push_str(
                    "- **unexplained**: Compare the matched label against the filing by hand\n",
                );
            }
            output.push('\n');
        }

        output.push_str("## Accounting Rules\n\n");
        if self.verification.rules.is_empty() {
            output.push_str("_No rules evaluated._\n");
        } else {
            output.push_str("| Rule | Basis | Status | Discrepancy | Allowed |\n");
            output.push_str("|------|-------|--------|-------------|---------|\n");
            for basis in [RuleBasis::Xbrl, RuleBasis::Pdf] {
                for r in self.verification.rules_on(basis) {
                    let status = if r.missing.is_empty() {
                        r.status.to_string()
                    } else {
                        format!("{} (missing {})", r.status, cell(&r.missing.join(", ")))
                    };
                    output.push_str(&format!(
                        "| {} | {} | {} | {} | {} |\n",
                        r.rule,
                        r.basis,
                        status,
                        r.discrepancy.map_or_else(|| "-".to_string(), millions),
                        r.allowed.map_or_else(|| "-".to_string(), millions)
                    ));
                }
            }
        }

        output
    }

    /// Writes the reports and exports into `dir`, creating it if needed.
    ///
    /// Returns the paths written.
    pub fn write_to_dir(&self, dir: &Path) -> Result<Vec<PathBuf>, ReportError> {
        fs::create_dir_all(dir)?;
        let mut written = Vec::new();

        let mut text = |file: &str, content: String| -> Result<(), ReportError> {
            let path = dir.join(file);
            fs::write(&path, content)?;
            written.push(path);
            Ok(())
        };
        text("mapping_report.md", self.mapping_report())?;
        text("verification_report.md", self.verification_report())?;
        text("summary.json", serde_json::to_string_pretty(&self.summary)?)?;

        let csv = ExportFormat::Csv;
        let mappings = mapping_rows(&self.mappings);
        let results = verification_rows(&self.verification);
        let excluded = exclusion_rows(&self.verification);
        let rules = rule_rows(&self.verification);
        let exports: [(&str, &dyn Exporter); 4] = [
            ("mappings", &mappings),
            ("verification", &results),
            ("excluded", &excluded),
            ("rules", &rules),
        ];
        for (stem, exporter) in exports {
            let path = dir.join(format!("{stem}.{}", csv.extension()));
            exporter.export_to_file(&path, csv)?;
            written.push(path);
        }

        tracing::info!(
            filing = %self.name,
            dir = %dir.display(),
            files = written.len(),
            "wrote reports"
        );
        Ok(written)
    }
}

/// Builder for creating reports.
#[derive(Debug, Default)]
pub struct ReportBuilder {
    name: Option<String>,
    timestamp: Option<DateTime<Utc>>,
    mapper_config: Option<MapperConfig>,
    verifier_config: Option<VerifierConfig>,
    mappings: Option<MappingSet>,
    verification: Option<VerificationOutcome>,
}

impl ReportBuilder {
    /// Create a new report builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the filing name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the generation timestamp (defaults to now).
    pub const fn timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Set the mapper settings shown in the methodology section.
    pub const fn mapper_config(mut self, config: MapperConfig) -> Self {
        self.mapper_config = Some(config);
        self
    }

    /// Set the verifier settings shown in the summary.
    pub const fn verifier_config(mut self, config: VerifierConfig) -> Self {
        self.verifier_config = Some(config);
        self
    }

    /// Set the concept mappings.
    pub fn mappings(mut self, mappings: MappingSet) -> Self {
        self.mappings = Some(mappings);
        self
    }

    /// Set the verification outcome (defaults to empty).
    pub fn verification(mut self, verification: VerificationOutcome) -> Self {
        self.verification = Some(verification);
        self
    }

    /// Build the report.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::MissingField`] when no name or no mappings were set.
    pub fn build(self) -> Result<FilingReport, ReportError> {
        let name = self.name.ok_or(ReportError::MissingField("name"))?;
        let mappings = self.mappings.ok_or(ReportError::MissingField("mappings"))?;
        let mut report =
            FilingReport::new(name, mappings, self.verification.unwrap_or_default());
        if let Some(timestamp) = self.timestamp {
            report.timestamp = timestamp;
        }
        if let Some(config) = self.mapper_config {
            report.mapper_config = config;
        }
        if let Some(config) = self.verifier_config {
            report.verifier_config = config;
        }
        Ok(report)
    }
}
