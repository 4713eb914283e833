//! Machine-readable export of filing results.
//!
//! Every result collection flattens into rows that serialize to CSV, compact
//! JSON or pretty JSON through the [`Exporter`] trait.

use chrono::NaiveDate;
use ledgerlens_mapping::{ConceptMapping, MappingSet};
use ledgerlens_verify::{Diagnostic, RuleOutcome, VerificationOutcome, VerificationResult};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use thiserror::Error;

use crate::summary::RunSummary;

/// Errors that can occur during export operations.
#[derive(Debug, Error)]
pub enum ExportError {
    /// CSV serialization error.
    #[error("CSV serialization error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization error.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV output was not valid UTF-8.
    #[error("Invalid UTF-8 in CSV output: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    /// Invalid format error.
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

/// Export format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Comma-separated values format.
    Csv,

    /// Compact JSON format.
    Json,

    /// Pretty-printed JSON format.
    PrettyJson,
}

impl ExportFormat {
    /// Get the file extension for this format.
    pub const fn extension(&self) -> &str {
        match self {
            Self::Csv => "csv",
            Self::Json | Self::PrettyJson => "json",
        }
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            "pretty" | "pretty-json" | "pretty_json" => Ok(Self::PrettyJson),
            other => Err(ExportError::InvalidFormat(other.to_string())),
        }
    }
}

/// One concept mapping, flattened.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MappingRow {
    /// Concept as submitted
    pub concept: String,

    /// Matched label, empty when the mapping failed
    pub matched_label: Option<String>,

    /// Source table of the matched value
    pub source: Option<String>,

    /// Combined score (best score seen for failed mappings)
    pub score: f64,

    /// Direct similarity component
    pub direct: f64,

    /// Semantic similarity component
    pub semantic: f64,

    /// Confidence tier
    pub confidence: String,

    /// Review flags, `;`-separated
    pub flags: String,

    /// Best label considered, accepted or not
    pub best_label: Option<String>,
}

impl From<&ConceptMapping> for MappingRow {
    fn from(mapping: &ConceptMapping) -> Self {
        Self {
            concept: mapping.concept.clone(),
            matched_label: mapping.matched_label.clone(),
            source: mapping.source.clone(),
            score: mapping.score,
            direct: mapping.direct,
            semantic: mapping.semantic,
            confidence: mapping.confidence.to_string(),
            flags: mapping
                .flags
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(";"),
            best_label: mapping.best_candidate().map(|c| c.label.clone()),
        }
    }
}

/// One verification result, flattened.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VerificationRow {
    /// Concept
    pub concept: String,

    /// Matched table label
    pub label: String,

    /// Source table
    pub source: String,

    /// XBRL value in raw units
    pub xbrl_value: f64,

    /// Table figure in raw units
    pub pdf_value: f64,

    /// Table figure as printed
    pub reported_value: f64,

    /// Scale applied to the printed figure
    pub scale: String,

    /// True when the scale was inferred
    pub scale_inferred: bool,

    /// XBRL unit
    pub unit: String,

    /// End of the XBRL fact's period
    pub period_end: Option<NaiveDate>,

    /// Signed difference (table minus XBRL)
    pub difference: f64,

    /// Relative difference
    pub relative_difference: f64,

    /// Accuracy percentage
    pub accuracy_pct: f64,

    /// Match status
    pub status: String,
}

impl From<&VerificationResult> for VerificationRow {
    fn from(result: &VerificationResult) -> Self {
        Self {
            concept: result.concept.clone(),
            label: result.label.clone(),
            source: result.source.clone(),
            xbrl_value: result.xbrl_value,
            pdf_value: result.pdf_value,
            reported_value: result.reported_value,
            scale: result.scale.to_string(),
            scale_inferred: result.scale_inferred,
            unit: result.unit.clone(),
            period_end: result.period.map(|p| p.end),
            difference: result.difference,
            relative_difference: result.relative_difference,
            accuracy_pct: result.accuracy_pct,
            status: result.status.to_string(),
        }
    }
}

/// One concept excluded from verification.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExclusionRow {
    /// Concept
    pub concept: String,

    /// Diagnostic kind (Unmapped, MissingValue, NoContext, UnitUnknown)
    pub kind: String,

    /// Human-readable detail
    pub detail: String,
}

impl From<&Diagnostic> for ExclusionRow {
    fn from(diagnostic: &Diagnostic) -> Self {
        Self {
            concept: diagnostic.concept().to_string(),
            kind: diagnostic.kind().to_string(),
            detail: diagnostic.to_string(),
        }
    }
}

/// One accounting rule outcome, flattened.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RuleRow {
    /// Rule name
    pub rule: String,

    /// Values checked (XBRL or PDF)
    pub basis: String,

    /// PASS, FAIL or SKIPPED
    pub status: String,

    /// Signed discrepancy
    pub discrepancy: Option<f64>,

    /// Allowed discrepancy
    pub allowed: Option<f64>,

    /// Missing concepts, `;`-separated
    pub missing: String,
}

impl From<&RuleOutcome> for RuleRow {
    fn from(outcome: &RuleOutcome) -> Self {
        Self {
            rule: outcome.rule.clone(),
            basis: outcome.basis.to_string(),
            status: outcome.status.to_string(),
            discrepancy: outcome.discrepancy,
            allowed: outcome.allowed,
            missing: outcome.missing.join(";"),
        }
    }
}

/// Mapping rows in concept order.
pub fn mapping_rows(mappings: &MappingSet) -> Vec<MappingRow> {
    mappings.mappings.iter().map(MappingRow::from).collect()
}

/// Verification rows in concept order.
pub fn verification_rows(outcome: &VerificationOutcome) -> Vec<VerificationRow> {
    outcome.results.iter().map(VerificationRow::from).collect()
}

/// Exclusion rows in concept order.
pub fn exclusion_rows(outcome: &VerificationOutcome) -> Vec<ExclusionRow> {
    outcome.diagnostics.iter().map(ExclusionRow::from).collect()
}

/// Rule rows, XBRL basis first.
pub fn rule_rows(outcome: &VerificationOutcome) -> Vec<RuleRow> {
    outcome.rules.iter().map(RuleRow::from).collect()
}

/// Trait for exporting data in various formats.
pub trait Exporter {
    /// Export data to a string in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError>;

    /// Export data to a file in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or file writing fails.
    fn export_to_file(&self, path: &Path, format: ExportFormat) -> Result<(), ExportError> {
        let content = self.export_to_string(format)?;
        let mut file = File::create(path)?;
        file.write_all(content.as_bytes())?;
        Ok(())
    }
}

fn records_to_csv<T: Serialize>(records: &[T]) -> Result<String, ExportError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    for record in records {
        wtr.serialize(record)?;
    }
    let bytes = wtr.into_inner().map_err(|e| e.into_error())?;
    Ok(String::from_utf8(bytes)?)
}

fn export_records<T: Serialize>(records: &[T], format: ExportFormat) -> Result<String, ExportError> {
    match format {
        ExportFormat::Csv => records_to_csv(records),
        ExportFormat::Json => Ok(serde_json::to_string(records)?),
        ExportFormat::PrettyJson => Ok(serde_json::to_string_pretty(records)?),
    }
}

impl Exporter for Vec<MappingRow> {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        export_records(self, format)
    }
}

impl Exporter for Vec<VerificationRow> {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        export_records(self, format)
    }
}

impl Exporter for Vec<ExclusionRow> {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        export_records(self, format)
    }
}

impl Exporter for Vec<RuleRow> {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        export_records(self, format)
    }
}

impl Exporter for RunSummary {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => records_to_csv(std::slice::from_ref(self)),
            ExportFormat::Json => Ok(serde_json::to_string(self)?),
            ExportFormat::PrettyJson => Ok(serde_json::to_string_pretty(self)?),
        }
    }
}
