//! Filing pipeline: mapper, verifier and summary over one filing, or many in
//! parallel.
//!
//! Each stage returns its result to the next; nothing is shared between
//! filings, so a batch runs them on the rayon pool.

use crate::config::{ConfigError, Settings};
use ledgerlens_data::{DataError, ExtractedValueStore, XbrlDocument};
use ledgerlens_mapping::{ConceptMapper, MapperConfig, MappingSet, SynonymTable};
use ledgerlens_output::{FilingReport, ReportBuilder, ReportError, RunSummary};
use ledgerlens_verify::{CrossVerifier, VerificationOutcome};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// XBRL files looked for in a filing directory, in order.
pub const FACT_FILES: &[&str] = &["xbrl.xml", "xbrl.json", "facts.csv"];

/// Normalized value file in a filing directory.
pub const VALUES_FILE: &str = "values.csv";

/// Raw table directory in a filing directory.
pub const TABLES_DIR: &str = "tables";

/// Pipeline errors.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Input could not be read or parsed
    #[error("{path}: {source}")]
    Data {
        /// File or directory being read
        path: PathBuf,
        /// Underlying error
        source: DataError,
    },

    /// Filing directory has no XBRL facts file
    #[error("{0}: no XBRL facts (expected one of xbrl.xml, xbrl.json, facts.csv)")]
    NoFacts(PathBuf),

    /// Filing directory has no extracted values
    #[error("{0}: no extracted values (expected values.csv or tables/*.csv)")]
    NoValues(PathBuf),

    /// Settings rejected
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Report could not be built or written
    #[error(transparent)]
    Report(#[from] ReportError),
}

/// Inputs of one filing.
#[derive(Debug, Clone)]
pub struct FilingInput {
    /// Filing name used in reports
    pub name: String,
    /// Figures extracted from the filing's tables
    pub values: ExtractedValueStore,
    /// XBRL facts of the filing
    pub facts: XbrlDocument,
}

impl FilingInput {
    /// Creates an input from loaded stores.
    pub fn new(name: impl Into<String>, values: ExtractedValueStore, facts: XbrlDocument) -> Self {
        Self {
            name: name.into(),
            values,
            facts,
        }
    }

    /// Loads a filing directory.
    ///
    /// The directory holds one XBRL file ([`FACT_FILES`]) and extracted values
    /// in [`VALUES_FILE`], raw tables under [`TABLES_DIR`], or both. The
    /// directory name becomes the filing name unless the XBRL document names
    /// the registrant.
    pub fn from_dir(dir: &Path) -> Result<Self, PipelineError> {
        let data_err = |path: &Path| {
            let path = path.to_path_buf();
            move |source: DataError| PipelineError::Data { path, source }
        };

        let facts_path = FACT_FILES
            .iter()
            .map(|f| dir.join(f))
            .find(|p| p.is_file())
            .ok_or_else(|| PipelineError::NoFacts(dir.to_path_buf()))?;
        let facts = XbrlDocument::from_path(&facts_path).map_err(data_err(&facts_path))?;

        let mut values = ExtractedValueStore::new();
        let values_path = dir.join(VALUES_FILE);
        if values_path.is_file() {
            values.extend(
                ExtractedValueStore::from_csv_path(&values_path).map_err(data_err(&values_path))?,
            );
        }
        let tables = dir.join(TABLES_DIR);
        if tables.is_dir() {
            values.extend(
                ExtractedValueStore::from_table_dir(&tables, None).map_err(data_err(&tables))?,
            );
        }
        if values.is_empty() {
            return Err(PipelineError::NoValues(dir.to_path_buf()));
        }

        let dir_name = dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| dir.display().to_string());
        let name = match &facts.entity_name {
            Some(entity) => format!("{entity} ({dir_name})"),
            None => dir_name,
        };

        tracing::debug!(
            filing = %name,
            facts = facts.facts.len(),
            values = values.len(),
            "loaded filing"
        );
        Ok(Self::new(name, values, facts))
    }
}

/// Everything one filing run produced.
#[derive(Debug, Clone)]
pub struct FilingRun {
    /// Filing name
    pub name: String,
    /// Concept mappings
    pub mappings: MappingSet,
    /// Verification results, diagnostics and rule outcomes
    pub verification: VerificationOutcome,
    /// Aggregate statistics
    pub summary: RunSummary,
}

/// Runs filings through mapping and verification.
#[derive(Debug)]
pub struct Pipeline {
    table: SynonymTable,
    mapper_config: MapperConfig,
    verifier: CrossVerifier,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self {
            table: SynonymTable::builtin().clone(),
            mapper_config: MapperConfig::default(),
            verifier: CrossVerifier::default(),
        }
    }
}

impl Pipeline {
    /// Builds a pipeline from settings, loading the selected synonym table.
    pub fn new(settings: &Settings) -> Result<Self, PipelineError> {
        settings.validate()?;
        let table = settings.synonym_table()?;
        let verifier = CrossVerifier::new(settings.verifier).map_err(ConfigError::from)?;
        Ok(Self {
            table,
            mapper_config: settings.mapper,
            verifier,
        })
    }

    /// Synonym table in use.
    pub const fn table(&self) -> &SynonymTable {
        &self.table
    }

    /// Mapper over this pipeline's table and settings.
    pub const fn mapper(&self) -> ConceptMapper<'_> {
        ConceptMapper::new(&self.table, self.mapper_config)
    }

    /// Cross-verifier in use.
    pub const fn verifier(&self) -> &CrossVerifier {
        &self.verifier
    }

    /// Maps every concept of the filing.
    pub fn map(&self, input: &FilingInput) -> MappingSet {
        self.mapper()
            .map_all(input.facts.concepts_in_order(), &input.values)
    }

    /// Maps and verifies one filing.
    pub fn run(&self, input: &FilingInput) -> FilingRun {
        let span = tracing::info_span!("filing", name = %input.name);
        let _guard = span.enter();

        let mappings = self.map(input);
        let verification = self.verifier.verify(&mappings, &input.values, &input.facts);
        let summary = RunSummary::from_run(input.name.clone(), &mappings, &verification);

        tracing::info!(
            mapped = summary.mapped,
            verified = summary.verified,
            mismatches = summary.mismatch,
            excluded = summary.excluded(),
            "filing run complete"
        );

        FilingRun {
            name: input.name.clone(),
            mappings,
            verification,
            summary,
        }
    }

    /// Runs filings in parallel. Results keep input order.
    pub fn run_batch(&self, inputs: &[FilingInput]) -> Vec<FilingRun> {
        inputs.par_iter().map(|input| self.run(input)).collect()
    }

    /// Loads and runs filing directories in parallel, calling `on_done` after
    /// each one. A directory that fails to load yields an error for that
    /// directory only.
    pub fn run_dirs<F>(
        &self,
        dirs: &[PathBuf],
        on_done: F,
    ) -> Vec<Result<FilingRun, PipelineError>>
    where
        F: Fn(&Path, &Result<FilingRun, PipelineError>) + Sync,
    {
        dirs.par_iter()
            .map(|dir| {
                let result = FilingInput::from_dir(dir).map(|input| self.run(&input));
                on_done(dir, &result);
                result
            })
            .collect()
    }

    /// Report of a finished run carrying this pipeline's settings.
    pub fn report(&self, run: FilingRun) -> Result<FilingReport, PipelineError> {
        Ok(ReportBuilder::new()
            .name(run.name)
            .mapper_config(self.mapper_config)
            .verifier_config(*self.verifier.config())
            .mappings(run.mappings)
            .verification(run.verification)
            .build()?)
    }
}
