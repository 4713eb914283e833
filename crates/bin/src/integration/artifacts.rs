//! Writing run artifacts.

use anyhow::{Context, Result};
use ledgerlens::output::{ExportFormat, Exporter, mapping_rows};
use ledgerlens::{FilingRun, Pipeline};
use std::path::Path;
use tracing::error;

/// Writes the full report set of a run into `dir`.
pub(crate) fn write_run(pipeline: &Pipeline, run: FilingRun, dir: &Path) -> Result<()> {
    let name = run.name.clone();
    let report = pipeline
        .report(run)
        .with_context(|| format!("building report for {name}"))?;
    let written = report
        .write_to_dir(dir)
        .with_context(|| format!("writing reports to {}", dir.display()))?;
    for path in written {
        tracing::debug!(path = %path.display(), "wrote");
    }
    Ok(())
}

/// Writes each run into `out/<name>`, logging and counting failures instead
/// of stopping at the first one.
pub(crate) fn write_batch(
    pipeline: &Pipeline,
    runs: impl IntoIterator<Item = (String, FilingRun)>,
    out: &Path,
) -> usize {
    let mut failed = 0;
    for (name, run) in runs {
        if let Err(err) = write_run(pipeline, run, &out.join(&name)) {
            error!(filing = %name, error = %err, "could not write reports");
            for cause in err.chain().skip(1) {
                error!(cause = %cause, "caused by");
            }
            failed += 1;
        }
    }
    failed
}

/// Writes the mapping report and mapping CSV of a run into `dir`.
pub(crate) fn write_mappings(pipeline: &Pipeline, run: FilingRun, dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    let rows = mapping_rows(&run.mappings);
    let report = pipeline.report(run)?;

    std::fs::write(dir.join("mapping_report.md"), report.mapping_report())?;
    let csv = ExportFormat::Csv;
    rows.export_to_file(&dir.join(format!("mappings.{}", csv.extension())), csv)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledgerlens::FilingInput;
    use ledgerlens::data::{ExtractedValue, ExtractedValueStore, Scale, XbrlDocument};

    fn run(pipeline: &Pipeline, name: &str) -> FilingRun {
        let values: ExtractedValueStore =
            [ExtractedValue::new("Total assets", 400.0, Some(Scale::Millions), "bs")]
                .into_iter()
                .collect();
        pipeline.run(&FilingInput::new(name, values, XbrlDocument::default()))
    }

    #[test]
    fn test_write_batch_continues_past_unwritable_dir() {
        let out = tempfile::tempdir().unwrap();
        // A plain file where the directory should go cannot be written into.
        std::fs::write(out.path().join("blocked"), "not a directory").unwrap();

        let pipeline = Pipeline::default();
        let runs = vec![
            ("blocked".to_string(), run(&pipeline, "blocked")),
            ("open".to_string(), run(&pipeline, "open")),
        ];

        let failed = write_batch(&pipeline, runs, out.path());
        assert_eq!(failed, 1);
        assert!(out.path().join("open").join("summary.json").is_file());
        assert!(out.path().join("blocked").is_file());
    }
}
