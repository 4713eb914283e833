//! Filing directory discovery.

use ledgerlens::pipeline::FACT_FILES;
use std::path::{Path, PathBuf};

/// Returns true if `dir` holds an XBRL facts file.
pub(crate) fn is_filing_dir(dir: &Path) -> bool {
    FACT_FILES.iter().any(|f| dir.join(f).is_file())
}

/// Expands the given paths into filing directories.
///
/// A path that is itself a filing directory is kept; otherwise its immediate
/// subdirectories that are filing directories are taken, sorted by name.
pub(crate) fn discover(paths: &[PathBuf]) -> std::io::Result<Vec<PathBuf>> {
    let mut filings = Vec::new();
    for path in paths {
        if is_filing_dir(path) {
            filings.push(path.clone());
            continue;
        }
        let mut children = std::fs::read_dir(path)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_dir() && is_filing_dir(p))
            .collect::<Vec<_>>();
        children.sort();
        if children.is_empty() {
            tracing::warn!(path = %path.display(), "no filings found");
        }
        filings.extend(children);
    }
    Ok(filings)
}

/// Directory name used for a filing's output.
pub(crate) fn output_name(filing: &Path) -> String {
    filing
        .file_name()
        .map_or_else(|| "filing".to_string(), |n| n.to_string_lossy().into_owned())
}
