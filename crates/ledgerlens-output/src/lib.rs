#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/ledgerlens/ledgerlens/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod export;
pub mod report;
pub mod summary;

pub use export::{
    ExclusionRow, ExportError, ExportFormat, Exporter, MappingRow, RuleRow, VerificationRow,
    exclusion_rows, mapping_rows, rule_rows, verification_rows,
};
pub use report::{FilingReport, ReportBuilder, ReportError};
pub use summary::RunSummary;
