#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/ledgerlens/ledgerlens/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod config;
pub mod pipeline;

// Re-export main types from sub-crates
pub use ledgerlens_data as data;
pub use ledgerlens_mapping as mapping;
pub use ledgerlens_output as output;
pub use ledgerlens_verify as verify;

pub use config::{ConfigError, Settings, SynonymSettings};
pub use pipeline::{FilingInput, FilingRun, Pipeline, PipelineError};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
