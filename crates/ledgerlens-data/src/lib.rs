#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/ledgerlens/ledgerlens/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod extracted;
pub mod scale;
pub mod xbrl;

pub use error::{DataError, Result};
pub use extracted::{ExtractedValue, ExtractedValueStore, parse_amount};
pub use scale::{Scale, parse_declared_scale};
pub use xbrl::{Period, XbrlDocument, XbrlFact, concepts};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
