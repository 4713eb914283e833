#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/ledgerlens/ledgerlens/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod mapper;
pub mod similarity;
pub mod synonyms;

pub use error::{MappingError, Result};
pub use mapper::{
    Candidate, ConceptMapper, ConceptMapping, Confidence, MapperConfig, MappingFlag, MappingSet,
};
pub use similarity::{DirectSimilarity, SemanticSimilarity, Similarity, jaccard, normalize_label};
pub use synonyms::{ConceptEntry, DEFAULT_TABLE, ResolvedConcept, SynonymTable};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
