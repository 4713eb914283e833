//! Glue between the command line and the pipeline: finding filing
//! directories and writing run artifacts.

pub(crate) mod filings;
pub(crate) mod artifacts;
