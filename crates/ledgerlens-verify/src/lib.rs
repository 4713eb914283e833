#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/ledgerlens/ledgerlens/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod investigate;
pub mod normalize;
pub mod rules;
pub mod verifier;

// Re-export main types
pub use investigate::{Investigation, MismatchCause, investigate};
pub use normalize::{ScaleResolution, ScaleResolver};
pub use rules::{
    AccountingRule, BalanceSheetEquation, GrossProfitIdentity, PartWithinTotal, RuleBasis,
    RuleCheck, RuleOutcome, RuleStatus, RuleValues, default_rules, evaluate_rules,
};
pub use verifier::{
    CrossVerifier, Diagnostic, MatchStatus, VerificationOutcome, VerificationResult,
    VerifierConfig, VerifyError,
};
