//! Mismatch investigation: guesses why a table figure disagrees with XBRL.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Ratio band treated as "about equal" when matching scale factors.
const RATIO_BAND: f64 = 0.1;

/// Figures within this relative distance that still mismatch suggest a
/// misread digit.
const DIGIT_ERROR_BAND: f64 = 0.2;

/// Likely cause of a mismatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MismatchCause {
    /// Off by a factor of 1,000
    ScaleThousands,
    /// Off by a factor of 1,000,000
    ScaleMillions,
    /// Same magnitude, opposite sign
    SignFlip,
    /// Within 20%: probably a misread or transposed digit
    DigitError,
    /// The table appears to report a quarter rather than the fiscal year
    PeriodMismatch,
}

impl fmt::Display for MismatchCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ScaleThousands => write!(f, "scale off by 1,000"),
            Self::ScaleMillions => write!(f, "scale off by 1,000,000"),
            Self::SignFlip => write!(f, "sign flipped"),
            Self::DigitError => write!(f, "digit error"),
            Self::PeriodMismatch => write!(f, "period mismatch"),
        }
    }
}

impl MismatchCause {
    /// What to check when this cause shows up.
    pub const fn recommendation(&self) -> &'static str {
        match self {
            Self::ScaleThousands | Self::ScaleMillions => {
                "Check the table caption for its scale (thousands vs millions)"
            }
            Self::SignFlip => "Check how the parser reads parenthesized negatives",
            Self::DigitError => "Review OCR or text extraction quality on the numeric cells",
            Self::PeriodMismatch => "Make sure the table and XBRL facts cover the same period",
        }
    }
}

/// Findings for one concept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Investigation {
    /// Concept investigated
    pub concept: String,
    /// PDF / XBRL ratio, when XBRL is non-zero
    pub ratio: Option<f64>,
    /// Likely causes; empty when nothing explains the difference
    pub causes: Vec<MismatchCause>,
}

impl Investigation {
    /// Returns true when no cause was found.
    pub fn is_unexplained(&self) -> bool {
        self.causes.is_empty()
    }

    /// Causes joined for display, or "unexplained".
    pub fn summary(&self) -> String {
        if self.causes.is_empty() {
            "unexplained".to_string()
        } else {
            self.causes
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        }
    }
}

fn near(value: f64, target: f64) -> bool {
    (value - target).abs() <= target.abs() * RATIO_BAND
}

/// Investigates a disagreement between a normalized table figure and XBRL.
///
/// `context` is free text about where the figure came from (source table,
/// label); a mention of a quarter points to a period mismatch.
pub fn investigate(concept: &str, xbrl_value: f64, pdf_value: f64, context: &str) -> Investigation {
    let mut causes = Vec::new();
    let ratio = (xbrl_value != 0.0).then(|| pdf_value / xbrl_value);

    if let Some(ratio) = ratio {
        let magnitude = ratio.abs();
        if near(magnitude, 1_000.0) || near(magnitude, 0.001) {
            causes.push(MismatchCause::ScaleThousands);
        } else if near(magnitude, 1_000_000.0) || near(magnitude, 0.000_001) {
            causes.push(MismatchCause::ScaleMillions);
        }

        if ratio < 0.0 && near(magnitude, 1.0) {
            causes.push(MismatchCause::SignFlip);
        } else if ratio > 0.0 && (ratio - 1.0).abs() <= DIGIT_ERROR_BAND {
            causes.push(MismatchCause::DigitError);
        }
    }

    let context = context.to_lowercase();
    if ["quarter", "three months", "3 months"]
        .iter()
        .any(|k| context.contains(k))
    {
        causes.push(MismatchCause::PeriodMismatch);
    }

    Investigation {
        concept: concept.to_string(),
        ratio,
        causes,
    }
}
