//! Reporting scale of figures in filing tables.
//!
//! Financial statements usually print figures "in millions" or "in thousands".
//! XBRL facts are always stored in raw units, so every extracted value has to
//! be brought to raw units before it can be compared against a fact. A value
//! whose scale is unknown stays unknown here; deciding what to do with it is
//! the verifier's job.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use crate::error::DataError;

static MILLIONS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:in|of)\s+millions\b|\bmillions\s+of\b|\(\s*\$?\s*millions\s*\)")
        .expect("valid millions regex")
});

static THOUSANDS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:in|of)\s+thousands\b|\bthousands\s+of\b|\(\s*\$?\s*thousands\s*\)|\(\s*\$?\s*000'?s?\s*\)|\bin\s+\$?\s*000'?s\b",
    )
    .expect("valid thousands regex")
});

static RAW_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bin\s+(?:actual\s+)?(?:units|dollars|u\.?s\.?\s+dollars)\b")
        .expect("valid raw regex")
});

/// Scale in which a table reports its figures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scale {
    /// Figures are in raw units (whole dollars, shares, per-share amounts)
    Raw,

    /// Figures are in thousands
    Thousands,

    /// Figures are in millions
    Millions,
}

impl Scale {
    /// Returns all scales, smallest factor first.
    pub const fn all() -> [Self; 3] {
        [Self::Raw, Self::Thousands, Self::Millions]
    }

    /// Multiplier that converts a figure in this scale to raw units.
    pub const fn factor(&self) -> f64 {
        match self {
            Self::Raw => 1.0,
            Self::Thousands => 1_000.0,
            Self::Millions => 1_000_000.0,
        }
    }

    /// Converts a figure reported in this scale to raw units.
    pub fn to_raw(&self, value: f64) -> f64 {
        value * self.factor()
    }

    /// Converts a raw figure into this scale.
    pub fn from_raw(&self, value: f64) -> f64 {
        value / self.factor()
    }

    /// Short lowercase name used in CSV files and reports.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Raw => "raw",
            Self::Thousands => "thousands",
            Self::Millions => "millions",
        }
    }

    /// Detects a scale declaration in free text such as a table caption or
    /// column header ("(in millions, except per-share amounts)").
    ///
    /// Returns `None` when the text declares nothing.
    pub fn detect(text: &str) -> Option<Self> {
        if MILLIONS_RE.is_match(text) {
            Some(Self::Millions)
        } else if THOUSANDS_RE.is_match(text) {
            Some(Self::Thousands)
        } else if RAW_RE.is_match(text) {
            Some(Self::Raw)
        } else {
            None
        }
    }
}

impl fmt::Display for Scale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scale {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "raw" | "units" | "ones" | "1" => Ok(Self::Raw),
            "thousands" | "thousand" | "000s" | "k" => Ok(Self::Thousands),
            "millions" | "million" | "m" | "mm" => Ok(Self::Millions),
            other => Err(DataError::Parse(format!("Unknown scale: {other}"))),
        }
    }
}

/// Parses an optional scale column: blank or "unknown" means undeclared.
pub fn parse_declared_scale(text: &str) -> Result<Option<Scale>, DataError> {
    let trimmed = text.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("unknown") {
        return Ok(None);
    }
    trimmed.parse().map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[rstest]
    #[case("(In millions, except number of shares, which are reflected in thousands)", Some(Scale::Millions))]
    #[case("CONSOLIDATED BALANCE SHEETS (In millions)", Some(Scale::Millions))]
    #[case("$ in millions", Some(Scale::Millions))]
    #[case("(Dollars in thousands)", Some(Scale::Thousands))]
    #[case("Amounts ($000s)", Some(Scale::Thousands))]
    #[case("(in 000's)", Some(Scale::Thousands))]
    #[case("Figures in U.S. dollars", Some(Scale::Raw))]
    #[case("Total current assets", None)]
    #[case("", None)]
    fn test_detect(#[case] text: &str, #[case] expected: Option<Scale>) {
        assert_eq!(Scale::detect(text), expected);
    }

    #[test]
    fn test_factors() {
        assert_eq!(Scale::Raw.factor(), 1.0);
        assert_eq!(Scale::Thousands.factor(), 1_000.0);
        assert_eq!(Scale::Millions.factor(), 1_000_000.0);
    }

    #[test]
    fn test_millions_round_trip() {
        for raw in [45_680_000_000.0, 391_035_000_000.0, -1_234_567.0, 6.11, 0.0] {
            let in_millions = Scale::Millions.from_raw(raw);
            assert_relative_eq!(Scale::Millions.to_raw(in_millions), raw, max_relative = 1e-12);
        }
    }

    #[test]
    fn test_to_raw() {
        assert_relative_eq!(Scale::Millions.to_raw(45_680.0), 45_680_000_000.0);
        assert_relative_eq!(Scale::Thousands.to_raw(2.5), 2_500.0);
        assert_relative_eq!(Scale::Raw.to_raw(0.4), 0.4);
    }

    #[test]
    fn test_parse_declared_scale() {
        assert_eq!(parse_declared_scale("millions").unwrap(), Some(Scale::Millions));
        assert_eq!(parse_declared_scale(" Thousands ").unwrap(), Some(Scale::Thousands));
        assert_eq!(parse_declared_scale("raw").unwrap(), Some(Scale::Raw));
        assert_eq!(parse_declared_scale("").unwrap(), None);
        assert_eq!(parse_declared_scale("unknown").unwrap(), None);
        assert!(parse_declared_scale("billions-ish").is_err());
    }

    #[test]
    fn test_display_matches_serde() {
        assert_eq!(Scale::Millions.to_string(), "millions");
        assert_eq!(
            serde_json::to_string(&Scale::Thousands).unwrap(),
            "\"thousands\""
        );
    }
}
