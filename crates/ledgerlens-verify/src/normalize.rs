//! Scale Resolution
//!
//! Brings a figure printed in a filing table to the raw units of its XBRL
//! fact. Tables print "in millions" or "in thousands"; XBRL stores dollars.
//! Skipping this step produces accuracy figures off by orders of magnitude.
//!
//! Resolution order:
//! 1. Per-share units ("USD/shares") are compared as printed.
//! 2. A declared scale is applied and accepted if the result is within
//!    `implausible_ratio` of the XBRL value (either direction).
//! 3. Otherwise each scale is tried and the one closest to the XBRL value is
//!    kept, provided it lands within `close_tolerance`.
//! 4. If nothing fits, the scale is unknown and the value is not compared.

use ledgerlens_data::{ExtractedValue, Scale, XbrlFact};
use serde::{Deserialize, Serialize};

/// A figure brought to raw units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScaleResolution {
    /// Scale that was applied
    pub scale: Scale,

    /// Figure in raw units
    pub normalized: f64,

    /// True when the scale was inferred rather than taken from the table
    pub inferred: bool,
}

/// Resolves the scale of extracted figures against XBRL facts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleResolver {
    close_tolerance: f64,
    implausible_ratio: f64,
    epsilon: f64,
}

impl Default for ScaleResolver {
    fn default() -> Self {
        Self::new(0.05, 100.0, 1e-9)
    }
}

impl ScaleResolver {
    /// Creates a resolver.
    ///
    /// * `close_tolerance` - relative difference an inferred scale must reach
    /// * `implausible_ratio` - a declared scale further than this factor from
    ///   the XBRL value is rejected
    /// * `epsilon` - floor for the denominator of relative differences
    pub const fn new(close_tolerance: f64, implausible_ratio: f64, epsilon: f64) -> Self {
        Self {
            close_tolerance,
            implausible_ratio,
            epsilon,
        }
    }

    /// Relative difference between a normalized figure and the XBRL value.
    pub fn relative_difference(&self, normalized: f64, xbrl_value: f64) -> f64 {
        (normalized - xbrl_value).abs() / xbrl_value.abs().max(self.epsilon)
    }

    /// Returns true when `normalized` is within `implausible_ratio` of the
    /// XBRL value in magnitude. Zero on either side is accepted and left to
    /// the comparison.
    pub fn is_plausible(&self, normalized: f64, xbrl_value: f64) -> bool {
        if normalized.abs() < self.epsilon || xbrl_value.abs() < self.epsilon {
            return true;
        }
        let ratio = (normalized / xbrl_value).abs();
        ratio <= self.implausible_ratio && ratio >= 1.0 / self.implausible_ratio
    }

    /// Resolves a figure against the fact it is compared with.
    ///
    /// Returns `None` when no scale makes the figure comparable.
    pub fn resolve(&self, value: &ExtractedValue, fact: &XbrlFact) -> Option<ScaleResolution> {
        if fact.is_per_share() {
            return Some(ScaleResolution {
                scale: Scale::Raw,
                normalized: value.value,
                inferred: false,
            });
        }

        if let Some(declared) = value.unit {
            let normalized = declared.to_raw(value.value);
            if self.is_plausible(normalized, fact.value) {
                return Some(ScaleResolution {
                    scale: declared,
                    normalized,
                    inferred: false,
                });
            }
            tracing::warn!(
                label = %value.label,
                declared = %declared,
                normalized,
                xbrl = fact.value,
                "declared scale is implausible, inferring"
            );
        }

        self.infer(value.value, fact.value)
    }

    /// Picks the scale that brings `reported` closest to `xbrl_value`, if
    /// that scale lands within the close tolerance.
    pub fn infer(&self, reported: f64, xbrl_value: f64) -> Option<ScaleResolution> {
        let best = Scale::all()
            .into_iter()
            .map(|scale| {
                let normalized = scale.to_raw(reported);
                (scale, normalized, self.relative_difference(normalized, xbrl_value))
            })
            .filter(|(_, _, diff)| *diff <= self.close_tolerance)
            .min_by(|a, b| a.2.total_cmp(&b.2));

        best.map(|(scale, normalized, _)| {
            tracing::debug!(reported, %scale, "inferred scale");
            ScaleResolution {
                scale,
                normalized,
                inferred: true,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    fn fact(value: f64, unit: &str) -> XbrlFact {
        XbrlFact::new("us-gaap:Assets", value, unit)
    }

    fn extracted(value: f64, unit: Option<Scale>) -> ExtractedValue {
        ExtractedValue::new("Total assets", value, unit, "balance_sheet")
    }

    #[test]
    fn test_declared_scale_applied() {
        let resolver = ScaleResolver::default();
        let resolution = resolver
            .resolve(&extracted(45_680.0, Some(Scale::Millions)), &fact(45_680e6, "USD"))
            .unwrap();

        assert_eq!(resolution.scale, Scale::Millions);
        assert!(!resolution.inferred);
        assert_relative_eq!(resolution.normalized, 45_680e6);
    }

    #[test]
    fn test_declared_scale_kept_when_merely_different() {
        // 10% off is a mismatch to report, not a scale problem.
        let resolver = ScaleResolver::default();
        let resolution = resolver
            .resolve(&extracted(50_000.0, Some(Scale::Millions)), &fact(45_680e6, "USD"))
            .unwrap();
        assert_eq!(resolution.scale, Scale::Millions);
        assert!(!resolution.inferred);
    }

    #[test]
    fn test_missing_scale_inferred() {
        let resolver = ScaleResolver::default();
        let resolution = resolver
            .resolve(&extracted(45_680.0, None), &fact(45_680e6, "USD"))
            .unwrap();
        assert_eq!(resolution.scale, Scale::Millions);
        assert!(resolution.inferred);
    }

    #[test]
    fn test_wrong_declared_scale_corrected() {
        let resolver = ScaleResolver::default();
        let resolution = resolver
            .resolve(&extracted(45_680.0, Some(Scale::Raw)), &fact(45_680e6, "USD"))
            .unwrap();
        assert_eq!(resolution.scale, Scale::Millions);
        assert!(resolution.inferred);
    }

    #[rstest]
    #[case(Some(Scale::Raw))]
    #[case(Some(Scale::Millions))]
    #[case(None)]
    fn test_unresolvable_value(#[case] unit: Option<Scale>) {
        // 0.4 cannot be brought to 45,680M by any scale.
        let resolver = ScaleResolver::default();
        assert!(resolver.resolve(&extracted(0.4, unit), &fact(45_680e6, "USD")).is_none());
    }

    #[test]
    fn test_per_share_compared_raw() {
        let resolver = ScaleResolver::default();
        let eps = ExtractedValue::new("Basic", 6.11, Some(Scale::Millions), "income");
        let resolution = resolver.resolve(&eps, &fact(6.11, "USD/shares")).unwrap();
        assert_eq!(resolution.scale, Scale::Raw);
        assert!(!resolution.inferred);
        assert_relative_eq!(resolution.normalized, 6.11);
    }

    #[test]
    fn test_plausibility_bounds() {
        let resolver = ScaleResolver::default();
        assert!(resolver.is_plausible(100.0, 1.0));
        assert!(resolver.is_plausible(-1.0, 1.0));
        assert!(!resolver.is_plausible(101.0, 1.0));
        assert!(!resolver.is_plausible(0.001, 1.0));
        assert!(resolver.is_plausible(0.0, 1e9));
    }

    #[test]
    fn test_infer_picks_closest_scale() {
        let resolver = ScaleResolver::new(0.05, 100.0, 1e-9);
        let resolution = resolver.infer(391_035.0, 391_035_000.0).unwrap();
        assert_eq!(resolution.scale, Scale::Thousands);
        assert!(resolver.infer(391_035.0, 500_000_000.0).is_none());
    }
}
