//! Label Similarity
//!
//! Two measures feed the mapper's combined score:
//! - direct: character sequence similarity of the normalized strings
//! - semantic: keyword overlap (Jaccard index) against the concept's synonyms
//!
//! Both return values in `[0, 1]`.

use crate::synonyms::{ResolvedConcept, SynonymTable};
use std::collections::BTreeSet;

/// Lowercases, replaces every non-word character with a space and collapses
/// whitespace. "Stockholders’ equity:" becomes "stockholders equity".
pub fn normalize_label(text: &str) -> String {
    let replaced: String = text
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '_' { c } else { ' ' })
        .flat_map(char::to_lowercase)
        .collect();
    replaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Jaccard index of two keyword sets; 0 when both are empty.
pub fn jaccard(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(b).count() as f64 / union as f64
}

/// A similarity measure between a concept and a candidate label.
pub trait Similarity {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Similarity in `[0, 1]`.
    fn similarity(&self, concept: &ResolvedConcept<'_>, label: &str) -> f64;
}

/// Normalized indel similarity between the label and the closest of the
/// concept's names.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectSimilarity;

impl Similarity for DirectSimilarity {
    fn name(&self) -> &str {
        "direct"
    }

    fn similarity(&self, concept: &ResolvedConcept<'_>, label: &str) -> f64 {
        let b = normalize_label(label);
        if b.is_empty() {
            return 0.0;
        }
        concept
            .names()
            .map(normalize_label)
            .filter(|a| !a.is_empty())
            .map(|a| rapidfuzz::fuzz::ratio(a.chars(), b.chars()).clamp(0.0, 1.0))
            .fold(0.0, f64::max)
    }
}

/// Best keyword overlap between the label and any of the concept's phrases.
#[derive(Debug, Clone, Copy)]
pub struct SemanticSimilarity<'t> {
    table: &'t SynonymTable,
}

impl<'t> SemanticSimilarity<'t> {
    /// Creates a measure backed by `table`.
    pub const fn new(table: &'t SynonymTable) -> Self {
        Self { table }
    }
}

impl Similarity for SemanticSimilarity<'_> {
    fn name(&self) -> &str {
        "semantic"
    }

    fn similarity(&self, concept: &ResolvedConcept<'_>, label: &str) -> f64 {
        let label_keywords = self.table.keywords(label);
        concept
            .phrases()
            .map(|phrase| jaccard(&label_keywords, &self.table.keywords(phrase)))
            .fold(0.0, f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    fn set(words: &[&str]) -> BTreeSet<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[rstest]
    #[case("Current assets:", "current assets")]
    #[case("Total  non-current\tliabilities", "total non current liabilities")]
    #[case("Stockholders’ equity", "stockholders equity")]
    #[case("  ", "")]
    #[case("EPS (Basic)", "eps basic")]
    fn test_normalize_label(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(normalize_label(input), expected);
    }

    #[test]
    fn test_jaccard() {
        assert_relative_eq!(jaccard(&set(&["a", "b"]), &set(&["a", "b"])), 1.0);
        assert_relative_eq!(jaccard(&set(&["a", "b"]), &set(&["b", "c"])), 1.0 / 3.0);
        assert_relative_eq!(jaccard(&set(&[]), &set(&[])), 0.0);
    }

    #[test]
    fn test_direct_identical_after_normalization() {
        let table = SynonymTable::builtin();
        let concept = table.resolve("Current Assets");
        assert_relative_eq!(DirectSimilarity.similarity(&concept, "Current assets:"), 1.0);
        assert_relative_eq!(DirectSimilarity.similarity(&concept, "---"), 0.0);
    }

    #[test]
    fn test_direct_compares_given_element_name() {
        let table = SynonymTable::builtin();
        let concept = table.resolve("us-gaap:Liabilities");
        assert_eq!(concept.display_name, "Total Liabilities");
        assert_eq!(concept.names().collect::<Vec<_>>(), ["Total Liabilities", "Liabilities"]);
        assert_relative_eq!(DirectSimilarity.similarity(&concept, "Liabilities"), 1.0);
    }

    #[test]
    fn test_semantic_uses_synonyms() {
        let table = SynonymTable::builtin();
        let semantic = SemanticSimilarity::new(table);
        let revenue = table.resolve("Total Revenue");

        assert_relative_eq!(semantic.similarity(&revenue, "Total net sales"), 1.0);
        assert_relative_eq!(semantic.similarity(&revenue, "Goodwill"), 0.0);
        assert_eq!(semantic.name(), "semantic");
    }

    #[test]
    fn test_measures_stay_in_unit_interval() {
        let table = SynonymTable::builtin();
        let semantic = SemanticSimilarity::new(table);
        let labels = [
            "Total net sales",
            "Total current liabilities",
            "Basic",
            "(in millions)",
            "",
            "Net income (loss) attributable to common stockholders",
        ];
        for entry in table.concepts() {
            let concept = table.resolve(&entry.name);
            for label in labels {
                for value in [
                    DirectSimilarity.similarity(&concept, label),
                    semantic.similarity(&concept, label),
                ] {
                    assert!((0.0..=1.0).contains(&value), "{} / {label}: {value}", entry.name);
                }
            }
        }
    }
}
