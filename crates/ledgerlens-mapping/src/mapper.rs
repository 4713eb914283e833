//! Concept Mapper
//!
//! For each XBRL concept, finds the extracted label that best describes it.
//!
//! The combined score is `direct_weight * direct + semantic_weight * semantic`
//! (0.4 / 0.6 by default), clamped to `[0, 1]`. The highest score wins and ties
//! go to the label seen first. Tier boundaries:
//!
//! | score | confidence |
//! |---|---|
//! | `< match_threshold` (0.30) | `Failed`, no match |
//! | `>= high_threshold` (0.90) | `High` |
//! | otherwise | `Medium` |
//!
//! An accepted match is downgraded to `Low` when it looks like a subtotal of
//! the concept: the concept is a total ("Total Liabilities") but the label
//! carries a qualifier the concept lacks ("Total non-current liabilities").

use crate::error::{MappingError, Result};
use crate::similarity::{DirectSimilarity, SemanticSimilarity, Similarity, normalize_label};
use crate::synonyms::{ResolvedConcept, SynonymTable};
use ledgerlens_data::ExtractedValueStore;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Qualifiers that narrow a total down to one of its parts.
const SUBTOTAL_QUALIFIERS: &[&str] = &["current", "non current", "noncurrent", "other"];

/// Confidence tier of a mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Confidence {
    /// Score at or above the high threshold
    High,
    /// Accepted score below the high threshold
    Medium,
    /// Accepted, but flagged as a likely wrong match
    Low,
    /// No label scored above the match threshold
    Failed,
}

impl Confidence {
    /// All tiers, best first.
    pub const fn all() -> [Self; 4] {
        [Self::High, Self::Medium, Self::Low, Self::Failed]
    }

    /// Returns true for every tier except `Failed`.
    pub const fn is_match(&self) -> bool {
        !matches!(self, Self::Failed)
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::High => write!(f, "High"),
            Self::Medium => write!(f, "Medium"),
            Self::Low => write!(f, "Low"),
            Self::Failed => write!(f, "Failed"),
        }
    }
}

/// Reason an accepted mapping deserves a second look.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MappingFlag {
    /// The label looks like a subtotal of the concept (e.g., "current" part of a total)
    PossibleSubtotal,
}

impl fmt::Display for MappingFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PossibleSubtotal => write!(f, "possible subtotal"),
        }
    }
}

/// A scored label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// Extracted label
    pub label: String,
    /// Combined score
    pub score: f64,
    /// Direct (sequence) similarity
    pub direct: f64,
    /// Semantic (keyword) similarity
    pub semantic: f64,
}

/// Mapper configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapperConfig {
    /// Weight of the direct similarity (default: 0.4)
    pub direct_weight: f64,
    /// Weight of the semantic similarity (default: 0.6)
    pub semantic_weight: f64,
    /// Scores below this are `Failed` (default: 0.30)
    pub match_threshold: f64,
    /// Scores at or above this are `High` (default: 0.90)
    pub high_threshold: f64,
    /// Candidates kept on each mapping for diagnostics (default: 3)
    pub max_candidates: usize,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            direct_weight: 0.4,
            semantic_weight: 0.6,
            match_threshold: 0.30,
            high_threshold: 0.90,
            max_candidates: 3,
        }
    }
}

impl MapperConfig {
    /// Checks weights and thresholds.
    pub fn validate(&self) -> Result<()> {
        if self.direct_weight < 0.0 || self.semantic_weight < 0.0 {
            return Err(MappingError::InvalidConfig(
                "weights must be non-negative".to_string(),
            ));
        }
        if self.direct_weight + self.semantic_weight <= 0.0 {
            return Err(MappingError::InvalidConfig(
                "at least one weight must be positive".to_string(),
            ));
        }
        let unit = 0.0..=1.0;
        if !unit.contains(&self.match_threshold) || !unit.contains(&self.high_threshold) {
            return Err(MappingError::InvalidConfig(
                "thresholds must lie in [0, 1]".to_string(),
            ));
        }
        if self.match_threshold > self.high_threshold {
            return Err(MappingError::InvalidConfig(format!(
                "match threshold {} exceeds high threshold {}",
                self.match_threshold, self.high_threshold
            )));
        }
        Ok(())
    }
}

/// Result of mapping one concept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConceptMapping {
    /// Concept as given to the mapper (display name or element name)
    pub concept: String,
    /// Name the concept was scored under
    pub display_name: String,
    /// Best label, absent when `Failed`
    pub matched_label: Option<String>,
    /// Source table of the matched value
    pub source: Option<String>,
    /// Combined score of the best label; for `Failed` mappings the best score seen
    pub score: f64,
    /// Direct similarity of the best label
    pub direct: f64,
    /// Semantic similarity of the best label
    pub semantic: f64,
    /// Confidence tier
    pub confidence: Confidence,
    /// Review flags on an accepted match
    pub flags: Vec<MappingFlag>,
    /// Best-scoring labels, highest first
    pub candidates: Vec<Candidate>,
}

impl ConceptMapping {
    /// Returns true if a label was accepted.
    pub fn is_matched(&self) -> bool {
        self.confidence.is_match() && self.matched_label.is_some()
    }

    /// Best label considered, accepted or not.
    pub fn best_candidate(&self) -> Option<&Candidate> {
        self.candidates.first()
    }
}

/// All mappings of one filing run, one per distinct concept.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MappingSet {
    /// Mappings in input concept order
    pub mappings: Vec<ConceptMapping>,
    /// Version of the synonym table that produced the set
    pub table_version: String,
}

impl MappingSet {
    /// Number of mappings.
    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    /// Returns true when no concept was mapped.
    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    /// Mapping for a concept.
    pub fn get(&self, concept: &str) -> Option<&ConceptMapping> {
        self.mappings.iter().find(|m| m.concept == concept)
    }

    /// Mappings with an accepted label.
    pub fn successful(&self) -> impl Iterator<Item = &ConceptMapping> {
        self.mappings.iter().filter(|m| m.is_matched())
    }

    /// Mappings that found no adequate label.
    pub fn failed(&self) -> impl Iterator<Item = &ConceptMapping> {
        self.mappings.iter().filter(|m| !m.is_matched())
    }

    /// Accepted mappings carrying at least one flag.
    pub fn flagged(&self) -> impl Iterator<Item = &ConceptMapping> {
        self.successful().filter(|m| !m.flags.is_empty())
    }

    /// Number of mappings in a tier.
    pub fn count(&self, confidence: Confidence) -> usize {
        self.mappings
            .iter()
            .filter(|m| m.confidence == confidence)
            .count()
    }
}

/// Maps XBRL concepts to extracted labels.
#[derive(Debug, Clone, Copy)]
pub struct ConceptMapper<'t> {
    table: &'t SynonymTable,
    config: MapperConfig,
    direct: DirectSimilarity,
    semantic: SemanticSimilarity<'t>,
}

impl<'t> ConceptMapper<'t> {
    /// Creates a mapper over a synonym table.
    pub const fn new(table: &'t SynonymTable, config: MapperConfig) -> Self {
        Self {
            table,
            config,
            direct: DirectSimilarity,
            semantic: SemanticSimilarity::new(table),
        }
    }

    /// Mapper configuration.
    pub const fn config(&self) -> &MapperConfig {
        &self.config
    }

    /// Synonym table in use.
    pub const fn table(&self) -> &'t SynonymTable {
        self.table
    }

    /// Scores one label against a resolved concept.
    pub fn score_label(&self, concept: &ResolvedConcept<'_>, label: &str) -> Candidate {
        let direct = self.direct.similarity(concept, label);
        let semantic = self.semantic.similarity(concept, label);
        let score = (self.config.direct_weight * direct + self.config.semantic_weight * semantic)
            .clamp(0.0, 1.0);
        Candidate {
            label: label.to_string(),
            score,
            direct,
            semantic,
        }
    }

    /// Maps one concept against the labels of a filing.
    ///
    /// Always returns a mapping; `Failed` when no label reaches the match
    /// threshold (or there are no labels).
    pub fn map_concept(&self, concept: &str, labels: &[&str]) -> ConceptMapping {
        let resolved = self.table.resolve(concept);

        let mut scored: Vec<Candidate> = labels
            .iter()
            .map(|label| self.score_label(&resolved, label))
            .collect();
        // Stable: equal scores keep first-seen order.
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(self.config.max_candidates.max(1));

        let (score, direct, semantic) = scored
            .first()
            .map_or((0.0, 0.0, 0.0), |best| (best.score, best.direct, best.semantic));

        let accepted = scored
            .first()
            .filter(|best| best.score >= self.config.match_threshold);

        let (matched_label, confidence, flags) = match accepted {
            Some(best) => {
                let flags = review_flags(&resolved, &best.label);
                let confidence = if !flags.is_empty() {
                    Confidence::Low
                } else if best.score >= self.config.high_threshold {
                    Confidence::High
                } else {
                    Confidence::Medium
                };
                (Some(best.label.clone()), confidence, flags)
            }
            None => (None, Confidence::Failed, Vec::new()),
        };

        match (&matched_label, confidence) {
            (Some(label), Confidence::Low) => tracing::warn!(
                concept,
                label = %label,
                score,
                "match looks like a subtotal of the concept"
            ),
            (Some(label), _) => {
                tracing::debug!(concept, label = %label, score, %confidence, "mapped concept")
            }
            (None, _) => tracing::debug!(concept, best_score = score, "no adequate label"),
        }

        ConceptMapping {
            concept: concept.to_string(),
            display_name: resolved.display_name,
            matched_label,
            source: None,
            score,
            direct,
            semantic,
            confidence,
            flags,
            candidates: scored,
        }
    }

    /// Maps every distinct concept (first-seen order) against the labels in
    /// `store`, recording the source table of each matched label.
    pub fn map_all<'c, I>(&self, concepts: I, store: &ExtractedValueStore) -> MappingSet
    where
        I: IntoIterator<Item = &'c str>,
    {
        let labels = store.labels();
        let mut seen = HashSet::new();

        let mappings: Vec<ConceptMapping> = concepts
            .into_iter()
            .filter(|concept| seen.insert(*concept))
            .map(|concept| {
                let mut mapping = self.map_concept(concept, &labels);
                mapping.source = mapping
                    .matched_label
                    .as_deref()
                    .and_then(|label| store.find(label))
                    .map(|value| value.source.clone());
                mapping
            })
            .collect();

        let set = MappingSet {
            mappings,
            table_version: self.table.version().to_string(),
        };
        tracing::info!(
            concepts = set.len(),
            mapped = set.successful().count(),
            failed = set.failed().count(),
            table_version = %set.table_version,
            "concept mapping complete"
        );
        set
    }
}

impl ConceptMapper<'static> {
    /// Mapper over the embedded table with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(SynonymTable::builtin(), MapperConfig::default())
    }
}

/// Flags an accepted label that names a part of a total concept.
fn review_flags(concept: &ResolvedConcept<'_>, label: &str) -> Vec<MappingFlag> {
    let concept_text = format!(" {} ", normalize_label(&concept.display_name));
    let label_text = format!(" {} ", normalize_label(label));

    if !concept_text.contains(" total ") {
        return Vec::new();
    }

    let narrows = SUBTOTAL_QUALIFIERS.iter().any(|q| {
        let q = format!(" {q} ");
        label_text.contains(&q) && !concept_text.contains(&q)
    });
    if narrows {
        vec![MappingFlag::PossibleSubtotal]
    } else {
        Vec::new()
    }
}
