//! Concept Synonym Table
//!
//! Versioned mapping of financial concepts to the phrases filings use for
//! them, plus keyword groups that let different wordings of the same idea
//! ("net sales", "revenue") share a keyword. The table is plain TOML so that
//! scoring can be audited and a filer-specific table can replace the default.
//!
//! ```toml
//! version = "2024.2"
//!
//! [groups]
//! revenue = ["revenue", "sales", "net sales"]
//!
//! [[concept]]
//! name = "Total Revenue"
//! elements = ["us-gaap:Revenues"]
//! synonyms = ["total net sales", "net sales"]
//! ```

use crate::error::{MappingError, Result};
use crate::similarity::normalize_label;
use ledgerlens_data::concepts::humanize_element;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::Path;
use std::sync::LazyLock;

/// The synonym table shipped with the crate.
pub const DEFAULT_TABLE: &str = include_str!("../data/synonyms.toml");

static BUILTIN: LazyLock<SynonymTable> = LazyLock::new(|| {
    SynonymTable::from_toml_str(DEFAULT_TABLE).expect("embedded synonym table is valid")
});

/// One financial concept and the ways filings label it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConceptEntry {
    /// Display name (e.g., "Total Revenue")
    pub name: String,

    /// XBRL element names reported for this concept
    #[serde(default)]
    pub elements: Vec<String>,

    /// Label phrases used for this concept in filing tables
    #[serde(default)]
    pub synonyms: Vec<String>,
}

impl ConceptEntry {
    /// Returns true if `element` is one of this concept's XBRL elements.
    ///
    /// A bare local name ("Assets") matches a prefixed element ("us-gaap:Assets").
    pub fn has_element(&self, element: &str) -> bool {
        let local = local_name(element);
        self.elements
            .iter()
            .any(|e| e == element || local_name(e).eq_ignore_ascii_case(local))
    }
}

/// A concept resolved against the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConcept<'t> {
    /// Name the concept is scored and reported under
    pub display_name: String,

    /// The concept as given, in words ("us-gaap:Liabilities" becomes
    /// "Liabilities"); equal to `display_name` for unknown concepts
    pub given_name: String,

    /// Table entry, if the concept is known
    pub entry: Option<&'t ConceptEntry>,
}

impl ResolvedConcept<'_> {
    /// Names a label is compared with directly: the display name, then the
    /// given name when it differs.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.display_name.as_str()).chain(
            (self.given_name != self.display_name).then_some(self.given_name.as_str()),
        )
    }

    /// Names followed by the entry's synonyms.
    pub fn phrases(&self) -> impl Iterator<Item = &str> {
        self.names().chain(
            self.entry
                .into_iter()
                .flat_map(|entry| entry.synonyms.iter().map(String::as_str)),
        )
    }
}

#[derive(Debug, Deserialize)]
struct TableFile {
    version: String,
    #[serde(default)]
    groups: BTreeMap<String, Vec<String>>,
    #[serde(default, rename = "concept")]
    concepts: Vec<ConceptEntry>,
}

/// Versioned concept → synonym configuration.
#[derive(Debug, Clone)]
pub struct SynonymTable {
    version: String,
    groups: BTreeMap<String, Vec<String>>,
    concepts: Vec<ConceptEntry>,
}

impl SynonymTable {
    /// The embedded default table.
    pub fn builtin() -> &'static Self {
        &BUILTIN
    }

    /// Parses a table from TOML text.
    ///
    /// Group phrases are normalized on load. Fails when the version is blank,
    /// a concept has no name, or two concepts share a name.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let file: TableFile = toml::from_str(text)?;

        if file.version.trim().is_empty() {
            return Err(MappingError::InvalidTable(
                "version must not be empty".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for entry in &file.concepts {
            let key = normalize_label(&entry.name);
            if key.is_empty() {
                return Err(MappingError::InvalidTable(
                    "concept entry without a name".to_string(),
                ));
            }
            if !seen.insert(key) {
                return Err(MappingError::InvalidTable(format!(
                    "duplicate concept '{}'",
                    entry.name
                )));
            }
        }

        let groups = file
            .groups
            .into_iter()
            .map(|(group, phrases)| {
                let phrases = phrases
                    .iter()
                    .map(|p| normalize_label(p))
                    .filter(|p| !p.is_empty())
                    .collect();
                (normalize_label(&group), phrases)
            })
            .collect();

        Ok(Self {
            version: file.version.trim().to_string(),
            groups,
            concepts: file.concepts,
        })
    }

    /// Reads a table from a TOML file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| MappingError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Table version, recorded on every mapping set.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Concept entries in table order.
    pub fn concepts(&self) -> &[ConceptEntry] {
        &self.concepts
    }

    /// Keyword group names in sorted order.
    pub fn group_names(&self) -> Vec<&str> {
        self.groups.keys().map(String::as_str).collect()
    }

    /// Looks up a concept by display name (case and punctuation insensitive)
    /// or by XBRL element name.
    pub fn get(&self, concept: &str) -> Option<&ConceptEntry> {
        let key = normalize_label(concept);
        self.concepts
            .iter()
            .find(|entry| normalize_label(&entry.name) == key)
            .or_else(|| self.concepts.iter().find(|entry| entry.has_element(concept)))
    }

    /// Resolves a concept to its display name and entry.
    ///
    /// Unknown element names are turned into words ("us-gaap:AssetsCurrent"
    /// becomes "Assets Current") so they can still be scored.
    pub fn resolve(&self, concept: &str) -> ResolvedConcept<'_> {
        let given_name = humanize_element(concept.trim());
        match self.get(concept) {
            Some(entry) => ResolvedConcept {
                display_name: entry.name.clone(),
                given_name,
                entry: Some(entry),
            },
            None => ResolvedConcept {
                display_name: given_name.clone(),
                given_name,
                entry: None,
            },
        }
    }

    /// Keyword set of a label: its normalized words plus the name of every
    /// group whose phrase occurs in it on word boundaries.
    pub fn keywords(&self, text: &str) -> BTreeSet<String> {
        let normalized = normalize_label(text);
        let mut keywords: BTreeSet<String> =
            normalized.split(' ').filter(|w| !w.is_empty()).map(str::to_string).collect();

        let padded = format!(" {normalized} ");
        for (group, phrases) in &self.groups {
            if phrases.iter().any(|p| padded.contains(&format!(" {p} "))) {
                keywords.insert(group.clone());
            }
        }
        keywords
    }
}

impl Default for SynonymTable {
    fn default() -> Self {
        Self::builtin().clone()
    }
}

fn local_name(element: &str) -> &str {
    element.rsplit(':').next().unwrap_or(element)
}
