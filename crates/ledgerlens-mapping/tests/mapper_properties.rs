//! Behavioral properties of the concept mapper over the embedded synonym table

use ledgerlens_data::{ExtractedValue, ExtractedValueStore, Scale};
use ledgerlens_mapping::{ConceptMapper, Confidence, MapperConfig, SynonymTable};
use rstest::rstest;

/// Labels as they appear in a typical 10-K income statement and balance sheet.
const FILING_LABELS: &[&str] = &[
    "Products",
    "Services",
    "Total net sales",
    "Total cost of sales",
    "Gross margin",
    "Research and development",
    "Total operating expenses",
    "Operating income",
    "Net income",
    "Basic",
    "Diluted",
    "Cash and cash equivalents",
    "Total current assets",
    "Total assets",
    "Total current liabilities",
    "Total non-current liabilities",
    "Total liabilities",
    "Total shareholders’ equity",
];

fn filing_store() -> ExtractedValueStore {
    FILING_LABELS
        .iter()
        .enumerate()
        .map(|(i, label)| {
            ExtractedValue::new(*label, 1_000.0 + i as f64, Some(Scale::Millions), "statements")
        })
        .collect()
}

#[test]
fn exact_label_is_high_confidence() {
    let table = SynonymTable::builtin();
    let mapper = ConceptMapper::with_defaults();

    for entry in table.concepts() {
        let mut labels = FILING_LABELS.to_vec();
        labels.push(entry.name.as_str());

        let mapping = mapper.map_concept(&entry.name, &labels);
        assert_eq!(mapping.confidence, Confidence::High, "{}", entry.name);
        assert!(mapping.score >= 0.90, "{}: {}", entry.name, mapping.score);
    }
}

#[rstest]
#[case("Liabilities", "Liabilities")]
#[case("Revenues", "Revenues")]
#[case("Assets", "Assets")]
#[case("us-gaap:Liabilities", "Liabilities")]
#[case("us-gaap:AssetsCurrent", "Assets Current")]
fn exact_element_label_is_high_confidence(#[case] concept: &str, #[case] label: &str) {
    let mapper = ConceptMapper::with_defaults();
    let labels = ["Liabilities", "Revenues", "Assets", "Assets Current"];

    let mapping = mapper.map_concept(concept, &labels);
    assert_eq!(mapping.matched_label.as_deref(), Some(label));
    assert_eq!(mapping.confidence, Confidence::High, "{concept}");
    assert!(mapping.score >= 0.90, "{concept}: {}", mapping.score);
}

#[test]
fn scores_stay_in_unit_interval() {
    let table = SynonymTable::builtin();
    let mapper = ConceptMapper::with_defaults();
    let concepts = table
        .concepts()
        .iter()
        .map(|e| e.name.as_str())
        .chain(["us-gaap:Goodwill", "Deferred revenue", ""]);

    let set = mapper.map_all(concepts, &filing_store());
    for mapping in &set.mappings {
        assert!((0.0..=1.0).contains(&mapping.score), "{}", mapping.concept);
        for candidate in &mapping.candidates {
            assert!((0.0..=1.0).contains(&candidate.score));
        }
    }
}

#[test]
fn mapping_is_idempotent() {
    let table = SynonymTable::builtin();
    let mapper = ConceptMapper::with_defaults();
    let store = filing_store();
    let concepts: Vec<&str> = table.concepts().iter().map(|e| e.name.as_str()).collect();

    let first = mapper.map_all(concepts.iter().copied(), &store);
    let second = mapper.map_all(concepts.iter().copied(), &store);
    assert_eq!(first, second);
}

#[test]
fn one_mapping_per_distinct_concept() {
    let mapper = ConceptMapper::with_defaults();
    let set = mapper.map_all(
        ["Net Income", "Gross Profit", "Net Income", "Unknown Line Item"],
        &filing_store(),
    );
    let concepts: Vec<&str> = set.mappings.iter().map(|m| m.concept.as_str()).collect();
    assert_eq!(concepts, vec!["Net Income", "Gross Profit", "Unknown Line Item"]);
}

#[test]
fn typical_filing_maps_expected_labels() {
    let mapper = ConceptMapper::with_defaults();
    let set = mapper.map_all(
        [
            "Total Revenue",
            "Cost of Revenue",
            "Gross Profit",
            "Total Assets",
            "Total Liabilities",
            "EPS Diluted",
        ],
        &filing_store(),
    );

    let matched = |concept: &str| {
        set.get(concept)
            .and_then(|m| m.matched_label.as_deref())
            .map(str::to_string)
    };
    assert_eq!(matched("Total Revenue").as_deref(), Some("Total net sales"));
    assert_eq!(matched("Cost of Revenue").as_deref(), Some("Total cost of sales"));
    assert_eq!(matched("Gross Profit").as_deref(), Some("Gross margin"));
    assert_eq!(matched("Total Assets").as_deref(), Some("Total assets"));
    assert_eq!(matched("Total Liabilities").as_deref(), Some("Total liabilities"));
    assert_eq!(matched("EPS Diluted").as_deref(), Some("Diluted"));
    assert_eq!(set.failed().count(), 0);
}

#[test]
fn stricter_threshold_fails_more_concepts() {
    let table = SynonymTable::builtin();
    let strict = ConceptMapper::new(
        table,
        MapperConfig {
            match_threshold: 0.85,
            ..MapperConfig::default()
        },
    );
    let mapping = strict.map_concept("Total Revenue", FILING_LABELS);
    assert_eq!(mapping.confidence, Confidence::Failed);
    assert_eq!(mapping.best_candidate().unwrap().label, "Total net sales");
}
