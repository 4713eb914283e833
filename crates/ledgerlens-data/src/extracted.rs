//! Values extracted from parsed filing tables.
//!
//! Table extraction itself happens elsewhere (text-first parsers, layout-aware
//! parsers, document-AI services). Whatever produced the tables, they reach
//! this module as CSV: either normalized rows (`label,value,unit,source`) or a
//! raw table whose first column holds the line-item labels.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::io::Read;
use std::path::Path;
use std::sync::LazyLock;

use crate::error::{DataError, Result};
use crate::scale::{Scale, parse_declared_scale};

/// A plain decimal, optionally followed by a footnote marker such as "(1)".
static AMOUNT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<number>-?(?:\d+(?:\.\d+)?|\.\d+))(?:\(\d\))?$").expect("valid amount regex")
});

/// Value columns inspected after the label column of a raw table.
const MAX_VALUE_COLUMNS: usize = 4;

/// Cells at or below this magnitude are treated as empty (stray footnote digits).
const MIN_CELL_MAGNITUDE: f64 = 0.01;

/// Rows scanned for a caption such as "(in millions)" before the data starts.
const CAPTION_SCAN_ROWS: usize = 3;

/// Column headings such as "2024" in this range are years, not amounts.
const HEADER_YEARS: std::ops::RangeInclusive<u32> = 1900..=2100;

/// True for a bare four-digit year cell.
fn is_year_cell(cell: &str) -> bool {
    cell.len() == 4
        && cell.bytes().all(|b| b.is_ascii_digit())
        && cell.parse().is_ok_and(|year| HEADER_YEARS.contains(&year))
}

/// A single figure read from a parsed filing table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedValue {
    /// Line-item label as printed in the table (e.g., "Total current assets")
    pub label: String,

    /// Figure as printed, in the table's own scale
    pub value: f64,

    /// Declared scale of the figure; `None` when the table did not say
    pub unit: Option<Scale>,

    /// Table or page identifier the figure came from
    pub source: String,
}

impl ExtractedValue {
    /// Creates a new extracted value.
    pub fn new(
        label: impl Into<String>,
        value: f64,
        unit: Option<Scale>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            label: label.into(),
            value,
            unit,
            source: source.into(),
        }
    }

    /// Value in raw units, if the scale is declared.
    pub fn raw_value(&self) -> Option<f64> {
        self.unit.map(|scale| scale.to_raw(self.value))
    }
}

/// All extracted values of one filing, in the order they were read.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractedValueStore {
    values: Vec<ExtractedValue>,
}

#[derive(Debug, Deserialize)]
struct ValueRow {
    label: String,
    value: String,
    #[serde(default)]
    unit: String,
    #[serde(default)]
    source: String,
}

impl ExtractedValueStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a value. Rows with blank labels are ignored.
    pub fn push(&mut self, value: ExtractedValue) {
        if value.label.trim().is_empty() {
            return;
        }
        self.values.push(value);
    }

    /// Appends every value from another store, keeping order.
    pub fn extend(&mut self, other: Self) {
        for value in other.values {
            self.push(value);
        }
    }

    /// Number of stored values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true when the store holds no values.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterates over stored values in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = &ExtractedValue> {
        self.values.iter()
    }

    /// Distinct labels in first-seen order.
    pub fn labels(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.values
            .iter()
            .map(|v| v.label.as_str())
            .filter(|label| seen.insert(*label))
            .collect()
    }

    /// First value carrying exactly this label.
    pub fn find(&self, label: &str) -> Option<&ExtractedValue> {
        self.values.iter().find(|v| v.label == label)
    }

    /// Value with this label read from a specific source table.
    pub fn find_in(&self, label: &str, source: &str) -> Option<&ExtractedValue> {
        self.values
            .iter()
            .find(|v| v.label == label && v.source == source)
    }

    /// Reads normalized rows with the columns `label,value,unit,source`.
    ///
    /// The `unit` column may be blank, which leaves the scale undeclared.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut store = Self::new();
        for (line, row) in rdr.deserialize::<ValueRow>().enumerate() {
            let row = row?;
            let Some(value) = parse_amount(&row.value) else {
                tracing::debug!(line = line + 2, label = %row.label, "skipping row without amount");
                continue;
            };
            let unit = parse_declared_scale(&row.unit)?;
            store.push(ExtractedValue::new(row.label, value, unit, row.source));
        }
        Ok(store)
    }

    /// Reads normalized rows from a CSV file.
    pub fn from_csv_path(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_csv_reader(file)
    }

    /// Reads a raw table exported by a PDF parser.
    ///
    /// The first column holds labels; the value of a row is the first numeric
    /// cell among the next few columns. The scale is `declared` when given,
    /// otherwise it is detected from the header and leading caption rows.
    pub fn from_table_reader<R: Read>(
        source: &str,
        reader: R,
        declared: Option<Scale>,
    ) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let records = rdr.records().collect::<std::result::Result<Vec<_>, _>>()?;

        let detected = records
            .iter()
            .take(CAPTION_SCAN_ROWS)
            .flat_map(|record| record.iter())
            .find_map(Scale::detect);
        let unit = declared.or(detected);
        if unit.is_none() {
            tracing::warn!(source, "table does not declare a scale");
        }

        let mut store = Self::new();
        let mut in_header = true;
        for record in &records {
            let Some(label) = record.get(0) else {
                continue;
            };
            if label.is_empty() {
                continue;
            }
            let cells: Vec<&str> = record
                .iter()
                .skip(1)
                .take(MAX_VALUE_COLUMNS)
                .filter(|cell| {
                    parse_amount(cell).is_some_and(|v| v.abs() > MIN_CELL_MAGNITUDE)
                })
                .collect();
            if cells.is_empty() {
                continue;
            }
            // Until the first data row, rows holding only years are column headings.
            if in_header && cells.iter().all(|cell| is_year_cell(cell)) {
                tracing::debug!(source, label, "skipping year heading row");
                continue;
            }
            in_header = false;
            if let Some(value) = cells.first().and_then(|cell| parse_amount(cell)) {
                store.push(ExtractedValue::new(label, value, unit, source));
            }
        }
        Ok(store)
    }

    /// Reads a raw table CSV file; the file stem becomes the source name.
    pub fn from_table_path(path: &Path, declared: Option<Scale>) -> Result<Self> {
        let source = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| DataError::Parse(format!("Invalid table path: {}", path.display())))?
            .to_string();
        let file = std::fs::File::open(path)?;
        Self::from_table_reader(&source, file, declared)
    }

    /// Reads every `*.csv` table in a directory, in file-name order.
    pub fn from_table_dir(dir: &Path, declared: Option<Scale>) -> Result<Self> {
        let mut paths = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().is_some_and(|ext| ext == "csv"))
            .collect::<Vec<_>>();
        paths.sort();

        let mut store = Self::new();
        for path in paths {
            match Self::from_table_path(&path, declared) {
                Ok(table) => store.extend(table),
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "skipping unreadable table"),
            }
        }
        Ok(store)
    }
}

impl FromIterator<ExtractedValue> for ExtractedValueStore {
    fn from_iter<T: IntoIterator<Item = ExtractedValue>>(iter: T) -> Self {
        let mut store = Self::new();
        for value in iter {
            store.push(value);
        }
        store
    }
}

/// Parses an amount as printed in a financial table.
///
/// Handles currency symbols, thousands separators, parenthesized negatives and
/// trailing footnote markers. Dashes and blanks mean "no value".
pub fn parse_amount(text: &str) -> Option<f64> {
    let cleaned: String = text
        .chars()
        .filter(|c| !matches!(c, '$' | '€' | '£' | ',') && !c.is_whitespace())
        .collect();
    let cleaned = cleaned.trim_end_matches(['*', '%']);

    let (negative, body) = match cleaned.strip_prefix('(').and_then(|s| s.strip_suffix(')')) {
        Some(inner) => (true, inner),
        None => (false, cleaned),
    };

    let caps = AMOUNT_RE.captures(body)?;
    let value: f64 = caps.name("number")?.as_str().parse().ok()?;
    Some(if negative { -value } else { value })
}
