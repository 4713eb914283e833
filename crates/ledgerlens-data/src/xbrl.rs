//! XBRL facts for a single filing.
//!
//! Facts can be loaded from three sources:
//! - an XBRL instance document (`parse_xml`), the format filed with the SEC
//! - the SEC company-facts JSON API (`parse_json`)
//! - a flat CSV export (`from_csv_reader`) with the columns
//!   `concept,value,unit,period_start,period_end,context`
//!
//! # Example
//!
//! ```
//! use ledgerlens_data::xbrl::XbrlDocument;
//!
//! let xml = r#"<xbrl xmlns:us-gaap="http://fasb.org/us-gaap/2024">
//!   <context id="c1"><period><instant>2024-09-28</instant></period></context>
//!   <unit id="usd"><measure>iso4217:USD</measure></unit>
//!   <us-gaap:Assets contextRef="c1" unitRef="usd" decimals="-6">364980000000</us-gaap:Assets>
//! </xbrl>"#;
//!
//! let doc = XbrlDocument::parse_xml(xml).unwrap();
//! let fact = doc.get_latest_fact("us-gaap:Assets").unwrap();
//! assert_eq!(fact.value, 364_980_000_000.0);
//! assert_eq!(fact.unit, "USD");
//! ```

use crate::error::{DataError, Result};
use chrono::NaiveDate;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::io::Read;
use std::path::Path;

/// Reporting period of a fact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Period {
    /// Start of the period (None for instant facts like balance sheet items)
    pub start: Option<NaiveDate>,

    /// End of the period, or the instant itself
    pub end: NaiveDate,
}

impl Period {
    /// Creates an instant period.
    pub const fn instant(date: NaiveDate) -> Self {
        Self {
            start: None,
            end: date,
        }
    }

    /// Creates a duration period.
    pub const fn duration(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start: Some(start),
            end,
        }
    }

    /// Returns true if this is an instant (point-in-time) period
    pub const fn is_instant(&self) -> bool {
        self.start.is_none()
    }

    /// Returns true if this is a duration period
    pub const fn is_duration(&self) -> bool {
        self.start.is_some()
    }

    /// Returns the duration in days if this is a duration period
    pub fn duration_days(&self) -> Option<i64> {
        self.start
            .map(|start| self.end.signed_duration_since(start).num_days())
    }
}

/// Represents a single XBRL fact (data point).
///
/// An XBRL fact is a financial data point with context about the reporting period,
/// unit of measure, and the specific financial concept being reported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct XbrlFact {
    /// The XBRL concept name (e.g., "us-gaap:NetIncomeLoss" or "Net Income")
    pub concept: String,

    /// The numeric value of the fact, in raw units
    pub value: f64,

    /// Unit of measure (e.g., "USD", "USD/shares", "shares")
    pub unit: String,

    /// Reporting period; None when the context could not be resolved
    pub period: Option<Period>,

    /// Context identifier the fact was reported in
    pub context: Option<String>,

    /// True when the context carries dimension members (segment breakdowns)
    #[serde(default)]
    pub dimensional: bool,

    /// Reported precision (e.g., -6 for "rounded to millions")
    #[serde(default)]
    pub decimals: Option<i32>,

    /// Form type (e.g., "10-K", "10-Q")
    #[serde(default)]
    pub form: Option<String>,

    /// Fiscal year
    #[serde(default)]
    pub fiscal_year: Option<i32>,

    /// Fiscal period (e.g., "FY", "Q1", "Q2", "Q3", "Q4")
    #[serde(default)]
    pub fiscal_period: Option<String>,
}

impl XbrlFact {
    /// Creates a fact without period or context.
    pub fn new(concept: impl Into<String>, value: f64, unit: impl Into<String>) -> Self {
        Self {
            concept: concept.into(),
            value,
            unit: unit.into(),
            period: None,
            context: None,
            dimensional: false,
            decimals: None,
            form: None,
            fiscal_year: None,
            fiscal_period: None,
        }
    }

    /// Sets the reporting period.
    #[must_use]
    pub const fn with_period(mut self, period: Period) -> Self {
        self.period = Some(period);
        self
    }

    /// Sets the context identifier.
    #[must_use]
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Returns true when both period and context are known.
    pub const fn has_context(&self) -> bool {
        self.period.is_some() && self.context.is_some()
    }

    /// Returns true if this is an instant fact (point-in-time, like balance sheet items)
    pub fn is_instant(&self) -> bool {
        self.period.is_some_and(|p| p.is_instant())
    }

    /// Returns true if this is a duration fact (period-based, like income statement items)
    pub fn is_duration(&self) -> bool {
        self.period.is_some_and(|p| p.is_duration())
    }

    /// Returns the duration in days if this is a duration fact
    pub fn duration_days(&self) -> Option<i64> {
        self.period.and_then(|p| p.duration_days())
    }

    /// End date of the reporting period, if known
    pub fn period_end(&self) -> Option<NaiveDate> {
        self.period.map(|p| p.end)
    }

    /// Returns true for per-share units such as "USD/shares".
    pub fn is_per_share(&self) -> bool {
        self.unit.contains('/')
    }
}

/// Represents a collection of XBRL facts from a filing or company.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct XbrlDocument {
    /// All facts in the document
    pub facts: Vec<XbrlFact>,

    /// Company name
    pub entity_name: Option<String>,

    /// CIK (Central Index Key)
    pub cik: Option<String>,
}

impl XbrlDocument {
    /// Creates a new empty XBRL document
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a document from a list of facts.
    pub fn from_facts(facts: Vec<XbrlFact>) -> Self {
        Self {
            facts,
            ..Self::default()
        }
    }

    /// Parses XBRL data from SEC JSON API format
    ///
    /// The SEC JSON format is documented at: <https://www.sec.gov/edgar/sec-api-documentation>
    pub fn parse_json(json: &str) -> Result<Self> {
        let api_response: SecApiResponse = serde_json::from_str(json)
            .map_err(|e| DataError::Parse(format!("Failed to parse SEC JSON: {}", e)))?;

        let mut facts = Vec::new();
        let entity_name = Some(api_response.entity_name.clone());
        let cik = Some(api_response.cik.to_string());

        // Process each taxonomy (us-gaap, dei, etc.)
        for (taxonomy, taxonomy_facts) in &api_response.facts {
            for (concept_name, concept_data) in &taxonomy_facts.0 {
                let full_concept = format!("{}:{}", taxonomy, concept_name);

                for (unit, unit_facts) in &concept_data.units {
                    for fact_data in &unit_facts.0 {
                        let end = parse_date(&fact_data.end)?;
                        let start = fact_data.start.as_deref().map(parse_date).transpose()?;

                        facts.push(XbrlFact {
                            concept: full_concept.clone(),
                            value: fact_data.val,
                            unit: unit.clone(),
                            period: Some(Period { start, end }),
                            context: fact_data.accn.clone(),
                            dimensional: false,
                            decimals: None,
                            form: fact_data.form.clone(),
                            fiscal_year: fact_data.fy,
                            fiscal_period: fact_data.fp.clone(),
                        });
                    }
                }
            }
        }

        Ok(Self {
            facts,
            entity_name,
            cik,
        })
    }

    /// Parses an XBRL instance document.
    ///
    /// Contexts and units are resolved after the whole document is read, so
    /// facts may appear before the contexts they reference. Facts whose
    /// context is missing keep `period` and `context` unset. Nil and
    /// non-numeric facts are skipped.
    pub fn parse_xml(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut contexts: HashMap<String, ContextInfo> = HashMap::new();
        let mut units: HashMap<String, String> = HashMap::new();
        let mut raw_facts: Vec<RawFact> = Vec::new();
        let mut entity_name = None;
        let mut cik = None;

        let mut state = XmlState::Outside;
        let mut text = String::new();
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Eof => break,
                Event::Start(e) => {
                    text.clear();
                    state = state.enter(&e)?;
                }
                Event::Empty(e) => {
                    if let XmlState::Context(ref mut ctx, _) = state {
                        if is_dimension_member(e.local_name().as_ref()) {
                            ctx.dimensional = true;
                        }
                    }
                }
                Event::Text(t) => text.push_str(&t.unescape()?),
                Event::CData(t) => text.push_str(&String::from_utf8_lossy(&t)),
                Event::End(e) => {
                    let local = e.local_name();
                    state = state.leave(
                        local.as_ref(),
                        text.trim(),
                        &mut contexts,
                        &mut units,
                        &mut raw_facts,
                    )?;
                    if let Some((key, value)) = dei_value(e.name().as_ref(), text.trim()) {
                        match key {
                            DeiField::EntityName => entity_name = Some(value),
                            DeiField::Cik => cik = Some(value),
                        }
                    }
                    text.clear();
                }
                _ => {}
            }
            buf.clear();
        }

        let facts = raw_facts
            .into_iter()
            .filter_map(|raw| raw.resolve(&contexts, &units))
            .collect::<Vec<_>>();

        if facts.is_empty() {
            tracing::warn!("instance document contains no numeric facts");
        }

        Ok(Self {
            facts,
            entity_name,
            cik,
        })
    }

    /// Reads facts from a flat CSV export.
    ///
    /// Required columns: `concept`, `value`. Optional: `unit`, `period_start`,
    /// `period_end`, `context`. A row without `period_end` has no period.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut facts = Vec::new();
        for row in rdr.deserialize::<FactRow>() {
            let row = row?;
            let end = non_empty(&row.period_end).map(parse_date).transpose()?;
            let start = non_empty(&row.period_start).map(parse_date).transpose()?;
            facts.push(XbrlFact {
                concept: row.concept,
                value: row.value,
                unit: row.unit,
                period: end.map(|end| Period { start, end }),
                context: non_empty(&row.context).map(str::to_string),
                dimensional: false,
                decimals: None,
                form: None,
                fiscal_year: None,
                fiscal_period: None,
            });
        }
        Ok(Self::from_facts(facts))
    }

    /// Loads a document from a file, choosing the parser by extension
    /// (`.xml`/`.xbrl`, `.json`, `.csv`).
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "xml" | "xbrl" => Self::parse_xml(&std::fs::read_to_string(path)?),
            "json" => Self::parse_json(&std::fs::read_to_string(path)?),
            "csv" => Self::from_csv_reader(std::fs::File::open(path)?),
            other => Err(DataError::XbrlParse(format!(
                "Unsupported XBRL file type '{}': {}",
                other,
                path.display()
            ))),
        }
    }

    /// Gets a specific fact by concept name and period end date
    pub fn get_fact(&self, concept: &str, period_end: NaiveDate) -> Option<&XbrlFact> {
        self.facts
            .iter()
            .find(|f| f.concept == concept && f.period_end() == Some(period_end))
    }

    /// Gets the most recent fact for a given concept
    pub fn get_latest_fact(&self, concept: &str) -> Option<&XbrlFact> {
        self.facts
            .iter()
            .filter(|f| f.concept == concept)
            .max_by_key(|f| f.period_end())
    }

    /// Gets all facts for a given concept, sorted by period end date (newest first)
    pub fn get_facts_by_concept(&self, concept: &str) -> Vec<&XbrlFact> {
        let mut facts: Vec<&XbrlFact> =
            self.facts.iter().filter(|f| f.concept == concept).collect();
        facts.sort_by(|a, b| b.period_end().cmp(&a.period_end()));
        facts
    }

    /// Gets facts for a specific fiscal year
    pub fn get_facts_by_fiscal_year(&self, concept: &str, fiscal_year: i32) -> Vec<&XbrlFact> {
        self.facts
            .iter()
            .filter(|f| f.concept == concept && f.fiscal_year == Some(fiscal_year))
            .collect()
    }

    /// Gets facts by form type (e.g., "10-K", "10-Q")
    pub fn get_facts_by_form(&self, concept: &str, form: &str) -> Vec<&XbrlFact> {
        self.facts
            .iter()
            .filter(|f| f.concept == concept && f.form.as_deref() == Some(form))
            .collect()
    }

    /// Gets all available concepts in the document, sorted
    pub fn get_concepts(&self) -> Vec<String> {
        let mut concepts: Vec<String> = self.facts.iter().map(|f| f.concept.clone()).collect();
        concepts.sort();
        concepts.dedup();
        concepts
    }

    /// Distinct concepts in the order they first appear.
    pub fn concepts_in_order(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.facts
            .iter()
            .map(|f| f.concept.as_str())
            .filter(|c| seen.insert(*c))
            .collect()
    }

    /// Picks the fact a concept should be verified against.
    ///
    /// Only facts with a resolved period and context qualify. When
    /// `target_end` is given the period must end on that date. Among the
    /// candidates, non-dimensional facts win, then the latest period end, then
    /// the longest duration (annual over quarterly); remaining ties keep
    /// document order.
    pub fn primary_fact(&self, concept: &str, target_end: Option<NaiveDate>) -> Option<&XbrlFact> {
        self.facts
            .iter()
            .filter(|f| f.concept == concept && f.has_context())
            .filter(|f| target_end.is_none_or(|end| f.period_end() == Some(end)))
            .rev()
            .max_by_key(|f| (!f.dimensional, f.period_end(), f.duration_days().unwrap_or(0)))
    }

    /// Keeps only facts whose period ends on `end`, plus facts without a
    /// period so they can still be reported as lacking context.
    #[must_use]
    pub fn filter_period_end(&self, end: NaiveDate) -> Self {
        Self {
            facts: self
                .facts
                .iter()
                .filter(|f| f.period.is_none_or(|p| p.end == end))
                .cloned()
                .collect(),
            entity_name: self.entity_name.clone(),
            cik: self.cik.clone(),
        }
    }
}

fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|e| DataError::InvalidDate {
        value: value.to_string(),
        reason: e.to_string(),
    })
}

fn non_empty(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

fn is_dimension_member(local: &[u8]) -> bool {
    matches!(local, b"explicitMember" | b"typedMember")
}

fn attribute(e: &BytesStart<'_>, local: &[u8]) -> Result<Option<String>> {
    for attr in e.attributes() {
        let attr = attr.map_err(|err| DataError::XmlParse(err.to_string()))?;
        if attr.key.local_name().as_ref() == local {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

#[derive(Debug, Default)]
struct ContextInfo {
    start: Option<String>,
    end: Option<String>,
    instant: Option<String>,
    dimensional: bool,
}

impl ContextInfo {
    fn period(&self) -> Option<Period> {
        let parse = |s: &Option<String>| s.as_deref().and_then(|v| parse_date(v).ok());
        if let Some(instant) = parse(&self.instant) {
            return Some(Period::instant(instant));
        }
        parse(&self.end).map(|end| Period {
            start: parse(&self.start),
            end,
        })
    }
}

#[derive(Debug, Default)]
struct UnitInfo {
    numerator: Vec<String>,
    denominator: Vec<String>,
    in_denominator: bool,
}

impl UnitInfo {
    fn label(&self) -> String {
        let join = |parts: &[String]| parts.join("*");
        if self.denominator.is_empty() {
            join(&self.numerator)
        } else {
            format!("{}/{}", join(&self.numerator), join(&self.denominator))
        }
    }
}

#[derive(Debug)]
struct RawFact {
    concept: String,
    value: String,
    context_ref: String,
    unit_ref: Option<String>,
    decimals: Option<i32>,
}

impl RawFact {
    fn resolve(
        self,
        contexts: &HashMap<String, ContextInfo>,
        units: &HashMap<String, String>,
    ) -> Option<XbrlFact> {
        let Ok(value) = self.value.trim().parse::<f64>() else {
            tracing::trace!(concept = %self.concept, "skipping non-numeric fact");
            return None;
        };

        let unit = self
            .unit_ref
            .as_ref()
            .map(|id| units.get(id).cloned().unwrap_or_else(|| id.clone()))
            .unwrap_or_default();

        let ctx = contexts.get(&self.context_ref);
        let period = ctx.and_then(ContextInfo::period);
        if ctx.is_none() {
            tracing::debug!(concept = %self.concept, context = %self.context_ref, "fact references unknown context");
        }

        Some(XbrlFact {
            concept: self.concept,
            value,
            unit,
            period,
            context: ctx.map(|_| self.context_ref),
            dimensional: ctx.is_some_and(|c| c.dimensional),
            decimals: self.decimals,
            form: None,
            fiscal_year: None,
            fiscal_period: None,
        })
    }
}

/// Which part of the instance document the reader is inside.
#[derive(Debug)]
enum XmlState {
    Outside,
    Context(ContextInfo, String),
    Unit(UnitInfo, String),
    Fact(RawFact, usize),
}

impl XmlState {
    fn enter(self, e: &BytesStart<'_>) -> Result<Self> {
        let local = e.local_name();
        let local = local.as_ref();
        Ok(match self {
            Self::Outside => match local {
                b"context" => match attribute(e, b"id")? {
                    Some(id) => Self::Context(ContextInfo::default(), id),
                    None => Self::Outside,
                },
                b"unit" => match attribute(e, b"id")? {
                    Some(id) => Self::Unit(UnitInfo::default(), id),
                    None => Self::Outside,
                },
                _ => match attribute(e, b"contextRef")? {
                    Some(context_ref) if attribute(e, b"nil")?.as_deref() != Some("true") => {
                        Self::Fact(
                            RawFact {
                                concept: String::from_utf8_lossy(e.name().as_ref()).into_owned(),
                                value: String::new(),
                                context_ref,
                                unit_ref: attribute(e, b"unitRef")?,
                                decimals: attribute(e, b"decimals")?
                                    .and_then(|d| d.trim().parse().ok()),
                            },
                            0,
                        )
                    }
                    _ => Self::Outside,
                },
            },
            Self::Context(mut ctx, id) => {
                if is_dimension_member(local) {
                    ctx.dimensional = true;
                }
                Self::Context(ctx, id)
            }
            Self::Unit(mut unit, id) => {
                if local == b"unitDenominator" {
                    unit.in_denominator = true;
                } else if local == b"unitNumerator" {
                    unit.in_denominator = false;
                }
                Self::Unit(unit, id)
            }
            Self::Fact(fact, depth) => Self::Fact(fact, depth + 1),
        })
    }

    fn leave(
        self,
        local: &[u8],
        text: &str,
        contexts: &mut HashMap<String, ContextInfo>,
        units: &mut HashMap<String, String>,
        facts: &mut Vec<RawFact>,
    ) -> Result<Self> {
        Ok(match self {
            Self::Outside => Self::Outside,
            Self::Context(mut ctx, id) => match local {
                b"context" => {
                    contexts.insert(id, ctx);
                    Self::Outside
                }
                b"startDate" => {
                    ctx.start = Some(text.to_string());
                    Self::Context(ctx, id)
                }
                b"endDate" => {
                    ctx.end = Some(text.to_string());
                    Self::Context(ctx, id)
                }
                b"instant" => {
                    ctx.instant = Some(text.to_string());
                    Self::Context(ctx, id)
                }
                _ => Self::Context(ctx, id),
            },
            Self::Unit(mut unit, id) => match local {
                b"unit" => {
                    units.insert(id, unit.label());
                    Self::Outside
                }
                b"measure" => {
                    let measure = text.rsplit(':').next().unwrap_or(text).to_string();
                    if unit.in_denominator {
                        unit.denominator.push(measure);
                    } else {
                        unit.numerator.push(measure);
                    }
                    Self::Unit(unit, id)
                }
                _ => Self::Unit(unit, id),
            },
            Self::Fact(mut fact, 0) => {
                fact.value = text.to_string();
                facts.push(fact);
                Self::Outside
            }
            Self::Fact(fact, depth) => Self::Fact(fact, depth - 1),
        })
    }
}

enum DeiField {
    EntityName,
    Cik,
}

fn dei_value(name: &[u8], text: &str) -> Option<(DeiField, String)> {
    if text.is_empty() {
        return None;
    }
    match name {
        b"dei:EntityRegistrantName" => Some((DeiField::EntityName, text.to_string())),
        b"dei:EntityCentralIndexKey" => Some((DeiField::Cik, text.to_string())),
        _ => None,
    }
}

#[derive(Debug, Deserialize)]
struct FactRow {
    concept: String,
    value: f64,
    #[serde(default)]
    unit: String,
    #[serde(default)]
    period_start: String,
    #[serde(default)]
    period_end: String,
    #[serde(default)]
    context: String,
}

// SEC API JSON structure
// Based on: https://www.sec.gov/edgar/sec-api-documentation

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SecApiResponse {
    cik: serde_json::Value,
    entity_name: String,
    facts: HashMap<String, TaxonomyFacts>,
}

#[derive(Debug, Deserialize)]
struct TaxonomyFacts(HashMap<String, ConceptData>);

#[derive(Debug, Deserialize)]
struct ConceptData {
    units: HashMap<String, UnitFacts>,
}

#[derive(Debug, Deserialize)]
struct UnitFacts(Vec<FactData>);

#[derive(Debug, Deserialize)]
struct FactData {
    end: String,
    val: f64,
    #[serde(default)]
    start: Option<String>,
    #[serde(default)]
    accn: Option<String>, // Accession number
    #[serde(default)]
    fy: Option<i32>, // Fiscal year
    #[serde(default)]
    fp: Option<String>, // Fiscal period
    #[serde(default)]
    form: Option<String>, // Form type (10-K, 10-Q, etc.)
}

/// Common US-GAAP concepts for financial statements
pub mod concepts {
    /// Balance Sheet concepts
    pub mod balance_sheet {
        /// Total Assets
        pub const ASSETS: &str = "us-gaap:Assets";

        /// Total Liabilities
        pub const LIABILITIES: &str = "us-gaap:Liabilities";

        /// Stockholders' Equity
        pub const STOCKHOLDERS_EQUITY: &str = "us-gaap:StockholdersEquity";

        /// Cash and Cash Equivalents
        pub const CASH: &str = "us-gaap:CashAndCashEquivalentsAtCarryingValue";

        /// Current Assets
        pub const CURRENT_ASSETS: &str = "us-gaap:AssetsCurrent";

        /// Current Liabilities
        pub const CURRENT_LIABILITIES: &str = "us-gaap:LiabilitiesCurrent";
    }

    /// Income Statement concepts
    pub mod income_statement {
        /// Total Revenue
        pub const REVENUES: &str = "us-gaap:Revenues";

        /// Alternative: Revenue from Contract with Customer
        pub const REVENUE_FROM_CONTRACT: &str =
            "us-gaap:RevenueFromContractWithCustomerExcludingAssessedTax";

        /// Net Income (Loss)
        pub const NET_INCOME: &str = "us-gaap:NetIncomeLoss";

        /// Cost of goods and services sold
        pub const COST_OF_GOODS_AND_SERVICES: &str = "us-gaap:CostOfGoodsAndServicesSold";

        /// Operating Income (Loss)
        pub const OPERATING_INCOME: &str = "us-gaap:OperatingIncomeLoss";

        /// Gross Profit
        pub const GROSS_PROFIT: &str = "us-gaap:GrossProfit";
    }

    /// Per-Share concepts
    pub mod per_share {
        /// Earnings Per Share - Basic
        pub const EPS_BASIC: &str = "us-gaap:EarningsPerShareBasic";

        /// Earnings Per Share - Diluted
        pub const EPS_DILUTED: &str = "us-gaap:EarningsPerShareDiluted";
    }

    /// Turns an element name into words: `"us-gaap:AssetsCurrent"` becomes
    /// `"Assets Current"`. Names without a prefix or already spaced pass
    /// through with only the camel-case boundaries split.
    pub fn humanize_element(element: &str) -> String {
        let local = element.rsplit(':').next().unwrap_or(element);
        let chars: Vec<char> = local.chars().collect();
        let mut out = String::with_capacity(local.len() + 8);

        for (i, &c) in chars.iter().enumerate() {
            if i > 0 && c.is_uppercase() {
                let prev = chars[i - 1];
                let next_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
                if prev.is_lowercase()
                    || prev.is_ascii_digit()
                    || (prev.is_uppercase() && next_lower)
                {
                    out.push(' ');
                }
            }
            out.push(c);
        }
        out
    }
}
