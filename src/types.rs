use serde::{Deserialize, Serialize};
use std::fmt;

/// Provenance of a panel cell's value
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SourceTag {
    /// No value has been observed or filled
    #[default]
    None,
    /// Value came directly from an indicator adapter
    Original,
    /// Interpolated or carried within the country's own series
    TemporalFill,
    /// Subregion mean for the same year
    RegionAvg,
    /// Income-group mean for the same year
    IncomeAvg,
    /// Copied from a designated proxy country
    OverrideNeighborProxy,
    /// Mean of a named set of substitute subregions
    OverrideRegionalSubstitute,
}

impl SourceTag {
    /// Label written to delimited output; `None` is an empty field
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceTag::None => "",
            SourceTag::Original => "ORIGINAL",
            SourceTag::TemporalFill => "TEMPORAL_FILL",
            SourceTag::RegionAvg => "REGION_AVG",
            SourceTag::IncomeAvg => "INCOME_AVG",
            SourceTag::OverrideNeighborProxy => "OVERRIDE_NEIGHBOR_PROXY",
            SourceTag::OverrideRegionalSubstitute => "OVERRIDE_REGIONAL_SUBSTITUTE",
        }
    }

    pub fn is_fill(&self) -> bool {
        !matches!(self, SourceTag::None | SourceTag::Original)
    }
}

impl fmt::Display for SourceTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceTag::None => write!(f, "NONE"),
            other => write!(f, "{}", other.as_str()),
        }
    }
}

/// A value as emitted by an adapter, before numeric coercion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Number(f64),
    Text(String),
}

impl RawValue {
    /// Coerce to a finite float. Unparseable text and NaN/inf are absent, never zero.
    pub fn coerce(&self) -> Option<f64> {
        let v = match self {
            RawValue::Number(n) => *n,
            RawValue::Text(s) => s.trim().parse::<f64>().ok()?,
        };
        v.is_finite().then_some(v)
    }
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawValue::Number(n) => write!(f, "{}", n),
            RawValue::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<f64> for RawValue {
    fn from(v: f64) -> Self {
        RawValue::Number(v)
    }
}

impl From<&str> for RawValue {
    fn from(v: &str) -> Self {
        RawValue::Text(v.to_string())
    }
}

/// One row of an indicator's canonical long-format table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorRow {
    pub iso_code: String,
    pub year: i32,
    pub value: RawValue,
}

impl IndicatorRow {
    pub fn new(iso_code: &str, year: i32, value: impl Into<RawValue>) -> Self {
        Self {
            iso_code: iso_code.to_string(),
            year,
            value: value.into(),
        }
    }
}

/// Closed set of index dimensions, in output order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Dimension {
    Equity,
    Protection,
    Resilience,
}

impl Dimension {
    pub const ALL: [Dimension; 3] = [Dimension::Equity, Dimension::Protection, Dimension::Resilience];

    pub fn as_str(&self) -> &'static str {
        match self {
            Dimension::Equity => "Equity",
            Dimension::Protection => "Protection",
            Dimension::Resilience => "Resilience",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Cross-sectional fallback used when a country has no data at all for an indicator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillStrategy {
    RegionAvg,
    IncomeAvg,
    None,
}

/// Declarative definition of one indicator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorDefinition {
    pub name: String,
    pub dimension: Dimension,
    /// Higher raw values mean a worse outcome
    pub invert: bool,
    pub fill: FillStrategy,
}

impl IndicatorDefinition {
    pub fn new(name: &str, dimension: Dimension, invert: bool, fill: FillStrategy) -> Self {
        Self {
            name: name.to_string(),
            dimension,
            invert,
            fill,
        }
    }
}

/// A single panel cell. `value` is absent exactly when `tag` is `SourceTag::None`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Cell {
    pub value: Option<f64>,
    pub tag: SourceTag,
}

impl Cell {
    pub const EMPTY: Cell = Cell {
        value: None,
        tag: SourceTag::None,
    };

    pub fn original(value: f64) -> Self {
        Self {
            value: Some(value),
            tag: SourceTag::Original,
        }
    }

    pub fn filled(value: f64, tag: SourceTag) -> Self {
        Self {
            value: Some(value),
            tag,
        }
    }

    pub fn is_present(&self) -> bool {
        self.value.is_some()
    }
}
