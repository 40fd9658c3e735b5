use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;
use std::ops::RangeInclusive;

use super::countries::{COUNTRY_TABLE, SUBREGION_REGION};
use super::indicators::{builtin_indicators, EXCLUDED_ISO, FIRST_YEAR, LAST_YEAR};
use crate::error::{Result, WsiError};
use crate::types::{Dimension, IndicatorDefinition};

/// Which reference table failed to resolve a country
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupTable {
    Name,
    Subregion,
    Income,
}

impl fmt::Display for LookupTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LookupTable::Name => "name",
            LookupTable::Subregion => "subregion",
            LookupTable::Income => "income",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LookupMiss {
    pub iso_code: String,
    pub table: LookupTable,
}

/// Immutable reference data for one run: the country set and its
/// partitions, the indicator table, the exclusion set and the year range.
#[derive(Debug, Clone)]
pub struct ReferenceData {
    countries: Vec<String>,
    names: HashMap<String, String>,
    subregions: HashMap<String, String>,
    regions: HashMap<String, String>,
    income: HashMap<String, String>,
    excluded: BTreeSet<String>,
    indicators: Vec<IndicatorDefinition>,
    first_year: i32,
    last_year: i32,
}

static BUILTIN: Lazy<ReferenceData> = Lazy::new(|| {
    let mut builder = ReferenceDataBuilder::new(FIRST_YEAR, LAST_YEAR);
    for (subregion, region) in SUBREGION_REGION {
        builder = builder.subregion(subregion, region);
    }
    for (iso, name, subregion, income) in COUNTRY_TABLE {
        builder = builder.country(iso, Some(*name), Some(*subregion), *income);
    }
    for iso in EXCLUDED_ISO {
        builder = builder.exclude(iso);
    }
    for def in builtin_indicators() {
        builder = builder.indicator(def);
    }
    // The built-in tables are covered by unit tests; a failure here is a programming error.
    builder.build().unwrap_or_else(|e| panic!("built-in reference data is invalid: {e}"))
});

impl ReferenceData {
    /// The process-wide reference tables, initialised once on first use
    pub fn builtin() -> &'static ReferenceData {
        &BUILTIN
    }

    pub fn builder(first_year: i32, last_year: i32) -> ReferenceDataBuilder {
        ReferenceDataBuilder::new(first_year, last_year)
    }

    pub fn countries(&self) -> &[String] {
        &self.countries
    }

    pub fn included_countries(&self) -> impl Iterator<Item = &str> {
        self.countries
            .iter()
            .map(|c| c.as_str())
            .filter(move |c| !self.excluded.contains(*c))
    }

    pub fn is_known(&self, iso: &str) -> bool {
        self.countries.iter().any(|c| c == iso)
    }

    pub fn is_excluded(&self, iso: &str) -> bool {
        self.excluded.contains(iso)
    }

    pub fn name(&self, iso: &str) -> Option<&str> {
        self.names.get(iso).map(|s| s.as_str())
    }

    pub fn subregion(&self, iso: &str) -> Option<&str> {
        self.subregions.get(iso).map(|s| s.as_str())
    }

    pub fn region(&self, iso: &str) -> Option<&str> {
        self.subregion(iso)
            .and_then(|sub| self.regions.get(sub))
            .map(|s| s.as_str())
    }

    pub fn income(&self, iso: &str) -> Option<&str> {
        self.income.get(iso).map(|s| s.as_str())
    }

    pub fn indicators(&self) -> &[IndicatorDefinition] {
        &self.indicators
    }

    pub fn indicator(&self, name: &str) -> Option<&IndicatorDefinition> {
        self.indicators.iter().find(|d| d.name == name)
    }

    pub fn indicator_names(&self) -> Vec<String> {
        self.indicators.iter().map(|d| d.name.clone()).collect()
    }

    /// Dimensions that have at least one indicator, in declaration order
    pub fn dimensions(&self) -> Vec<Dimension> {
        Dimension::ALL
            .into_iter()
            .filter(|dim| self.indicators.iter().any(|d| d.dimension == *dim))
            .collect()
    }

    pub fn first_year(&self) -> i32 {
        self.first_year
    }

    pub fn last_year(&self) -> i32 {
        self.last_year
    }

    pub fn years(&self) -> RangeInclusive<i32> {
        self.first_year..=self.last_year
    }

    /// Countries that one of the lookup tables cannot resolve.
    /// Group fills that depend on a missing mapping are skipped for these countries.
    pub fn lookup_misses(&self) -> Vec<LookupMiss> {
        let mut misses = Vec::new();
        for iso in &self.countries {
            for (table, hit) in [
                (LookupTable::Name, self.names.contains_key(iso)),
                (LookupTable::Subregion, self.subregions.contains_key(iso)),
                (LookupTable::Income, self.income.contains_key(iso)),
            ] {
                if !hit {
                    misses.push(LookupMiss {
                        iso_code: iso.clone(),
                        table,
                    });
                }
            }
        }
        misses
    }
}

pub struct ReferenceDataBuilder {
    countries: Vec<String>,
    names: HashMap<String, String>,
    subregions: HashMap<String, String>,
    regions: HashMap<String, String>,
    income: HashMap<String, String>,
    excluded: BTreeSet<String>,
    indicators: Vec<IndicatorDefinition>,
    first_year: i32,
    last_year: i32,
}

impl ReferenceDataBuilder {
    pub fn new(first_year: i32, last_year: i32) -> Self {
        Self {
            countries: Vec::new(),
            names: HashMap::new(),
            subregions: HashMap::new(),
            regions: HashMap::new(),
            income: HashMap::new(),
            excluded: BTreeSet::new(),
            indicators: Vec::new(),
            first_year,
            last_year,
        }
    }

    pub fn subregion(mut self, subregion: &str, region: &str) -> Self {
        self.regions.insert(subregion.to_string(), region.to_string());
        self
    }

    pub fn country(
        mut self,
        iso: &str,
        name: Option<&str>,
        subregion: Option<&str>,
        income: Option<&str>,
    ) -> Self {
        self.countries.push(iso.to_string());
        if let Some(name) = name {
            self.names.insert(iso.to_string(), name.to_string());
        }
        if let Some(sub) = subregion {
            self.subregions.insert(iso.to_string(), sub.to_string());
        }
        if let Some(inc) = income {
            self.income.insert(iso.to_string(), inc.to_string());
        }
        self
    }

    pub fn exclude(mut self, iso: &str) -> Self {
        self.excluded.insert(iso.to_string());
        self
    }

    pub fn indicator(mut self, def: IndicatorDefinition) -> Self {
        self.indicators.push(def);
        self
    }

    pub fn build(self) -> Result<ReferenceData> {
        if self.first_year > self.last_year {
            return Err(WsiError::Config(format!(
                "empty year range {}..={}",
                self.first_year, self.last_year
            )));
        }
        if self.indicators.is_empty() {
            return Err(WsiError::Config("no indicators configured".to_string()));
        }

        let mut seen = HashSet::new();
        for def in &self.indicators {
            if !seen.insert(def.name.as_str()) {
                return Err(WsiError::Config(format!("duplicate indicator '{}'", def.name)));
            }
        }

        let mut seen = HashSet::new();
        for iso in &self.countries {
            if !seen.insert(iso.as_str()) {
                return Err(WsiError::Config(format!("duplicate country '{}'", iso)));
            }
        }

        for (iso, sub) in &self.subregions {
            if !self.regions.contains_key(sub) {
                return Err(WsiError::Config(format!(
                    "subregion '{}' of {} belongs to no region",
                    sub, iso
                )));
            }
        }

        for iso in &self.excluded {
            if !seen.contains(iso.as_str()) {
                return Err(WsiError::Config(format!("excluded country '{}' is not in the country set", iso)));
            }
        }

        Ok(ReferenceData {
            countries: self.countries,
            names: self.names,
            subregions: self.subregions,
            regions: self.regions,
            income: self.income,
            excluded: self.excluded,
            indicators: self.indicators,
            first_year: self.first_year,
            last_year: self.last_year,
        })
    }
}
