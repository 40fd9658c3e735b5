//! Run manifest and diagnostics report, persisted as `diagnostics.json`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use uuid::Uuid;

use crate::registry::{LookupMiss, LookupTable};
use crate::types::SourceTag;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct InputRecord {
    pub indicator: String,
    pub rows: usize,
    pub sha256: Option<String>,
}

/// A group fill that could not run because a mapping was missing
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct SkippedFill {
    pub iso_code: String,
    pub indicator: String,
    pub table: LookupTable,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Diagnostics {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub inputs: Vec<InputRecord>,
    pub rows_joined: usize,
    pub rows_out_of_range: usize,
    pub coercion_failures: usize,
    pub lookup_misses: BTreeMap<String, BTreeSet<LookupTable>>,
    pub skipped_fills: Vec<SkippedFill>,
    pub fills: BTreeMap<String, usize>,
    pub overrides: BTreeMap<String, usize>,
    pub zero_collapse_rows: usize,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            finished_at: None,
            inputs: Vec::new(),
            rows_joined: 0,
            rows_out_of_range: 0,
            coercion_failures: 0,
            lookup_misses: BTreeMap::new(),
            skipped_fills: Vec::new(),
            fills: BTreeMap::new(),
            overrides: BTreeMap::new(),
            zero_collapse_rows: 0,
        }
    }

    pub fn record_input(&mut self, indicator: &str, rows: usize, sha256: Option<String>) {
        self.inputs.push(InputRecord {
            indicator: indicator.to_string(),
            rows,
            sha256,
        });
    }

    pub fn record_lookup_miss(&mut self, iso_code: &str, table: LookupTable) {
        self.lookup_misses
            .entry(iso_code.to_string())
            .or_default()
            .insert(table);
    }

    pub fn record_lookup_misses(&mut self, misses: &[LookupMiss]) {
        for miss in misses {
            self.record_lookup_miss(&miss.iso_code, miss.table);
        }
    }

    pub fn record_skipped_fill(&mut self, iso_code: &str, indicator: &str, table: LookupTable) {
        self.record_lookup_miss(iso_code, table);
        self.skipped_fills.push(SkippedFill {
            iso_code: iso_code.to_string(),
            indicator: indicator.to_string(),
            table,
        });
    }

    pub fn record_fills(&mut self, tag: SourceTag, count: usize) {
        *self.fills.entry(tag.as_str().to_string()).or_default() += count;
    }

    pub fn record_override(&mut self, rule: &str, count: usize) {
        *self.overrides.entry(rule.to_string()).or_default() += count;
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    pub fn fill_count(&self, tag: SourceTag) -> usize {
        self.fills.get(tag.as_str()).copied().unwrap_or(0)
    }
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skipped_fill_also_records_the_miss() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.record_skipped_fill("COK", "Poverty", LookupTable::Income);
        diagnostics.record_skipped_fill("COK", "Financial Inclusion", LookupTable::Income);

        assert_eq!(diagnostics.skipped_fills.len(), 2);
        assert_eq!(diagnostics.lookup_misses["COK"].len(), 1);
    }

    #[test]
    fn fill_counts_accumulate_per_tag() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.record_fills(SourceTag::RegionAvg, 3);
        diagnostics.record_fills(SourceTag::RegionAvg, 2);
        assert_eq!(diagnostics.fill_count(SourceTag::RegionAvg), 5);
        assert_eq!(diagnostics.fill_count(SourceTag::IncomeAvg), 0);
    }

    #[test]
    fn serializes_to_json() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.record_lookup_miss("NIU", LookupTable::Income);
        diagnostics.finish();
        let json = serde_json::to_value(&diagnostics).unwrap();
        assert_eq!(json["lookup_misses"]["NIU"][0], "income");
        assert!(json["finished_at"].is_string());
    }
}
