//! Group-mean lookup tables.
//!
//! Built once from the temporally filled panel and never mutated. The
//! cross-sectional fallback reads only from these tables, so substitutions
//! never feed on each other.

use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, instrument};

use crate::pipeline::panel::Panel;
use crate::registry::ReferenceData;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GroupKind {
    Subregion,
    Income,
}

impl GroupKind {
    /// Column header used for the group in the persisted table
    pub fn column(&self) -> &'static str {
        match self {
            GroupKind::Subregion => "Region",
            GroupKind::Income => "Income",
        }
    }

    pub fn group_of<'a>(&self, reference: &'a ReferenceData, iso: &str) -> Option<&'a str> {
        match self {
            GroupKind::Subregion => reference.subregion(iso),
            GroupKind::Income => reference.income(iso),
        }
    }
}

/// Per (group, year) means, one slot per indicator in panel order
#[derive(Debug, Clone, PartialEq)]
pub struct GroupMeanTable {
    kind: GroupKind,
    first_year: i32,
    indicators: Vec<String>,
    means: BTreeMap<String, Vec<Vec<Option<f64>>>>,
}

impl GroupMeanTable {
    /// Pass 1: mean of every indicator per group and year over included
    /// countries with a known mapping. Absent when no member has a value.
    #[instrument(skip(panel, reference))]
    pub fn build(panel: &Panel, reference: &ReferenceData, kind: GroupKind) -> Self {
        let layout = panel.layout();
        let years = layout.year_count();
        let n_ind = layout.indicators().len();

        let mut members: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        for (c, iso) in layout.countries().iter().enumerate() {
            if reference.is_excluded(iso) {
                continue;
            }
            if let Some(group) = kind.group_of(reference, iso) {
                members.entry(group.to_string()).or_default().push(c);
            }
        }

        let mut means = BTreeMap::new();
        for (group, countries) in &members {
            let mut by_year = Vec::with_capacity(years);
            for y in 0..years {
                let row: Vec<Option<f64>> = (0..n_ind)
                    .map(|i| mean(countries.iter().filter_map(|&c| panel.value(c, y, i))))
                    .collect();
                by_year.push(row);
            }
            debug!("{:?} group '{}' has {} members", kind, group, countries.len());
            means.insert(group.clone(), by_year);
        }

        Self {
            kind,
            first_year: layout.year_at(0),
            indicators: layout.indicators().to_vec(),
            means,
        }
    }

    pub fn kind(&self) -> GroupKind {
        self.kind
    }

    pub fn indicators(&self) -> &[String] {
        &self.indicators
    }

    pub fn contains_group(&self, group: &str) -> bool {
        self.means.contains_key(group)
    }

    /// Mean for a group at a year index and indicator index
    pub fn get(&self, group: &str, year: usize, indicator: usize) -> Option<f64> {
        self.means
            .get(group)
            .and_then(|rows| rows.get(year))
            .and_then(|row| row.get(indicator))
            .copied()
            .flatten()
    }

    /// Rows in group then year order, for persistence
    pub fn rows(&self) -> impl Iterator<Item = (&str, i32, &[Option<f64>])> + '_ {
        self.means.iter().flat_map(move |(group, rows)| {
            rows.iter()
                .enumerate()
                .map(move |(y, row)| (group.as_str(), self.first_year + y as i32, row.as_slice()))
        })
    }
}

/// Arithmetic mean of the present values; `None` for an empty input
pub fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (count > 0).then(|| sum / count as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::panel::PanelLayout;
    use crate::types::{Cell, Dimension, FillStrategy, IndicatorDefinition};

    fn reference() -> ReferenceData {
        ReferenceData::builder(2000, 2001)
            .subregion("North", "R")
            .subregion("South", "R")
            .country("AAA", Some("A"), Some("North"), Some("High"))
            .country("BBB", Some("B"), Some("North"), Some("Low"))
            .country("CCC", Some("C"), Some("South"), Some("High"))
            .country("DDD", Some("D"), None, Some("Low"))
            .country("XXX", Some("X"), Some("North"), Some("High"))
            .exclude("XXX")
            .indicator(IndicatorDefinition::new("I", Dimension::Equity, false, FillStrategy::RegionAvg))
            .build()
            .unwrap()
    }

    fn panel() -> Panel {
        let reference = reference();
        let mut panel = Panel::empty(PanelLayout::from_reference(&reference));
        panel.set_cell(0, 0, 0, Cell::original(2.0));
        panel.set_cell(1, 0, 0, Cell::original(4.0));
        panel.set_cell(2, 0, 0, Cell::original(10.0));
        panel.set_cell(3, 0, 0, Cell::original(6.0));
        panel.set_cell(4, 0, 0, Cell::original(100.0));
        panel.set_cell(0, 1, 0, Cell::original(1.0));
        panel
    }

    #[test]
    fn subregion_means_skip_absent_and_excluded() {
        let table = GroupMeanTable::build(&panel(), &reference(), GroupKind::Subregion);
        assert_eq!(table.get("North", 0, 0), Some(3.0));
        assert_eq!(table.get("North", 1, 0), Some(1.0));
        assert_eq!(table.get("South", 0, 0), Some(10.0));
        assert_eq!(table.get("South", 1, 0), None);
        assert!(!table.contains_group("Nowhere"));
    }

    #[test]
    fn income_means_use_the_income_partition() {
        let table = GroupMeanTable::build(&panel(), &reference(), GroupKind::Income);
        assert_eq!(table.get("High", 0, 0), Some(6.0));
        assert_eq!(table.get("Low", 0, 0), Some(5.0));
    }

    #[test]
    fn rows_are_group_then_year() {
        let table = GroupMeanTable::build(&panel(), &reference(), GroupKind::Subregion);
        let keys: Vec<_> = table.rows().map(|(g, y, _)| (g.to_string(), y)).collect();
        assert_eq!(
            keys,
            vec![
                ("North".to_string(), 2000),
                ("North".to_string(), 2001),
                ("South".to_string(), 2000),
                ("South".to_string(), 2001),
            ]
        );
    }

    #[test]
    fn mean_of_nothing_is_absent() {
        assert_eq!(mean(std::iter::empty()), None);
        assert_eq!(mean([1.0, 2.0].into_iter()), Some(1.5));
    }
}
