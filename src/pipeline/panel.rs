//! The country × year × indicator panel and its assembler.

use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tracing::{info, instrument, warn};

use super::ingestion::AdapterOutput;
use crate::error::{Result, WsiError};
use crate::observability::metrics;
use crate::registry::ReferenceData;
use crate::types::{Cell, RawValue};

/// Shape of a panel: countries in reference order, a contiguous year range
/// and indicators in configuration order. Cells are stored row-major by
/// `(country, year)` with one slot per indicator.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelLayout {
    countries: Vec<String>,
    country_index: HashMap<String, usize>,
    first_year: i32,
    last_year: i32,
    indicators: Vec<String>,
}

impl PanelLayout {
    // Callers go through `from_reference`, whose year range is validated non-empty
    fn new(countries: Vec<String>, first_year: i32, last_year: i32, indicators: Vec<String>) -> Self {
        let country_index = countries
            .iter()
            .enumerate()
            .map(|(i, c)| (c.clone(), i))
            .collect();
        Self {
            countries,
            country_index,
            first_year,
            last_year,
            indicators,
        }
    }

    pub fn from_reference(reference: &ReferenceData) -> Self {
        Self::new(
            reference.countries().to_vec(),
            reference.first_year(),
            reference.last_year(),
            reference.indicator_names(),
        )
    }

    pub fn countries(&self) -> &[String] {
        &self.countries
    }

    pub fn indicators(&self) -> &[String] {
        &self.indicators
    }

    pub fn year_count(&self) -> usize {
        (self.last_year - self.first_year + 1) as usize
    }

    pub fn year_at(&self, year_idx: usize) -> i32 {
        self.first_year + year_idx as i32
    }

    pub fn year_index(&self, year: i32) -> Option<usize> {
        (self.first_year..=self.last_year)
            .contains(&year)
            .then(|| (year - self.first_year) as usize)
    }

    pub fn country_index(&self, iso: &str) -> Option<usize> {
        self.country_index.get(iso).copied()
    }

    pub fn indicator_index(&self, name: &str) -> Option<usize> {
        self.indicators.iter().position(|i| i == name)
    }

    /// Number of `(country, year)` rows
    pub fn row_count(&self) -> usize {
        self.countries.len() * self.year_count()
    }

    pub fn row_index(&self, country: usize, year: usize) -> usize {
        country * self.year_count() + year
    }

    fn cell_index(&self, country: usize, year: usize, indicator: usize) -> usize {
        self.row_index(country, year) * self.indicators.len() + indicator
    }

    fn cell_count(&self) -> usize {
        self.row_count() * self.indicators.len()
    }
}

/// Joined adapter outputs before any coercion or filling
#[derive(Debug, Clone)]
pub struct RawPanel {
    layout: PanelLayout,
    cells: Vec<Option<RawValue>>,
}

impl RawPanel {
    pub fn empty(layout: PanelLayout) -> Self {
        let cells = vec![None; layout.cell_count()];
        Self { layout, cells }
    }

    pub fn layout(&self) -> &PanelLayout {
        &self.layout
    }

    pub fn get(&self, country: usize, year: usize, indicator: usize) -> Option<&RawValue> {
        self.cells[self.layout.cell_index(country, year, indicator)].as_ref()
    }

    pub fn set(&mut self, country: usize, year: usize, indicator: usize, value: RawValue) {
        let idx = self.layout.cell_index(country, year, indicator);
        self.cells[idx] = Some(value);
    }
}

/// Numeric panel with provenance tags; the object gap-filling mutates
#[derive(Debug, Clone, PartialEq)]
pub struct Panel {
    layout: PanelLayout,
    cells: Vec<Cell>,
}

impl Panel {
    pub fn empty(layout: PanelLayout) -> Self {
        let cells = vec![Cell::EMPTY; layout.cell_count()];
        Self { layout, cells }
    }

    pub fn layout(&self) -> &PanelLayout {
        &self.layout
    }

    pub fn cell(&self, country: usize, year: usize, indicator: usize) -> Cell {
        self.cells[self.layout.cell_index(country, year, indicator)]
    }

    pub fn set_cell(&mut self, country: usize, year: usize, indicator: usize, cell: Cell) {
        let idx = self.layout.cell_index(country, year, indicator);
        self.cells[idx] = cell;
    }

    pub fn value(&self, country: usize, year: usize, indicator: usize) -> Option<f64> {
        self.cell(country, year, indicator).value
    }

    /// One country's time series for one indicator, ordered by year
    pub fn series(&self, country: usize, indicator: usize) -> Vec<Cell> {
        (0..self.layout.year_count())
            .map(|y| self.cell(country, y, indicator))
            .collect()
    }

    pub fn set_series(&mut self, country: usize, indicator: usize, series: &[Cell]) {
        for (y, cell) in series.iter().enumerate() {
            self.set_cell(country, y, indicator, *cell);
        }
    }

    /// Whether a country has any value for an indicator across the year range
    pub fn has_any_value(&self, country: usize, indicator: usize) -> bool {
        (0..self.layout.year_count()).any(|y| self.cell(country, y, indicator).is_present())
    }

    /// Convenience lookup by codes, used by tests and reports
    pub fn lookup(&self, iso: &str, year: i32, indicator: &str) -> Option<Cell> {
        let c = self.layout.country_index(iso)?;
        let y = self.layout.year_index(year)?;
        let i = self.layout.indicator_index(indicator)?;
        Some(self.cell(c, y, i))
    }
}

/// Counts from assembling adapter outputs onto the panel
#[derive(Debug, Clone, Default, Serialize)]
pub struct AssemblyReport {
    pub rows_joined: usize,
    pub rows_out_of_range: usize,
}

/// Validate every adapter output and left-join it onto the full
/// country × year rectangle. Unknown country codes and duplicate
/// `(country, year)` keys are schema violations and fail the run.
#[instrument(skip_all, fields(indicators = outputs.len()))]
pub fn assemble(reference: &ReferenceData, outputs: &[AdapterOutput]) -> Result<(RawPanel, AssemblyReport)> {
    let layout = PanelLayout::from_reference(reference);
    let mut panel = RawPanel::empty(layout);
    let mut report = AssemblyReport::default();

    for output in outputs {
        let indicator = panel.layout.indicator_index(&output.indicator).ok_or_else(|| {
            WsiError::Config(format!("adapter output for unknown indicator '{}'", output.indicator))
        })?;

        let mut seen: HashSet<(&str, i32)> = HashSet::with_capacity(output.rows.len());
        let mut dropped = 0usize;
        for row in &output.rows {
            let Some(country) = panel.layout.country_index(&row.iso_code) else {
                metrics::ingestion::schema_violation(&output.indicator);
                return Err(WsiError::schema(
                    &output.indicator,
                    format!("country code '{}' is outside the known set", row.iso_code),
                ));
            };
            if !seen.insert((row.iso_code.as_str(), row.year)) {
                metrics::ingestion::schema_violation(&output.indicator);
                return Err(WsiError::schema(
                    &output.indicator,
                    format!("duplicate key ({}, {})", row.iso_code, row.year),
                ));
            }
            match panel.layout.year_index(row.year) {
                Some(year) => {
                    panel.set(country, year, indicator, row.value.clone());
                    report.rows_joined += 1;
                }
                None => dropped += 1,
            }
        }

        if dropped > 0 {
            warn!(
                "{}: dropped {} rows outside {}..={}",
                output.indicator,
                dropped,
                reference.first_year(),
                reference.last_year()
            );
            metrics::ingestion::rows_dropped(&output.indicator, dropped);
            report.rows_out_of_range += dropped;
        }
    }

    info!(
        "Assembled panel: {} rows × {} indicators, {} values joined",
        panel.layout.row_count(),
        panel.layout.indicators().len(),
        report.rows_joined
    );
    Ok((panel, report))
}

/// A country with at least one indicator that has no usable value in any year
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MissingnessEntry {
    #[serde(rename = "ISO_code")]
    pub iso_code: String,
    #[serde(rename = "Country")]
    pub country: String,
    #[serde(rename = "Missing_Count")]
    pub missing_count: usize,
    #[serde(rename = "Indicators")]
    pub indicators: String,
}

/// Per country, the indicators with zero coverage across the year range,
/// sorted by missing count descending. Unparseable values count as missing.
pub fn missingness_summary(raw: &RawPanel, reference: &ReferenceData) -> Vec<MissingnessEntry> {
    let layout = raw.layout();
    let mut summary = Vec::new();

    for (c, iso) in layout.countries().iter().enumerate() {
        let missing: Vec<&str> = layout
            .indicators()
            .iter()
            .enumerate()
            .filter(|(i, _)| {
                (0..layout.year_count()).all(|y| raw.get(c, y, *i).and_then(RawValue::coerce).is_none())
            })
            .map(|(_, name)| name.as_str())
            .collect();

        if !missing.is_empty() {
            summary.push(MissingnessEntry {
                iso_code: iso.clone(),
                country: reference.name(iso).unwrap_or("Unknown").to_string(),
                missing_count: missing.len(),
                indicators: missing.join(", "),
            });
        }
    }

    summary.sort_by(|a, b| {
        b.missing_count
            .cmp(&a.missing_count)
            .then_with(|| a.iso_code.cmp(&b.iso_code))
    });
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Dimension, FillStrategy, IndicatorDefinition, IndicatorRow};

    fn reference() -> ReferenceData {
        ReferenceData::builder(2000, 2002)
            .subregion("Sub", "Region")
            .country("AAA", Some("Alpha"), Some("Sub"), Some("High"))
            .country("BBB", None, Some("Sub"), Some("High"))
            .indicator(IndicatorDefinition::new("X", Dimension::Equity, false, FillStrategy::RegionAvg))
            .indicator(IndicatorDefinition::new("Y", Dimension::Protection, true, FillStrategy::None))
            .build()
            .unwrap()
    }

    fn output(indicator: &str, rows: Vec<IndicatorRow>) -> AdapterOutput {
        AdapterOutput {
            indicator: indicator.to_string(),
            rows,
            fingerprint: None,
        }
    }

    #[test]
    fn assembles_full_rectangle_with_absent_cells() {
        let outputs = vec![
            output("X", vec![IndicatorRow::new("AAA", 2001, 4.0), IndicatorRow::new("BBB", 1990, 1.0)]),
            output("Y", vec![]),
        ];
        let (raw, report) = assemble(&reference(), &outputs).unwrap();

        assert_eq!(raw.layout().row_count(), 6);
        assert_eq!(raw.get(0, 1, 0), Some(&RawValue::Number(4.0)));
        assert_eq!(raw.get(0, 0, 0), None);
        assert_eq!(raw.get(1, 1, 1), None);
        assert_eq!(report.rows_joined, 1);
        assert_eq!(report.rows_out_of_range, 1);
    }

    #[test]
    fn duplicate_key_fails_fast() {
        let outputs = vec![output(
            "X",
            vec![IndicatorRow::new("AAA", 2001, 4.0), IndicatorRow::new("AAA", 2001, 5.0)],
        )];
        let err = assemble(&reference(), &outputs).unwrap_err();
        assert!(matches!(err, WsiError::SchemaViolation { .. }));
        assert!(err.to_string().contains("duplicate key (AAA, 2001)"));
    }

    #[test]
    fn unknown_country_fails_fast() {
        let outputs = vec![output("X", vec![IndicatorRow::new("WLD", 2001, 4.0)])];
        let err = assemble(&reference(), &outputs).unwrap_err();
        assert!(matches!(err, WsiError::SchemaViolation { .. }));
    }

    #[test]
    fn missingness_is_sorted_by_count() {
        let outputs = vec![
            output("X", vec![IndicatorRow::new("AAA", 2000, 1.0), IndicatorRow::new("BBB", 2000, "..")]),
            output("Y", vec![IndicatorRow::new("AAA", 2002, 3.0)]),
        ];
        let (raw, _) = assemble(&reference(), &outputs).unwrap();
        let summary = missingness_summary(&raw, &reference());

        assert_eq!(summary.len(), 1);
        assert_eq!(summary[0].iso_code, "BBB");
        assert_eq!(summary[0].country, "Unknown");
        assert_eq!(summary[0].missing_count, 2);
        assert_eq!(summary[0].indicators, "X, Y");
    }

    #[test]
    fn layout_year_range_comes_from_validated_reference() {
        let inverted = ReferenceData::builder(2002, 2000)
            .indicator(IndicatorDefinition::new("X", Dimension::Equity, false, FillStrategy::RegionAvg))
            .build();
        assert!(matches!(inverted, Err(WsiError::Config(_))));

        let single = ReferenceData::builder(2000, 2000)
            .country("AAA", Some("Alpha"), None, None)
            .indicator(IndicatorDefinition::new("X", Dimension::Equity, false, FillStrategy::RegionAvg))
            .build()
            .unwrap();
        let layout = PanelLayout::from_reference(&single);
        assert_eq!(layout.year_count(), 1);
        assert_eq!(layout.year_index(2000), Some(0));
        assert_eq!(layout.year_index(1999), None);
    }

    #[test]
    fn series_round_trip() {
        let layout = PanelLayout::from_reference(&reference());
        let mut panel = Panel::empty(layout);
        panel.set_series(1, 0, &[Cell::original(1.0), Cell::EMPTY, Cell::original(3.0)]);
        assert_eq!(panel.lookup("BBB", 2002, "X"), Some(Cell::original(3.0)));
        assert!(panel.has_any_value(1, 0));
        assert!(!panel.has_any_value(0, 0));
    }
}
