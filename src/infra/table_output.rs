//! Flat-file writers for the run's audit artifacts and the scored table.

use std::fs;
use std::path::Path;
use tracing::info;

use crate::constants::{
    score_column, source_column, COMPOSITE_COLUMN, COUNTRY_COLUMN, ECONOMY_COLUMN, EXCLUDED_COLUMN,
    INCOME_COLUMN, REGION_COLUMN, SUBREGION_COLUMN, YEAR_COLUMN,
};
use crate::error::Result;
use crate::observability::metrics;
use crate::pipeline::diagnostics::Diagnostics;
use crate::pipeline::panel::{MissingnessEntry, Panel, RawPanel};
use crate::pipeline::processing::{GroupMeanTable, ScoreTable};
use crate::registry::ReferenceData;

fn field(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn writer(path: &Path) -> Result<csv::Writer<fs::File>> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(csv::Writer::from_path(path)?)
}

/// One row per `(country, year)`, one column per indicator, values as received
pub fn write_raw_panel(path: &Path, raw: &RawPanel) -> Result<()> {
    let layout = raw.layout();
    let mut wtr = writer(path)?;

    let mut header = vec![COUNTRY_COLUMN.to_string(), YEAR_COLUMN.to_string()];
    header.extend(layout.indicators().iter().cloned());
    wtr.write_record(&header)?;

    for (c, iso) in layout.countries().iter().enumerate() {
        for y in 0..layout.year_count() {
            let mut record = vec![iso.clone(), layout.year_at(y).to_string()];
            record.extend(
                (0..layout.indicators().len())
                    .map(|i| raw.get(c, y, i).map(|v| v.to_string()).unwrap_or_default()),
            );
            wtr.write_record(&record)?;
        }
    }
    wtr.flush()?;
    info!("Wrote raw panel to {}", path.display());
    Ok(())
}

pub fn write_missingness(path: &Path, entries: &[MissingnessEntry]) -> Result<()> {
    let mut wtr = writer(path)?;
    if entries.is_empty() {
        wtr.write_record(["ISO_code", "Country", "Missing_Count", "Indicators"])?;
    }
    for entry in entries {
        wtr.serialize(entry)?;
    }
    wtr.flush()?;
    info!("Wrote missingness summary ({} countries) to {}", entries.len(), path.display());
    Ok(())
}

/// One row per `(group, year)`, one column per indicator
pub fn write_group_means(path: &Path, table: &GroupMeanTable) -> Result<()> {
    let mut wtr = writer(path)?;

    let mut header = vec![table.kind().column().to_string(), YEAR_COLUMN.to_string()];
    header.extend(table.indicators().iter().cloned());
    wtr.write_record(&header)?;

    for (group, year, means) in table.rows() {
        let mut record = vec![group.to_string(), year.to_string()];
        record.extend(means.iter().map(|m| field(*m)));
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    info!("Wrote {:?} means to {}", table.kind(), path.display());
    Ok(())
}

/// The final table: values, source tags, scores, dimensions, composite and
/// classification columns for every country including excluded ones.
pub fn write_scored_table(
    path: &Path,
    panel: &Panel,
    scores: &ScoreTable,
    reference: &ReferenceData,
) -> Result<()> {
    let layout = panel.layout();
    let indicators = layout.indicators();
    let mut wtr = writer(path)?;

    let mut header = vec![COUNTRY_COLUMN.to_string(), YEAR_COLUMN.to_string()];
    header.extend(indicators.iter().cloned());
    header.extend(indicators.iter().map(|i| source_column(i)));
    header.extend(indicators.iter().map(|i| score_column(i)));
    header.extend(scores.dimensions().iter().map(|d| d.as_str().to_string()));
    header.extend(
        [
            COMPOSITE_COLUMN,
            ECONOMY_COLUMN,
            SUBREGION_COLUMN,
            REGION_COLUMN,
            INCOME_COLUMN,
            EXCLUDED_COLUMN,
        ]
        .map(str::to_string),
    );
    wtr.write_record(&header)?;

    for (c, iso) in layout.countries().iter().enumerate() {
        for y in 0..layout.year_count() {
            let row = scores.row(c, y);
            let mut record = vec![iso.clone(), layout.year_at(y).to_string()];
            record.extend((0..indicators.len()).map(|i| field(panel.value(c, y, i))));
            record.extend((0..indicators.len()).map(|i| panel.cell(c, y, i).tag.as_str().to_string()));
            record.extend(row.indicator_scores.iter().map(|s| field(*s)));
            record.extend(row.dimension_scores.iter().map(|s| field(*s)));
            record.push(field(row.composite));
            record.push(reference.name(iso).unwrap_or_default().to_string());
            record.push(reference.subregion(iso).unwrap_or_default().to_string());
            record.push(reference.region(iso).unwrap_or_default().to_string());
            record.push(reference.income(iso).unwrap_or_default().to_string());
            record.push(row.excluded.to_string());
            wtr.write_record(&record)?;
        }
    }
    wtr.flush()?;
    info!("Wrote scored table to {}", path.display());
    Ok(())
}

pub fn write_diagnostics(path: &Path, diagnostics: &Diagnostics) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_json::to_string_pretty(diagnostics)?)?;
    info!("Wrote diagnostics for run {} to {}", diagnostics.run_id, path.display());
    Ok(())
}

/// Write the Prometheus text snapshot. Returns false when no recorder is installed.
pub fn write_metrics_snapshot(path: &Path) -> Result<bool> {
    let Some(rendered) = metrics::render_snapshot() else {
        return Ok(false);
    };
    fs::write(path, rendered)?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::panel::PanelLayout;
    use crate::pipeline::processing::scoring;
    use crate::pipeline::processing::GroupKind;
    use crate::types::{Cell, Dimension, FillStrategy, IndicatorDefinition, RawValue, SourceTag};
    use tempfile::tempdir;

    fn reference() -> ReferenceData {
        ReferenceData::builder(2000, 2001)
            .subregion("Sub", "Region")
            .country("AAA", Some("Alpha"), Some("Sub"), Some("High"))
            .country("XXX", Some("Gone"), Some("Sub"), None)
            .exclude("XXX")
            .indicator(IndicatorDefinition::new("E", Dimension::Equity, false, FillStrategy::RegionAvg))
            .build()
            .unwrap()
    }

    fn read(path: &Path) -> Vec<Vec<String>> {
        let mut rdr = csv::ReaderBuilder::new().has_headers(false).from_path(path).unwrap();
        rdr.records()
            .map(|r| r.unwrap().iter().map(str::to_string).collect())
            .collect()
    }

    #[test]
    fn scored_table_has_every_column_and_excluded_rows() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("scored.csv");
        let reference = reference();
        let mut panel = Panel::empty(PanelLayout::from_reference(&reference));
        panel.set_cell(0, 0, 0, Cell::original(1.0));
        panel.set_cell(0, 1, 0, Cell::filled(1.0, SourceTag::TemporalFill));
        let scores = scoring::score(&panel, &reference);

        write_scored_table(&path, &panel, &scores, &reference).unwrap();
        let rows = read(&path);

        assert_eq!(
            rows[0],
            vec![
                "ISO_code", "Year", "E", "E (source)", "E (score)", "Equity", "WSI (Baseline)", "Economy",
                "Subregion", "Region", "Income", "Excluded"
            ]
        );
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[2][3], "TEMPORAL_FILL");
        assert_eq!(rows[3][0], "XXX");
        assert_eq!(rows[3][4], "");
        assert_eq!(rows[3][10], "");
        assert_eq!(rows[3][11], "true");
    }

    #[test]
    fn raw_panel_keeps_unparsed_text() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("raw.csv");
        let reference = reference();
        let mut raw = RawPanel::empty(PanelLayout::from_reference(&reference));
        raw.set(0, 1, 0, RawValue::from(".."));

        write_raw_panel(&path, &raw).unwrap();
        let rows = read(&path);
        assert_eq!(rows[0], vec!["ISO_code", "Year", "E"]);
        assert_eq!(rows[2], vec!["AAA", "2001", ".."]);
    }

    #[test]
    fn group_means_and_empty_missingness() {
        let dir = tempdir().unwrap();
        let reference = reference();
        let mut panel = Panel::empty(PanelLayout::from_reference(&reference));
        panel.set_cell(0, 0, 0, Cell::original(3.0));
        let table = GroupMeanTable::build(&panel, &reference, GroupKind::Subregion);

        let means = dir.path().join("region_avgs.csv");
        write_group_means(&means, &table).unwrap();
        let rows = read(&means);
        assert_eq!(rows[0], vec!["Region", "Year", "E"]);
        assert_eq!(rows[1], vec!["Sub", "2000", "3"]);
        assert_eq!(rows[2], vec!["Sub", "2001", ""]);

        let missing = dir.path().join("missing.csv");
        write_missingness(&missing, &[]).unwrap();
        assert_eq!(read(&missing), vec![vec!["ISO_code", "Country", "Missing_Count", "Indicators"]]);
    }
}
