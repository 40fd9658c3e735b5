//! Cross-sectional fallback (pass 2).
//!
//! Only series that are still entirely absent after temporal fill are
//! substituted, and only from the precomputed group-mean tables.

use serde::Serialize;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

use super::group_means::{GroupKind, GroupMeanTable};
use crate::observability::metrics;
use crate::pipeline::diagnostics::Diagnostics;
use crate::pipeline::panel::Panel;
use crate::registry::{LookupTable, ReferenceData};
use crate::types::{Cell, FillStrategy, SourceTag};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FillReport {
    pub region_avg_cells: usize,
    pub income_avg_cells: usize,
    pub series_substituted: usize,
    pub skipped: usize,
}

impl FillReport {
    pub fn total_cells(&self) -> usize {
        self.region_avg_cells + self.income_avg_cells
    }
}

#[instrument(skip_all)]
pub fn apply(
    panel: &mut Panel,
    reference: &ReferenceData,
    region_means: &GroupMeanTable,
    income_means: &GroupMeanTable,
    diagnostics: &mut Diagnostics,
) -> FillReport {
    let started = Instant::now();
    let layout = panel.layout().clone();
    let mut report = FillReport::default();

    for (i, indicator) in layout.indicators().iter().enumerate() {
        let Some(def) = reference.indicator(indicator) else {
            continue;
        };
        let (table, tag, lookup) = match def.fill {
            FillStrategy::RegionAvg => (region_means, SourceTag::RegionAvg, LookupTable::Subregion),
            FillStrategy::IncomeAvg => (income_means, SourceTag::IncomeAvg, LookupTable::Income),
            FillStrategy::None => continue,
        };

        for (c, iso) in layout.countries().iter().enumerate() {
            if reference.is_excluded(iso) || panel.has_any_value(c, i) {
                continue;
            }
            let kind = table.kind();
            let Some(group) = kind.group_of(reference, iso) else {
                warn!("{} has no {} mapping; skipping {} fill for {}", iso, lookup, tag, indicator);
                metrics::fill::lookup_miss(lookup);
                metrics::fill::skipped(indicator);
                diagnostics.record_skipped_fill(iso, indicator, lookup);
                report.skipped += 1;
                continue;
            };

            let mut written = 0usize;
            for y in 0..layout.year_count() {
                if let Some(mean) = table.get(group, y, i) {
                    panel.set_cell(c, y, i, Cell::filled(mean, tag));
                    written += 1;
                }
            }
            debug!("{} / {}: {} cells from {:?} '{}' mean", iso, indicator, written, kind, group);

            if written > 0 {
                report.series_substituted += 1;
                match kind {
                    GroupKind::Subregion => report.region_avg_cells += written,
                    GroupKind::Income => report.income_avg_cells += written,
                }
            }
        }
    }

    metrics::fill::cells_filled(SourceTag::RegionAvg, report.region_avg_cells);
    metrics::fill::cells_filled(SourceTag::IncomeAvg, report.income_avg_cells);
    diagnostics.record_fills(SourceTag::RegionAvg, report.region_avg_cells);
    diagnostics.record_fills(SourceTag::IncomeAvg, report.income_avg_cells);
    metrics::stage_duration("cross_sectional_fill", started.elapsed().as_secs_f64());
    info!(
        "Cross-sectional fill complete: {} series, {} region cells, {} income cells, {} skipped",
        report.series_substituted, report.region_avg_cells, report.income_avg_cells, report.skipped
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::panel::PanelLayout;
    use crate::types::{Dimension, IndicatorDefinition};

    // R = region_avg indicator, I = income_avg indicator, N = no fallback
    fn reference() -> ReferenceData {
        ReferenceData::builder(2000, 2002)
            .subregion("North", "R")
            .subregion("South", "R")
            .country("AAA", Some("A"), Some("North"), Some("High"))
            .country("BBB", Some("B"), Some("North"), Some("High"))
            .country("CCC", Some("C"), Some("North"), None)
            .country("DDD", Some("D"), Some("South"), Some("Low"))
            .country("XXX", Some("X"), Some("North"), Some("High"))
            .exclude("XXX")
            .indicator(IndicatorDefinition::new("R", Dimension::Equity, false, FillStrategy::RegionAvg))
            .indicator(IndicatorDefinition::new("I", Dimension::Resilience, false, FillStrategy::IncomeAvg))
            .indicator(IndicatorDefinition::new("N", Dimension::Protection, false, FillStrategy::None))
            .build()
            .unwrap()
    }

    fn run(panel: &mut Panel, reference: &ReferenceData) -> (FillReport, Diagnostics) {
        let region = GroupMeanTable::build(panel, reference, GroupKind::Subregion);
        let income = GroupMeanTable::build(panel, reference, GroupKind::Income);
        let mut diagnostics = Diagnostics::new();
        let report = apply(panel, reference, &region, &income, &mut diagnostics);
        (report, diagnostics)
    }

    #[test]
    fn absent_series_gets_the_subregion_mean_per_year() {
        let reference = reference();
        let mut panel = Panel::empty(PanelLayout::from_reference(&reference));
        for y in 0..3 {
            panel.set_cell(0, y, 0, Cell::original(10.0 + y as f64));
            panel.set_cell(2, y, 0, Cell::original(20.0 + y as f64));
        }

        let (report, _) = run(&mut panel, &reference);

        assert_eq!(panel.cell(1, 0, 0), Cell::filled(15.0, SourceTag::RegionAvg));
        assert_eq!(panel.cell(1, 2, 0), Cell::filled(17.0, SourceTag::RegionAvg));
        assert_eq!(report.region_avg_cells, 3);
        // DDD is alone in South with no data: nothing to substitute
        assert_eq!(panel.value(3, 0, 0), None);
        // excluded country is never filled
        assert_eq!(panel.value(4, 0, 0), None);
    }

    #[test]
    fn one_real_observation_blocks_substitution() {
        let reference = reference();
        let mut panel = Panel::empty(PanelLayout::from_reference(&reference));
        for y in 0..3 {
            panel.set_cell(0, y, 0, Cell::original(10.0));
        }
        panel.set_cell(1, 1, 0, Cell::original(99.0));

        run(&mut panel, &reference);

        assert_eq!(panel.cell(1, 0, 0), Cell::EMPTY);
        assert_eq!(panel.cell(1, 1, 0), Cell::original(99.0));
    }

    #[test]
    fn substitution_does_not_feed_on_itself() {
        let reference = reference();
        let mut panel = Panel::empty(PanelLayout::from_reference(&reference));
        panel.set_cell(0, 0, 0, Cell::original(4.0));

        run(&mut panel, &reference);

        // BBB and CCC both see the pre-substitution mean of AAA alone
        assert_eq!(panel.value(1, 0, 0), Some(4.0));
        assert_eq!(panel.value(2, 0, 0), Some(4.0));
        // no group value for later years leaves cells absent
        assert_eq!(panel.cell(1, 1, 0), Cell::EMPTY);
    }

    #[test]
    fn income_lookup_miss_is_skipped_and_reported() {
        let reference = reference();
        let mut panel = Panel::empty(PanelLayout::from_reference(&reference));
        for y in 0..3 {
            panel.set_cell(0, y, 1, Cell::original(1.0));
        }

        let (report, diagnostics) = run(&mut panel, &reference);

        assert_eq!(panel.cell(1, 0, 1), Cell::filled(1.0, SourceTag::IncomeAvg));
        assert_eq!(panel.cell(2, 0, 1), Cell::EMPTY);
        assert_eq!(report.skipped, 1);
        assert_eq!(diagnostics.skipped_fills.len(), 1);
        assert_eq!(diagnostics.skipped_fills[0].iso_code, "CCC");
        assert!(diagnostics.lookup_misses["CCC"].contains(&LookupTable::Income));
        assert_eq!(diagnostics.fill_count(SourceTag::IncomeAvg), report.income_avg_cells);
    }

    #[test]
    fn subregion_lookup_miss_is_skipped_and_reported() {
        let reference = ReferenceData::builder(2000, 2001)
            .subregion("North", "R")
            .country("AAA", Some("A"), Some("North"), Some("High"))
            .country("BBB", Some("B"), Some("North"), Some("High"))
            .country("NOS", Some("No subregion"), None, Some("High"))
            .indicator(IndicatorDefinition::new("R", Dimension::Equity, false, FillStrategy::RegionAvg))
            .build()
            .unwrap();
        let mut panel = Panel::empty(PanelLayout::from_reference(&reference));
        panel.set_cell(0, 0, 0, Cell::original(2.0));
        panel.set_cell(0, 1, 0, Cell::original(4.0));

        let (report, diagnostics) = run(&mut panel, &reference);

        // BBB still fills from North
        assert_eq!(panel.cell(1, 0, 0), Cell::filled(2.0, SourceTag::RegionAvg));
        assert_eq!(panel.cell(1, 1, 0), Cell::filled(4.0, SourceTag::RegionAvg));
        assert_eq!(report.region_avg_cells, 2);
        assert_eq!(panel.cell(2, 0, 0), Cell::EMPTY);
        assert_eq!(panel.cell(2, 1, 0), Cell::EMPTY);
        assert_eq!(report.skipped, 1);
        assert_eq!(diagnostics.skipped_fills.len(), 1);
        assert_eq!(diagnostics.skipped_fills[0].iso_code, "NOS");
        assert_eq!(diagnostics.skipped_fills[0].table, LookupTable::Subregion);
        assert!(diagnostics.lookup_misses["NOS"].contains(&LookupTable::Subregion));
    }

    #[test]
    fn no_fallback_strategy_leaves_gaps() {
        let reference = reference();
        let mut panel = Panel::empty(PanelLayout::from_reference(&reference));
        panel.set_cell(0, 0, 2, Cell::original(1.0));

        let (report, _) = run(&mut panel, &reference);

        assert_eq!(panel.value(1, 0, 2), None);
        assert_eq!(report.total_cells(), 0);
    }
}
