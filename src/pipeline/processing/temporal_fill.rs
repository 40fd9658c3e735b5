//! Per-country temporal gap filling.
//!
//! Each (country, indicator) series is filled independently: linear
//! interpolation across interior gaps, then forward fill, then backward
//! fill. Every cell that goes from absent to present is tagged
//! `TEMPORAL_FILL`; observed cells keep `ORIGINAL`.

use std::time::Instant;
use tracing::{debug, info, instrument};

use crate::observability::metrics;
use crate::pipeline::panel::{Panel, RawPanel};
use crate::registry::ReferenceData;
use crate::types::{Cell, SourceTag};

/// Numeric coercion of the raw panel. Unparseable entries become absent.
/// Returns the panel and the number of entries that failed to coerce.
pub fn coerce(raw: &RawPanel) -> (Panel, usize) {
    let layout = raw.layout().clone();
    let mut panel = Panel::empty(layout.clone());
    let mut failures = 0usize;

    for c in 0..layout.countries().len() {
        for y in 0..layout.year_count() {
            for i in 0..layout.indicators().len() {
                if let Some(raw_value) = raw.get(c, y, i) {
                    match raw_value.coerce() {
                        Some(v) => panel.set_cell(c, y, i, Cell::original(v)),
                        None => {
                            debug!(
                                "Unparseable value '{}' for {} {} {}",
                                raw_value,
                                layout.countries()[c],
                                layout.year_at(y),
                                layout.indicators()[i]
                            );
                            failures += 1;
                        }
                    }
                }
            }
        }
    }

    if failures > 0 {
        metrics::fill::coercion_failures(failures);
    }
    (panel, failures)
}

/// Fill one year-ordered series in place. Returns the number of cells filled.
///
/// Adjacent entries are one year apart, so index distance is elapsed years.
pub fn fill_series(series: &mut [Cell]) -> usize {
    let known: Vec<usize> = series
        .iter()
        .enumerate()
        .filter(|(_, cell)| cell.is_present())
        .map(|(i, _)| i)
        .collect();
    let (Some(&first), Some(&last)) = (known.first(), known.last()) else {
        return 0;
    };

    let mut filled = 0usize;

    // Interior gaps
    for pair in known.windows(2) {
        let (lo, hi) = (pair[0], pair[1]);
        let (Some(v_lo), Some(v_hi)) = (series[lo].value, series[hi].value) else {
            continue;
        };
        let span = (hi - lo) as f64;
        for i in lo + 1..hi {
            let t = (i - lo) as f64 / span;
            series[i] = Cell::filled(v_lo + (v_hi - v_lo) * t, SourceTag::TemporalFill);
            filled += 1;
        }
    }

    // Forward fill past the last observation
    if let Some(v) = series[last].value {
        for cell in series[last + 1..].iter_mut() {
            *cell = Cell::filled(v, SourceTag::TemporalFill);
            filled += 1;
        }
    }

    // Backward fill before the first observation
    if let Some(v) = series[first].value {
        for cell in series[..first].iter_mut() {
            *cell = Cell::filled(v, SourceTag::TemporalFill);
            filled += 1;
        }
    }

    filled
}

/// Temporal fill for every included country and indicator.
/// Excluded countries are carried unfilled.
#[instrument(skip_all)]
pub fn apply(panel: &mut Panel, reference: &ReferenceData) -> usize {
    let started = Instant::now();
    let layout = panel.layout().clone();
    let mut filled = 0usize;

    for (c, iso) in layout.countries().iter().enumerate() {
        if reference.is_excluded(iso) {
            continue;
        }
        for i in 0..layout.indicators().len() {
            let mut series = panel.series(c, i);
            let n = fill_series(&mut series);
            if n > 0 {
                debug!("{} / {}: {} cells filled temporally", iso, layout.indicators()[i], n);
                panel.set_series(c, i, &series);
                filled += n;
            }
        }
    }

    metrics::fill::cells_filled(SourceTag::TemporalFill, filled);
    metrics::stage_duration("temporal_fill", started.elapsed().as_secs_f64());
    info!("Temporal fill complete: {} cells filled", filled);
    filled
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::panel::PanelLayout;
    use crate::types::RawValue;

    fn series(values: &[Option<f64>]) -> Vec<Cell> {
        values
            .iter()
            .map(|v| match v {
                Some(v) => Cell::original(*v),
                None => Cell::EMPTY,
            })
            .collect()
    }

    fn values(series: &[Cell]) -> Vec<Option<f64>> {
        series.iter().map(|c| c.value).collect()
    }

    fn tags(series: &[Cell]) -> Vec<SourceTag> {
        series.iter().map(|c| c.tag).collect()
    }

    #[test]
    fn interior_gap_is_interpolated_linearly() {
        let mut s = series(&[Some(10.0), None, None, Some(40.0)]);
        assert_eq!(fill_series(&mut s), 2);
        assert_eq!(values(&s), vec![Some(10.0), Some(20.0), Some(30.0), Some(40.0)]);
        assert_eq!(
            tags(&s),
            vec![SourceTag::Original, SourceTag::TemporalFill, SourceTag::TemporalFill, SourceTag::Original]
        );
    }

    #[test]
    fn leading_gap_is_backward_filled() {
        let mut s = series(&[None, None, Some(5.0), Some(8.0)]);
        fill_series(&mut s);
        assert_eq!(values(&s), vec![Some(5.0), Some(5.0), Some(5.0), Some(8.0)]);
        assert_eq!(
            tags(&s),
            vec![SourceTag::TemporalFill, SourceTag::TemporalFill, SourceTag::Original, SourceTag::Original]
        );
    }

    #[test]
    fn trailing_gap_is_forward_filled() {
        let mut s = series(&[Some(2.0), None, Some(4.0), None, None]);
        fill_series(&mut s);
        assert_eq!(values(&s), vec![Some(2.0), Some(3.0), Some(4.0), Some(4.0), Some(4.0)]);
    }

    #[test]
    fn wide_gap_has_no_width_limit() {
        let mut s = series(&[Some(0.0), None, None, None, None, None, None, None, None, None, Some(10.0)]);
        fill_series(&mut s);
        assert_eq!(s[7].value, Some(7.0));
    }

    #[test]
    fn single_observation_covers_the_whole_range() {
        let mut s = series(&[None, None, Some(3.5), None]);
        assert_eq!(fill_series(&mut s), 3);
        assert!(s.iter().all(|c| c.value == Some(3.5)));
        assert_eq!(s[2].tag, SourceTag::Original);
    }

    #[test]
    fn empty_series_stays_absent_and_untagged() {
        let mut s = series(&[None, None, None]);
        assert_eq!(fill_series(&mut s), 0);
        assert!(s.iter().all(|c| *c == Cell::EMPTY));
    }

    #[test]
    fn any_known_value_gives_full_coverage() {
        let patterns: [&[Option<f64>]; 4] = [
            &[Some(1.0), None, None, None, None],
            &[None, None, None, None, Some(1.0)],
            &[None, Some(1.0), None, Some(2.0), None],
            &[Some(1.0), None, Some(2.0), None, Some(3.0)],
        ];
        for pattern in patterns {
            let mut s = series(pattern);
            fill_series(&mut s);
            assert!(s.iter().all(Cell::is_present), "pattern {:?} left gaps", pattern);
        }
    }

    #[test]
    fn coercion_drops_unparseable_values_and_skips_excluded() {
        let reference = ReferenceData::builder(2000, 2002)
            .subregion("Sub", "Region")
            .country("AAA", Some("Alpha"), Some("Sub"), Some("High"))
            .country("XXX", Some("Excluded"), Some("Sub"), Some("High"))
            .exclude("XXX")
            .indicator(crate::types::IndicatorDefinition::new(
                "X",
                crate::types::Dimension::Equity,
                false,
                crate::types::FillStrategy::None,
            ))
            .build()
            .unwrap();
        let mut raw = RawPanel::empty(PanelLayout::from_reference(&reference));
        raw.set(0, 0, 0, RawValue::from("1.5"));
        raw.set(0, 1, 0, RawValue::from("n/a"));
        raw.set(1, 0, 0, RawValue::Number(9.0));

        let (mut panel, failures) = coerce(&raw);
        assert_eq!(failures, 1);
        assert_eq!(panel.cell(0, 1, 0), Cell::EMPTY);

        apply(&mut panel, &reference);
        assert_eq!(panel.value(0, 2, 0), Some(1.5));
        assert_eq!(panel.cell(0, 1, 0).tag, SourceTag::TemporalFill);
        // excluded country keeps its raw shape
        assert_eq!(panel.cell(1, 1, 0), Cell::EMPTY);
        assert_eq!(panel.cell(1, 0, 0), Cell::original(9.0));
    }
}
