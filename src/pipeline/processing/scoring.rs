//! Scoring engine: per-indicator min-max scores, dimension means and the
//! geometric-mean composite.

use serde::Serialize;
use std::time::Instant;
use tracing::{info, instrument, warn};

use super::group_means::mean;
use crate::observability::metrics;
use crate::pipeline::panel::{Panel, PanelLayout};
use crate::registry::ReferenceData;
use crate::types::Dimension;

/// Min-max scale the present values into [0, 1]. When every present value
/// is equal (or none is present) the input is returned unchanged.
pub fn normalize(values: &[Option<f64>]) -> Vec<Option<f64>> {
    let (min, max) = values
        .iter()
        .flatten()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    if max <= min {
        return values.to_vec();
    }
    let range = max - min;
    values.iter().map(|v| v.map(|v| (v - min) / range)).collect()
}

pub fn invert(values: &mut [Option<f64>]) {
    for v in values.iter_mut().flatten() {
        *v = 1.0 - *v;
    }
}

/// NaN-skipping mean of a dimension's indicator scores
pub fn dimension_score(scores: impl Iterator<Item = Option<f64>>) -> Option<f64> {
    mean(scores.flatten())
}

/// Geometric mean over the present dimension scores. Absent when every
/// dimension is absent or when a present score is negative. A present
/// zero collapses the composite to zero.
pub fn composite(dimensions: &[Option<f64>]) -> Option<f64> {
    let present: Vec<f64> = dimensions.iter().flatten().copied().collect();
    if present.is_empty() || present.iter().any(|v| *v < 0.0) {
        return None;
    }
    let product: f64 = present.iter().product();
    Some(product.powf(1.0 / present.len() as f64))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreRow {
    pub indicator_scores: Vec<Option<f64>>,
    pub dimension_scores: Vec<Option<f64>>,
    pub composite: Option<f64>,
    pub excluded: bool,
}

impl ScoreRow {
    fn absent(indicators: usize, dimensions: usize, excluded: bool) -> Self {
        Self {
            indicator_scores: vec![None; indicators],
            dimension_scores: vec![None; dimensions],
            composite: None,
            excluded,
        }
    }
}

/// Score columns for every `(country, year)` row of the panel, in panel
/// row order. Excluded countries carry absent scores.
#[derive(Debug, Clone)]
pub struct ScoreTable {
    layout: PanelLayout,
    dimensions: Vec<Dimension>,
    rows: Vec<ScoreRow>,
    zero_collapse_rows: usize,
}

impl ScoreTable {
    pub fn dimensions(&self) -> &[Dimension] {
        &self.dimensions
    }

    pub fn row(&self, country: usize, year: usize) -> &ScoreRow {
        &self.rows[self.layout.row_index(country, year)]
    }

    pub fn lookup(&self, iso: &str, year: i32) -> Option<&ScoreRow> {
        let c = self.layout.country_index(iso)?;
        let y = self.layout.year_index(year)?;
        Some(self.row(c, y))
    }

    pub fn rows(&self) -> &[ScoreRow] {
        &self.rows
    }

    /// Rows whose composite collapsed to zero because one present dimension was zero
    pub fn zero_collapse_rows(&self) -> usize {
        self.zero_collapse_rows
    }
}

#[instrument(skip_all)]
pub fn score(panel: &Panel, reference: &ReferenceData) -> ScoreTable {
    let started = Instant::now();
    let layout = panel.layout().clone();
    let n_ind = layout.indicators().len();
    let dimensions = reference.dimensions();
    let years = layout.year_count();
    let n_dim = dimensions.len();

    let included: Vec<usize> = layout
        .countries()
        .iter()
        .enumerate()
        .filter(|(_, iso)| !reference.is_excluded(iso))
        .map(|(c, _)| c)
        .collect();

    let mut rows: Vec<ScoreRow> = layout
        .countries()
        .iter()
        .flat_map(|iso| {
            let excluded = reference.is_excluded(iso);
            (0..years).map(move |_| ScoreRow::absent(n_ind, n_dim, excluded))
        })
        .collect();

    // Indicator scores, normalized across every included row of the panel
    for (i, name) in layout.indicators().iter().enumerate() {
        let keys: Vec<usize> = included
            .iter()
            .flat_map(|&c| (0..years).map(move |y| (c, y)))
            .map(|(c, y)| layout.row_index(c, y))
            .collect();
        let raw: Vec<Option<f64>> = included
            .iter()
            .flat_map(|&c| (0..years).map(move |y| panel.value(c, y, i)))
            .collect();

        let mut scores = normalize(&raw);
        if reference.indicator(name).is_some_and(|def| def.invert) {
            invert(&mut scores);
        }
        for (row, s) in keys.into_iter().zip(scores) {
            rows[row].indicator_scores[i] = s;
        }
    }

    let members: Vec<Vec<usize>> = dimensions
        .iter()
        .map(|d| {
            layout
                .indicators()
                .iter()
                .enumerate()
                .filter(|(_, name)| reference.indicator(name).is_some_and(|def| def.dimension == *d))
                .map(|(i, _)| i)
                .collect()
        })
        .collect();

    let mut zero_collapse_rows = 0usize;
    for row in rows.iter_mut().filter(|r| !r.excluded) {
        for (d, indices) in members.iter().enumerate() {
            row.dimension_scores[d] = dimension_score(indices.iter().map(|&i| row.indicator_scores[i]));
        }
        row.composite = composite(&row.dimension_scores);
        if row.composite == Some(0.0) {
            zero_collapse_rows += 1;
        }
    }

    if zero_collapse_rows > 0 {
        warn!("{} rows have a zero dimension score and a composite of 0", zero_collapse_rows);
    }
    metrics::stage_duration("scoring", started.elapsed().as_secs_f64());
    info!("Scored {} included countries over {} years", included.len(), years);

    ScoreTable {
        layout,
        dimensions,
        rows,
        zero_collapse_rows,
    }
}
