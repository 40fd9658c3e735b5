// Index pipeline: ingestion, assembly, gap filling, overrides and scoring

pub mod diagnostics;
pub mod ingestion;
pub mod panel;
pub mod processing;

use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument, warn};

use crate::config::Config;
use crate::constants::{
    DIAGNOSTICS_FILE, INCOME_AVGS_FILE, METRICS_FILE, MISSINGNESS_FILE, RAW_PANEL_FILE, REGION_AVGS_FILE,
    SCORED_TABLE_FILE,
};
use crate::error::Result;
use crate::infra::table_output;
use crate::observability::metrics;
use crate::registry::ReferenceData;
use crate::types::SourceTag;

use diagnostics::Diagnostics;
use ingestion::{run_adapters, IndicatorAdapter};
use panel::{assemble, missingness_summary, AssemblyReport, MissingnessEntry, Panel, RawPanel};
use processing::{
    builtin_rules, cross_sectional, overrides, scoring, temporal_fill, FillReport, GroupKind, GroupMeanTable,
    OverrideRule, ScoreTable,
};

/// Where a run wrote its artifacts
#[derive(Debug, Clone, Serialize)]
pub struct OutputPaths {
    pub raw_panel: PathBuf,
    pub missingness: PathBuf,
    pub region_avgs: PathBuf,
    pub income_avgs: PathBuf,
    pub scored_table: PathBuf,
    pub diagnostics: PathBuf,
    pub metrics: Option<PathBuf>,
}

impl OutputPaths {
    fn under(dir: &Path) -> Self {
        Self {
            raw_panel: dir.join(RAW_PANEL_FILE),
            missingness: dir.join(MISSINGNESS_FILE),
            region_avgs: dir.join(REGION_AVGS_FILE),
            income_avgs: dir.join(INCOME_AVGS_FILE),
            scored_table: dir.join(SCORED_TABLE_FILE),
            diagnostics: dir.join(DIAGNOSTICS_FILE),
            metrics: None,
        }
    }
}

/// Result of a complete pipeline run
#[derive(Debug)]
pub struct PipelineResult {
    pub panel: Panel,
    pub scores: ScoreTable,
    pub diagnostics: Diagnostics,
    pub missingness: Vec<MissingnessEntry>,
    pub temporal_cells: usize,
    pub fill_report: FillReport,
    pub override_counts: Vec<(String, usize)>,
    pub paths: OutputPaths,
}

impl PipelineResult {
    pub fn cell_count(&self, tag: SourceTag) -> usize {
        let layout = self.panel.layout();
        let mut count = 0;
        for c in 0..layout.countries().len() {
            for y in 0..layout.year_count() {
                for i in 0..layout.indicators().len() {
                    if self.panel.cell(c, y, i).tag == tag {
                        count += 1;
                    }
                }
            }
        }
        count
    }
}

/// Ingestion and assembly only, without writing anything
#[derive(Debug)]
pub struct ValidationReport {
    pub assembly: AssemblyReport,
    pub missingness: Vec<MissingnessEntry>,
    pub diagnostics: Diagnostics,
}

pub struct Pipeline;

impl Pipeline {
    /// Full run with the built-in override rules
    pub async fn run(
        config: &Config,
        reference: &ReferenceData,
        adapters: Vec<Arc<dyn IndicatorAdapter>>,
    ) -> Result<PipelineResult> {
        Self::run_with_rules(config, reference, adapters, &builtin_rules()).await
    }

    #[instrument(skip_all, fields(output_dir = %config.output_dir.display()))]
    pub async fn run_with_rules(
        config: &Config,
        reference: &ReferenceData,
        adapters: Vec<Arc<dyn IndicatorAdapter>>,
        rules: &[OverrideRule],
    ) -> Result<PipelineResult> {
        let started = Instant::now();
        let mut diagnostics = Diagnostics::new();
        let mut paths = OutputPaths::under(&config.output_dir);
        info!("Starting index run {}", diagnostics.run_id);

        // Ingest and assemble; schema violations end the run here
        let (raw, assembly) = Self::ingest(reference, adapters, &mut diagnostics).await?;
        let missingness = missingness_summary(&raw, reference);
        table_output::write_raw_panel(&paths.raw_panel, &raw)?;
        table_output::write_missingness(&paths.missingness, &missingness)?;
        info!(
            "{} values joined, {} countries with fully missing indicators",
            assembly.rows_joined,
            missingness.len()
        );

        // Temporal fill
        let (mut panel, coercion_failures) = temporal_fill::coerce(&raw);
        diagnostics.coercion_failures = coercion_failures;
        let temporal_cells = temporal_fill::apply(&mut panel, reference);
        diagnostics.record_fills(SourceTag::TemporalFill, temporal_cells);

        // Pass 1: immutable group means from the temporally filled panel
        let region_means = GroupMeanTable::build(&panel, reference, GroupKind::Subregion);
        let income_means = GroupMeanTable::build(&panel, reference, GroupKind::Income);
        table_output::write_group_means(&paths.region_avgs, &region_means)?;
        table_output::write_group_means(&paths.income_avgs, &income_means)?;

        // Pass 2: substitution by lookup
        let fill_report = cross_sectional::apply(&mut panel, reference, &region_means, &income_means, &mut diagnostics);

        let override_counts = overrides::apply_all(&mut panel, reference, rules);
        for (rule, (name, count)) in rules.iter().zip(&override_counts) {
            diagnostics.record_override(name, *count);
            diagnostics.record_fills(rule.tag, *count);
        }

        let scores = scoring::score(&panel, reference);
        diagnostics.zero_collapse_rows = scores.zero_collapse_rows();
        table_output::write_scored_table(&paths.scored_table, &panel, &scores, reference)?;

        metrics::stage_duration("total", started.elapsed().as_secs_f64());
        diagnostics.finish();
        table_output::write_diagnostics(&paths.diagnostics, &diagnostics)?;

        let metrics_path = config.output_dir.join(METRICS_FILE);
        if table_output::write_metrics_snapshot(&metrics_path)? {
            paths.metrics = Some(metrics_path);
        }

        info!(
            "Index run {} finished in {:.2}s",
            diagnostics.run_id,
            started.elapsed().as_secs_f64()
        );

        Ok(PipelineResult {
            panel,
            scores,
            diagnostics,
            missingness,
            temporal_cells,
            fill_report,
            override_counts,
            paths,
        })
    }

    /// Run the adapters and assemble the panel, reporting schema violations
    /// and missingness without filling, scoring or writing outputs
    pub async fn validate(
        reference: &ReferenceData,
        adapters: Vec<Arc<dyn IndicatorAdapter>>,
    ) -> Result<ValidationReport> {
        let mut diagnostics = Diagnostics::new();
        let (raw, assembly) = Self::ingest(reference, adapters, &mut diagnostics).await?;
        let missingness = missingness_summary(&raw, reference);
        diagnostics.finish();
        Ok(ValidationReport {
            assembly,
            missingness,
            diagnostics,
        })
    }

    async fn ingest(
        reference: &ReferenceData,
        adapters: Vec<Arc<dyn IndicatorAdapter>>,
        diagnostics: &mut Diagnostics,
    ) -> Result<(RawPanel, AssemblyReport)> {
        let misses = reference.lookup_misses();
        for miss in &misses {
            warn!("Reference lookup miss: {} has no {} mapping", miss.iso_code, miss.table);
        }
        diagnostics.record_lookup_misses(&misses);

        let filter = Arc::new(reference.countries().to_vec());
        let outputs = run_adapters(adapters, &reference.indicator_names(), Some(filter)).await?;
        for output in &outputs {
            diagnostics.record_input(&output.indicator, output.rows.len(), output.fingerprint.clone());
        }

        let (raw, assembly) = assemble(reference, &outputs)?;
        diagnostics.rows_joined = assembly.rows_joined;
        diagnostics.rows_out_of_range = assembly.rows_out_of_range;
        Ok((raw, assembly))
    }
}
