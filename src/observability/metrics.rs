//! Metrics for the index run.
//!
//! Recording goes through the `metrics` facade; when a Prometheus recorder
//! is installed the run renders a snapshot into its output directory.

use std::fmt;
use std::sync::OnceLock;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing::{info, warn};

/// All metric names used by the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricName {
    // Ingestion
    IngestionRowsLoaded,
    IngestionRowsDropped,
    IngestionSchemaViolations,

    // Gap filling
    FillCoercionFailures,
    FillCellsFilled,
    FillLookupMisses,
    FillSkipped,

    // Overrides
    OverrideCellsWritten,

    // Stages
    StageDuration,
}

impl MetricName {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::IngestionRowsLoaded => "wsi_ingestion_rows_loaded_total",
            MetricName::IngestionRowsDropped => "wsi_ingestion_rows_dropped_total",
            MetricName::IngestionSchemaViolations => "wsi_ingestion_schema_violations_total",
            MetricName::FillCoercionFailures => "wsi_fill_coercion_failures_total",
            MetricName::FillCellsFilled => "wsi_fill_cells_filled_total",
            MetricName::FillLookupMisses => "wsi_fill_lookup_misses_total",
            MetricName::FillSkipped => "wsi_fill_skipped_total",
            MetricName::OverrideCellsWritten => "wsi_override_cells_written_total",
            MetricName::StageDuration => "wsi_stage_duration_seconds",
        }
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the Prometheus recorder. Safe to call more than once.
pub fn init() {
    if METRICS_HANDLE.get().is_some() {
        return;
    }
    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            let _ = METRICS_HANDLE.set(handle);
            info!("Metrics recorder installed");
        }
        Err(e) => warn!("Metrics recorder not installed: {}", e),
    }
}

/// Rendered Prometheus text for everything recorded so far, if a recorder is installed
pub fn render_snapshot() -> Option<String> {
    METRICS_HANDLE.get().map(|handle| handle.render())
}

pub fn stage_duration(stage: &str, secs: f64) {
    ::metrics::histogram!(MetricName::StageDuration.as_str(), "stage" => stage.to_string()).record(secs);
}

pub mod ingestion {
    use super::MetricName;

    pub fn rows_loaded(indicator: &str, rows: usize) {
        ::metrics::counter!(MetricName::IngestionRowsLoaded.as_str(), "indicator" => indicator.to_string())
            .increment(rows as u64);
    }

    pub fn rows_dropped(indicator: &str, rows: usize) {
        ::metrics::counter!(MetricName::IngestionRowsDropped.as_str(), "indicator" => indicator.to_string())
            .increment(rows as u64);
    }

    pub fn schema_violation(indicator: &str) {
        ::metrics::counter!(MetricName::IngestionSchemaViolations.as_str(), "indicator" => indicator.to_string())
            .increment(1);
    }
}

pub mod fill {
    use super::MetricName;
    use crate::registry::LookupTable;
    use crate::types::SourceTag;

    pub fn coercion_failures(count: usize) {
        ::metrics::counter!(MetricName::FillCoercionFailures.as_str()).increment(count as u64);
    }

    pub fn cells_filled(tag: SourceTag, count: usize) {
        ::metrics::counter!(MetricName::FillCellsFilled.as_str(), "tag" => tag.as_str())
            .increment(count as u64);
    }

    pub fn lookup_miss(table: LookupTable) {
        ::metrics::counter!(MetricName::FillLookupMisses.as_str(), "table" => table.to_string()).increment(1);
    }

    pub fn skipped(indicator: &str) {
        ::metrics::counter!(MetricName::FillSkipped.as_str(), "indicator" => indicator.to_string()).increment(1);
    }
}

pub mod overrides {
    use super::MetricName;

    pub fn cells_written(rule: &str, count: usize) {
        ::metrics::counter!(MetricName::OverrideCellsWritten.as_str(), "rule" => rule.to_string())
            .increment(count as u64);
    }
}
