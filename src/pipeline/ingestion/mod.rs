//! Indicator ingestion: the adapter contract and the concurrent fan-out
//! that collects every adapter's long-format table before assembly.

pub mod file_adapters;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinSet;
use tracing::{debug, info, instrument};

use crate::error::{Result, WsiError};
use crate::observability::metrics;
use crate::types::IndicatorRow;

pub use file_adapters::{LongCsvAdapter, WideCsvAdapter};

/// Converts one raw source into an indicator's canonical long-format table.
///
/// Implementations must not emit duplicate `(country, year)` keys and must not
/// depend on pipeline state. When a filter is given, rows for other countries
/// are dropped by the adapter.
pub trait IndicatorAdapter: Send + Sync {
    /// Name of the indicator this adapter produces
    fn indicator(&self) -> &str;

    /// Produce the indicator's rows, optionally restricted to a country set
    fn build(&self, filter: Option<&[String]>) -> Result<Vec<IndicatorRow>>;

    /// Content fingerprint of the underlying input, recorded in the run manifest
    fn fingerprint(&self) -> Option<String> {
        None
    }
}

/// Adapter over rows that are already in memory
#[derive(Debug, Clone)]
pub struct StaticAdapter {
    indicator: String,
    rows: Vec<IndicatorRow>,
}

impl StaticAdapter {
    pub fn new(indicator: &str, rows: Vec<IndicatorRow>) -> Self {
        Self {
            indicator: indicator.to_string(),
            rows,
        }
    }

    /// Build from `(iso, year, value)` triples
    pub fn from_values(indicator: &str, values: &[(&str, i32, f64)]) -> Self {
        let rows = values
            .iter()
            .map(|(iso, year, value)| IndicatorRow::new(iso, *year, *value))
            .collect();
        Self::new(indicator, rows)
    }
}

impl IndicatorAdapter for StaticAdapter {
    fn indicator(&self) -> &str {
        &self.indicator
    }

    fn build(&self, filter: Option<&[String]>) -> Result<Vec<IndicatorRow>> {
        Ok(self
            .rows
            .iter()
            .filter(|row| passes_filter(filter, &row.iso_code))
            .cloned()
            .collect())
    }
}

pub(crate) fn passes_filter(filter: Option<&[String]>, iso: &str) -> bool {
    filter.map_or(true, |codes| codes.iter().any(|c| c == iso))
}

/// One adapter's output, as handed to the panel assembler
#[derive(Debug, Clone)]
pub struct AdapterOutput {
    pub indicator: String,
    pub rows: Vec<IndicatorRow>,
    pub fingerprint: Option<String>,
}

/// Run every adapter on a blocking task and return their outputs in
/// `indicator_order`. Completion order never affects the result.
#[instrument(skip_all, fields(adapters = adapters.len()))]
pub async fn run_adapters(
    adapters: Vec<Arc<dyn IndicatorAdapter>>,
    indicator_order: &[String],
    filter: Option<Arc<Vec<String>>>,
) -> Result<Vec<AdapterOutput>> {
    let started = Instant::now();
    let mut tasks = JoinSet::new();

    for adapter in adapters {
        let filter = filter.clone();
        tasks.spawn_blocking(move || {
            let indicator = adapter.indicator().to_string();
            let rows = adapter.build(filter.as_deref().map(|f| f.as_slice()))?;
            debug!("Adapter for {} produced {} rows", indicator, rows.len());
            Ok::<_, WsiError>(AdapterOutput {
                fingerprint: adapter.fingerprint(),
                indicator,
                rows,
            })
        });
    }

    let mut by_indicator: HashMap<String, AdapterOutput> = HashMap::new();
    while let Some(joined) = tasks.join_next().await {
        let output = joined??;
        metrics::ingestion::rows_loaded(&output.indicator, output.rows.len());
        if by_indicator.contains_key(&output.indicator) {
            return Err(WsiError::Config(format!(
                "more than one adapter produces '{}'",
                output.indicator
            )));
        }
        by_indicator.insert(output.indicator.clone(), output);
    }

    let mut ordered = Vec::with_capacity(indicator_order.len());
    for name in indicator_order {
        let output = by_indicator
            .remove(name)
            .ok_or_else(|| WsiError::Config(format!("no adapter configured for '{}'", name)))?;
        ordered.push(output);
    }
    if let Some(extra) = by_indicator.keys().next() {
        return Err(WsiError::Config(format!(
            "adapter produces unknown indicator '{}'",
            extra
        )));
    }

    metrics::stage_duration("ingestion", started.elapsed().as_secs_f64());
    info!(
        "Collected {} indicator tables ({} rows)",
        ordered.len(),
        ordered.iter().map(|o| o.rows.len()).sum::<usize>()
    );
    Ok(ordered)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn outputs_follow_indicator_order() {
        let adapters: Vec<Arc<dyn IndicatorAdapter>> = vec![
            Arc::new(StaticAdapter::from_values("B", &[("AAA", 2000, 2.0)])),
            Arc::new(StaticAdapter::from_values("A", &[("AAA", 2000, 1.0)])),
        ];
        let outputs = run_adapters(adapters, &order(&["A", "B"]), None).await.unwrap();
        let names: Vec<_> = outputs.iter().map(|o| o.indicator.as_str()).collect();
        assert_eq!(names, vec!["A", "B"]);
    }

    #[tokio::test]
    async fn missing_adapter_is_a_config_error() {
        let adapters: Vec<Arc<dyn IndicatorAdapter>> =
            vec![Arc::new(StaticAdapter::from_values("A", &[]))];
        let err = run_adapters(adapters, &order(&["A", "B"]), None).await.unwrap_err();
        assert!(matches!(err, WsiError::Config(_)));
    }

    #[tokio::test]
    async fn filter_is_passed_to_adapters() {
        let adapters: Vec<Arc<dyn IndicatorAdapter>> = vec![Arc::new(StaticAdapter::from_values(
            "A",
            &[("AAA", 2000, 1.0), ("WLD", 2000, 9.0)],
        ))];
        let filter = Arc::new(vec!["AAA".to_string()]);
        let outputs = run_adapters(adapters, &order(&["A"]), Some(filter)).await.unwrap();
        assert_eq!(outputs[0].rows.len(), 1);
        assert_eq!(outputs[0].rows[0].iso_code, "AAA");
    }
}
