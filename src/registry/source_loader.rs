use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use super::reference::ReferenceData;
use crate::error::{Result, WsiError};
use crate::pipeline::ingestion::{IndicatorAdapter, LongCsvAdapter, WideCsvAdapter};

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SourceFormat {
    Long,
    Wide,
}

/// One `[[source]]` entry of the source registry
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SourceSpec {
    pub indicator: String,
    pub format: SourceFormat,
    /// Relative paths resolve against the data directory
    pub file: PathBuf,
    pub country_column: Option<String>,
    pub year_column: Option<String>,
    pub value_column: Option<String>,
    pub series_column: Option<String>,
    pub series_code: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Default)]
pub struct SourceRegistryFile {
    #[serde(rename = "source", default)]
    pub sources: Vec<SourceSpec>,
}

impl SourceSpec {
    fn resolve(&self, data_dir: &Path) -> PathBuf {
        if self.file.is_absolute() {
            self.file.clone()
        } else {
            data_dir.join(&self.file)
        }
    }

    pub fn to_adapter(&self, data_dir: &Path) -> Result<Arc<dyn IndicatorAdapter>> {
        let path = self.resolve(data_dir);
        match self.format {
            SourceFormat::Long => {
                let country = self.country_column.as_deref().unwrap_or("ISO_code");
                let year = self.year_column.as_deref().unwrap_or("Year");
                let value = self.value_column.as_deref().unwrap_or(&self.indicator);
                Ok(Arc::new(
                    LongCsvAdapter::new(&self.indicator, path).with_columns(country, year, value),
                ))
            }
            SourceFormat::Wide => {
                let mut adapter = WideCsvAdapter::new(&self.indicator, path)
                    .with_country_column(self.country_column.as_deref().unwrap_or("Country Code"));
                match (&self.series_column, &self.series_code) {
                    (Some(column), Some(code)) => adapter = adapter.with_series(column, code),
                    (None, None) => {}
                    _ => {
                        return Err(WsiError::Config(format!(
                            "source for '{}' needs both series_column and series_code",
                            self.indicator
                        )))
                    }
                }
                Ok(Arc::new(adapter))
            }
        }
    }
}

/// Load and check the source registry: every configured indicator has
/// exactly one source and every source names a configured indicator.
pub fn load_sources(path: &Path, reference: &ReferenceData) -> Result<Vec<SourceSpec>> {
    let content = fs::read_to_string(path).map_err(|e| {
        WsiError::Config(format!("Failed to read source registry '{}': {}", path.display(), e))
    })?;
    let registry: SourceRegistryFile = toml::from_str(&content)?;
    check_coverage(&registry.sources, reference)?;
    info!("Loaded {} sources from {}", registry.sources.len(), path.display());
    Ok(registry.sources)
}

pub fn check_coverage(sources: &[SourceSpec], reference: &ReferenceData) -> Result<()> {
    let mut seen = HashSet::new();
    for spec in sources {
        if reference.indicator(&spec.indicator).is_none() {
            return Err(WsiError::Config(format!(
                "source registered for unknown indicator '{}'",
                spec.indicator
            )));
        }
        if !seen.insert(spec.indicator.as_str()) {
            return Err(WsiError::Config(format!(
                "indicator '{}' has more than one source",
                spec.indicator
            )));
        }
    }
    for def in reference.indicators() {
        if !seen.contains(def.name.as_str()) {
            return Err(WsiError::Config(format!("indicator '{}' has no source", def.name)));
        }
    }
    Ok(())
}

pub fn build_adapters(sources: &[SourceSpec], data_dir: &Path) -> Result<Vec<Arc<dyn IndicatorAdapter>>> {
    sources.iter().map(|spec| spec.to_adapter(data_dir)).collect()
}
