/// Output file names, written under the configured output directory
pub const RAW_PANEL_FILE: &str = "raw_baseline_indicators.csv";
pub const MISSINGNESS_FILE: &str = "missing_indicators_summary.csv";
pub const REGION_AVGS_FILE: &str = "region_avgs.csv";
pub const INCOME_AVGS_FILE: &str = "income_avgs.csv";
pub const SCORED_TABLE_FILE: &str = "womens_safety_index_baseline.csv";
pub const DIAGNOSTICS_FILE: &str = "diagnostics.json";
pub const METRICS_FILE: &str = "metrics.prom";

// Column names in the scored table
pub const COUNTRY_COLUMN: &str = "ISO_code";
pub const YEAR_COLUMN: &str = "Year";
pub const COMPOSITE_COLUMN: &str = "WSI (Baseline)";
pub const ECONOMY_COLUMN: &str = "Economy";
pub const SUBREGION_COLUMN: &str = "Subregion";
pub const REGION_COLUMN: &str = "Region";
pub const INCOME_COLUMN: &str = "Income";
pub const EXCLUDED_COLUMN: &str = "Excluded";

/// Runtime configuration defaults
pub const CONFIG_FILE: &str = "wsi.toml";
pub const DEFAULT_DATA_DIR: &str = "data";
pub const DEFAULT_OUTPUT_DIR: &str = "output";
pub const DEFAULT_LOG_DIR: &str = "logs";
pub const DEFAULT_SOURCES_FILE: &str = "sources.toml";

pub fn source_column(indicator: &str) -> String {
    format!("{} (source)", indicator)
}

pub fn score_column(indicator: &str) -> String {
    format!("{} (score)", indicator)
}
