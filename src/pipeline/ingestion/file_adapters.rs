//! Delimited-file adapters. These are format glue only: select columns,
//! filter rows and hand back `(country, year, value)` tuples.

use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::{passes_filter, IndicatorAdapter};
use crate::error::{Result, WsiError};
use crate::types::{IndicatorRow, RawValue};

fn file_fingerprint(path: &Path) -> Option<String> {
    let bytes = fs::read(path).ok()?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Some(hex::encode(hasher.finalize()))
}

fn open_reader(indicator: &str, path: &Path) -> Result<csv::Reader<fs::File>> {
    csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_path(path)
        .map_err(|e| WsiError::adapter(indicator, format!("cannot open {}: {}", path.display(), e)))
}

fn column_index(indicator: &str, headers: &csv::StringRecord, column: &str) -> Result<usize> {
    headers
        .iter()
        .position(|h| h == column)
        .ok_or_else(|| WsiError::adapter(indicator, format!("missing column '{}'", column)))
}

/// Years arrive as `2001`, `2001.0` or `2001 [YR2001]`
fn parse_year(raw: &str) -> Option<i32> {
    let raw = raw.trim();
    let head = raw.split_whitespace().next()?;
    if let Ok(year) = head.parse::<i32>() {
        return Some(year);
    }
    let float = head.parse::<f64>().ok()?;
    (float.fract() == 0.0).then_some(float as i32)
}

/// Header of a year column in a wide table, e.g. `1999` or `1999 [YR1999]`
fn year_header(header: &str) -> Option<i32> {
    let header = header.trim();
    let digits: String = header.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.len() != 4 {
        return None;
    }
    let rest = header[digits.len()..].trim();
    if rest.is_empty() || rest.starts_with("[YR") {
        digits.parse().ok()
    } else {
        None
    }
}

fn raw_value(cell: &str) -> Option<RawValue> {
    let cell = cell.trim();
    (!cell.is_empty()).then(|| RawValue::Text(cell.to_string()))
}

/// Long table: one row per `(country, year)` with a value column
#[derive(Debug, Clone)]
pub struct LongCsvAdapter {
    indicator: String,
    path: PathBuf,
    country_column: String,
    year_column: String,
    value_column: String,
}

impl LongCsvAdapter {
    pub fn new(indicator: &str, path: impl Into<PathBuf>) -> Self {
        Self {
            indicator: indicator.to_string(),
            path: path.into(),
            country_column: "ISO_code".to_string(),
            year_column: "Year".to_string(),
            value_column: indicator.to_string(),
        }
    }

    pub fn with_columns(mut self, country: &str, year: &str, value: &str) -> Self {
        self.country_column = country.to_string();
        self.year_column = year.to_string();
        self.value_column = value.to_string();
        self
    }
}

impl IndicatorAdapter for LongCsvAdapter {
    fn indicator(&self) -> &str {
        &self.indicator
    }

    fn build(&self, filter: Option<&[String]>) -> Result<Vec<IndicatorRow>> {
        let mut reader = open_reader(&self.indicator, &self.path)?;
        let headers = reader.headers()?.clone();
        let country_idx = column_index(&self.indicator, &headers, &self.country_column)?;
        let year_idx = column_index(&self.indicator, &headers, &self.year_column)?;
        let value_idx = column_index(&self.indicator, &headers, &self.value_column)?;

        let mut rows = Vec::new();
        for (line, record) in reader.records().enumerate() {
            let record = record?;
            let iso = record.get(country_idx).unwrap_or("").trim();
            if iso.is_empty() || !passes_filter(filter, iso) {
                continue;
            }
            let year_raw = record.get(year_idx).unwrap_or("");
            let year = parse_year(year_raw).ok_or_else(|| {
                WsiError::adapter(
                    &self.indicator,
                    format!("row {}: unparseable year '{}'", line + 2, year_raw),
                )
            })?;
            if let Some(value) = record.get(value_idx).and_then(raw_value) {
                rows.push(IndicatorRow {
                    iso_code: iso.to_string(),
                    year,
                    value,
                });
            }
        }

        debug!("Read {} rows for {} from {}", rows.len(), self.indicator, self.path.display());
        Ok(rows)
    }

    fn fingerprint(&self) -> Option<String> {
        file_fingerprint(&self.path)
    }
}

/// Wide table: one row per country (and series), one column per year
#[derive(Debug, Clone)]
pub struct WideCsvAdapter {
    indicator: String,
    path: PathBuf,
    country_column: String,
    series: Option<(String, String)>,
}

impl WideCsvAdapter {
    pub fn new(indicator: &str, path: impl Into<PathBuf>) -> Self {
        Self {
            indicator: indicator.to_string(),
            path: path.into(),
            country_column: "Country Code".to_string(),
            series: None,
        }
    }

    pub fn with_country_column(mut self, column: &str) -> Self {
        self.country_column = column.to_string();
        self
    }

    /// Keep only rows whose `column` equals `code`
    pub fn with_series(mut self, column: &str, code: &str) -> Self {
        self.series = Some((column.to_string(), code.to_string()));
        self
    }
}

impl IndicatorAdapter for WideCsvAdapter {
    fn indicator(&self) -> &str {
        &self.indicator
    }

    fn build(&self, filter: Option<&[String]>) -> Result<Vec<IndicatorRow>> {
        let mut reader = open_reader(&self.indicator, &self.path)?;
        let headers = reader.headers()?.clone();
        let country_idx = column_index(&self.indicator, &headers, &self.country_column)?;
        let series_idx = match &self.series {
            Some((column, code)) => Some((column_index(&self.indicator, &headers, column)?, code.as_str())),
            None => None,
        };
        let year_columns: Vec<(usize, i32)> = headers
            .iter()
            .enumerate()
            .filter_map(|(i, h)| year_header(h).map(|y| (i, y)))
            .collect();
        if year_columns.is_empty() {
            return Err(WsiError::adapter(&self.indicator, "no year columns found"));
        }

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            if let Some((idx, code)) = series_idx {
                if record.get(idx).map(str::trim) != Some(code) {
                    continue;
                }
            }
            let iso = record.get(country_idx).unwrap_or("").trim();
            if iso.is_empty() || !passes_filter(filter, iso) {
                continue;
            }
            for (idx, year) in &year_columns {
                if let Some(value) = record.get(*idx).and_then(raw_value) {
                    rows.push(IndicatorRow {
                        iso_code: iso.to_string(),
                        year: *year,
                        value,
                    });
                }
            }
        }

        debug!("Melted {} rows for {} from {}", rows.len(), self.indicator, self.path.display());
        Ok(rows)
    }

    fn fingerprint(&self) -> Option<String> {
        file_fingerprint(&self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_csv(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn long_adapter_reads_and_filters() {
        let file = write_csv("ISO_code,Year,Education\nAAA,2000,0.9\nWLD,2000,0.5\nAAA,2001,\nBBB,2001.0,n/a\n");
        let adapter = LongCsvAdapter::new("Education", file.path());
        let filter = vec!["AAA".to_string(), "BBB".to_string()];
        let rows = adapter.build(Some(&filter)).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], IndicatorRow::new("AAA", 2000, "0.9"));
        assert_eq!(rows[1].year, 2001);
        assert_eq!(rows[1].value.coerce(), None);
        assert!(adapter.fingerprint().is_some());
    }

    #[test]
    fn long_adapter_reports_missing_column() {
        let file = write_csv("iso,Year,Education\nAAA,2000,1\n");
        let err = LongCsvAdapter::new("Education", file.path()).build(None).unwrap_err();
        assert!(err.to_string().contains("missing column 'ISO_code'"));
    }

    #[test]
    fn wide_adapter_melts_year_columns() {
        let file = write_csv(
            "Country Name,Country Code,Series Code,2000 [YR2000],2001 [YR2001],Notes\n\
             Alpha,AAA,SP.M18,10,..,x\n\
             Alpha,AAA,OTHER,99,99,x\n\
             Beta,BBB,SP.M18,,20,x\n",
        );
        let adapter = WideCsvAdapter::new("Child Marriage", file.path()).with_series("Series Code", "SP.M18");
        let rows = adapter.build(None).unwrap();

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0], IndicatorRow::new("AAA", 2000, "10"));
        assert_eq!(rows[1], IndicatorRow::new("AAA", 2001, ".."));
        assert_eq!(rows[2], IndicatorRow::new("BBB", 2001, "20"));
    }

    #[test]
    fn year_parsing() {
        assert_eq!(parse_year("2004"), Some(2004));
        assert_eq!(parse_year("2004.0"), Some(2004));
        assert_eq!(parse_year("2004.5"), None);
        assert_eq!(year_header("1999 [YR1999]"), Some(1999));
        assert_eq!(year_header("Country Code"), None);
        assert_eq!(year_header("19990"), None);
    }
}
