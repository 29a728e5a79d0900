use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::fs::File;
use std::path::{Path, PathBuf};

use crate::series::{PriceSeries, Timestamp};

/// Anything that can hand over the price history of one instrument.
pub trait PriceSource {
    fn load(&self, identifier: &str) -> Result<PriceSeries>;
}

/// Reads `<data_dir>/<identifier>` CSV files: timestamp in the first column,
/// prices from `Close` when present, otherwise from the second column.
#[derive(Debug, Clone)]
pub struct CsvPriceLoader {
    data_dir: PathBuf,
}

impl CsvPriceLoader {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

impl PriceSource for CsvPriceLoader {
    fn load(&self, identifier: &str) -> Result<PriceSeries> {
        let path = self.data_dir.join(identifier);
        let file = File::open(&path)
            .with_context(|| format!("failed to open price file {}", path.display()))?;
        let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(file);

        let headers = reader
            .headers()
            .with_context(|| format!("failed to read header of {}", path.display()))?
            .clone();
        if headers.len() < 2 {
            return Err(anyhow!(
                "{} needs a timestamp column and at least one price column",
                path.display()
            ));
        }
        let column = headers
            .iter()
            .position(|h| h.trim() == "Close")
            .unwrap_or(1);

        let mut stamps = Vec::new();
        let mut values = Vec::new();
        let mut skipped = 0usize;
        for (line, record) in reader.records().enumerate() {
            let record = record.with_context(|| {
                format!("failed to read line {} of {}", line + 2, path.display())
            })?;
            let Some(ts) = record.get(0).and_then(parse_timestamp) else {
                skipped += 1;
                continue;
            };
            let value = record
                .get(column)
                .and_then(|v| v.trim().parse::<f64>().ok())
                .unwrap_or(f64::NAN);
            stamps.push(ts);
            values.push(value);
        }
        if skipped > 0 {
            log::warn!(
                "{}: skipped {} rows without a parsable timestamp",
                path.display(),
                skipped
            );
        }

        let series = PriceSeries::new(label_for(identifier), stamps, values)
            .with_context(|| format!("invalid price history in {}", path.display()))?;
        log::debug!(
            "loaded {} rows of {} from {}",
            series.len(),
            series.label,
            path.display()
        );
        Ok(series)
    }
}

/// Upper-cased file stem: `spy.csv` -> `SPY`.
pub fn label_for(identifier: &str) -> String {
    Path::new(identifier)
        .file_stem()
        .map(|s| s.to_string_lossy().to_uppercase())
        .unwrap_or_else(|| identifier.to_uppercase())
}

/// Accepts dates, naive date-times and offset date-times. Offsets are
/// dropped so both legs keep their exchange-local wall-clock stamps.
pub fn parse_timestamp(raw: &str) -> Option<Timestamp> {
    let raw = raw.trim();
    if let Ok(d) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return d.and_hms_opt(0, 0, 0);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_local());
    }
    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%:z") {
        return Some(dt.naive_local());
    }
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write(dir: &Path, name: &str, body: &str) {
        let mut file = File::create(dir.join(name)).unwrap();
        file.write_all(body.as_bytes()).unwrap();
    }

    #[test]
    fn prefers_close_column() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "spy.csv",
            "Date,Open,Close\n2024-01-02,1.0,10.5\n2024-01-03,2.0,\n2024-01-04,3.0,11.5\n",
        );
        let series = CsvPriceLoader::new(dir.path()).load("spy.csv").unwrap();
        assert_eq!(series.label, "SPY");
        assert_eq!(series.len(), 3);
        let v = series.prices.values();
        assert_eq!(v[0], 10.5);
        assert!(v[1].is_nan());
        assert_eq!(v[2], 11.5);
    }

    #[test]
    fn falls_back_to_first_data_column_and_skips_extra_headers() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "ivv.csv",
            "Date,Price\nTicker,IVV\n2024-01-02 00:00:00-05:00,400.0\n2024-01-03 00:00:00-05:00,401.0\n",
        );
        let series = CsvPriceLoader::new(dir.path()).load("ivv.csv").unwrap();
        assert_eq!(series.prices.values(), &[400.0, 401.0]);
        assert_eq!(
            series.prices.index().first().copied(),
            parse_timestamp("2024-01-02")
        );
    }

    #[test]
    fn unordered_rows_are_an_error() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "x.csv", "Date,Close\n2024-01-03,1\n2024-01-02,2\n");
        assert!(CsvPriceLoader::new(dir.path()).load("x.csv").is_err());
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = CsvPriceLoader::new(dir.path()).load("nope.csv").unwrap_err();
        assert!(err.to_string().contains("nope.csv"));
    }

    #[test]
    fn timestamp_formats() {
        let midnight = NaiveDate::from_ymd_opt(2024, 3, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap();
        assert_eq!(parse_timestamp("2024-03-01"), Some(midnight));
        assert_eq!(parse_timestamp("2024-03-01 00:00:00"), Some(midnight));
        assert_eq!(parse_timestamp("2024-03-01T00:00:00+09:00"), Some(midnight));
        assert_eq!(parse_timestamp("Ticker"), None);
    }
}
