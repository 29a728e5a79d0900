use anyhow::{Context, Result};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::backtest::TimeseriesTable;
use crate::series::Timestamp;

/// Destination for the full per-period table of a run.
pub trait TimeseriesSink {
    fn write_table(&mut self, table: &TimeseriesTable) -> Result<()>;
}

pub(crate) const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Undefined values become empty cells.
pub(crate) fn cell(value: f64) -> String {
    if value.is_nan() {
        String::new()
    } else {
        value.to_string()
    }
}

pub(crate) fn stamp(ts: &Timestamp) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

pub struct CsvTimeseriesSink<W: Write> {
    writer: csv::Writer<W>,
    target: String,
}

impl CsvTimeseriesSink<File> {
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path: PathBuf = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let writer = csv::Writer::from_path(&path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        Ok(Self {
            writer,
            target: path.display().to_string(),
        })
    }
}

impl<W: Write> CsvTimeseriesSink<W> {
    pub fn from_writer(inner: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(inner),
            target: "<writer>".to_string(),
        }
    }

    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| anyhow::anyhow!("failed to flush csv writer: {}", e.error()))
    }
}

impl<W: Write> TimeseriesSink for CsvTimeseriesSink<W> {
    fn write_table(&mut self, table: &TimeseriesTable) -> Result<()> {
        self.writer
            .write_record(table.headers())
            .with_context(|| format!("failed to write header to {}", self.target))?;
        for row in table.rows() {
            self.writer.write_record([
                stamp(&row.timestamp),
                cell(row.price1),
                cell(row.price2),
                cell(row.spread),
                cell(row.z_score),
                row.position.to_string(),
                cell(row.units),
                cell(row.transaction_cost),
                cell(row.pnl),
                row.daily_return.map(cell).unwrap_or_default(),
                cell(if row.trade_flag { 1.0 } else { 0.0 }),
            ])?;
        }
        self.writer
            .flush()
            .with_context(|| format!("failed to flush {}", self.target))?;
        log::debug!("wrote {} rows to {}", table.len(), self.target);
        Ok(())
    }
}
