use anyhow::{anyhow, Context, Result};
use std::path::PathBuf;

use crate::charts::{ChartSeries, ChartSink};
use crate::ports::timeseries_csv::{cell, stamp};

/// Writes each chart as `<out_dir>/<name>.csv`: a timestamp column followed
/// by one column per series.
#[derive(Debug, Clone)]
pub struct CsvChartWriter {
    out_dir: PathBuf,
}

impl CsvChartWriter {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
        }
    }
}

impl ChartSink for CsvChartWriter {
    fn render(&mut self, name: &str, series: &[ChartSeries]) -> Result<PathBuf> {
        let first = series
            .first()
            .ok_or_else(|| anyhow!("chart {name} has no series"))?;
        for s in &series[1..] {
            first
                .points
                .ensure_aligned(&s.points, name)
                .with_context(|| format!("chart {name} mixes indices"))?;
        }

        std::fs::create_dir_all(&self.out_dir)
            .with_context(|| format!("failed to create {}", self.out_dir.display()))?;
        let path = self.out_dir.join(format!("{name}.csv"));
        let mut writer = csv::Writer::from_path(&path)
            .with_context(|| format!("failed to create {}", path.display()))?;

        let mut header = vec!["timestamp".to_string()];
        header.extend(series.iter().map(|s| s.name.clone()));
        writer.write_record(&header)?;
        for (row, ts) in first.points.index().iter().enumerate() {
            let mut record = Vec::with_capacity(series.len() + 1);
            record.push(stamp(ts));
            record.extend(series.iter().map(|s| cell(s.points.values()[row])));
            writer.write_record(&record)?;
        }
        writer
            .flush()
            .with_context(|| format!("failed to flush {}", path.display()))?;
        Ok(path)
    }
}
