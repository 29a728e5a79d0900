use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;
use std::fs::File;
use std::path::{Path, PathBuf};

use crate::backtest::BacktestParams;
use crate::error::BacktestError;
use crate::metrics::TRADING_DAYS_PER_YEAR;
use crate::pnl::PositioningMethod;
use crate::signal::ThresholdRule;

const DEFAULT_FILE1: &str = "SPY.csv";
const DEFAULT_FILE2: &str = "IVV.csv";
const DEFAULT_DATA_DIR: &str = "data";
const DEFAULT_HEDGE_RATIO: f64 = 1.0;
const DEFAULT_TRANSACTION_COSTS: f64 = 0.0001;
const DEFAULT_WINDOW: usize = 100;
const DEFAULT_Z_ENTRY: f64 = 2.0;
const DEFAULT_Z_EXIT: f64 = 0.5;
const DEFAULT_CAPITAL: f64 = 50_000_000.0;
const DEFAULT_POSITIONING_METHOD: &str = "net";

pub const CONFIG_PATH_ENV: &str = "PAIRBT_CONFIG_PATH";

#[derive(Debug, Default, Deserialize)]
struct BacktestYaml {
    file1: Option<String>,
    file2: Option<String>,
    data_dir: Option<String>,
    hedge_ratio: Option<f64>,
    transaction_costs: Option<f64>,
    window: Option<usize>,
    z_entry: Option<f64>,
    z_exit: Option<f64>,
    capital: Option<f64>,
    positioning_method: Option<String>,
    margin_rate: Option<f64>,
    annualization_factor: Option<f64>,
}

/// Raw run options as read from file, environment and command line.
/// [`BacktestConfig::validate`] turns them into engine parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub file1: String,
    pub file2: String,
    pub data_dir: PathBuf,
    pub hedge_ratio: f64,
    pub transaction_cost_rate: f64,
    pub window: usize,
    pub z_entry: f64,
    pub z_exit: f64,
    pub capital: f64,
    pub positioning_method: String,
    pub margin_rate: Option<f64>,
    pub annualization_factor: f64,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            file1: DEFAULT_FILE1.to_string(),
            file2: DEFAULT_FILE2.to_string(),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            hedge_ratio: DEFAULT_HEDGE_RATIO,
            transaction_cost_rate: DEFAULT_TRANSACTION_COSTS,
            window: DEFAULT_WINDOW,
            z_entry: DEFAULT_Z_ENTRY,
            z_exit: DEFAULT_Z_EXIT,
            capital: DEFAULT_CAPITAL,
            positioning_method: DEFAULT_POSITIONING_METHOD.to_string(),
            margin_rate: None,
            annualization_factor: TRADING_DAYS_PER_YEAR,
        }
    }
}

impl BacktestConfig {
    /// Defaults, then the YAML file named by `PAIRBT_CONFIG_PATH` if set,
    /// then `PAIRBT_*` environment overrides.
    pub fn from_env_or_yaml() -> Result<Self> {
        let config_path = env::var(CONFIG_PATH_ENV)
            .ok()
            .filter(|value| !value.trim().is_empty());
        let mut cfg = match config_path {
            Some(path) => Self::from_yaml_path(path)?,
            None => Self::default(),
        };
        cfg.apply_env_overrides();
        Ok(cfg)
    }

    pub fn from_yaml_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();
        let file = File::open(path_ref)
            .with_context(|| format!("failed to open backtest config {}", path_ref.display()))?;
        let yaml: BacktestYaml = serde_yaml::from_reader(file)
            .with_context(|| format!("failed to parse backtest config {}", path_ref.display()))?;
        log::debug!("loaded backtest config from {}", path_ref.display());
        Ok(Self::from_yaml(yaml))
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self> {
        let yaml: BacktestYaml =
            serde_yaml::from_str(raw).context("failed to parse backtest config")?;
        Ok(Self::from_yaml(yaml))
    }

    fn from_yaml(yaml: BacktestYaml) -> Self {
        let defaults = Self::default();
        Self {
            file1: yaml.file1.unwrap_or(defaults.file1),
            file2: yaml.file2.unwrap_or(defaults.file2),
            data_dir: yaml.data_dir.map(PathBuf::from).unwrap_or(defaults.data_dir),
            hedge_ratio: yaml.hedge_ratio.unwrap_or(defaults.hedge_ratio),
            transaction_cost_rate: yaml
                .transaction_costs
                .unwrap_or(defaults.transaction_cost_rate),
            window: yaml.window.unwrap_or(defaults.window),
            z_entry: yaml.z_entry.unwrap_or(defaults.z_entry),
            z_exit: yaml.z_exit.unwrap_or(defaults.z_exit),
            capital: yaml.capital.unwrap_or(defaults.capital),
            positioning_method: yaml
                .positioning_method
                .unwrap_or(defaults.positioning_method),
            margin_rate: yaml.margin_rate,
            annualization_factor: yaml
                .annualization_factor
                .unwrap_or(defaults.annualization_factor),
        }
    }

    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| env::var(key).ok());
    }

    /// Overrides from a key lookup. Empty values are ignored; values that do
    /// not parse are logged and ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(value) = get("PAIRBT_FILE1") {
            self.file1 = value;
        }
        if let Some(value) = get("PAIRBT_FILE2") {
            self.file2 = value;
        }
        if let Some(value) = get("PAIRBT_DATA_DIR") {
            self.data_dir = PathBuf::from(value);
        }
        if let Some(value) = get("PAIRBT_POSITIONING_METHOD") {
            self.positioning_method = value;
        }
        override_parsed(&get, "PAIRBT_HEDGE_RATIO", &mut self.hedge_ratio);
        override_parsed(
            &get,
            "PAIRBT_TRANSACTION_COSTS",
            &mut self.transaction_cost_rate,
        );
        override_parsed(&get, "PAIRBT_WINDOW", &mut self.window);
        override_parsed(&get, "PAIRBT_Z_ENTRY", &mut self.z_entry);
        override_parsed(&get, "PAIRBT_Z_EXIT", &mut self.z_exit);
        override_parsed(&get, "PAIRBT_CAPITAL", &mut self.capital);
        override_parsed(&get, "PAIRBT_ANNUALIZATION", &mut self.annualization_factor);
        if get("PAIRBT_MARGIN_RATE").is_some() {
            let mut rate = self.margin_rate.unwrap_or(f64::NAN);
            override_parsed(&get, "PAIRBT_MARGIN_RATE", &mut rate);
            if !rate.is_nan() {
                self.margin_rate = Some(rate);
            }
        }
    }

    /// Checks every option and builds the engine parameters.
    pub fn validate(&self) -> std::result::Result<BacktestParams, BacktestError> {
        let method = PositioningMethod::parse(&self.positioning_method, self.margin_rate)?;

        if self.window == 0 {
            return Err(BacktestError::configuration(
                "window must be a positive number of periods",
            ));
        }
        if !self.hedge_ratio.is_finite() {
            return Err(BacktestError::configuration(format!(
                "hedge_ratio must be finite, got {}",
                self.hedge_ratio
            )));
        }
        if !(self.capital.is_finite() && self.capital > 0.0) {
            return Err(BacktestError::configuration(format!(
                "capital must be a positive amount, got {}",
                self.capital
            )));
        }
        if !(self.transaction_cost_rate.is_finite() && self.transaction_cost_rate >= 0.0) {
            return Err(BacktestError::configuration(format!(
                "transaction_costs must be a non-negative fraction, got {}",
                self.transaction_cost_rate
            )));
        }
        if !(self.z_exit.is_finite() && self.z_entry.is_finite() && self.z_exit >= 0.0) {
            return Err(BacktestError::configuration(format!(
                "z thresholds must be finite and non-negative, got entry {} exit {}",
                self.z_entry, self.z_exit
            )));
        }
        // the state machine flaps every period when the bands overlap
        if self.z_exit >= self.z_entry {
            return Err(BacktestError::configuration(format!(
                "z_exit ({}) must be below z_entry ({})",
                self.z_exit, self.z_entry
            )));
        }
        if !(self.annualization_factor.is_finite() && self.annualization_factor > 0.0) {
            return Err(BacktestError::configuration(format!(
                "annualization_factor must be positive, got {}",
                self.annualization_factor
            )));
        }

        Ok(BacktestParams {
            hedge_ratio: self.hedge_ratio,
            transaction_cost_rate: self.transaction_cost_rate,
            window: self.window,
            rule: ThresholdRule::new(self.z_entry, self.z_exit),
            capital: self.capital,
            method,
            annualization_factor: self.annualization_factor,
        })
    }
}

fn override_parsed<T: std::str::FromStr>(
    get: &impl Fn(&str) -> Option<String>,
    key: &str,
    slot: &mut T,
) {
    if let Some(value) = get(key) {
        match value.trim().parse() {
            Ok(parsed) => *slot = parsed,
            Err(_) => log::warn!("ignoring {}={:?}: not a valid value", key, value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_validate() {
        let params = BacktestConfig::default().validate().unwrap();
        assert_eq!(params, BacktestParams::default());
    }

    #[test]
    fn yaml_keeps_defaults_for_missing_keys() {
        let cfg = BacktestConfig::from_yaml_str(
            "file1: SPY.csv\nfile2: IVV.csv\nhedge_ratio: 0.992\nwindow: 20\nz_entry: 1.64\nz_exit: 1.28\npositioning_method: net\nmargin_rate: null\n",
        )
        .unwrap();
        assert_eq!(cfg.hedge_ratio, 0.992);
        assert_eq!(cfg.window, 20);
        assert_eq!(cfg.capital, DEFAULT_CAPITAL);
        assert_eq!(cfg.margin_rate, None);
        let params = cfg.validate().unwrap();
        assert_eq!(params.rule, ThresholdRule::new(1.64, 1.28));
    }

    #[test]
    fn yaml_file_is_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        let mut file = File::create(&path).unwrap();
        writeln!(file, "positioning_method: margin\nmargin_rate: 0.1\ncapital: 1000").unwrap();

        let cfg = BacktestConfig::from_yaml_path(&path).unwrap();
        let params = cfg.validate().unwrap();
        assert_eq!(params.method, PositioningMethod::Margin { rate: 0.1 });
        assert_eq!(params.capital, 1000.0);
        assert!(BacktestConfig::from_yaml_path(dir.path().join("missing.yaml")).is_err());
    }

    #[test]
    fn overrides_replace_values_and_skip_garbage() {
        let mut cfg = BacktestConfig::default();
        cfg.apply_overrides(lookup(&[
            ("PAIRBT_WINDOW", "30"),
            ("PAIRBT_Z_ENTRY", "abc"),
            ("PAIRBT_FILE1", "  "),
            ("PAIRBT_MARGIN_RATE", "0.2"),
            ("PAIRBT_POSITIONING_METHOD", "margin"),
        ]));
        assert_eq!(cfg.window, 30);
        assert_eq!(cfg.z_entry, DEFAULT_Z_ENTRY);
        assert_eq!(cfg.file1, DEFAULT_FILE1);
        assert_eq!(cfg.margin_rate, Some(0.2));
        assert_eq!(
            cfg.validate().unwrap().method,
            PositioningMethod::Margin { rate: 0.2 }
        );
    }

    #[test]
    fn validation_fails_fast() {
        let bad = |edit: fn(&mut BacktestConfig)| {
            let mut cfg = BacktestConfig::default();
            edit(&mut cfg);
            cfg.validate()
        };
        assert!(matches!(
            bad(|c| c.positioning_method = "levered".into()),
            Err(BacktestError::Configuration(_))
        ));
        assert!(bad(|c| c.positioning_method = "margin".into()).is_err());
        assert!(bad(|c| c.window = 0).is_err());
        assert!(bad(|c| c.capital = 0.0).is_err());
        assert!(bad(|c| c.capital = f64::NAN).is_err());
        assert!(bad(|c| c.transaction_cost_rate = -0.1).is_err());
        assert!(bad(|c| c.hedge_ratio = f64::INFINITY).is_err());
        assert!(bad(|c| c.z_exit = 2.0).is_err());
        assert!(bad(|c| c.z_exit = -0.1).is_err());
        assert!(bad(|c| c.annualization_factor = 0.0).is_err());
        assert!(bad(|c| c.hedge_ratio = 0.0).is_ok());
    }
}
