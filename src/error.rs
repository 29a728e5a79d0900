use thiserror::Error;

use crate::backtest::PipelineStage;

/// Failures that abort a backtest run. Numeric degeneracies are not errors;
/// they resolve to not-a-number series values or neutral metrics instead.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BacktestError {
    /// Required inputs do not share the same time index.
    #[error("alignment error: {0}")]
    Alignment(String),

    /// Unknown positioning mode, missing margin rate or an out-of-range option.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A pipeline stage was invoked before its prerequisite.
    #[error("sequence error: {attempted} requires {required}, pipeline is at {current}")]
    Sequence {
        attempted: &'static str,
        required: PipelineStage,
        current: PipelineStage,
    },
}

impl BacktestError {
    pub fn alignment(msg: impl Into<String>) -> Self {
        BacktestError::Alignment(msg.into())
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        BacktestError::Configuration(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, BacktestError>;
