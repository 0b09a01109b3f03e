use std::path::PathBuf;

use thiserror::Error;

/// Rejections raised while turning user input into a `ParameterSet`.
#[derive(Debug, Error, PartialEq)]
pub enum ParameterError {
    #[error("{flag} must be a finite number")]
    NotFinite { flag: &'static str },

    #[error("{flag} must be >= 0")]
    Negative { flag: &'static str },

    #[error("{flag} must be between {min} and {max}")]
    OutOfRange {
        flag: &'static str,
        min: f64,
        max: f64,
    },

    #[error("{flag} must be > -100")]
    RateTooLow { flag: &'static str },

    #[error("{strategy} service life plus lead time must be 0 or at least {min_days} day(s)")]
    PeriodTooShort {
        strategy: &'static str,
        min_days: f64,
    },

    #[error("{flag} item '{label}' must have a finite amount")]
    InvalidItem { flag: &'static str, label: String },
}

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("cannot read scenario file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid scenario file: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Parameter(#[from] ParameterError),

    #[error(transparent)]
    Scenario(#[from] ScenarioError),

    #[error("cannot serialize result: {0}")]
    Output(#[from] serde_json::Error),
}
