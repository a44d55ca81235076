use thiserror::Error;

/// Errors raised while configuring or running a simulation.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid parameter '{name}' with value '{value}'")]
    InvalidParameter { name: String, value: String },

    #[error("feature vector has {expected} entries but parameter vector has {found}")]
    FeatureLength { expected: usize, found: usize },

    #[error("aircraft left its model domain at t = {time} s")]
    OutOfModel { time: f64 },

    #[error("cannot parse log line {line}: {reason}")]
    LogParse { line: usize, reason: String },
}

impl SimError {
    pub fn invalid(name: impl Into<String>, value: impl ToString) -> Self {
        SimError::InvalidParameter {
            name: name.into(),
            value: value.to_string(),
        }
    }
}
