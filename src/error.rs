use thiserror::Error;

#[derive(Error, Debug)]
pub enum WsiError {
    #[error("Schema violation in {indicator}: {message}")]
    SchemaViolation { indicator: String, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Adapter error in {indicator}: {message}")]
    Adapter { indicator: String, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl WsiError {
    pub fn schema(indicator: &str, message: impl Into<String>) -> Self {
        WsiError::SchemaViolation {
            indicator: indicator.to_string(),
            message: message.into(),
        }
    }

    pub fn adapter(indicator: &str, message: impl Into<String>) -> Self {
        WsiError::Adapter {
            indicator: indicator.to_string(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, WsiError>;
