use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid layout: {reason}")]
    InvalidLayout { reason: String },

    #[error("Invalid config value '{field}': {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SimError {
    pub fn layout(reason: impl Into<String>) -> Self {
        Self::InvalidLayout { reason: reason.into() }
    }
}

pub type SimResult<T> = Result<T, SimError>;
