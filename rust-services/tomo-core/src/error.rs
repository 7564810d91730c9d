use thiserror::Error;

/// Everything that can go wrong before a sweep starts, plus the file I/O
/// performed by the collaborators in [`crate::io`].
#[derive(Debug, Error)]
pub enum TomoError {
    #[error("invalid scan configuration: {reason}")]
    InvalidConfiguration { reason: String },

    #[error("invalid input image: {reason}")]
    InvalidInput { reason: String },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("array file error on {path}: {message}")]
    Npy { path: String, message: String },

    #[error("image codec error on {path}: {message}")]
    Image { path: String, message: String },

    #[error("JSON error on {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

impl TomoError {
    pub(crate) fn config(reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            reason: reason.into(),
        }
    }

    pub(crate) fn input(reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TomoError>;
