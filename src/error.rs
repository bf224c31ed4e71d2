use std::path::PathBuf;

use thiserror::Error;

/// Failures of the key-value slot backing the progress state.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StoreError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl StoreError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Errors surfaced by study operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StudyError {
    /// Informational: the caller shows a "not available" message.
    #[error("quiz '{0}' is not available")]
    QuizNotFound(String),
    #[error("unknown section '{0}'")]
    UnknownSection(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors raised while loading the bundled curriculum.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CatalogError {
    #[error("curriculum asset '{0}' is missing")]
    Missing(String),
    #[error("curriculum asset is not valid UTF-8")]
    Encoding(#[from] std::str::Utf8Error),
    #[error(transparent)]
    Parse(#[from] toml::de::Error),
    #[error("invalid curriculum: {0}")]
    Invalid(String),
}
