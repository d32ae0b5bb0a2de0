use std::path::PathBuf;

use thiserror::Error;

use crate::domain::catalog::CatalogError;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("required artifact not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("corrupt artifact {}: {reason}", path.display())]
    Corrupt { path: PathBuf, reason: String },
    #[error("vector index error: {0}")]
    Index(String),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;
