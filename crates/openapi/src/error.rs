use std::path::PathBuf;

use thiserror::Error;

/// Fatal failures of an import. Everything else degrades to partial results.
#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("invalid OpenAPI document: \"paths\" is missing")]
    MissingPaths,
    #[error("document is neither valid JSON nor YAML: {message}")]
    Parse { message: String },
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
