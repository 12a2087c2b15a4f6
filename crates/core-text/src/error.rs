use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Persistence failures. The provider's `io::Error` is kept as the source.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("failed to read `{path}`")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write `{path}`")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl DocumentError {
    /// The provider error exactly as it was returned.
    pub fn io_error(&self) -> &io::Error {
        match self {
            DocumentError::Read { source, .. } | DocumentError::Write { source, .. } => source,
        }
    }
}
