use std::path::PathBuf;
use thiserror::Error;

pub type Result<T, E = FetchError> = std::result::Result<T, E>;

/// Hard failures of the chapter pipeline. An unavailable chapter is not one
/// of these, it is reported as an empty page set.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Request to {url} returned status {status}")]
    Status { url: String, status: u16 },

    #[error("Unable to parse {url}: {reason}")]
    Parse { url: String, reason: String },

    #[error("Filesystem error on {path:?}: {source}")]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unable to write archive {path:?}: {source}")]
    Archive {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("{path:?} exists but is not a directory")]
    State { path: PathBuf },

    #[error("Settings file {path:?} is unusable: {reason}")]
    Settings { path: PathBuf, reason: String },
}

impl FetchError {
    pub fn fs(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> FetchError {
        let path = path.into();
        move |source| FetchError::Filesystem { path, source }
    }

    /// True for the transport family: connection failures and non-success statuses.
    pub fn is_transport(&self) -> bool {
        matches!(self, FetchError::Transport { .. } | FetchError::Status { .. })
    }
}
