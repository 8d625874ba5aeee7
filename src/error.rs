use thiserror::Error;
use std::path::PathBuf;

#[derive(Debug, Error)]
pub enum FtpTreeError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Changing into, creating or removing a directory failed.
    #[error("Directory operation failed for {path}: {reason}")]
    Directory { path: String, reason: String },

    #[error("Malformed listing line: {0:?}")]
    MalformedListing(String),

    #[error("Listing {path} failed: {source}")]
    Listing {
        path: String,
        #[source]
        source: Box<FtpTreeError>,
    },

    #[error("Transfer failed for {path}: {reason}")]
    Transfer { path: String, reason: String },

    #[error("Local path error for {path}: {source}")]
    Local {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Pattern error: {0}")]
    Pattern(#[from] globset::Error),
}

impl FtpTreeError {
    pub fn directory(path: impl Into<String>, reason: impl ToString) -> Self {
        FtpTreeError::Directory { path: path.into(), reason: reason.to_string() }
    }

    pub fn transfer(path: impl Into<String>, reason: impl ToString) -> Self {
        FtpTreeError::Transfer { path: path.into(), reason: reason.to_string() }
    }

    /// True for the "no such directory / cannot create it" class of failure,
    /// which the materializer treats as control flow rather than a hard error.
    pub fn is_directory_failure(&self) -> bool {
        matches!(self, FtpTreeError::Directory { .. })
    }
}
