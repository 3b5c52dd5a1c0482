use std::sync::PoisonError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StagingError {
    #[error("I/O error while staging include files: {0}")]
    Io(#[from] std::io::Error),

    #[error("Error walking include directory: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Invalid include pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Error encoding include bundle with Bincode: {0}")]
    Bincode(#[from] Box<bincode::ErrorKind>),

    #[error("Include bundle entry escapes the target directory: {0}")]
    UnsafePath(String),
}

#[derive(Debug, Error)]
pub enum DnsError {
    #[error("Error in parsing URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("URL has no host: {0}")]
    NoHost(String),

    #[error("Lookup failed: {0}")]
    Lookup(#[from] std::io::Error),

    #[error("No address found for {0}")]
    NoAddress(String),

    #[error("Cannot replace the host of {0}")]
    InvalidHost(String),

    #[error("DNS cache Mutex is poisoned")]
    PoisonData,
}

impl<T> From<PoisonError<T>> for DnsError {
    fn from(_err: PoisonError<T>) -> Self {
        Self::PoisonData
    }
}

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("Unable to open log file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unable to install the log subscriber: {0}")]
    Init(String),
}
