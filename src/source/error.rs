use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("NORAD ID {0} not found in TLE catalog")]
    NotFound(u32),
    #[error("TLE catalog folder not found: {0}")]
    DirectoryNotFound(String),
    #[error("TLE file read error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid TLE format: {0}")]
    Format(String),
}
