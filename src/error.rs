use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not load configuration: {0}")]
    Load(#[from] confy::ConfyError),
    #[error("invalid log level: {0}")]
    InvalidLogLevel(String),
    #[error("could not open log file {path}: {source}")]
    LogFile { path: String, source: io::Error },
}

#[derive(Debug, Error)]
pub enum EphemerisError {
    #[error("unknown sky object index {0}")]
    UnknownObject(usize),
}

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("frame too short: got {0} bytes, need at least 4")]
    TooShort(usize),
    #[error("unexpected frame size {got}, expected {want}")]
    SizeMismatch { got: u16, want: u16 },
    #[error("unknown message type {0}")]
    UnknownType(u16),
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },
}
