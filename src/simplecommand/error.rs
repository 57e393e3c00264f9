use std::path::PathBuf;
use thiserror::Error;

/// Failures while applying environment variables or a config file to a command's flags.
#[derive(Error, Debug)]
pub enum BindError {
    #[error("config file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),

    #[error("failed to read config file {}: {source}", .path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {}: {message}", .path.display())]
    ConfigParse { path: PathBuf, message: String },

    #[error("unsupported config file format: {}", .0.display())]
    UnsupportedFormat(PathBuf),

    #[error("invalid value for flag \"{flag}\" from {origin}")]
    Flag {
        flag: String,
        origin: String,
        #[source]
        source: commander::Error,
    },
}

pub type Result<T> = std::result::Result<T, BindError>;
