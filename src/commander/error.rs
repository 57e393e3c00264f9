use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("command under \"{parent}\" has an empty name")]
    EmptyName { parent: String },

    #[error("duplicate command \"{name}\" under \"{parent}\"")]
    DuplicateCommand { parent: String, name: String },

    #[error("unknown flag: {0}")]
    UnknownFlag(String),

    #[error("invalid value {value:?} for flag \"{flag}\"")]
    InvalidValue {
        flag: String,
        value: String,
        #[source]
        source: clap::Error,
    },

    #[error(transparent)]
    Parse(#[from] clap::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// An error raised by a command implementation, passed through untouched.
    #[error(transparent)]
    Other(Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
    /// Wraps any error so it can be returned from a [`crate::Commander`] method.
    pub fn other<E>(err: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Error::Other(err.into())
    }

    /// Returns the wrapped error if this is an [`Error::Other`] holding an `E`.
    pub fn downcast_ref<E: std::error::Error + 'static>(&self) -> Option<&E> {
        match self {
            Error::Other(inner) => inner.downcast_ref::<E>(),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
