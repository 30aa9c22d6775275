use thiserror::Error;

#[derive(Error, Debug)]
pub enum StateError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Codec error: {0}")]
    Codec(String),

    #[error("Invalid row id: {0}")]
    InvalidRowId(String),

    #[error("Identity name is {0} bytes long, row ids allow at most 255")]
    IdentityNameTooLong(usize),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Store is closed")]
    StoreClosed,

    #[error("Engine error: {0}")]
    Engine(String),
}

pub type Result<T> = std::result::Result<T, StateError>;

impl From<rmp_serde::encode::Error> for StateError {
    fn from(err: rmp_serde::encode::Error) -> Self {
        Self::Codec(err.to_string())
    }
}

impl From<rmp_serde::decode::Error> for StateError {
    fn from(err: rmp_serde::decode::Error) -> Self {
        Self::Codec(err.to_string())
    }
}

impl From<serde_json::Error> for StateError {
    fn from(err: serde_json::Error) -> Self {
        Self::Config(err.to_string())
    }
}
