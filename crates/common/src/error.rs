use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The market data gateway does not know this stock id.
    #[error("Unknown stock id: {0}")]
    UnknownSymbol(String),

    #[error("Market data error: {0}")]
    Market(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Chart render error: {0}")]
    Render(String),

    #[error("Notify error: {0}")]
    Notify(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
