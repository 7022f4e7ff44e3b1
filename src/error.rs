use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("database error: {0}")]
    Database(#[from] mongodb::error::Error),

    #[error("{0} already exists")]
    Duplicate(String),

    #[error("credential store error: {0}")]
    Credential(String),

    #[error("FMP_API_KEY is missing")]
    MissingApiKey,

    #[error("market data request failed: {0}")]
    MarketData(String),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("failed to parse feed {url}: {reason}")]
    Feed { url: String, reason: String },

    #[error("Not Found")]
    NotFound,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl From<keyring::Error> for Error {
    fn from(err: keyring::Error) -> Self {
        Error::Credential(err.to_string())
    }
}
