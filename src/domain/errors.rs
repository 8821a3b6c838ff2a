use thiserror::Error;

#[derive(Error, Debug)]
pub enum DataStorageError {
    #[error("Failed to access {collection}: {source}")]
    Io {
        collection: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("Malformed {collection} data: {source}")]
    Malformed {
        collection: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Error, Debug)]
pub enum RelayError {
    #[error("Invalid phone number format: {0}. Expected + followed by 10 to 15 digits")]
    InvalidPhoneNumber(String),
    #[error("SMS relay is not configured")]
    NotConfigured,
    #[error("SMS provider request failed: {0}")]
    Upstream(String),
}

/// Errors surfaced at the HTTP boundary.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),
    #[error("{0}")]
    InvalidFormat(String),
    #[error("{0}")]
    ServiceUnavailable(String),
    #[error("Storage failure")]
    Storage(#[from] DataStorageError),
}

impl From<RelayError> for ApiError {
    fn from(err: RelayError) -> Self {
        match err {
            RelayError::InvalidPhoneNumber(_) => ApiError::InvalidFormat(err.to_string()),
            // Provider failures normally come back as an unsuccessful receipt.
            RelayError::NotConfigured | RelayError::Upstream(_) => {
                ApiError::ServiceUnavailable(err.to_string())
            }
        }
    }
}
