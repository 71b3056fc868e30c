//! Error types for remote API calls.

/// Errors that can occur when talking to the shopping list server.
#[derive(Debug)]
pub enum ApiError {
    /// The request never produced a response (DNS, connect, timeout)
    Transport(String),
    /// The server answered with a non-2xx status
    Server { status: u16, message: String },
    /// The response body could not be decoded
    Decode(String),
    /// The server answered 404 for the targeted id
    NotFound,
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::Transport(e) => write!(f, "Transport error: {}", e),
            ApiError::Server { status, message } => {
                write!(f, "Server returned status {}: {}", status, message)
            }
            ApiError::Decode(e) => write!(f, "Decoding error: {}", e),
            ApiError::NotFound => write!(f, "Not found on server"),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ApiError::Decode(e.to_string())
        } else {
            ApiError::Transport(e.to_string())
        }
    }
}
