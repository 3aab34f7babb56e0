// src/handlers/error.rs
use serde::Serialize;
use std::fmt;
use warp::http::StatusCode;
use warp::reject::Reject;

/// Failure surfaced to API callers as `{ error, symbol?, message? }`.
#[derive(Debug, Clone)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: String,
    pub symbol: Option<String>,
    pub message: Option<String>,
}

#[derive(Serialize)]
pub struct ErrorBody<'a> {
    pub error: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'a str>,
}

impl ApiError {
    pub fn new(status: StatusCode, error: impl Into<String>) -> Self {
        ApiError {
            status,
            error: error.into(),
            symbol: None,
            message: None,
        }
    }

    pub fn with_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = Some(symbol.into());
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn missing_symbol() -> Self {
        ApiError::new(StatusCode::BAD_REQUEST, "Symbol parameter is required")
    }

    pub fn all_sources_failed(symbol: &str) -> Self {
        ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Unable to fetch real-time data from all sources",
        )
        .with_symbol(symbol)
        .with_message("Please check the symbol or try again later")
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        ApiError::new(StatusCode::NOT_FOUND, "Not Found").with_message(what)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            .with_message(message)
    }

    pub fn body(&self) -> ErrorBody<'_> {
        ErrorBody {
            error: &self.error,
            symbol: self.symbol.as_deref(),
            message: self.message.as_deref(),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.message {
            Some(message) => write!(f, "{} ({}): {}", self.error, self.status, message),
            None => write!(f, "{} ({})", self.error, self.status),
        }
    }
}

impl std::error::Error for ApiError {}
impl Reject for ApiError {}
