// Error types shared by the gateway, the orchestrators and the tool surface

use std::fmt;

use thiserror::Error;

/// Coarse classification of an upstream failure, derived from the HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClassification {
    NotFound,
    BadRequest,
    Unauthorized,
    Transient,
    Unknown,
}

impl ErrorClassification {
    pub fn from_status(status_code: u16) -> Self {
        match status_code {
            404 => Self::NotFound,
            400 => Self::BadRequest,
            401 | 403 => Self::Unauthorized,
            408 | 429 | 500..=599 => Self::Transient,
            _ => Self::Unknown,
        }
    }

    // Failures that say something about upstream health rather than about the request.
    pub fn trips_breaker(self) -> bool {
        matches!(self, Self::Transient | Self::Unknown)
    }
}

impl fmt::Display for ErrorClassification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::NotFound => "not found",
            Self::BadRequest => "bad request",
            Self::Unauthorized => "unauthorized",
            Self::Transient => "transient",
            Self::Unknown => "unknown",
        };
        f.write_str(label)
    }
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Authentication failed: {0}")]
    AuthFailure(String),

    #[error("API error ({classification}): {status_code} - {message}; upstream said: {raw_body}")]
    Upstream {
        classification: ErrorClassification,
        status_code: u16,
        message: String,
        raw_body: String,
    },

    #[error("Request timeout after {0}ms")]
    Timeout(u64),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Circuit breaker open for {service_name}, retry in {retry_after_ms}ms")]
    CircuitBreakerOpen {
        service_name: String,
        retry_after_ms: u64,
    },

    #[error("Malformed upstream response: {0}")]
    Decode(String),

    #[error("No hotels found for city code {0}")]
    NoInventory(String),

    #[error("Invalid parameter `{field}`: {message}")]
    Validation { field: String, message: String },
}

impl ApiError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Builds the classified error for a non-success upstream status.
    pub fn from_status(status_code: u16, raw_body: impl Into<String>) -> Self {
        let classification = ErrorClassification::from_status(status_code);
        let message = match classification {
            ErrorClassification::NotFound => {
                "resource not found; probable causes: invalid city code, no matching inventory, stale endpoint"
                    .to_string()
            }
            ErrorClassification::BadRequest => {
                "request rejected; probable causes: malformed parameters, missing required fields, wrong date format (expected YYYY-MM-DD)"
                    .to_string()
            }
            ErrorClassification::Unauthorized => "access token rejected by upstream".to_string(),
            ErrorClassification::Transient => "upstream temporarily unavailable".to_string(),
            ErrorClassification::Unknown => "unexpected upstream status".to_string(),
        };
        Self::Upstream {
            classification,
            status_code,
            message,
            raw_body: raw_body.into(),
        }
    }

    /// `None` for caller-side and fatal errors that never reach the upstream taxonomy.
    pub fn classification(&self) -> Option<ErrorClassification> {
        match self {
            Self::Upstream { classification, .. } => Some(*classification),
            Self::Timeout(_) | Self::NetworkError(_) | Self::CircuitBreakerOpen { .. } => {
                Some(ErrorClassification::Transient)
            }
            Self::Decode(_) => Some(ErrorClassification::Unknown),
            Self::NoInventory(_) => Some(ErrorClassification::NotFound),
            Self::AuthFailure(_) | Self::Validation { .. } => None,
        }
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::AuthFailure(_))
    }

    /// Errors the orchestrators must hand back instead of substituting data.
    pub fn escapes_degradation(&self) -> bool {
        matches!(self, Self::AuthFailure(_) | Self::Validation { .. })
    }
}

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Initialization error: {0}")]
    InitError(String),
}
