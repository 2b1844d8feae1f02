//! Error types for fetching and filtering exchange rates.

use thiserror::Error;

/// Errors raised while fetching or normalizing rate data for one identifier.
///
/// The identifier is a currency code in the per-currency pipeline and a
/// `dd.mm.yyyy` date in the per-date pipeline.
#[derive(Error, Debug)]
pub enum RateError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Failed to fetch exchange rates for {identifier}: HTTP {status}")]
    Fetch {
        identifier: String,
        status: reqwest::StatusCode,
    },

    #[error("Request error for {identifier}: {source}")]
    Transport {
        identifier: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to parse JSON response for {identifier}: {source}")]
    Body {
        identifier: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid {field} value for {identifier}: {value}")]
    InvalidNumber {
        identifier: String,
        field: &'static str,
        value: String,
    },

    #[error("Failed to build HTTP client: {0}")]
    Session(#[source] reqwest::Error),
}

impl RateError {
    /// Identifier the error refers to, if any.
    pub fn identifier(&self) -> Option<&str> {
        match self {
            RateError::Fetch { identifier, .. }
            | RateError::Transport { identifier, .. }
            | RateError::Body { identifier, .. }
            | RateError::InvalidNumber { identifier, .. } => Some(identifier.as_str()),
            RateError::Validation(_) | RateError::Session(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_names_identifier() {
        let err = RateError::Fetch {
            identifier: "USD".to_string(),
            status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
        };
        assert_eq!(
            err.to_string(),
            "Failed to fetch exchange rates for USD: HTTP 500 Internal Server Error"
        );
        assert_eq!(err.identifier(), Some("USD"));
    }

    #[test]
    fn test_validation_error_has_no_identifier() {
        let err = RateError::Validation("Number of days cannot exceed 10.".to_string());
        assert!(err.identifier().is_none());
        assert_eq!(
            err.to_string(),
            "Validation error: Number of days cannot exceed 10."
        );
    }
}
