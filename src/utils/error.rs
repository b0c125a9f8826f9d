use thiserror::Error;

#[derive(Error, Debug)]
pub enum CartError {
    #[error("Cart request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Malformed response from {endpoint}: {source}")]
    MalformedResponse {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Request to {endpoint} rejected with status {status}: {message}")]
    RejectedError {
        endpoint: String,
        status: u16,
        message: String,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Invalid cart line identifier: '{value}'")]
    InvalidLineError { value: String },

    #[error("Unknown {kind}: {id}")]
    UnknownElementError { kind: &'static str, id: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Response,
    Configuration,
    Input,
    Storage,
}

impl CartError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            CartError::HttpError(_) => ErrorCategory::Network,
            CartError::MalformedResponse { .. } | CartError::RejectedError { .. } => {
                ErrorCategory::Response
            }
            CartError::IoError(_) | CartError::SerializationError(_) => ErrorCategory::Storage,
            CartError::ConfigError { .. }
            | CartError::ConfigValidationError { .. }
            | CartError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            CartError::InvalidLineError { .. } | CartError::UnknownElementError { .. } => {
                ErrorCategory::Input
            }
        }
    }

    /// Network and response failures are worth a manual retry; nothing else is.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::Network | ErrorCategory::Response
        )
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Network => "Could not reach the store. Check your connection.".to_string(),
            ErrorCategory::Response => match self {
                CartError::RejectedError { message, .. } if !message.is_empty() => message.clone(),
                _ => "The store sent an unexpected response.".to_string(),
            },
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::Input => self.to_string(),
            ErrorCategory::Storage => format!("Local storage problem: {}", self),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Network => "Try again once the storefront is reachable",
            ErrorCategory::Response => "Try again; if it keeps failing the product may be unavailable",
            ErrorCategory::Configuration => "Check the configuration file and the --base-url flag",
            ErrorCategory::Input => "Check the identifier you passed",
            ErrorCategory::Storage => "Delete the local state file to start fresh",
        }
    }
}

pub type Result<T> = std::result::Result<T, CartError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories_drive_retryability() {
        let rejected = CartError::RejectedError {
            endpoint: "/cart/add.js".to_string(),
            status: 422,
            message: "Sold out".to_string(),
        };
        assert_eq!(rejected.category(), ErrorCategory::Response);
        assert!(rejected.is_retryable());
        assert_eq!(rejected.user_friendly_message(), "Sold out");

        let bad_line = CartError::InvalidLineError {
            value: "abc".to_string(),
        };
        assert_eq!(bad_line.category(), ErrorCategory::Input);
        assert!(!bad_line.is_retryable());
    }

    #[test]
    fn test_malformed_response_is_response_category() {
        let source = serde_json::from_str::<serde_json::Value>("<html>").unwrap_err();
        let err = CartError::MalformedResponse {
            endpoint: "/cart.js".to_string(),
            source,
        };
        assert_eq!(err.category(), ErrorCategory::Response);
        assert_eq!(
            err.user_friendly_message(),
            "The store sent an unexpected response."
        );
    }
}
