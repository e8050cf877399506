//! # Error Types
//!
//! Error types for the Vault client using `thiserror`.

/// Custom result type for Vault client operations
pub type Result<T> = std::result::Result<T, VaultError>;

/// Main error type for the Vault client
#[derive(thiserror::Error, Debug)]
pub enum VaultError {
    /// The service answered with a status outside the operation's success set.
    ///
    /// Displays exactly the service-reported message so callers can surface it
    /// to an operator unchanged.
    #[error("{message}")]
    Protocol { status: u16, message: String },

    /// The exchange could not complete (connection refused, DNS, timeout)
    #[error("Transport error: {message}")]
    Transport {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The merged request could not be turned into a valid HTTP request
    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    /// A successful response body did not match the expected shape
    #[error("Decode error: {context}")]
    Decode {
        #[source]
        source: serde_json::Error,
        context: String,
    },

    /// A successful response carried no body where one is required
    #[error("Empty response from {operation}")]
    EmptyResponse { operation: String },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Validation errors
    #[error("Validation error: {message}")]
    Validation { message: String, field: Option<String> },

    /// Span exporter or tracer construction errors
    #[error("Tracing error: {message}")]
    Tracing { message: String },
}

impl VaultError {
    /// Create a protocol error from a non-success status
    pub fn protocol<S: Into<String>>(status: u16, message: S) -> Self {
        Self::Protocol { status, message: message.into() }
    }

    /// Create a transport error
    pub fn transport<S: Into<String>>(message: S) -> Self {
        Self::Transport { message: message.into(), source: None }
    }

    /// Create a transport error with source
    pub fn transport_with_source<S: Into<String>>(
        message: S,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        Self::Transport { message: message.into(), source: Some(source) }
    }

    /// Create an invalid request error
    pub fn invalid_request<S: Into<String>>(message: S) -> Self {
        Self::InvalidRequest { message: message.into() }
    }

    /// Create a decode error with context
    pub fn decode<S: Into<String>>(source: serde_json::Error, context: S) -> Self {
        Self::Decode { source, context: context.into() }
    }

    /// Create an empty response error
    pub fn empty_response<S: Into<String>>(operation: S) -> Self {
        Self::EmptyResponse { operation: operation.into() }
    }

    /// Create a configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config { message: message.into(), source: None }
    }

    /// Create a configuration error with source
    pub fn config_with_source<S: Into<String>>(
        message: S,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        Self::Config { message: message.into(), source: Some(source) }
    }

    /// Create a validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation { message: message.into(), field: None }
    }

    /// Create a validation error with field information
    pub fn validation_field<S: Into<String>, F: Into<String>>(message: S, field: F) -> Self {
        Self::Validation { message: message.into(), field: Some(field.into()) }
    }

    /// Create a tracing error
    pub fn tracing<S: Into<String>>(message: S) -> Self {
        Self::Tracing { message: message.into() }
    }

    /// HTTP status reported by the service, if this is a protocol error
    pub fn status(&self) -> Option<u16> {
        match self {
            VaultError::Protocol { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the service reported the failure (as opposed to the exchange failing)
    pub fn is_protocol(&self) -> bool {
        matches!(self, VaultError::Protocol { .. })
    }

    /// Whether the exchange itself failed
    pub fn is_transport(&self) -> bool {
        matches!(self, VaultError::Transport { .. })
    }
}

impl From<reqwest::Error> for VaultError {
    fn from(error: reqwest::Error) -> Self {
        let message = if error.is_timeout() {
            "request timed out".to_string()
        } else if error.is_connect() {
            "connection failed".to_string()
        } else {
            "request failed".to_string()
        };
        Self::transport_with_source(message, Box::new(error))
    }
}

impl From<config::ConfigError> for VaultError {
    fn from(error: config::ConfigError) -> Self {
        Self::config_with_source("Configuration loading failed", Box::new(error))
    }
}

impl From<validator::ValidationErrors> for VaultError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let message = errors
            .field_errors()
            .iter()
            .map(|(field, field_errors)| {
                let error_messages: Vec<String> = field_errors
                    .iter()
                    .map(|e| {
                        e.message.as_ref().map_or("Invalid value".to_string(), |m| m.to_string())
                    })
                    .collect();
                format!("{}: {}", field, error_messages.join(", "))
            })
            .collect::<Vec<_>>()
            .join("; ");

        Self::validation(format!("Validation failed: {}", message))
    }
}
