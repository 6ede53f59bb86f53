//! Unified error type for the session coordinator.
//!
//! `SessionError` carries the failure taxonomy the coordinator reasons about.
//! The distinction that matters most is between "could not find out"
//! ([`SessionError::TransientNetwork`]) and "found out, and the answer is no"
//! ([`SessionError::TokenInvalid`], [`SessionError::AuthRejected`]).

use std::fmt;
use std::path::PathBuf;

use super::category::ErrorCategory;
use crate::traits::HttpError;

/// Errors produced by the authentication and settings subsystems.
#[derive(Debug, Clone)]
pub enum SessionError {
    /// A remote call could not be completed (offline, refused, timed out).
    TransientNetwork { operation: String, message: String },

    /// The platform-token exchange could not reach the auth server.
    AuthServerUnreachable { message: String },

    /// The server answered with a payload we could not decode.
    MalformedResponse {
        operation: String,
        message: String,
        /// Raw body, kept for elevated-verbosity diagnostics.
        body: Option<String>,
    },

    /// The auth server explicitly refused the platform access token.
    AuthRejected { status: u16, message: String },

    /// The validator confirmed the master token is no longer accepted.
    TokenInvalid,

    /// The token cache file could not be read or written.
    Persistence { path: PathBuf, message: String },

    /// The server answered with an error unrelated to credential validity.
    ServerError { status: u16, message: String },

    /// A local configuration file exists but could not be used.
    Configuration { message: String },
}

impl SessionError {
    /// Convenience constructor for transport failures.
    pub fn transient(operation: impl Into<String>, message: impl Into<String>) -> Self {
        SessionError::TransientNetwork {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Convenience constructor for undecodable payloads.
    pub fn malformed(
        operation: impl Into<String>,
        message: impl Into<String>,
        body: Option<String>,
    ) -> Self {
        SessionError::MalformedResponse {
            operation: operation.into(),
            message: message.into(),
            body,
        }
    }

    /// Get the category of this error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            SessionError::TransientNetwork { .. } | SessionError::AuthServerUnreachable { .. } => {
                ErrorCategory::Network
            }
            SessionError::AuthRejected { .. } | SessionError::TokenInvalid => ErrorCategory::Auth,
            SessionError::MalformedResponse { .. } | SessionError::ServerError { .. } => {
                ErrorCategory::Server
            }
            SessionError::Persistence { .. } => ErrorCategory::Persistence,
            SessionError::Configuration { .. } => ErrorCategory::Configuration,
        }
    }

    /// True when the failure says nothing about the credential itself.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            SessionError::TransientNetwork { .. } | SessionError::AuthServerUnreachable { .. }
        )
    }

    /// True for failures that warrant the unauthenticated UI state.
    ///
    /// `TokenInvalid` is deliberately absent: it leads to re-issuance, not to
    /// a visible failure.
    pub fn is_user_visible(&self) -> bool {
        matches!(
            self,
            SessionError::AuthRejected { .. }
                | SessionError::TransientNetwork { .. }
                | SessionError::AuthServerUnreachable { .. }
        )
    }

    /// Get a user-friendly error message.
    pub fn user_message(&self) -> String {
        match self {
            SessionError::TransientNetwork { .. } | SessionError::AuthServerUnreachable { .. } => {
                "Could not reach the Cosmetica servers. We will try again shortly.".to_string()
            }
            SessionError::MalformedResponse { .. } => {
                "Received an unexpected response from the server.".to_string()
            }
            SessionError::AuthRejected { .. } => {
                "Cosmetica could not verify your account. Please restart your game.".to_string()
            }
            SessionError::TokenInvalid => "Your session has expired. Signing in again.".to_string(),
            SessionError::Persistence { .. } => {
                "Could not save your session. You will be asked to sign in next launch."
                    .to_string()
            }
            SessionError::ServerError { status, .. } => {
                format!("The server returned an error (HTTP {}).", status)
            }
            SessionError::Configuration { message } => {
                format!("Configuration problem: {}", message)
            }
        }
    }

    /// Get a short error code for logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            SessionError::TransientNetwork { .. } => "E_NET_TRANSIENT",
            SessionError::AuthServerUnreachable { .. } => "E_AUTH_UNREACHABLE",
            SessionError::MalformedResponse { .. } => "E_SRV_MALFORMED",
            SessionError::AuthRejected { .. } => "E_AUTH_REJECTED",
            SessionError::TokenInvalid => "E_AUTH_TOKEN_INV",
            SessionError::Persistence { .. } => "E_SYS_PERSIST",
            SessionError::ServerError { .. } => "E_SRV_STATUS",
            SessionError::Configuration { .. } => "E_CFG",
        }
    }

    /// Get the recovery hint for this error.
    pub fn recovery_hint(&self) -> &'static str {
        self.category().recovery_hint()
    }
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::TransientNetwork { operation, message } => {
                write!(f, "{} failed: {}", operation, message)
            }
            SessionError::AuthServerUnreachable { message } => {
                write!(f, "Auth server unreachable: {}", message)
            }
            SessionError::MalformedResponse {
                operation, message, ..
            } => write!(f, "Malformed response from {}: {}", operation, message),
            SessionError::AuthRejected { status, message } => {
                write!(f, "Platform token rejected ({}): {}", status, message)
            }
            SessionError::TokenInvalid => write!(f, "Master token is no longer valid"),
            SessionError::Persistence { path, message } => {
                write!(f, "Token cache error at '{}': {}", path.display(), message)
            }
            SessionError::ServerError { status, message } => {
                write!(f, "Server error ({}): {}", status, message)
            }
            SessionError::Configuration { message } => write!(f, "Configuration error: {}", message),
        }
    }
}

impl std::error::Error for SessionError {}

impl From<HttpError> for SessionError {
    fn from(err: HttpError) -> Self {
        match err {
            HttpError::InvalidUrl(message) => SessionError::Configuration { message },
            other => SessionError::transient("request", other.to_string()),
        }
    }
}

impl From<std::io::Error> for SessionError {
    fn from(err: std::io::Error) -> Self {
        SessionError::Persistence {
            path: PathBuf::new(),
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for SessionError {
    fn from(err: serde_json::Error) -> Self {
        SessionError::malformed("decode", err.to_string(), None)
    }
}
