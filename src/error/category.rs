//! Error category classification for session error handling.
//!
//! Categories drive the coordinator's recovery policy: whether an error is
//! retried later, whether it invalidates the session, and whether the user
//! ever gets to see it.

use std::fmt;

/// High-level categorization of errors for handling decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Connectivity problems (offline, refused, timeout).
    /// Retried by the next periodic tick or the next menu open.
    Network,

    /// The auth service refused our credentials or platform token.
    Auth,

    /// The server answered, but not with something we understood or accepted.
    Server,

    /// Local cache file could not be read or written.
    Persistence,

    /// Local configuration file is present but unusable.
    Configuration,
}

impl ErrorCategory {
    /// Returns true if errors in this category are generally transient
    /// and the operation can be retried.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorCategory::Network | ErrorCategory::Server)
    }

    /// Returns a short label for the category suitable for logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Network => "network",
            ErrorCategory::Auth => "auth",
            ErrorCategory::Server => "server",
            ErrorCategory::Persistence => "persistence",
            ErrorCategory::Configuration => "configuration",
        }
    }

    /// Returns suggested recovery actions for this category.
    pub fn recovery_hint(&self) -> &'static str {
        match self {
            ErrorCategory::Network => "Check your internet connection; we will retry automatically",
            ErrorCategory::Auth => "Restart the game to sign in again",
            ErrorCategory::Server => "The server may be experiencing issues. Please try again later",
            ErrorCategory::Persistence => "Check permissions on the cache directory",
            ErrorCategory::Configuration => "Check your default-settings.json file",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
