//! Error handling for the session coordinator.
//!
//! | Variant | Category | Policy |
//! |---------|----------|--------|
//! | `TransientNetwork` | Network | retry on the next tick, keep the credential |
//! | `AuthServerUnreachable` | Network | same, raised by the platform-token exchange |
//! | `MalformedResponse` | Server | log, keep the session |
//! | `AuthRejected` | Auth | surface the unauthenticated state, no retry loop |
//! | `TokenInvalid` | Auth | re-issue, never user visible |
//! | `Persistence` | Persistence | log, continue in memory |
//!
//! Nothing in here is fatal to the host process.

mod category;
mod session_error;

pub use category::ErrorCategory;
pub use session_error::SessionError;

/// Type alias for Results using SessionError.
pub type SessionResult<T> = Result<T, SessionError>;
