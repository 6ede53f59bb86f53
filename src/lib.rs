//! Cosmetica session authentication.
//!
//! Obtains, caches, validates and refreshes the Cosmetica session credential
//! for the logged-in platform user, and keeps the user's server-side
//! settings in sync once authenticated.
//!
//! Start with [`session::Session`].

pub mod adapters;
pub mod auth;
pub mod config;
pub mod error;
pub mod logging;
pub mod scheduler;
pub mod session;
pub mod settings;
pub mod traits;

pub use config::SessionConfig;
pub use error::{SessionError, SessionResult};
pub use session::Session;
