//! Trait abstractions for dependency injection and testability.
//!
//! # Traits
//!
//! - [`HttpClient`] - HTTP client operations (GET, POST)
//! - [`UiSink`] - the UI layer the coordinator reports to
//! - [`ProfileLoader`] - player profile loading and prefetch

pub mod http;
pub mod profile;
pub mod ui;

pub use http::{Headers, HttpClient, HttpError, Response};
pub use profile::{PlayerProfile, ProfileLoader};
pub use ui::{Transition, UiEvent, UiSink, WelcomeKind};
