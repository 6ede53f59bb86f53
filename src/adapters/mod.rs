//! Concrete implementations of trait abstractions.
//!
//! # Adapters
//!
//! - [`ReqwestHttpClient`] - HTTP client using reqwest
//! - [`ChannelUi`] - UI sink forwarding events over an mpsc channel
//! - [`ApiProfileLoader`] - profile loader backed by the user info endpoint
//!
//! # Mock Implementations
//!
//! The [`mock`] submodule provides test doubles:
//! - [`mock::MockHttpClient`] - Scripted HTTP responses
//! - [`mock::RecordingUi`] - Records UI events
//! - [`mock::StaticProfiles`] - Fixed profile set

pub mod channel_ui;
pub mod mock;
pub mod profiles;
pub mod reqwest_http;

pub use channel_ui::ChannelUi;
pub use mock::{MockHttpClient, RecordingUi, StaticProfiles};
pub use profiles::ApiProfileLoader;
pub use reqwest_http::ReqwestHttpClient;
