//! Mock implementations for testing.
//!
//! Test doubles for every trait seam, so the coordinator can be driven
//! without network access or a real UI.
//!
//! # Available Mocks
//!
//! - [`MockHttpClient`] - HTTP client with scripted responses
//! - [`RecordingUi`] - UI sink that records dispatched events
//! - [`StaticProfiles`] - profile loader with a fixed set of players

pub mod http;
pub mod profile;
pub mod ui;

pub use http::{MockHttpClient, MockResponse, RecordedRequest};
pub use profile::StaticProfiles;
pub use ui::RecordingUi;
