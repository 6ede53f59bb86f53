//! Authentication for a Cosmetica session.
//!
//! This module provides:
//! - Identity and credential types, with token redaction
//! - The Cosmetica API client for auth and settings endpoints
//! - The persisted token cache
//! - Token validation and credential issuance (override, cache, exchange)
//! - The readiness gate in front of the first authentication
//! - First-login defaults and the new-player welcome
//! - The authentication state machine

pub mod api;
pub mod coordinator;
pub mod credentials;
pub mod defaults;
pub mod issuer;
pub mod readiness;
pub mod token_store;
pub mod validator;
pub mod welcome;

pub use api::{CosmeticaApi, LoginInfo, UserInfo};
pub use coordinator::{AuthAttempt, AuthCoordinator, CoordinatorOptions, SessionState};
pub use credentials::{Credential, Identity, PlatformUser};
pub use defaults::{CapeDisplay, DefaultSettingsConfig};
pub use issuer::{CredentialIssuer, CredentialSource, Issued};
pub use readiness::{GateState, ReadinessGate, API_ENDPOINT_RESOLVED, CLIENT_LOAD_FINISHED};
pub use token_store::TokenStore;
pub use validator::TokenValidator;
pub use welcome::WelcomeMode;
