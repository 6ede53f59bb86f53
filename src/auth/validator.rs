//! Remote validity check for a master token.

use tracing::{debug, warn};

use super::api::{CosmeticaApi, WhoAmI};
use crate::error::SessionResult;

/// Marker the server uses in its error body for a revoked or unknown token.
const INVALID_TOKEN_MARKER: &str = "invalid token";

/// Asks the server whether a master token is still accepted.
#[derive(Clone)]
pub struct TokenValidator {
    api: CosmeticaApi,
}

impl TokenValidator {
    pub fn new(api: CosmeticaApi) -> Self {
        Self { api }
    }

    /// Returns `Ok(true)` only when the server says the token is invalid.
    ///
    /// Unrelated server errors and unreadable bodies count as "not invalid":
    /// treating them as invalidity would throw away good credentials. A
    /// request that never got an answer is `Err(TransientNetwork)`.
    pub async fn is_invalid(&self, master_token: &str) -> SessionResult<bool> {
        match self.api.whoami(master_token).await? {
            WhoAmI::Known { .. } => {
                debug!("Token accepted by server");
                Ok(false)
            }
            WhoAmI::Error(message) if message.contains(INVALID_TOKEN_MARKER) => {
                debug!("Server reports token invalid");
                Ok(true)
            }
            WhoAmI::Error(message) => {
                warn!("Token check returned unrelated error: {}", message);
                Ok(false)
            }
            WhoAmI::Unreadable => {
                warn!("Token check returned an unreadable response");
                Ok(false)
            }
        }
    }
}
