//! Credential acquisition.
//!
//! Three ways to get a credential, tried in this order:
//!
//! 1. **Override**: an operator-supplied master token. Used as is, never
//!    validated, never persisted.
//! 2. **Cache reuse**: a stored pair whose master token the server still
//!    accepts.
//! 3. **Re-issuance**: exchange the platform access token for a new pair and
//!    persist it.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, error, info};

use super::api::{CosmeticaApi, LoginInfo};
use super::credentials::{Credential, PlatformUser};
use super::token_store::TokenStore;
use super::validator::TokenValidator;
use crate::error::SessionResult;

/// Where an issued credential came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    Override,
    Cached,
    Reissued,
}

impl fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CredentialSource::Override => "override",
            CredentialSource::Cached => "cache",
            CredentialSource::Reissued => "exchange",
        };
        write!(f, "{}", s)
    }
}

/// A credential ready for use.
#[derive(Debug, Clone)]
pub struct Issued {
    pub credential: Credential,
    pub source: CredentialSource,
    /// First-login metadata; only ever present for [`CredentialSource::Reissued`].
    pub login_info: Option<LoginInfo>,
}

/// Runs the acquisition protocols against the token cache and the server.
pub struct CredentialIssuer {
    api: CosmeticaApi,
    validator: TokenValidator,
    store: Arc<TokenStore>,
    client_id: String,
    override_token: Option<String>,
}

impl CredentialIssuer {
    pub fn new(
        api: CosmeticaApi,
        store: Arc<TokenStore>,
        client_id: impl Into<String>,
        override_token: Option<String>,
    ) -> Self {
        Self {
            validator: TokenValidator::new(api.clone()),
            api,
            store,
            client_id: client_id.into(),
            override_token: override_token.filter(|t| !t.trim().is_empty()),
        }
    }

    pub fn validator(&self) -> &TokenValidator {
        &self.validator
    }

    pub fn store(&self) -> &Arc<TokenStore> {
        &self.store
    }

    pub fn has_override(&self) -> bool {
        self.override_token.is_some()
    }

    /// Obtain a credential for `user`.
    ///
    /// A transient failure while validating a cached credential fails the
    /// whole attempt: re-issuance needs the same network.
    pub async fn acquire(&self, user: &PlatformUser) -> SessionResult<Issued> {
        if let Some(token) = &self.override_token {
            debug!("Authenticating from provided token");
            return Ok(Issued {
                credential: Credential::master_only(token.clone()),
                source: CredentialSource::Override,
                login_info: None,
            });
        }

        let reason = match self.store.get(&user.identity) {
            Some(cached) => {
                debug!("Found cached token, checking it");
                if !self.validator.is_invalid(&cached.master_token).await? {
                    info!(identity = %user.identity, "Reusing cached credential");
                    return Ok(Issued {
                        credential: cached,
                        source: CredentialSource::Cached,
                        login_info: None,
                    });
                }
                "Cached token rejected by server."
            }
            None => "No cached token found.",
        };

        debug!("{} Exchanging platform access token", reason);
        self.reissue(user).await
    }

    async fn reissue(&self, user: &PlatformUser) -> SessionResult<Issued> {
        let issued = self
            .api
            .exchange_platform_token(user, &self.client_id)
            .await?;

        debug!("Caching authentication tokens");
        if let Err(e) = self.store.put(&user.identity, &issued.credential) {
            error!(code = e.error_code(), "Failed to save tokens: {}", e);
        }

        info!(identity = %user.identity, "Issued new credential");
        Ok(Issued {
            credential: issued.credential,
            source: CredentialSource::Reissued,
            login_info: issued.login_info,
        })
    }
}
