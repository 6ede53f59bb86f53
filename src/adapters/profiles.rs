//! Profile loader backed by the user info endpoint.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::auth::api::CosmeticaApi;
use crate::auth::credentials::Identity;
use crate::traits::{PlayerProfile, ProfileLoader};

/// Loads profiles through [`CosmeticaApi::get_user_info`] and keeps them.
#[derive(Clone)]
pub struct ApiProfileLoader {
    inner: Arc<Inner>,
}

struct Inner {
    api: CosmeticaApi,
    cache: Mutex<HashMap<Uuid, PlayerProfile>>,
}

impl ApiProfileLoader {
    pub fn new(api: CosmeticaApi) -> Self {
        Self {
            inner: Arc::new(Inner {
                api,
                cache: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Cached profile, without fetching.
    pub fn cached(&self, identity: &Identity) -> Option<PlayerProfile> {
        self.inner.cached(identity)
    }

    /// Drop every cached profile.
    pub fn clear(&self) {
        self.inner
            .cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl Inner {
    fn cached(&self, identity: &Identity) -> Option<PlayerProfile> {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&identity.user_id)
            .cloned()
    }

    async fn fetch(&self, identity: &Identity) -> Option<PlayerProfile> {
        if let Some(profile) = self.cached(identity) {
            return Some(profile);
        }

        match self.api.get_user_info(identity, None).await {
            Ok(info) => {
                let profile = PlayerProfile {
                    identity: identity.clone(),
                    skin: info.skin,
                    lore: info.lore,
                };
                self.cache
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .insert(identity.user_id, profile.clone());
                Some(profile)
            }
            Err(e) => {
                warn!(player = %identity, code = e.error_code(), "Failed to load profile: {}", e);
                None
            }
        }
    }
}

#[async_trait]
impl ProfileLoader for ApiProfileLoader {
    async fn load(&self, identity: &Identity) -> Option<PlayerProfile> {
        self.inner.fetch(identity).await
    }

    fn prefetch(&self, identity: &Identity) {
        if self.inner.cached(identity).is_some() {
            return;
        }
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            debug!("No runtime, skipping profile prefetch");
            return;
        };
        let inner = Arc::clone(&self.inner);
        let identity = identity.clone();
        handle.spawn(async move {
            inner.fetch(&identity).await;
        });
    }
}
