//! Fixed-content profile loader for testing.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use crate::auth::credentials::Identity;
use crate::traits::{PlayerProfile, ProfileLoader};

/// [`ProfileLoader`] serving profiles registered up front.
///
/// Unknown identities load as `None`. Loads and prefetches are recorded.
#[derive(Debug, Default)]
pub struct StaticProfiles {
    profiles: Mutex<HashMap<Uuid, PlayerProfile>>,
    loads: Mutex<Vec<Identity>>,
    prefetches: Mutex<Vec<Identity>>,
    /// Latency applied to every load.
    delay: Mutex<Option<Duration>>,
}

impl StaticProfiles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a profile with empty lore and no skin.
    pub fn with(self, identity: &Identity) -> Self {
        self.insert(PlayerProfile {
            identity: identity.clone(),
            skin: None,
            lore: String::new(),
        });
        self
    }

    pub fn insert(&self, profile: PlayerProfile) {
        self.profiles
            .lock()
            .unwrap()
            .insert(profile.identity.user_id, profile);
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    pub fn loads(&self) -> Vec<Identity> {
        self.loads.lock().unwrap().clone()
    }

    pub fn prefetches(&self) -> Vec<Identity> {
        self.prefetches.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProfileLoader for StaticProfiles {
    async fn load(&self, identity: &Identity) -> Option<PlayerProfile> {
        self.loads.lock().unwrap().push(identity.clone());
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.profiles.lock().unwrap().get(&identity.user_id).cloned()
    }

    fn prefetch(&self, identity: &Identity) {
        self.prefetches.lock().unwrap().push(identity.clone());
    }
}
