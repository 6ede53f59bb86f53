//! Player profile loader boundary.

use async_trait::async_trait;

use crate::auth::credentials::Identity;

/// Profile data the UI needs before it can show a player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerProfile {
    pub identity: Identity,
    /// Skin texture reference, if the player has one.
    pub skin: Option<String>,
    /// Lore line, with colour codes intact.
    pub lore: String,
}

/// Trait for the collaborator that loads (and caches) player profiles.
#[async_trait]
pub trait ProfileLoader: Send + Sync {
    /// Load the profile for `identity`. `None` if it could not be loaded.
    async fn load(&self, identity: &Identity) -> Option<PlayerProfile>;

    /// Start loading `identity` in the background. Fire-and-forget.
    fn prefetch(&self, identity: &Identity);
}
