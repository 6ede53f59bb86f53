//! UI collaborator boundary.
//!
//! The coordinator never renders anything. It asks one question of the UI
//! layer ("is a loading-type screen showing?") and emits [`UiEvent`]s. The
//! implementation is responsible for marshalling events onto whatever thread
//! owns UI state.

use crate::auth::credentials::Identity;

/// Screen the UI should move to after a successful settings sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// The default cosmetics menu.
    MainMenu,
    /// Customise the local player's own cosmetics.
    CustomizeOwn,
    /// Browse (and copy from) another player's cosmetics.
    ViewOther(Identity),
    /// First-run tutorial flavour of the main menu.
    Tutorial,
}

/// How a new player is greeted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WelcomeKind {
    /// A clickable chat line pointing at the cosmetics menu.
    ChatMessage,
    /// The full-screen first-run tutorial.
    Tutorial,
}

/// Signals emitted by the coordinator towards the UI layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    /// Replace the current loading screen with the unauthenticated notice.
    ShowUnauthenticated,
    /// Replace the current loading screen with the resolved load target.
    TransitionTo(Transition),
    /// The ViewOther target could not be shown. `None` when no target was set.
    ViewOtherUnavailable { target: Option<Identity> },
    /// Greet the player.
    ShowWelcome {
        identity: Identity,
        is_new: bool,
        kind: WelcomeKind,
    },
}

/// Trait for the UI layer the coordinator reports to.
pub trait UiSink: Send + Sync {
    /// Whether a loading-type screen is currently shown.
    fn is_loading_screen(&self) -> bool;

    /// Hand an event to the UI thread. Must not block.
    fn dispatch(&self, event: UiEvent);
}
