//! Settings synchronisation.
//!
//! Pulls the server-side settings bundle once authenticated, keeps the last
//! good copy, and resolves the pending load target into a UI transition when
//! a loading screen is waiting on it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use tracing::{debug, error};

use super::model::{LoadTarget, UserSettings};
use crate::auth::api::CosmeticaApi;
use crate::auth::coordinator::{AuthAttempt, AuthCoordinator};
use crate::auth::credentials::Identity;
use crate::error::SessionError;
use crate::traits::{ProfileLoader, Transition, UiEvent, UiSink};

/// Result of one [`SettingsSynchronizer::sync`] call.
#[derive(Debug)]
pub enum SyncOutcome {
    /// Not authenticated (or authenticated as someone else); authentication
    /// was requested instead of fetching.
    Deferred(AuthAttempt),
    /// Settings replaced. `dispatched` is the UI event sent, if a loading
    /// screen was still waiting.
    Updated { dispatched: Option<UiEvent> },
    /// The fetch failed. `reauth` is the authentication it triggered, if any.
    Failed {
        error: SessionError,
        reauth: Option<AuthAttempt>,
    },
}

/// Fetches and holds the user's server-side settings.
pub struct SettingsSynchronizer {
    api: CosmeticaApi,
    ui: Arc<dyn UiSink>,
    profiles: Arc<dyn ProfileLoader>,
    current: RwLock<Option<Arc<UserSettings>>>,
    load_target: Mutex<LoadTarget>,
    rse_prompt_pending: AtomicBool,
    regional_effects_prompt: bool,
    elevated_logging: bool,
}

impl SettingsSynchronizer {
    pub fn new(
        api: CosmeticaApi,
        ui: Arc<dyn UiSink>,
        profiles: Arc<dyn ProfileLoader>,
        regional_effects_prompt: bool,
        elevated_logging: bool,
    ) -> Self {
        Self {
            api,
            ui,
            profiles,
            current: RwLock::new(None),
            load_target: Mutex::new(LoadTarget::Default),
            rse_prompt_pending: AtomicBool::new(false),
            regional_effects_prompt,
            elevated_logging,
        }
    }

    /// Last successfully fetched settings.
    pub fn settings(&self) -> Option<Arc<UserSettings>> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn has_cached_settings(&self) -> bool {
        self.settings().is_some()
    }

    /// Screen to open once the next sync completes on a loading screen.
    pub fn set_load_target(&self, target: LoadTarget) {
        *self.load_target.lock().unwrap_or_else(PoisonError::into_inner) = target;
    }

    pub fn load_target(&self) -> LoadTarget {
        self.load_target
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The server has no per-region effects preference on record and the
    /// player should be asked at the next screen change.
    pub fn rse_prompt_pending(&self) -> bool {
        self.rse_prompt_pending.load(Ordering::Acquire)
    }

    /// Consume the regional-effects prompt flag.
    pub fn take_rse_prompt(&self) -> bool {
        self.rse_prompt_pending.swap(false, Ordering::AcqRel)
    }

    /// Fetch settings for the session behind `coordinator`.
    pub async fn sync(&self, coordinator: &Arc<AuthCoordinator>) -> SyncOutcome {
        self.sync_with(coordinator, true).await
    }

    /// Sync run at the end of an authentication attempt. A rejection does
    /// not start another attempt; the next periodic sync retries.
    pub(crate) async fn sync_after_login(&self, coordinator: &Arc<AuthCoordinator>) -> SyncOutcome {
        self.sync_with(coordinator, false).await
    }

    async fn sync_with(&self, coordinator: &Arc<AuthCoordinator>, may_reauth: bool) -> SyncOutcome {
        debug!("Synchronising settings");

        let credential = match coordinator.credential() {
            Some(credential) if coordinator.is_bound_to_current_user() => credential,
            _ => {
                debug!("Not authenticated, [re]authenticating");
                return SyncOutcome::Deferred(coordinator.authenticate(true));
            }
        };
        let identity = coordinator.platform_user().identity;

        match self.api.get_user_settings(&credential).await {
            Ok(settings) => SyncOutcome::Updated {
                dispatched: self.apply(settings, &identity).await,
            },
            Err(error) => self.on_failure(coordinator, error, may_reauth),
        }
    }

    async fn apply(&self, settings: UserSettings, identity: &Identity) -> Option<UiEvent> {
        debug!("Handling successful settings response");
        self.rse_prompt_pending.store(
            !settings.per_region_effects_set && self.regional_effects_prompt,
            Ordering::Release,
        );
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(settings));

        if !self.ui.is_loading_screen() {
            return None;
        }

        let target = self.load_target();
        debug!(?target, "Loading own profile for menu");
        if self.profiles.load(identity).await.is_none() {
            debug!("Own profile unavailable, continuing without it");
        }

        let event = match target {
            LoadTarget::Default => UiEvent::TransitionTo(Transition::MainMenu),
            LoadTarget::CustomizeOwn => UiEvent::TransitionTo(Transition::CustomizeOwn),
            LoadTarget::Tutorial => UiEvent::TransitionTo(Transition::Tutorial),
            LoadTarget::ViewOther(None) => {
                debug!("No player to view");
                UiEvent::ViewOtherUnavailable { target: None }
            }
            LoadTarget::ViewOther(Some(other)) => match self.profiles.load(&other).await {
                Some(_) => UiEvent::TransitionTo(Transition::ViewOther(other)),
                None => {
                    debug!(player = %other, "Failed to load profile of player to view");
                    UiEvent::ViewOtherUnavailable {
                        target: Some(other),
                    }
                }
            },
        };

        // Profile loads can be slow; the player may have left the screen.
        if !self.ui.is_loading_screen() {
            debug!("Loading screen closed before settings resolved");
            return None;
        }
        self.ui.dispatch(event.clone());
        Some(event)
    }

    fn on_failure(
        &self,
        coordinator: &Arc<AuthCoordinator>,
        error: SessionError,
        may_reauth: bool,
    ) -> SyncOutcome {
        error!(code = error.error_code(), "Error during settings get: {}", error);
        coordinator.show_unauthenticated_if_loading();

        let reauth = match &error {
            SessionError::MalformedResponse { body, .. } => {
                if self.elevated_logging {
                    if let Some(body) = body {
                        error!("The response causing this error was: {}", body);
                    }
                }
                None
            }
            // Offline: the next tick or menu open retries.
            e if e.is_transient() => None,
            _ if !may_reauth => {
                debug!("Settings rejected right after login, not re-authenticating");
                None
            }
            _ => Some(coordinator.authenticate(true)),
        };

        SyncOutcome::Failed { error, reauth }
    }
}
