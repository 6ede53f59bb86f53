//! The session object.
//!
//! One `Session` per logged-in platform user. It owns the token cache, the
//! authentication state machine, the settings synchroniser, the readiness
//! gate and the background loops; dropping it stops the loops.
//!
//! ```ignore
//! let mut session = Session::start(config, user, http, ui, profiles);
//! session.spawn_background();
//! session.mark_ready(API_ENDPOINT_RESOLVED);
//! session.mark_ready(CLIENT_LOAD_FINISHED); // starts authentication
//! ```

use std::sync::Arc;

use tracing::{debug, info};

use crate::adapters::ApiProfileLoader;
use crate::auth::{
    AuthAttempt, AuthCoordinator, CoordinatorOptions, CosmeticaApi, Credential, CredentialIssuer,
    GateState, Identity, PlatformUser, ReadinessGate, SessionState, TokenStore,
};
use crate::config::SessionConfig;
use crate::scheduler::BackgroundScheduler;
use crate::settings::{LoadTarget, SettingsSynchronizer, SyncOutcome, UserSettings};
use crate::traits::{HttpClient, ProfileLoader, UiSink};

/// A Cosmetica session for one platform user.
pub struct Session {
    config: SessionConfig,
    gate: ReadinessGate,
    coordinator: Arc<AuthCoordinator>,
    scheduler: BackgroundScheduler,
}

impl Session {
    /// Build a session. Reads the token cache once; starts nothing.
    pub fn start(
        config: SessionConfig,
        platform_user: PlatformUser,
        http: Arc<dyn HttpClient>,
        ui: Arc<dyn UiSink>,
        profiles: Arc<dyn ProfileLoader>,
    ) -> Self {
        info!(identity = %platform_user.identity, "Starting session");
        debug!(?config, "Session config");

        let api = CosmeticaApi::new(config.api_base_url.clone(), http);
        let store = Arc::new(TokenStore::load(config.tokens_path()));
        let issuer = CredentialIssuer::new(
            api.clone(),
            store,
            config.client_id.clone(),
            config.override_token.clone(),
        );
        let settings = Arc::new(SettingsSynchronizer::new(
            api.clone(),
            Arc::clone(&ui),
            Arc::clone(&profiles),
            config.regional_effects_prompt,
            config.elevated_logging,
        ));
        let coordinator = AuthCoordinator::new(
            platform_user,
            issuer,
            api,
            settings,
            ui,
            profiles,
            CoordinatorOptions {
                defaults: config.defaults.clone(),
                welcome_mode: config.welcome_mode,
                may_show_welcome_screen: config.may_show_welcome_screen,
            },
        );

        Self {
            config,
            gate: ReadinessGate::new(),
            coordinator,
            scheduler: BackgroundScheduler::default(),
        }
    }

    /// Build a session whose profiles come from the user info endpoint.
    pub fn with_api_profiles(
        config: SessionConfig,
        platform_user: PlatformUser,
        http: Arc<dyn HttpClient>,
        ui: Arc<dyn UiSink>,
    ) -> Self {
        let profiles = ApiProfileLoader::new(CosmeticaApi::new(
            config.api_base_url.clone(),
            Arc::clone(&http),
        ));
        Self::start(config, platform_user, http, ui, Arc::new(profiles))
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn coordinator(&self) -> &Arc<AuthCoordinator> {
        &self.coordinator
    }

    /// Signal one readiness precondition.
    ///
    /// Returns the authentication attempt when this call opened the gate.
    pub fn mark_ready(&self, bit: u8) -> Option<AuthAttempt> {
        match self.gate.mark(bit) {
            GateState::Opened => {
                info!("Session ready, authenticating");
                Some(self.coordinator.authenticate(false))
            }
            GateState::Pending => {
                debug!(bit, "Readiness bit set, waiting for the other");
                None
            }
            GateState::AlreadyOpen => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.gate.is_open()
    }

    /// See [`AuthCoordinator::authenticate`].
    pub fn authenticate(&self, force: bool) -> AuthAttempt {
        self.coordinator.authenticate(force)
    }

    /// Synchronise settings now.
    pub async fn sync(&self) -> SyncOutcome {
        self.coordinator.settings().sync(&self.coordinator).await
    }

    pub fn state(&self) -> SessionState {
        self.coordinator.state()
    }

    pub fn is_authenticated(&self) -> bool {
        self.coordinator.is_authenticated()
    }

    pub fn identity(&self) -> Identity {
        self.coordinator.platform_user().identity
    }

    /// Credential in use, if authenticated.
    pub fn credential(&self) -> Option<Credential> {
        self.coordinator.credential()
    }

    /// Switch to another platform user; the next sync re-authenticates.
    pub fn set_platform_user(&self, user: PlatformUser) {
        self.coordinator.set_platform_user(user);
    }

    pub fn set_load_target(&self, target: LoadTarget) {
        self.coordinator.settings().set_load_target(target);
    }

    /// Last successfully synchronised settings.
    pub fn settings(&self) -> Option<Arc<UserSettings>> {
        self.coordinator.settings().settings()
    }

    pub fn has_cached_settings(&self) -> bool {
        self.coordinator.settings().has_cached_settings()
    }

    /// Consume the pending regional-effects prompt, if any.
    pub fn take_rse_prompt(&self) -> bool {
        self.coordinator.settings().take_rse_prompt()
    }

    pub fn set_may_show_welcome_screen(&self, allowed: bool) {
        self.coordinator.set_may_show_welcome_screen(allowed);
    }

    /// The UI showed the queued chat welcome.
    pub fn welcome_displayed(&self) {
        self.coordinator.welcome_displayed();
    }

    /// Start the resync and revalidation loops. No-op if already running.
    pub fn spawn_background(&mut self) {
        if self.scheduler.is_running() {
            return;
        }
        self.scheduler = BackgroundScheduler::spawn(
            Arc::clone(&self.coordinator),
            self.config.resync_interval,
            self.config.revalidate_interval,
        );
    }

    pub fn is_background_running(&self) -> bool {
        self.scheduler.is_running()
    }

    /// Stop the background loops. An in-flight authentication is left to
    /// finish on its own.
    pub fn shutdown(&mut self) {
        info!("Shutting down session");
        self.scheduler.shutdown();
    }
}
