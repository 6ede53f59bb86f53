//! Authentication state machine.
//!
//! ```text
//! Unauthenticated ──authenticate()──▶ Authenticating ──ok──▶ Authenticated
//!        ▲                                  │                     │
//!        └──────────────failure─────────────┘◀──authenticate(true)┘
//! ```
//!
//! The state lives in an atomic and every entry into `Authenticating` is a
//! compare-and-swap, so at most one attempt runs at a time. Attempts run on
//! their own tokio task; [`AuthCoordinator::authenticate`] never blocks.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::api::{CosmeticaApi, LoginInfo};
use super::credentials::{Credential, Identity, PlatformUser};
use super::defaults::DefaultSettingsConfig;
use super::issuer::{CredentialIssuer, CredentialSource, Issued};
use super::welcome::{self, WelcomeContext, WelcomeMode};
use crate::error::SessionError;
use crate::settings::{SettingsSynchronizer, SyncOutcome};
use crate::traits::{ProfileLoader, UiEvent, UiSink, WelcomeKind};

/// Authentication state of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SessionState {
    Unauthenticated = 0,
    Authenticating = 1,
    Authenticated = 2,
}

impl SessionState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            1 => SessionState::Authenticating,
            2 => SessionState::Authenticated,
            _ => SessionState::Unauthenticated,
        }
    }
}

/// What a call to [`AuthCoordinator::authenticate`] set in motion.
#[derive(Debug)]
pub enum AuthAttempt {
    /// A new attempt was started; the handle resolves once it and the
    /// following settings sync are done.
    Started(JoinHandle<()>),
    /// Another attempt is already running. Nothing was started.
    InFlight,
    /// Already authenticated; only a settings sync was started.
    Syncing(JoinHandle<SyncOutcome>),
}

impl AuthAttempt {
    pub fn is_in_flight(&self) -> bool {
        matches!(self, AuthAttempt::InFlight)
    }

    /// Wait for whatever was started to finish.
    pub async fn wait(self) {
        match self {
            AuthAttempt::Started(handle) => {
                if let Err(e) = handle.await {
                    debug!("Authentication task ended abnormally: {}", e);
                }
            }
            AuthAttempt::Syncing(handle) => {
                if let Err(e) = handle.await {
                    debug!("Settings sync task ended abnormally: {}", e);
                }
            }
            AuthAttempt::InFlight => {}
        }
    }
}

/// Options the coordinator reads after a successful authentication.
#[derive(Debug, Clone, Default)]
pub struct CoordinatorOptions {
    pub defaults: DefaultSettingsConfig,
    pub welcome_mode: WelcomeMode,
    pub may_show_welcome_screen: bool,
}

/// Owns the session credential and drives (re)authentication.
pub struct AuthCoordinator {
    state: AtomicU8,
    credential: RwLock<Option<Credential>>,
    /// Identity the current credential was issued for.
    bound_identity: RwLock<Option<Identity>>,
    platform_user: RwLock<PlatformUser>,
    issuer: CredentialIssuer,
    api: CosmeticaApi,
    settings: Arc<SettingsSynchronizer>,
    ui: Arc<dyn UiSink>,
    profiles: Arc<dyn ProfileLoader>,
    defaults: DefaultSettingsConfig,
    welcome_mode: WelcomeMode,
    may_show_welcome_screen: AtomicBool,
    chat_welcome_pending: AtomicBool,
}

fn read<T: Clone>(lock: &RwLock<T>) -> T {
    lock.read().unwrap_or_else(PoisonError::into_inner).clone()
}

fn write<T>(lock: &RwLock<T>, value: T) {
    *lock.write().unwrap_or_else(PoisonError::into_inner) = value;
}

impl AuthCoordinator {
    pub fn new(
        platform_user: PlatformUser,
        issuer: CredentialIssuer,
        api: CosmeticaApi,
        settings: Arc<SettingsSynchronizer>,
        ui: Arc<dyn UiSink>,
        profiles: Arc<dyn ProfileLoader>,
        options: CoordinatorOptions,
    ) -> Arc<Self> {
        Arc::new(Self {
            state: AtomicU8::new(SessionState::Unauthenticated as u8),
            credential: RwLock::new(None),
            bound_identity: RwLock::new(None),
            platform_user: RwLock::new(platform_user),
            issuer,
            api,
            settings,
            ui,
            profiles,
            defaults: options.defaults,
            welcome_mode: options.welcome_mode,
            may_show_welcome_screen: AtomicBool::new(options.may_show_welcome_screen),
            chat_welcome_pending: AtomicBool::new(false),
        })
    }

    pub fn state(&self) -> SessionState {
        SessionState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn is_authenticated(&self) -> bool {
        self.state() == SessionState::Authenticated
    }

    /// The credential in use, if authenticated.
    pub fn credential(&self) -> Option<Credential> {
        if self.is_authenticated() {
            read(&self.credential)
        } else {
            None
        }
    }

    /// Identity the session last authenticated as.
    pub fn bound_identity(&self) -> Option<Identity> {
        read(&self.bound_identity)
    }

    /// The platform user currently logged in on the host.
    pub fn platform_user(&self) -> PlatformUser {
        read(&self.platform_user)
    }

    /// Replace the platform user, e.g. after an account switch on the host.
    ///
    /// The next sync notices the identity change and re-authenticates.
    pub fn set_platform_user(&self, user: PlatformUser) {
        info!(identity = %user.identity, "Platform user changed");
        write(&self.platform_user, user);
    }

    /// Authenticated, and as the identity currently logged in.
    pub fn is_bound_to_current_user(&self) -> bool {
        self.is_authenticated()
            && self.bound_identity().as_ref() == Some(&self.platform_user().identity)
    }

    pub fn issuer(&self) -> &CredentialIssuer {
        &self.issuer
    }

    pub fn settings(&self) -> &Arc<SettingsSynchronizer> {
        &self.settings
    }

    pub fn set_may_show_welcome_screen(&self, allowed: bool) {
        self.may_show_welcome_screen.store(allowed, Ordering::Release);
    }

    /// The UI has shown the queued chat welcome.
    pub fn welcome_displayed(&self) {
        self.chat_welcome_pending.store(false, Ordering::Release);
    }

    pub fn has_pending_chat_welcome(&self) -> bool {
        self.chat_welcome_pending.load(Ordering::Acquire)
    }

    /// Start (or join) authentication.
    ///
    /// - `Authenticating`: nothing new starts.
    /// - `Authenticated` and not `force`: only a settings sync starts.
    /// - otherwise: a new attempt starts on its own task.
    pub fn authenticate(self: &Arc<Self>, force: bool) -> AuthAttempt {
        loop {
            let current = self.state();
            match current {
                SessionState::Authenticating => {
                    debug!("Authentication already in progress");
                    return AuthAttempt::InFlight;
                }
                SessionState::Authenticated if !force => {
                    debug!("Already authenticated, syncing settings");
                    let this = Arc::clone(self);
                    return AuthAttempt::Syncing(tokio::spawn(async move {
                        this.settings.sync(&this).await
                    }));
                }
                _ => {
                    if self
                        .state
                        .compare_exchange(
                            current as u8,
                            SessionState::Authenticating as u8,
                            Ordering::AcqRel,
                            Ordering::Acquire,
                        )
                        .is_ok()
                    {
                        debug!(force, "Starting authentication");
                        let this = Arc::clone(self);
                        return AuthAttempt::Started(tokio::spawn(async move {
                            this.run_attempt().await;
                        }));
                    }
                }
            }
        }
    }

    /// Check the current master token with the server and re-authenticate
    /// if it has been revoked.
    ///
    /// Does nothing unless authenticated. A failed check is logged and
    /// otherwise ignored.
    pub async fn revalidate(self: &Arc<Self>) -> Option<AuthAttempt> {
        let credential = self.credential()?;
        match self
            .issuer
            .validator()
            .is_invalid(&credential.master_token)
            .await
        {
            Ok(true) => {
                let e = SessionError::TokenInvalid;
                info!(code = e.error_code(), "Token no longer valid, re-authenticating");
                Some(self.authenticate(true))
            }
            Ok(false) => None,
            Err(e) => {
                debug!(code = e.error_code(), "Could not check token validity: {}", e);
                None
            }
        }
    }

    /// Tell the UI we are unauthenticated, if it is waiting on us.
    pub fn show_unauthenticated_if_loading(&self) {
        if self.ui.is_loading_screen() {
            self.ui.dispatch(UiEvent::ShowUnauthenticated);
        }
    }

    async fn run_attempt(self: Arc<Self>) {
        let user = self.platform_user();
        match self.issuer.acquire(&user).await {
            Ok(issued) => {
                self.on_authenticated(&user, issued).await;
                self.settings.sync_after_login(&self).await;
            }
            Err(e) => self.on_failure(e),
        }
    }

    async fn on_authenticated(&self, user: &PlatformUser, issued: Issued) {
        write(&self.credential, Some(issued.credential.clone()));
        write(&self.bound_identity, Some(user.identity.clone()));
        self.state
            .store(SessionState::Authenticated as u8, Ordering::Release);
        info!(identity = %user.identity, source = %issued.source, "Authenticated");

        if let Some(info) = issued.login_info.filter(|i| i.is_new_player) {
            self.apply_first_login_defaults(&issued.credential, info).await;
        }

        match issued.source {
            CredentialSource::Reissued => {
                let is_new = issued.login_info.is_some_and(|i| i.is_new_player);
                self.prepare_welcome(&user.identity, &issued.credential, is_new, false)
                    .await;
            }
            CredentialSource::Override => {
                self.prepare_welcome(&user.identity, &issued.credential, false, true)
                    .await;
            }
            CredentialSource::Cached => {}
        }

        self.profiles.prefetch(&user.identity);
    }

    fn on_failure(&self, e: SessionError) {
        write(&self.credential, None);
        self.state
            .store(SessionState::Unauthenticated as u8, Ordering::Release);

        if e.is_user_visible() {
            error!(
                code = e.error_code(),
                category = %e.category(),
                "Couldn't connect to auth server: {}",
                e
            );
        } else {
            warn!(code = e.error_code(), category = %e.category(), "Authentication failed: {}", e);
        }
        self.show_unauthenticated_if_loading();
    }

    /// Push the configured default settings for a brand-new account.
    ///
    /// The settings fields go out as one batched update. The cape and the
    /// per-server cape display are separate calls; each failure is logged on
    /// its own and does not stop the others.
    async fn apply_first_login_defaults(&self, credential: &Credential, info: LoginInfo) {
        if !self.defaults.was_loaded {
            debug!("New player, but no default settings file was present");
            return;
        }

        let updates = self.defaults.to_update_map();
        if !updates.is_empty() {
            debug!(fields = updates.len(), "Applying default settings");
            if let Err(e) = self.api.update_user_settings(credential, &updates).await {
                warn!(code = e.error_code(), "Failed to apply default settings: {}", e);
            }
        }

        if !info.has_special_cape {
            if let Some(cape) = self.defaults.default_cape() {
                if let Err(e) = self.api.set_cape(credential, cape).await {
                    warn!(code = e.error_code(), "Failed to apply default cape: {}", e);
                }
            }
        }

        if !self.defaults.cape_server_settings.is_empty() {
            if let Err(e) = self
                .api
                .set_cape_server_settings(credential, &self.defaults.cape_server_settings)
                .await
            {
                warn!(code = e.error_code(), "Failed to apply cape server settings: {}", e);
            }
        }
    }

    async fn prepare_welcome(
        &self,
        identity: &Identity,
        credential: &Credential,
        is_new: bool,
        suppress_errors: bool,
    ) {
        let may_show = self.may_show_welcome_screen.load(Ordering::Acquire);
        debug!(is_new, may_show, "Preparing potential welcome");

        let user_info = match self.api.get_user_info(identity, Some(credential)).await {
            Ok(info) => info,
            Err(e) if suppress_errors => {
                debug!("Suppressed error while preparing welcome: {}", e);
                return;
            }
            Err(e) => {
                error!(code = e.error_code(), "Failed to request user info for welcome: {}", e);
                return;
            }
        };

        let ctx = WelcomeContext {
            mode: self.welcome_mode,
            is_new,
            may_show_welcome_screen: may_show,
            chat_pending: self.has_pending_chat_welcome(),
            lore: &user_info.lore,
        };
        let Some(kind) = welcome::decide(&ctx) else {
            return;
        };
        if kind == WelcomeKind::ChatMessage && self.chat_welcome_pending.swap(true, Ordering::AcqRel)
        {
            return;
        }

        debug!(?kind, "Welcoming player");
        self.ui.dispatch(UiEvent::ShowWelcome {
            identity: identity.clone(),
            is_new,
            kind,
        });
    }
}
