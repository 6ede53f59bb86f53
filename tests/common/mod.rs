//! Common test utilities for integration tests.
//!
//! A [`Harness`] wires a [`Session`] to the mock HTTP client, a recording UI
//! and a static profile loader, with the token cache in a temp dir.
//!
//! # Example
//!
//! ```ignore
//! let h = Harness::new(SessionConfig::default());
//! h.exchange_ok("M1", "L1");
//! h.session.authenticate(false).wait().await;
//! ```
#![allow(dead_code)]

use std::sync::Arc;

use cosmetica_auth::adapters::mock::{MockHttpClient, MockResponse, RecordingUi, StaticProfiles};
use cosmetica_auth::auth::api::{
    CAPE_SERVER_SETTINGS_PATH, EXCHANGE_PATH, SET_COSMETIC_PATH, UPDATE_SETTINGS_PATH,
    USER_INFO_PATH, USER_SETTINGS_PATH, WHOAMI_PATH,
};
use cosmetica_auth::auth::{Credential, Identity, PlatformUser, TokenStore};
use cosmetica_auth::{Session, SessionConfig};
use tempfile::TempDir;

pub const BASE: &str = "https://api.cosmetica.test";
pub const PLAYER_UUID: &str = "069a79f4-44e9-4726-a5be-fca90e38aaf5";
pub const OTHER_UUID: &str = "853c80ef-3c37-49fd-aa49-938b674adae6";

pub fn identity() -> Identity {
    Identity::parse(PLAYER_UUID, "U1").unwrap()
}

pub fn other_identity() -> Identity {
    Identity::parse(OTHER_UUID, "Jeb").unwrap()
}

pub fn platform_user() -> PlatformUser {
    PlatformUser::new(identity(), "platform-access-token")
}

pub fn url(path: &str) -> String {
    format!("{}{}", BASE, path)
}

pub struct Harness {
    pub dir: TempDir,
    pub mock: MockHttpClient,
    pub ui: Arc<RecordingUi>,
    pub profiles: Arc<StaticProfiles>,
    pub session: Session,
}

impl Harness {
    pub fn new(config: SessionConfig) -> Self {
        Self::with_setup(config, |_| {})
    }

    /// Build a harness, letting `seed` write the token cache first.
    pub fn with_setup(config: SessionConfig, seed: impl FnOnce(&TokenStore)) -> Self {
        let dir = TempDir::new().unwrap();
        seed(&TokenStore::in_cache_dir(dir.path()));

        let mock = MockHttpClient::new();
        let ui = Arc::new(RecordingUi::new());
        let profiles = Arc::new(StaticProfiles::new().with(&identity()));
        let config = config
            .with_api_base_url(BASE)
            .with_cache_dir(dir.path());
        let session = Session::start(
            config,
            platform_user(),
            Arc::new(mock.clone()),
            ui.clone(),
            profiles.clone(),
        );

        Self {
            dir,
            mock,
            ui,
            profiles,
            session,
        }
    }

    /// Harness whose token cache already holds `credential` for [`identity`].
    pub fn with_cached(config: SessionConfig, credential: Credential) -> Self {
        Self::with_setup(config, |store| {
            store.put(&identity(), &credential).unwrap();
        })
    }

    /// Token cache as it is on disk now.
    pub fn reopen_store(&self) -> TokenStore {
        TokenStore::in_cache_dir(self.dir.path())
    }

    pub fn tokens_file(&self) -> String {
        std::fs::read_to_string(self.dir.path().join("tokens")).unwrap_or_default()
    }

    pub fn exchange_ok(&self, master: &str, limited: &str) {
        self.mock.set_response(
            &url(EXCHANGE_PATH),
            MockResponse::json(serde_json::json!({
                "master_token": master,
                "limited_token": limited,
            })),
        );
    }

    pub fn exchange_new_player(&self, master: &str, limited: &str, has_special_cape: bool) {
        self.mock.set_response(
            &url(EXCHANGE_PATH),
            MockResponse::json(serde_json::json!({
                "master_token": master,
                "limited_token": limited,
                "login_info": {"is_new_player": true, "has_special_cape": has_special_cape},
            })),
        );
    }

    pub fn token_valid(&self) {
        self.mock.set_response(
            &url(WHOAMI_PATH),
            MockResponse::json(serde_json::json!({"uuid": PLAYER_UUID})),
        );
    }

    pub fn token_invalid(&self) {
        self.mock.set_response(
            &url(WHOAMI_PATH),
            MockResponse::json(serde_json::json!({"error": "invalid token"})),
        );
    }

    pub fn settings_ok(&self, settings: serde_json::Value) {
        self.mock
            .set_response(&url(USER_SETTINGS_PATH), MockResponse::json(settings));
    }

    pub fn lore(&self, lore: &str) {
        self.mock.set_response(
            &url(USER_INFO_PATH),
            MockResponse::json(serde_json::json!({"lore": lore})),
        );
    }

    /// Accept every settings mutation.
    pub fn mutations_ok(&self) {
        for path in [UPDATE_SETTINGS_PATH, SET_COSMETIC_PATH, CAPE_SERVER_SETTINGS_PATH] {
            self.mock
                .set_response(&url(path), MockResponse::json(serde_json::json!({})));
        }
    }

    /// Everything a straightforward login touches answers successfully.
    pub fn happy_path(&self) {
        self.exchange_ok("M1", "L1");
        self.token_valid();
        self.settings_ok(serde_json::json!({"hasperregioneffectsset": true}));
        self.lore("");
        self.mutations_ok();
    }

    pub fn count(&self, path: &str) -> usize {
        self.mock.count_requests(path)
    }
}
