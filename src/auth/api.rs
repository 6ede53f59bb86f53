//! Client for the Cosmetica web API.
//!
//! Covers the handful of endpoints the session needs: token exchange, token
//! validation, user settings, first-login defaults and user info. Requests go
//! through [`HttpClient`] so every answer can be scripted in tests.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::credentials::{Credential, Identity, PlatformUser};
use super::defaults::CapeDisplay;
use crate::error::{SessionError, SessionResult};
use crate::settings::UserSettings;
use crate::traits::{Headers, HttpClient, Response};

/// Default URL for the Cosmetica API.
pub const API_URL: &str = "https://api.cosmetica.cc";

pub const EXCHANGE_PATH: &str = "/v2/client/verifyforauthtokens";
pub const WHOAMI_PATH: &str = "/v2/get/uuid";
pub const USER_SETTINGS_PATH: &str = "/v2/client/usersettings";
pub const UPDATE_SETTINGS_PATH: &str = "/v2/client/updatesettings";
pub const SET_COSMETIC_PATH: &str = "/v2/client/setcosmetic";
pub const CAPE_SERVER_SETTINGS_PATH: &str = "/v2/client/capeserversettings";
pub const USER_INFO_PATH: &str = "/v2/get/info";

/// First-login metadata returned alongside freshly issued tokens.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginInfo {
    /// The account was created by this exchange.
    #[serde(default)]
    pub is_new_player: bool,
    /// The account already has a special (e.g. event) cape.
    #[serde(default)]
    pub has_special_cape: bool,
}

/// Result of a successful platform-token exchange.
#[derive(Debug, Clone)]
pub struct IssuedTokens {
    pub credential: Credential,
    /// Only present when the server chose to report it.
    pub login_info: Option<LoginInfo>,
}

#[derive(Deserialize)]
struct ExchangeResponse {
    master_token: String,
    #[serde(default)]
    limited_token: String,
    #[serde(default)]
    login_info: Option<LoginInfo>,
}

/// Answer of the "whoami" endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WhoAmI {
    /// The server recognised the token.
    Known { uuid: Option<String> },
    /// The server answered with a structured `{error: ...}` body.
    Error(String),
    /// The body could not be interpreted at all.
    Unreadable,
}

/// Public profile information for a player.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct UserInfo {
    #[serde(default)]
    pub lore: String,
    #[serde(default)]
    pub skin: Option<String>,
    #[serde(default)]
    pub platform: Option<String>,
}

/// Thin typed client over an injected [`HttpClient`].
#[derive(Clone)]
pub struct CosmeticaApi {
    base_url: String,
    http: Arc<dyn HttpClient>,
}

impl CosmeticaApi {
    /// Create a client for `base_url` (no trailing slash needed).
    pub fn new(base_url: impl Into<String>, http: Arc<dyn HttpClient>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url, http }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn json_headers(token: Option<&str>) -> Headers {
        let mut headers = Headers::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        if let Some(token) = token {
            headers.insert("Authorization".to_string(), format!("Bearer {}", token));
        }
        headers
    }

    /// Exchange the platform access token for a fresh credential pair.
    ///
    /// POST /v2/client/verifyforauthtokens
    pub async fn exchange_platform_token(
        &self,
        user: &PlatformUser,
        client_id: &str,
    ) -> SessionResult<IssuedTokens> {
        let body = serde_json::json!({
            "access_token": user.access_token,
            "username": user.identity.display_name,
            "uuid": user.identity.store_key(),
            "client": client_id,
        });
        debug!(path = EXCHANGE_PATH, "Exchanging platform token");

        let response = self
            .http
            .post(&self.url(EXCHANGE_PATH), &body.to_string(), &Self::json_headers(None))
            .await
            .map_err(|e| SessionError::AuthServerUnreachable {
                message: e.to_string(),
            })?;

        let error_message = error_field(&response);
        if matches!(response.status, 401 | 403) || (response.is_success() && error_message.is_some())
        {
            return Err(SessionError::AuthRejected {
                status: response.status,
                message: error_message.unwrap_or_else(|| response.text_lossy()),
            });
        }
        if response.status >= 500 {
            return Err(SessionError::AuthServerUnreachable {
                message: format!(
                    "status {}: {}",
                    response.status,
                    error_message.unwrap_or_else(|| response.text_lossy())
                ),
            });
        }
        if !response.is_success() {
            return Err(SessionError::ServerError {
                status: response.status,
                message: error_message.unwrap_or_else(|| response.text_lossy()),
            });
        }

        let parsed: ExchangeResponse = decode_secret("token exchange", &response)?;
        Ok(IssuedTokens {
            credential: Credential::new(parsed.master_token, parsed.limited_token),
            login_info: parsed.login_info,
        })
    }

    /// Ask the server who `master_token` belongs to.
    ///
    /// GET /v2/get/uuid
    ///
    /// Every answer the server gives, whatever the status, is reported as a
    /// [`WhoAmI`]; only a transport failure is an error.
    pub async fn whoami(&self, master_token: &str) -> SessionResult<WhoAmI> {
        let response = self
            .http
            .get(&self.url(WHOAMI_PATH), &Self::json_headers(Some(master_token)))
            .await
            .map_err(|e| SessionError::transient("token validation", e.to_string()))?;

        let value: serde_json::Value = match response.json() {
            Ok(value) => value,
            Err(e) => {
                debug!(status = response.status, "Unreadable whoami response: {}", e);
                return Ok(WhoAmI::Unreadable);
            }
        };

        if let Some(error) = value.get("error") {
            return Ok(WhoAmI::Error(
                error.as_str().map(str::to_string).unwrap_or_else(|| error.to_string()),
            ));
        }

        Ok(WhoAmI::Known {
            uuid: value.get("uuid").and_then(|u| u.as_str()).map(str::to_string),
        })
    }

    /// Fetch the server-side settings bundle.
    ///
    /// GET /v2/client/usersettings
    pub async fn get_user_settings(&self, credential: &Credential) -> SessionResult<UserSettings> {
        let response = self
            .http
            .get(
                &self.url(USER_SETTINGS_PATH),
                &Self::json_headers(Some(credential.read_token())),
            )
            .await
            .map_err(|e| SessionError::transient("settings fetch", e.to_string()))?;

        let response = check_response("settings fetch", response)?;
        decode("settings fetch", &response)
    }

    /// Update any number of settings in one call.
    ///
    /// POST /v2/client/updatesettings
    pub async fn update_user_settings(
        &self,
        credential: &Credential,
        settings: &serde_json::Map<String, serde_json::Value>,
    ) -> SessionResult<()> {
        self.post_checked(
            "settings update",
            UPDATE_SETTINGS_PATH,
            &credential.master_token,
            &serde_json::Value::Object(settings.clone()),
        )
        .await
    }

    /// Assign a cape.
    ///
    /// POST /v2/client/setcosmetic
    pub async fn set_cape(&self, credential: &Credential, cape_id: &str) -> SessionResult<()> {
        let body = serde_json::json!({
            "type": "cape",
            "id": cape_id,
            "require_official": true,
        });
        self.post_checked("set cape", SET_COSMETIC_PATH, &credential.master_token, &body)
            .await
    }

    /// Set per-server cape display preferences.
    ///
    /// POST /v2/client/capeserversettings
    pub async fn set_cape_server_settings(
        &self,
        credential: &Credential,
        settings: &BTreeMap<String, CapeDisplay>,
    ) -> SessionResult<()> {
        let body = serde_json::to_value(settings)?;
        self.post_checked(
            "cape server settings",
            CAPE_SERVER_SETTINGS_PATH,
            &credential.master_token,
            &body,
        )
        .await
    }

    /// Public info for a player.
    ///
    /// GET /v2/get/info?uuid=&username=
    pub async fn get_user_info(
        &self,
        identity: &Identity,
        credential: Option<&Credential>,
    ) -> SessionResult<UserInfo> {
        let url = format!(
            "{}?uuid={}&username={}",
            self.url(USER_INFO_PATH),
            identity.store_key(),
            urlencoding::encode(&identity.display_name)
        );
        let response = self
            .http
            .get(&url, &Self::json_headers(credential.map(|c| c.read_token())))
            .await
            .map_err(|e| SessionError::transient("user info", e.to_string()))?;

        let response = check_response("user info", response)?;
        decode("user info", &response)
    }

    async fn post_checked(
        &self,
        operation: &str,
        path: &str,
        token: &str,
        body: &serde_json::Value,
    ) -> SessionResult<()> {
        debug!(path, "POST {}", operation);
        let response = self
            .http
            .post(&self.url(path), &body.to_string(), &Self::json_headers(Some(token)))
            .await
            .map_err(|e| SessionError::transient(operation, e.to_string()))?;
        check_response(operation, response).map(|_| ())
    }
}

/// Extract the `error` string of a `{error: ...}` body, if any.
fn error_field(response: &Response) -> Option<String> {
    let value: serde_json::Value = response.json().ok()?;
    value.get("error").and_then(|e| e.as_str()).map(str::to_string)
}

/// Turn non-2xx statuses and `{error}` bodies into [`SessionError::ServerError`].
fn check_response(operation: &str, response: Response) -> SessionResult<Response> {
    if let Some(message) = error_field(&response) {
        debug!(operation, status = response.status, "Server reported error");
        return Err(SessionError::ServerError {
            status: response.status,
            message,
        });
    }
    if !response.is_success() {
        return Err(SessionError::ServerError {
            status: response.status,
            message: response.text_lossy(),
        });
    }
    Ok(response)
}

fn decode<T: serde::de::DeserializeOwned>(operation: &str, response: &Response) -> SessionResult<T> {
    response.json().map_err(|e| {
        let body = response.text_lossy();
        trace!(operation, "Undecodable body: {}", body);
        SessionError::malformed(operation, e.to_string(), Some(body))
    })
}

/// Like [`decode`], for bodies carrying bearer tokens: neither the body nor
/// serde's message (which can quote body values) is kept.
fn decode_secret<T: serde::de::DeserializeOwned>(
    operation: &str,
    response: &Response,
) -> SessionResult<T> {
    response.json().map_err(|e| {
        SessionError::malformed(
            operation,
            format!("{:?} error at line {} column {}", e.classify(), e.line(), e.column()),
            None,
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::{MockHttpClient, MockResponse};
    use crate::traits::HttpError;

    const BASE: &str = "https://api.test";

    fn api(mock: &MockHttpClient) -> CosmeticaApi {
        CosmeticaApi::new(format!("{}/", BASE), Arc::new(mock.clone()))
    }

    fn user() -> PlatformUser {
        PlatformUser::new(
            Identity::parse("069a79f444e94726a5befca90e38aaf5", "Notch").unwrap(),
            "platform-token",
        )
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let mock = MockHttpClient::new();
        assert_eq!(api(&mock).base_url(), BASE);
    }

    #[tokio::test]
    async fn test_exchange_success() {
        let mock = MockHttpClient::new();
        mock.set_response(
            &format!("{}{}", BASE, EXCHANGE_PATH),
            MockResponse::json(serde_json::json!({
                "master_token": "M1",
                "limited_token": "L1",
                "login_info": {"is_new_player": true, "has_special_cape": false}
            })),
        );

        let issued = api(&mock).exchange_platform_token(&user(), "cosmetica").await.unwrap();
        assert_eq!(issued.credential, Credential::new("M1", "L1"));
        assert_eq!(
            issued.login_info,
            Some(LoginInfo {
                is_new_player: true,
                has_special_cape: false
            })
        );

        let requests = mock.get_requests();
        assert_eq!(requests.len(), 1);
        let body: serde_json::Value =
            serde_json::from_str(requests[0].body.as_deref().unwrap()).unwrap();
        assert_eq!(body["uuid"], "069a79f4-44e9-4726-a5be-fca90e38aaf5");
        assert_eq!(body["client"], "cosmetica");
        assert_eq!(body["access_token"], "platform-token");
    }

    #[tokio::test]
    async fn test_exchange_rejected() {
        let mock = MockHttpClient::new();
        mock.set_response(
            &format!("{}{}", BASE, EXCHANGE_PATH),
            MockResponse::Success(Response::new(401, r#"{"error":"invalid access token"}"#)),
        );

        let err = api(&mock)
            .exchange_platform_token(&user(), "cosmetica")
            .await
            .unwrap_err();
        match err {
            SessionError::AuthRejected { status, message } => {
                assert_eq!(status, 401);
                assert_eq!(message, "invalid access token");
            }
            other => panic!("expected AuthRejected, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_exchange_unreachable() {
        let mock = MockHttpClient::new();
        mock.set_default_response(MockResponse::Error(HttpError::ConnectionFailed(
            "refused".to_string(),
        )));

        let err = api(&mock)
            .exchange_platform_token(&user(), "cosmetica")
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::AuthServerUnreachable { .. }));
    }

    #[tokio::test]
    async fn test_exchange_malformed() {
        let mock = MockHttpClient::new();
        mock.set_default_response(MockResponse::Success(Response::new(200, "<html>")));

        let err = api(&mock)
            .exchange_platform_token(&user(), "cosmetica")
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::MalformedResponse { body: None, .. }));
    }

    #[tokio::test]
    async fn test_exchange_malformed_keeps_tokens_out_of_error() {
        let mock = MockHttpClient::new();
        mock.set_default_response(MockResponse::json(serde_json::json!({
            "master_token": "SECRET-MASTER",
            "limited_token": "SECRET-LIMITED",
            "login_info": "not-an-object",
        })));

        let err = api(&mock)
            .exchange_platform_token(&user(), "cosmetica")
            .await
            .unwrap_err();

        assert!(matches!(err, SessionError::MalformedResponse { .. }));
        for rendered in [format!("{:?}", err), err.to_string()] {
            assert!(!rendered.contains("SECRET-MASTER"), "{}", rendered);
            assert!(!rendered.contains("SECRET-LIMITED"), "{}", rendered);
        }
    }

    #[tokio::test]
    async fn test_exchange_server_failure_is_unreachable() {
        let mock = MockHttpClient::new();
        mock.set_default_response(MockResponse::status(503, "maintenance"));

        let err = api(&mock)
            .exchange_platform_token(&user(), "cosmetica")
            .await
            .unwrap_err();

        assert!(matches!(err, SessionError::AuthServerUnreachable { .. }));
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn test_exchange_other_client_error_is_server_error() {
        let mock = MockHttpClient::new();
        mock.set_default_response(MockResponse::status(404, "not found"));

        let err = api(&mock)
            .exchange_platform_token(&user(), "cosmetica")
            .await
            .unwrap_err();

        assert!(matches!(err, SessionError::ServerError { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_whoami_variants() {
        let mock = MockHttpClient::new();
        let url = format!("{}{}", BASE, WHOAMI_PATH);

        mock.set_response(&url, MockResponse::json(serde_json::json!({"uuid": "abc"})));
        assert_eq!(
            api(&mock).whoami("M").await.unwrap(),
            WhoAmI::Known {
                uuid: Some("abc".to_string())
            }
        );

        mock.set_response(
            &url,
            MockResponse::json(serde_json::json!({"error": "invalid token"})),
        );
        assert_eq!(
            api(&mock).whoami("M").await.unwrap(),
            WhoAmI::Error("invalid token".to_string())
        );

        mock.set_response(&url, MockResponse::Success(Response::new(502, "Bad Gateway")));
        assert_eq!(api(&mock).whoami("M").await.unwrap(), WhoAmI::Unreadable);
    }

    #[tokio::test]
    async fn test_whoami_sends_bearer_token() {
        let mock = MockHttpClient::new();
        mock.set_default_response(MockResponse::json(serde_json::json!({"uuid": "abc"})));

        api(&mock).whoami("secret-master").await.unwrap();

        let requests = mock.get_requests();
        assert_eq!(
            requests[0].headers.get("Authorization"),
            Some(&"Bearer secret-master".to_string())
        );
        assert!(!requests[0].url.contains("secret-master"));
    }

    #[tokio::test]
    async fn test_get_user_settings_error_body_is_server_error() {
        let mock = MockHttpClient::new();
        mock.set_default_response(MockResponse::json(
            serde_json::json!({"error": "invalid token"}),
        ));

        let err = api(&mock)
            .get_user_settings(&Credential::new("M", "L"))
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::ServerError { status: 200, .. }));
    }

    #[tokio::test]
    async fn test_get_user_settings_uses_limited_token() {
        let mock = MockHttpClient::new();
        mock.set_default_response(MockResponse::json(serde_json::json!({"dohats": true})));

        api(&mock)
            .get_user_settings(&Credential::new("M", "L"))
            .await
            .unwrap();

        assert_eq!(
            mock.get_requests()[0].headers.get("Authorization"),
            Some(&"Bearer L".to_string())
        );
    }

    #[tokio::test]
    async fn test_update_user_settings_body_and_master_token() {
        let mock = MockHttpClient::new();
        mock.set_default_response(MockResponse::json(serde_json::json!({"success": true})));

        let mut settings = serde_json::Map::new();
        settings.insert("dohats".to_string(), serde_json::Value::Bool(true));
        api(&mock)
            .update_user_settings(&Credential::new("M", "L"), &settings)
            .await
            .unwrap();

        let requests = mock.get_requests();
        assert_eq!(requests[0].method, "POST");
        assert!(requests[0].url.ends_with(UPDATE_SETTINGS_PATH));
        assert_eq!(
            requests[0].headers.get("Authorization"),
            Some(&"Bearer M".to_string())
        );
        assert_eq!(requests[0].body.as_deref(), Some(r#"{"dohats":true}"#));
    }

    #[tokio::test]
    async fn test_get_user_info_encodes_name() {
        let mock = MockHttpClient::new();
        mock.set_default_response(MockResponse::json(
            serde_json::json!({"lore": "§aNew to Cosmetica", "skin": "abc"}),
        ));

        let identity = Identity::parse("069a79f444e94726a5befca90e38aaf5", "A B").unwrap();
        let info = api(&mock).get_user_info(&identity, None).await.unwrap();

        assert_eq!(info.lore, "§aNew to Cosmetica");
        assert_eq!(info.skin, Some("abc".to_string()));
        assert!(mock.get_requests()[0].url.ends_with("username=A%20B"));
    }
}
