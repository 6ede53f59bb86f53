//! Identity and credential types.
//!
//! Tokens are bearer secrets. Every type holding one implements `Debug` by
//! hand so a stray `{:?}` in a log line cannot leak it.

use std::fmt;

use uuid::Uuid;

/// A locally known user, supplied by the game platform.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identity {
    /// Stable user identifier.
    pub user_id: Uuid,
    /// Display name at login time.
    pub display_name: String,
}

impl Identity {
    /// Create an identity from an already parsed id.
    pub fn new(user_id: Uuid, display_name: impl Into<String>) -> Self {
        Self {
            user_id,
            display_name: display_name.into(),
        }
    }

    /// Parse an identity from the platform's id string.
    ///
    /// Platforms hand out ids both with and without dashes; both are accepted.
    pub fn parse(raw_id: &str, display_name: impl Into<String>) -> Result<Self, uuid::Error> {
        Ok(Self::new(Uuid::parse_str(raw_id.trim())?, display_name))
    }

    /// Key used for this identity in the token cache (dashed, lowercase).
    pub fn store_key(&self) -> String {
        self.user_id.hyphenated().to_string()
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.display_name, self.user_id)
    }
}

/// Session credential pair issued by the auth service.
///
/// `master_token` authorises privileged calls (settings mutation),
/// `limited_token` read-mostly calls. The limited token may be empty, but it
/// always travels with its master token.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub master_token: String,
    pub limited_token: String,
}

impl Credential {
    /// Create a new credential pair.
    pub fn new(master_token: impl Into<String>, limited_token: impl Into<String>) -> Self {
        Self {
            master_token: master_token.into(),
            limited_token: limited_token.into(),
        }
    }

    /// A credential made only of an operator-supplied master token.
    pub fn master_only(master_token: impl Into<String>) -> Self {
        Self::new(master_token, String::new())
    }

    /// Token to use for read-mostly calls: the limited token, or the master
    /// token when no limited token was issued.
    pub fn read_token(&self) -> &str {
        if self.limited_token.is_empty() {
            &self.master_token
        } else {
            &self.limited_token
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("master_token", &"<redacted>")
            .field(
                "limited_token",
                if self.limited_token.is_empty() {
                    &"<empty>"
                } else {
                    &"<redacted>"
                },
            )
            .finish()
    }
}

/// The logged-in platform user: identity plus the platform access token that
/// can be exchanged for a fresh [`Credential`].
#[derive(Clone)]
pub struct PlatformUser {
    pub identity: Identity,
    pub access_token: String,
}

impl PlatformUser {
    pub fn new(identity: Identity, access_token: impl Into<String>) -> Self {
        Self {
            identity,
            access_token: access_token.into(),
        }
    }
}

impl fmt::Debug for PlatformUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlatformUser")
            .field("identity", &self.identity)
            .field("access_token", &"<redacted>")
            .finish()
    }
}
