//! Welcome decision for players new to the service.
//!
//! The server marks an account it has never seen with a fixed lore line.
//! Whether that turns into a chat message, a tutorial screen or nothing is a
//! local preference.

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::traits::WelcomeKind;

/// Lore the server assigns to accounts that are new to the service.
pub const NEW_PLAYER_LORE: &str = "New to Cosmetica";

/// Formatting codes (`§` followed by a colour or style character).
static COLOUR_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)§[0-9a-fk-or]").expect("valid regex"));

/// Remove `§x` formatting codes from a lore line.
pub fn strip_colour(text: &str) -> String {
    COLOUR_CODE.replace_all(text, "").into_owned()
}

/// Local welcome preference.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WelcomeMode {
    /// Never welcome.
    Off,
    /// Always a chat message.
    Chat,
    /// Tutorial screen when allowed, chat message otherwise.
    #[default]
    Full,
}

impl WelcomeMode {
    fn shows_tutorial(self, screen_allowed: bool) -> bool {
        self == WelcomeMode::Full && screen_allowed
    }

    fn shows_chat(self, screen_allowed: bool) -> bool {
        match self {
            WelcomeMode::Off => false,
            WelcomeMode::Chat => true,
            WelcomeMode::Full => !screen_allowed,
        }
    }
}

impl FromStr for WelcomeMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "off" | "none" | "false" => Ok(WelcomeMode::Off),
            "chat" => Ok(WelcomeMode::Chat),
            "full" => Ok(WelcomeMode::Full),
            other => Err(format!("unknown welcome mode: {}", other)),
        }
    }
}

impl fmt::Display for WelcomeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WelcomeMode::Off => "off",
            WelcomeMode::Chat => "chat",
            WelcomeMode::Full => "full",
        };
        write!(f, "{}", s)
    }
}

/// Inputs to the welcome decision.
#[derive(Debug, Clone, Copy)]
pub struct WelcomeContext<'a> {
    pub mode: WelcomeMode,
    /// The server created the account during this login.
    pub is_new: bool,
    /// The host currently allows a full-screen welcome.
    pub may_show_welcome_screen: bool,
    /// A chat welcome is already queued for this session.
    pub chat_pending: bool,
    /// Lore as returned by the server, colour codes included.
    pub lore: &'a str,
}

/// Decide which welcome, if any, to show.
pub fn decide(ctx: &WelcomeContext<'_>) -> Option<WelcomeKind> {
    if strip_colour(ctx.lore) != NEW_PLAYER_LORE {
        return None;
    }

    let screen_allowed = ctx.is_new && ctx.may_show_welcome_screen;
    if ctx.mode.shows_tutorial(screen_allowed) {
        Some(WelcomeKind::Tutorial)
    } else if ctx.mode.shows_chat(screen_allowed) && !ctx.chat_pending {
        Some(WelcomeKind::ChatMessage)
    } else {
        None
    }
}
