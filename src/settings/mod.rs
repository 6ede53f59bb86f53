//! Server-side user settings.
//!
//! - [`UserSettings`]: the bundle, replaced wholesale on every sync
//! - [`LoadTarget`]: which screen a waiting loading screen resolves to
//! - [`SettingsSynchronizer`]: fetch, cache and dispatch

pub mod model;
pub mod sync;

pub use model::{LoadTarget, UserSettings};
pub use sync::{SettingsSynchronizer, SyncOutcome};
