//! Persisted token cache.
//!
//! One flat `key=value` file maps each identity to its credential pair:
//!
//! ```text
//! # Cosmetica session tokens. Do not share.
//! 069a79f4-44e9-4726-a5be-fca90e38aaf5=<master token>
//! 069a79f4-44e9-4726-a5be-fca90e38aaf5-l=<limited token>
//! ```
//!
//! The file is read once when the store is opened and rewritten in full on
//! every [`TokenStore::put`]. Reads never fail hard: a missing file is
//! created empty, an unreadable one is reported and treated as empty, which
//! degrades the session to re-issuance.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use thiserror::Error;
use tracing::{debug, error, warn};

use super::credentials::{Credential, Identity};
use crate::error::{SessionError, SessionResult};

/// The token file name inside the cache directory.
pub const TOKENS_FILE: &str = "tokens";

/// Suffix appended to an identity key for its limited token.
const LIMITED_SUFFIX: &str = "-l";

const FILE_HEADER: &str = "# Cosmetica session tokens. Do not share.";

/// Problems found while parsing the token file.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenFileError {
    #[error("line {line}: expected key=value")]
    MissingSeparator { line: usize },
    #[error("line {line}: empty key")]
    EmptyKey { line: usize },
}

/// File-backed map from identity to credential pair.
#[derive(Debug)]
pub struct TokenStore {
    path: PathBuf,
    /// Raw entries. Also the writer lock: held across every rewrite.
    entries: Mutex<BTreeMap<String, String>>,
}

impl TokenStore {
    /// Open the store at `path`, reading whatever is there.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match read_entries(&path) {
            Ok(entries) => {
                debug!("Loaded {} token cache entries", entries.len());
                entries
            }
            Err(e) => {
                error!(code = e.error_code(), "Failed to read tokens file: {}", e);
                BTreeMap::new()
            }
        };

        Self {
            path,
            entries: Mutex::new(entries),
        }
    }

    /// Open the store at `<cache_dir>/tokens`.
    pub fn in_cache_dir(cache_dir: &Path) -> Self {
        Self::load(cache_dir.join(TOKENS_FILE))
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All complete credential pairs, keyed by identity key.
    ///
    /// A master token whose limited key is missing is not a pair and is left out.
    pub fn credentials(&self) -> HashMap<String, Credential> {
        let entries = self.lock();
        entries
            .iter()
            .filter(|(key, _)| !key.ends_with(LIMITED_SUFFIX))
            .filter_map(|(key, master)| {
                let limited = entries.get(&format!("{}{}", key, LIMITED_SUFFIX))?;
                Some((key.clone(), Credential::new(master.clone(), limited.clone())))
            })
            .collect()
    }

    /// Cached credential for `identity`, if a complete pair exists.
    pub fn get(&self, identity: &Identity) -> Option<Credential> {
        let key = identity.store_key();
        let entries = self.lock();
        let master = entries.get(&key)?;
        match entries.get(&format!("{}{}", key, LIMITED_SUFFIX)) {
            Some(limited) => Some(Credential::new(master.clone(), limited.clone())),
            None => {
                warn!(identity = %identity, "Cached master token has no limited token; ignoring it");
                None
            }
        }
    }

    /// Store `credential` for `identity` and rewrite the file.
    ///
    /// The in-memory entry is updated even when the write fails, so the
    /// credential stays usable for this run.
    pub fn put(&self, identity: &Identity, credential: &Credential) -> SessionResult<()> {
        let key = identity.store_key();
        let mut entries = self.lock();
        entries.insert(
            format!("{}{}", key, LIMITED_SUFFIX),
            credential.limited_token.clone(),
        );
        entries.insert(key, credential.master_token.clone());

        debug!("Caching authentication tokens");
        write_entries(&self.path, &entries)
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, String>> {
        // A panic while holding the lock leaves the map itself intact.
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn persistence_error(path: &Path, message: impl ToString) -> SessionError {
    SessionError::Persistence {
        path: path.to_path_buf(),
        message: message.to_string(),
    }
}

fn read_entries(path: &Path) -> SessionResult<BTreeMap<String, String>> {
    if !path.is_file() {
        debug!("No tokens file at {}; creating an empty one", path.display());
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| persistence_error(path, e))?;
        }
        fs::File::create(path).map_err(|e| persistence_error(path, e))?;
        return Ok(BTreeMap::new());
    }

    let text = fs::read_to_string(path).map_err(|e| persistence_error(path, e))?;
    parse_entries(&text).map_err(|e| persistence_error(path, e))
}

fn write_entries(path: &Path, entries: &BTreeMap<String, String>) -> SessionResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| persistence_error(path, e))?;
    }

    let tmp = path.with_extension("tmp");
    fs::write(&tmp, render_entries(entries)).map_err(|e| persistence_error(path, e))?;
    restrict_permissions(&tmp);
    fs::rename(&tmp, path).map_err(|e| persistence_error(path, e))
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) {
    use std::os::unix::fs::PermissionsExt;
    if let Err(e) = fs::set_permissions(path, fs::Permissions::from_mode(0o600)) {
        warn!("Could not restrict permissions on {}: {}", path.display(), e);
    }
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) {}

/// Parse the `key=value` token file format.
///
/// Blank lines and lines starting with `#` or `!` are ignored. The first `=`
/// or `:` separates key from value.
pub fn parse_entries(text: &str) -> Result<BTreeMap<String, String>, TokenFileError> {
    let mut entries = BTreeMap::new();

    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
            continue;
        }

        let sep = line
            .find(|c| c == '=' || c == ':')
            .ok_or(TokenFileError::MissingSeparator { line: line_no })?;
        let key = line[..sep].trim();
        if key.is_empty() {
            return Err(TokenFileError::EmptyKey { line: line_no });
        }
        let value = line[sep + 1..].trim_start();
        entries.insert(key.to_string(), value.to_string());
    }

    Ok(entries)
}

fn render_entries(entries: &BTreeMap<String, String>) -> String {
    let mut out = String::new();
    out.push_str(FILE_HEADER);
    out.push('\n');
    out.push_str(&format!("# {}\n", chrono::Local::now().to_rfc2822()));
    for (key, value) in entries {
        out.push_str(key);
        out.push('=');
        out.push_str(value);
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn identity(n: u8) -> Identity {
        Identity::new(uuid::Uuid::from_bytes([n; 16]), format!("player{}", n))
    }

    #[test]
    fn test_load_missing_file_creates_empty() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join(TOKENS_FILE);

        let store = TokenStore::load(&path);

        assert!(path.is_file());
        assert_eq!(fs::metadata(&path).unwrap().len(), 0);
        assert!(store.credentials().is_empty());
    }

    #[test]
    fn test_put_then_fresh_load_round_trips() {
        let temp_dir = TempDir::new().unwrap();
        let store = TokenStore::in_cache_dir(temp_dir.path());
        let cred = Credential::new("M1", "L1");

        store.put(&identity(1), &cred).unwrap();

        let reloaded = TokenStore::in_cache_dir(temp_dir.path());
        assert_eq!(reloaded.get(&identity(1)), Some(cred));
    }

    #[test]
    fn test_put_overwrites_both_fields() {
        let temp_dir = TempDir::new().unwrap();
        let store = TokenStore::in_cache_dir(temp_dir.path());

        store.put(&identity(1), &Credential::new("M1", "L1")).unwrap();
        store.put(&identity(1), &Credential::new("M2", "")).unwrap();

        let reloaded = TokenStore::in_cache_dir(temp_dir.path());
        assert_eq!(reloaded.get(&identity(1)), Some(Credential::new("M2", "")));
    }

    #[test]
    fn test_empty_limited_token_is_still_a_pair() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(TOKENS_FILE);
        let key = identity(3).store_key();
        fs::write(&path, format!("{}=M3\n{}-l=\n", key, key)).unwrap();

        let store = TokenStore::load(&path);
        assert_eq!(store.get(&identity(3)), Some(Credential::new("M3", "")));
    }

    #[test]
    fn test_master_without_limited_is_not_exposed() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(TOKENS_FILE);
        fs::write(&path, format!("{}=lonely\n", identity(4).store_key())).unwrap();

        let store = TokenStore::load(&path);
        assert_eq!(store.get(&identity(4)), None);
        assert!(store.credentials().is_empty());
    }

    #[test]
    fn test_malformed_file_is_treated_as_empty() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(TOKENS_FILE);
        let key = identity(5).store_key();
        fs::write(&path, format!("{}=M\n{}-l=L\nthis line is garbage\n", key, key)).unwrap();

        let store = TokenStore::load(&path);
        assert_eq!(store.get(&identity(5)), None);
    }

    #[test]
    fn test_unknown_keys_survive_rewrite() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(TOKENS_FILE);
        fs::write(&path, "# old header\nsomething-else=kept\n").unwrap();

        let store = TokenStore::load(&path);
        store.put(&identity(6), &Credential::new("M6", "L6")).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("something-else=kept"));
        assert!(text.starts_with(FILE_HEADER));
    }

    #[test]
    fn test_write_failure_keeps_in_memory_credential() {
        let temp_dir = TempDir::new().unwrap();
        // A directory where the file should be: creation and rewrite both fail.
        let path = temp_dir.path().join(TOKENS_FILE);
        fs::create_dir_all(path.join("blocker")).unwrap();

        let store = TokenStore::load(&path);
        let result = store.put(&identity(7), &Credential::new("M7", "L7"));

        assert!(matches!(result, Err(SessionError::Persistence { .. })));
        assert_eq!(store.get(&identity(7)), Some(Credential::new("M7", "L7")));
    }

    #[test]
    fn test_concurrent_puts_are_serialized() {
        let temp_dir = TempDir::new().unwrap();
        let store = Arc::new(TokenStore::in_cache_dir(temp_dir.path()));

        let handles: Vec<_> = (1..=8u8)
            .map(|n| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    store
                        .put(&identity(n), &Credential::new(format!("M{}", n), format!("L{}", n)))
                        .unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let reloaded = TokenStore::in_cache_dir(temp_dir.path());
        assert_eq!(reloaded.credentials().len(), 8);
        for n in 1..=8u8 {
            assert_eq!(
                reloaded.get(&identity(n)),
                Some(Credential::new(format!("M{}", n), format!("L{}", n)))
            );
        }
    }

    #[test]
    fn test_parse_entries_comments_and_separators() {
        let entries = parse_entries("# c\n! also c\n\na=1\nb: 2\n  c = 3\n").unwrap();
        assert_eq!(entries.get("a"), Some(&"1".to_string()));
        assert_eq!(entries.get("b"), Some(&"2".to_string()));
        assert_eq!(entries.get("c"), Some(&"3".to_string()));
    }

    #[test]
    fn test_parse_entries_errors() {
        assert_eq!(
            parse_entries("a=1\nnope\n"),
            Err(TokenFileError::MissingSeparator { line: 2 })
        );
        assert_eq!(parse_entries("=x"), Err(TokenFileError::EmptyKey { line: 1 }));
    }
}
