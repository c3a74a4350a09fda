//! Durable storage for the session bearer token.
//!
//! A single key: present means "a session may be restorable", absent means
//! logged out. Access is sequential from the owning store, so no locking.
//!
//! ## Default location
//!
//! [`FileTokenStore::default_location`] uses [`dirs::data_dir()`]:
//!
//! | Platform | Path |
//! |----------|------|
//! | macOS | `~/Library/Application Support/questlog/session.json` |
//! | Linux | `~/.local/share/questlog/session.json` |
//! | Windows | `C:\Users\<user>\AppData\Roaming\questlog\session.json` |

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ApiError;

pub trait TokenStore {
    fn load(&self) -> Result<Option<String>, ApiError>;
    fn save(&mut self, token: &str) -> Result<(), ApiError>;
    fn clear(&mut self) -> Result<(), ApiError>;
}

/// Keeps the token for the lifetime of the process only.
#[derive(Debug, Clone, Default)]
pub struct MemoryTokenStore {
    token: Option<String>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: &str) -> Self {
        Self {
            token: Some(token.to_string()),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<String>, ApiError> {
        Ok(self.token.clone())
    }

    fn save(&mut self, token: &str) -> Result<(), ApiError> {
        self.token = Some(token.to_string());
        Ok(())
    }

    fn clear(&mut self) -> Result<(), ApiError> {
        self.token = None;
        Ok(())
    }
}

#[derive(Serialize, Deserialize)]
struct Persisted {
    token: String,
}

/// Persists the token as a small JSON document on disk.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn default_location() -> Self {
        let base = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
        Self::new(base.join("questlog").join("session.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn storage(e: impl std::fmt::Display) -> ApiError {
    ApiError::Storage(e.to_string())
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<String>, ApiError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(storage(e)),
        };
        let persisted: Persisted = serde_json::from_str(&raw).map_err(storage)?;
        Ok(Some(persisted.token).filter(|t| !t.is_empty()))
    }

    fn save(&mut self, token: &str) -> Result<(), ApiError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(storage)?;
        }
        let json = serde_json::to_string(&Persisted {
            token: token.to_string(),
        })
        .map_err(storage)?;
        std::fs::write(&self.path, json).map_err(storage)
    }

    fn clear(&mut self) -> Result<(), ApiError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(storage(e)),
        }
    }
}
