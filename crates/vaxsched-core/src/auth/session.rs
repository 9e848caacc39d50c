use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Session file name in the data directory
const SESSION_FILE: &str = "session.json";

/// Holder of the current bearer token.
///
/// At most one token is held at a time. `None` from `get` means the user is
/// not signed in.
pub trait SessionStore: Send {
    /// The stored token, if any.
    fn get(&self) -> Option<String>;

    /// Persist `token`, replacing any previous one.
    fn set(&mut self, token: &str) -> Result<()>;

    /// Remove the token. Clearing an empty store is a no-op.
    fn clear(&mut self) -> Result<()>;

    fn is_authenticated(&self) -> bool {
        self.get().is_some()
    }
}

/// On-disk layout of the session file: a single `token` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionData {
    pub token: String,
}

pub struct FileSessionStore {
    dir: PathBuf,
    data: Option<SessionData>,
}

impl FileSessionStore {
    /// Open the store in `dir`, loading any token saved by a previous run.
    ///
    /// An unreadable or malformed session file is treated as no session.
    pub fn open(dir: impl Into<PathBuf>) -> Self {
        let mut store = Self {
            dir: dir.into(),
            data: None,
        };
        match store.load() {
            Ok(found) => debug!(found, "Session file loaded"),
            Err(e) => warn!(error = %e, "Ignoring unreadable session file"),
        }
        store
    }

    fn load(&mut self) -> Result<bool> {
        let path = self.session_path();
        if !path.exists() {
            return Ok(false);
        }
        let contents = std::fs::read_to_string(&path).context("Failed to read session file")?;
        let data: SessionData =
            serde_json::from_str(&contents).context("Failed to parse session file")?;
        if data.token.is_empty() {
            return Ok(false);
        }
        self.data = Some(data);
        Ok(true)
    }

    fn save(&self) -> Result<()> {
        if let Some(ref data) = self.data {
            std::fs::create_dir_all(&self.dir).context("Failed to create session directory")?;
            let contents = serde_json::to_string_pretty(data)?;
            std::fs::write(self.session_path(), contents).context("Failed to write session file")?;
        }
        Ok(())
    }

    pub fn path(&self) -> PathBuf {
        self.session_path()
    }

    fn session_path(&self) -> PathBuf {
        self.dir.join(SESSION_FILE)
    }
}

impl SessionStore for FileSessionStore {
    fn get(&self) -> Option<String> {
        self.data.as_ref().map(|d| d.token.clone())
    }

    fn set(&mut self, token: &str) -> Result<()> {
        self.data = Some(SessionData {
            token: token.to_string(),
        });
        self.save()
    }

    fn clear(&mut self) -> Result<()> {
        self.data = None;
        let path = self.session_path();
        if path.exists() {
            std::fs::remove_file(&path).context("Failed to remove session file")?;
        }
        Ok(())
    }
}

/// Store that keeps the token for the lifetime of the process only.
#[derive(Debug, Default, Clone)]
pub struct MemorySessionStore {
    token: Option<String>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self) -> Option<String> {
        self.token.clone()
    }

    fn set(&mut self, token: &str) -> Result<()> {
        self.token = Some(token.to_string());
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.token = None;
        Ok(())
    }
}
