use anyhow::{Context, Result};
use keyring::Entry;
use tracing::{debug, warn};

const SERVICE_NAME: &str = "vaxsched";

/// Keychain entry name, mirroring the `token` key of the session file.
const ENTRY_NAME: &str = "token";

/// Session store backed by the OS keychain.
///
/// The token is read once when the store is opened and cached in memory.
pub struct KeyringSessionStore {
    entry: Entry,
    token: Option<String>,
}

impl KeyringSessionStore {
    pub fn open() -> Result<Self> {
        Self::open_service(SERVICE_NAME)
    }

    fn open_service(service: &str) -> Result<Self> {
        let entry = Entry::new(service, ENTRY_NAME).context("Failed to create keyring entry")?;
        let token = match entry.get_password() {
            Ok(token) if !token.is_empty() => Some(token),
            Ok(_) | Err(keyring::Error::NoEntry) => None,
            Err(e) => {
                warn!(error = %e, "Failed to read token from keychain");
                None
            }
        };
        debug!(found = token.is_some(), "Keychain session loaded");
        Ok(Self { entry, token })
    }
}

impl super::SessionStore for KeyringSessionStore {
    fn get(&self) -> Option<String> {
        self.token.clone()
    }

    fn set(&mut self, token: &str) -> Result<()> {
        self.entry
            .set_password(token)
            .context("Failed to store token in keychain")?;
        self.token = Some(token.to_string());
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.token = None;
        match self.entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e).context("Failed to delete token from keychain"),
        }
    }
}
