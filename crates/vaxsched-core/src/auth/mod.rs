//! Session management for the bearer token.
//!
//! This module provides:
//! - `SessionStore`: the single seam all token reads and writes go through
//! - `FileSessionStore`: token persisted to `session.json` in the data directory
//! - `KeyringSessionStore`: token persisted in the OS keychain
//! - `MemorySessionStore`: non-persistent store
//!
//! Tokens are trusted until the server rejects them; nothing expires locally.

pub mod keychain;
pub mod session;

pub use keychain::KeyringSessionStore;
pub use session::{FileSessionStore, MemorySessionStore, SessionData, SessionStore};
