//! Core library for vaxsched.
//!
//! Provides the pieces every front-end builds on:
//!
//! - `auth`: the session store holding the bearer token across runs
//! - `api`: the HTTP client for the token endpoint and authenticated reads
//! - `models`: patients, vaccines, immunizations and the schedule rule
//! - `config`: on-disk configuration and directory layout

pub mod api;
pub mod auth;
pub mod config;
pub mod models;

pub use api::{ApiClient, AuthError, FetchError};
pub use auth::{FileSessionStore, KeyringSessionStore, MemorySessionStore, SessionStore};
pub use config::{Config, SessionBackend};
