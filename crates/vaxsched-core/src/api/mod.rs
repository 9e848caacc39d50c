//! REST API client module for the vaccination schedule service.
//!
//! This module provides the `ApiClient` for exchanging credentials for a
//! bearer token and for fetching patients, vaccines and schedules with it.
//!
//! Login failures surface as `AuthError`, failed reads as `FetchError`.

pub mod client;
pub mod error;

pub use client::ApiClient;
pub use error::{AuthError, FetchError};
