//! roomkey-core - Token-refresh coordinating client for the roomkey booking API.
//!
//! Every request issued through [`ApiSdk`] is watched for authentication
//! failures. A `401` while a refresh token is held triggers exactly one
//! refresh call per failure storm; every request caught in that storm is
//! replayed against the new access token, or rejected with the same terminal
//! error when the refresh itself fails.
//!
//! The crate is transport-agnostic. Anything implementing [`Transport`] can
//! carry the requests; `roomkey-http` provides the reqwest-backed one.
//!
//! # Example
//!
//! ```no_run
//! use roomkey_core::{ApiSdk, ClientConfig, Credentials, Transport};
//!
//! # async fn example<T: Transport + 'static>(transport: T) -> roomkey_core::Result<()> {
//! let sdk = ApiSdk::builder(transport)
//!     .config(ClientConfig::default())
//!     .on_tokens_change(|access, _refresh| {
//!         println!("signed in: {}", access.is_some());
//!     })
//!     .build()?;
//!
//! sdk.login(Credentials::new("guest@example.com", "hunter2")).await?;
//! let hotels = sdk.get("/hotels").await?;
//! println!("{}", hotels.body);
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod listener;
pub mod refresh;
pub mod tokens;
pub mod transport;
pub mod types;

pub use auth::{Credentials, Registration};
pub use client::{ApiSdk, ApiSdkBuilder};
pub use config::{ClientConfig, HttpConfig};
pub use error::Error;
pub use listener::{NoopListener, TokenListener};
pub use refresh::{RefreshGate, RefreshOutcome};
pub use tokens::{AccessToken, RefreshToken, TokenPair};
pub use transport::{ApiRequest, ApiResponse, Method, Transport};
pub use types::ApiUrl;

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;
