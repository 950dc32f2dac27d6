//! roomkey-http - reqwest-backed transport for roomkey.
//!
//! ```no_run
//! use roomkey_core::{ApiSdk, ApiUrl, HttpConfig};
//! use roomkey_http::HttpTransport;
//!
//! # async fn example() -> roomkey_core::Result<()> {
//! let config = HttpConfig::new(ApiUrl::new("https://api.example.com")?);
//! let sdk = ApiSdk::new(HttpTransport::new(config)?);
//! let rooms = sdk.get("/hotels/1/rooms").await?;
//! # Ok(())
//! # }
//! ```

mod error;
mod transport;

pub use transport::HttpTransport;
