//! Session handling for the CLI.
//!
//! Commands never write the session file themselves. The SDK is built with a
//! [`storage::SessionFile`] listener and every token change it reports is
//! mirrored to disk.

pub mod storage;

use anyhow::{Context, Result, bail};
use tracing::{debug, warn};

use roomkey_core::{AccessToken, ApiSdk, ApiUrl, HttpConfig, RefreshToken};
use roomkey_http::HttpTransport;

use storage::SessionFile;

/// SDK client as used by the commands.
pub type Client = ApiSdk<HttpTransport>;

/// Build a client for `api`, resuming the stored session when it belongs to
/// the same API.
pub fn connect(api: &str) -> Result<Client> {
    let api = ApiUrl::new(api).context("Invalid API URL")?;
    let file = SessionFile::new(storage::session_path()?, api.clone());
    debug!(path = %file.path().display(), "session file");

    let stored = file.load().context("Failed to load session")?;
    let transport =
        HttpTransport::new(HttpConfig::new(api.clone())).context("Failed to create HTTP client")?;
    let mut builder = ApiSdk::builder(transport);

    match stored {
        Some(stored) if stored.api == api.as_str() => {
            debug!(saved_at = %stored.saved_at, "resuming stored session");
            builder = builder
                .access_token(AccessToken::new(stored.access_token))
                .refresh_token(RefreshToken::new(stored.refresh_token));
        }
        Some(stored) => {
            warn!(
                stored_api = %stored.api,
                api = %api,
                "stored session belongs to another API, ignoring it"
            );
        }
        None => {}
    }

    builder
        .listener(file)
        .build()
        .context("Failed to install stored tokens")
}

/// Like [`connect`], but fails when there is no session to use.
pub fn connect_signed_in(api: &str) -> Result<Client> {
    let client = connect(api)?;
    if client.refresh_token().is_none() {
        bail!("No active session. Run 'roomkey login' first.");
    }
    Ok(client)
}
