//! Whoami command implementation.

use anyhow::{Context, Result};
use clap::Args;

use crate::output;
use crate::session;

#[derive(Args, Debug)]
pub struct WhoamiArgs {}

pub async fn run(api: &str, _args: WhoamiArgs) -> Result<()> {
    let client = session::connect_signed_in(api)?;

    let profile = client.profile().await.context("Failed to fetch profile")?;

    for key in ["email", "firstName", "lastName", "role"] {
        if let Some(value) = profile.get(key).and_then(|v| v.as_str()) {
            output::field(key, value);
        }
    }
    output::field("API", api);

    Ok(())
}
