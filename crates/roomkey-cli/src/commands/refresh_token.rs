//! Refresh token command implementation.

use anyhow::{Context, Result};
use clap::Args;

use crate::output;
use crate::session;

#[derive(Args, Debug)]
pub struct RefreshTokenArgs {}

pub async fn run(api: &str, _args: RefreshTokenArgs) -> Result<()> {
    let client = session::connect_signed_in(api)?;

    output::status("Refreshing session...");

    client
        .refresh()
        .await
        .context("Failed to refresh session")?;

    output::success("Session refreshed successfully");
    Ok(())
}
