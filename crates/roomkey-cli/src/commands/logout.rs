//! Logout command implementation.

use anyhow::Result;
use clap::Args;

use crate::output;
use crate::session;

#[derive(Args, Debug)]
pub struct LogoutArgs {}

pub async fn run(api: &str, _args: LogoutArgs) -> Result<()> {
    let client = session::connect_signed_in(api)?;

    output::status("Logging out...");
    client.logout().await;

    output::success("Logged out");
    Ok(())
}
