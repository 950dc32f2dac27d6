//! Login command implementation.

use anyhow::{Context, Result};
use clap::Args;

use roomkey_core::Credentials;

use crate::output;
use crate::session;

#[derive(Args, Debug)]
pub struct LoginArgs {
    /// Account email address
    #[arg(long)]
    pub email: String,

    /// Account password
    #[arg(long)]
    pub password: String,
}

pub async fn run(api: &str, args: LoginArgs) -> Result<()> {
    let client = session::connect(api)?;
    let credentials = Credentials::new(&args.email, &args.password);

    output::status("Logging in...");

    // The session listener persists the new tokens.
    client.login(credentials).await.context("Failed to login")?;

    output::success("Logged in successfully");
    println!();
    output::field("Email", &args.email);
    output::field("API", api);

    Ok(())
}
