//! CLI argument definitions.

use clap::{Parser, Subcommand};

use crate::commands::{login, logout, refresh_token, request, whoami};

/// Command-line client for the roomkey hotel booking API.
#[derive(Parser, Debug)]
#[command(name = "roomkey")]
#[command(author, version = env!("ROOMKEY_VERSION"), about, long_about = None)]
pub struct Cli {
    /// API base URL
    #[arg(
        long,
        global = true,
        env = "ROOMKEY_API",
        default_value = "http://localhost:3000"
    )]
    pub api: String,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Log in and store the session
    Login(login::LoginArgs),

    /// Log out and remove the stored session
    Logout(logout::LogoutArgs),

    /// Show the profile of the signed-in user
    Whoami(whoami::WhoamiArgs),

    /// Exchange the refresh token for a new token pair
    RefreshToken(refresh_token::RefreshTokenArgs),

    /// Send an authenticated request and print the JSON response
    Request(request::RequestArgs),
}
