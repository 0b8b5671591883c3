//! CLI argument definitions and parsing.
//!
//! Responsibilities:
//! - Define the CLI structure using clap derive macros.
//! - Parse command-line arguments and environment variables.
//!
//! Non-responsibilities:
//! - Does not execute commands (see `dispatch` module).
//! - Does not load configuration (see `main()`).

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "blog-cli")]
#[command(about = "Blog CLI - Log in to the blog API and make authorized calls", long_about = None)]
#[command(version)]
#[command(
    after_help = "Examples:\n  blog-cli login --username admin\n  blog-cli whoami\n  blog-cli request GET /api/posts\n  blog-cli request POST /api/posts --data '{\"title\":\"Hello\"}'\n  blog-cli logout\n"
)]
pub struct Cli {
    /// Base URL of the blog API (e.g., http://localhost:8080)
    #[arg(short, long, global = true, env = "BLOG_BASE_URL")]
    pub base_url: Option<String>,

    /// Path of the session file holding the stored tokens
    #[arg(long, global = true, env = "BLOG_SESSION_FILE", value_name = "FILE")]
    pub session_file: Option<PathBuf>,

    /// Request timeout in seconds
    #[arg(long, global = true, env = "BLOG_TIMEOUT")]
    pub timeout: Option<u64>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Log in and store the issued tokens
    Login {
        /// Account username
        #[arg(short, long)]
        username: String,

        /// Account password
        #[arg(short, long, env = "BLOG_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Clear the stored session and notify the provider
    Logout,

    /// Print the logged-in user
    Whoami,

    /// Print the session state and token expiry
    Status,

    /// Make an authorized call to the blog API
    Request {
        /// HTTP method (GET, POST, PUT, DELETE, ...)
        method: String,

        /// Path relative to the base URL (e.g., /api/posts)
        path: String,

        /// JSON request body
        #[arg(short, long)]
        data: Option<String>,

        /// Send without the stored credential
        #[arg(long)]
        no_auth: bool,
    },
}
