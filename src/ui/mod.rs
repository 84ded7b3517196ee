//! User Interface module
//!
//! Line-based console output and the interactive command loop.

/// Simple CLI output functions
pub mod cli;

/// Interactive console loop
pub mod console;

pub use console::Console;

use crate::AppResult;
use crate::config::Config;
use crate::storage::AppPaths;

/// Display welcome page
pub fn display_welcome_page(config: &Config, paths: &AppPaths) -> AppResult<()> {
    println!();
    println!("┌─ RCON Admin ────────────────────────────────────────────────────────┐");
    println!("│                                                                     │");
    println!(
        "│   Version: {:<56} │",
        env!("CARGO_PKG_VERSION")
    );
    println!("│   Server release: {:<49} │", config.rcon.server_release);
    println!(
        "│   Liveness check: every {:<43} │",
        format!("{}s", config.rcon.check_interval_secs)
    );
    println!("│   Data directory: {:<49} │", paths.root().display().to_string());
    println!("│                                                                     │");
    println!("│   Type /help for commands, /connect to reach a server.              │");
    println!("│   Lines without a leading / are sent to the server as-is.           │");
    println!("│                                                                     │");
    println!("└─────────────────────────────────────────────────────────────────────┘");
    println!();

    Ok(())
}
