//! Simple CLI output implementation
//!
//! Colored line output for the interactive console.

use colored::{ColoredString, Colorize};

use crate::AppResult;
use crate::metrics::ConnectionStatus;
use crate::options::ServerOptions;
use crate::rcon::Credentials;
use crate::roster::Player;
use crate::session::{Notification, SessionStatus, Severity};

/// One roster row, without color
pub fn format_player(player: &Player) -> String {
    let mut flags = Vec::new();
    if player.banned {
        flags.push("banned");
    }
    if player.elevated {
        flags.push(player.access_level.as_str());
    }

    if flags.is_empty() {
        player.name.clone()
    } else {
        format!("{} [{}]", player.name, flags.join(", "))
    }
}

/// Display the roster, online players first
pub fn display_players(players: &[Player]) -> AppResult<()> {
    let online = players.iter().filter(|p| p.online).count();
    println!("👥 Players ({} online, {} known):", online, players.len());

    if players.is_empty() {
        println!("   (No players seen yet)");
        return Ok(());
    }

    let (online, offline): (Vec<&Player>, Vec<&Player>) = players.iter().partition(|p| p.online);
    for player in online {
        println!("   {} {}", "●".green(), format_player(player));
    }
    for player in offline {
        let line = format_player(player);
        if player.banned {
            println!("   {} {}", "●".red(), line.dimmed());
        } else {
            println!("   {} {}", "○".dimmed(), line.dimmed());
        }
    }

    Ok(())
}

/// Names containing `filter`, case-insensitively
pub fn filter_options(options: &ServerOptions, filter: Option<&str>) -> Vec<(&'static str, String)> {
    let filter = filter.map(str::to_lowercase);
    options
        .iter()
        .filter(|(name, _)| match &filter {
            Some(filter) => name.to_lowercase().contains(filter),
            None => true,
        })
        .map(|(name, value)| (name, value.to_string()))
        .collect()
}

/// Display server options
pub fn display_options(options: &ServerOptions, filter: Option<&str>) -> AppResult<()> {
    let rows = filter_options(options, filter);
    println!("⚙️  Server options ({}):", rows.len());
    for (name, value) in rows {
        println!("   {} {}", format!("{:<40}", name).cyan(), value);
    }
    Ok(())
}

fn status_label(status: ConnectionStatus) -> ColoredString {
    match status {
        ConnectionStatus::Connected => "Connected".green(),
        ConnectionStatus::Disconnected => "Disconnected".yellow(),
        ConnectionStatus::Lost => "Lost".red(),
    }
}

/// Display connection status in CLI format
pub fn display_status(status: &SessionStatus) -> AppResult<()> {
    println!("🔍 RCON Status:");
    println!("   Connection: {}", status_label(status.status));
    println!(
        "   Server: {}",
        status.server.as_deref().unwrap_or("(none)")
    );
    println!(
        "   Players: {} online / {} known",
        status.players_online, status.players_known
    );
    println!(
        "   Watchdog: {}",
        if status.watchdog_active { "running" } else { "stopped" }
    );
    println!(
        "   Exchanges: {} ({} failed)",
        status.metrics.exchanges, status.metrics.failures
    );
    println!(
        "   Latency P50/P95/P99: {}/{}/{}ms",
        status.metrics.latency_p50, status.metrics.latency_p95, status.metrics.latency_p99
    );

    Ok(())
}

/// Display saved credentials with the password masked
pub fn display_credentials(credentials: &Credentials) -> AppResult<()> {
    println!("🔑 Saved credentials:");
    println!("   Host: {}", credentials.host);
    println!("   Port: {}", credentials.port);
    println!("   Password: {}", "*".repeat(credentials.password.chars().count().min(8)));
    Ok(())
}

/// Notification as a single colored line
pub fn display_notification(notification: &Notification) {
    let title = notification.rendered_title();
    let line = match notification.severity {
        Severity::Info => format!("ℹ️  {}", title).normal(),
        Severity::Success => format!("✅ {}", title).green(),
        Severity::Warning => format!("⚠️  {}", title).yellow(),
        Severity::Error => format!("❌ {}", title).red(),
    };
    println!("{}", line);
    if !notification.message.is_empty() {
        println!("   {}", notification.message.dimmed());
    }
    if let Some(path) = &notification.path {
        println!("   {}", path.dimmed());
    }
}

pub fn display_progress(percent: u8) {
    if percent == 0 {
        return;
    }
    let filled = (percent as usize) / 5;
    println!(
        "   [{}{}] {}%",
        "#".repeat(filled),
        " ".repeat(20 - filled),
        percent
    );
}

/// Display interactive command help
pub fn display_help(lines: &[&str]) {
    println!("📖 Commands:");
    for line in lines {
        println!("   {}", line);
    }
}
