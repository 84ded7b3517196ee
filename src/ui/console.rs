//! Interactive console driving a [`SessionManager`]

use anyhow::{Result, anyhow};
use colored::Colorize;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::notify::SystemNotifier;
use crate::rcon::Credentials;
use crate::session::{CommandRouter, InteractiveCommand, SessionEvent, SessionManager};
use crate::storage::credentials::CredentialStore;
use crate::storage::presets::{self, ItemRecord, ServerMessage};
use crate::storage::AppPaths;

use super::cli;

/// Line-oriented console: stdin commands in, session events out
pub struct Console {
    manager: SessionManager,
    router: CommandRouter,
    events: mpsc::UnboundedReceiver<SessionEvent>,
    notifier: Option<SystemNotifier>,
    credentials: CredentialStore,
    paths: AppPaths,
    remember_credentials: bool,
}

impl Console {
    pub fn new(mut manager: SessionManager, config: &Config, paths: AppPaths) -> Result<Self> {
        let events = manager
            .subscribe()
            .ok_or_else(|| anyhow!("Session events are already subscribed"))?;

        Ok(Self {
            manager,
            router: CommandRouter::new(),
            events,
            notifier: config
                .notifications
                .desktop
                .then(|| SystemNotifier::new("rcon-admin")),
            credentials: CredentialStore::new(paths.credentials_file()),
            paths,
            remember_credentials: config.remember_credentials,
        })
    }

    /// Run until `/quit` or end of input, connecting first when `initial` is set
    pub async fn run(&mut self, initial: Option<Credentials>) -> Result<()> {
        info!("Starting interactive console");
        self.spawn_input_reader();

        if let Some(credentials) = initial {
            self.connect(credentials).await;
        }

        loop {
            tokio::select! {
                command = self.router.next_command() => {
                    let Some(command) = command else { break };
                    if !self.handle_command(command).await? {
                        break;
                    }
                }
                Some(event) = self.events.recv() => self.handle_event(event),
            }
        }

        self.manager.disconnect().await;
        info!("Interactive console stopped");
        Ok(())
    }

    fn spawn_input_reader(&self) {
        let command_tx = self.router.command_sender();
        tokio::spawn(async move {
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => match CommandRouter::parse_interactive_command(&line) {
                        Ok(Some(command)) => {
                            if command_tx.send(command).is_err() {
                                return;
                            }
                        }
                        Ok(None) => {}
                        Err(err) => println!("{}", format!("Command error: {}", err).red()),
                    },
                    Ok(None) => break,
                    Err(err) => {
                        warn!("Failed to read console input: {}", err);
                        break;
                    }
                }
            }
            // End of input behaves like /quit
            let _ = command_tx.send(InteractiveCommand::Quit);
        });
    }

    async fn connect(&self, credentials: Credentials) -> bool {
        let connected = self.manager.connect(credentials.clone()).await;
        if connected && self.remember_credentials {
            if let Err(err) = self.credentials.save(&credentials) {
                warn!("Failed to save credentials: {}", err);
            }
        }
        connected
    }

    /// Returns false when the console should exit
    async fn handle_command(&self, command: InteractiveCommand) -> Result<bool> {
        debug!("Handling console command: {:?}", command);
        let manager = &self.manager;

        match command {
            InteractiveCommand::Help => cli::display_help(CommandRouter::help_messages()),
            InteractiveCommand::Connect {
                host,
                port,
                password,
            } => {
                let credentials = match (host, port, password) {
                    (Some(host), Some(port), Some(password)) => {
                        Some(Credentials::new(host, port, password))
                    }
                    _ => self.credentials.load().unwrap_or_else(|err| {
                        warn!("Failed to read saved credentials: {}", err);
                        None
                    }),
                };
                match credentials {
                    Some(credentials) => {
                        self.connect(credentials).await;
                    }
                    None => println!(
                        "{}",
                        "No saved credentials. Use /connect <host> <port> <password>".yellow()
                    ),
                }
            }
            InteractiveCommand::Disconnect => {
                if !manager.disconnect().await {
                    println!("{}", "Not connected".yellow());
                }
            }
            InteractiveCommand::Status => cli::display_status(&manager.status().await)
                .map_err(|e| anyhow!(e))?,
            InteractiveCommand::Players => cli::display_players(&manager.players().await)
                .map_err(|e| anyhow!(e))?,
            InteractiveCommand::Refresh => {
                if let Err(err) = manager.refresh_roster().await {
                    println!("{}", format!("Roster refresh failed: {}", err).red());
                }
                if let Err(err) = manager.refresh_options().await {
                    println!("{}", format!("Options refresh failed: {}", err).red());
                }
            }
            InteractiveCommand::Add { name } => {
                manager.add_player(&name).await;
            }
            InteractiveCommand::Ban {
                names,
                reason,
                ban_ip,
            } => {
                manager.ban_users(&names, reason.as_deref(), ban_ip).await;
            }
            InteractiveCommand::Unban { names } => {
                manager.unban_users(&names).await;
            }
            InteractiveCommand::Kick { names, reason } => {
                manager.kick_users(&names, reason.as_deref()).await;
            }
            InteractiveCommand::Access { level, names } => {
                manager.set_access_level(&names, level).await;
            }
            InteractiveCommand::GodMode { enabled, names } => {
                manager.set_god_mode(&names, enabled).await;
            }
            InteractiveCommand::Teleport { destination, names } => {
                manager.teleport_to_player(&names, &destination).await;
            }
            InteractiveCommand::TeleportTo { x, y, z, names } => {
                manager.teleport_to_coordinates(&names, x, y, z).await;
            }
            InteractiveCommand::Xp {
                perk,
                amount,
                names,
            } => {
                manager.add_xp(&names, &[(perk, amount)]).await;
            }
            InteractiveCommand::Item { item, count, names } => {
                manager.add_items(&names, &[(item, count)]).await;
            }
            InteractiveCommand::ItemList { path, names } => {
                let path = preset_path(&self.paths.saved_items_dir(), &path);
                manager.add_items_from_file(&names, &path).await;
            }
            InteractiveCommand::SaveItems { path, items } => {
                let path = preset_path(&self.paths.saved_items_dir(), &path);
                let records: Vec<ItemRecord> = items
                    .into_iter()
                    .map(|(item, count)| ItemRecord::new(item, count))
                    .collect();
                match presets::save_items(&path, &records) {
                    Ok(()) => println!("{}", format!("Item list saved to {}", path.display()).green()),
                    Err(err) => println!("{}", format!("Saving item list failed: {}", err).red()),
                }
            }
            InteractiveCommand::Vehicle { vehicle, names } => {
                manager.add_vehicle(&names, &vehicle).await;
            }
            InteractiveCommand::Horde { count, names } => {
                manager.create_horde(&names, count).await;
            }
            InteractiveCommand::Lightning { names } => {
                manager.lightning(&names).await;
            }
            InteractiveCommand::Thunder { names } => {
                manager.thunder(&names).await;
            }
            InteractiveCommand::Rain { intensity } => {
                manager.start_rain(intensity).await;
            }
            InteractiveCommand::StopRain => {
                manager.stop_rain().await;
            }
            InteractiveCommand::Storm { hours } => {
                manager.start_storm(hours).await;
            }
            InteractiveCommand::StopWeather => {
                manager.stop_weather().await;
            }
            InteractiveCommand::Chopper => {
                manager.chopper().await;
            }
            InteractiveCommand::Gunshot => {
                manager.gunshot().await;
            }
            InteractiveCommand::Alarm => {
                manager.alarm().await;
            }
            InteractiveCommand::Message { text } => {
                manager.server_message(&text).await;
            }
            InteractiveCommand::MessageFile { path } => {
                let path = preset_path(&self.paths.saved_messages_dir(), &path);
                manager.server_message_from_file(&path).await;
            }
            InteractiveCommand::SaveMessage { path, text } => {
                let path = preset_path(&self.paths.saved_messages_dir(), &path);
                match ServerMessage::new(text).save(&path) {
                    Ok(()) => println!("{}", format!("Message saved to {}", path.display()).green()),
                    Err(err) => println!("{}", format!("Saving message failed: {}", err).red()),
                }
            }
            InteractiveCommand::Save => {
                manager.save_world().await;
            }
            InteractiveCommand::StopServer => {
                manager.stop_server().await;
            }
            InteractiveCommand::WhitelistAdd { name, password } => {
                manager.add_to_whitelist(&name, &password).await;
            }
            InteractiveCommand::WhitelistRemove { names } => {
                manager.remove_from_whitelist(&names).await;
            }
            InteractiveCommand::Options { filter } => match manager.options().await {
                Some(options) => cli::display_options(&options, filter.as_deref())
                    .map_err(|e| anyhow!(e))?,
                None => println!("{}", "Options have not been synced yet".yellow()),
            },
            InteractiveCommand::Set { name, value } => {
                manager.set_option(&name, &value).await;
            }
            InteractiveCommand::Apply { path, reload } => {
                let path = preset_path(&self.paths.saved_options_dir(), &path);
                manager.import_options(&path, reload).await;
            }
            InteractiveCommand::Export { path } => {
                let path = preset_path(&self.paths.saved_options_dir(), &path);
                match manager.export_options(&path).await {
                    Ok(path) => println!("{}", format!("Options saved to {}", path.display()).green()),
                    Err(err) => println!("{}", format!("Export failed: {}", err).red()),
                }
            }
            InteractiveCommand::Reload => {
                manager.reload_server_options().await;
            }
            InteractiveCommand::Quit => {
                info!("User requested quit");
                return Ok(false);
            }
            InteractiveCommand::Raw { command } => match manager.raw_execute(&command).await {
                Ok(reply) if reply.trim().is_empty() => println!("{}", "(empty reply)".dimmed()),
                Ok(reply) => println!("{}", reply.trim_end()),
                Err(err) => println!("{}", format!("Command failed: {}", err).red()),
            },
        }

        Ok(true)
    }

    fn handle_event(&self, event: SessionEvent) {
        match event {
            SessionEvent::PlayersUpdated { players } => {
                let online = players.iter().filter(|p| p.online).count();
                println!(
                    "{}",
                    format!("Roster updated: {} online, {} known", online, players.len()).dimmed()
                );
            }
            SessionEvent::OptionsUpdated { .. } => {
                println!("{}", "Server options synced".dimmed());
            }
            SessionEvent::ConnectionLost => {
                println!(
                    "{}",
                    "Connection to the server was lost. Use /connect to reconnect.".red()
                );
            }
            SessionEvent::Progress { percent } => cli::display_progress(percent),
            SessionEvent::Notification(notification) => {
                cli::display_notification(&notification);
                if let Some(notifier) = &self.notifier {
                    notifier.raise(&notification);
                }
            }
        }
    }
}

/// Bare file names live in the given saved-preset directory
fn preset_path(dir: &Path, raw: &str) -> PathBuf {
    let path = Path::new(raw);
    if path.is_absolute() || path.components().count() > 1 {
        path.to_path_buf()
    } else {
        dir.join(path)
    }
}
