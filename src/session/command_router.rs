//! Command Router for interactive command processing

use anyhow::{Result, anyhow, bail};
use tokio::sync::mpsc;

use crate::roster::AccessLevel;

/// Interactive commands for the terminal session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InteractiveCommand {
    Help,
    /// Connect, falling back to saved credentials when no args are given
    Connect {
        host: Option<String>,
        port: Option<String>,
        password: Option<String>,
    },
    Disconnect,
    Status,
    Players,
    /// Re-poll roster and options
    Refresh,
    Add { name: String },
    Ban {
        names: Vec<String>,
        reason: Option<String>,
        ban_ip: bool,
    },
    Unban { names: Vec<String> },
    Kick {
        names: Vec<String>,
        reason: Option<String>,
    },
    Access {
        level: AccessLevel,
        names: Vec<String>,
    },
    GodMode { enabled: bool, names: Vec<String> },
    Teleport {
        destination: String,
        names: Vec<String>,
    },
    TeleportTo {
        x: i64,
        y: i64,
        z: i64,
        names: Vec<String>,
    },
    Xp {
        perk: String,
        amount: u32,
        names: Vec<String>,
    },
    Item {
        item: String,
        count: u32,
        names: Vec<String>,
    },
    ItemList { path: String, names: Vec<String> },
    SaveItems {
        path: String,
        items: Vec<(String, u32)>,
    },
    Vehicle { vehicle: String, names: Vec<String> },
    Horde { count: u32, names: Vec<String> },
    Lightning { names: Vec<String> },
    Thunder { names: Vec<String> },
    Rain { intensity: Option<u8> },
    StopRain,
    Storm { hours: Option<u32> },
    StopWeather,
    Chopper,
    Gunshot,
    Alarm,
    Message { text: String },
    MessageFile { path: String },
    SaveMessage { path: String, text: String },
    Save,
    StopServer,
    WhitelistAdd { name: String, password: String },
    WhitelistRemove { names: Vec<String> },
    Options { filter: Option<String> },
    Set { name: String, value: String },
    Apply { path: String, reload: bool },
    Export { path: String },
    Reload,
    Quit,
    /// Anything not starting with `/`, sent verbatim
    Raw { command: String },
}

/// Command router for processing interactive commands
pub struct CommandRouter {
    /// Command input channel
    command_tx: mpsc::UnboundedSender<InteractiveCommand>,
    /// Command input receiver
    command_rx: Option<mpsc::UnboundedReceiver<InteractiveCommand>>,
}

impl CommandRouter {
    /// Create a new CommandRouter
    pub fn new() -> Self {
        let (command_tx, command_rx) = mpsc::unbounded_channel();

        Self {
            command_tx,
            command_rx: Some(command_rx),
        }
    }

    /// Send command to router
    pub fn send_command(&self, command: InteractiveCommand) -> Result<()> {
        self.command_tx
            .send(command)
            .map_err(|e| anyhow!("Failed to send command: {}", e))
    }

    /// Get next command from input
    pub async fn next_command(&mut self) -> Option<InteractiveCommand> {
        if let Some(command_rx) = &mut self.command_rx {
            command_rx.recv().await
        } else {
            None
        }
    }

    /// Get command sender for external use
    pub fn command_sender(&self) -> mpsc::UnboundedSender<InteractiveCommand> {
        self.command_tx.clone()
    }

    /// Parse interactive command from string input
    pub fn parse_interactive_command(input: &str) -> Result<Option<InteractiveCommand>> {
        let input = input.trim();

        if input.is_empty() {
            return Ok(None);
        }
        if !input.starts_with('/') {
            return Ok(Some(InteractiveCommand::Raw {
                command: input.to_string(),
            }));
        }

        let parts = split_args(input)?;
        let args = &parts[1..];

        let command = match parts[0].as_str() {
            "/help" | "/?" => InteractiveCommand::Help,
            "/connect" => match args {
                [] => InteractiveCommand::Connect {
                    host: None,
                    port: None,
                    password: None,
                },
                [host, port, password] => InteractiveCommand::Connect {
                    host: Some(host.clone()),
                    port: Some(port.clone()),
                    password: Some(password.clone()),
                },
                _ => bail!("Usage: /connect [<host> <port> <password>]"),
            },
            "/disconnect" => InteractiveCommand::Disconnect,
            "/status" => InteractiveCommand::Status,
            "/players" | "/list" => InteractiveCommand::Players,
            "/refresh" => InteractiveCommand::Refresh,
            "/add" => InteractiveCommand::Add {
                name: single(args, "Usage: /add <name>")?,
            },
            "/ban" => {
                let mut ban_ip = false;
                let mut reason = None;
                let mut names = Vec::new();
                let mut iter = args.iter();
                while let Some(arg) = iter.next() {
                    match arg.as_str() {
                        "-ip" => ban_ip = true,
                        "-r" => {
                            reason = Some(
                                iter.next()
                                    .cloned()
                                    .ok_or_else(|| anyhow!("-r needs a reason"))?,
                            )
                        }
                        _ => names.push(arg.clone()),
                    }
                }
                InteractiveCommand::Ban {
                    names: require_names(names, "Usage: /ban [-ip] [-r <reason>] <name>...")?,
                    reason,
                    ban_ip,
                }
            }
            "/unban" => InteractiveCommand::Unban {
                names: require_names(args.to_vec(), "Usage: /unban <name>...")?,
            },
            "/kick" => {
                let (reason, rest) = match args {
                    [flag, reason, rest @ ..] if flag == "-r" => (Some(reason.clone()), rest),
                    _ => (None, args),
                };
                InteractiveCommand::Kick {
                    names: require_names(rest.to_vec(), "Usage: /kick [-r <reason>] <name>...")?,
                    reason,
                }
            }
            "/access" => match args {
                [level, names @ ..] => InteractiveCommand::Access {
                    level: level.parse()?,
                    names: require_names(names.to_vec(), "Usage: /access <level> <name>...")?,
                },
                [] => bail!("Usage: /access <level> <name>..."),
            },
            "/godmode" => match args {
                [state, names @ ..] => InteractiveCommand::GodMode {
                    enabled: parse_toggle(state)?,
                    names: require_names(names.to_vec(), "Usage: /godmode on|off <name>...")?,
                },
                [] => bail!("Usage: /godmode on|off <name>..."),
            },
            "/teleport" => match args {
                [destination, names @ ..] => InteractiveCommand::Teleport {
                    destination: destination.clone(),
                    names: require_names(names.to_vec(), "Usage: /teleport <to-player> <name>...")?,
                },
                [] => bail!("Usage: /teleport <to-player> <name>..."),
            },
            "/tp" => match args {
                [x, y, z, names @ ..] => InteractiveCommand::TeleportTo {
                    x: number(x, "x")?,
                    y: number(y, "y")?,
                    z: number(z, "z")?,
                    names: require_names(names.to_vec(), "Usage: /tp <x> <y> <z> <name>...")?,
                },
                _ => bail!("Usage: /tp <x> <y> <z> <name>..."),
            },
            "/xp" => match args {
                [perk, amount, names @ ..] => InteractiveCommand::Xp {
                    perk: perk.clone(),
                    amount: number(amount, "amount")?,
                    names: require_names(names.to_vec(), "Usage: /xp <perk> <amount> <name>...")?,
                },
                _ => bail!("Usage: /xp <perk> <amount> <name>..."),
            },
            "/item" => match args {
                [flag, path, names @ ..] if flag == "--load" => InteractiveCommand::ItemList {
                    path: path.clone(),
                    names: require_names(names.to_vec(), "Usage: /item --load <list.json> <name>...")?,
                },
                [flag, path, entries @ ..] if flag == "--save" && !entries.is_empty() => {
                    InteractiveCommand::SaveItems {
                        path: path.clone(),
                        items: entries.iter().map(|entry| item_entry(entry)).collect::<Result<_>>()?,
                    }
                }
                [flag, ..] if flag == "--load" || flag == "--save" => {
                    bail!("Usage: /item --load <list.json> <name>... | --save <list.json> <item>:<count>...")
                }
                [item, count, names @ ..] => InteractiveCommand::Item {
                    item: item.clone(),
                    count: number(count, "count")?,
                    names: require_names(names.to_vec(), "Usage: /item <item> <count> <name>...")?,
                },
                _ => bail!("Usage: /item <item> <count> <name>..."),
            },
            "/vehicle" => match args {
                [vehicle, names @ ..] => InteractiveCommand::Vehicle {
                    vehicle: vehicle.clone(),
                    names: require_names(names.to_vec(), "Usage: /vehicle <script> <name>...")?,
                },
                [] => bail!("Usage: /vehicle <script> <name>..."),
            },
            "/horde" => match args {
                [count, names @ ..] => InteractiveCommand::Horde {
                    count: number(count, "count")?,
                    names: require_names(names.to_vec(), "Usage: /horde <count> <name>...")?,
                },
                [] => bail!("Usage: /horde <count> <name>..."),
            },
            "/lightning" => InteractiveCommand::Lightning {
                names: require_names(args.to_vec(), "Usage: /lightning <name>...")?,
            },
            "/thunder" => InteractiveCommand::Thunder {
                names: require_names(args.to_vec(), "Usage: /thunder <name>...")?,
            },
            "/rain" => match args {
                [] => InteractiveCommand::Rain { intensity: None },
                [arg] if arg == "stop" => InteractiveCommand::StopRain,
                [intensity] => InteractiveCommand::Rain {
                    intensity: Some(number(intensity, "intensity")?),
                },
                _ => bail!("Usage: /rain [<intensity>|stop]"),
            },
            "/storm" => match args {
                [] => InteractiveCommand::Storm { hours: None },
                [hours] => InteractiveCommand::Storm {
                    hours: Some(number(hours, "hours")?),
                },
                _ => bail!("Usage: /storm [<hours>]"),
            },
            "/weather" => InteractiveCommand::StopWeather,
            "/chopper" => InteractiveCommand::Chopper,
            "/gunshot" => InteractiveCommand::Gunshot,
            "/alarm" => InteractiveCommand::Alarm,
            "/msg" => match args {
                [flag, path] if flag == "--load" => InteractiveCommand::MessageFile { path: path.clone() },
                [flag, path, words @ ..] if flag == "--save" && !words.is_empty() => {
                    InteractiveCommand::SaveMessage {
                        path: path.clone(),
                        text: words.join(" "),
                    }
                }
                [flag, ..] if flag == "--load" || flag == "--save" => {
                    bail!("Usage: /msg --load <message.json> | --save <message.json> <text>")
                }
                _ => {
                    let text = input
                        .split_once(char::is_whitespace)
                        .map(|(_, rest)| rest.trim().to_string())
                        .unwrap_or_default();
                    if text.is_empty() {
                        bail!("Usage: /msg <text>");
                    }
                    InteractiveCommand::Message { text }
                }
            },
            "/save" => InteractiveCommand::Save,
            "/stop" => InteractiveCommand::StopServer,
            "/whitelist" => match args {
                [action, name, password] if action == "add" => InteractiveCommand::WhitelistAdd {
                    name: name.clone(),
                    password: password.clone(),
                },
                [action, names @ ..] if action == "remove" => InteractiveCommand::WhitelistRemove {
                    names: require_names(names.to_vec(), "Usage: /whitelist remove <name>...")?,
                },
                _ => bail!("Usage: /whitelist add <name> <password> | remove <name>..."),
            },
            "/options" => InteractiveCommand::Options {
                filter: args.first().cloned(),
            },
            "/set" => match args {
                [name, value @ ..] if !value.is_empty() => InteractiveCommand::Set {
                    name: name.clone(),
                    value: value.join(" "),
                },
                _ => bail!("Usage: /set <option> <value>"),
            },
            "/apply" => match args {
                [path] => InteractiveCommand::Apply {
                    path: path.clone(),
                    reload: false,
                },
                [path, flag] if flag == "--reload" => InteractiveCommand::Apply {
                    path: path.clone(),
                    reload: true,
                },
                _ => bail!("Usage: /apply <preset.json> [--reload]"),
            },
            "/export" => InteractiveCommand::Export {
                path: single(args, "Usage: /export <preset.json>")?,
            },
            "/reload" => InteractiveCommand::Reload,
            "/quit" | "/exit" | "/q" => InteractiveCommand::Quit,
            other => bail!(
                "Unknown command: {}. Type /help for available commands.",
                other
            ),
        };

        Ok(Some(command))
    }

    /// Interactive command help
    pub fn help_messages() -> &'static [&'static str] {
        &[
            "/connect [<host> <port> <password>]  - Connect (saved credentials if omitted)",
            "/disconnect                           - Close the connection",
            "/status                               - Connection and roster summary",
            "/players                              - Show the roster",
            "/refresh                              - Re-poll players and options",
            "/add <name>                           - Track a player by name",
            "/ban [-ip] [-r <reason>] <name>...    - Ban players",
            "/unban <name>...                      - Unban players",
            "/kick [-r <reason>] <name>...         - Kick players",
            "/access <level> <name>...             - Set access level",
            "/godmode on|off <name>...             - Toggle god mode",
            "/teleport <to-player> <name>...       - Teleport players to a player",
            "/tp <x> <y> <z> <name>...             - Teleport players to coordinates",
            "/xp <perk> <amount> <name>...         - Grant experience",
            "/item <item> <count> <name>...        - Give items",
            "/item --load <list.json> <name>...    - Give a saved item list",
            "/item --save <list.json> <item>:<count>...",
            "/vehicle <script> <name>...           - Spawn a vehicle",
            "/horde <count> <name>...              - Spawn zombies near players",
            "/lightning <name>... | /thunder <name>...",
            "/rain [<intensity>|stop] | /storm [<hours>] | /weather",
            "/chopper | /gunshot | /alarm          - World events",
            "/msg <text>                           - Broadcast a server message",
            "/msg --load <message.json>            - Broadcast a saved message",
            "/msg --save <message.json> <text>     - Save a message",
            "/save | /stop                         - Save world / shut the server down",
            "/whitelist add <name> <pw> | remove <name>...",
            "/options [filter]                     - Show server options",
            "/set <option> <value>                 - Change one option",
            "/apply <preset.json> [--reload]       - Apply an options preset",
            "/export <preset.json>                 - Save current options to a file",
            "/reload                               - Reload options on the server",
            "/quit                                 - Exit",
            "<anything else>                       - Sent to the server verbatim",
        ]
    }
}

impl Default for CommandRouter {
    fn default() -> Self {
        Self::new()
    }
}

/// Whitespace split honouring double quotes
pub fn split_args(input: &str) -> Result<Vec<String>> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut has_token = false;

    for ch in input.chars() {
        match ch {
            '"' => {
                in_quotes = !in_quotes;
                has_token = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if has_token {
                    args.push(std::mem::take(&mut current));
                    has_token = false;
                }
            }
            c => {
                current.push(c);
                has_token = true;
            }
        }
    }

    if in_quotes {
        bail!("Unterminated quote");
    }
    if has_token {
        args.push(current);
    }
    Ok(args)
}

fn single(args: &[String], usage: &str) -> Result<String> {
    match args {
        [value] => Ok(value.clone()),
        _ => Err(anyhow!("{}", usage)),
    }
}

fn require_names(names: Vec<String>, usage: &str) -> Result<Vec<String>> {
    if names.is_empty() {
        bail!("{}", usage);
    }
    Ok(names)
}

fn number<T: std::str::FromStr>(value: &str, what: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| anyhow!("Invalid {}: {}", what, value))
}

/// `Base.Axe:2` style item list entry
fn item_entry(entry: &str) -> Result<(String, u32)> {
    match entry.rsplit_once(':') {
        Some((item, count)) if !item.is_empty() => Ok((item.to_string(), number(count, "count")?)),
        _ => bail!("Expected <item>:<count>, got {}", entry),
    }
}

fn parse_toggle(value: &str) -> Result<bool> {
    match value.to_lowercase().as_str() {
        "on" | "true" | "enable" => Ok(true),
        "off" | "false" | "disable" => Ok(false),
        other => bail!("Expected on or off, got {}", other),
    }
}
