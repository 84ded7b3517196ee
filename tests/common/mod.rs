//! Shared fixtures: a scripted game server behind the mock connector.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use rcon_admin::options::fields::field_kind;
use rcon_admin::options::OptionKind;
use rcon_admin::rcon::{Credentials, MockConnector, RconError};
use rcon_admin::session::{Notification, SessionConfig, SessionEvent, SessionManager, Severity};
use rcon_admin::storage::AppPaths;
use tempfile::TempDir;
use tokio::sync::mpsc::UnboundedReceiver;

pub fn creds() -> Credentials {
    Credentials::new("127.0.0.1", "27015", "secret")
}

pub fn players_reply(names: &[String]) -> String {
    let mut reply = format!("Players connected ({}): \n", names.len());
    for name in names {
        reply.push('-');
        reply.push_str(name);
        reply.push('\n');
    }
    reply
}

pub fn options_reply(options: &[(String, String)]) -> String {
    let mut reply = String::from("List of Server Options:\n");
    for (name, value) in options {
        reply.push_str(&format!("* {}={}\n", name, value));
    }
    reply
}

/// First argument of a command line, without its quotes
fn first_arg(args: &str) -> String {
    let args = args.trim_start();
    match args.strip_prefix('"') {
        Some(rest) => rest.split('"').next().unwrap_or_default().to_string(),
        None => args.split_whitespace().next().unwrap_or_default().to_string(),
    }
}

struct FakeState {
    online: Vec<String>,
    options: Vec<(String, String)>,
    missing: Vec<String>,
    down: bool,
}

/// In-memory game server answering the commands the admin core sends.
#[derive(Clone)]
pub struct FakeServer {
    state: Arc<Mutex<FakeState>>,
}

impl FakeServer {
    pub fn new() -> Self {
        let options = [
            ("PVP", "true"),
            ("PauseEmpty", "true"),
            ("MaxPlayers", "16"),
            ("PublicName", "My Server"),
            ("MinutesPerPage", "1.0"),
        ]
        .iter()
        .map(|(n, v)| (n.to_string(), v.to_string()))
        .collect();

        Self {
            state: Arc::new(Mutex::new(FakeState {
                online: Vec::new(),
                options,
                missing: Vec::new(),
                down: false,
            })),
        }
    }

    pub fn set_online(&self, names: &[&str]) {
        self.state.lock().unwrap().online = names.iter().map(|s| s.to_string()).collect();
    }

    /// Users the server reports as unknown
    pub fn set_missing(&self, names: &[&str]) {
        self.state.lock().unwrap().missing = names.iter().map(|s| s.to_string()).collect();
    }

    /// Every exchange fails while down
    pub fn set_down(&self, down: bool) {
        self.state.lock().unwrap().down = down;
    }

    pub fn option(&self, name: &str) -> Option<String> {
        let state = self.state.lock().unwrap();
        state
            .options
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.clone())
    }

    pub fn answer(&self, command: &str) -> Result<String, RconError> {
        let mut state = self.state.lock().unwrap();
        if state.down {
            return Err(RconError::Io("connection reset by peer".to_string()));
        }

        let (verb, rest) = command.split_once(' ').unwrap_or((command, ""));
        let reply = match verb {
            "players" => players_reply(&state.online),
            "showoptions" => options_reply(&state.options),
            "changeoption" => {
                let name = first_arg(rest);
                let raw = rest.trim_start()[name.len()..].trim().trim_matches('"').to_string();
                // The server prints floats with one decimal place
                let echoed = match field_kind(&name) {
                    Some(OptionKind::Float) => format!("{:.1}", raw.parse::<f64>().unwrap()),
                    _ => raw,
                };
                match state.options.iter_mut().find(|(n, _)| *n == name) {
                    Some(entry) => entry.1 = echoed.clone(),
                    None => state.options.push((name.clone(), echoed.clone())),
                }
                format!("Option : {} is now : {}", name, echoed)
            }
            "reloadoptions" => "Options reloaded".to_string(),
            "banuser" | "unbanuser" | "kickuser" => {
                let name = first_arg(rest);
                if state.missing.contains(&name) {
                    format!("User {} doesn't exist.", name)
                } else {
                    match verb {
                        "banuser" => format!("User {} is now banned", name),
                        "unbanuser" => format!("User {} is now un-banned", name),
                        _ => format!("{} kicked.", name),
                    }
                }
            }
            "godmod" => {
                let name = first_arg(rest);
                if rest.trim_end().ends_with("-true") {
                    format!("User {} is now invincible.", name)
                } else {
                    format!("User {} is no more invincible.", name)
                }
            }
            "servermsg" => "Message sent.".to_string(),
            _ => String::new(),
        };
        Ok(reply)
    }

    /// Route every exchange of `connector` through this server
    pub fn install(&self, connector: &MockConnector) {
        let server = self.clone();
        connector.set_handler(move |command| server.answer(command));
    }
}

pub struct Harness {
    pub manager: SessionManager,
    pub connector: MockConnector,
    pub server: FakeServer,
    pub events: UnboundedReceiver<SessionEvent>,
    pub paths: AppPaths,
    pub dir: TempDir,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_interval(Duration::from_secs(3600))
    }

    pub fn with_interval(check_interval: Duration) -> Self {
        let dir = TempDir::new().unwrap();
        let paths = AppPaths::new(dir.path());
        let mut config = SessionConfig::new(paths.clone());
        config.check_interval = check_interval;

        let connector = MockConnector::new();
        let server = FakeServer::new();
        server.install(&connector);

        let mut manager = SessionManager::new(config, Arc::new(connector.clone()));
        let events = manager.subscribe().unwrap();

        Self {
            manager,
            connector,
            server,
            events,
            paths,
            dir,
        }
    }

    /// Connect and discard the startup events and commands
    pub async fn connected(self) -> Self {
        assert!(self.manager.connect(creds()).await);
        let mut harness = self;
        harness.drain();
        harness.connector.clear_executed();
        harness
    }

    pub fn drain(&mut self) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            events.push(event);
        }
        events
    }
}

pub fn notifications(events: &[SessionEvent]) -> Vec<Notification> {
    events
        .iter()
        .filter_map(|event| match event {
            SessionEvent::Notification(n) => Some(n.clone()),
            _ => None,
        })
        .collect()
}

pub fn has_notification(events: &[SessionEvent], severity: Severity, title: &str) -> bool {
    notifications(events)
        .iter()
        .any(|n| n.severity == severity && n.title == title)
}

pub fn progress(events: &[SessionEvent]) -> Vec<u8> {
    events
        .iter()
        .filter_map(|event| match event {
            SessionEvent::Progress { percent } => Some(*percent),
            _ => None,
        })
        .collect()
}
