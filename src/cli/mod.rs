//! Command Line Interface module
//!
//! Implements the CLI commands and argument parsing for rcon-admin.

use clap::{Args, Parser, Subcommand};

use crate::rcon::Credentials;

#[derive(Parser, Debug, Clone)]
#[command(name = "rcon-admin")]
#[command(about = "Remote console administration for dedicated game servers")]
#[command(long_about = "Connect to a game server over RCON to manage players, world events and server options")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Configuration file path
    #[arg(long, default_value = "config.toml")]
    pub config_file: String,

    /// Log level (trace, debug, info, warn, error); overrides the config file
    #[arg(long)]
    pub log_level: Option<String>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

/// Server address and password. Missing pieces fall back to saved credentials.
#[derive(Args, Debug, Clone, Default)]
pub struct ServerArgs {
    /// Server host or IP
    #[arg(long)]
    pub host: Option<String>,

    /// RCON port
    #[arg(long)]
    pub port: Option<String>,

    /// RCON password
    #[arg(long, env = "RCON_ADMIN_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

impl ServerArgs {
    pub fn is_empty(&self) -> bool {
        self.host.is_none() && self.port.is_none() && self.password.is_none()
    }

    /// Fill the blanks from `saved`
    pub fn resolve(&self, saved: Option<&Credentials>) -> Credentials {
        let pick = |arg: &Option<String>, saved: Option<&String>| {
            arg.clone().or_else(|| saved.cloned()).unwrap_or_default()
        };
        Credentials::new(
            pick(&self.host, saved.map(|c| &c.host)),
            pick(&self.port, saved.map(|c| &c.port)),
            pick(&self.password, saved.map(|c| &c.password)),
        )
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start interactive console session
    Interactive {
        #[command(flatten)]
        server: ServerArgs,
    },

    /// Run a single command and print the reply
    Exec {
        #[command(flatten)]
        server: ServerArgs,

        /// Command and arguments, sent verbatim
        #[arg(required = true, trailing_var_arg = true)]
        command: Vec<String>,
    },

    /// Saved credential management
    Credentials {
        #[command(subcommand)]
        action: CredentialsAction,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

impl Default for Commands {
    fn default() -> Self {
        Commands::Interactive {
            server: ServerArgs::default(),
        }
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum CredentialsAction {
    /// Encrypt and store credentials
    Save {
        #[command(flatten)]
        server: ServerArgs,
    },

    /// Show stored credentials with the password masked
    Show,

    /// Remove stored credentials
    Delete,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Reset configuration to defaults
    Reset,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the actual command, using default if none provided
    pub fn command(&self) -> Commands {
        self.command.clone().unwrap_or_default()
    }

    /// Check if we're running in interactive mode
    pub fn is_interactive_mode(&self) -> bool {
        matches!(self.command(), Commands::Interactive { .. })
    }

    /// Adjust log level based on verbose flag, then the command line, then config
    pub fn effective_log_level(&self, configured: &str) -> String {
        if self.verbose {
            "debug".to_string()
        } else {
            self.log_level
                .clone()
                .unwrap_or_else(|| configured.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_command_is_interactive() {
        let cli = Cli::parse_from(["rcon-admin"]);
        assert!(cli.is_interactive_mode());
        assert_eq!(cli.effective_log_level("warn"), "warn");
    }

    #[test]
    fn test_exec_collects_trailing_args() {
        let cli = Cli::parse_from([
            "rcon-admin", "-v", "exec", "--host", "127.0.0.1", "--port", "27015", "servermsg",
            "hello there",
        ]);
        assert_eq!(cli.effective_log_level("info"), "debug");
        match cli.command() {
            Commands::Exec { server, command } => {
                assert_eq!(server.host.as_deref(), Some("127.0.0.1"));
                assert_eq!(command, vec!["servermsg", "hello there"]);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_server_args_fall_back_to_saved() {
        let saved = Credentials::new("10.0.0.2", "27015", "secret");
        let args = ServerArgs {
            port: Some("16261".into()),
            ..ServerArgs::default()
        };
        let resolved = args.resolve(Some(&saved));
        assert_eq!(resolved.address(), "10.0.0.2:16261");
        assert_eq!(resolved.password, "secret");
        assert!(!ServerArgs::default().resolve(None).is_complete());
    }
}
