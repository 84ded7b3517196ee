use anyhow::{Result, anyhow, bail};
use colored::Colorize;
use std::path::Path;
use std::sync::Arc;

use rcon_admin::{
    cli::{Cli, Commands, CredentialsAction, ServerArgs},
    config::Config,
    executor::quote,
    init_logging,
    rcon::{Credentials, TcpConnector},
    session::{SessionConfig, SessionManager},
    storage::{AppPaths, credentials::CredentialStore},
    ui::{self, Console},
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    // Load configuration
    let config = Config::load_or_default(&cli.config_file);
    let paths = AppPaths::resolve(config.data_dir.as_deref())?;
    paths.ensure()?;

    // Initialize logging
    let log_dir = config.log.enable_file.then(|| paths.logs_dir());
    let _log_guard = init_logging(&cli.effective_log_level(&config.log_level), log_dir.as_deref())?;

    tracing::info!("RCON Admin starting...");
    tracing::debug!("CLI arguments: {:?}", cli);

    match cli.command() {
        Commands::Interactive { server } => run_interactive(&config, paths, &server).await,
        Commands::Exec { server, command } => run_exec(&config, paths, &server, &command).await,
        Commands::Credentials { action } => handle_credentials(&paths, &action),
        Commands::Config { action } => Config::handle_command(&action, Path::new(&cli.config_file)),
    }
}

fn session_manager(config: &Config, paths: AppPaths) -> Result<SessionManager> {
    let mut session_config = SessionConfig::new(paths);
    session_config.check_interval = config.check_interval();
    session_config.server_release = config.server_release()?;

    let connector = Arc::new(TcpConnector::new(config.timeout()));
    Ok(SessionManager::new(session_config, connector))
}

fn saved_credentials(paths: &AppPaths) -> Option<Credentials> {
    CredentialStore::new(paths.credentials_file())
        .load()
        .unwrap_or_else(|err| {
            tracing::warn!("Failed to read saved credentials: {}", err);
            None
        })
}

async fn run_interactive(config: &Config, paths: AppPaths, server: &ServerArgs) -> Result<()> {
    ui::display_welcome_page(config, &paths).map_err(|e| anyhow!(e))?;

    let initial = server.resolve(saved_credentials(&paths).as_ref());
    let initial = initial.is_complete().then_some(initial);

    let manager = session_manager(config, paths.clone())?;
    let mut console = Console::new(manager, config, paths)?;
    console.run(initial).await
}

async fn run_exec(
    config: &Config,
    paths: AppPaths,
    server: &ServerArgs,
    command: &[String],
) -> Result<()> {
    let credentials = server.resolve(saved_credentials(&paths).as_ref());
    if !credentials.is_complete() {
        bail!("Host, port and password are required (pass them or save credentials first)");
    }

    let command = command
        .iter()
        .map(|arg| {
            if arg.contains(char::is_whitespace) {
                quote(arg)
            } else {
                arg.clone()
            }
        })
        .collect::<Vec<_>>()
        .join(" ");

    let manager = session_manager(config, paths)?;
    if !manager.connect(credentials.clone()).await {
        bail!("Could not connect to {}", credentials.address());
    }

    let result = manager.raw_execute(&command).await;
    manager.disconnect().await;

    let reply = result?;
    println!("{}", reply.trim_end());
    Ok(())
}

fn handle_credentials(paths: &AppPaths, action: &CredentialsAction) -> Result<()> {
    let store = CredentialStore::new(paths.credentials_file());

    match action {
        CredentialsAction::Save { server } => {
            let credentials = server.resolve(store.load()?.as_ref());
            if !credentials.is_complete() {
                bail!("Host, port and password are required");
            }
            store.save(&credentials)?;
            println!(
                "{}",
                format!("Saved credentials for {}", credentials.address()).green()
            );
        }
        CredentialsAction::Show => match store.load()? {
            Some(credentials) => ui::cli::display_credentials(&credentials).map_err(|e| anyhow!(e))?,
            None => println!("No saved credentials"),
        },
        CredentialsAction::Delete => {
            if store.delete()? {
                println!("Deleted saved credentials");
            } else {
                println!("No saved credentials");
            }
        }
    }

    Ok(())
}
