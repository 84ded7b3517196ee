//! Integration tests for rcon-admin CLI commands

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::process::{Command, Output};
use std::thread;

use tempfile::TempDir;

const AUTH: i32 = 3;
const AUTH_RESPONSE: i32 = 2;
const RESPONSE_VALUE: i32 = 0;

/// Run the binary against an isolated data directory
fn run(data_dir: &TempDir, args: &[&str]) -> Output {
    let config = data_dir.path().join("config.toml");
    Command::new(env!("CARGO_BIN_EXE_rcon-admin"))
        .arg("--config-file")
        .arg(&config)
        .args(args)
        .env("RCON_ADMIN_DATA_DIR", data_dir.path())
        .env("NO_COLOR", "1")
        .env_remove("RCON_ADMIN_PASSWORD")
        .output()
        .expect("Failed to execute rcon-admin")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn write_packet(stream: &mut TcpStream, id: i32, kind: i32, body: &str) {
    let size = (body.len() + 10) as i32;
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&size.to_le_bytes());
    bytes.extend_from_slice(&id.to_le_bytes());
    bytes.extend_from_slice(&kind.to_le_bytes());
    bytes.extend_from_slice(body.as_bytes());
    bytes.extend_from_slice(&[0, 0]);
    stream.write_all(&bytes).unwrap();
}

fn read_packet(stream: &mut TcpStream) -> Option<(i32, i32, String)> {
    let mut size = [0u8; 4];
    stream.read_exact(&mut size).ok()?;
    let mut rest = vec![0u8; i32::from_le_bytes(size) as usize];
    stream.read_exact(&mut rest).ok()?;

    let id = i32::from_le_bytes(rest[0..4].try_into().unwrap());
    let kind = i32::from_le_bytes(rest[4..8].try_into().unwrap());
    let body = String::from_utf8_lossy(&rest[8..rest.len() - 2]).to_string();
    Some((id, kind, body))
}

/// Accept one client, authenticate it and echo every command back
fn spawn_echo_server(password: &'static str) -> (String, thread::JoinHandle<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let address = listener.local_addr().unwrap();

    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let (id, kind, body) = read_packet(&mut stream).unwrap();
        assert_eq!(kind, AUTH);
        write_packet(&mut stream, id, RESPONSE_VALUE, "");
        let verdict = if body == password { id } else { -1 };
        write_packet(&mut stream, verdict, AUTH_RESPONSE, "");

        let mut received = Vec::new();
        while let Some((id, _, body)) = read_packet(&mut stream) {
            write_packet(&mut stream, id, RESPONSE_VALUE, &format!("echo: {}", body));
            received.push(body);
        }
        received
    });

    (address.port().to_string(), handle)
}

/// Test that the help command works
#[test]
fn test_help_command() {
    let dir = TempDir::new().unwrap();
    let output = run(&dir, &["--help"]);

    assert!(output.status.success(), "Help command should succeed");

    let stdout = stdout(&output);
    assert!(stdout.contains("Usage: rcon-admin"), "Should show usage");
    assert!(stdout.contains("interactive"), "Should show interactive command");
    assert!(stdout.contains("exec"), "Should show exec command");
    assert!(stdout.contains("credentials"), "Should show credentials command");
    assert!(stdout.contains("config"), "Should show config command");
}

/// Test that the version command works
#[test]
fn test_version_command() {
    let dir = TempDir::new().unwrap();
    let output = run(&dir, &["--version"]);

    assert!(output.status.success(), "Version command should succeed");

    let stdout = stdout(&output);
    assert!(stdout.contains("rcon-admin"), "Should show binary name");
    assert!(stdout.contains("0.1.0"), "Should show version number");
}

/// Test config show and reset
#[test]
fn test_config_commands() {
    let dir = TempDir::new().unwrap();

    let output = run(&dir, &["config", "show"]);
    assert!(output.status.success(), "Config show should succeed");
    let stdout_text = stdout(&output);
    assert!(stdout_text.contains("[rcon]"), "Should show rcon section");
    assert!(
        stdout_text.contains("check_interval_secs = 5"),
        "Should show the default interval"
    );

    let output = run(&dir, &["config", "reset"]);
    assert!(output.status.success(), "Config reset should succeed");
    let written = std::fs::read_to_string(dir.path().join("config.toml")).unwrap();
    assert!(written.contains("server_release = \"b41\""));
}

/// Test the saved credential lifecycle
#[test]
fn test_credentials_commands() {
    let dir = TempDir::new().unwrap();

    let output = run(
        &dir,
        &[
            "credentials", "save", "--host", "10.0.0.5", "--port", "27015", "--password",
            "hunter2",
        ],
    );
    assert!(output.status.success(), "Credentials save should succeed");
    assert!(stdout(&output).contains("10.0.0.5:27015"));

    let stored = std::fs::read_to_string(dir.path().join("credentials.json")).unwrap();
    assert!(!stored.contains("hunter2"), "Password must not be stored in clear");

    let output = run(&dir, &["credentials", "show"]);
    let shown = stdout(&output);
    assert!(shown.contains("10.0.0.5"));
    assert!(!shown.contains("hunter2"), "Password must be masked");

    let output = run(&dir, &["credentials", "delete"]);
    assert!(stdout(&output).contains("Deleted saved credentials"));

    let output = run(&dir, &["credentials", "show"]);
    assert!(stdout(&output).contains("No saved credentials"));
}

/// Test exec against a local echo server
#[test]
fn test_exec_command() {
    let dir = TempDir::new().unwrap();
    let (port, server) = spawn_echo_server("secret");

    let output = run(
        &dir,
        &[
            "exec", "--host", "127.0.0.1", "--port", &port, "--password", "secret", "servermsg",
            "hello there",
        ],
    );
    assert!(
        output.status.success(),
        "Exec should succeed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(stdout(&output).contains("echo: servermsg \"hello there\""));

    let received = server.join().unwrap();
    assert_eq!(received.first().map(String::as_str), Some("players"));
    assert_eq!(
        received.last().map(String::as_str),
        Some("servermsg \"hello there\"")
    );
}

/// Test exec refuses to run without credentials
#[test]
fn test_exec_requires_credentials() {
    let dir = TempDir::new().unwrap();
    let output = run(&dir, &["exec", "players"]);
    assert!(!output.status.success(), "Exec without credentials should fail");
}
