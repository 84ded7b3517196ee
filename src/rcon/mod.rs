//! Remote console transport
//!
//! Connect, execute and close primitives for the RCON protocol, plus a
//! scripted connector for running without a live server.

pub mod client;
pub mod mock;
pub mod types;

pub use client::{Connector, RconConnection, TcpConnector};
pub use mock::MockConnector;
pub use types::{Credentials, MAX_COMMAND_LEN, RconError};
