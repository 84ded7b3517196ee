//! Remote console session management module
//!
//! This module owns the live connection and its lock, the background watchdog,
//! the event channel towards the presentation layer and the parser for
//! interactive console input.

pub mod action_channel;
pub mod command_router;
pub mod session_manager;
pub mod state;

pub use action_channel::{ActionChannel, Notification, SessionEvent, Severity};
pub use command_router::{CommandRouter, InteractiveCommand};
pub use session_manager::{SessionConfig, SessionManager, SessionStatus};
pub use state::Session;
