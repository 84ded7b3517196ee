//! Scripted in-memory console server.
//! Used by tests and offline demos where no game server is reachable.

use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::client::{Connector, RconConnection};
use super::types::RconError;

type Handler = Arc<dyn Fn(&str) -> Result<String, RconError> + Send + Sync>;

struct MockState {
    handler: Handler,
    refuse: Option<RconError>,
    dials: Vec<(String, String)>,
    executed: Vec<String>,
    closes: usize,
}

/// Connector whose connections answer through a replaceable handler.
#[derive(Clone)]
pub struct MockConnector {
    state: Arc<Mutex<MockState>>,
}

impl MockConnector {
    /// Every command is answered with an empty reply
    pub fn new() -> Self {
        Self::with_handler(|_| Ok(String::new()))
    }

    pub fn with_handler<F>(handler: F) -> Self
    where
        F: Fn(&str) -> Result<String, RconError> + Send + Sync + 'static,
    {
        Self {
            state: Arc::new(Mutex::new(MockState {
                handler: Arc::new(handler),
                refuse: None,
                dials: Vec::new(),
                executed: Vec::new(),
                closes: 0,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Swap the reply script; affects live connections too
    pub fn set_handler<F>(&self, handler: F)
    where
        F: Fn(&str) -> Result<String, RconError> + Send + Sync + 'static,
    {
        self.lock().handler = Arc::new(handler);
    }

    /// Make subsequent dials fail with `error`, or succeed again with `None`
    pub fn refuse_connections(&self, error: Option<RconError>) {
        self.lock().refuse = error;
    }

    pub fn dial_count(&self) -> usize {
        self.lock().dials.len()
    }

    /// `(address, password)` of every dial attempt
    pub fn dials(&self) -> Vec<(String, String)> {
        self.lock().dials.clone()
    }

    /// Commands received so far, in order
    pub fn executed(&self) -> Vec<String> {
        self.lock().executed.clone()
    }

    pub fn clear_executed(&self) {
        self.lock().executed.clear();
    }

    pub fn close_count(&self) -> usize {
        self.lock().closes
    }
}

impl Default for MockConnector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Connector for MockConnector {
    async fn connect(
        &self,
        address: &str,
        password: &str,
    ) -> Result<Box<dyn RconConnection>, RconError> {
        let mut state = self.lock();
        state.dials.push((address.to_string(), password.to_string()));
        if let Some(err) = state.refuse.clone() {
            return Err(err);
        }
        drop(state);

        Ok(Box::new(MockConnection {
            state: Arc::clone(&self.state),
        }))
    }
}

struct MockConnection {
    state: Arc<Mutex<MockState>>,
}

#[async_trait]
impl RconConnection for MockConnection {
    async fn execute(&mut self, command: &str) -> Result<String, RconError> {
        let handler = {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            state.executed.push(command.to_string());
            Arc::clone(&state.handler)
        };
        handler(command)
    }

    async fn close(&mut self) {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .closes += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_records_and_answers() {
        let connector = MockConnector::with_handler(|cmd| Ok(format!("ok {}", cmd)));
        let mut conn = connector.connect("h:1", "pw").await.unwrap();

        assert_eq!(conn.execute("save").await.unwrap(), "ok save");
        connector.set_handler(|_| Err(RconError::Io("reset".into())));
        assert!(conn.execute("players").await.is_err());
        conn.close().await;

        assert_eq!(connector.executed(), vec!["save", "players"]);
        assert_eq!(connector.dials(), vec![("h:1".to_string(), "pw".to_string())]);
        assert_eq!(connector.close_count(), 1);
    }

    #[tokio::test]
    async fn test_mock_refusal() {
        let connector = MockConnector::new();
        connector.refuse_connections(Some(RconError::Authentication));
        assert!(connector.connect("h:1", "pw").await.is_err());
        assert_eq!(connector.dial_count(), 1);
    }
}
