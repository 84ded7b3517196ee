//! Remote console client over TCP.
//!
//! Packets use the Source RCON framing: a little-endian `i32` size, request
//! id, packet type, the body and two trailing NUL bytes.

use async_trait::async_trait;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{debug, trace, warn};

use super::types::{RconError, check_command_len};

pub const SERVERDATA_AUTH: i32 = 3;
pub const SERVERDATA_AUTH_RESPONSE: i32 = 2;
pub const SERVERDATA_EXECCOMMAND: i32 = 2;
pub const SERVERDATA_RESPONSE_VALUE: i32 = 0;

/// Largest packet accepted from the server.
const MAX_PACKET_SIZE: usize = 64 * 1024;
/// id + type + two terminators
const PACKET_HEADER_SIZE: usize = 10;
const AUTH_FAILED_ID: i32 = -1;

/// A live, authenticated console session.
#[async_trait]
pub trait RconConnection: Send {
    /// Send one command and wait for its reply.
    async fn execute(&mut self, command: &str) -> Result<String, RconError>;

    /// Close the underlying transport. Errors are swallowed.
    async fn close(&mut self);
}

/// Opens console sessions.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(
        &self,
        address: &str,
        password: &str,
    ) -> Result<Box<dyn RconConnection>, RconError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub id: i32,
    pub kind: i32,
    pub body: String,
}

impl Packet {
    pub fn new(id: i32, kind: i32, body: impl Into<String>) -> Self {
        Self {
            id,
            kind,
            body: body.into(),
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        let size = (PACKET_HEADER_SIZE + self.body.len()) as i32;
        let mut buf = Vec::with_capacity(4 + size as usize);
        buf.extend_from_slice(&size.to_le_bytes());
        buf.extend_from_slice(&self.id.to_le_bytes());
        buf.extend_from_slice(&self.kind.to_le_bytes());
        buf.extend_from_slice(self.body.as_bytes());
        buf.extend_from_slice(&[0, 0]);
        buf
    }
}

pub async fn write_packet<W>(writer: &mut W, packet: &Packet) -> Result<(), RconError>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(&packet.encode()).await?;
    writer.flush().await?;
    Ok(())
}

pub async fn read_packet<R>(reader: &mut R) -> Result<Packet, RconError>
where
    R: AsyncRead + Unpin,
{
    let size = reader.read_i32_le().await?;
    if size < PACKET_HEADER_SIZE as i32 || size as usize > MAX_PACKET_SIZE {
        return Err(RconError::Protocol(format!("invalid packet size {}", size)));
    }

    let mut buf = vec![0u8; size as usize];
    reader.read_exact(&mut buf).await?;

    let id = i32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]);
    let kind = i32::from_le_bytes([buf[4], buf[5], buf[6], buf[7]]);
    let body_end = buf.len() - 2;
    let body = String::from_utf8_lossy(&buf[8..body_end])
        .trim_end_matches('\0')
        .to_string();

    Ok(Packet { id, kind, body })
}

/// Dials real servers with a per-exchange timeout.
#[derive(Debug, Clone)]
pub struct TcpConnector {
    timeout: Duration,
}

impl TcpConnector {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for TcpConnector {
    fn default() -> Self {
        Self::new(Duration::from_secs(10))
    }
}

#[async_trait]
impl Connector for TcpConnector {
    async fn connect(
        &self,
        address: &str,
        password: &str,
    ) -> Result<Box<dyn RconConnection>, RconError> {
        debug!("Dialing RCON endpoint {}", address);

        let stream = tokio::time::timeout(self.timeout, TcpStream::connect(address))
            .await
            .map_err(|_| RconError::Timeout(self.timeout))?
            .map_err(|e| RconError::Connection(format!("{}: {}", address, e)))?;
        if let Err(err) = stream.set_nodelay(true) {
            warn!("Failed to set TCP_NODELAY: {}", err);
        }

        let mut connection = TcpConnection {
            stream,
            next_id: 1,
            timeout: self.timeout,
        };
        connection.authenticate(password).await?;

        Ok(Box::new(connection))
    }
}

pub struct TcpConnection {
    stream: TcpStream,
    next_id: i32,
    timeout: Duration,
}

impl TcpConnection {
    fn allocate_id(&mut self) -> i32 {
        let id = self.next_id;
        self.next_id = if self.next_id == i32::MAX {
            1
        } else {
            self.next_id + 1
        };
        id
    }

    async fn authenticate(&mut self, password: &str) -> Result<(), RconError> {
        let id = self.allocate_id();
        let timeout = self.timeout;
        let stream = &mut self.stream;

        let exchange = async move {
            write_packet(stream, &Packet::new(id, SERVERDATA_AUTH, password)).await?;
            loop {
                let packet = read_packet(stream).await?;
                // Servers send an empty RESPONSE_VALUE ahead of the auth verdict
                if packet.kind != SERVERDATA_AUTH_RESPONSE {
                    trace!("Skipping pre-auth packet of type {}", packet.kind);
                    continue;
                }
                if packet.id == AUTH_FAILED_ID {
                    return Err(RconError::Authentication);
                }
                if packet.id != id {
                    return Err(RconError::Protocol(format!(
                        "auth response id {} does not match request {}",
                        packet.id, id
                    )));
                }
                return Ok(());
            }
        };

        tokio::time::timeout(timeout, exchange)
            .await
            .map_err(|_| RconError::Timeout(timeout))?
    }
}

#[async_trait]
impl RconConnection for TcpConnection {
    async fn execute(&mut self, command: &str) -> Result<String, RconError> {
        check_command_len(command)?;

        let id = self.allocate_id();
        let timeout = self.timeout;
        let stream = &mut self.stream;

        let exchange = async move {
            write_packet(stream, &Packet::new(id, SERVERDATA_EXECCOMMAND, command)).await?;
            loop {
                let packet = read_packet(stream).await?;
                if packet.id == id && packet.kind == SERVERDATA_RESPONSE_VALUE {
                    return Ok(packet.body);
                }
                trace!(
                    "Discarding stray packet id={} type={} while waiting for {}",
                    packet.id, packet.kind, id
                );
            }
        };

        tokio::time::timeout(timeout, exchange)
            .await
            .map_err(|_| RconError::Timeout(timeout))?
    }

    async fn close(&mut self) {
        if let Err(err) = self.stream.shutdown().await {
            debug!("RCON socket shutdown error: {}", err);
        }
    }
}
