//! Engine connection — receives state updates over the local socket.
//!
//! The engine publishes length-prefixed JSON frames (see
//! `deck_core::protocol`).  The reader task reassembles frames across
//! partial reads, publishes engine-side log messages into the hub, and
//! forwards state snapshots into the shell queue.

use std::sync::Arc;

use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;
use tokio::sync::mpsc::UnboundedSender;
use tokio::time::Duration;
use tracing::{debug, info, warn};

use deck_core::log::LogHub;
use deck_core::protocol::EngineUpdate;

use crate::shell::ShellMessage;

/// Delay between reconnect attempts while the engine is unreachable.
const RETRY_DELAY: Duration = Duration::from_secs(2);

pub struct EngineConnection {
    stream: TcpStream,
    read_buffer: Vec<u8>,
}

impl EngineConnection {
    pub async fn connect(address: &str) -> anyhow::Result<Self> {
        let stream = TcpStream::connect(address).await?;
        Ok(Self {
            stream,
            read_buffer: Vec::with_capacity(4096),
        })
    }

    /// Next decoded update, or `None` when the engine closed the
    /// connection.  Short frames are retried after the next read;
    /// malformed frames are fatal for the stream.
    pub async fn next_update(&mut self) -> anyhow::Result<Option<EngineUpdate>> {
        loop {
            match EngineUpdate::decode(&self.read_buffer) {
                Ok((update, consumed)) => {
                    self.read_buffer.drain(..consumed);
                    return Ok(Some(update));
                }
                Err(e) if e.is_incomplete() => {}
                Err(e) => return Err(e.into()),
            }

            let mut buf = [0u8; 4096];
            let n = self.stream.read(&mut buf).await?;
            if n == 0 {
                return Ok(None);
            }
            self.read_buffer.extend_from_slice(&buf[..n]);
        }
    }
}

/// Connect to the engine (retrying while it is unreachable) and pump
/// updates until the shell goes away.  Abort the returned handle at
/// shutdown.
pub fn spawn_reader(
    address: String,
    hub: Arc<LogHub>,
    tx: UnboundedSender<ShellMessage>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let mut conn = match EngineConnection::connect(&address).await {
                Ok(conn) => conn,
                Err(e) => {
                    debug!("engine connect to {} failed: {}", address, e);
                    if tx.is_closed() {
                        return;
                    }
                    tokio::time::sleep(RETRY_DELAY).await;
                    continue;
                }
            };
            info!("connected to engine at {}", address);

            loop {
                match conn.next_update().await {
                    Ok(Some(EngineUpdate::Log { record })) => hub.publish(record),
                    Ok(Some(update)) => {
                        if tx.send(ShellMessage::Engine(update)).is_err() {
                            return;
                        }
                    }
                    Ok(None) => {
                        warn!("engine closed the connection");
                        break;
                    }
                    Err(e) => {
                        warn!("engine stream error: {}", e);
                        break;
                    }
                }
            }

            if tx.send(ShellMessage::ConnectionLost).is_err() {
                return;
            }
            tokio::time::sleep(RETRY_DELAY).await;
        }
    })
}
