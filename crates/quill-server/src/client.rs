//! Client side of the sync protocol.
//!
//! [`SyncClient`] is a thin wrapper over a WebSocket connection that
//! frames [`ClientEvent`]s out and [`ServerEvent`]s back. The `watch`
//! CLI command and the integration tests drive it; editor frontends
//! speak the same frames.

use crate::protocol::{ClientEvent, ServerEvent};
use chrono::{DateTime, Utc};
use futures_util::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("WebSocket error: {0}")]
    Ws(#[from] tungstenite::Error),
    #[error("Serialization error: {0}")]
    Encode(#[from] serde_json::Error),
}

/// A connection to a Quill sync server.
pub struct SyncClient {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl SyncClient {
    /// Connects to a server, e.g. `ws://127.0.0.1:5000`.
    pub async fn connect(url: &str) -> Result<Self, ClientError> {
        let (ws, _) = connect_async(url).await?;
        Ok(Self { ws })
    }

    /// Sends one event.
    pub async fn send(&mut self, event: &ClientEvent) -> Result<(), ClientError> {
        let json = serde_json::to_string(event)?;
        self.ws.send(Message::Text(json)).await?;
        Ok(())
    }

    /// Subscribes to a note's room.
    pub async fn join(&mut self, note_id: &str) -> Result<(), ClientError> {
        self.send(&ClientEvent::JoinNote {
            note_id: note_id.to_string(),
        })
        .await
    }

    /// Sends a live edit: the full replacement text.
    pub async fn edit(&mut self, note_id: &str, content: &str) -> Result<(), ClientError> {
        self.send(&ClientEvent::NoteUpdate {
            note_id: note_id.to_string(),
            content: content.to_string(),
        })
        .await
    }

    /// Sends a cursor position, fire-and-forget.
    pub async fn cursor(&mut self, note_id: &str, cursor: u64) -> Result<(), ClientError> {
        self.send(&ClientEvent::CursorPosition {
            note_id: note_id.to_string(),
            cursor,
        })
        .await
    }

    /// Asks the server to restore a note to the version at `timestamp`.
    pub async fn restore(
        &mut self,
        note_id: &str,
        timestamp: DateTime<Utc>,
    ) -> Result<(), ClientError> {
        self.send(&ClientEvent::NoteRestore {
            note_id: note_id.to_string(),
            timestamp,
        })
        .await
    }

    /// Waits for the next server event. `Ok(None)` once the connection
    /// is closed. Control frames are skipped.
    pub async fn next_event(&mut self) -> Result<Option<ServerEvent>, ClientError> {
        while let Some(msg) = self.ws.next().await {
            match msg? {
                Message::Text(text) => return Ok(Some(serde_json::from_str(&text)?)),
                Message::Close(_) => return Ok(None),
                _ => continue,
            }
        }
        Ok(None)
    }

    /// Closes the connection gracefully.
    pub async fn close(mut self) -> Result<(), ClientError> {
        self.ws.close(None).await?;
        Ok(())
    }
}
