//! WebSocket server implementation.
//!
//! One task per connection. Each task owns the socket's write half and
//! drains a per-connection outbound queue; everything that wants to
//! reach a client (presence changes, relayed edits, cursor events,
//! request results) goes through that queue via the room registry or
//! the connection's own sender. Suspension happens only at the
//! persistence boundary inside the mutation service.

use crate::handlers;
use crate::protocol::{ClientEvent, ServerEvent};
use crate::rooms::{ConnId, RoomRegistry, SharedRooms};
use futures_util::{SinkExt, StreamExt};
use quill_store::NoteService;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, RwLock};
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{debug, error, info, warn};

/// Server configuration.
#[derive(Debug, Clone)]
pub struct SyncServerConfig {
    /// Address to bind to.
    pub addr: SocketAddr,
}

impl Default for SyncServerConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:5000".parse().unwrap(),
        }
    }
}

/// The Quill sync server.
pub struct SyncServer {
    config: SyncServerConfig,
    rooms: SharedRooms,
    service: Arc<NoteService>,
}

impl SyncServer {
    /// Creates a server over the given mutation service.
    pub fn new(service: NoteService, config: SyncServerConfig) -> Self {
        Self {
            config,
            rooms: Arc::new(RwLock::new(RoomRegistry::new())),
            service: Arc::new(service),
        }
    }

    /// Handle to the room registry, for inspection.
    pub fn rooms(&self) -> SharedRooms {
        self.rooms.clone()
    }

    /// Handle to the mutation service.
    pub fn service(&self) -> Arc<NoteService> {
        self.service.clone()
    }

    /// Binds the configured address and accepts connections forever.
    pub async fn run(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let listener = TcpListener::bind(&self.config.addr).await?;
        info!("Quill sync server listening on ws://{}", self.config.addr);
        self.serve(listener).await
    }

    /// Accepts connections from an already-bound listener. Split out of
    /// [`run`](Self::run) so tests can bind an ephemeral port first.
    pub async fn serve(
        &self,
        listener: TcpListener,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        loop {
            match listener.accept().await {
                Ok((stream, addr)) => {
                    debug!("New connection from {}", addr);
                    let rooms = self.rooms.clone();
                    let service = self.service.clone();
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, addr, rooms, service).await {
                            warn!("Connection error from {}: {}", addr, e);
                        }
                    });
                }
                Err(e) => {
                    error!("Accept error: {}", e);
                }
            }
        }
    }
}

/// Handles a single WebSocket connection until it closes, then tears
/// down its room memberships and notifies the remaining subscribers.
async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    rooms: SharedRooms,
    service: Arc<NoteService>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let ws_stream = accept_async(stream).await?;
    let conn: ConnId = ConnId::new_v4();
    info!("WebSocket connection established with {} as {}", addr, conn);

    let (mut write, mut read) = ws_stream.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerEvent>();

    loop {
        tokio::select! {
            inbound = read.next() => {
                let msg = match inbound {
                    Some(Ok(m)) => m,
                    Some(Err(e)) => {
                        warn!("Message error from {}: {}", addr, e);
                        break;
                    }
                    None => break,
                };

                if msg.is_close() {
                    debug!("Client {} disconnected", addr);
                    break;
                }

                if msg.is_ping() {
                    // a failed write means the socket is gone; fall
                    // through to teardown rather than erroring out
                    if write.send(Message::Pong(msg.into_data())).await.is_err() {
                        break;
                    }
                    continue;
                }

                if msg.is_text() {
                    let text = msg.to_text().unwrap_or("");
                    match serde_json::from_str::<ClientEvent>(text) {
                        Ok(event) => {
                            handlers::dispatch(conn, event, &rooms, &service, &tx).await;
                        }
                        Err(e) => {
                            debug!("Malformed event from {}: {}", addr, e);
                            let _ = tx.send(ServerEvent::Error {
                                message: format!("malformed event: {e}"),
                            });
                        }
                    }
                }
            }

            outbound = rx.recv() => {
                match outbound {
                    Some(event) => {
                        let json = match serde_json::to_string(&event) {
                            Ok(json) => json,
                            Err(e) => {
                                warn!("Failed to encode event for {}: {}", addr, e);
                                continue;
                            }
                        };
                        if write.send(Message::Text(json)).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                }
            }
        }
    }

    // Disconnect tears down every room membership at once; the new
    // counts go to whoever is still subscribed. Broadcasting under the
    // same guard as the count change keeps the counts peers observe in
    // step with membership when connections come and go concurrently.
    {
        let mut registry = rooms.write().await;
        let affected = registry.leave_all(conn);
        for (room_id, count) in affected {
            registry.broadcast(&room_id, &ServerEvent::ActiveUsers(count), None);
        }
    }

    info!("Connection closed: {}", addr);
    Ok(())
}
