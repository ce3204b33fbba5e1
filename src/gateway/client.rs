use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message};

use crate::config::GatewayConfig;
use crate::error::Result;

use super::events::{ClientEvent, ServerEvent};

/// Live connection to the realtime sync gateway.
///
/// The websocket is split into a writer task draining `outbound` and a
/// reader task decoding pushed JSON into `ServerEvent`s. Undecodable
/// frames are logged and skipped, never fatal. Dropping the connection
/// (after `leave`) aborts both tasks so no handler fires after teardown.
pub struct GatewayConnection {
    outbound: mpsc::UnboundedSender<ClientEvent>,
    inbound: mpsc::UnboundedReceiver<ServerEvent>,
    writer_task: JoinHandle<()>,
    reader_task: JoinHandle<()>,
}

impl GatewayConnection {
    /// Connects, then announces this participant with a single
    /// `join-room` event.
    pub async fn connect(config: &GatewayConfig, room_id: &str, username: &str) -> Result<Self> {
        let (ws_stream, _) = connect_async(&config.url).await?;
        tracing::info!(url = %config.url, room_id = %room_id, "Gateway connection established");

        let (mut ws_writer, mut ws_reader) = ws_stream.split();
        let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<ClientEvent>();
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel::<ServerEvent>();

        let writer_task = tokio::spawn(async move {
            while let Some(event) = outbound_rx.recv().await {
                let text = match serde_json::to_string(&event) {
                    Ok(text) => text,
                    Err(e) => {
                        tracing::error!(error = %e, "Failed to serialize outbound event");
                        continue;
                    }
                };
                if let Err(e) = ws_writer.send(Message::Text(text)).await {
                    tracing::error!(error = %e, "Failed to send gateway message");
                    break;
                }
            }
            let _ = ws_writer.send(Message::Close(None)).await;
        });

        let reader_task = tokio::spawn(async move {
            while let Some(result) = ws_reader.next().await {
                match result {
                    Ok(Message::Text(text)) => match serde_json::from_str::<ServerEvent>(&text) {
                        Ok(event) => {
                            if inbound_tx.send(event).is_err() {
                                break;
                            }
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, raw_message = %text, "Ignoring unparseable gateway event");
                        }
                    },
                    Ok(Message::Close(_)) => {
                        tracing::info!("Gateway closed the connection");
                        break;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        tracing::error!(error = %e, "Gateway read error");
                        break;
                    }
                }
            }
        });

        let connection = Self {
            outbound: outbound_tx,
            inbound: inbound_rx,
            writer_task,
            reader_task,
        };
        connection.send(ClientEvent::JoinRoom {
            room_id: room_id.to_string(),
            username: username.to_string(),
        });
        Ok(connection)
    }

    /// Handle for components that publish outward (presence, submissions)
    pub fn sender(&self) -> mpsc::UnboundedSender<ClientEvent> {
        self.outbound.clone()
    }

    /// Fire-and-forget emit toward the gateway
    pub fn send(&self, event: ClientEvent) {
        if self.outbound.send(event).is_err() {
            tracing::warn!("Gateway writer task gone, dropping outbound event");
        }
    }

    /// Next pushed event; `None` once the connection is closed
    pub async fn recv(&mut self) -> Option<ServerEvent> {
        self.inbound.recv().await
    }

    /// Announces departure and tears the connection down. No events are
    /// delivered after this returns.
    pub fn leave(self, room_id: &str, username: &str) {
        self.send(ClientEvent::LeaveRoom {
            room_id: room_id.to_string(),
            username: username.to_string(),
        });
        // Closing the outbound channel lets the writer flush the
        // leave-room event and the close frame before exiting
        drop(self.outbound);
        self.reader_task.abort();
        let _ = self.writer_task;
        tracing::info!(room_id = %room_id, "Left room and closed gateway connection");
    }
}
