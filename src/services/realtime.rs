//! WebSocket room relay for appointment updates.
//!
//! Clients join rooms keyed by their own user id (`user-{id}`) or by an
//! appointment id (`appointment-{id}`). An `appointment-update` event from a
//! room member is rebroadcast as `appointment-updated` to every other member
//! of that appointment's room. Membership lives only in memory; nothing is
//! persisted and delivery is best-effort.
//!
//! Joins carry no authorization check, matching the observed system. Closing
//! that gap means gating `RoomHub::join` on the caller's identity.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

use crate::AppState;

pub type ConnSender = mpsc::UnboundedSender<Message>;

/// In-memory mapping from room key to subscriber connections, plus the
/// sender handle for each live connection.
#[derive(Default)]
pub struct RoomHub {
    connections: RwLock<HashMap<String, ConnSender>>,
    rooms: RwLock<HashMap<String, HashSet<String>>>,
}

impl RoomHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection; returns the receiver half used to drain
    /// outbound messages into the socket sink.
    pub async fn add_connection(&self, conn_id: String) -> mpsc::UnboundedReceiver<Message> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.connections.write().await.insert(conn_id, tx);
        rx
    }

    /// Drop a connection and remove it from every room it joined.
    pub async fn remove_connection(&self, conn_id: &str) {
        self.connections.write().await.remove(conn_id);
        let mut rooms = self.rooms.write().await;
        rooms.retain(|_, members| {
            members.remove(conn_id);
            !members.is_empty()
        });
    }

    pub async fn join(&self, room: &str, conn_id: &str) {
        self.rooms
            .write()
            .await
            .entry(room.to_string())
            .or_default()
            .insert(conn_id.to_string());
    }

    /// Relay a message to every member of `room` except `sender_id`.
    /// Returns the number of connections reached.
    pub async fn broadcast_to_room(
        &self,
        room: &str,
        sender_id: &str,
        message: Message,
    ) -> usize {
        let rooms = self.rooms.read().await;
        let Some(members) = rooms.get(room) else {
            return 0;
        };

        let connections = self.connections.read().await;
        let mut count = 0;
        for member in members {
            if member == sender_id {
                continue;
            }
            if let Some(tx) = connections.get(member) {
                if tx.send(message.clone()).is_ok() {
                    count += 1;
                }
            }
        }
        count
    }

    pub async fn room_size(&self, room: &str) -> usize {
        self.rooms
            .read()
            .await
            .get(room)
            .map(|m| m.len())
            .unwrap_or(0)
    }
}

// =============================================================================
// WIRE EVENTS
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum ClientEvent {
    JoinUserRoom {
        #[serde(rename = "userId")]
        user_id: String,
    },
    JoinAppointmentRoom {
        #[serde(rename = "appointmentId")]
        appointment_id: String,
    },
    AppointmentUpdate {
        #[serde(rename = "appointmentId")]
        appointment_id: String,
        #[serde(default)]
        data: serde_json::Value,
    },
}

#[derive(Debug, Serialize)]
pub struct AppointmentUpdated<'a> {
    pub event: &'static str,
    #[serde(rename = "appointmentId")]
    pub appointment_id: &'a str,
    pub data: &'a serde_json::Value,
}

// =============================================================================
// HANDLER
// =============================================================================

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state.hub.clone()))
}

async fn handle_socket(socket: WebSocket, hub: Arc<RoomHub>) {
    let conn_id = Uuid::new_v4().to_string();
    tracing::info!(conn_id = %conn_id, "websocket connected");

    let mut rx = hub.add_connection(conn_id.clone()).await;

    let (mut sink, mut stream) = socket.split();

    // Sender task: forward hub messages to the socket sink.
    let sender_conn_id = conn_id.clone();
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sink.send(msg).await.is_err() {
                tracing::debug!(conn_id = %sender_conn_id, "websocket sink closed");
                break;
            }
        }
    });

    while let Some(result) = stream.next().await {
        match result {
            Ok(Message::Text(text)) => {
                if let Ok(event) = serde_json::from_str::<ClientEvent>(&text) {
                    dispatch_event(&hub, &conn_id, event).await;
                } else {
                    tracing::debug!(conn_id = %conn_id, "unrecognized websocket event");
                }
            }
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(conn_id = %conn_id, error = %e, "websocket receive error");
                break;
            }
        }
    }

    hub.remove_connection(&conn_id).await;
    send_task.abort();
    tracing::info!(conn_id = %conn_id, "websocket disconnected");
}

async fn dispatch_event(hub: &RoomHub, conn_id: &str, event: ClientEvent) {
    match event {
        ClientEvent::JoinUserRoom { user_id } => {
            let room = format!("user-{}", user_id);
            hub.join(&room, conn_id).await;
            tracing::debug!(conn_id = %conn_id, room = %room, "joined user room");
        }
        ClientEvent::JoinAppointmentRoom { appointment_id } => {
            let room = format!("appointment-{}", appointment_id);
            hub.join(&room, conn_id).await;
            tracing::debug!(conn_id = %conn_id, room = %room, "joined appointment room");
        }
        ClientEvent::AppointmentUpdate {
            appointment_id,
            data,
        } => {
            let room = format!("appointment-{}", appointment_id);
            let payload = AppointmentUpdated {
                event: "appointment-updated",
                appointment_id: &appointment_id,
                data: &data,
            };
            match serde_json::to_string(&payload) {
                Ok(json) => {
                    let reached = hub
                        .broadcast_to_room(&room, conn_id, Message::Text(json.into()))
                        .await;
                    tracing::debug!(room = %room, reached, "relayed appointment update");
                }
                Err(e) => tracing::error!(error = %e, "failed to encode broadcast payload"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn broadcast_reaches_other_members_only() {
        let hub = RoomHub::new();

        let mut rx_a = hub.add_connection("a".to_string()).await;
        let mut rx_b = hub.add_connection("b".to_string()).await;

        hub.join("appointment-1", "a").await;
        hub.join("appointment-1", "b").await;

        let reached = hub
            .broadcast_to_room("appointment-1", "a", Message::Text("hi".into()))
            .await;

        assert_eq!(reached, 1);
        assert!(rx_b.try_recv().is_ok());
        assert!(rx_a.try_recv().is_err());
    }

    #[tokio::test]
    async fn broadcast_skips_other_rooms() {
        let hub = RoomHub::new();

        hub.add_connection("a".to_string()).await;
        let mut rx_b = hub.add_connection("b".to_string()).await;

        hub.join("appointment-1", "a").await;
        hub.join("appointment-2", "b").await;

        let reached = hub
            .broadcast_to_room("appointment-1", "a", Message::Text("hi".into()))
            .await;

        assert_eq!(reached, 0);
        assert!(rx_b.try_recv().is_err());
    }

    #[tokio::test]
    async fn disconnect_prunes_room_membership() {
        let hub = RoomHub::new();

        hub.add_connection("a".to_string()).await;
        hub.join("appointment-1", "a").await;
        assert_eq!(hub.room_size("appointment-1").await, 1);

        hub.remove_connection("a").await;
        assert_eq!(hub.room_size("appointment-1").await, 0);
    }

    #[test]
    fn client_events_decode_from_wire_names() {
        let join: ClientEvent =
            serde_json::from_str(r#"{"event":"join-user-room","userId":"u1"}"#).unwrap();
        assert!(matches!(join, ClientEvent::JoinUserRoom { user_id } if user_id == "u1"));

        let update: ClientEvent = serde_json::from_str(
            r#"{"event":"appointment-update","appointmentId":"ap1","data":{"status":"confirmed"}}"#,
        )
        .unwrap();
        assert!(
            matches!(update, ClientEvent::AppointmentUpdate { appointment_id, .. } if appointment_id == "ap1")
        );
    }
}
