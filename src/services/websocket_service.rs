//! Per-connection WebSocket lifecycle: role classification on join, the
//! command loop, and the forwarder that feeds room broadcasts into the
//! socket writer.

use std::{sync::Arc, time::Duration};

use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use tokio::{
    sync::{broadcast::error::RecvError, mpsc},
    task::JoinHandle,
};
use tracing::{info, warn};

use crate::{
    dto::ws::{ClientMessage, ConnectionRole, GameCommand, ServerMessage},
    error::ServiceError,
    services::{game_service, public_service},
    state::{SharedState, room::Room},
};

const IDENT_TIMEOUT: Duration = Duration::from_secs(10);

/// A live room subscription: the forwarder task pumping hub broadcasts into
/// this connection's writer.
struct Subscription {
    room_id: String,
    forwarder: JoinHandle<()>,
}

/// Per-connection session bookkeeping.
struct Session {
    state: SharedState,
    outbound: mpsc::UnboundedSender<Message>,
    role: ConnectionRole,
    subscription: Option<Subscription>,
}

impl Session {
    fn drop_subscription(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.forwarder.abort();
        }
    }
}

/// Handle the full lifecycle for one WebSocket connection.
///
/// The first frame must be a `join`; afterwards the client may switch rooms,
/// leave, or (for control connections) submit commands. Multiple control
/// connections per room are allowed; mutations apply in receipt order and
/// the last write wins.
pub async fn handle_socket(state: SharedState, socket: WebSocket) {
    let (mut sender, mut receiver) = socket.split();
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Message>();

    // Dedicated writer task keeps outbound messages flowing even while we await inbound frames.
    let writer_task = tokio::spawn(async move {
        while let Some(message) = outbound_rx.recv().await {
            if sender.send(message).await.is_err() {
                break;
            }
        }
    });

    let mut session = Session {
        state,
        outbound: outbound_tx.clone(),
        role: ConnectionRole::Display,
        subscription: None,
    };

    let initial_message = match tokio::time::timeout(IDENT_TIMEOUT, receiver.next()).await {
        Ok(Some(Ok(Message::Text(text)))) => text,
        Ok(Some(Ok(Message::Close(_)))) => {
            finalize(writer_task, outbound_tx).await;
            return;
        }
        Ok(Some(Ok(_))) => {
            let _ = outbound_tx.send(Message::Close(None));
            finalize(writer_task, outbound_tx).await;
            return;
        }
        Ok(Some(Err(err))) => {
            warn!(error = %err, "websocket receive error");
            finalize(writer_task, outbound_tx).await;
            return;
        }
        Ok(None) | Err(_) => {
            warn!("websocket join timed out");
            finalize(writer_task, outbound_tx).await;
            return;
        }
    };

    let joined = match ClientMessage::from_json_str(&initial_message) {
        Ok(ClientMessage::Join { game_id, token }) => {
            handle_join(&mut session, game_id, token).await
        }
        Ok(_) => {
            warn!("first message was not a join");
            let _ = send_server_message(
                &outbound_tx,
                &ServerMessage::Error {
                    message: "first message must be a join".into(),
                },
            );
            false
        }
        Err(err) => {
            warn!(error = %err, "failed to parse join message");
            false
        }
    };

    if !joined {
        let _ = outbound_tx.send(Message::Close(None));
        session.drop_subscription();
        // The session's sender clone must go before finalize, or the writer
        // task would never see the channel close.
        drop(session);
        finalize(writer_task, outbound_tx).await;
        return;
    }

    while let Some(message) = receiver.next().await {
        match message {
            Ok(Message::Text(text)) => match ClientMessage::from_json_str(&text) {
                Ok(ClientMessage::Join { game_id, token }) => {
                    if !handle_join(&mut session, game_id, token).await {
                        break;
                    }
                }
                Ok(ClientMessage::Leave { game_id }) => {
                    match &session.subscription {
                        Some(subscription) if subscription.room_id == game_id => {
                            info!(room_id = %game_id, "client left room");
                            session.drop_subscription();
                        }
                        _ => warn!(room_id = %game_id, "leave for a room this client is not in"),
                    };
                }
                Ok(ClientMessage::Command { game_id, command }) => {
                    if let Err(err) = handle_command(&session, &game_id, command).await {
                        let _ = send_server_message(
                            &session.outbound,
                            &ServerMessage::Error {
                                message: err.to_string(),
                            },
                        );
                    }
                }
                Err(err) => {
                    warn!(error = %err, "failed to parse client message");
                    let _ = send_server_message(
                        &session.outbound,
                        &ServerMessage::Error {
                            message: format!("unparseable message: {err}"),
                        },
                    );
                }
            },
            Ok(Message::Ping(payload)) => {
                let _ = outbound_tx.send(Message::Pong(payload));
            }
            Ok(Message::Close(frame)) => {
                let _ = outbound_tx.send(Message::Close(frame));
                break;
            }
            Ok(Message::Binary(_)) => {}
            Ok(Message::Pong(_)) => {}
            Err(err) => {
                warn!(error = %err, "websocket error");
                break;
            }
        }
    }

    session.drop_subscription();
    drop(session);
    info!("websocket client disconnected");
    finalize(writer_task, outbound_tx).await;
}

/// Classify and subscribe a connection to a room.
///
/// A token makes this a control attempt: it must pass the authorizer or the
/// connection is closed (returns `false`). Without a token the connection is
/// display-only. Either way the caller immediately receives the join ack and
/// the current snapshot (or `null` for an uninitialized room), to this
/// connection only.
async fn handle_join(session: &mut Session, game_id: String, token: Option<String>) -> bool {
    if let Err(err) = public_service::ensure_room_id(&game_id) {
        let _ = send_server_message(
            &session.outbound,
            &ServerMessage::Error {
                message: err.to_string(),
            },
        );
        return true;
    }

    let role = match token {
        Some(credential) => match session.state.authorizer().authorize(&credential) {
            Ok(principal) => {
                info!(room_id = %game_id, %principal, "control client joined");
                ConnectionRole::Control
            }
            Err(err) => {
                warn!(room_id = %game_id, error = %err, "control authorization failed");
                let _ = send_server_message(
                    &session.outbound,
                    &ServerMessage::Error {
                        message: err.to_string(),
                    },
                );
                return false;
            }
        },
        None => {
            info!(room_id = %game_id, "display client joined");
            ConnectionRole::Display
        }
    };

    let room = session.state.room_entry(&game_id);
    game_service::hydrate_room(&session.state, &room).await;

    session.drop_subscription();
    session.role = role;

    let _ = send_server_message(
        &session.outbound,
        &ServerMessage::Joined {
            game_id: game_id.clone(),
            role,
        },
    );
    let _ = send_server_message(
        &session.outbound,
        &ServerMessage::State {
            game_id: game_id.clone(),
            state: room.snapshot_dto().await,
        },
    );

    session.subscription = Some(Subscription {
        room_id: game_id,
        forwarder: spawn_forwarder(&room, session.outbound.clone()),
    });
    true
}

/// Pump room broadcasts into this connection's writer channel.
///
/// Fire-and-forget per connection: a lagged receiver simply skips ahead,
/// which is safe because every broadcast carries the full snapshot.
fn spawn_forwarder(room: &Arc<Room>, outbound: mpsc::UnboundedSender<Message>) -> JoinHandle<()> {
    let mut receiver = room.hub().subscribe();
    tokio::spawn(async move {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    if outbound.send(Message::Text(event.data.into())).is_err() {
                        break;
                    }
                }
                Err(RecvError::Closed) => break,
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "subscriber lagged behind snapshot broadcasts");
                    continue;
                }
            }
        }
    })
}

/// Route a command to the mutation path. The room is addressed by the
/// message, mirroring the inbound protocol; the connection's role decides
/// whether the mutation is allowed at all.
async fn handle_command(
    session: &Session,
    game_id: &str,
    command: GameCommand,
) -> Result<(), ServiceError> {
    public_service::ensure_room_id(game_id)?;
    let room = session.state.room_entry(game_id);
    game_service::apply_command(&session.state, &room, session.role, command).await
}

/// Serialize a payload and push it onto the provided writer channel.
///
/// Serialization failures are permanent (a bug in our own types), so they
/// are logged and swallowed; a closed writer is reported to the caller.
fn send_server_message(
    tx: &mpsc::UnboundedSender<Message>,
    message: &ServerMessage,
) -> Result<(), ()> {
    let payload = match serde_json::to_string(message) {
        Ok(payload) => payload,
        Err(err) => {
            warn!(error = %err, "failed to serialize server message");
            return Ok(());
        }
    };

    tx.send(Message::Text(payload.into())).map_err(|_| ())
}

/// Ensure the writer task winds down before we return from the socket handler.
async fn finalize(writer_task: JoinHandle<()>, outbound_tx: mpsc::UnboundedSender<Message>) {
    drop(outbound_tx);
    let _ = writer_task.await;
}
