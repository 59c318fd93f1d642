//! WebSocket connection lifecycle: frame handling, command routing, and
//! the fan-out of engine events onto per-connection writer channels.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::dto::validation::{validate_display_name, validate_session_code};
use crate::dto::ws::{ClientCommand, ServerMessage};
use crate::error::ServiceError;
use crate::services::{scheduler, session_service};
use crate::services::session_service::{Outbound, Recipient};
use crate::state::session::{GameSession, SessionCode};
use crate::state::store::SessionHandle;
use crate::state::{ClientConnection, SharedState};

/// Handle the full lifecycle of one participant WebSocket connection.
pub async fn handle_socket(state: SharedState, socket: WebSocket) {
    let (mut sender, mut receiver) = socket.split();
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Message>();

    // Dedicated writer task keeps outbound events flowing even while we
    // await inbound frames.
    let writer_task = tokio::spawn(async move {
        while let Some(message) = outbound_rx.recv().await {
            if sender.send(message).await.is_err() {
                break;
            }
        }
    });

    let connection_id = Uuid::new_v4();
    state.register_connection(ClientConnection {
        id: connection_id,
        tx: outbound_tx.clone(),
    });
    info!(%connection_id, "client connected");

    // Session this connection joined, remembered for disconnect cleanup.
    let mut joined: Option<Arc<SessionHandle>> = None;

    while let Some(message) = receiver.next().await {
        match message {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientCommand>(&text) {
                Ok(command) => {
                    if let Err(err) =
                        process_command(&state, connection_id, &outbound_tx, &mut joined, command)
                            .await
                    {
                        warn!(%connection_id, error = %err, "command rejected");
                        send_message(
                            &outbound_tx,
                            &ServerMessage::Error {
                                message: err.to_string(),
                                code: err.kind().into(),
                            },
                        );
                    }
                }
                Err(err) => {
                    debug!(%connection_id, error = %err, "failed to parse command");
                    send_message(
                        &outbound_tx,
                        &ServerMessage::Error {
                            message: "malformed command payload".into(),
                            code: "invalidInput".into(),
                        },
                    );
                }
            },
            Ok(Message::Ping(payload)) => {
                let _ = outbound_tx.send(Message::Pong(payload));
            }
            Ok(Message::Close(frame)) => {
                debug!(%connection_id, "client closed");
                let _ = outbound_tx.send(Message::Close(frame));
                break;
            }
            Ok(Message::Binary(_)) => {}
            Ok(Message::Pong(_)) => {}
            Err(err) => {
                warn!(%connection_id, error = %err, "websocket error");
                break;
            }
        }
    }

    state.remove_connection(connection_id);
    if let Some(handle) = joined {
        let mut session = handle.lock().await;
        let events = session_service::handle_disconnect(&mut session, connection_id);
        dispatch(&state, &session, None, events);
        info!(%connection_id, code = %handle.code(), "participant left session");
    }
    info!(%connection_id, "client disconnected");

    finalize(writer_task, outbound_tx).await;
}

/// Route a parsed command to its handler, then deliver the returned events.
async fn process_command(
    state: &SharedState,
    connection_id: Uuid,
    requester: &mpsc::UnboundedSender<Message>,
    joined: &mut Option<Arc<SessionHandle>>,
    command: ClientCommand,
) -> Result<(), ServiceError> {
    match command {
        ClientCommand::Join {
            code,
            display_name,
            role,
        } => {
            validate_session_code(&code)?;
            validate_display_name(&display_name)?;
            let code = SessionCode::parse(&code)?;
            let handle = state.sessions().get_or_create(&code);
            {
                let mut session = handle.lock().await;
                let events = session_service::handle_join(
                    &mut session,
                    connection_id,
                    display_name.trim(),
                    role,
                );
                dispatch(state, &session, Some(requester), events);
            }
            info!(code = %handle.code(), name = %display_name.trim(), ?role, "participant joined");
            *joined = Some(handle);
            Ok(())
        }
        ClientCommand::LoadQuestions { code, questions } => {
            let handle = resolve(state, &code)?;
            let mut session = handle.lock().await;
            let events =
                session_service::handle_load_questions(&mut session, connection_id, questions)?;
            dispatch(state, &session, Some(requester), events);
            info!(code = %handle.code(), count = session.total_questions(), "questions loaded");
            Ok(())
        }
        ClientCommand::Start { code } => {
            let handle = resolve(state, &code)?;
            {
                let mut session = handle.lock().await;
                let events = session_service::handle_start(&mut session, connection_id)?;
                dispatch(state, &session, Some(requester), events);
                info!(code = %handle.code(), total = session.total_questions(), "game started");
            }
            scheduler::arm(state.clone(), handle);
            Ok(())
        }
        ClientCommand::End { code } => {
            let handle = resolve(state, &code)?;
            {
                let mut session = handle.lock().await;
                let events = session_service::handle_end(&mut session, connection_id)?;
                dispatch(state, &session, Some(requester), events);
                info!(code = %handle.code(), "game ended by host");
            }
            // The terminal phase is already visible to any in-flight timer
            // callback; aborting the runner just stops its pending sleeps.
            handle.cancel_runner();
            Ok(())
        }
        ClientCommand::SubmitAnswer {
            code,
            selected_option_index,
            elapsed_seconds,
        } => {
            let handle = resolve(state, &code)?;
            let mut session = handle.lock().await;
            let events = session_service::handle_submit_answer(
                &mut session,
                connection_id,
                selected_option_index,
                elapsed_seconds,
            )?;
            dispatch(state, &session, Some(requester), events);
            Ok(())
        }
        ClientCommand::RequestRoster { code } => {
            let handle = resolve(state, &code)?;
            let session = handle.lock().await;
            dispatch(
                state,
                &session,
                Some(requester),
                session_service::handle_request_roster(&session),
            );
            Ok(())
        }
        ClientCommand::RequestState { code } => {
            let handle = resolve(state, &code)?;
            let session = handle.lock().await;
            dispatch(
                state,
                &session,
                Some(requester),
                session_service::handle_request_state(&session),
            );
            Ok(())
        }
        ClientCommand::Unknown => Err(ServiceError::InvalidInput(
            "unknown command type".into(),
        )),
    }
}

/// Resolve an existing session for a non-join command.
fn resolve(state: &SharedState, code: &str) -> Result<Arc<SessionHandle>, ServiceError> {
    let code = SessionCode::parse(code)?;
    state
        .sessions()
        .get(&code)
        .ok_or_else(|| ServiceError::NotFound(format!("session `{code}` not found")))
}

/// Deliver a batch of engine events to their audiences.
///
/// Callers hold the session lock, so per-connection delivery order matches
/// the order session mutations occurred in.
pub fn dispatch(
    state: &SharedState,
    session: &GameSession,
    requester: Option<&mpsc::UnboundedSender<Message>>,
    events: Vec<Outbound>,
) {
    for Outbound { to, message } in events {
        match to {
            Recipient::Requester => match requester {
                Some(tx) => send_message(tx, &message),
                None => warn!(code = %session.code, "requester-scoped event with no requester"),
            },
            Recipient::Session => {
                for participant in session.participants.values() {
                    send_to_connection(state, participant.connection_id, &message);
                }
            }
            Recipient::Hosts => {
                for host in session.hosts() {
                    send_to_connection(state, host.connection_id, &message);
                }
            }
        }
    }
}

fn send_to_connection(state: &SharedState, connection_id: Uuid, message: &ServerMessage) {
    if let Some(connection) = state.connections().get(&connection_id) {
        send_message(&connection.tx, message);
    }
}

/// Serialize an event and push it onto a connection's writer channel.
///
/// A closed channel means the peer is going away; its disconnect cleanup
/// prunes the roster, so the send error is ignored here.
fn send_message(tx: &mpsc::UnboundedSender<Message>, message: &ServerMessage) {
    match serde_json::to_string(message) {
        Ok(payload) => {
            let _ = tx.send(Message::Text(payload.into()));
        }
        Err(err) => warn!(error = %err, "failed to serialize outbound event"),
    }
}

/// Ensure the writer task winds down before we return from the socket handler.
async fn finalize(writer_task: JoinHandle<()>, outbound_tx: mpsc::UnboundedSender<Message>) {
    drop(outbound_tx);
    let _ = writer_task.await;
}
