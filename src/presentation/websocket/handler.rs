//! WebSocket Connection Handler
//!
//! Authenticates the upgrade, then runs one session: HELLO, READY, a reader
//! loop for client opcodes and a writer task that numbers dispatches.

use std::time::Duration;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        Query, State, WebSocketUpgrade,
    },
    response::Response,
};
use axum_extra::extract::CookieJar;
use futures::{SinkExt, StreamExt};
use serde::de::DeserializeOwned;
use tokio::sync::mpsc;
use tokio::time::interval;
use uuid::Uuid;

use super::messages::{GatewayReceive, GatewaySend, OpCode};
use super::session::{Sequence, SessionState, HEARTBEAT_GRACE};
use crate::application::dto::event::{
    ActivityUpdateCommand, ErrorEvent, ReadyEvent, SendMessageCommand, TypingCommand,
    UserTypingEvent,
};
use crate::application::dto::request::GatewayConnectQuery;
use crate::application::dto::RealtimeEvent;
use crate::application::services::Notifier;
use crate::domain::RegisteredUser;
use crate::infrastructure::metrics;
use crate::shared::error::{AppError, ErrorResponse};
use crate::startup::AppState;

/// WebSocket upgrade handler
///
/// The token comes from `?token=` or the auth cookie; the upgrade is refused
/// with 401 when neither authenticates an active user.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(query): Query<GatewayConnectQuery>,
    jar: CookieJar,
) -> Result<Response, AppError> {
    let token = query
        .token
        .filter(|t| !t.is_empty())
        .or_else(|| {
            jar.get(&state.settings.auth.cookie_name)
                .map(|c| c.value().to_string())
        })
        .ok_or_else(|| AppError::Unauthorized("Not authenticated".into()))?;

    let user = state.auth.authenticate(&token).await?;

    let limits = &state.settings.websocket;
    Ok(ws
        .max_message_size(limits.max_message_size)
        .max_frame_size(limits.max_frame_size)
        .on_upgrade(move |socket| handle_socket(socket, state, user)))
}

/// Handle individual WebSocket connection
async fn handle_socket(socket: WebSocket, state: AppState, user: RegisteredUser) {
    let session_id = Uuid::new_v4().to_string();
    let mut session_state = SessionState::new(session_id.clone(), user);
    let user_id = session_state.user_id();

    tracing::debug!(session_id = %session_id, user_id, "New WebSocket connection");

    // Split socket for concurrent read/write
    let (mut sender, mut receiver) = socket.split();

    // Create channel for outgoing messages
    let (tx, mut rx) = mpsc::unbounded_channel::<GatewaySend>();

    // Forward queued frames to the socket, numbering dispatches
    let sender_task = tokio::spawn(async move {
        let mut sequence = Sequence::default();
        while let Some(mut msg) = rx.recv().await {
            if msg.is_dispatch() {
                msg.s = Some(sequence.next());
            }
            let text = match serde_json::to_string(&msg) {
                Ok(t) => t,
                Err(e) => {
                    tracing::error!("Failed to serialize message: {}", e);
                    continue;
                }
            };
            if sender.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    let heartbeat_interval_ms = state.gateway.heartbeat_interval();
    let ready = RealtimeEvent::Ready(ReadyEvent {
        session_id: session_id.clone(),
        user: session_state.user.clone().into(),
    });
    if tx.send(GatewaySend::hello(heartbeat_interval_ms)).is_err()
        || tx.send(GatewaySend::dispatch(&ready)).is_err()
    {
        sender_task.abort();
        return;
    }

    if state
        .gateway
        .register_session(session_id.clone(), user_id, tx.clone())
    {
        state.status.user_connected(user_id).await;
    }

    tracing::info!(user_id, session_id = %session_id, "User connected");

    let timeout = Duration::from_millis(heartbeat_interval_ms) + HEARTBEAT_GRACE;
    let mut heartbeat_check = interval(timeout);
    heartbeat_check.tick().await; // Skip first immediate tick

    // Main message loop
    loop {
        tokio::select! {
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        if let Err(e) = handle_message(&text, &mut session_state, &tx, &state).await {
                            tracing::debug!(
                                session_id = %session_id,
                                error = %e,
                                "Error handling message"
                            );
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        tracing::debug!(session_id = %session_id, "Connection closed");
                        break;
                    }
                    Some(Err(e)) => {
                        tracing::debug!(session_id = %session_id, error = %e, "WebSocket error");
                        break;
                    }
                    // Pings are answered by axum
                    _ => {}
                }
            }

            _ = heartbeat_check.tick() => {
                if !session_state.is_alive(timeout) {
                    tracing::info!(
                        session_id = %session_id,
                        "Heartbeat timeout, closing connection"
                    );
                    break;
                }
            }
        }
    }

    // Cleanup
    if let Some((user_id, true)) = state.gateway.unregister_session(&session_id) {
        state.status.user_disconnected(user_id).await;
    }
    sender_task.abort();

    tracing::info!(user_id, session_id = %session_id, "User disconnected");
}

/// Handle incoming WebSocket message
async fn handle_message(
    text: &str,
    session_state: &mut SessionState,
    tx: &mpsc::UnboundedSender<GatewaySend>,
    state: &AppState,
) -> Result<(), String> {
    let frame: GatewayReceive =
        serde_json::from_str(text).map_err(|e| format!("Invalid frame: {}", e))?;

    match OpCode::from_client(frame.op) {
        Some(OpCode::Heartbeat) => {
            session_state.heartbeat();
            let _ = tx.send(GatewaySend::heartbeat_ack());
            tracing::trace!(session_id = %session_state.session_id, "Heartbeat received");
        }

        Some(OpCode::SendMessage) => {
            let command = match parse_payload::<SendMessageCommand>(frame.d) {
                Ok(command) => command,
                Err(e) => {
                    reply(tx, RealtimeEvent::error("Invalid message payload"));
                    return Err(e);
                }
            };
            send_message(command, session_state, tx, state).await;
        }

        Some(OpCode::Typing) => {
            let command = parse_payload::<TypingCommand>(frame.d)?;
            if state.gateway.is_online(command.friend_user_id) {
                state.gateway.notify_user(
                    command.friend_user_id,
                    RealtimeEvent::UserTyping(UserTypingEvent {
                        user_id: session_state.user_id(),
                        nickname: session_state.user.nickname.clone(),
                    }),
                );
            }
        }

        Some(OpCode::ActivityUpdate) => {
            let command = match frame.d {
                Some(d) => serde_json::from_value::<ActivityUpdateCommand>(d)
                    .map_err(|e| format!("Invalid activity payload: {}", e))?,
                None => ActivityUpdateCommand::default(),
            };
            state
                .status
                .set_activity(session_state.user_id(), command.game_name)
                .await;
        }

        _ => {
            tracing::debug!(
                session_id = %session_state.session_id,
                op = frame.op,
                "Unknown opcode"
            );
        }
    }

    Ok(())
}

/// Persist a message and fan it out to both members.
async fn send_message(
    command: SendMessageCommand,
    session_state: &SessionState,
    tx: &mpsc::UnboundedSender<GatewaySend>,
    state: &AppState,
) {
    let result = state
        .chat
        .process_send_message(
            session_state.user_id(),
            command.friend_user_id,
            command.content,
            command.image_path,
        )
        .await;

    let sent = match result {
        Ok(sent) => sent,
        Err(e) => {
            tracing::debug!(
                session_id = %session_state.session_id,
                error = %e,
                "Message rejected"
            );
            reply(tx, error_event(&e));
            return;
        }
    };

    metrics::record_chat_message(
        sent.message.content.is_some(),
        sent.message.image_path.is_some(),
    );

    let gateway = &state.gateway;
    gateway.notify_user(sent.sender.id, RealtimeEvent::Message(sent.view(true)));
    gateway.notify_user(sent.recipient.id, RealtimeEvent::Message(sent.view(false)));
    for member in [sent.sender.id, sent.recipient.id] {
        gateway.notify_user(
            member,
            RealtimeEvent::ConversationUpdated(sent.conversation_update(member)),
        );
    }
}

fn parse_payload<T: DeserializeOwned>(d: Option<serde_json::Value>) -> Result<T, String> {
    let d = d.ok_or("Missing payload")?;
    serde_json::from_value(d).map_err(|e| format!("Invalid payload: {}", e))
}

/// Queue a dispatch on this session only.
fn reply(tx: &mpsc::UnboundedSender<GatewaySend>, event: RealtimeEvent) {
    let _ = tx.send(GatewaySend::dispatch(&event));
}

fn error_event(err: &AppError) -> RealtimeEvent {
    let body = ErrorResponse::from(err);
    RealtimeEvent::Error(ErrorEvent {
        message: body.message,
        details: body.details,
    })
}
