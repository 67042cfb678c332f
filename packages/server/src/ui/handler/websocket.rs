//! WebSocket connection handlers.

use std::sync::Arc;

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use tokio::sync::mpsc;

use crate::{
    domain::{CommentId, ConnectionId, JoinOutcome, RoomId, UserId, Username},
    infrastructure::dto::websocket::ClientEvent,
    ui::state::AppState,
};

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    // 接続時点では何も検証しない。ルームへの紐付けは join-room イベントで行う
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Spawns a task that drains the connection's channel and writes each message
/// to the WebSocket sender. Usecases push events into the channel via the
/// MessagePusher; this task is the only writer on the socket.
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<String>,
    mut sender: futures_util::stream::SplitSink<WebSocket, Message>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    })
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (sender, mut receiver) = socket.split();

    // Register this connection so usecases can push events to it
    let connection_id = ConnectionId::generate();
    let (tx, rx) = mpsc::unbounded_channel();
    state
        .message_pusher
        .register(connection_id.clone(), tx)
        .await;
    tracing::info!("Connection '{}' opened", connection_id.as_str());

    let mut send_task = pusher_loop(rx, sender);

    // The room/user this connection is bound to after a successful join-room
    let mut binding: Option<(RoomId, UserId)> = None;

    loop {
        tokio::select! {
            msg = receiver.next() => {
                let msg = match msg {
                    Some(Ok(msg)) => msg,
                    Some(Err(e)) => {
                        tracing::warn!(
                            "WebSocket error on '{}': {}",
                            connection_id.as_str(),
                            e
                        );
                        break;
                    }
                    None => break,
                };

                match msg {
                    Message::Text(text) => {
                        let event = match serde_json::from_str::<ClientEvent>(&text) {
                            Ok(event) => event,
                            Err(e) => {
                                tracing::warn!("Failed to parse client event: {}", e);
                                continue;
                            }
                        };
                        dispatch(&state, &connection_id, &mut binding, event).await;
                    }
                    Message::Ping(_) => {
                        tracing::debug!("Received ping");
                        // Ping/pong is handled automatically by the WebSocket protocol
                    }
                    Message::Close(_) => {
                        tracing::info!(
                            "Connection '{}' requested close",
                            connection_id.as_str()
                        );
                        break;
                    }
                    _ => {}
                }
            }
            // 送信タスクが死んだら（クライアント側のソースが閉じた）受信も終える
            _ = &mut send_task => break,
        }
    }

    send_task.abort();
    state.message_pusher.unregister(&connection_id).await;

    // ルームに参加していた接続なら、猶予タイマー経由の退出をスケジュールする。
    // 明示的に leave-room 済みの場合は binding が外れているので何もしない
    if let Some((room_id, user_id)) = binding {
        tracing::info!(
            "Connection for '{}' in room '{}' lost; scheduling removal",
            user_id.as_str(),
            room_id.as_str()
        );
        state
            .disconnect_usecase
            .execute(room_id, user_id, connection_id)
            .await;
    } else {
        tracing::info!("Connection '{}' closed", connection_id.as_str());
    }
}

/// 受信イベントを対応するユースケースへ振り分ける
async fn dispatch(
    state: &Arc<AppState>,
    connection_id: &ConnectionId,
    binding: &mut Option<(RoomId, UserId)>,
    event: ClientEvent,
) {
    match event {
        ClientEvent::JoinRoom {
            room_id,
            user_id,
            username,
        } => {
            // 別のルーム・ユーザに束縛済みの接続からの join-room は受け付けない。
            // 同じ束縛への再送は再接続扱いで通す
            if let Some((bound_room, bound_user)) = &*binding {
                if bound_room.as_str() != room_id || bound_user.as_str() != user_id {
                    tracing::warn!(
                        "Connection '{}' is already bound to room '{}'; dropping join-room",
                        connection_id.as_str(),
                        bound_room.as_str()
                    );
                    return;
                }
            }

            // String -> 値オブジェクトへの変換（検証込み）
            let converted = (
                RoomId::try_from(room_id),
                UserId::try_from(user_id),
                Username::try_from(username),
            );
            let (Ok(room_id), Ok(user_id), Ok(username)) = converted else {
                tracing::warn!("Dropping join-room with malformed identifiers");
                return;
            };

            let outcome = state
                .join_room_usecase
                .execute(
                    room_id.clone(),
                    user_id.clone(),
                    username,
                    connection_id.clone(),
                )
                .await;

            if matches!(outcome, JoinOutcome::Denied { .. }) {
                tracing::info!(
                    "User '{}' denied entry to room '{}'",
                    user_id.as_str(),
                    room_id.as_str()
                );
            } else {
                *binding = Some((room_id, user_id));
            }
        }
        ClientEvent::LeaveRoom { room_id, user_id } => {
            let Some((room, user)) = verify_binding(binding, &room_id, Some(&user_id)) else {
                return;
            };
            let (room, user) = (room.clone(), user.clone());
            if let Err(e) = state.leave_room_usecase.execute(&room, &user).await {
                tracing::warn!("Failed to leave room: {}", e);
            }
            // 明示的な退出なので、ソケットが閉じても猶予タイマーは不要
            *binding = None;
        }
        ClientEvent::CodeChange { room_id, code } => {
            let Some((room, user)) = verify_binding(binding, &room_id, None) else {
                return;
            };
            if let Err(e) = state
                .sync_document_usecase
                .update_code(room, user, code)
                .await
            {
                tracing::warn!("Failed to update code: {}", e);
            }
        }
        ClientEvent::LanguageChange {
            room_id,
            language,
            user_id,
        } => {
            let Some((room, user)) = verify_binding(binding, &room_id, Some(&user_id)) else {
                return;
            };
            if let Err(e) = state
                .sync_document_usecase
                .update_language(room, user, language)
                .await
            {
                tracing::warn!("Failed to update language: {}", e);
            }
        }
        ClientEvent::RunCode {
            room_id,
            code,
            language,
            input,
            user_id,
        } => {
            let Some((room, user)) = verify_binding(binding, &room_id, Some(&user_id)) else {
                return;
            };
            // 実行プロバイダの応答には数秒かかり得るため、受信ループを塞がない
            let usecase = state.run_code_usecase.clone();
            let (room, user) = (room.clone(), user.clone());
            tokio::spawn(async move {
                if let Err(e) = usecase.execute(&room, &user, code, language, input).await {
                    tracing::warn!("Failed to run code: {}", e);
                }
            });
        }
        ClientEvent::CursorUpdate {
            room_id,
            user_id,
            position,
            selection,
        } => {
            let Some((room, user)) = verify_binding(binding, &room_id, Some(&user_id)) else {
                return;
            };
            if let Err(e) = state
                .cursor_relay_usecase
                .execute(room, user, position, selection)
                .await
            {
                tracing::warn!("Failed to relay cursor: {}", e);
            }
        }
        ClientEvent::TransferHost {
            room_id,
            new_host_id,
            user_id,
        } => {
            let Some((room, user)) = verify_binding(binding, &room_id, Some(&user_id)) else {
                return;
            };
            let Ok(new_host) = UserId::try_from(new_host_id) else {
                tracing::warn!("Dropping transfer-host with malformed user id");
                return;
            };
            if let Err(e) = state
                .transfer_host_usecase
                .execute(room, user, &new_host)
                .await
            {
                tracing::warn!("Failed to transfer host: {}", e);
            }
        }
        ClientEvent::KickUser {
            room_id,
            target_user_id,
            user_id,
        } => {
            let Some((room, user)) = verify_binding(binding, &room_id, Some(&user_id)) else {
                return;
            };
            let Ok(target) = UserId::try_from(target_user_id) else {
                tracing::warn!("Dropping kick-user with malformed user id");
                return;
            };
            if let Err(e) = state.kick_user_usecase.execute(room, user, &target).await {
                tracing::warn!("Failed to kick user: {}", e);
            }
        }
        ClientEvent::CommentAdd {
            room_id,
            line_number,
            message,
        } => {
            let Some((room, user)) = verify_binding(binding, &room_id, None) else {
                return;
            };
            if let Err(e) = state
                .comment_usecase
                .add(room, user, line_number, message)
                .await
            {
                tracing::warn!("Failed to add comment: {}", e);
            }
        }
        ClientEvent::CommentReply {
            room_id,
            comment_id,
            message,
        } => {
            let Some((room, user)) = verify_binding(binding, &room_id, None) else {
                return;
            };
            let Ok(comment_id) = CommentId::try_from(comment_id) else {
                tracing::warn!("Dropping comment:reply with malformed comment id");
                return;
            };
            if let Err(e) = state
                .comment_usecase
                .reply(room, user, &comment_id, message)
                .await
            {
                tracing::warn!("Failed to reply to comment: {}", e);
            }
        }
        ClientEvent::CommentResolve {
            room_id,
            comment_id,
        } => {
            let Some((room, user)) = verify_binding(binding, &room_id, None) else {
                return;
            };
            let Ok(comment_id) = CommentId::try_from(comment_id) else {
                tracing::warn!("Dropping comment:resolve with malformed comment id");
                return;
            };
            if let Err(e) = state
                .comment_usecase
                .set_resolved(room, user, &comment_id, true)
                .await
            {
                tracing::warn!("Failed to resolve comment: {}", e);
            }
        }
        ClientEvent::CommentUnresolve {
            room_id,
            comment_id,
        } => {
            let Some((room, user)) = verify_binding(binding, &room_id, None) else {
                return;
            };
            let Ok(comment_id) = CommentId::try_from(comment_id) else {
                tracing::warn!("Dropping comment:unresolve with malformed comment id");
                return;
            };
            if let Err(e) = state
                .comment_usecase
                .set_resolved(room, user, &comment_id, false)
                .await
            {
                tracing::warn!("Failed to unresolve comment: {}", e);
            }
        }
    }
}

/// ペイロードの roomId（および userId の申告があればそれも）が
/// この接続の束縛と一致するかを検証する。join-room を経ていない接続や
/// 別人を騙るペイロードはここで落とす
fn verify_binding<'a>(
    binding: &'a Option<(RoomId, UserId)>,
    room_id: &str,
    claimed_user: Option<&str>,
) -> Option<(&'a RoomId, &'a UserId)> {
    match binding {
        Some((bound_room, bound_user))
            if bound_room.as_str() == room_id
                && claimed_user.is_none_or(|u| u == bound_user.as_str()) =>
        {
            Some((bound_room, bound_user))
        }
        _ => {
            tracing::warn!(
                "Dropping event for room '{}': connection not bound to it",
                room_id
            );
            None
        }
    }
}
