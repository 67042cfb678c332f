//! WebSocket client session management.

use std::io::Write;
use std::sync::{Arc, Mutex};

use futures_util::{SinkExt, StreamExt};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message};

use kobo_server::domain::Language;
use kobo_server::infrastructure::dto::websocket::{ClientEvent, CursorPosition, ServerEvent};

use crate::command::{Command, USAGE, parse_command};
use crate::error::ClientError;
use crate::formatter::EventFormatter;

/// Connection parameters for one client session
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// WebSocket endpoint, e.g. `ws://127.0.0.1:8080/ws`
    pub url: String,
    pub room_id: String,
    pub user_id: String,
    pub username: String,
}

/// Client-side copy of the shared document.
///
/// Kept in sync from inbound updates and local edits so that `/run` can
/// send the current code and language. The server does not echo updates
/// back to their author, so local edits must be applied here directly.
#[derive(Debug, Default)]
struct DocumentState {
    code: String,
    language: Language,
}

/// Redisplay the prompt after printing an event
fn redisplay_prompt(user_id: &str) {
    print!("{}> ", user_id);
    std::io::stdout().flush().ok();
}

/// Run one WebSocket session: connect, join the room, then pump inbound
/// events and REPL commands until the connection ends.
///
/// # Returns
///
/// `Ok(())` on a deliberate exit (`/leave`, Ctrl+C, Ctrl+D). Errors carry
/// the reason the session ended; the runner decides whether to reconnect.
pub async fn run_client_session(config: &SessionConfig) -> Result<(), ClientError> {
    let (ws_stream, _response) = connect_async(&config.url)
        .await
        .map_err(|e| ClientError::ConnectionError(e.to_string()))?;

    tracing::info!("Connected to {}", config.url);

    let (mut write, mut read) = ws_stream.split();

    // 接続できたらまず join-room を送る。これでこの接続がルームとユーザに
    // 紐付き、以降のイベントが届くようになる。
    let join_event = ClientEvent::JoinRoom {
        room_id: config.room_id.clone(),
        user_id: config.user_id.clone(),
        username: config.username.clone(),
    };
    let join_json = serde_json::to_string(&join_event)
        .map_err(|e| ClientError::ConnectionError(e.to_string()))?;
    write
        .send(Message::Text(join_json.into()))
        .await
        .map_err(|e| ClientError::ConnectionError(e.to_string()))?;

    println!(
        "\nJoining room '{}' as '{}'. Type /help for commands. Press Ctrl+C to exit.\n",
        config.room_id, config.user_id
    );

    let state = Arc::new(Mutex::new(DocumentState::default()));

    // Read task: render inbound events, keep the local document in sync,
    // and stop on a fatal notice (join-denied / kicked).
    let user_id_for_read = config.user_id.clone();
    let state_for_read = state.clone();
    let mut read_task = tokio::spawn(async move {
        while let Some(message) = read.next().await {
            match message {
                Ok(Message::Text(text)) => {
                    let event = match serde_json::from_str::<ServerEvent>(&text) {
                        Ok(event) => event,
                        Err(_) => {
                            print!("{}", EventFormatter::format_raw(&text));
                            redisplay_prompt(&user_id_for_read);
                            continue;
                        }
                    };

                    match &event {
                        ServerEvent::RoomJoined { code, language, .. } => {
                            let mut doc = state_for_read.lock().unwrap();
                            doc.code = code.clone();
                            doc.language = *language;
                        }
                        ServerEvent::CodeUpdate { code } => {
                            state_for_read.lock().unwrap().code = code.clone();
                        }
                        ServerEvent::LanguageUpdate { language } => {
                            state_for_read.lock().unwrap().language = *language;
                        }
                        _ => {}
                    }

                    if let Some(formatted) =
                        EventFormatter::format_event(&event, &user_id_for_read)
                    {
                        print!("{}", formatted);
                        redisplay_prompt(&user_id_for_read);
                    }

                    match event {
                        ServerEvent::JoinDenied { reason } => {
                            return ClientError::JoinDenied(reason);
                        }
                        ServerEvent::Kicked { reason, .. } => {
                            return ClientError::Kicked(reason);
                        }
                        _ => {}
                    }
                }
                Ok(Message::Close(_)) => {
                    tracing::info!("Server closed the connection");
                    break;
                }
                Err(e) => {
                    tracing::warn!("WebSocket read error: {}", e);
                    break;
                }
                _ => {}
            }
        }

        ClientError::ConnectionError("Connection lost".to_string())
    });

    // Spawn a blocking thread for rustyline (synchronous readline)
    let (input_tx, mut input_rx) = mpsc::unbounded_channel::<String>();
    let prompt_user_id = config.user_id.clone();
    let _readline_handle = std::thread::spawn(move || {
        let mut rl = match DefaultEditor::new() {
            Ok(rl) => rl,
            Err(e) => {
                eprintln!("Failed to initialize readline: {}", e);
                return;
            }
        };

        let prompt = format!("{}> ", prompt_user_id);

        loop {
            match rl.readline(&prompt) {
                Ok(line) => {
                    let line = line.trim();
                    if !line.is_empty() {
                        rl.add_history_entry(line).ok();
                        if input_tx.send(line.to_string()).is_err() {
                            // Channel closed, exit thread
                            break;
                        }
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    // Ctrl+C
                    tracing::info!("Interrupted");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    // Ctrl+D
                    tracing::info!("EOF");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {}", err);
                    break;
                }
            }
        }
    });

    // Write task: turn REPL commands into events and send them.
    let room_id = config.room_id.clone();
    let user_id = config.user_id.clone();
    let state_for_write = state.clone();
    let mut write_task = tokio::spawn(async move {
        let mut write_error = false;

        while let Some(line) = input_rx.recv().await {
            let command = match parse_command(&line) {
                Ok(command) => command,
                Err(message) => {
                    println!("{}", message);
                    redisplay_prompt(&user_id);
                    continue;
                }
            };

            let mut leaving = false;
            let event = match command {
                Command::Help => {
                    print!("{}", USAGE);
                    redisplay_prompt(&user_id);
                    continue;
                }
                Command::Code(code) => {
                    // 自分の編集はサーバから返ってこないため、ローカルにも反映する
                    state_for_write.lock().unwrap().code = code.clone();
                    ClientEvent::CodeChange {
                        room_id: room_id.clone(),
                        code,
                    }
                }
                Command::Lang(language) => {
                    state_for_write.lock().unwrap().language = language;
                    ClientEvent::LanguageChange {
                        room_id: room_id.clone(),
                        language,
                        user_id: user_id.clone(),
                    }
                }
                Command::Run(input) => {
                    let (code, language) = {
                        let doc = state_for_write.lock().unwrap();
                        (doc.code.clone(), doc.language)
                    };
                    ClientEvent::RunCode {
                        room_id: room_id.clone(),
                        code,
                        language,
                        input,
                        user_id: user_id.clone(),
                    }
                }
                Command::Cursor(line_number, column) => ClientEvent::CursorUpdate {
                    room_id: room_id.clone(),
                    user_id: user_id.clone(),
                    position: Some(CursorPosition {
                        line_number,
                        column,
                    }),
                    selection: None,
                },
                Command::Comment(line_number, message) => ClientEvent::CommentAdd {
                    room_id: room_id.clone(),
                    line_number,
                    message,
                },
                Command::Reply(comment_id, message) => ClientEvent::CommentReply {
                    room_id: room_id.clone(),
                    comment_id,
                    message,
                },
                Command::Resolve(comment_id) => ClientEvent::CommentResolve {
                    room_id: room_id.clone(),
                    comment_id,
                },
                Command::Unresolve(comment_id) => ClientEvent::CommentUnresolve {
                    room_id: room_id.clone(),
                    comment_id,
                },
                Command::Transfer(new_host_id) => ClientEvent::TransferHost {
                    room_id: room_id.clone(),
                    new_host_id,
                    user_id: user_id.clone(),
                },
                Command::Kick(target_user_id) => ClientEvent::KickUser {
                    room_id: room_id.clone(),
                    target_user_id,
                    user_id: user_id.clone(),
                },
                Command::Leave => {
                    leaving = true;
                    ClientEvent::LeaveRoom {
                        room_id: room_id.clone(),
                        user_id: user_id.clone(),
                    }
                }
            };

            let json = match serde_json::to_string(&event) {
                Ok(json) => json,
                Err(e) => {
                    tracing::error!("Failed to serialize event: {}", e);
                    continue;
                }
            };

            if let Err(e) = write.send(Message::Text(json.into())).await {
                tracing::warn!("Failed to send event: {}", e);
                write_error = true;
                break;
            }

            if leaving {
                println!("Left room '{}'", room_id);
                break;
            }
        }

        write_error
    });

    // If any one of the tasks completes, abort the other
    tokio::select! {
        read_result = &mut read_task => {
            write_task.abort();
            match read_result {
                Ok(error) => Err(error),
                Err(_) => Err(ClientError::ConnectionError("Connection lost".to_string())),
            }
        }
        write_result = &mut write_task => {
            read_task.abort();
            if write_result.unwrap_or(true) {
                Err(ClientError::ConnectionError("Connection lost".to_string()))
            } else {
                Ok(())
            }
        }
    }
}
