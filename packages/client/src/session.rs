//! WebSocket client session management.

use futures_util::{SinkExt, StreamExt};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message};

use parlor_server::infrastructure::dto::http::StatusDto;
use parlor_server::infrastructure::dto::websocket::{
    ClientEvent, JoinPayload, SendMessagePayload, ServerEvent,
};

use super::{error::ClientError, formatter::MessageFormatter, ui::redisplay_prompt};

/// Derive the HTTP base URL from the WebSocket URL.
///
/// `ws://host:port/ws` -> `http://host:port` (same for wss/https).
fn http_base_url(ws_url: &str) -> Result<String, ClientError> {
    let (scheme, rest) = if let Some(rest) = ws_url.strip_prefix("ws://") {
        ("http://", rest)
    } else if let Some(rest) = ws_url.strip_prefix("wss://") {
        ("https://", rest)
    } else {
        return Err(ClientError::InvalidUrl(ws_url.to_string()));
    };

    let authority = rest.split('/').next().unwrap_or(rest);
    Ok(format!("{}{}", scheme, authority))
}

/// Print the server status before connecting, if the endpoint answers.
async fn print_server_status(ws_url: &str) {
    let base_url = match http_base_url(ws_url) {
        Ok(url) => url,
        Err(e) => {
            tracing::debug!("{}", e);
            return;
        }
    };

    match reqwest::get(&base_url).await {
        Ok(response) => match response.json::<StatusDto>().await {
            Ok(status) => {
                println!(
                    "Server is {}: {} online, {} messages in history",
                    status.status, status.users, status.total_messages
                );
            }
            Err(e) => tracing::debug!("Could not parse server status: {}", e),
        },
        Err(e) => tracing::debug!("Status endpoint unavailable: {}", e),
    }
}

/// Run one WebSocket client session until the user exits or the
/// connection drops.
pub async fn run_client_session(
    url: &str,
    username: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    print_server_status(url).await;

    let (ws_stream, _response) = connect_async(url)
        .await
        .map_err(|e| ClientError::ConnectionError(e.to_string()))?;

    tracing::info!("Connected to chat server!");
    println!(
        "\nYou are '{}'. Type messages and press Enter to send. Press Ctrl+C to exit.\n",
        username
    );

    let (mut write, mut read) = ws_stream.split();

    // Join before anything else; the server ignores events from unjoined
    // connections.
    let join_event = ClientEvent::Join(JoinPayload {
        username: username.to_string(),
    });
    write
        .send(Message::Text(serde_json::to_string(&join_event)?.into()))
        .await
        .map_err(|e| ClientError::ConnectionError(e.to_string()))?;

    let username_for_read = username.to_string();

    // Task printing incoming events
    let mut read_task = tokio::spawn(async move {
        let mut connection_error = false;

        while let Some(message) = read.next().await {
            match message {
                Ok(Message::Text(text)) => {
                    match serde_json::from_str::<ServerEvent>(&text) {
                        Ok(event) => {
                            if let Some(formatted) =
                                MessageFormatter::format_event(&event, &username_for_read)
                            {
                                print!("{}", formatted);
                                redisplay_prompt(&username_for_read);
                            }
                        }
                        Err(_) => {
                            print!("{}", MessageFormatter::format_raw(&text));
                            redisplay_prompt(&username_for_read);
                        }
                    }
                }
                Ok(Message::Close(_)) => {
                    tracing::info!("Server closed the connection");
                    connection_error = true;
                    break;
                }
                Err(e) => {
                    tracing::warn!("WebSocket read error: {}", e);
                    connection_error = true;
                    break;
                }
                _ => {}
            }
        }

        connection_error
    });

    // Channel bridging the blocking readline thread into the async world
    let (input_tx, mut input_rx) = mpsc::unbounded_channel::<String>();

    let prompt_username = username.to_string();
    let _readline_handle = std::thread::spawn(move || {
        let mut rl = match DefaultEditor::new() {
            Ok(rl) => rl,
            Err(e) => {
                eprintln!("Failed to initialize readline: {}", e);
                return;
            }
        };

        let prompt = format!("{}> ", prompt_username);

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

    // Task forwarding input lines as sendMessage events
    let mut write_task = tokio::spawn(async move {
        while let Some(line) = input_rx.recv().await {
            let event = ClientEvent::SendMessage(SendMessagePayload { message: line });

            let json = match serde_json::to_string(&event) {
                Ok(json) => json,
                Err(e) => {
                    tracing::error!("Failed to serialize message: {}", e);
                    continue;
                }
            };

            if let Err(e) = write.send(Message::Text(json.into())).await {
                tracing::warn!("Failed to send message: {}", e);
                break;
            }
        }
    });

    // Whichever task ends first decides how the session went: the read
    // task ends on connection loss, the write task on user exit.
    tokio::select! {
        read_result = &mut read_task => {
            write_task.abort();
            if read_result.unwrap_or(true) {
                return Err(Box::new(ClientError::ConnectionError(
                    "connection to server lost".to_string(),
                )));
            }
        }
        _ = &mut write_task => {
            read_task.abort();
        }
    }

    Ok(())
}
