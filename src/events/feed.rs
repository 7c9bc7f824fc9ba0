use anyhow::{Context, Result};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use url::Url;

use super::{PushEvent, decode_frame};

/// Buffered events before the websocket reader applies backpressure.
const FEED_CAPACITY: usize = 256;

/// Websocket endpoint for a Socket.IO server rooted at `base`.
///
/// `http://host:5000` becomes `ws://host:5000/socket.io/?EIO=4&transport=websocket`.
/// URLs that already use `ws`/`wss` are returned unchanged.
pub fn socket_io_url(base: &str) -> Result<Url> {
    let mut url = Url::parse(base).with_context(|| format!("Invalid events URL: {}", base))?;
    let scheme = match url.scheme() {
        "ws" | "wss" => return Ok(url),
        "http" => "ws",
        "https" => "wss",
        other => anyhow::bail!("Unsupported events URL scheme '{}'", other),
    };
    url.set_scheme(scheme)
        .map_err(|_| anyhow::anyhow!("Cannot convert {} to a websocket URL", base))?;
    url.set_path("/socket.io/");
    url.set_query(Some("EIO=4&transport=websocket"));
    Ok(url)
}

/// Live push-event subscription.
///
/// Events are delivered in the order the server sent them. A dropped or
/// failed connection ends the stream with a single `Disconnected` event;
/// there is no reconnect.
pub struct EventFeed;

impl EventFeed {
    /// Connect and spawn the reader task. The returned receiver closes when
    /// the connection ends.
    pub async fn connect(url: &Url) -> Result<mpsc::Receiver<PushEvent>> {
        let (ws, _) = connect_async(url.as_str())
            .await
            .with_context(|| format!("Failed to connect to event stream at {}", url))?;
        tracing::info!(%url, "event stream connected");

        let (tx, rx) = mpsc::channel(FEED_CAPACITY);
        tokio::spawn(async move {
            let (mut sink, mut stream) = ws.split();
            let reason = loop {
                let Some(frame) = stream.next().await else {
                    break "Disconnected from server".to_string();
                };
                let text = match frame {
                    Ok(Message::Text(text)) => text,
                    Ok(Message::Close(_)) => break "Disconnected from server".to_string(),
                    Ok(_) => continue,
                    Err(e) => break format!("Event stream error: {}", e),
                };

                // Engine.IO handshake and keepalive.
                if text.starts_with('0') {
                    if sink.send(Message::Text("40".to_string())).await.is_err() {
                        break "Failed to join event namespace".to_string();
                    }
                    continue;
                }
                if text == "2" {
                    if sink.send(Message::Text("3".to_string())).await.is_err() {
                        break "Failed to answer keepalive".to_string();
                    }
                    continue;
                }
                if text.starts_with("40") {
                    if tx.send(PushEvent::connected()).await.is_err() {
                        return;
                    }
                    continue;
                }
                if text.starts_with("41") {
                    break "Disconnected from server".to_string();
                }

                match decode_frame(&text) {
                    Some(event) => {
                        if tx.send(event).await.is_err() {
                            // Receiver gone: the run finished.
                            let _ = sink.close().await;
                            return;
                        }
                    }
                    None => tracing::trace!(frame = %text, "ignoring event frame"),
                }
            };
            tracing::info!(%reason, "event stream closed");
            let _ = tx.send(PushEvent::disconnected(reason)).await;
        });

        Ok(rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_socket_io_url_from_http() {
        let url = socket_io_url("http://localhost:5000").unwrap();
        assert_eq!(
            url.as_str(),
            "ws://localhost:5000/socket.io/?EIO=4&transport=websocket"
        );
    }

    #[test]
    fn test_socket_io_url_from_https() {
        let url = socket_io_url("https://kollab.example.com/").unwrap();
        assert_eq!(url.scheme(), "wss");
        assert_eq!(url.path(), "/socket.io/");
    }

    #[test]
    fn test_socket_io_url_keeps_ws() {
        let url = socket_io_url("ws://127.0.0.1:9000/events").unwrap();
        assert_eq!(url.as_str(), "ws://127.0.0.1:9000/events");
    }

    #[test]
    fn test_socket_io_url_rejects_other_schemes() {
        assert!(socket_io_url("ftp://host").is_err());
        assert!(socket_io_url("not a url").is_err());
    }
}
