//! DevTools WebSocket transport
//!
//! Attaches to one page target over its remote-debugging WebSocket and
//! forwards protocol events on the event channel.
//!
//! Architecture:
//! ```text
//! Target ──ws://host:port/devtools/page/<id>──► reader task ──► TransportEvent channel
//! ```

use super::{ConnectionId, TargetId, Transport, TransportEvent};
use crate::error::{CaptureError, Result};
use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Target-side notice that the debugging session ended
const INSPECTOR_DETACHED: &str = "Inspector.detached";

/// Live connection to the attached target
struct Connection {
    target: TargetId,
    id: ConnectionId,
    sink: SplitSink<WsStream, Message>,
    reader: JoinHandle<()>,
}

/// WebSocket transport for DevTools page targets
///
/// Bare target ids resolve to `ws://<host>:<port>/devtools/page/<id>`;
/// ids that already are `ws://` or `wss://` URLs are used as-is.
///
/// # Example
///
/// ```ignore
/// let (events_tx, events_rx) = mpsc::channel(CHANNEL_CAPACITY);
/// let transport = CdpTransport::new("127.0.0.1", 9222, events_tx);
/// transport.attach(&TargetId::new("4F2A...")).await?;
/// ```
pub struct CdpTransport {
    host: String,
    port: u16,
    events: mpsc::Sender<TransportEvent>,
    connection: Mutex<Option<Connection>>,
    next_id: AtomicU64,
    next_connection: AtomicU64,
}

impl CdpTransport {
    pub fn new(host: impl Into<String>, port: u16, events: mpsc::Sender<TransportEvent>) -> Self {
        Self {
            host: host.into(),
            port,
            events,
            connection: Mutex::new(None),
            next_id: AtomicU64::new(1),
            next_connection: AtomicU64::new(1),
        }
    }

    /// WebSocket URL of a target
    pub fn endpoint(&self, target: &TargetId) -> String {
        let id = target.as_str();
        if id.starts_with("ws://") || id.starts_with("wss://") {
            id.to_string()
        } else {
            format!("ws://{}:{}/devtools/page/{}", self.host, self.port, id)
        }
    }

    fn command(&self, method: &str) -> Message {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        Message::Text(json!({ "id": id, "method": method }).to_string().into())
    }
}

#[async_trait]
impl Transport for CdpTransport {
    async fn attach(&self, target: &TargetId) -> Result<ConnectionId> {
        let url = self.endpoint(target);
        let (ws, _) = connect_async(url.as_str())
            .await
            .map_err(|e| CaptureError::WebSocketConnect {
                url: url.clone(),
                source: Box::new(e),
            })?;

        let (mut sink, stream) = ws.split();

        // Console events only flow once the Runtime domain is enabled
        sink.send(self.command("Runtime.enable"))
            .await
            .map_err(|e| CaptureError::Attach {
                target: target.to_string(),
                reason: e.to_string(),
            })?;

        let id = ConnectionId::new(self.next_connection.fetch_add(1, Ordering::Relaxed));
        let reader = tokio::spawn(read_events(
            target.clone(),
            id,
            stream,
            self.events.clone(),
        ));

        let previous = self.connection.lock().replace(Connection {
            target: target.clone(),
            id,
            sink,
            reader,
        });
        if let Some(previous) = previous {
            previous.reader.abort();
        }

        info!("Attached to {} ({})", url, id);
        Ok(id)
    }

    async fn detach(&self, target: &TargetId) -> Result<()> {
        let connection = {
            let mut guard = self.connection.lock();
            let attached = guard.as_ref().is_some_and(|c| &c.target == target);
            if attached {
                guard.take()
            } else {
                None
            }
        };

        let Some(mut connection) = connection else {
            return Err(CaptureError::Transport {
                message: format!("not attached to {}", target),
            });
        };

        // Stop the reader first: an explicit detach is not an external one
        connection.reader.abort();
        debug!("Closing connection {} to {}", connection.id, target);
        connection
            .sink
            .close()
            .await
            .map_err(|e| CaptureError::Transport {
                message: e.to_string(),
            })
    }
}

/// Forward protocol events until the connection ends, then report why
async fn read_events(
    origin: TargetId,
    connection: ConnectionId,
    mut stream: SplitStream<WsStream>,
    events: mpsc::Sender<TransportEvent>,
) {
    let reason = loop {
        match stream.next().await {
            Some(Ok(Message::Text(text))) => {
                let Some((method, params)) = parse_event(text.as_str()) else {
                    // Command responses carry no method
                    continue;
                };

                if method == INSPECTOR_DETACHED {
                    break params
                        .get("reason")
                        .and_then(Value::as_str)
                        .unwrap_or("inspector detached")
                        .to_string();
                }

                let event = TransportEvent::Event {
                    origin: origin.clone(),
                    connection,
                    method,
                    params,
                };
                if events.send(event).await.is_err() {
                    // Nobody listens anymore
                    return;
                }
            }
            Some(Ok(Message::Close(frame))) => {
                break frame
                    .map(|f| f.reason.as_str().to_string())
                    .filter(|r| !r.is_empty())
                    .unwrap_or_else(|| "connection closed".to_string());
            }
            Some(Ok(_)) => {}
            Some(Err(e)) => break e.to_string(),
            None => break "connection closed".to_string(),
        }
    };

    debug!("Connection {} to {} ended: {}", connection, origin, reason);
    let _ = events
        .send(TransportEvent::Detached {
            origin,
            connection,
            reason,
        })
        .await;
}

/// `(method, params)` of an event message, `None` for anything else
fn parse_event(text: &str) -> Option<(String, Value)> {
    let mut message: Value = serde_json::from_str(text).ok()?;
    let method = message.get("method")?.as_str()?.to_string();
    let params = message
        .get_mut("params")
        .map(Value::take)
        .unwrap_or(Value::Null);
    Some((method, params))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transport() -> CdpTransport {
        let (tx, _rx) = mpsc::channel(1);
        CdpTransport::new("localhost", 9333, tx)
    }

    #[test]
    fn test_endpoint_for_bare_id() {
        assert_eq!(
            transport().endpoint(&TargetId::new("ABC123")),
            "ws://localhost:9333/devtools/page/ABC123"
        );
    }

    #[test]
    fn test_endpoint_for_url() {
        let url = "ws://10.0.0.2:9222/devtools/page/XYZ";
        assert_eq!(transport().endpoint(&TargetId::new(url)), url);
    }

    #[test]
    fn test_command_ids_increase() {
        let t = transport();
        let first = t.command("Runtime.enable");
        let second = t.command("Runtime.enable");

        let id = |m: Message| -> u64 {
            let text = m.into_text().unwrap();
            let v: Value = serde_json::from_str(text.as_str()).unwrap();
            v["id"].as_u64().unwrap()
        };
        assert_eq!(id(second), id(first) + 1);
    }

    #[test]
    fn test_parse_event() {
        let (method, params) = parse_event(
            r#"{"method":"Runtime.consoleAPICalled","params":{"type":"log","args":[]}}"#,
        )
        .unwrap();
        assert_eq!(method, "Runtime.consoleAPICalled");
        assert_eq!(params["type"], "log");
    }

    #[test]
    fn test_parse_event_ignores_responses() {
        assert!(parse_event(r#"{"id":1,"result":{}}"#).is_none());
        assert!(parse_event("not json").is_none());
    }

    #[test]
    fn test_parse_event_without_params() {
        let (method, params) = parse_event(r#"{"method":"Runtime.executionContextsCleared"}"#).unwrap();
        assert_eq!(method, "Runtime.executionContextsCleared");
        assert!(params.is_null());
    }

    #[tokio::test]
    async fn test_detach_when_not_attached() {
        let result = transport().detach(&TargetId::new("nope")).await;
        assert!(matches!(result, Err(CaptureError::Transport { .. })));
    }
}
