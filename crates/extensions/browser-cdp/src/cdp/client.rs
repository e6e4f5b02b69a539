//! CDP WebSocket client.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde_json::{Value, json};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, trace, warn};
use url::Url;

use super::error::CdpError;
use super::protocol::{BrowserVersion, CdpRequest, CdpResponse, PageInfo};
use super::session::PageSession;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;
type WsSource = SplitStream<WsStream>;
type PendingMap = HashMap<u64, oneshot::Sender<Result<Value, CdpError>>>;
type EventHandlers = HashMap<String, mpsc::UnboundedSender<CdpResponse>>;

/// Upper bound on any single command round trip.
const COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

/// The shared write half of the browser socket plus its in-flight requests.
///
/// Cloned into every [`PageSession`]; commands from all pages are multiplexed
/// over the one connection and told apart by request id.
#[derive(Clone)]
pub(crate) struct Channel {
    ws_tx: Arc<tokio::sync::Mutex<WsSink>>,
    request_id: Arc<AtomicU64>,
    pending: Arc<Mutex<PendingMap>>,
}

impl Channel {
    /// Send a command and wait for its response.
    pub(crate) async fn call(
        &self,
        method: &str,
        params: Option<Value>,
        session_id: Option<&str>,
    ) -> Result<Value, CdpError> {
        let id = self.request_id.fetch_add(1, Ordering::SeqCst);

        let request = CdpRequest {
            id,
            method: method.to_string(),
            params,
            session_id: session_id.map(|s| s.to_string()),
        };

        let json = serde_json::to_string(&request)?;
        trace!("CDP send: {}", json);

        let (tx, rx) = oneshot::channel();
        self.pending.lock().insert(id, tx);

        let sent = {
            let mut ws = self.ws_tx.lock().await;
            ws.send(Message::Text(json.into())).await
        };
        if let Err(e) = sent {
            self.pending.lock().remove(&id);
            return Err(e.into());
        }

        match tokio::time::timeout(COMMAND_TIMEOUT, rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(CdpError::SessionClosed),
            Err(_) => {
                self.pending.lock().remove(&id);
                Err(CdpError::Timeout(format!("Request {} timed out", method)))
            }
        }
    }
}

/// CDP client for one Chrome instance.
pub struct CdpClient {
    /// HTTP endpoint for page discovery.
    http_endpoint: Url,
    browser_ws_url: String,
    channel: Channel,
    event_handlers: Arc<Mutex<EventHandlers>>,
    connected: Arc<AtomicBool>,
    _recv_task: tokio::task::JoinHandle<()>,
}

impl CdpClient {
    /// Connect to Chrome at the given debugging endpoint,
    /// e.g. `http://localhost:9222`.
    pub async fn connect(endpoint: &str) -> Result<Self, CdpError> {
        let http_endpoint = Url::parse(endpoint)?;
        let version_url = http_endpoint.join("/json/version")?;
        debug!("Fetching browser version from {}", version_url);

        let version: BrowserVersion = reqwest::get(version_url.as_str())
            .await
            .map_err(|e| CdpError::ChromeNotAvailable(format!("{}: {}", endpoint, e)))?
            .json()
            .await
            .map_err(|e| CdpError::ChromeNotAvailable(format!("{}: {}", endpoint, e)))?;

        debug!("Connected to browser: {}", version.browser);
        let browser_ws_url = version.web_socket_debugger_url;

        let (ws_stream, _) = tokio_tungstenite::connect_async(&browser_ws_url)
            .await
            .map_err(|e| CdpError::ConnectionFailed(format!("WebSocket: {}", e)))?;

        let (ws_sink, ws_source) = ws_stream.split();
        let channel = Channel {
            ws_tx: Arc::new(tokio::sync::Mutex::new(ws_sink)),
            request_id: Arc::new(AtomicU64::new(1)),
            pending: Arc::new(Mutex::new(HashMap::new())),
        };
        let event_handlers = Arc::new(Mutex::new(HashMap::new()));
        let connected = Arc::new(AtomicBool::new(true));

        let recv_task = {
            let pending = channel.pending.clone();
            let event_handlers = event_handlers.clone();
            let connected = connected.clone();
            tokio::spawn(async move {
                Self::receive_loop(ws_source, &pending, &event_handlers).await;
                connected.store(false, Ordering::SeqCst);
                // Dropping the senders fails every waiter with SessionClosed.
                pending.lock().clear();
                event_handlers.lock().clear();
            })
        };

        debug!("CDP client connected to {}", browser_ws_url);

        Ok(Self {
            http_endpoint,
            browser_ws_url,
            channel,
            event_handlers,
            connected,
            _recv_task: recv_task,
        })
    }

    async fn receive_loop(
        mut ws_source: WsSource,
        pending: &Mutex<PendingMap>,
        event_handlers: &Mutex<EventHandlers>,
    ) {
        while let Some(msg) = ws_source.next().await {
            match msg {
                Ok(Message::Text(text)) => {
                    trace!("CDP recv: {}", text);
                    match serde_json::from_str::<CdpResponse>(&text) {
                        Ok(resp) => Self::dispatch(resp, pending, event_handlers),
                        Err(e) => warn!("Failed to parse CDP message: {}", e),
                    }
                }
                Ok(Message::Close(_)) => {
                    debug!("WebSocket closed");
                    break;
                }
                Err(e) => {
                    error!("WebSocket error: {}", e);
                    break;
                }
                _ => {}
            }
        }
    }

    /// Route a response to its caller, or an event to its page session.
    fn dispatch(resp: CdpResponse, pending: &Mutex<PendingMap>, event_handlers: &Mutex<EventHandlers>) {
        if let Some(id) = resp.id {
            let Some(tx) = pending.lock().remove(&id) else {
                return;
            };
            let result = match resp.error {
                Some(error) => Err(CdpError::Protocol {
                    code: error.code,
                    message: error.message,
                }),
                None => Ok(resp.result.unwrap_or(Value::Null)),
            };
            let _ = tx.send(result);
        } else if resp.method.is_some() {
            let session_id = resp.session_id.clone().unwrap_or_default();
            if let Some(tx) = event_handlers.lock().get(&session_id) {
                let _ = tx.send(resp);
            }
        }
    }

    /// Send a browser-level command.
    pub async fn call(&self, method: &str, params: Option<Value>) -> Result<Value, CdpError> {
        self.channel.call(method, params, None).await
    }

    pub fn browser_ws_url(&self) -> &str {
        &self.browser_ws_url
    }

    /// Whether the browser socket is still open.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Open a blank tab and attach a session to it.
    pub async fn new_page(&self) -> Result<PageSession, CdpError> {
        // Chrome requires PUT for /json/new
        let create_url = self.http_endpoint.join("/json/new?about:blank")?;
        let page_info: PageInfo = reqwest::Client::new()
            .put(create_url.as_str())
            .send()
            .await?
            .json()
            .await?;
        debug!("Created new page: {} - {}", page_info.id, page_info.url);

        let result = self
            .call(
                "Target.attachToTarget",
                Some(json!({
                    "targetId": page_info.id,
                    "flatten": true
                })),
            )
            .await?;

        let session_id = result["sessionId"]
            .as_str()
            .ok_or_else(|| CdpError::InvalidResponse("Missing sessionId".to_string()))?
            .to_string();

        let (event_tx, event_rx) = mpsc::unbounded_channel();
        self.event_handlers
            .lock()
            .insert(session_id.clone(), event_tx);

        let session = PageSession::new(page_info.id, session_id, self.channel.clone(), event_rx);
        session.enable_domains().await?;

        Ok(session)
    }

    /// Close a tab and forget its event channel.
    pub async fn close_page(&self, session: &PageSession) -> Result<(), CdpError> {
        self.event_handlers.lock().remove(session.session_id());
        self.call(
            "Target.closeTarget",
            Some(json!({"targetId": session.target_id()})),
        )
        .await?;
        Ok(())
    }
}

impl Drop for CdpClient {
    fn drop(&mut self) {
        self._recv_task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending_with(id: u64) -> (Mutex<PendingMap>, oneshot::Receiver<Result<Value, CdpError>>) {
        let (tx, rx) = oneshot::channel();
        let mut map = HashMap::new();
        map.insert(id, tx);
        (Mutex::new(map), rx)
    }

    fn parse(json: &str) -> CdpResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_dispatch_result_to_waiter() {
        let (pending, mut rx) = pending_with(3);
        let handlers = Mutex::new(HashMap::new());

        CdpClient::dispatch(parse(r#"{"id": 3, "result": {"value": 1}}"#), &pending, &handlers);

        let result = rx.try_recv().unwrap().unwrap();
        assert_eq!(result["value"], 1);
        assert!(pending.lock().is_empty());
    }

    #[test]
    fn test_dispatch_protocol_error() {
        let (pending, mut rx) = pending_with(9);
        let handlers = Mutex::new(HashMap::new());

        CdpClient::dispatch(
            parse(r#"{"id": 9, "error": {"code": -32601, "message": "not found"}}"#),
            &pending,
            &handlers,
        );

        match rx.try_recv().unwrap() {
            Err(CdpError::Protocol { code, .. }) => assert_eq!(code, -32601),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_dispatch_unknown_id_is_ignored() {
        let (pending, mut rx) = pending_with(1);
        let handlers = Mutex::new(HashMap::new());

        CdpClient::dispatch(parse(r#"{"id": 2, "result": {}}"#), &pending, &handlers);

        assert!(rx.try_recv().is_err());
        assert_eq!(pending.lock().len(), 1);
    }

    #[test]
    fn test_dispatch_event_by_session() {
        let pending = Mutex::new(HashMap::new());
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handlers = Mutex::new(HashMap::from([("S1".to_string(), tx)]));

        CdpClient::dispatch(
            parse(r#"{"method": "Page.loadEventFired", "params": {}, "sessionId": "S1"}"#),
            &pending,
            &handlers,
        );
        CdpClient::dispatch(
            parse(r#"{"method": "Page.loadEventFired", "params": {}, "sessionId": "S2"}"#),
            &pending,
            &handlers,
        );

        let event = rx.try_recv().unwrap();
        assert_eq!(event.method.as_deref(), Some("Page.loadEventFired"));
        assert!(rx.try_recv().is_err());
    }
}
