//! EdgeX public quote WebSocket client.
//!
//! Subscribes to channels by name with a per-channel handler, keeps the
//! connection alive with an application-level ping and raises a reconnect
//! signal when reading fails. Reconnecting is left to the owner.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use chrono::Utc;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, timeout, Instant};
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message, MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::shared::errors::StreamError;

pub const EDGEX_WS_URL: &str = "wss://quote.edgex.exchange/api/v1/public/ws";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const PING_INTERVAL: Duration = Duration::from_secs(30);

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;

/// Callback for the `content` of a channel's quote events
pub type ChannelHandler = Arc<dyn Fn(serde_json::Value) + Send + Sync>;

type HandlerMap = Arc<RwLock<HashMap<String, ChannelHandler>>>;

/// Wire envelope used in both directions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WsMessage {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
}

impl WsMessage {
    fn new(kind: &str) -> Self {
        Self {
            kind: kind.to_string(),
            channel: None,
            content: None,
            time: None,
        }
    }

    pub fn subscribe(channel: &str) -> Self {
        Self {
            channel: Some(channel.to_string()),
            ..Self::new("subscribe")
        }
    }

    pub fn unsubscribe(channel: &str) -> Self {
        Self {
            channel: Some(channel.to_string()),
            ..Self::new("unsubscribe")
        }
    }

    pub fn ping(time: String) -> Self {
        Self {
            time: Some(time),
            ..Self::new("ping")
        }
    }

    pub fn pong(time: Option<String>) -> Self {
        Self { time, ..Self::new("pong") }
    }
}

/// `content` of a `ticker.<contractId>` quote event
#[derive(Debug, Clone, Deserialize)]
pub struct TickerContent {
    #[serde(rename = "dataType", default)]
    pub data_type: String,
    #[serde(default)]
    pub channel: String,
    #[serde(default)]
    pub data: Vec<Ticker>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Ticker {
    #[serde(rename = "contractId")]
    pub contract_id: String,
    #[serde(rename = "lastPrice", default)]
    pub last_price: String,
    #[serde(rename = "indexPrice", default)]
    pub index_price: String,
    #[serde(rename = "markPrice", default)]
    pub mark_price: String,
}

pub struct EdgeXStreamClient {
    url: String,
    writer: Arc<Mutex<Option<WsSink>>>,
    handlers: HandlerMap,
    shutdown: CancellationToken,
    reconnect_tx: mpsc::Sender<()>,
    reconnect_rx: std::sync::Mutex<Option<mpsc::Receiver<()>>>,
    tasks: std::sync::Mutex<Vec<JoinHandle<()>>>,
}

impl EdgeXStreamClient {
    pub fn new(url: impl Into<String>) -> Self {
        let (reconnect_tx, reconnect_rx) = mpsc::channel(1);
        Self {
            url: url.into(),
            writer: Arc::new(Mutex::new(None)),
            handlers: Arc::new(RwLock::new(HashMap::new())),
            shutdown: CancellationToken::new(),
            reconnect_tx,
            reconnect_rx: std::sync::Mutex::new(Some(reconnect_rx)),
            tasks: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Opens the socket and starts the reader and heartbeat tasks.
    pub async fn connect(&self) -> Result<(), StreamError> {
        let (ws_stream, _response) = match timeout(CONNECT_TIMEOUT, connect_async(self.url.as_str())).await {
            Ok(Ok(connected)) => connected,
            Ok(Err(e)) => return Err(StreamError::Connection(e.to_string())),
            Err(_) => return Err(StreamError::Timeout),
        };
        info!("✅ EdgeX WebSocket connected to {}", self.url);

        let (write, read) = ws_stream.split();
        *self.writer.lock().await = Some(write);

        let reader = tokio::spawn(read_loop(
            read,
            self.writer.clone(),
            self.handlers.clone(),
            self.reconnect_tx.clone(),
            self.shutdown.clone(),
        ));
        let heartbeat = tokio::spawn(heartbeat_loop(self.writer.clone(), self.shutdown.clone()));

        let mut tasks = self.tasks.lock().unwrap_or_else(|p| p.into_inner());
        tasks.push(reader);
        tasks.push(heartbeat);
        Ok(())
    }

    /// Registers `handler` for the channel, then sends the subscribe request.
    pub async fn subscribe<F>(&self, channel: &str, handler: F) -> Result<(), StreamError>
    where
        F: Fn(serde_json::Value) + Send + Sync + 'static,
    {
        self.handlers
            .write()
            .unwrap_or_else(|p| p.into_inner())
            .insert(channel.to_string(), Arc::new(handler));
        send(&self.writer, &WsMessage::subscribe(channel)).await
    }

    pub async fn unsubscribe(&self, channel: &str) -> Result<(), StreamError> {
        self.handlers
            .write()
            .unwrap_or_else(|p| p.into_inner())
            .remove(channel);
        send(&self.writer, &WsMessage::unsubscribe(channel)).await
    }

    pub fn subscribed_channels(&self) -> Vec<String> {
        let handlers = self.handlers.read().unwrap_or_else(|p| p.into_inner());
        let mut channels: Vec<String> = handlers.keys().cloned().collect();
        channels.sort();
        channels
    }

    /// Fires once per read failure, coalesced. Can only be taken once.
    pub fn reconnect_signal(&self) -> Option<mpsc::Receiver<()>> {
        self.reconnect_rx.lock().unwrap_or_else(|p| p.into_inner()).take()
    }

    /// Stops both tasks and closes the socket.
    pub async fn close(&self) -> Result<(), StreamError> {
        self.shutdown.cancel();
        let tasks: Vec<JoinHandle<()>> = self.tasks.lock().unwrap_or_else(|p| p.into_inner()).drain(..).collect();
        for task in tasks {
            let _ = task.await;
        }
        if let Some(mut write) = self.writer.lock().await.take() {
            write.close().await?;
        }
        info!("EdgeX WebSocket closed");
        Ok(())
    }
}

async fn send(writer: &Mutex<Option<WsSink>>, msg: &WsMessage) -> Result<(), StreamError> {
    let text = serde_json::to_string(msg)?;
    let mut guard = writer.lock().await;
    let write = guard.as_mut().ok_or(StreamError::NotConnected)?;
    write.send(Message::Text(text)).await?;
    Ok(())
}

/// Applies one inbound message. Returns the reply to send, if any.
fn dispatch(handlers: &HandlerMap, msg: WsMessage) -> Option<WsMessage> {
    match msg.kind.as_str() {
        "ping" => return Some(WsMessage::pong(msg.time)),
        "pong" => {}
        "subscribed" => info!("EdgeX WS subscribed to channel: {}", msg.channel.unwrap_or_default()),
        "quote-event" => {
            let handler = msg.channel.as_ref().and_then(|channel| {
                handlers
                    .read()
                    .unwrap_or_else(|p| p.into_inner())
                    .get(channel)
                    .cloned()
            });
            if let Some(handler) = handler {
                handler(msg.content.unwrap_or(serde_json::Value::Null));
            }
        }
        "error" => error!("EdgeX WS error: {}", msg.content.unwrap_or(serde_json::Value::Null)),
        other => debug!("EdgeX WS ignoring message type {}", other),
    }
    None
}

fn signal_reconnect(tx: &mpsc::Sender<()>) {
    // A pending signal already covers this failure.
    let _ = tx.try_send(());
}

async fn read_loop(
    mut read: SplitStream<WsStream>,
    writer: Arc<Mutex<Option<WsSink>>>,
    handlers: HandlerMap,
    reconnect: mpsc::Sender<()>,
    shutdown: CancellationToken,
) {
    loop {
        let frame = tokio::select! {
            biased;
            _ = shutdown.cancelled() => return,
            frame = read.next() => frame,
        };

        match frame {
            Some(Ok(Message::Text(text))) => match serde_json::from_str::<WsMessage>(&text) {
                Ok(msg) => {
                    if let Some(reply) = dispatch(&handlers, msg) {
                        if let Err(e) = send(&writer, &reply).await {
                            warn!("EdgeX WS pong failed: {}", e);
                        }
                    }
                }
                Err(e) => warn!("EdgeX WS undecodable message: {}", e),
            },
            Some(Ok(Message::Ping(data))) => {
                if let Some(write) = writer.lock().await.as_mut() {
                    let _ = write.send(Message::Pong(data)).await;
                }
            }
            Some(Ok(Message::Close(frame))) => {
                warn!("EdgeX WebSocket closed by server: {:?}", frame);
                signal_reconnect(&reconnect);
                return;
            }
            Some(Ok(_)) => {}
            Some(Err(e)) => {
                error!("EdgeX WS read error: {}", e);
                signal_reconnect(&reconnect);
                return;
            }
            None => {
                warn!("EdgeX WebSocket stream ended");
                signal_reconnect(&reconnect);
                return;
            }
        }
    }
}

async fn heartbeat_loop(writer: Arc<Mutex<Option<WsSink>>>, shutdown: CancellationToken) {
    let mut ticker = interval_at(Instant::now() + PING_INTERVAL, PING_INTERVAL);
    loop {
        tokio::select! {
            biased;
            _ = shutdown.cancelled() => return,
            _ = ticker.tick() => {
                let ping = WsMessage::ping(Utc::now().timestamp_millis().to_string());
                if let Err(e) = send(&writer, &ping).await {
                    warn!("EdgeX WS ping error: {}", e);
                }
            }
        }
    }
}
