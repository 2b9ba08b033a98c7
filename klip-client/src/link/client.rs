// klip-client/src/link/client.rs
// Printer link - one websocket to the printer host with resubscribe and reconnect

use super::{LinkConfig, LinkEvent, LinkHandler, LinkState, WsError};
use futures::{SinkExt, StreamExt};
use serde_json::Value;
use shared::WsMessage;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;

type Handler = Option<Arc<dyn LinkHandler>>;

/// Websocket link to the printer host
///
/// Holds at most one live socket and at most one pending reconnect timer.
/// Cheap to clone; clones drive the same connection.
///
/// `connect` and `reconnect` spawn onto the current Tokio runtime.
#[derive(Clone)]
pub struct PrinterLink {
    inner: Arc<Inner>,
}

struct Inner {
    config: LinkConfig,
    shared: Mutex<Shared>,
    events: broadcast::Sender<LinkEvent>,
}

struct Shared {
    state: LinkState,
    /// Bumped by every `connect` and `disconnect`; sessions and timers from
    /// an older generation must not touch the link.
    generation: u64,
    outbound: Option<mpsc::UnboundedSender<Message>>,
    cancel: Option<CancellationToken>,
    reconnect_timer: Option<JoinHandle<()>>,
    /// Consecutive reconnect attempts since the last successful open
    attempts: u32,
}

impl std::fmt::Debug for PrinterLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrinterLink")
            .field("ws_url", &self.inner.config.ws_url)
            .field("state", &self.state())
            .finish()
    }
}

impl PrinterLink {
    pub fn new(config: LinkConfig) -> Self {
        let (events, _) = broadcast::channel(256);
        Self {
            inner: Arc::new(Inner {
                config,
                shared: Mutex::new(Shared {
                    state: LinkState::Disconnected,
                    generation: 0,
                    outbound: None,
                    cancel: None,
                    reconnect_timer: None,
                    attempts: 0,
                }),
                events,
            }),
        }
    }

    pub fn config(&self) -> &LinkConfig {
        &self.inner.config
    }

    pub fn state(&self) -> LinkState {
        self.lock().state
    }

    pub fn is_open(&self) -> bool {
        self.state() == LinkState::Open
    }

    pub fn has_pending_reconnect(&self) -> bool {
        self.lock().reconnect_timer.is_some()
    }

    /// Lifecycle events of this and every later connection
    pub fn events(&self) -> broadcast::Receiver<LinkEvent> {
        self.inner.events.subscribe()
    }

    fn lock(&self) -> MutexGuard<'_, Shared> {
        self.inner
            .shared
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn emit(&self, event: LinkEvent) {
        // No subscribers is fine
        let _ = self.inner.events.send(event);
    }

    /// Open the socket unless one is already open or opening.
    ///
    /// On open the subscription is sent; inbound JSON goes to `handler`;
    /// on close `handler.on_close` runs and a reconnect is scheduled.
    pub fn connect(&self, handler: Handler) {
        self.open(handler, None);
    }

    /// `connect`, optionally on behalf of the reconnect timer scheduled in
    /// `timer_generation`; the timer check and the dial share one lock.
    fn open(&self, handler: Handler, timer_generation: Option<u64>) {
        let (generation, cancel) = {
            let mut shared = self.lock();
            if let Some(scheduled) = timer_generation {
                // a stale timer leaves any newer handle alone
                if shared.generation != scheduled {
                    return;
                }
                shared.reconnect_timer = None;
            }
            if matches!(shared.state, LinkState::Connecting | LinkState::Open) {
                tracing::debug!(state = %shared.state, "Link already active, connect ignored");
                return;
            }
            // explicit connect supersedes a pending retry
            if timer_generation.is_none()
                && let Some(timer) = shared.reconnect_timer.take()
            {
                timer.abort();
            }
            shared.generation += 1;
            shared.state = LinkState::Connecting;
            let cancel = CancellationToken::new();
            shared.cancel = Some(cancel.clone());
            (shared.generation, cancel)
        };

        let link = self.clone();
        tokio::spawn(async move {
            link.run_session(generation, cancel, handler).await;
        });
    }

    /// Write a message if the socket is open; dropped silently otherwise.
    ///
    /// Returns whether the message was handed to the socket.
    pub fn send(&self, message: &WsMessage) -> bool {
        let shared = self.lock();
        let Some(outbound) = shared.outbound.as_ref().filter(|_| shared.state == LinkState::Open)
        else {
            tracing::debug!(method = %message.method, "Link not open, message dropped");
            return false;
        };

        match serde_json::to_string(message) {
            Ok(json) => outbound.send(Message::Text(json.into())).is_ok(),
            Err(e) => {
                tracing::warn!("Failed to serialize websocket message: {}", e);
                false
            }
        }
    }

    /// Send the configured object subscription
    pub fn subscribe(&self) -> bool {
        let message = WsMessage::subscribe(self.inner.config.objects.iter().cloned());
        self.send(&message)
    }

    /// Schedule a handler-less `connect` unless a timer is already pending
    /// or the link is already connecting or open
    pub fn reconnect(&self) {
        let mut shared = self.lock();
        if shared.reconnect_timer.is_some() {
            tracing::debug!("Reconnect already pending");
            return;
        }
        if matches!(shared.state, LinkState::Connecting | LinkState::Open) {
            tracing::debug!(state = %shared.state, "Link already active, reconnect ignored");
            return;
        }

        let config = &self.inner.config;
        if !config.should_retry(shared.attempts) {
            tracing::warn!(
                attempts = shared.attempts,
                "Reconnect attempts exhausted, giving up"
            );
            drop(shared);
            self.emit(LinkEvent::GaveUp);
            return;
        }

        let attempt = shared.attempts;
        shared.attempts += 1;
        let delay = config.delay_for(attempt);
        let generation = shared.generation;

        let link = self.clone();
        // The timer takes the lock before touching state, so it cannot run
        // ahead of the handle being stored below.
        shared.reconnect_timer = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            link.open(None, Some(generation));
        }));
        drop(shared);

        tracing::info!(
            attempt = attempt + 1,
            delay_ms = delay.as_millis() as u64,
            "Reconnect scheduled"
        );
        self.emit(LinkEvent::Reconnecting {
            attempt: attempt + 1,
            delay,
        });
    }

    /// Cancel any pending reconnect and close the socket.
    ///
    /// No automatic reconnect follows; handlers of the closed connection are
    /// not called.
    pub fn disconnect(&self) {
        let mut shared = self.lock();
        if let Some(timer) = shared.reconnect_timer.take() {
            timer.abort();
        }
        shared.generation += 1;
        if let Some(cancel) = shared.cancel.take() {
            cancel.cancel();
        }
        shared.outbound = None;
        shared.attempts = 0;
        let previous = std::mem::replace(&mut shared.state, LinkState::Disconnected);
        drop(shared);

        if previous != LinkState::Disconnected {
            tracing::info!("Printer link disconnected");
        }
    }

    /// One socket from dial to close
    async fn run_session(&self, generation: u64, cancel: CancellationToken, handler: Handler) {
        let url = self.inner.config.ws_url.as_str();
        tracing::info!(url = %url, "Connecting to printer websocket");

        let dial = tokio::time::timeout(self.inner.config.connect_timeout, connect_async(url));
        let result = tokio::select! {
            _ = cancel.cancelled() => return,
            result = dial => result,
        };

        let ws = match result {
            Ok(Ok((ws, _response))) => ws,
            Ok(Err(e)) => {
                self.report_error(&handler, &e);
                self.finish(generation, &handler);
                return;
            }
            Err(_) => {
                let e = WsError::Io(std::io::Error::new(
                    std::io::ErrorKind::TimedOut,
                    "websocket connect timed out",
                ));
                self.report_error(&handler, &e);
                self.finish(generation, &handler);
                return;
            }
        };

        let (mut ws_sink, mut ws_stream) = ws.split();
        let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Message>();

        let superseded = {
            let mut shared = self.lock();
            if shared.generation != generation {
                true
            } else {
                shared.state = LinkState::Open;
                shared.outbound = Some(outbound_tx);
                shared.attempts = 0;
                false
            }
        };
        if superseded {
            let _ = ws_sink.close().await;
            return;
        }

        tracing::info!(url = %url, "Printer websocket connected");
        self.emit(LinkEvent::Opened);
        self.subscribe();

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    let _ = ws_sink.send(Message::Close(None)).await;
                    let _ = ws_sink.close().await;
                    return;
                }

                Some(msg) = outbound_rx.recv() => {
                    if let Err(e) = ws_sink.send(msg).await {
                        self.report_error(&handler, &e);
                        break;
                    }
                }

                frame = ws_stream.next() => {
                    match frame {
                        Some(Ok(Message::Text(text))) => {
                            self.dispatch(text.as_str(), &handler);
                        }
                        Some(Ok(Message::Ping(data))) => {
                            let _ = ws_sink.send(Message::Pong(data)).await;
                        }
                        Some(Ok(Message::Close(_))) => {
                            tracing::info!("Printer websocket closed by host");
                            break;
                        }
                        Some(Err(e)) => {
                            self.report_error(&handler, &e);
                            break;
                        }
                        None => {
                            tracing::info!("Printer websocket stream ended");
                            break;
                        }
                        _ => {} // binary frames and pongs
                    }
                }
            }
        }

        self.finish(generation, &handler);
    }

    fn dispatch(&self, text: &str, handler: &Handler) {
        let value: Value = match serde_json::from_str(text) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!("Discarding malformed websocket frame: {}", e);
                return;
            }
        };
        tracing::debug!("Printer websocket message received");
        if let Some(h) = handler {
            h.on_message(&value);
        }
        self.emit(LinkEvent::Message(value));
    }

    fn report_error(&self, handler: &Handler, error: &WsError) {
        tracing::error!("Printer websocket error: {}", error);
        if let Some(h) = handler {
            h.on_error(error);
        }
        self.emit(LinkEvent::Error(error.to_string()));
    }

    /// Socket gone: notify, then schedule exactly one reconnect
    fn finish(&self, generation: u64, handler: &Handler) {
        {
            let mut shared = self.lock();
            if shared.generation != generation {
                return;
            }
            shared.state = LinkState::Closing;
            shared.outbound = None;
            shared.cancel = None;
        }

        tracing::info!("Printer websocket closed");
        if let Some(h) = handler {
            h.on_close();
        }
        self.emit(LinkEvent::Closed);

        {
            let mut shared = self.lock();
            // on_close may have reconnected or disconnected already
            if shared.generation != generation {
                return;
            }
            shared.state = LinkState::Disconnected;
        }
        self.reconnect();
    }
}
