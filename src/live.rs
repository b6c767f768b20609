//! Live system-status channel.
//!
//! Maintains a websocket subscription to the backend's status feed and
//! publishes the latest [`SystemStatusSnapshot`] through a watch channel.
//! Connection loss triggers bounded exponential-backoff reconnects; after
//! several consecutive failures the manager degrades to one-shot REST polls
//! of the status endpoint so readers still see data while the socket is
//! down. Reconnection is abandoned once the attempt budget is exhausted and
//! must then be restarted explicitly.

use std::time::Duration;

use futures_util::StreamExt;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

use panelwatch_types::{StatusEnvelope, SystemStatusSnapshot};

/// Delay before the first reconnect attempt.
pub const INITIAL_BACKOFF: Duration = Duration::from_millis(1_000);
/// Ceiling applied to the exponential backoff.
pub const MAX_BACKOFF: Duration = Duration::from_secs(30);
/// Reconnect attempts before the manager gives up.
pub const MAX_RECONNECT_ATTEMPTS: u32 = 5;
/// Consecutive failures after which REST fallback polling starts.
pub const FALLBACK_AFTER_ATTEMPTS: u32 = 3;
/// Budget for a single websocket connect.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Backoff before reconnect attempt `attempt` (1-based).
///
/// Doubles from [`INITIAL_BACKOFF`], capped at [`MAX_BACKOFF`]. Returns
/// `None` once the attempt budget is spent, which tells the caller to stop
/// reconnecting.
pub fn backoff_delay(attempt: u32) -> Option<Duration> {
    if attempt == 0 || attempt > MAX_RECONNECT_ATTEMPTS {
        return None;
    }
    let millis = INITIAL_BACKOFF.as_millis() as u64 * (1u64 << (attempt - 1));
    Some(Duration::from_millis(millis).min(MAX_BACKOFF))
}

/// Observable connection and snapshot state, published via watch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LiveStatus {
    pub connected: bool,
    pub snapshot: Option<SystemStatusSnapshot>,
    pub last_update: Option<String>,
    pub reconnect_attempts: u32,
    pub fallback_mode: bool,
}

/// Owns the websocket task and the published [`LiveStatus`].
pub struct LiveStatusManager {
    ws_url: String,
    status_url: Option<String>,
    tx: watch::Sender<LiveStatus>,
    task: Option<JoinHandle<()>>,
}

impl LiveStatusManager {
    /// `status_url` is the REST endpoint polled in fallback mode; without
    /// one the manager only ever backs off and retries the socket.
    pub fn new(ws_url: impl Into<String>, status_url: Option<String>) -> Self {
        let (tx, _) = watch::channel(LiveStatus::default());
        Self {
            ws_url: ws_url.into(),
            status_url,
            tx,
            task: None,
        }
    }

    /// Watch handle for the published status.
    pub fn subscribe(&self) -> watch::Receiver<LiveStatus> {
        self.tx.subscribe()
    }

    /// Start (or restart) the connection task.
    ///
    /// Calling this while connected replaces the running task, which also
    /// serves as the manual reconnect after the attempt budget ran out.
    pub fn connect(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }

        let ws_url = self.ws_url.clone();
        let status_url = self.status_url.clone();
        let tx = self.tx.clone();
        self.task = Some(tokio::spawn(async move {
            run_channel(&ws_url, status_url.as_deref(), &tx).await;
        }));
    }

    /// Stop the connection task. The last published snapshot stays visible
    /// to subscribers; only the `connected` flag is cleared.
    pub fn disconnect(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.tx.send_modify(|status| status.connected = false);
    }
}

impl Drop for LiveStatusManager {
    fn drop(&mut self) {
        self.disconnect();
    }
}

/// Connect-read-reconnect loop. Returns only when the attempt budget is
/// exhausted (or the owning task is aborted).
async fn run_channel(ws_url: &str, status_url: Option<&str>, tx: &watch::Sender<LiveStatus>) {
    let http = reqwest::Client::new();
    let mut attempts: u32 = 0;

    loop {
        match tokio::time::timeout(CONNECT_TIMEOUT, connect_async(ws_url)).await {
            Ok(Ok((mut stream, _))) => {
                attempts = 0;
                info!(url = ws_url, "live status channel connected");
                tx.send_modify(|status| {
                    status.connected = true;
                    status.reconnect_attempts = 0;
                    status.fallback_mode = false;
                });

                while let Some(frame) = stream.next().await {
                    match frame {
                        Ok(Message::Text(text)) => apply_message(&text, tx),
                        Ok(Message::Close(_)) => {
                            info!("live status channel closed by peer");
                            break;
                        }
                        Ok(_) => {}
                        Err(err) => {
                            warn!(%err, "live status channel read failed");
                            break;
                        }
                    }
                }

                // A dropped established connection starts a new failure
                // sequence. Reconnecting without delay would hot-loop against
                // a backend that accepts the upgrade and closes right away.
                attempts = 1;
                warn!("live status channel dropped, reconnecting");
                tx.send_modify(|status| status.connected = false);
            }
            Ok(Err(err)) => {
                attempts += 1;
                warn!(%err, attempt = attempts, "live status connect failed");
            }
            Err(_) => {
                attempts += 1;
                warn!(attempt = attempts, "live status connect timed out");
            }
        }

        tx.send_modify(|status| status.reconnect_attempts = attempts);

        if attempts >= FALLBACK_AFTER_ATTEMPTS {
            if let Some(url) = status_url {
                poll_fallback(&http, url, tx).await;
            }
        }

        match backoff_delay(attempts) {
            Some(delay) => {
                debug!(?delay, attempt = attempts, "backing off before reconnect");
                tokio::time::sleep(delay).await;
            }
            None => {
                warn!(
                    attempts,
                    "live status reconnect budget exhausted, staying disconnected"
                );
                return;
            }
        }
    }
}

/// Parse one text frame and fold it into the published status.
///
/// Only `system_status` envelopes replace the snapshot; other message types
/// are ignored and malformed frames are dropped with a warning.
fn apply_message(text: &str, tx: &watch::Sender<LiveStatus>) {
    let envelope: StatusEnvelope = match serde_json::from_str(text) {
        Ok(envelope) => envelope,
        Err(err) => {
            warn!(%err, "dropping malformed live status frame");
            return;
        }
    };

    if envelope.message_type != "system_status" {
        debug!(message_type = %envelope.message_type, "ignoring live status frame");
        return;
    }

    match serde_json::from_value::<SystemStatusSnapshot>(envelope.data) {
        Ok(snapshot) => {
            tx.send_modify(|status| {
                status.snapshot = Some(snapshot);
                status.last_update = envelope.timestamp;
            });
        }
        Err(err) => {
            warn!(%err, "dropping system_status frame with bad payload");
        }
    }
}

/// One-shot REST poll used while the socket is down.
async fn poll_fallback(http: &reqwest::Client, url: &str, tx: &watch::Sender<LiveStatus>) {
    let snapshot = match http.get(url).send().await {
        Ok(response) => match response.json::<SystemStatusSnapshot>().await {
            Ok(snapshot) => snapshot,
            Err(err) => {
                warn!(%err, "fallback status poll returned bad payload");
                return;
            }
        },
        Err(err) => {
            warn!(%err, "fallback status poll failed");
            return;
        }
    };

    debug!(url, "applied fallback status poll");
    tx.send_modify(|status| {
        status.snapshot = Some(snapshot);
        status.fallback_mode = true;
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Accepts TCP connections but never answers the websocket upgrade,
    /// so every connect attempt stalls until the handshake timeout.
    async fn stalled_ws_server() -> (SocketAddr, JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let mut held = Vec::new();
            loop {
                match listener.accept().await {
                    Ok((stream, _)) => held.push(stream),
                    Err(_) => return,
                }
            }
        });
        (addr, handle)
    }

    /// Serves one canned JSON status snapshot per HTTP request.
    async fn canned_status_server() -> (SocketAddr, JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            loop {
                let Ok((mut stream, _)) = listener.accept().await else {
                    return;
                };
                tokio::spawn(async move {
                    let mut buf = [0u8; 1024];
                    let _ = stream.read(&mut buf).await;
                    let body = concat!(
                        r#"{"banking_services":{"healthy":2,"total":2,"percentage":100.0,"services":[]},"#,
                        r#""cache":{"connected_clients":1,"hit_ratio":95.0},"overall_health":true}"#,
                    );
                    let response = format!(
                        "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                        body.len(),
                        body
                    );
                    let _ = stream.write_all(response.as_bytes()).await;
                    let _ = stream.shutdown().await;
                });
            }
        });
        (addr, handle)
    }

    #[test]
    fn test_backoff_doubles_then_stops() {
        let delays: Vec<_> = (1..=MAX_RECONNECT_ATTEMPTS)
            .map(backoff_delay)
            .collect();
        assert_eq!(
            delays,
            vec![
                Some(Duration::from_millis(1_000)),
                Some(Duration::from_millis(2_000)),
                Some(Duration::from_millis(4_000)),
                Some(Duration::from_millis(8_000)),
                Some(Duration::from_millis(16_000)),
            ]
        );
        assert_eq!(backoff_delay(MAX_RECONNECT_ATTEMPTS + 1), None);
        assert_eq!(backoff_delay(0), None);
    }

    #[test]
    fn test_backoff_never_exceeds_cap() {
        for attempt in 1..=MAX_RECONNECT_ATTEMPTS {
            let delay = backoff_delay(attempt).unwrap();
            assert!(delay <= MAX_BACKOFF, "attempt {attempt} gave {delay:?}");
        }
    }

    #[test]
    fn test_system_status_frame_replaces_snapshot() {
        let (tx, rx) = watch::channel(LiveStatus::default());

        apply_message(
            r#"{
                "type": "system_status",
                "timestamp": "2026-08-23T10:15:00",
                "data": {
                    "banking_services": {"healthy": 3, "total": 4, "percentage": 75.0, "services": []},
                    "cache": {"connected_clients": 2, "hit_ratio": 99.0},
                    "overall_health": true
                }
            }"#,
            &tx,
        );

        let status = rx.borrow();
        let snapshot = status.snapshot.as_ref().unwrap();
        assert_eq!(snapshot.banking_services.healthy, 3);
        assert!(snapshot.overall_health);
        assert_eq!(status.last_update.as_deref(), Some("2026-08-23T10:15:00"));
    }

    #[test]
    fn test_unknown_frame_type_is_ignored() {
        let (tx, rx) = watch::channel(LiveStatus::default());

        apply_message(r#"{"type": "heartbeat", "data": {"beat": 1}}"#, &tx);

        assert!(rx.borrow().snapshot.is_none());
    }

    #[test]
    fn test_malformed_frame_is_dropped() {
        let (tx, rx) = watch::channel(LiveStatus::default());

        apply_message("not json at all", &tx);
        apply_message(r#"{"missing": "type"}"#, &tx);

        assert!(rx.borrow().snapshot.is_none());
        assert_eq!(rx.borrow().last_update, None);
    }

    #[tokio::test]
    async fn test_dropped_connection_enters_backoff() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let accepted = Arc::new(AtomicUsize::new(0));

        // Accept the upgrade, then close the connection immediately.
        let server_accepted = accepted.clone();
        let server = tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    return;
                };
                server_accepted.fetch_add(1, Ordering::SeqCst);
                if let Ok(ws) = tokio_tungstenite::accept_async(stream).await {
                    drop(ws);
                }
            }
        });

        let (tx, rx) = watch::channel(LiveStatus::default());
        let url = format!("ws://{addr}");
        let channel = tokio::spawn(async move { run_channel(&url, None, &tx).await });

        tokio::time::sleep(Duration::from_millis(400)).await;
        channel.abort();
        server.abort();

        // With INITIAL_BACKOFF at one second the first reconnect cannot have
        // happened yet; a hot loop would have reconnected dozens of times.
        let connections = accepted.load(Ordering::SeqCst);
        assert!(connections <= 2, "reconnected {connections} times in 400ms");

        let status = rx.borrow();
        assert!(!status.connected);
        assert!(status.reconnect_attempts >= 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_handshake_counts_as_failed_attempt() {
        let (addr, server) = stalled_ws_server().await;
        let (tx, rx) = watch::channel(LiveStatus::default());
        let url = format!("ws://{addr}");

        // No status endpoint: the loop runs out its attempt budget and
        // returns, each stalled handshake counting as one failure.
        run_channel(&url, None, &tx).await;
        server.abort();

        let status = rx.borrow();
        assert!(!status.connected);
        assert!(status.reconnect_attempts > MAX_RECONNECT_ATTEMPTS);
        assert!(status.snapshot.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_fallback_poll_kicks_in_after_third_failure() {
        let (ws_addr, ws_server) = stalled_ws_server().await;
        let (http_addr, http_server) = canned_status_server().await;
        let (tx, rx) = watch::channel(LiveStatus::default());
        let ws_url = format!("ws://{ws_addr}");
        let status_url = format!("http://{http_addr}/system/status");

        run_channel(&ws_url, Some(&status_url), &tx).await;
        ws_server.abort();
        http_server.abort();

        let status = rx.borrow();
        assert!(status.fallback_mode);
        let snapshot = status.snapshot.as_ref().unwrap();
        assert!(snapshot.overall_health);
        assert_eq!(snapshot.banking_services.total, 2);
        assert_eq!(snapshot.cache.connected_clients, 1);
    }

    #[test]
    fn test_snapshot_survives_later_garbage() {
        let (tx, rx) = watch::channel(LiveStatus::default());

        apply_message(
            r#"{"type": "system_status", "data": {"overall_health": true}}"#,
            &tx,
        );
        apply_message("garbage", &tx);

        // The last good snapshot stays published.
        assert!(rx.borrow().snapshot.as_ref().unwrap().overall_health);
    }
}
