use crate::models::{LogMessage, ProgramDescriptor};
use crate::rate_limiter::RateLimiter;
use chrono::Utc;
use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

const RECONNECT_CAP: std::time::Duration = std::time::Duration::from_secs(30);

/// Connection state machine. `Streaming` is re-entrant on each inbound
/// message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WsState {
    Disconnected,
    Connecting,
    Open,
    Streaming,
    Closing,
}

/// Persistent subscriber to N program-log feeds. Reconnects with capped
/// backoff + jitter; throttles inbound messages against a rate limiter;
/// forwards retained messages to the orchestrator over `tx`.
pub struct WsIngest {
    socket_url: String,
    subscriptions: Vec<ProgramDescriptor>,
    message_limiter: Arc<RateLimiter>,
    shutdown: Arc<tokio::sync::Notify>,
}

impl WsIngest {
    pub fn new(socket_url: String, subscriptions: Vec<ProgramDescriptor>, message_limiter: Arc<RateLimiter>) -> Self {
        WsIngest {
            socket_url,
            subscriptions,
            message_limiter,
            shutdown: Arc::new(tokio::sync::Notify::new()),
        }
    }

    pub fn shutdown_handle(&self) -> Arc<tokio::sync::Notify> {
        self.shutdown.clone()
    }

    /// Outer reconnect loop. Exits only after a `SIGINT`-triggered shutdown
    /// notification (the `Closing` -> `Disconnected` transition).
    pub async fn run(&self, tx: mpsc::Sender<LogMessage>) {
        let attempt = AtomicU32::new(0);
        loop {
            if self.connect_and_stream(&tx, &attempt).await {
                log::info!("ws ingest: shutdown requested, exiting reconnect loop");
                return;
            }

            let n = attempt.fetch_add(1, Ordering::SeqCst);
            let base = std::time::Duration::from_millis(500);
            let capped = std::cmp::min(base.saturating_mul(1u32 << n.min(10)), RECONNECT_CAP);
            let jitter_ms = rand::random::<u64>() % 1000;
            let delay = capped + std::time::Duration::from_millis(jitter_ms);
            log::warn!("ws ingest: connection closed, reconnecting in {delay:?}");
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = self.shutdown.notified() => {
                    log::info!("ws ingest: shutdown requested during reconnect backoff");
                    return;
                }
            }
        }
    }

    /// Returns true if the shutdown was requested (caller should stop
    /// reconnecting), false if the socket simply closed and a reconnect
    /// should be scheduled.
    async fn connect_and_stream(&self, tx: &mpsc::Sender<LogMessage>, attempt: &AtomicU32) -> bool {
        let mut state = WsState::Connecting;
        let (ws_stream, _) = match connect_async(&self.socket_url).await {
            Ok(pair) => pair,
            Err(e) => {
                log::warn!("ws ingest: connect failed: {e}");
                return false;
            }
        };
        state = WsState::Open;
        let (mut write, mut read) = ws_stream.split();

        let mut pending_sub: HashMap<u64, String> = HashMap::new();
        let mut sub_to_program: HashMap<u64, String> = HashMap::new();
        let mut request_id: u64 = 0;

        for descriptor in &self.subscriptions {
            request_id += 1;
            pending_sub.insert(request_id, descriptor.label.clone());
            let req = json!({
                "jsonrpc": "2.0",
                "id": request_id,
                "method": "logsSubscribe",
                "params": [{"mentions": [descriptor.address]}, {"commitment": "confirmed"}],
            });
            if write.send(Message::Text(req.to_string())).await.is_err() {
                return false;
            }
            tokio::time::sleep(std::time::Duration::from_millis(500)).await;
        }

        attempt.store(0, Ordering::SeqCst);
        state = WsState::Streaming;
        let _ = state;

        loop {
            tokio::select! {
                maybe_msg = read.next() => {
                    match maybe_msg {
                        Some(Ok(Message::Text(text))) => {
                            if !self.message_limiter.try_acquire(1.0) {
                                log::warn!("ws ingest: message-rate token refused, dropping inbound message");
                                continue;
                            }
                            self.handle_text(&text, &mut pending_sub, &mut sub_to_program, tx).await;
                        }
                        Some(Ok(Message::Close(_))) | None => {
                            log::info!("ws ingest: socket closed by peer");
                            return false;
                        }
                        Some(Err(e)) => {
                            log::warn!("ws ingest: socket error: {e}");
                            return false;
                        }
                        _ => {}
                    }
                }
                _ = self.shutdown.notified() => {
                    log::info!("ws ingest: closing on shutdown signal");
                    let _ = write.send(Message::Close(None)).await;
                    return true;
                }
            }
        }
    }

    async fn handle_text(
        &self,
        text: &str,
        pending_sub: &mut HashMap<u64, String>,
        sub_to_program: &mut HashMap<u64, String>,
        tx: &mpsc::Sender<LogMessage>,
    ) {
        let value: Value = match serde_json::from_str(text) {
            Ok(v) => v,
            Err(e) => {
                log::debug!("ws ingest: malformed frame: {e}");
                return;
            }
        };

        if let (Some(id), Some(result)) = (value.get("id").and_then(Value::as_u64), value.get("result")) {
            if let Some(label) = pending_sub.remove(&id) {
                if let Some(sub_id) = result.as_u64() {
                    sub_to_program.insert(sub_id, label);
                }
            }
            return;
        }

        let Some(params) = value.get("params") else {
            return;
        };

        let subscription = params.get("subscription").and_then(Value::as_u64);
        let Some(label) = subscription.and_then(|id| sub_to_program.get(&id)).cloned() else {
            return;
        };

        let result = &params["result"];
        let slot = result["context"]["slot"].as_u64().unwrap_or(0);
        let tx_value = &result["value"];

        if !tx_value["err"].is_null() {
            return;
        }

        let signature = tx_value["signature"]
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| format!("slot-{slot}"));

        let lines: Vec<String> = tx_value["logs"]
            .as_array()
            .map(|arr| arr.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
            .unwrap_or_default();

        let message = LogMessage {
            signature,
            slot,
            source_program: label,
            lines,
            received_at: Utc::now(),
        };

        if tx.send(message).await.is_err() {
            log::warn!("ws ingest: orchestrator channel closed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reconnect_delay_caps_at_30s_after_many_attempts() {
        let base = std::time::Duration::from_millis(500);
        let n: u32 = 10;
        let capped = std::cmp::min(base.saturating_mul(1u32 << n.min(10)), RECONNECT_CAP);
        assert_eq!(capped, RECONNECT_CAP);
    }

    #[test]
    fn early_attempts_do_not_hit_the_cap() {
        let base = std::time::Duration::from_millis(500);
        let n: u32 = 1;
        let capped = std::cmp::min(base.saturating_mul(1u32 << n.min(10)), RECONNECT_CAP);
        assert_eq!(capped, std::time::Duration::from_millis(1000));
    }
}
