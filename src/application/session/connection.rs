//! Live OCPP-J connection and its in-flight calls

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;
use tracing::{info, warn};

use crate::application::ports::ChannelHandle;
use crate::domain::OcppVersion;
use crate::shared::errors::CommandError;
use crate::support::ocpp_frame::OcppFrame;

struct PendingRequest {
    action: &'static str,
    response_sender: oneshot::Sender<Result<Value, String>>,
}

/// An active websocket connection to a charging station.
///
/// Outgoing calls are written to `sender` (the socket writer task owns the
/// receiving end); answers are fed back through [`Connection::resolve`].
pub struct Connection {
    pub connection_id: u64,
    pub tenant_id: String,
    pub station_id: String,
    pub ocpp_version: OcppVersion,
    pub connected_at: DateTime<Utc>,
    sender: mpsc::UnboundedSender<String>,
    pending: DashMap<String, PendingRequest>,
    message_counter: AtomicU64,
    response_timeout: Duration,
}

impl Connection {
    pub fn new(
        connection_id: u64,
        tenant_id: impl Into<String>,
        station_id: impl Into<String>,
        sender: mpsc::UnboundedSender<String>,
        ocpp_version: OcppVersion,
        response_timeout: Duration,
    ) -> Self {
        Self {
            connection_id,
            tenant_id: tenant_id.into(),
            station_id: station_id.into(),
            ocpp_version,
            connected_at: Utc::now(),
            sender,
            pending: DashMap::new(),
            message_counter: AtomicU64::new(1),
            response_timeout,
        }
    }

    fn next_message_id(&self) -> String {
        let id = self.message_counter.fetch_add(1, Ordering::SeqCst);
        format!("CS-{}", id)
    }

    /// Number of calls waiting for an answer.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Route a `CallResult`/`CallError` to the call waiting for it.
    ///
    /// Returns `false` when nothing was waiting for that message id.
    pub fn resolve(&self, frame: OcppFrame) -> bool {
        let message_id = frame.unique_id().to_string();
        let Some(response) = frame.into_response() else {
            return false;
        };
        match self.pending.remove(&message_id) {
            Some((_, pending)) => {
                info!(
                    station_id = self.station_id.as_str(),
                    action = pending.action,
                    message_id = message_id.as_str(),
                    ok = response.is_ok(),
                    "Received response"
                );
                let _ = pending.response_sender.send(response);
                true
            }
            None => {
                warn!(
                    station_id = self.station_id.as_str(),
                    message_id = message_id.as_str(),
                    "Response for unknown request"
                );
                false
            }
        }
    }

    /// Fail every in-flight call, used when the socket goes away.
    pub fn abort_pending(&self, reason: &str) {
        let ids: Vec<String> = self.pending.iter().map(|e| e.key().clone()).collect();
        for id in ids {
            if let Some((_, pending)) = self.pending.remove(&id) {
                let _ = pending.response_sender.send(Err(reason.to_string()));
            }
        }
    }
}

#[async_trait]
impl ChannelHandle for Connection {
    async fn call(&self, action: &'static str, payload: Value) -> Result<Value, CommandError> {
        let message_id = self.next_message_id();
        let frame = OcppFrame::call(message_id.clone(), action, payload);

        let (tx, rx) = oneshot::channel();
        self.pending.insert(
            message_id.clone(),
            PendingRequest {
                action,
                response_sender: tx,
            },
        );

        info!(
            station_id = self.station_id.as_str(),
            action,
            message_id = message_id.as_str(),
            "Sending command"
        );

        if let Err(e) = self.sender.send(frame.to_text()) {
            self.pending.remove(&message_id);
            return Err(CommandError::NotConnected {
                station_id: self.station_id.clone(),
                reason: format!("websocket writer closed: {}", e),
            });
        }

        match timeout(self.response_timeout, rx).await {
            Ok(Ok(Ok(payload))) => Ok(payload),
            Ok(Ok(Err(diagnostic))) => {
                Err(CommandError::transport(&self.station_id, action, diagnostic))
            }
            Ok(Err(_)) => {
                self.pending.remove(&message_id);
                Err(CommandError::transport(
                    &self.station_id,
                    action,
                    "response channel closed",
                ))
            }
            Err(_) => {
                self.pending.remove(&message_id);
                warn!(
                    station_id = self.station_id.as_str(),
                    action,
                    message_id = message_id.as_str(),
                    "Command timed out"
                );
                Err(CommandError::transport(
                    &self.station_id,
                    action,
                    format!("no response within {:?}", self.response_timeout),
                ))
            }
        }
    }
}
