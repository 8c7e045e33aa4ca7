//! Session registry: live OCPP-J connections keyed by tenant and station

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::{info, warn};

use super::connection::Connection;
use crate::application::ports::{ChannelHandle, LiveConnectionRegistry};
use crate::domain::OcppVersion;
use crate::support::ocpp_frame::OcppFrame;

type SessionKey = (String, String);

/// Thread-safe registry of active charging station sessions.
///
/// Injected into the channel resolver rather than reached as a global so
/// tests and multi-node deployments can substitute their own registry.
pub struct SessionRegistry {
    sessions: DashMap<SessionKey, Arc<Connection>>,
    connection_counter: AtomicU64,
    response_timeout: Duration,
}

/// Shared, reference-counted session registry
pub type SharedSessionRegistry = Arc<SessionRegistry>;

impl SessionRegistry {
    pub fn new(response_timeout: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            connection_counter: AtomicU64::new(1),
            response_timeout,
        }
    }

    pub fn shared(response_timeout: Duration) -> SharedSessionRegistry {
        Arc::new(Self::new(response_timeout))
    }

    fn key(tenant_id: &str, station_id: &str) -> SessionKey {
        (tenant_id.to_string(), station_id.to_string())
    }

    /// Register a freshly negotiated connection, evicting any previous one.
    pub fn register(
        &self,
        tenant_id: &str,
        station_id: &str,
        sender: mpsc::UnboundedSender<String>,
        ocpp_version: OcppVersion,
    ) -> Arc<Connection> {
        let connection_id = self.connection_counter.fetch_add(1, Ordering::SeqCst);
        info!(tenant_id, station_id, connection_id, %ocpp_version, "Registering charging station session");
        let connection = Arc::new(Connection::new(
            connection_id,
            tenant_id,
            station_id,
            sender,
            ocpp_version,
            self.response_timeout,
        ));
        if let Some(previous) = self
            .sessions
            .insert(Self::key(tenant_id, station_id), connection.clone())
        {
            warn!(
                tenant_id,
                station_id,
                evicted = previous.connection_id,
                "Evicted previous session"
            );
            previous.abort_pending("session replaced by a new connection");
        }
        connection
    }

    /// Remove a connection. A stale `connection_id` (already replaced by a
    /// reconnect) leaves the newer session untouched.
    pub fn unregister(&self, tenant_id: &str, station_id: &str, connection_id: u64) {
        let removed = self.sessions.remove_if(&Self::key(tenant_id, station_id), |_, conn| {
            conn.connection_id == connection_id
        });
        match removed {
            Some((_, conn)) => {
                conn.abort_pending("charging station disconnected");
                info!(tenant_id, station_id, connection_id, "Unregistered charging station session");
            }
            None => warn!(tenant_id, station_id, connection_id, "Attempted to unregister unknown session"),
        }
    }

    /// Feed an inbound websocket text message. Returns `true` when it
    /// answered a pending call.
    pub fn handle_incoming(&self, tenant_id: &str, station_id: &str, text: &str) -> bool {
        let Some(conn) = self
            .sessions
            .get(&Self::key(tenant_id, station_id))
            .map(|c| c.clone())
        else {
            warn!(tenant_id, station_id, "Message for unknown session");
            return false;
        };
        match OcppFrame::parse(text) {
            Ok(frame) => conn.resolve(frame),
            Err(e) => {
                warn!(tenant_id, station_id, error = %e, "Dropping malformed frame");
                false
            }
        }
    }

    pub fn is_connected(&self, tenant_id: &str, station_id: &str) -> bool {
        self.sessions.contains_key(&Self::key(tenant_id, station_id))
    }

    /// Connected station ids of one tenant.
    pub fn connected_ids(&self, tenant_id: &str) -> Vec<String> {
        self.sessions
            .iter()
            .filter(|e| e.key().0 == tenant_id)
            .map(|e| e.key().1.clone())
            .collect()
    }

    pub fn count(&self) -> usize {
        self.sessions.len()
    }

    pub fn get_version(&self, tenant_id: &str, station_id: &str) -> Option<OcppVersion> {
        self.sessions
            .get(&Self::key(tenant_id, station_id))
            .map(|conn| conn.ocpp_version)
    }
}

impl LiveConnectionRegistry for SessionRegistry {
    fn lookup(&self, tenant_id: &str, station_id: &str) -> Option<Arc<dyn ChannelHandle>> {
        self.sessions
            .get(&Self::key(tenant_id, station_id))
            .map(|conn| conn.clone() as Arc<dyn ChannelHandle>)
    }
}
