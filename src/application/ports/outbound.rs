//! Outbound ports: collaborators the control plane consumes
//!
//! Everything here is implemented outside the core (persistence, the
//! websocket server that owns live sessions, the roaming client, the lock
//! store, the smart charging algorithm). The core only depends on these
//! traits; `infrastructure::storage` ships in-memory implementations.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::application::commands::CommandStatus;
use crate::domain::{ChargingProfile, ChargingStation, Lock, LockScope};
use crate::shared::errors::{CommandError, DomainError};

/// Station records, read before and written after confirmed device changes.
#[async_trait]
pub trait StationDirectory: Send + Sync {
    async fn get_station(
        &self,
        tenant_id: &str,
        station_id: &str,
    ) -> Result<ChargingStation, DomainError>;

    async fn save_station(
        &self,
        tenant_id: &str,
        station: &ChargingStation,
    ) -> Result<(), DomainError>;
}

/// A live OCPP-J session able to carry one call at a time.
#[async_trait]
pub trait ChannelHandle: Send + Sync {
    /// Send `[2, id, action, payload]` and wait for the matching result.
    async fn call(&self, action: &'static str, payload: Value) -> Result<Value, CommandError>;
}

/// In-process registry of stations currently connected over JSON.
pub trait LiveConnectionRegistry: Send + Sync {
    fn lookup(&self, tenant_id: &str, station_id: &str) -> Option<Arc<dyn ChannelHandle>>;
}

/// Commands a roaming platform can relay to a station it does not own here.
#[async_trait]
pub trait RoamingCommandClient: Send + Sync {
    async fn start_session(
        &self,
        station: &ChargingStation,
        connector_id: u32,
        id_tag: &str,
    ) -> Result<CommandStatus, CommandError>;

    async fn stop_session(
        &self,
        station: &ChargingStation,
        transaction_id: i32,
    ) -> Result<CommandStatus, CommandError>;

    async fn unlock_connector(
        &self,
        station: &ChargingStation,
        connector_id: u32,
    ) -> Result<CommandStatus, CommandError>;
}

/// Finds the roaming client active for a tenant, if any.
#[async_trait]
pub trait RoamingClientResolver: Send + Sync {
    async fn resolve(
        &self,
        tenant_id: &str,
        station: &ChargingStation,
    ) -> Option<Arc<dyn RoamingCommandClient>>;
}

/// Non-blocking exclusive locks.
#[async_trait]
pub trait LockService: Send + Sync {
    /// `Ok(None)` when the scope is already held.
    async fn acquire(&self, scope: &LockScope) -> Result<Option<Lock>, DomainError>;

    async fn release(&self, lock: &Lock) -> Result<(), DomainError>;
}

/// Smart charging algorithm producing canonical profiles for a site area.
#[async_trait]
pub trait ProfileComputationAlgorithm: Send + Sync {
    async fn compute(
        &self,
        tenant_id: &str,
        site_area_id: &str,
    ) -> Result<Vec<ChargingProfile>, DomainError>;
}
