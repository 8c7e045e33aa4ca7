//! Command channels, one per way of reaching a charging station
//!
//! ## Architecture
//!
//! ```text
//! engines ──► ChannelProvider::channel_for(tenant, station)
//!                     │ (ChannelResolver)
//!     ┌───────────────┼─────────────────┬─────────────────┐
//!  issuer + JSON   issuer + JSON      issuer + SOAP     roaming
//!  live session    no live session    version template  station
//!     │               │                  │                 │
//!  JsonChannel     JsonChannel        SoapChannel       RoamingChannel
//!  (Connection)    (RemoteJsonClient) (reqwest)         (RoamingCommandClient)
//! ```
//!
//! Every channel turns a [`Command`] into the station's answer in the shared
//! [`CommandResponse`] vocabulary, or a [`CommandError`].

pub mod json;
pub mod remote;
pub mod resolver;
pub mod roaming;
pub mod soap;

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::application::commands::{Command, CommandResponse};
use crate::domain::ChargingStation;
use crate::shared::errors::CommandError;

pub use json::JsonChannel;
pub use remote::RemoteJsonClient;
pub use resolver::ChannelResolver;
pub use roaming::RoamingChannel;
pub use soap::SoapChannel;

/// Which transport a channel uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelKind {
    JsonLive,
    JsonRemote,
    Soap,
    Roaming,
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::JsonLive => write!(f, "json-live"),
            Self::JsonRemote => write!(f, "json-remote"),
            Self::Soap => write!(f, "soap"),
            Self::Roaming => write!(f, "roaming"),
        }
    }
}

/// A resolved way to talk to one station.
///
/// Callers must not run two dispatches on the same station concurrently.
#[async_trait]
pub trait CommandChannel: Send + Sync {
    fn kind(&self) -> ChannelKind;

    fn station_id(&self) -> &str;

    async fn dispatch(&self, command: &Command) -> Result<CommandResponse, CommandError>;
}

/// Seam between the engines and transport selection.
#[async_trait]
pub trait ChannelProvider: Send + Sync {
    async fn channel_for(
        &self,
        tenant_id: &str,
        station: &ChargingStation,
    ) -> Result<Arc<dyn CommandChannel>, CommandError>;
}

/// Dispatch with structured logging and latency metrics.
pub async fn dispatch_recorded(
    channel: &dyn CommandChannel,
    command: &Command,
) -> Result<CommandResponse, CommandError> {
    let action = command.action();
    let start = Instant::now();
    info!(
        station_id = channel.station_id(),
        action,
        channel = %channel.kind(),
        "Dispatching command"
    );

    let result = channel.dispatch(command).await;

    let outcome = if result.is_ok() { "ok" } else { "error" };
    metrics::histogram!("ocpp_command_latency_seconds", "action" => action)
        .record(start.elapsed().as_secs_f64());
    metrics::counter!("ocpp_commands_total", "action" => action, "outcome" => outcome)
        .increment(1);

    if let Err(e) = &result {
        warn!(station_id = channel.station_id(), action, error = %e, "Command failed");
    }
    result
}
