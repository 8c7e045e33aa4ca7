//! Roaming channel: commands relayed through a roaming platform client
//!
//! Only session control travels over roaming; everything else is reported
//! as unsupported instead of being silently dropped.

use std::sync::Arc;

use async_trait::async_trait;

use super::{ChannelKind, CommandChannel};
use crate::application::commands::{Command, CommandResponse};
use crate::application::ports::RoamingCommandClient;
use crate::domain::ChargingStation;
use crate::shared::errors::CommandError;

pub struct RoamingChannel {
    station: ChargingStation,
    client: Arc<dyn RoamingCommandClient>,
}

impl RoamingChannel {
    pub fn new(station: ChargingStation, client: Arc<dyn RoamingCommandClient>) -> Self {
        Self { station, client }
    }

    fn unsupported(&self, detail: String) -> CommandError {
        CommandError::ProtocolUnsupported {
            station_id: self.station.id.clone(),
            detail,
        }
    }
}

#[async_trait]
impl CommandChannel for RoamingChannel {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Roaming
    }

    fn station_id(&self) -> &str {
        &self.station.id
    }

    async fn dispatch(&self, command: &Command) -> Result<CommandResponse, CommandError> {
        let status = match command {
            Command::RemoteStartTransaction {
                connector_id: Some(connector_id),
                id_tag,
                ..
            } => {
                self.client
                    .start_session(&self.station, *connector_id, id_tag)
                    .await?
            }
            Command::RemoteStartTransaction {
                connector_id: None, ..
            } => {
                return Err(self.unsupported(
                    "roaming remote start requires a connector id".to_string(),
                ))
            }
            Command::RemoteStopTransaction { transaction_id } => {
                self.client
                    .stop_session(&self.station, *transaction_id)
                    .await?
            }
            Command::UnlockConnector { connector_id } => {
                self.client
                    .unlock_connector(&self.station, *connector_id)
                    .await?
            }
            other => {
                return Err(self.unsupported(format!(
                    "{} cannot be relayed through roaming",
                    other.action()
                )))
            }
        };
        Ok(CommandResponse::Status(status))
    }
}
