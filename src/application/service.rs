//! Command execution entry point

use std::sync::Arc;

use crate::application::channel::{dispatch_recorded, ChannelProvider};
use crate::application::commands::{Command, CommandResponse};
use crate::application::ports::StationDirectory;
use crate::domain::ChargingStation;
use crate::shared::errors::{CommandError, ControlResult};

/// Runs one command against one station and returns the normalized answer.
pub struct CommandService {
    channels: Arc<dyn ChannelProvider>,
    stations: Arc<dyn StationDirectory>,
}

impl CommandService {
    pub fn new(channels: Arc<dyn ChannelProvider>, stations: Arc<dyn StationDirectory>) -> Self {
        Self { channels, stations }
    }

    pub async fn execute(
        &self,
        tenant_id: &str,
        station: &ChargingStation,
        command: &Command,
    ) -> Result<CommandResponse, CommandError> {
        let channel = self.channels.channel_for(tenant_id, station).await?;
        dispatch_recorded(channel.as_ref(), command).await
    }

    /// Same as [`execute`](Self::execute), loading the station first.
    pub async fn execute_for(
        &self,
        tenant_id: &str,
        station_id: &str,
        command: &Command,
    ) -> ControlResult<CommandResponse> {
        let station = self.stations.get_station(tenant_id, station_id).await?;
        Ok(self.execute(tenant_id, &station, command).await?)
    }
}
