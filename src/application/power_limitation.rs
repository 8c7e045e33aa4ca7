//! Static power limitation
//!
//! A station-wide amperage ceiling written to a vendor configuration key.
//! The station record is only touched after the device acknowledged the
//! new value.

use std::sync::Arc;

use tracing::{info, warn};

use crate::application::channel::{dispatch_recorded, ChannelProvider};
use crate::application::commands::{Command, CommandResponse, CommandStatus};
use crate::application::ports::StationDirectory;
use crate::application::vendor::{units, VendorRegistry};
use crate::domain::{ChargingStation, OcppParameter};
use crate::shared::errors::{ControlError, ControlResult};

/// Lowest current a connector may be limited to, per phase.
pub const MIN_LIMIT_PER_PHASE: f64 = 6.0;

/// Floor for a station-wide limit: the per-phase minimum on every phase of
/// every connector.
pub fn minimum_limit(station: &ChargingStation) -> f64 {
    station
        .connectors
        .iter()
        .map(|c| MIN_LIMIT_PER_PHASE * c.effective_phases() as f64)
        .sum()
}

/// An acknowledged static limitation and the station as persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct StaticLimitationApplied {
    pub status: CommandStatus,
    pub station: ChargingStation,
}

pub struct PowerLimitationEngine {
    channels: Arc<dyn ChannelProvider>,
    stations: Arc<dyn StationDirectory>,
    vendors: Arc<VendorRegistry>,
}

impl PowerLimitationEngine {
    pub fn new(
        channels: Arc<dyn ChannelProvider>,
        stations: Arc<dyn StationDirectory>,
        vendors: Arc<VendorRegistry>,
    ) -> Self {
        Self {
            channels,
            stations,
            vendors,
        }
    }

    fn check_preconditions(
        station: &ChargingStation,
        connector_id: u32,
        max_amps: f64,
    ) -> ControlResult<()> {
        if !station.capabilities.supports_static_limitation {
            return Err(ControlError::configuration(
                &station.id,
                "static power limitation is not supported",
            ));
        }
        if connector_id != 0 {
            return Err(ControlError::validation(
                &station.id,
                format!(
                    "static limitation applies to the whole station (connector 0), got connector {}",
                    connector_id
                ),
            ));
        }
        if station.connectors.is_empty() {
            return Err(ControlError::validation(&station.id, "station has no connectors"));
        }
        let floor = minimum_limit(station);
        if !max_amps.is_finite() || max_amps < floor {
            return Err(ControlError::validation(
                &station.id,
                format!("limit {} A is below the minimum of {} A", max_amps, floor),
            ));
        }
        Ok(())
    }

    /// Apply `max_amps` (canonical, whole station) as the static limitation.
    pub async fn set_static_power_limitation(
        &self,
        tenant_id: &str,
        station: &ChargingStation,
        connector_id: u32,
        max_amps: f64,
    ) -> ControlResult<StaticLimitationApplied> {
        Self::check_preconditions(station, connector_id, max_amps)?;

        let vendor = self.vendors.profile_for(&station.vendor);
        let key = vendor.static_limit_key(station).to_string();
        let value = units::format_device_value(vendor.to_device_units(max_amps, station));

        let channel = self.channels.channel_for(tenant_id, station).await?;
        let response = dispatch_recorded(
            channel.as_ref(),
            &Command::ChangeConfiguration {
                key: key.clone(),
                value: value.clone(),
            },
        )
        .await?;

        let status = match response.status() {
            Some(status) => status.clone(),
            None => CommandStatus::Other("NoStatus".to_string()),
        };
        if !matches!(status, CommandStatus::Accepted | CommandStatus::RebootRequired) {
            warn!(
                station_id = station.id.as_str(),
                key = key.as_str(),
                value = value.as_str(),
                %status,
                "Static limitation rejected"
            );
            return Err(ControlError::DeviceRejected {
                station_id: station.id.clone(),
                command: "ChangeConfiguration",
                status: status.to_string(),
                params: format!("{}={}", key, value),
            });
        }

        let mut updated = station.clone();

        // The device already applied the limit, so a failed re-read is
        // logged and the limits are still persisted.
        match dispatch_recorded(channel.as_ref(), &Command::GetConfiguration { keys: vec![] }).await {
            Ok(CommandResponse::Configuration(config)) => {
                updated.ocpp_parameters = config
                    .configuration_key
                    .into_iter()
                    .map(|kv| OcppParameter {
                        key: kv.key,
                        value: kv.value,
                        readonly: kv.readonly,
                    })
                    .collect();
            }
            Ok(other) => warn!(station_id = station.id.as_str(), response = ?other, "Unexpected answer to configuration refresh"),
            Err(e) => warn!(station_id = station.id.as_str(), error = %e, "Configuration refresh failed after static limitation"),
        }

        let share = units::to_per_connector(max_amps, updated.connectors.len());
        for connector in &mut updated.connectors {
            connector.amperage_limit = share;
        }
        self.stations.save_station(tenant_id, &updated).await?;

        info!(
            station_id = station.id.as_str(),
            tenant_id,
            key = key.as_str(),
            value = value.as_str(),
            max_amps,
            per_connector = share,
            %status,
            "Static power limitation applied"
        );
        Ok(StaticLimitationApplied {
            status,
            station: updated,
        })
    }
}
