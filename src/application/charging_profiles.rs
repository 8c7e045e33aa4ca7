//! Charging profile engine
//!
//! ```text
//! connector 0 ──► SetChargingProfile(0) ── Accepted ──► Single
//!                        │
//!                        └─ rejected ──► SetChargingProfile(1..n) ──► PerConnector
//! connector n ──► SetChargingProfile(n) ──────────────────────────► Single
//! ```
//!
//! Some stations refuse whole-station profiles but honour the same profile
//! pushed connector by connector; the same fallback serves clearing and
//! composite schedule reads. Device statuses are returned as data, transport
//! faults abort and propagate.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::application::channel::{dispatch_recorded, ChannelProvider, CommandChannel};
use crate::application::commands::{
    ClearChargingProfileCriteria, Command, CommandResponse, CommandStatus, CompositeScheduleResult,
};
use crate::application::outcome::{ConnectorOutcome, DeviceOutcome, Dispatched};
use crate::application::power_limitation::{PowerLimitationEngine, StaticLimitationApplied};
use crate::application::vendor::{units, VendorProfile, VendorRegistry};
use crate::domain::{
    ChargingProfile, ChargingRateUnit, ChargingStation, ConnectorCurrentLimit, LimitSource,
    PowerLimitUnit,
};
use crate::shared::errors::{CommandError, ControlError, ControlResult};

/// Window used to ask a station what it enforces right now.
pub const CURRENT_LIMIT_WINDOW_SECS: i32 = 60;

/// Result of a clear, plus the static limitation restored afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct ClearedProfile {
    pub cleared: Dispatched<()>,
    pub static_limitation: Option<StaticLimitationApplied>,
}

fn status_outcome(response: CommandResponse) -> DeviceOutcome<()> {
    match response.status() {
        Some(CommandStatus::Accepted) => DeviceOutcome::Accepted(()),
        Some(status) => DeviceOutcome::Rejected(status.clone()),
        None => DeviceOutcome::Rejected(CommandStatus::Other("NoStatus".to_string())),
    }
}

/// Status of an answer that did not carry the expected accepted payload.
fn rejection(response: &CommandResponse) -> CommandStatus {
    match response.status() {
        Some(status) if !status.is_accepted() => status.clone(),
        _ => CommandStatus::Other("UnexpectedResponse".to_string()),
    }
}

/// Dispatch for `connector_id`; on a rejected connector 0, retry once per
/// connector in ascending order.
async fn with_fallback<T>(
    channel: &dyn CommandChannel,
    station: &ChargingStation,
    connector_id: u32,
    build: impl Fn(u32) -> Command,
    read: impl Fn(u32, CommandResponse) -> DeviceOutcome<T>,
) -> Result<Dispatched<T>, CommandError> {
    let first = read(
        connector_id,
        dispatch_recorded(channel, &build(connector_id)).await?,
    );
    if connector_id != 0 || first.is_accepted() {
        return Ok(Dispatched::Single(first));
    }

    info!(
        station_id = station.id.as_str(),
        connectors = station.connectors.len(),
        "Station-wide command not accepted, retrying per connector"
    );
    let mut outcomes = Vec::with_capacity(station.connectors.len());
    for id in station.connector_ids() {
        let outcome = read(id, dispatch_recorded(channel, &build(id)).await?);
        outcomes.push(ConnectorOutcome {
            connector_id: id,
            outcome,
        });
    }
    Ok(Dispatched::PerConnector(outcomes))
}

pub struct ChargingProfileEngine {
    channels: Arc<dyn ChannelProvider>,
    vendors: Arc<VendorRegistry>,
    power_limitation: Arc<PowerLimitationEngine>,
}

impl ChargingProfileEngine {
    pub fn new(
        channels: Arc<dyn ChannelProvider>,
        vendors: Arc<VendorRegistry>,
        power_limitation: Arc<PowerLimitationEngine>,
    ) -> Self {
        Self {
            channels,
            vendors,
            power_limitation,
        }
    }

    fn require_profiles(station: &ChargingStation) -> ControlResult<()> {
        if station.capabilities.supports_charging_profiles {
            Ok(())
        } else {
            Err(ControlError::configuration(
                &station.id,
                "charging profiles are not supported",
            ))
        }
    }

    fn require_connector(station: &ChargingStation, connector_id: u32) -> ControlResult<()> {
        if connector_id != 0 && station.connector(connector_id).is_none() {
            return Err(ControlError::validation(
                &station.id,
                format!("unknown connector {}", connector_id),
            ));
        }
        Ok(())
    }

    pub async fn set_charging_profile(
        &self,
        tenant_id: &str,
        station: &ChargingStation,
        profile: &ChargingProfile,
    ) -> ControlResult<Dispatched<()>> {
        let vendor = self.vendors.profile_for(&station.vendor);
        self.set_charging_profile_with(tenant_id, station, vendor, profile)
            .await
    }

    /// Push `profile` (canonical units) using an already resolved vendor.
    pub async fn set_charging_profile_with(
        &self,
        tenant_id: &str,
        station: &ChargingStation,
        vendor: &VendorProfile,
        profile: &ChargingProfile,
    ) -> ControlResult<Dispatched<()>> {
        Self::require_profiles(station)?;
        profile
            .schedule
            .validate()
            .map_err(|reason| ControlError::validation(&station.id, reason))?;
        Self::require_connector(station, profile.connector_id)?;

        let device_profile = vendor.to_device_profile(profile, station);
        let channel = self.channels.channel_for(tenant_id, station).await?;

        let dispatched = with_fallback(
            channel.as_ref(),
            station,
            profile.connector_id,
            |connector_id| Command::SetChargingProfile {
                connector_id,
                profile: device_profile.clone(),
            },
            |_, response| status_outcome(response),
        )
        .await?;

        info!(
            station_id = station.id.as_str(),
            profile_id = profile.profile_id,
            connector_id = profile.connector_id,
            accepted = dispatched.all_accepted(),
            "Charging profile pushed"
        );
        Ok(dispatched)
    }

    /// Clear `profile` from the device, then restore the static limitation
    /// at full station capacity.
    pub async fn clear_charging_profile(
        &self,
        tenant_id: &str,
        station: &ChargingStation,
        profile: &ChargingProfile,
    ) -> ControlResult<ClearedProfile> {
        Self::require_profiles(station)?;
        Self::require_connector(station, profile.connector_id)?;

        let channel = self.channels.channel_for(tenant_id, station).await?;
        let cleared = with_fallback(
            channel.as_ref(),
            station,
            profile.connector_id,
            |connector_id| {
                Command::ClearChargingProfile(ClearChargingProfileCriteria {
                    profile_id: Some(profile.profile_id),
                    connector_id: Some(connector_id),
                    purpose: Some(profile.purpose),
                    stack_level: Some(profile.stack_level),
                })
            },
            |_, response| status_outcome(response),
        )
        .await?;

        let completed = match &cleared {
            Dispatched::Single(outcome) => outcome.is_accepted(),
            Dispatched::PerConnector(_) => true,
        };
        if !completed || !station.capabilities.supports_static_limitation {
            return Ok(ClearedProfile {
                cleared,
                static_limitation: None,
            });
        }

        // TODO: restore the limit active before the profile once product
        // confirms it should not reset to full capacity.
        let capacity = station.total_amperage();
        info!(
            station_id = station.id.as_str(),
            profile_id = profile.profile_id,
            capacity,
            "Profile cleared, reapplying static limitation"
        );
        let applied = self
            .power_limitation
            .set_static_power_limitation(tenant_id, station, 0, capacity)
            .await?;
        Ok(ClearedProfile {
            cleared,
            static_limitation: Some(applied),
        })
    }

    /// Composite schedule in canonical amps.
    pub async fn get_composite_schedule(
        &self,
        tenant_id: &str,
        station: &ChargingStation,
        connector_id: u32,
        duration_secs: i32,
    ) -> ControlResult<Dispatched<CompositeScheduleResult>> {
        Self::require_profiles(station)?;
        Self::require_connector(station, connector_id)?;

        let vendor = self.vendors.profile_for(&station.vendor);
        let rate_unit = match station.power_limit_unit {
            PowerLimitUnit::Ampere => ChargingRateUnit::Ampere,
            PowerLimitUnit::Watt => ChargingRateUnit::Watt,
        };
        let channel = self.channels.channel_for(tenant_id, station).await?;

        let dispatched = with_fallback(
            channel.as_ref(),
            station,
            connector_id,
            |connector_id| Command::GetCompositeSchedule {
                connector_id,
                duration_secs,
                rate_unit: Some(rate_unit),
            },
            |connector_id, response| match response {
                CommandResponse::CompositeSchedule(result) if result.status.is_accepted() => {
                    DeviceOutcome::Accepted(CompositeScheduleResult {
                        schedule: result
                            .schedule
                            .as_ref()
                            .map(|s| vendor.from_device_schedule(s, connector_id, station)),
                        ..result
                    })
                }
                other => DeviceOutcome::Rejected(rejection(&other)),
            },
        )
        .await?;
        Ok(dispatched)
    }

    /// What `connector_id` may draw right now. Never fails on device errors;
    /// falls back to the connector's own limit.
    pub async fn get_current_connector_limit(
        &self,
        tenant_id: &str,
        station: &ChargingStation,
        connector_id: u32,
    ) -> ControlResult<ConnectorCurrentLimit> {
        if connector_id == 0 {
            return Err(ControlError::validation(
                &station.id,
                "current limit is only defined for a physical connector",
            ));
        }
        let connector = station.connector(connector_id).ok_or_else(|| {
            ControlError::validation(&station.id, format!("unknown connector {}", connector_id))
        })?;
        let max_amps = connector.amperage;
        let voltage = if connector.voltage > 0.0 {
            connector.voltage
        } else {
            station.voltage()
        };
        let limit = |amps: f64, source: LimitSource| {
            let limit_amps = amps.min(max_amps);
            ConnectorCurrentLimit {
                limit_amps,
                limit_watts: units::amps_to_watts(limit_amps, voltage),
                source,
            }
        };

        if station.capabilities.supports_charging_profiles {
            match self
                .get_composite_schedule(tenant_id, station, connector_id, CURRENT_LIMIT_WINDOW_SECS)
                .await
            {
                Ok(Dispatched::Single(DeviceOutcome::Accepted(result))) => {
                    if let Some(period) = result.schedule.as_ref().and_then(|s| s.active_now()) {
                        return Ok(limit(period.limit, LimitSource::ChargingProfile));
                    }
                    debug!(station_id = station.id.as_str(), connector_id, "No schedule in force now");
                }
                Ok(other) => {
                    debug!(station_id = station.id.as_str(), connector_id, result = ?other, "Composite schedule not available")
                }
                Err(e) => {
                    warn!(station_id = station.id.as_str(), connector_id, error = %e, "Composite schedule read failed")
                }
            }
        }

        if station.capabilities.supports_static_limitation {
            match self.read_static_limitation(tenant_id, station).await {
                Ok(Some(station_amps)) => {
                    let share = units::to_per_connector(station_amps, station.connectors.len());
                    return Ok(limit(share, LimitSource::StaticLimitation));
                }
                Ok(None) => {
                    debug!(station_id = station.id.as_str(), "Static limitation key not reported")
                }
                Err(e) => {
                    warn!(station_id = station.id.as_str(), error = %e, "Static limitation read failed")
                }
            }
        }

        let default_amps = if connector.amperage_limit > 0.0 {
            connector.amperage_limit
        } else {
            connector.amperage
        };
        Ok(limit(default_amps, LimitSource::ConnectorDefault))
    }

    /// Station amps currently configured under the vendor's static key.
    async fn read_static_limitation(
        &self,
        tenant_id: &str,
        station: &ChargingStation,
    ) -> ControlResult<Option<f64>> {
        let vendor = self.vendors.profile_for(&station.vendor);
        let key = vendor.static_limit_key(station).to_string();
        let channel = self.channels.channel_for(tenant_id, station).await?;
        let response = dispatch_recorded(
            channel.as_ref(),
            &Command::GetConfiguration {
                keys: vec![key.clone()],
            },
        )
        .await?;

        let CommandResponse::Configuration(config) = response else {
            return Ok(None);
        };
        Ok(config
            .value_of(&key)
            .and_then(|v| v.trim().parse::<f64>().ok())
            .map(|value| vendor.from_device_units(value, station)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::commands::{ConfigurationResult, KeyValue};
    use crate::application::testing::{station, ScriptedChannel, ScriptedProvider};
    use crate::domain::{Schedule, SchedulePeriod};
    use crate::infrastructure::InMemoryStationDirectory;

    fn engine(channel: Arc<ScriptedChannel>) -> ChargingProfileEngine {
        let provider = ScriptedProvider::new(channel);
        let vendors = Arc::new(VendorRegistry::new());
        let power = Arc::new(PowerLimitationEngine::new(
            provider.clone(),
            Arc::new(InMemoryStationDirectory::new()),
            vendors.clone(),
        ));
        ChargingProfileEngine::new(provider, vendors, power)
    }

    fn profile(connector_id: u32) -> ChargingProfile {
        ChargingProfile::new(
            7,
            "CS-1",
            connector_id,
            Schedule::amps(vec![SchedulePeriod::new(0, 48.0), SchedulePeriod::new(600, 24.0)]),
        )
    }

    fn rejects_connector_zero(command: &Command) -> Result<CommandResponse, CommandError> {
        let status = match command {
            Command::SetChargingProfile { connector_id: 0, .. } => CommandStatus::Rejected,
            Command::ClearChargingProfile(c) if c.connector_id == Some(0) => CommandStatus::Unknown,
            _ => CommandStatus::Accepted,
        };
        Ok(CommandResponse::Status(status))
    }

    fn composite(limit: f64, start_period: i32) -> CommandResponse {
        CommandResponse::CompositeSchedule(CompositeScheduleResult {
            status: CommandStatus::Accepted,
            connector_id: Some(1),
            schedule_start: None,
            schedule: Some(Schedule::amps(vec![SchedulePeriod::new(start_period, limit)])),
        })
    }

    #[tokio::test]
    async fn station_wide_profile_accepted_once() {
        let channel = ScriptedChannel::accepting();
        let result = engine(channel.clone())
            .set_charging_profile("t1", &station(2, 32.0, 1), &profile(0))
            .await
            .unwrap();
        assert_eq!(result, Dispatched::Single(DeviceOutcome::Accepted(())));
        assert_eq!(channel.count(), 1);
    }

    #[tokio::test]
    async fn rejected_station_profile_falls_back_per_connector() {
        let channel = ScriptedChannel::new(rejects_connector_zero);
        let cs = station(3, 32.0, 1);

        let result = engine(channel.clone())
            .set_charging_profile("t1", &cs, &profile(0))
            .await
            .unwrap();

        match &result {
            Dispatched::PerConnector(outcomes) => {
                assert_eq!(
                    outcomes.iter().map(|o| o.connector_id).collect::<Vec<_>>(),
                    vec![1, 2, 3]
                );
                assert!(outcomes.iter().all(|o| o.outcome.is_accepted()));
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(channel.count(), 1 + cs.connectors.len());

        let targets: Vec<u32> = channel
            .commands()
            .iter()
            .map(|c| match c {
                Command::SetChargingProfile { connector_id, profile } => {
                    assert_eq!(profile.connector_id, 0);
                    *connector_id
                }
                other => panic!("unexpected {:?}", other),
            })
            .collect();
        assert_eq!(targets, vec![0, 1, 2, 3]);
    }

    #[tokio::test]
    async fn connector_profile_has_no_fallback() {
        let channel = ScriptedChannel::new(|_| Ok(CommandResponse::Status(CommandStatus::Rejected)));
        let result = engine(channel.clone())
            .set_charging_profile("t1", &station(3, 32.0, 1), &profile(2))
            .await
            .unwrap();
        assert_eq!(
            result,
            Dispatched::Single(DeviceOutcome::Rejected(CommandStatus::Rejected))
        );
        assert_eq!(channel.count(), 1);
    }

    #[tokio::test]
    async fn transport_fault_aborts_fallback_loop() {
        let channel = ScriptedChannel::new(|command| match command {
            Command::SetChargingProfile { connector_id: 0, .. } => {
                Ok(CommandResponse::Status(CommandStatus::Rejected))
            }
            Command::SetChargingProfile { connector_id: 2, .. } => {
                Err(CommandError::transport("CS-1", "SetChargingProfile", "connection reset"))
            }
            _ => Ok(CommandResponse::Status(CommandStatus::Accepted)),
        });
        let err = engine(channel.clone())
            .set_charging_profile("t1", &station(3, 32.0, 1), &profile(0))
            .await
            .unwrap_err();
        assert!(matches!(err, ControlError::Command(CommandError::Transport { .. })));
        assert_eq!(channel.count(), 3);
    }

    #[tokio::test]
    async fn missing_capability_is_configuration_fault_without_io() {
        let channel = ScriptedChannel::accepting();
        let mut cs = station(2, 32.0, 1);
        cs.capabilities.supports_charging_profiles = false;

        let err = engine(channel.clone())
            .set_charging_profile("t1", &cs, &profile(0))
            .await
            .unwrap_err();
        assert!(matches!(err, ControlError::Configuration { .. }));
        assert_eq!(channel.count(), 0);
    }

    #[tokio::test]
    async fn invalid_schedule_and_connector_rejected_without_io() {
        let channel = ScriptedChannel::accepting();
        let engine = engine(channel.clone());
        let cs = station(2, 32.0, 1);

        let mut unordered = profile(0);
        unordered.schedule.periods.reverse();
        let err = engine.set_charging_profile("t1", &cs, &unordered).await.unwrap_err();
        assert!(matches!(err, ControlError::Validation { .. }));

        let err = engine.set_charging_profile("t1", &cs, &profile(9)).await.unwrap_err();
        assert!(matches!(err, ControlError::Validation { .. }));
        assert_eq!(channel.count(), 0);
    }

    #[tokio::test]
    async fn profile_is_converted_for_watt_stations() {
        let channel = ScriptedChannel::accepting();
        let mut cs = station(2, 32.0, 1);
        cs.power_limit_unit = PowerLimitUnit::Watt;

        engine(channel.clone())
            .set_charging_profile("t1", &cs, &profile(0))
            .await
            .unwrap();
        match &channel.commands()[0] {
            Command::SetChargingProfile { profile, .. } => {
                assert_eq!(profile.schedule.rate_unit, ChargingRateUnit::Watt);
                assert_eq!(profile.schedule.periods[0].limit, 48.0 * 230.0);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn clear_reapplies_total_capacity_once() {
        let channel = ScriptedChannel::accepting();
        let cs = station(2, 32.0, 1);

        let cleared = engine(channel.clone())
            .clear_charging_profile("t1", &cs, &profile(0))
            .await
            .unwrap();

        assert_eq!(cleared.cleared, Dispatched::Single(DeviceOutcome::Accepted(())));
        let applied = cleared.static_limitation.unwrap();
        assert!(applied.station.connectors.iter().all(|c| c.amperage_limit == 32.0));

        let commands = channel.commands();
        assert!(matches!(commands[0], Command::ClearChargingProfile(_)));
        let changes: Vec<&Command> = commands
            .iter()
            .filter(|c| matches!(c, Command::ChangeConfiguration { .. }))
            .collect();
        assert_eq!(
            changes,
            vec![&Command::ChangeConfiguration {
                key: "MaxCurrent".into(),
                value: "64".into()
            }]
        );
    }

    #[tokio::test]
    async fn station_profile_is_scaled_for_vendor_shape() {
        // Schneider splits station-wide schedules per connector, Delta per phase.
        let cases = [("Schneider Electric", 24.0), ("Delta Electronics", 16.0)];
        for (vendor, first_limit) in cases {
            let channel = ScriptedChannel::accepting();
            let mut cs = station(2, 32.0, 3);
            cs.vendor = vendor.into();

            engine(channel.clone())
                .set_charging_profile("t1", &cs, &profile(0))
                .await
                .unwrap();
            match &channel.commands()[0] {
                Command::SetChargingProfile { profile, .. } => {
                    assert!(
                        (profile.schedule.periods[0].limit - first_limit).abs() < 1e-9,
                        "{}",
                        vendor
                    );
                }
                other => panic!("unexpected {:?}", other),
            }
        }
    }

    #[tokio::test]
    async fn clear_reapplies_capacity_in_vendor_units() {
        let channel = ScriptedChannel::accepting();
        let mut cs = station(2, 32.0, 1);
        cs.vendor = "Keba AG".into();

        let cleared = engine(channel.clone())
            .clear_charging_profile("t1", &cs, &profile(0))
            .await
            .unwrap();

        assert!(channel.commands().contains(&Command::ChangeConfiguration {
            key: "MaxCurrent".into(),
            value: "64000".into()
        }));
        let applied = cleared.static_limitation.unwrap();
        assert!(applied.station.connectors.iter().all(|c| c.amperage_limit == 32.0));
    }

    #[tokio::test]
    async fn static_limit_is_read_back_from_vendor_units() {
        let channel = ScriptedChannel::new(|command| match command {
            Command::GetConfiguration { keys } => {
                assert_eq!(keys, &vec!["MaxCurrent".to_string()]);
                Ok(CommandResponse::Configuration(ConfigurationResult {
                    configuration_key: vec![KeyValue {
                        key: "MaxCurrent".into(),
                        readonly: false,
                        value: Some("40000".into()),
                    }],
                    unknown_key: vec![],
                }))
            }
            _ => Ok(CommandResponse::Status(CommandStatus::Accepted)),
        });
        let mut cs = station(2, 32.0, 1);
        cs.vendor = "Keba AG".into();
        cs.capabilities.supports_charging_profiles = false;

        let limit = engine(channel)
            .get_current_connector_limit("t1", &cs, 1)
            .await
            .unwrap();
        assert_eq!(limit.source, LimitSource::StaticLimitation);
        assert_eq!(limit.limit_amps, 20.0);
    }

    #[tokio::test]
    async fn clear_after_per_connector_fallback_still_reapplies() {
        let channel = ScriptedChannel::new(rejects_connector_zero);
        let cs = station(2, 32.0, 1);

        let cleared = engine(channel.clone())
            .clear_charging_profile("t1", &cs, &profile(0))
            .await
            .unwrap();
        assert!(cleared.cleared.is_per_connector());
        assert!(cleared.static_limitation.is_some());

        // clear(0), clear(1), clear(2), then ChangeConfiguration after them
        let commands = channel.commands();
        assert!(commands[..3]
            .iter()
            .all(|c| matches!(c, Command::ClearChargingProfile(_))));
        assert!(matches!(commands[3], Command::ChangeConfiguration { .. }));
    }

    #[tokio::test]
    async fn rejected_connector_clear_does_not_reapply() {
        let channel = ScriptedChannel::new(|_| Ok(CommandResponse::Status(CommandStatus::Unknown)));
        let cleared = engine(channel.clone())
            .clear_charging_profile("t1", &station(2, 32.0, 1), &profile(1))
            .await
            .unwrap();
        assert!(cleared.static_limitation.is_none());
        assert_eq!(channel.count(), 1);
    }

    #[tokio::test]
    async fn composite_schedule_is_returned_in_canonical_amps() {
        let channel = ScriptedChannel::new(|_| {
            Ok(CommandResponse::CompositeSchedule(CompositeScheduleResult {
                status: CommandStatus::Accepted,
                connector_id: Some(0),
                schedule_start: None,
                schedule: Some(Schedule {
                    rate_unit: ChargingRateUnit::Watt,
                    duration_secs: Some(3600),
                    start_schedule: None,
                    min_charging_rate: None,
                    periods: vec![SchedulePeriod::new(0, 7360.0)],
                }),
            }))
        });
        let result = engine(channel)
            .get_composite_schedule("t1", &station(2, 32.0, 1), 0, 3600)
            .await
            .unwrap();
        match result {
            Dispatched::Single(DeviceOutcome::Accepted(composite)) => {
                let schedule = composite.schedule.unwrap();
                assert_eq!(schedule.rate_unit, ChargingRateUnit::Ampere);
                assert!((schedule.periods[0].limit - 32.0).abs() < 1e-9);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn current_limit_from_profile_is_capped_and_idempotent() {
        let channel = ScriptedChannel::new(|_| Ok(composite(40.0, 0)));
        let engine = engine(channel);
        let cs = station(2, 32.0, 1);

        let first = engine.get_current_connector_limit("t1", &cs, 1).await.unwrap();
        let second = engine.get_current_connector_limit("t1", &cs, 1).await.unwrap();
        assert_eq!(first.source, LimitSource::ChargingProfile);
        assert_eq!(first.limit_amps, 32.0);
        assert_eq!(first.limit_watts, 32.0 * 230.0);
        assert_eq!(
            (first.limit_amps, first.source),
            (second.limit_amps, second.source)
        );
    }

    #[tokio::test]
    async fn current_limit_falls_back_to_static_limitation() {
        let channel = ScriptedChannel::new(|command| match command {
            // Schedule starts later, so nothing is in force now
            Command::GetCompositeSchedule { .. } => Ok(composite(10.0, 300)),
            Command::GetConfiguration { .. } => Ok(CommandResponse::Configuration(ConfigurationResult {
                configuration_key: vec![KeyValue {
                    key: "MaxCurrent".into(),
                    readonly: false,
                    value: Some("40".into()),
                }],
                unknown_key: vec![],
            })),
            _ => Ok(CommandResponse::Status(CommandStatus::Accepted)),
        });
        let limit = engine(channel)
            .get_current_connector_limit("t1", &station(2, 32.0, 1), 2)
            .await
            .unwrap();
        assert_eq!(limit.source, LimitSource::StaticLimitation);
        assert_eq!(limit.limit_amps, 20.0);
    }

    #[tokio::test]
    async fn current_limit_degrades_to_connector_default() {
        let channel = ScriptedChannel::new(|command| {
            Err(CommandError::transport("CS-1", command.action(), "timeout"))
        });
        let engine = engine(channel);
        let mut cs = station(2, 32.0, 1);
        cs.connectors[0].amperage_limit = 16.0;

        let limit = engine.get_current_connector_limit("t1", &cs, 1).await.unwrap();
        assert_eq!(limit.source, LimitSource::ConnectorDefault);
        assert_eq!(limit.limit_amps, 16.0);

        let err = engine.get_current_connector_limit("t1", &cs, 0).await.unwrap_err();
        assert!(matches!(err, ControlError::Validation { .. }));
    }
}
