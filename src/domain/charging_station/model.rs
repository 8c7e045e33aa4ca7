//! Charging station domain entity

use serde::{Deserialize, Serialize};

use super::super::ocpp::{OcppProtocol, OcppVersion};

/// Default mains voltage used when a connector does not declare one.
pub const DEFAULT_VOLTAGE: f64 = 230.0;

/// Connector status as last reported by the station.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConnectorStatus {
    #[default]
    Available,
    Preparing,
    Charging,
    SuspendedEV,
    SuspendedEVSE,
    Finishing,
    Reserved,
    Unavailable,
    Faulted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CurrentType {
    #[default]
    AC,
    DC,
}

/// Unit the station expects for power limits and charging schedules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PowerLimitUnit {
    #[default]
    #[serde(rename = "A")]
    Ampere,
    #[serde(rename = "W")]
    Watt,
}

/// Smart charging features the station is known to implement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Capabilities {
    pub supports_static_limitation: bool,
    pub supports_charging_profiles: bool,
}

/// One physical socket.
///
/// `amperage` and `amperage_limit` are totals over all phases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connector {
    pub connector_id: u32,
    pub charge_point_id: Option<u32>,
    /// Rated maximum current.
    pub amperage: f64,
    /// Currently configured ceiling; only changed after a device acknowledgment.
    pub amperage_limit: f64,
    /// Rated power in watts.
    pub power: f64,
    pub voltage: f64,
    pub current_type: CurrentType,
    pub number_of_phases: u32,
    pub status: ConnectorStatus,
}

impl Connector {
    /// A single-phase 230 V AC connector rated at `amperage`.
    pub fn new(connector_id: u32, amperage: f64) -> Self {
        Self {
            connector_id,
            charge_point_id: None,
            amperage,
            amperage_limit: amperage,
            power: amperage * DEFAULT_VOLTAGE,
            voltage: DEFAULT_VOLTAGE,
            current_type: CurrentType::AC,
            number_of_phases: 1,
            status: ConnectorStatus::default(),
        }
    }

    pub fn with_phases(mut self, number_of_phases: u32) -> Self {
        self.number_of_phases = number_of_phases.max(1);
        self
    }

    /// Phases used for limit math; DC connectors count as one.
    pub fn effective_phases(&self) -> u32 {
        match self.current_type {
            CurrentType::DC => 1,
            CurrentType::AC => self.number_of_phases.max(1),
        }
    }
}

/// A group of connectors sharing one power feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChargePoint {
    pub charge_point_id: u32,
    pub connector_ids: Vec<u32>,
    /// Vendor key override for static limitation on this feed.
    pub ocpp_param_for_power_limitation: Option<String>,
}

/// A configuration key as last read from the device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OcppParameter {
    pub key: String,
    pub value: Option<String>,
    pub readonly: bool,
}

/// Charging station record, owned by the caller for the duration of a call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChargingStation {
    pub id: String,
    /// Locally owned; `false` means a roaming station reached through a
    /// roaming client.
    pub issuer: bool,
    pub ocpp_protocol: OcppProtocol,
    pub ocpp_version: OcppVersion,
    pub vendor: String,
    pub model: Option<String>,
    /// Callback endpoint of SOAP stations.
    pub charging_station_url: Option<String>,
    pub site_area_id: Option<String>,
    pub connectors: Vec<Connector>,
    pub charge_points: Vec<ChargePoint>,
    pub capabilities: Capabilities,
    pub power_limit_unit: PowerLimitUnit,
    pub ocpp_parameters: Vec<OcppParameter>,
}

impl ChargingStation {
    pub fn new(
        id: impl Into<String>,
        ocpp_protocol: OcppProtocol,
        ocpp_version: OcppVersion,
        vendor: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            issuer: true,
            ocpp_protocol,
            ocpp_version,
            vendor: vendor.into(),
            model: None,
            charging_station_url: None,
            site_area_id: None,
            connectors: Vec::new(),
            charge_points: Vec::new(),
            capabilities: Capabilities::default(),
            power_limit_unit: PowerLimitUnit::default(),
            ocpp_parameters: Vec::new(),
        }
    }

    pub fn connector(&self, connector_id: u32) -> Option<&Connector> {
        self.connectors
            .iter()
            .find(|c| c.connector_id == connector_id)
    }

    /// Connector ids in ascending order.
    pub fn connector_ids(&self) -> Vec<u32> {
        let mut ids: Vec<u32> = self.connectors.iter().map(|c| c.connector_id).collect();
        ids.sort_unstable();
        ids
    }

    /// Sum of rated connector amperage.
    pub fn total_amperage(&self) -> f64 {
        self.connectors.iter().map(|c| c.amperage).sum()
    }

    /// Phase count used for per-phase conversions (widest connector wins).
    pub fn number_of_phases(&self) -> u32 {
        self.connectors
            .iter()
            .map(Connector::effective_phases)
            .max()
            .unwrap_or(1)
    }

    /// Voltage used for amp/watt conversions.
    pub fn voltage(&self) -> f64 {
        self.connectors
            .iter()
            .map(|c| c.voltage)
            .find(|v| *v > 0.0)
            .unwrap_or(DEFAULT_VOLTAGE)
    }

    /// Static limitation key override declared on the first charge point.
    pub fn power_limitation_key_override(&self) -> Option<&str> {
        self.charge_points
            .iter()
            .find_map(|cp| cp.ocpp_param_for_power_limitation.as_deref())
    }

    pub fn ocpp_parameter(&self, key: &str) -> Option<&OcppParameter> {
        self.ocpp_parameters
            .iter()
            .find(|p| p.key.eq_ignore_ascii_case(key))
    }
}
