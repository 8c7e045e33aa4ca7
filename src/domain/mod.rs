//! Domain model: stations, charging profiles, locks

pub mod charging_profile;
pub mod charging_station;
pub mod connector_limit;
pub mod lock;
pub mod ocpp;

pub use charging_profile::{
    ChargingProfile, ChargingProfileKind, ChargingProfilePurpose, ChargingRateUnit,
    RecurrencyKind, Schedule, SchedulePeriod,
};
pub use charging_station::{
    Capabilities, ChargePoint, ChargingStation, Connector, ConnectorStatus, CurrentType,
    OcppParameter, PowerLimitUnit, DEFAULT_VOLTAGE,
};
pub use connector_limit::{ConnectorCurrentLimit, LimitSource};
pub use lock::{Lock, LockScope};
pub use ocpp::{OcppProtocol, OcppVersion};
