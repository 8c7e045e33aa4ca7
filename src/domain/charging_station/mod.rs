pub mod model;

pub use model::{
    Capabilities, ChargePoint, ChargingStation, Connector, ConnectorStatus, CurrentType,
    OcppParameter, PowerLimitUnit, DEFAULT_VOLTAGE,
};
