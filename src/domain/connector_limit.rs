//! Resolved current ceiling of one connector

use serde::{Deserialize, Serialize};

/// Where a resolved connector limit came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LimitSource {
    ChargingProfile,
    StaticLimitation,
    ConnectorDefault,
}

/// What a connector is allowed to draw right now.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConnectorCurrentLimit {
    pub limit_amps: f64,
    pub limit_watts: f64,
    pub source: LimitSource,
}
