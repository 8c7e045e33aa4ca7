//! OCPP protocol flavour and version
//!
//! A station talks either the SOAP flavour (1.2, 1.5, 1.6) or the JSON
//! flavour (1.6, 2.0.1). The pair decides which command channel is built.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Wire protocol family used by a charging station.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OcppProtocol {
    /// OCPP-S: SOAP envelopes over HTTP, station exposes a callback URL.
    Soap,
    /// OCPP-J: JSON frames over a websocket session.
    Json,
}

impl fmt::Display for OcppProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Soap => write!(f, "SOAP"),
            Self::Json => write!(f, "JSON"),
        }
    }
}

/// OCPP protocol versions known to the control plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OcppVersion {
    #[serde(rename = "1.2")]
    V12,
    #[serde(rename = "1.5")]
    V15,
    #[serde(rename = "1.6")]
    V16,
    #[serde(rename = "2.0.1")]
    V201,
}

impl OcppVersion {
    /// Human-readable version string.
    pub fn version_string(&self) -> &'static str {
        match self {
            Self::V12 => "1.2",
            Self::V15 => "1.5",
            Self::V16 => "1.6",
            Self::V201 => "2.0.1",
        }
    }

    /// Websocket subprotocol identifier for the JSON flavour.
    pub fn subprotocol(&self) -> &'static str {
        match self {
            Self::V12 => "ocpp1.2",
            Self::V15 => "ocpp1.5",
            Self::V16 => "ocpp1.6",
            Self::V201 => "ocpp2.0.1",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "1.2" => Some(Self::V12),
            "1.5" => Some(Self::V15),
            "1.6" => Some(Self::V16),
            "2.0.1" => Some(Self::V201),
            _ => None,
        }
    }
}

impl fmt::Display for OcppVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OCPP {}", self.version_string())
    }
}
