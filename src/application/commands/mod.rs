//! Command vocabulary shared by every transport
//!
//! ```text
//! engines ──► Command ──► CommandChannel (JSON live | JSON remote | SOAP | roaming)
//!                                 │
//!            CommandResponse ◄────┘  (normalized, device units untouched)
//! ```
//!
//! [`Command`] is the fixed set of central-system → station actions. Each
//! variant serializes to its OCPP 1.6 request payload (see [`payload`]) and
//! every transport maps the station's answer back into [`CommandResponse`]
//! (see [`response`]). No unit conversion happens here; that is the vendor
//! layer's job.

pub mod payload;
pub mod response;

use std::fmt;

use chrono::{DateTime, Utc};

use crate::domain::{ChargingProfile, ChargingProfilePurpose, ChargingRateUnit, Schedule};

/// Reset kind for the Reset command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetKind {
    Soft,
    Hard,
}

/// Availability state for the ChangeAvailability command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    Operative,
    Inoperative,
}

/// Selection criteria for ClearChargingProfile. Unset fields match anything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClearChargingProfileCriteria {
    pub profile_id: Option<i32>,
    pub connector_id: Option<u32>,
    pub purpose: Option<ChargingProfilePurpose>,
    pub stack_level: Option<i32>,
}

/// A central-system → charging-station command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Reset {
        kind: ResetKind,
    },
    ClearCache,
    GetConfiguration {
        /// Empty means "all keys".
        keys: Vec<String>,
    },
    ChangeConfiguration {
        key: String,
        value: String,
    },
    RemoteStartTransaction {
        connector_id: Option<u32>,
        id_tag: String,
        charging_profile: Option<ChargingProfile>,
    },
    RemoteStopTransaction {
        transaction_id: i32,
    },
    UnlockConnector {
        connector_id: u32,
    },
    SetChargingProfile {
        connector_id: u32,
        /// Already converted to the device's units and shape.
        profile: ChargingProfile,
    },
    GetCompositeSchedule {
        connector_id: u32,
        duration_secs: i32,
        rate_unit: Option<ChargingRateUnit>,
    },
    ClearChargingProfile(ClearChargingProfileCriteria),
    ChangeAvailability {
        connector_id: u32,
        availability: Availability,
    },
    GetDiagnostics {
        location: String,
        retries: Option<i32>,
        retry_interval: Option<i32>,
        start_time: Option<DateTime<Utc>>,
        stop_time: Option<DateTime<Utc>>,
    },
    UpdateFirmware {
        location: String,
        retrieve_date: DateTime<Utc>,
        retries: Option<i32>,
        retry_interval: Option<i32>,
    },
}

impl Command {
    /// OCPP action name.
    pub fn action(&self) -> &'static str {
        match self {
            Self::Reset { .. } => "Reset",
            Self::ClearCache => "ClearCache",
            Self::GetConfiguration { .. } => "GetConfiguration",
            Self::ChangeConfiguration { .. } => "ChangeConfiguration",
            Self::RemoteStartTransaction { .. } => "RemoteStartTransaction",
            Self::RemoteStopTransaction { .. } => "RemoteStopTransaction",
            Self::UnlockConnector { .. } => "UnlockConnector",
            Self::SetChargingProfile { .. } => "SetChargingProfile",
            Self::GetCompositeSchedule { .. } => "GetCompositeSchedule",
            Self::ClearChargingProfile(_) => "ClearChargingProfile",
            Self::ChangeAvailability { .. } => "ChangeAvailability",
            Self::GetDiagnostics { .. } => "GetDiagnostics",
            Self::UpdateFirmware { .. } => "UpdateFirmware",
        }
    }
}

/// Normalized status vocabulary across all status-returning commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandStatus {
    Accepted,
    Rejected,
    RebootRequired,
    NotSupported,
    Scheduled,
    Unlocked,
    UnlockFailed,
    /// ClearChargingProfile found nothing to clear.
    Unknown,
    Other(String),
}

impl CommandStatus {
    pub fn parse(s: &str) -> Self {
        match s {
            "Accepted" => Self::Accepted,
            "Rejected" => Self::Rejected,
            "RebootRequired" => Self::RebootRequired,
            "NotSupported" => Self::NotSupported,
            "Scheduled" => Self::Scheduled,
            "Unlocked" => Self::Unlocked,
            "UnlockFailed" => Self::UnlockFailed,
            "Unknown" => Self::Unknown,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }
}

impl fmt::Display for CommandStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Accepted => write!(f, "Accepted"),
            Self::Rejected => write!(f, "Rejected"),
            Self::RebootRequired => write!(f, "RebootRequired"),
            Self::NotSupported => write!(f, "NotSupported"),
            Self::Scheduled => write!(f, "Scheduled"),
            Self::Unlocked => write!(f, "Unlocked"),
            Self::UnlockFailed => write!(f, "UnlockFailed"),
            Self::Unknown => write!(f, "Unknown"),
            Self::Other(s) => write!(f, "{}", s),
        }
    }
}

/// A configuration key-value pair returned by GetConfiguration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyValue {
    pub key: String,
    pub readonly: bool,
    pub value: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigurationResult {
    pub configuration_key: Vec<KeyValue>,
    pub unknown_key: Vec<String>,
}

impl ConfigurationResult {
    pub fn value_of(&self, key: &str) -> Option<&str> {
        self.configuration_key
            .iter()
            .find(|kv| kv.key.eq_ignore_ascii_case(key))
            .and_then(|kv| kv.value.as_deref())
    }
}

/// GetCompositeSchedule answer, schedule still in device units.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeScheduleResult {
    pub status: CommandStatus,
    pub connector_id: Option<u32>,
    pub schedule_start: Option<DateTime<Utc>>,
    pub schedule: Option<Schedule>,
}

/// Normalized station answer.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandResponse {
    Status(CommandStatus),
    Configuration(ConfigurationResult),
    CompositeSchedule(CompositeScheduleResult),
    Diagnostics { file_name: Option<String> },
    /// UpdateFirmware has an empty confirmation.
    Empty,
}

impl CommandResponse {
    /// Status carried by the response, if the command returns one.
    pub fn status(&self) -> Option<&CommandStatus> {
        match self {
            Self::Status(status) => Some(status),
            Self::CompositeSchedule(result) => Some(&result.status),
            _ => None,
        }
    }
}
