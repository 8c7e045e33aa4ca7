//! OCPP 1.6 request payloads
//!
//! Plain requests go through the `rust_ocpp::v1_6` message types; requests
//! carrying a charging profile use local wire structs so the domain profile
//! never has to round-trip through `Decimal`.

use chrono::{DateTime, Utc};
use rust_ocpp::v1_6::messages::change_configuration::ChangeConfigurationRequest;
use rust_ocpp::v1_6::messages::clear_cache::ClearCacheRequest;
use rust_ocpp::v1_6::messages::get_composite_schedule::GetCompositeScheduleRequest;
use rust_ocpp::v1_6::messages::get_configuration::GetConfigurationRequest;
use rust_ocpp::v1_6::messages::get_diagnostics::GetDiagnosticsRequest;
use rust_ocpp::v1_6::messages::remote_stop_transaction::RemoteStopTransactionRequest;
use rust_ocpp::v1_6::messages::reset::ResetRequest;
use rust_ocpp::v1_6::messages::unlock_connector::UnlockConnectorRequest;
use rust_ocpp::v1_6::messages::update_firmware::UpdateFirmwareRequest;
use rust_ocpp::v1_6::types::{ChargingRateUnitType, ResetRequestStatus};
use serde::Serialize;
use serde_json::Value;

use super::{Availability, ClearChargingProfileCriteria, Command, ResetKind};
use crate::domain::{
    ChargingProfile, ChargingProfileKind, ChargingProfilePurpose, ChargingRateUnit,
    RecurrencyKind, Schedule,
};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireSchedulePeriod {
    start_period: i32,
    limit: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    number_phases: Option<u32>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireSchedule {
    #[serde(skip_serializing_if = "Option::is_none")]
    duration: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    start_schedule: Option<DateTime<Utc>>,
    charging_rate_unit: ChargingRateUnit,
    charging_schedule_period: Vec<WireSchedulePeriod>,
    #[serde(skip_serializing_if = "Option::is_none")]
    min_charging_rate: Option<f64>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireChargingProfile {
    charging_profile_id: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    transaction_id: Option<i32>,
    stack_level: i32,
    charging_profile_purpose: ChargingProfilePurpose,
    charging_profile_kind: ChargingProfileKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    recurrency_kind: Option<RecurrencyKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    valid_from: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    valid_to: Option<DateTime<Utc>>,
    charging_schedule: WireSchedule,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SetChargingProfileWire {
    connector_id: u32,
    cs_charging_profiles: WireChargingProfile,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RemoteStartWire {
    #[serde(skip_serializing_if = "Option::is_none")]
    connector_id: Option<u32>,
    id_tag: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    charging_profile: Option<WireChargingProfile>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ClearChargingProfileWire {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    connector_id: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    charging_profile_purpose: Option<ChargingProfilePurpose>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stack_level: Option<i32>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ChangeAvailabilityWire {
    connector_id: u32,
    #[serde(rename = "type")]
    kind: &'static str,
}

/// OCPP limits carry one decimal.
fn round_limit(limit: f64) -> f64 {
    (limit * 10.0).round() / 10.0
}

fn wire_schedule(schedule: &Schedule) -> WireSchedule {
    WireSchedule {
        duration: schedule.duration_secs,
        start_schedule: schedule.start_schedule,
        charging_rate_unit: schedule.rate_unit,
        charging_schedule_period: schedule
            .periods
            .iter()
            .map(|p| WireSchedulePeriod {
                start_period: p.start_period,
                limit: round_limit(p.limit),
                number_phases: p.number_phases,
            })
            .collect(),
        min_charging_rate: schedule.min_charging_rate.map(round_limit),
    }
}

fn wire_profile(profile: &ChargingProfile) -> WireChargingProfile {
    WireChargingProfile {
        charging_profile_id: profile.profile_id,
        transaction_id: profile.transaction_id,
        stack_level: profile.stack_level,
        charging_profile_purpose: profile.purpose,
        charging_profile_kind: profile.kind,
        recurrency_kind: profile.recurrency_kind,
        valid_from: profile.valid_from,
        valid_to: profile.valid_to,
        charging_schedule: wire_schedule(&profile.schedule),
    }
}

fn clear_wire(criteria: &ClearChargingProfileCriteria) -> ClearChargingProfileWire {
    ClearChargingProfileWire {
        id: criteria.profile_id,
        connector_id: criteria.connector_id,
        charging_profile_purpose: criteria.purpose,
        stack_level: criteria.stack_level,
    }
}

/// Build the OCPP 1.6 request payload for `command`.
pub fn request_payload(command: &Command) -> Result<Value, serde_json::Error> {
    match command {
        Command::Reset { kind } => serde_json::to_value(ResetRequest {
            kind: match kind {
                ResetKind::Soft => ResetRequestStatus::Soft,
                ResetKind::Hard => ResetRequestStatus::Hard,
            },
        }),
        Command::ClearCache => serde_json::to_value(ClearCacheRequest {}),
        Command::GetConfiguration { keys } => serde_json::to_value(GetConfigurationRequest {
            key: (!keys.is_empty()).then(|| keys.clone()),
        }),
        Command::ChangeConfiguration { key, value } => {
            serde_json::to_value(ChangeConfigurationRequest {
                key: key.clone(),
                value: value.clone(),
            })
        }
        Command::RemoteStartTransaction {
            connector_id,
            id_tag,
            charging_profile,
        } => serde_json::to_value(RemoteStartWire {
            connector_id: *connector_id,
            id_tag: id_tag.clone(),
            charging_profile: charging_profile.as_ref().map(wire_profile),
        }),
        Command::RemoteStopTransaction { transaction_id } => {
            serde_json::to_value(RemoteStopTransactionRequest {
                transaction_id: *transaction_id,
            })
        }
        Command::UnlockConnector { connector_id } => {
            serde_json::to_value(UnlockConnectorRequest {
                connector_id: *connector_id,
            })
        }
        Command::SetChargingProfile {
            connector_id,
            profile,
        } => serde_json::to_value(SetChargingProfileWire {
            connector_id: *connector_id,
            cs_charging_profiles: wire_profile(profile),
        }),
        Command::GetCompositeSchedule {
            connector_id,
            duration_secs,
            rate_unit,
        } => serde_json::to_value(GetCompositeScheduleRequest {
            connector_id: *connector_id as i32,
            duration: *duration_secs,
            charging_rate_unit: rate_unit.map(|unit| match unit {
                ChargingRateUnit::Ampere => ChargingRateUnitType::A,
                ChargingRateUnit::Watt => ChargingRateUnitType::W,
            }),
        }),
        Command::ClearChargingProfile(criteria) => serde_json::to_value(clear_wire(criteria)),
        Command::ChangeAvailability {
            connector_id,
            availability,
        } => serde_json::to_value(ChangeAvailabilityWire {
            connector_id: *connector_id,
            kind: match availability {
                Availability::Operative => "Operative",
                Availability::Inoperative => "Inoperative",
            },
        }),
        Command::GetDiagnostics {
            location,
            retries,
            retry_interval,
            start_time,
            stop_time,
        } => serde_json::to_value(GetDiagnosticsRequest {
            location: location.clone(),
            retries: *retries,
            retry_interval: *retry_interval,
            start_time: *start_time,
            stop_time: *stop_time,
        }),
        Command::UpdateFirmware {
            location,
            retrieve_date,
            retries,
            retry_interval,
        } => serde_json::to_value(UpdateFirmwareRequest {
            location: location.clone(),
            retries: *retries,
            retrieve_date: *retrieve_date,
            retry_interval: *retry_interval,
        }),
    }
}
