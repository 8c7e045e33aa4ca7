//! Response normalization
//!
//! JSON stations answer with typed values, SOAP stations with text nodes
//! only (the SOAP channel turns the response body into a `Value` of strings).
//! The readers below accept both so a single parser serves every transport.

use chrono::{DateTime, Utc};
use serde_json::Value;

use super::{
    Command, CommandResponse, CommandStatus, CompositeScheduleResult, ConfigurationResult,
    KeyValue,
};
use crate::domain::{ChargingRateUnit, Schedule, SchedulePeriod};

fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn boolean(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => s.eq_ignore_ascii_case("true"),
        _ => false,
    }
}

fn timestamp(value: &Value) -> Option<DateTime<Utc>> {
    value
        .as_str()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

/// Repeated elements: a JSON array, or a single object when the XML held
/// one occurrence.
fn list(value: Option<&Value>) -> Vec<&Value> {
    match value {
        Some(Value::Array(items)) => items.iter().collect(),
        Some(Value::Null) | None => Vec::new(),
        Some(other) => vec![other],
    }
}

fn status(payload: &Value) -> Result<CommandStatus, String> {
    payload
        .get("status")
        .and_then(text)
        .map(|s| CommandStatus::parse(&s))
        .ok_or_else(|| format!("response has no status: {}", payload))
}

fn schedule(value: &Value) -> Result<Schedule, String> {
    let rate_unit = match value.get("chargingRateUnit").and_then(text).as_deref() {
        Some("W") => ChargingRateUnit::Watt,
        Some("A") => ChargingRateUnit::Ampere,
        other => return Err(format!("unknown chargingRateUnit {:?}", other)),
    };
    let periods = list(value.get("chargingSchedulePeriod"))
        .into_iter()
        .map(|p| {
            let start_period = p
                .get("startPeriod")
                .and_then(number)
                .ok_or_else(|| format!("period without startPeriod: {}", p))?;
            let limit = p
                .get("limit")
                .and_then(number)
                .ok_or_else(|| format!("period without limit: {}", p))?;
            Ok(SchedulePeriod {
                start_period: start_period as i32,
                limit,
                number_phases: p.get("numberPhases").and_then(number).map(|n| n as u32),
            })
        })
        .collect::<Result<Vec<_>, String>>()?;

    Ok(Schedule {
        rate_unit,
        duration_secs: value.get("duration").and_then(number).map(|d| d as i32),
        start_schedule: value.get("startSchedule").and_then(timestamp),
        min_charging_rate: value.get("minChargingRate").and_then(number),
        periods,
    })
}

fn configuration(payload: &Value) -> ConfigurationResult {
    ConfigurationResult {
        configuration_key: list(payload.get("configurationKey"))
            .into_iter()
            .filter_map(|kv| {
                Some(KeyValue {
                    key: kv.get("key").and_then(text)?,
                    readonly: kv.get("readonly").map(boolean).unwrap_or(false),
                    value: kv.get("value").and_then(text),
                })
            })
            .collect(),
        unknown_key: list(payload.get("unknownKey"))
            .into_iter()
            .filter_map(text)
            .collect(),
    }
}

/// Map a station's answer to `command` into the shared vocabulary.
pub fn parse_response(command: &Command, payload: &Value) -> Result<CommandResponse, String> {
    match command {
        Command::GetConfiguration { .. } => Ok(CommandResponse::Configuration(configuration(payload))),
        Command::GetCompositeSchedule { .. } => {
            let schedule = match payload.get("chargingSchedule") {
                Some(Value::Null) | None => None,
                Some(value) => Some(schedule(value)?),
            };
            Ok(CommandResponse::CompositeSchedule(CompositeScheduleResult {
                status: status(payload)?,
                connector_id: payload.get("connectorId").and_then(number).map(|c| c as u32),
                schedule_start: payload.get("scheduleStart").and_then(timestamp),
                schedule,
            }))
        }
        Command::GetDiagnostics { .. } => Ok(CommandResponse::Diagnostics {
            file_name: payload.get("fileName").and_then(text),
        }),
        Command::UpdateFirmware { .. } => Ok(CommandResponse::Empty),
        _ => Ok(CommandResponse::Status(status(payload)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn status_commands() {
        let cmd = Command::ChangeConfiguration {
            key: "k".into(),
            value: "v".into(),
        };
        let response = parse_response(&cmd, &json!({"status": "RebootRequired"})).unwrap();
        assert_eq!(
            response,
            CommandResponse::Status(CommandStatus::RebootRequired)
        );
        assert!(parse_response(&cmd, &json!({})).is_err());
    }

    #[test]
    fn configuration_from_json_and_from_soap_text() {
        let cmd = Command::GetConfiguration { keys: vec![] };
        let from_json = parse_response(
            &cmd,
            &json!({
                "configurationKey": [
                    {"key": "MaxCurrent", "readonly": false, "value": "32"},
                    {"key": "Vendor", "readonly": true}
                ],
                "unknownKey": ["Foo"]
            }),
        )
        .unwrap();
        // SOAP: one occurrence collapses to an object, every leaf is text
        let from_soap = parse_response(
            &cmd,
            &json!({
                "configurationKey": {"key": "MaxCurrent", "readonly": "false", "value": "32"},
                "unknownKey": "Foo"
            }),
        )
        .unwrap();

        match (from_json, from_soap) {
            (CommandResponse::Configuration(a), CommandResponse::Configuration(b)) => {
                assert_eq!(a.configuration_key.len(), 2);
                assert!(a.configuration_key[1].readonly);
                assert_eq!(a.value_of("MaxCurrent"), b.value_of("MaxCurrent"));
                assert_eq!(b.unknown_key, vec!["Foo".to_string()]);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn composite_schedule() {
        let cmd = Command::GetCompositeSchedule {
            connector_id: 1,
            duration_secs: 60,
            rate_unit: None,
        };
        let response = parse_response(
            &cmd,
            &json!({
                "status": "Accepted",
                "connectorId": 1,
                "scheduleStart": "2024-05-01T10:00:00Z",
                "chargingSchedule": {
                    "duration": 60,
                    "chargingRateUnit": "W",
                    "chargingSchedulePeriod": [{"startPeriod": 0, "limit": 7360.0}]
                }
            }),
        )
        .unwrap();
        let CommandResponse::CompositeSchedule(result) = response else {
            panic!("expected composite schedule");
        };
        assert!(result.status.is_accepted());
        assert_eq!(result.connector_id, Some(1));
        assert!(result.schedule_start.is_some());
        let schedule = result.schedule.unwrap();
        assert_eq!(schedule.rate_unit, ChargingRateUnit::Watt);
        assert_eq!(schedule.periods[0].limit, 7360.0);
    }

    #[test]
    fn rejected_composite_schedule_has_no_schedule() {
        let cmd = Command::GetCompositeSchedule {
            connector_id: 0,
            duration_secs: 60,
            rate_unit: None,
        };
        let response = parse_response(&cmd, &json!({"status": "Rejected"})).unwrap();
        assert_eq!(response.status(), Some(&CommandStatus::Rejected));
    }
}
