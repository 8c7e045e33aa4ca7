//! Version-specific OCPP-S envelope templates

use crate::domain::OcppVersion;

use super::xml::{escape, write_element};
use serde_json::Value;

const SOAP_ENV: &str = "http://www.w3.org/2003/05/soap-envelope";
const WS_ADDRESSING: &str = "http://www.w3.org/2005/08/addressing";
const ANONYMOUS: &str = "http://www.w3.org/2005/08/addressing/anonymous";

const OCPP12_ACTIONS: &[&str] = &[
    "Reset",
    "ClearCache",
    "ChangeConfiguration",
    "RemoteStartTransaction",
    "RemoteStopTransaction",
    "UnlockConnector",
    "ChangeAvailability",
    "GetDiagnostics",
    "UpdateFirmware",
];

const OCPP15_ACTIONS: &[&str] = &[
    "Reset",
    "ClearCache",
    "GetConfiguration",
    "ChangeConfiguration",
    "RemoteStartTransaction",
    "RemoteStopTransaction",
    "UnlockConnector",
    "ChangeAvailability",
    "GetDiagnostics",
    "UpdateFirmware",
];

const OCPP16_ACTIONS: &[&str] = &[
    "Reset",
    "ClearCache",
    "GetConfiguration",
    "ChangeConfiguration",
    "RemoteStartTransaction",
    "RemoteStopTransaction",
    "UnlockConnector",
    "SetChargingProfile",
    "GetCompositeSchedule",
    "ClearChargingProfile",
    "ChangeAvailability",
    "GetDiagnostics",
    "UpdateFirmware",
];

/// Addressing headers, built fresh for every call.
#[derive(Debug, Clone)]
pub struct SoapHeader {
    pub charge_box_identity: String,
    pub message_id: String,
    pub from: String,
    pub to: String,
}

/// Charge point service description for one OCPP-S generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SoapTemplate {
    pub version: OcppVersion,
    pub namespace: &'static str,
    actions: &'static [&'static str],
}

impl SoapTemplate {
    pub fn for_version(version: OcppVersion) -> Option<Self> {
        let (namespace, actions) = match version {
            OcppVersion::V12 => ("urn://Ocpp/Cp/2010/08/", OCPP12_ACTIONS),
            OcppVersion::V15 => ("urn://Ocpp/Cp/2012/06/", OCPP15_ACTIONS),
            OcppVersion::V16 => ("urn://Ocpp/Cp/2015/10/", OCPP16_ACTIONS),
            OcppVersion::V201 => return None,
        };
        Some(Self {
            version,
            namespace,
            actions,
        })
    }

    pub fn supports(&self, action: &str) -> bool {
        self.actions.contains(&action)
    }

    /// `ChangeConfiguration` → `changeConfigurationRequest`.
    pub fn request_element(action: &str) -> String {
        let mut chars = action.chars();
        match chars.next() {
            Some(first) => format!("{}{}Request", first.to_lowercase(), chars.as_str()),
            None => "Request".to_string(),
        }
    }

    pub fn envelope(&self, header: &SoapHeader, action: &str, payload: &Value) -> String {
        let element = Self::request_element(action);
        let mut body = String::new();
        match payload {
            Value::Object(fields) if !fields.is_empty() => {
                for (key, value) in fields {
                    write_element(&mut body, key, value);
                }
            }
            _ => {}
        }

        format!(
            concat!(
                r#"<?xml version="1.0" encoding="UTF-8"?>"#,
                r#"<soap:Envelope xmlns:soap="{env}" xmlns:wsa="{wsa}" xmlns:cp="{ns}">"#,
                "<soap:Header>",
                "<cp:chargeBoxIdentity>{identity}</cp:chargeBoxIdentity>",
                "<wsa:Action>/{action}</wsa:Action>",
                "<wsa:MessageID>urn:uuid:{message_id}</wsa:MessageID>",
                "<wsa:From><wsa:Address>{from}</wsa:Address></wsa:From>",
                "<wsa:ReplyTo><wsa:Address>{anonymous}</wsa:Address></wsa:ReplyTo>",
                "<wsa:To>{to}</wsa:To>",
                "</soap:Header>",
                "<soap:Body>",
                r#"<{element} xmlns="{ns}">{body}</{element}>"#,
                "</soap:Body>",
                "</soap:Envelope>"
            ),
            env = SOAP_ENV,
            wsa = WS_ADDRESSING,
            ns = self.namespace,
            identity = escape(&header.charge_box_identity),
            action = action,
            message_id = header.message_id,
            from = escape(&header.from),
            anonymous = ANONYMOUS,
            to = escape(&header.to),
            element = element,
            body = body,
        )
    }
}
