//! OCPP-S channel: SOAP 1.2 over HTTP to the station's callback endpoint

pub mod template;
pub mod xml;

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::debug;

use super::{ChannelKind, CommandChannel};
use crate::application::commands::payload::request_payload;
use crate::application::commands::response::parse_response;
use crate::application::commands::{Command, CommandResponse};
use crate::shared::errors::CommandError;

pub use template::{SoapHeader, SoapTemplate};

const CONTENT_TYPE: &str = "application/soap+xml; charset=utf-8";

pub struct SoapChannel {
    station_id: String,
    template: SoapTemplate,
    endpoint: String,
    central_system_url: String,
    client: reqwest::Client,
    request_timeout: Duration,
}

impl SoapChannel {
    pub fn new(
        station_id: impl Into<String>,
        template: SoapTemplate,
        endpoint: impl Into<String>,
        central_system_url: impl Into<String>,
        client: reqwest::Client,
        request_timeout: Duration,
    ) -> Self {
        Self {
            station_id: station_id.into(),
            template,
            endpoint: endpoint.into(),
            central_system_url: central_system_url.into(),
            client,
            request_timeout,
        }
    }

    fn header(&self) -> SoapHeader {
        SoapHeader {
            charge_box_identity: self.station_id.clone(),
            message_id: uuid::Uuid::new_v4().to_string(),
            from: self.central_system_url.clone(),
            to: self.endpoint.clone(),
        }
    }

    /// Turn the raw HTTP answer into the response element's JSON form.
    fn read_body(&self, action: &'static str, raw: &str) -> Result<Value, CommandError> {
        let fault = |diagnostic: String| CommandError::transport(&self.station_id, action, diagnostic);

        let root = xml::parse(raw).map_err(|e| fault(format!("unreadable SOAP response: {}", e)))?;
        let body = root
            .child("Body")
            .ok_or_else(|| fault(format!("SOAP response without Body: {}", raw)))?;
        if body.find("Fault").is_some() {
            return Err(fault(format!("SOAP fault: {}", raw)));
        }
        let response = body
            .children
            .first()
            .ok_or_else(|| fault(format!("empty SOAP Body: {}", raw)))?;
        Ok(if response.children.is_empty() {
            Value::Object(Map::new())
        } else {
            response.to_json()
        })
    }
}

#[async_trait]
impl CommandChannel for SoapChannel {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Soap
    }

    fn station_id(&self) -> &str {
        &self.station_id
    }

    async fn dispatch(&self, command: &Command) -> Result<CommandResponse, CommandError> {
        let action = command.action();
        if !self.template.supports(action) {
            return Err(CommandError::ProtocolUnsupported {
                station_id: self.station_id.clone(),
                detail: format!(
                    "{} is not available over SOAP {}",
                    action, self.template.version
                ),
            });
        }

        let payload = request_payload(command).map_err(|e| {
            CommandError::transport(&self.station_id, action, format!("Serialization failed: {}", e))
        })?;
        let envelope = self.template.envelope(&self.header(), action, &payload);
        debug!(station_id = self.station_id.as_str(), action, endpoint = self.endpoint.as_str(), "Sending SOAP request");

        let response = self
            .client
            .post(&self.endpoint)
            .header(reqwest::header::CONTENT_TYPE, CONTENT_TYPE)
            .timeout(self.request_timeout)
            .body(envelope)
            .send()
            .await
            .map_err(|e| {
                CommandError::transport(&self.station_id, action, format!("SOAP request failed: {}", e))
            })?;
        let status = response.status();
        let raw = response.text().await.map_err(|e| {
            CommandError::transport(&self.station_id, action, format!("SOAP read failed: {}", e))
        })?;

        // Faults usually arrive with HTTP 500, so the body is checked first.
        let body = self.read_body(action, &raw);
        if !status.is_success() {
            if let Err(fault) = body {
                return Err(fault);
            }
            return Err(CommandError::transport(
                &self.station_id,
                action,
                format!("HTTP {}: {}", status, raw),
            ));
        }

        parse_response(command, &body?).map_err(|e| {
            CommandError::transport(&self.station_id, action, format!("Failed to parse response: {}", e))
        })
    }
}
