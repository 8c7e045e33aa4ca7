//! Channel selection per `(tenant, station)`

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use super::{
    ChannelProvider, CommandChannel, JsonChannel, RemoteJsonClient, RoamingChannel, SoapChannel,
};
use crate::application::channel::soap::SoapTemplate;
use crate::application::ports::{LiveConnectionRegistry, RoamingClientResolver};
use crate::config::TransportConfig;
use crate::domain::{ChargingStation, OcppProtocol, OcppVersion};
use crate::shared::errors::CommandError;

pub struct ChannelResolver {
    live_registry: Arc<dyn LiveConnectionRegistry>,
    roaming_resolver: Arc<dyn RoamingClientResolver>,
    http: reqwest::Client,
    transport: TransportConfig,
}

impl ChannelResolver {
    pub fn new(
        live_registry: Arc<dyn LiveConnectionRegistry>,
        roaming_resolver: Arc<dyn RoamingClientResolver>,
        transport: TransportConfig,
    ) -> Self {
        Self {
            live_registry,
            roaming_resolver,
            http: reqwest::Client::new(),
            transport,
        }
    }

    fn json_channel(
        &self,
        tenant_id: &str,
        station: &ChargingStation,
    ) -> Result<Arc<dyn CommandChannel>, CommandError> {
        if station.ocpp_version != OcppVersion::V16 {
            return Err(CommandError::ProtocolUnsupported {
                station_id: station.id.clone(),
                detail: format!("{} over JSON is not supported", station.ocpp_version),
            });
        }

        if let Some(handle) = self.live_registry.lookup(tenant_id, &station.id) {
            debug!(tenant_id, station_id = station.id.as_str(), "Using live JSON session");
            return Ok(Arc::new(JsonChannel::live(station.id.clone(), handle)));
        }

        match self.transport.remote_ocpp_url.as_deref() {
            Some(base_url) => {
                debug!(tenant_id, station_id = station.id.as_str(), base_url, "Using remote JSON client");
                let client = RemoteJsonClient::new(
                    base_url,
                    tenant_id,
                    &station.id,
                    station.ocpp_version,
                    self.transport.json_response_timeout(),
                );
                Ok(Arc::new(JsonChannel::remote(station.id.clone(), Arc::new(client))))
            }
            None => Err(CommandError::NotConnected {
                station_id: station.id.clone(),
                reason: "no live session and no remote OCPP server configured".to_string(),
            }),
        }
    }

    fn soap_channel(&self, station: &ChargingStation) -> Result<Arc<dyn CommandChannel>, CommandError> {
        let template = SoapTemplate::for_version(station.ocpp_version).ok_or_else(|| {
            CommandError::ProtocolUnsupported {
                station_id: station.id.clone(),
                detail: format!("{} over SOAP is not supported", station.ocpp_version),
            }
        })?;
        let endpoint = station
            .charging_station_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| CommandError::NotConnected {
                station_id: station.id.clone(),
                reason: "SOAP station has no callback URL".to_string(),
            })?;

        Ok(Arc::new(SoapChannel::new(
            station.id.clone(),
            template,
            endpoint,
            self.transport.central_system_url.clone(),
            self.http.clone(),
            self.transport.soap_request_timeout(),
        )))
    }
}

#[async_trait]
impl ChannelProvider for ChannelResolver {
    async fn channel_for(
        &self,
        tenant_id: &str,
        station: &ChargingStation,
    ) -> Result<Arc<dyn CommandChannel>, CommandError> {
        if !station.issuer {
            return match self.roaming_resolver.resolve(tenant_id, station).await {
                Some(client) => Ok(Arc::new(RoamingChannel::new(station.clone(), client))),
                None => {
                    warn!(tenant_id, station_id = station.id.as_str(), "No roaming client for external station");
                    Err(CommandError::ConfigurationMissing {
                        station_id: station.id.clone(),
                        detail: "no roaming client is configured for this tenant".to_string(),
                    })
                }
            };
        }

        match station.ocpp_protocol {
            OcppProtocol::Json => self.json_channel(tenant_id, station),
            OcppProtocol::Soap => self.soap_channel(station),
        }
    }
}
