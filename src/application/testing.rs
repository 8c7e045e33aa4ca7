//! Scripted channels and station builders shared by the engine tests

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::application::channel::{ChannelKind, ChannelProvider, CommandChannel};
use crate::application::commands::{Command, CommandResponse, CommandStatus};
use crate::domain::{ChargePoint, ChargingStation, Connector, OcppProtocol, OcppVersion};
use crate::shared::errors::CommandError;

type Responder = dyn Fn(&Command) -> Result<CommandResponse, CommandError> + Send + Sync;

/// Records every dispatched command and answers through a closure.
pub struct ScriptedChannel {
    commands: Mutex<Vec<Command>>,
    responder: Box<Responder>,
}

impl ScriptedChannel {
    pub fn new(
        responder: impl Fn(&Command) -> Result<CommandResponse, CommandError> + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            commands: Mutex::new(Vec::new()),
            responder: Box::new(responder),
        })
    }

    /// Answers every status command with `Accepted`.
    pub fn accepting() -> Arc<Self> {
        Self::new(|_| Ok(CommandResponse::Status(CommandStatus::Accepted)))
    }

    pub fn commands(&self) -> Vec<Command> {
        self.commands.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.commands.lock().unwrap().len()
    }
}

#[async_trait]
impl CommandChannel for ScriptedChannel {
    fn kind(&self) -> ChannelKind {
        ChannelKind::JsonLive
    }

    fn station_id(&self) -> &str {
        "scripted"
    }

    async fn dispatch(&self, command: &Command) -> Result<CommandResponse, CommandError> {
        self.commands.lock().unwrap().push(command.clone());
        (self.responder)(command)
    }
}

/// Hands out the same scripted channel for every station.
pub struct ScriptedProvider {
    pub channel: Arc<ScriptedChannel>,
    resolutions: AtomicUsize,
}

impl ScriptedProvider {
    pub fn new(channel: Arc<ScriptedChannel>) -> Arc<Self> {
        Arc::new(Self {
            channel,
            resolutions: AtomicUsize::new(0),
        })
    }

    pub fn resolutions(&self) -> usize {
        self.resolutions.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChannelProvider for ScriptedProvider {
    async fn channel_for(
        &self,
        _tenant_id: &str,
        _station: &ChargingStation,
    ) -> Result<Arc<dyn CommandChannel>, CommandError> {
        self.resolutions.fetch_add(1, Ordering::SeqCst);
        Ok(self.channel.clone())
    }
}

/// JSON 1.6 station with both smart charging capabilities.
pub fn station(connectors: u32, amperage: f64, phases: u32) -> ChargingStation {
    let mut station = ChargingStation::new("CS-1", OcppProtocol::Json, OcppVersion::V16, "ACME");
    station.connectors = (1..=connectors)
        .map(|id| Connector::new(id, amperage).with_phases(phases))
        .collect();
    station.capabilities.supports_static_limitation = true;
    station.capabilities.supports_charging_profiles = true;
    station
}

/// Three single-phase connectors limited through `stationAmpLimit`.
pub fn station_amp_limit_station() -> ChargingStation {
    let mut station = station(3, 32.0, 1);
    station.charge_points.push(ChargePoint {
        charge_point_id: 1,
        connector_ids: vec![1, 2, 3],
        ocpp_param_for_power_limitation: Some("stationAmpLimit".to_string()),
    });
    station
}
