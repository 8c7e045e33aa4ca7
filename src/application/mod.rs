//! Application layer: command channels, vendor conversions and the engines
//! that drive them

pub mod channel;
pub mod charging_profiles;
pub mod commands;
pub mod outcome;
pub mod ports;
pub mod power_limitation;
pub mod service;
pub mod session;
pub mod smart_charging;
pub mod vendor;

#[cfg(test)]
pub(crate) mod testing;

pub use channel::{ChannelKind, ChannelProvider, ChannelResolver, CommandChannel};
pub use charging_profiles::{ChargingProfileEngine, ClearedProfile};
pub use commands::{Command, CommandResponse, CommandStatus};
pub use outcome::{ConnectorOutcome, DeviceOutcome, Dispatched};
pub use power_limitation::{PowerLimitationEngine, StaticLimitationApplied};
pub use service::CommandService;
pub use session::{SessionRegistry, SharedSessionRegistry};
pub use smart_charging::{ProfileApplication, SmartChargingOrchestrator, SmartChargingRun};
pub use vendor::{VendorProfile, VendorRegistry};
