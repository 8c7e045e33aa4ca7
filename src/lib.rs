//! # Texnouz OCPP Control Plane
//!
//! Issues device-management commands to charging stations and hides how
//! vendors and protocol generations differ in implementing them.
//!
//! ## Architecture
//!
//! The project follows Clean Architecture principles:
//!
//! - **domain**: Stations, connectors, charging profiles, locks
//! - **application**: Command channels (OCPP-J live/remote, OCPP-S, roaming),
//!   vendor conversions, power limitation, charging profiles, smart charging
//! - **infrastructure**: In-memory adapters for the outbound ports
//! - **config**: TOML configuration
//!
//! ## Wiring
//!
//! ```text
//! SessionRegistry ─┐
//! RoamingResolver ─┼─► ChannelResolver ─► PowerLimitationEngine ─┐
//! TransportConfig ─┘          │                                  ▼
//!                             └────────► ChargingProfileEngine ─► SmartChargingOrchestrator
//! ```

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod shared;
pub mod support;

pub use application::{
    ChannelResolver, ChargingProfileEngine, Command, CommandResponse, CommandService,
    CommandStatus, PowerLimitationEngine, SessionRegistry, SmartChargingOrchestrator,
    VendorRegistry,
};
pub use config::{default_config_path, AppConfig};
pub use shared::errors::{CommandError, ControlError, DomainError};
pub use support::init_tracing;
