//! Application ports (hexagonal architecture boundaries)

pub mod outbound;

pub use outbound::{
    ChannelHandle, LiveConnectionRegistry, LockService, ProfileComputationAlgorithm,
    RoamingClientResolver, RoamingCommandClient, StationDirectory,
};
