pub mod model;

pub use model::{
    ChargingProfile, ChargingProfileKind, ChargingProfilePurpose, ChargingRateUnit,
    RecurrencyKind, Schedule, SchedulePeriod,
};
