pub mod ocpp_frame;
pub mod telemetry;

pub use telemetry::init_tracing;
