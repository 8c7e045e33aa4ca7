pub mod version;

pub use version::{OcppProtocol, OcppVersion};
