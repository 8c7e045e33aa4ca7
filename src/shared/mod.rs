pub mod errors;

pub use errors::{CommandError, ControlError, ControlResult, DomainError};
