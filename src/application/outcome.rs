//! Tagged results of device commands
//!
//! A device answering `Rejected` is data, not an error: callers get
//! [`DeviceOutcome::Rejected`] and decide. Only transport and precondition
//! problems surface as `Err`.

use crate::application::commands::CommandStatus;

#[derive(Debug, Clone, PartialEq)]
pub enum DeviceOutcome<T> {
    Accepted(T),
    Rejected(CommandStatus),
}

impl<T> DeviceOutcome<T> {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted(_))
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> DeviceOutcome<U> {
        match self {
            Self::Accepted(value) => DeviceOutcome::Accepted(f(value)),
            Self::Rejected(status) => DeviceOutcome::Rejected(status),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConnectorOutcome<T> {
    pub connector_id: u32,
    pub outcome: DeviceOutcome<T>,
}

/// Result of a command that may fall back from connector 0 to each connector.
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatched<T> {
    Single(DeviceOutcome<T>),
    /// One entry per connector, ascending connector id.
    PerConnector(Vec<ConnectorOutcome<T>>),
}

impl<T> Dispatched<T> {
    /// Accepted as a whole: the single answer, or every connector.
    pub fn all_accepted(&self) -> bool {
        match self {
            Self::Single(outcome) => outcome.is_accepted(),
            Self::PerConnector(outcomes) => {
                !outcomes.is_empty() && outcomes.iter().all(|o| o.outcome.is_accepted())
            }
        }
    }

    pub fn is_per_connector(&self) -> bool {
        matches!(self, Self::PerConnector(_))
    }
}
