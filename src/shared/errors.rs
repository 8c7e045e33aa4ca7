use thiserror::Error;

/// Failures raised by collaborators behind the domain ports
/// (station directory, lock service, profile computation).
#[derive(Debug, Clone, Error)]
pub enum DomainError {
    #[error("Not found: {entity} with {field}={value}")]
    NotFound {
        entity: &'static str,
        field: &'static str,
        value: String,
    },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Lock service error: {0}")]
    Lock(String),

    #[error("Charging profile computation failed: {0}")]
    Computation(String),
}

/// Transport-level faults raised while resolving or using a command channel.
///
/// Every variant names the station and, where one was attempted, the OCPP
/// action so the caller can render an actionable message.
#[derive(Debug, Clone, Error)]
pub enum CommandError {
    #[error("Charging station {station_id} is not connected: {reason}")]
    NotConnected { station_id: String, reason: String },

    #[error("Charging station {station_id}: {detail}")]
    ProtocolUnsupported { station_id: String, detail: String },

    #[error("{command} on charging station {station_id} failed: {diagnostic}")]
    Transport {
        station_id: String,
        command: &'static str,
        diagnostic: String,
    },

    #[error("Charging station {station_id} requires roaming but {detail}")]
    ConfigurationMissing { station_id: String, detail: String },
}

impl CommandError {
    pub fn transport(
        station_id: impl Into<String>,
        command: &'static str,
        diagnostic: impl Into<String>,
    ) -> Self {
        Self::Transport {
            station_id: station_id.into(),
            command,
            diagnostic: diagnostic.into(),
        }
    }

    pub fn station_id(&self) -> &str {
        match self {
            Self::NotConnected { station_id, .. }
            | Self::ProtocolUnsupported { station_id, .. }
            | Self::Transport { station_id, .. }
            | Self::ConfigurationMissing { station_id, .. } => station_id,
        }
    }

    /// Whether the caller may reasonably try again later.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::NotConnected { .. } | Self::Transport { .. })
    }
}

/// Errors surfaced by the power limitation, charging profile and smart
/// charging entry points.
#[derive(Debug, Error)]
pub enum ControlError {
    #[error("Charging station {station_id}: {reason}")]
    Configuration { station_id: String, reason: String },

    #[error("Charging station {station_id}: invalid request ({reason})")]
    Validation { station_id: String, reason: String },

    #[error(transparent)]
    Command(#[from] CommandError),

    #[error("{command} rejected by charging station {station_id} with status {status} (params: {params})")]
    DeviceRejected {
        station_id: String,
        command: &'static str,
        status: String,
        params: String,
    },

    #[error(transparent)]
    Storage(#[from] DomainError),
}

impl ControlError {
    pub fn configuration(station_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Configuration {
            station_id: station_id.into(),
            reason: reason.into(),
        }
    }

    pub fn validation(station_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            station_id: station_id.into(),
            reason: reason.into(),
        }
    }

    /// Configuration and validation faults are permanent; only transport
    /// level failures and storage hiccups are worth a caller-side retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Command(e) => e.is_retryable(),
            Self::Storage(DomainError::Storage(_)) => true,
            _ => false,
        }
    }
}

pub type ControlResult<T> = Result<T, ControlError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_fault_carries_context() {
        let err = CommandError::transport("CS-1", "Reset", "soap:Fault Receiver");
        assert_eq!(err.station_id(), "CS-1");
        let msg = err.to_string();
        assert!(msg.contains("Reset"));
        assert!(msg.contains("soap:Fault Receiver"));
    }

    #[test]
    fn retry_classification() {
        let not_connected = ControlError::from(CommandError::NotConnected {
            station_id: "CS-1".into(),
            reason: "no session".into(),
        });
        assert!(not_connected.is_retryable());

        let roaming = ControlError::from(CommandError::ConfigurationMissing {
            station_id: "CS-1".into(),
            detail: "no roaming client".into(),
        });
        assert!(!roaming.is_retryable());
        assert!(!ControlError::validation("CS-1", "connector 2").is_retryable());
    }
}
