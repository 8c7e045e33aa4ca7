//! OCPP-J channel over any [`ChannelHandle`] (live session or remote client)

use std::sync::Arc;

use async_trait::async_trait;

use super::{ChannelKind, CommandChannel};
use crate::application::commands::payload::request_payload;
use crate::application::commands::response::parse_response;
use crate::application::commands::{Command, CommandResponse};
use crate::application::ports::ChannelHandle;
use crate::shared::errors::CommandError;

pub struct JsonChannel {
    station_id: String,
    kind: ChannelKind,
    handle: Arc<dyn ChannelHandle>,
}

impl JsonChannel {
    pub fn live(station_id: impl Into<String>, handle: Arc<dyn ChannelHandle>) -> Self {
        Self {
            station_id: station_id.into(),
            kind: ChannelKind::JsonLive,
            handle,
        }
    }

    pub fn remote(station_id: impl Into<String>, handle: Arc<dyn ChannelHandle>) -> Self {
        Self {
            station_id: station_id.into(),
            kind: ChannelKind::JsonRemote,
            handle,
        }
    }
}

#[async_trait]
impl CommandChannel for JsonChannel {
    fn kind(&self) -> ChannelKind {
        self.kind
    }

    fn station_id(&self) -> &str {
        &self.station_id
    }

    async fn dispatch(&self, command: &Command) -> Result<CommandResponse, CommandError> {
        let action = command.action();
        let payload = request_payload(command).map_err(|e| {
            CommandError::transport(&self.station_id, action, format!("Serialization failed: {}", e))
        })?;

        let result = self.handle.call(action, payload).await?;

        parse_response(command, &result).map_err(|e| {
            CommandError::transport(
                &self.station_id,
                action,
                format!("Failed to parse response: {}", e),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use std::sync::Mutex;

    use crate::application::commands::{CommandStatus, ResetKind};

    struct CannedHandle {
        calls: Mutex<Vec<(String, Value)>>,
        answer: Value,
    }

    #[async_trait]
    impl ChannelHandle for CannedHandle {
        async fn call(&self, action: &'static str, payload: Value) -> Result<Value, CommandError> {
            self.calls.lock().unwrap().push((action.to_string(), payload));
            Ok(self.answer.clone())
        }
    }

    #[tokio::test]
    async fn dispatch_sends_action_and_payload() {
        let handle = Arc::new(CannedHandle {
            calls: Mutex::new(vec![]),
            answer: serde_json::json!({"status": "Accepted"}),
        });
        let channel = JsonChannel::live("CS-1", handle.clone());

        let response = channel
            .dispatch(&Command::Reset {
                kind: ResetKind::Hard,
            })
            .await
            .unwrap();

        assert_eq!(response.status(), Some(&CommandStatus::Accepted));
        let calls = handle.calls.lock().unwrap();
        assert_eq!(calls[0].0, "Reset");
        assert_eq!(calls[0].1["type"], "Hard");
    }

    #[tokio::test]
    async fn malformed_answer_is_transport_fault() {
        let handle = Arc::new(CannedHandle {
            calls: Mutex::new(vec![]),
            answer: serde_json::json!({"unexpected": true}),
        });
        let channel = JsonChannel::remote("CS-1", handle);
        let err = channel.dispatch(&Command::ClearCache).await.unwrap_err();
        assert!(matches!(
            err,
            CommandError::Transport {
                command: "ClearCache",
                ..
            }
        ));
    }
}
