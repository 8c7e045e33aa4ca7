//! OCPP-J message framing
//!
//! The JSON transport wraps every message in a positional array:
//!
//! - **Call**       `[2, "<uniqueId>", "<action>", {<payload>}]`
//! - **CallResult** `[3, "<uniqueId>", {<payload>}]`
//! - **CallError**  `[4, "<uniqueId>", "<errorCode>", "<errorDescription>", {<errorDetails>}]`
//!
//! The control plane only originates `Call` frames; results and errors
//! come back from the station (or from a remote OCPP server) and are
//! correlated by `uniqueId`.

use serde_json::Value;
use thiserror::Error;

const MSG_TYPE_CALL: u64 = 2;
const MSG_TYPE_CALL_RESULT: u64 = 3;
const MSG_TYPE_CALL_ERROR: u64 = 4;

/// A parsed OCPP-J frame.
#[derive(Debug, Clone, PartialEq)]
pub enum OcppFrame {
    Call {
        unique_id: String,
        action: String,
        payload: Value,
    },
    CallResult {
        unique_id: String,
        payload: Value,
    },
    CallError {
        unique_id: String,
        error_code: String,
        error_description: String,
        error_details: Value,
    },
}

/// Errors that can occur when parsing an OCPP-J frame.
#[derive(Debug, Error)]
pub enum OcppFrameError {
    #[error("Invalid JSON: {0}")]
    InvalidJson(String),
    #[error("Frame is not a non-empty array")]
    NotAnArray,
    #[error("Unknown message type: {0}")]
    UnknownMessageType(u64),
    #[error("Expected at least {expected} fields, got {got}")]
    MissingFields { expected: usize, got: usize },
    #[error("Field type mismatch: {0}")]
    FieldTypeMismatch(&'static str),
}

impl OcppFrame {
    pub fn call(unique_id: impl Into<String>, action: impl Into<String>, payload: Value) -> Self {
        Self::Call {
            unique_id: unique_id.into(),
            action: action.into(),
            payload,
        }
    }

    /// Parse a raw websocket text message.
    pub fn parse(text: &str) -> Result<Self, OcppFrameError> {
        let value: Value =
            serde_json::from_str(text).map_err(|e| OcppFrameError::InvalidJson(e.to_string()))?;
        let arr = match value {
            Value::Array(arr) if !arr.is_empty() => arr,
            _ => return Err(OcppFrameError::NotAnArray),
        };

        let msg_type = arr[0]
            .as_u64()
            .ok_or(OcppFrameError::FieldTypeMismatch("messageTypeId must be a number"))?;
        let expected = match msg_type {
            MSG_TYPE_CALL | MSG_TYPE_CALL_ERROR => 4,
            MSG_TYPE_CALL_RESULT => 3,
            other => return Err(OcppFrameError::UnknownMessageType(other)),
        };
        if arr.len() < expected {
            return Err(OcppFrameError::MissingFields {
                expected,
                got: arr.len(),
            });
        }

        let unique_id = arr[1]
            .as_str()
            .ok_or(OcppFrameError::FieldTypeMismatch("uniqueId must be a string"))?
            .to_string();

        let frame = match msg_type {
            MSG_TYPE_CALL => Self::Call {
                unique_id,
                action: arr[2]
                    .as_str()
                    .ok_or(OcppFrameError::FieldTypeMismatch("action must be a string"))?
                    .to_string(),
                payload: arr[3].clone(),
            },
            MSG_TYPE_CALL_RESULT => Self::CallResult {
                unique_id,
                payload: arr[2].clone(),
            },
            _ => Self::CallError {
                unique_id,
                error_code: arr[2].as_str().unwrap_or("InternalError").to_string(),
                error_description: arr[3].as_str().unwrap_or_default().to_string(),
                error_details: arr
                    .get(4)
                    .cloned()
                    .unwrap_or_else(|| Value::Object(Default::default())),
            },
        };
        Ok(frame)
    }

    /// Serialize this frame to its wire text.
    pub fn to_text(&self) -> String {
        let arr = match self {
            Self::Call {
                unique_id,
                action,
                payload,
            } => serde_json::json!([MSG_TYPE_CALL, unique_id, action, payload]),
            Self::CallResult { unique_id, payload } => {
                serde_json::json!([MSG_TYPE_CALL_RESULT, unique_id, payload])
            }
            Self::CallError {
                unique_id,
                error_code,
                error_description,
                error_details,
            } => serde_json::json!([
                MSG_TYPE_CALL_ERROR,
                unique_id,
                error_code,
                error_description,
                error_details
            ]),
        };
        arr.to_string()
    }

    pub fn unique_id(&self) -> &str {
        match self {
            Self::Call { unique_id, .. }
            | Self::CallResult { unique_id, .. }
            | Self::CallError { unique_id, .. } => unique_id,
        }
    }

    /// Turn a response frame into the payload or a printable diagnostic.
    ///
    /// Returns `None` for `Call` frames, which are not responses.
    pub fn into_response(self) -> Option<Result<Value, String>> {
        match self {
            Self::Call { .. } => None,
            Self::CallResult { payload, .. } => Some(Ok(payload)),
            Self::CallError {
                error_code,
                error_description,
                error_details,
                ..
            } => Some(Err(format!(
                "CallError {}: {} {}",
                error_code, error_description, error_details
            ))),
        }
    }
}
