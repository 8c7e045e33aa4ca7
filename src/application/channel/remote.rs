//! Remote invocation of OCPP-J commands
//!
//! When a JSON station is not connected to this process, the call is relayed
//! to the OCPP server node that holds its session. The node exposes a
//! websocket per `(tenant, station)` on which it accepts ordinary OCPP-J
//! `Call` frames and answers with `CallResult`/`CallError`.

use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::time::timeout;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info};

use crate::application::ports::ChannelHandle;
use crate::domain::OcppVersion;
use crate::shared::errors::CommandError;
use crate::support::ocpp_frame::OcppFrame;

pub struct RemoteJsonClient {
    url: String,
    station_id: String,
    ocpp_version: OcppVersion,
    response_timeout: Duration,
}

impl RemoteJsonClient {
    pub fn new(
        base_url: &str,
        tenant_id: &str,
        station_id: &str,
        ocpp_version: OcppVersion,
        response_timeout: Duration,
    ) -> Self {
        Self {
            url: format!(
                "{}/{}/{}",
                base_url.trim_end_matches('/'),
                tenant_id,
                station_id
            ),
            station_id: station_id.to_string(),
            ocpp_version,
            response_timeout,
        }
    }

    async fn exchange(&self, action: &'static str, payload: Value) -> Result<Value, CommandError> {
        let fault = |diagnostic: String| CommandError::transport(&self.station_id, action, diagnostic);

        let mut request = self
            .url
            .as_str()
            .into_client_request()
            .map_err(|e| fault(format!("invalid remote URL {}: {}", self.url, e)))?;
        request.headers_mut().insert(
            "Sec-WebSocket-Protocol",
            HeaderValue::from_static(self.ocpp_version.subprotocol()),
        );

        let (mut ws, _) = connect_async(request).await.map_err(|e| {
            CommandError::NotConnected {
                station_id: self.station_id.clone(),
                reason: format!("remote OCPP server unreachable at {}: {}", self.url, e),
            }
        })?;

        let message_id = uuid::Uuid::new_v4().to_string();
        let frame = OcppFrame::call(message_id.clone(), action, payload);
        info!(
            station_id = self.station_id.as_str(),
            action,
            url = self.url.as_str(),
            "Relaying command to remote OCPP server"
        );
        ws.send(Message::Text(frame.to_text()))
            .await
            .map_err(|e| fault(format!("send failed: {}", e)))?;

        let result = loop {
            let Some(message) = ws.next().await else {
                break Err(fault("remote closed the connection before answering".into()));
            };
            match message.map_err(|e| fault(format!("receive failed: {}", e)))? {
                Message::Text(text) => {
                    let frame = OcppFrame::parse(&text)
                        .map_err(|e| fault(format!("malformed frame: {}", e)))?;
                    if frame.unique_id() != message_id {
                        debug!(unique_id = frame.unique_id(), "Skipping unrelated frame");
                        continue;
                    }
                    match frame.into_response() {
                        Some(Ok(payload)) => break Ok(payload),
                        Some(Err(diagnostic)) => break Err(fault(diagnostic)),
                        None => continue,
                    }
                }
                Message::Close(_) => {
                    break Err(fault("remote closed the connection before answering".into()))
                }
                _ => continue,
            }
        };

        let _ = ws.close(None).await;
        result
    }
}

#[async_trait]
impl ChannelHandle for RemoteJsonClient {
    async fn call(&self, action: &'static str, payload: Value) -> Result<Value, CommandError> {
        match timeout(self.response_timeout, self.exchange(action, payload)).await {
            Ok(result) => result,
            Err(_) => Err(CommandError::transport(
                &self.station_id,
                action,
                format!("no response within {:?}", self.response_timeout),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;
    use tokio_tungstenite::accept_hdr_async;
    use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};

    fn negotiate(req: &Request, mut resp: Response) -> Result<Response, ErrorResponse> {
        assert_eq!(req.uri().path(), "/ocpp/tenant-a/CS-9");
        resp.headers_mut().insert(
            "Sec-WebSocket-Protocol",
            HeaderValue::from_static("ocpp1.6"),
        );
        Ok(resp)
    }

    /// Accepts one websocket and answers each call with the frames
    /// produced by `answer(unique_id, payload)`.
    async fn spawn_remote(answer: fn(&str, &Value) -> Vec<String>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = accept_hdr_async(stream, negotiate).await.unwrap();
            while let Some(Ok(Message::Text(text))) = ws.next().await {
                if let OcppFrame::Call {
                    unique_id, payload, ..
                } = OcppFrame::parse(&text).unwrap()
                {
                    for frame in answer(&unique_id, &payload) {
                        ws.send(Message::Text(frame)).await.unwrap();
                    }
                }
            }
        });
        format!("ws://{}/ocpp", addr)
    }

    fn client(base: &str) -> RemoteJsonClient {
        RemoteJsonClient::new(base, "tenant-a", "CS-9", OcppVersion::V16, Duration::from_secs(5))
    }

    #[tokio::test]
    async fn relays_call_and_skips_unrelated_frames() {
        let base = spawn_remote(|id, payload| {
            assert_eq!(payload["connectorId"], 2);
            vec![
                r#"[3,"someone-else",{"status":"Rejected"}]"#.to_string(),
                format!(r#"[3,"{}",{{"status":"Unlocked"}}]"#, id),
            ]
        })
        .await;

        let payload = client(&base)
            .call("UnlockConnector", serde_json::json!({"connectorId": 2}))
            .await
            .unwrap();
        assert_eq!(payload["status"], "Unlocked");
    }

    #[tokio::test]
    async fn call_error_is_transport_fault() {
        let base = spawn_remote(|id, _| {
            vec![format!(r#"[4,"{}","NotSupported","no such action",{{}}]"#, id)]
        })
        .await;

        let err = client(&base)
            .call("Reset", serde_json::json!({}))
            .await
            .unwrap_err();
        match err {
            CommandError::Transport { diagnostic, .. } => {
                assert!(diagnostic.contains("NotSupported"))
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn unreachable_remote_is_not_connected() {
        let err = client("ws://127.0.0.1:1/ocpp")
            .call("Reset", serde_json::json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, CommandError::NotConnected { .. }));
    }
}
