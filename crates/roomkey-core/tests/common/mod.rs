//! Scripted in-memory transport for coordinator tests.
//!
//! The fake server accepts exactly one access token at a time. Requests are
//! judged on the `Authorization` header captured when they were sent, the
//! same way a real transport snapshots its default headers.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};

use roomkey_core::error::StatusError;
use roomkey_core::transport::AUTHORIZATION;
use roomkey_core::{
    AccessToken, ApiRequest, ApiResponse, ApiSdk, ClientConfig, Method, RefreshToken, Result,
    TokenListener, Transport,
};

pub const REFRESH_PATH: &str = "/auth/refresh";

/// How the fake server answers the refresh endpoint.
#[derive(Debug, Clone)]
pub enum RefreshReply {
    /// Issue this pair and start accepting the new access token.
    Issue { access: String, refresh: String },
    /// Issue this pair but keep rejecting everything.
    IssueUnaccepted { access: String, refresh: String },
    /// Reject with this status.
    Reject(u16),
}

/// A request as the fake server saw it.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub method: Method,
    pub path: String,
    pub authorization: Option<String>,
    pub body: Option<Value>,
}

#[derive(Default)]
struct ServerState {
    accepted_token: Option<String>,
    refresh_reply: Option<RefreshReply>,
    refresh_delay: Duration,
    path_delays: HashMap<String, Duration>,
    path_failures: HashMap<String, u16>,
    calls: Vec<RecordedCall>,
}

#[derive(Clone, Default)]
pub struct MockTransport {
    headers: Arc<Mutex<HashMap<String, String>>>,
    server: Arc<Mutex<ServerState>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Access token the server currently accepts.
    pub fn accept(self, token: &str) -> Self {
        self.server.lock().unwrap().accepted_token = Some(token.to_string());
        self
    }

    pub fn refresh_reply(self, reply: RefreshReply) -> Self {
        self.server.lock().unwrap().refresh_reply = Some(reply);
        self
    }

    pub fn refresh_issues(self, access: &str, refresh: &str) -> Self {
        self.refresh_reply(RefreshReply::Issue {
            access: access.to_string(),
            refresh: refresh.to_string(),
        })
    }

    pub fn refresh_delay(self, delay: Duration) -> Self {
        self.server.lock().unwrap().refresh_delay = delay;
        self
    }

    pub fn delay_path(self, path: &str, delay: Duration) -> Self {
        self.server
            .lock()
            .unwrap()
            .path_delays
            .insert(path.to_string(), delay);
        self
    }

    /// Always answer `path` with `status`, whatever the token.
    pub fn fail_path(self, path: &str, status: u16) -> Self {
        self.server
            .lock()
            .unwrap()
            .path_failures
            .insert(path.to_string(), status);
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.server.lock().unwrap().calls.clone()
    }

    pub fn calls_to(&self, path: &str) -> Vec<RecordedCall> {
        self.calls().into_iter().filter(|c| c.path == path).collect()
    }

    pub fn refresh_calls(&self) -> usize {
        self.calls_to(REFRESH_PATH).len()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        let authorization = self.header(AUTHORIZATION);

        let delay = {
            let mut server = self.server.lock().unwrap();
            server.calls.push(RecordedCall {
                method: request.method,
                path: request.path.clone(),
                authorization: authorization.clone(),
                body: request.body.clone(),
            });
            if request.path == REFRESH_PATH {
                server.refresh_delay
            } else {
                server
                    .path_delays
                    .get(&request.path)
                    .copied()
                    .unwrap_or_default()
            }
        };

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let mut server = self.server.lock().unwrap();

        if request.path == REFRESH_PATH {
            return match server.refresh_reply.clone() {
                Some(RefreshReply::Issue { access, refresh }) => {
                    server.accepted_token = Some(access.clone());
                    Ok(ApiResponse::ok(
                        json!({ "access_token": access, "refresh_token": refresh }),
                    ))
                }
                Some(RefreshReply::IssueUnaccepted { access, refresh }) => Ok(ApiResponse::ok(
                    json!({ "access_token": access, "refresh_token": refresh }),
                )),
                Some(RefreshReply::Reject(status)) => Err(StatusError::new(
                    status,
                    Some("Unauthorized".to_string()),
                    Some("refresh token revoked".to_string()),
                )
                .into()),
                None => Err(StatusError::bare(404).into()),
            };
        }

        if let Some(status) = server.path_failures.get(&request.path) {
            return Err(StatusError::bare(*status).into());
        }

        let expected = server
            .accepted_token
            .as_ref()
            .map(|token| format!("Bearer {}", token));
        if expected.is_some() && authorization == expected {
            Ok(ApiResponse::ok(json!({ "data": "ok" })))
        } else {
            Err(StatusError::new(401, Some("Unauthorized".to_string()), None).into())
        }
    }

    fn set_header(&self, name: &str, value: &str) -> Result<()> {
        self.headers
            .lock()
            .unwrap()
            .insert(name.to_ascii_lowercase(), value.to_string());
        Ok(())
    }

    fn remove_header(&self, name: &str) {
        self.headers
            .lock()
            .unwrap()
            .remove(&name.to_ascii_lowercase());
    }

    fn header(&self, name: &str) -> Option<String> {
        self.headers
            .lock()
            .unwrap()
            .get(&name.to_ascii_lowercase())
            .cloned()
    }
}

/// Token change as seen by the listener.
pub type Notification = (Option<String>, Option<String>);

/// Listener that records every notification.
#[derive(Clone, Default)]
pub struct RecordingListener {
    seen: Arc<Mutex<Vec<Notification>>>,
}

impl RecordingListener {
    pub fn notifications(&self) -> Vec<Notification> {
        self.seen.lock().unwrap().clone()
    }

    pub fn cleared_count(&self) -> usize {
        self.notifications()
            .iter()
            .filter(|(a, r)| a.is_none() && r.is_none())
            .count()
    }
}

impl TokenListener for RecordingListener {
    fn tokens_changed(&self, access: Option<&AccessToken>, refresh: Option<&RefreshToken>) {
        self.seen.lock().unwrap().push((
            access.map(|t| t.as_str().to_string()),
            refresh.map(|t| t.as_str().to_string()),
        ));
    }
}

/// Client holding `T0`/`R0`, with a recording listener.
pub fn signed_in(
    transport: &MockTransport,
    config: ClientConfig,
) -> (ApiSdk<MockTransport>, RecordingListener) {
    let listener = RecordingListener::default();
    let sdk = ApiSdk::builder(transport.clone())
        .config(config)
        .access_token(AccessToken::new("T0"))
        .refresh_token(RefreshToken::new("R0"))
        .listener(listener.clone())
        .build()
        .unwrap();
    (sdk, listener)
}
