//! Lab service contract
//!
//! The device CLI itself runs server-side. The terminal only needs two
//! calls: switch the active device, and submit a command line. This module
//! holds their JSON shapes, the error type, and the [`LabApi`] seam the
//! session talks through (fetch in the browser, a mock in tests).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;

use crate::completion::DeviceType;
use crate::transcript::WireEntry;

/// Remote call result
pub type RemoteResult<T> = Result<T, RemoteError>;

/// Ways a round-trip to the lab service can fail
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// Request never completed (network down, CORS, aborted)
    Transport(String),
    /// Non-success HTTP status with no usable body
    Http { status: u16, status_text: String },
    /// Body wasn't the JSON we expected
    Parse(String),
    /// Service answered with `"status": "error"`
    Rejected(String),
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemoteError::Transport(msg) => write!(f, "{}", msg),
            RemoteError::Http {
                status,
                status_text,
            } => write!(f, "HTTP {} {}", status, status_text),
            RemoteError::Parse(msg) => write!(f, "invalid response: {}", msg),
            RemoteError::Rejected(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for RemoteError {}

impl From<serde_json::Error> for RemoteError {
    fn from(e: serde_json::Error) -> Self {
        RemoteError::Parse(e.to_string())
    }
}

/// Body of `POST .../command/`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandRequest {
    pub command: String,
}

/// Reply to a command or help query
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_hostname: Option<String>,
    #[serde(default)]
    pub completed: bool,
}

/// Reply to `GET .../switch/<device>/`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwitchResponse {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub logs: Vec<WireEntry>,
    #[serde(default)]
    pub device_type: DeviceType,
}

impl SwitchResponse {
    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }

    /// Successful switch reply
    pub fn ok(prompt: impl Into<String>, logs: Vec<WireEntry>, device_type: DeviceType) -> Self {
        Self {
            status: "ok".to_string(),
            message: None,
            prompt: prompt.into(),
            logs,
            device_type,
        }
    }

    /// Refused switch reply
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: Some(message.into()),
            prompt: String::new(),
            logs: Vec::new(),
            device_type: DeviceType::default(),
        }
    }
}

/// Error envelope the service uses on any endpoint
#[derive(Debug, Deserialize)]
struct StatusEnvelope {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Decode a command reply, surfacing `"status": "error"` bodies as
/// [`RemoteError::Rejected`]
pub fn decode_command(body: &str) -> RemoteResult<CommandResponse> {
    let envelope: StatusEnvelope = serde_json::from_str(body)?;
    if envelope.status.as_deref() == Some("error") {
        return Err(RemoteError::Rejected(
            envelope.message.unwrap_or_else(|| "command failed".to_string()),
        ));
    }
    Ok(serde_json::from_str(body)?)
}

/// Decode a switch reply. A refused switch is still `Ok`; the session
/// checks [`SwitchResponse::is_ok`].
pub fn decode_switch(body: &str) -> RemoteResult<SwitchResponse> {
    Ok(serde_json::from_str(body)?)
}

/// URLs for one lab session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    base: String,
    session_id: String,
}

impl Endpoints {
    pub fn new(base: &str, session_id: &str) -> Self {
        Self {
            base: base.trim_end_matches('/').to_string(),
            session_id: session_id.to_string(),
        }
    }

    /// `device_id` must already be URL-safe
    pub fn switch_url(&self, device_id: &str) -> String {
        format!("{}/{}/switch/{}/", self.base, self.session_id, device_id)
    }

    pub fn command_url(&self) -> String {
        format!("{}/{}/command/", self.base, self.session_id)
    }
}

/// The two calls the terminal makes to the lab service
pub trait LabApi {
    /// Fetch the console state of `device_id`
    fn switch_device(&self, device_id: &str) -> impl Future<Output = RemoteResult<SwitchResponse>>;

    /// Run one command line (or `?` help query) on the active device
    fn submit_command(&self, command: &str) -> impl Future<Output = RemoteResult<CommandResponse>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_command_full() {
        let body = r#"{"status":"ok","output":"\nR1 uptime","prompt":"R1#","new_hostname":"R1","completed":false}"#;
        let resp = decode_command(body).unwrap();
        assert_eq!(resp.output.as_deref(), Some("\nR1 uptime"));
        assert_eq!(resp.prompt, "R1#");
        assert_eq!(resp.new_hostname.as_deref(), Some("R1"));
        assert!(!resp.completed);
    }

    #[test]
    fn test_decode_command_minimal() {
        let resp = decode_command(r#"{"prompt":"R1#"}"#).unwrap();
        assert_eq!(resp.output, None);
        assert_eq!(resp.new_hostname, None);
        assert!(!resp.completed);
    }

    #[test]
    fn test_decode_command_null_fields() {
        let resp = decode_command(r#"{"prompt":"R1>","output":null,"new_hostname":null}"#).unwrap();
        assert_eq!(resp.output, None);
    }

    #[test]
    fn test_decode_command_rejected() {
        let err = decode_command(r#"{"status":"error","message":"Unauthorized"}"#).unwrap_err();
        assert_eq!(err, RemoteError::Rejected("Unauthorized".to_string()));
        assert_eq!(err.to_string(), "Unauthorized");
    }

    #[test]
    fn test_decode_command_garbage() {
        let err = decode_command("<html>500</html>").unwrap_err();
        assert!(matches!(err, RemoteError::Parse(_)));
    }

    #[test]
    fn test_decode_switch() {
        let body = r#"{"status":"ok","prompt":"SW1#","logs":[{"type":"out","text":"Switched"}],"device_type":"switch"}"#;
        let resp = decode_switch(body).unwrap();
        assert!(resp.is_ok());
        assert_eq!(resp.device_type, DeviceType::Switch);
        assert_eq!(resp.logs.len(), 1);

        let resp = decode_switch(r#"{"status":"error","message":"Access Denied"}"#).unwrap();
        assert!(!resp.is_ok());
        assert_eq!(resp.message.as_deref(), Some("Access Denied"));
    }

    #[test]
    fn test_endpoints() {
        let ep = Endpoints::new("/api/lab/", "42");
        assert_eq!(ep.switch_url("R2"), "/api/lab/42/switch/R2/");
        assert_eq!(ep.command_url(), "/api/lab/42/command/");
    }

    #[test]
    fn test_error_display() {
        let err = RemoteError::Http {
            status: 502,
            status_text: "Bad Gateway".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP 502 Bad Gateway");
        assert_eq!(RemoteError::Transport("Failed to fetch".into()).to_string(), "Failed to fetch");
    }
}
