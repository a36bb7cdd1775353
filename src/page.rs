//! Initial data embedded in the lab page
//!
//! The server renders a few JSON `<script>` elements into the page. Each
//! one is parsed on its own; a missing or malformed element is logged and
//! replaced by its default so the terminal still comes up.

use serde::de::DeserializeOwned;
use std::collections::BTreeMap;

use crate::completion::DeviceType;
use crate::config::TerminalConfig;
use crate::transcript::{TranscriptEntry, WireEntry};

pub const SESSION_ID: &str = "session-id";
pub const HOSTNAMES: &str = "hostnames-data";
pub const INITIAL_LOGS: &str = "initial-logs-data";
pub const CURRENT_DEVICE: &str = "current-device-id";
pub const DEVICE_TYPE: &str = "device-type-data";
pub const TERMINAL_CONFIG: &str = "terminal-config";

/// Everything the terminal needs at startup
#[derive(Debug, Clone, PartialEq)]
pub struct PageData {
    pub session_id: String,
    /// device id -> display hostname
    pub hostnames: BTreeMap<String, String>,
    pub initial_logs: Vec<WireEntry>,
    pub current_device: String,
    pub device_type: DeviceType,
    /// Prompt text the server rendered into the page
    pub prompt: String,
}

impl PageData {
    /// Collect page data through `lookup`, which returns the text of the
    /// element with the given id.
    pub fn load(lookup: impl Fn(&str) -> Option<String>, config: &TerminalConfig) -> Self {
        let session_id = match parse_field::<serde_json::Value>(&lookup, SESSION_ID) {
            Some(serde_json::Value::String(s)) => s,
            Some(serde_json::Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        };

        let hostnames = parse_field(&lookup, HOSTNAMES).unwrap_or_default();
        let initial_logs = parse_field(&lookup, INITIAL_LOGS).unwrap_or_default();
        let current_device = parse_field::<String>(&lookup, CURRENT_DEVICE)
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| config.default_device.clone());
        let device_type = parse_field(&lookup, DEVICE_TYPE).unwrap_or_default();

        let prompt = lookup(&config.elements.prompt)
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| format!("{}>", current_device));

        Self {
            session_id,
            hostnames,
            initial_logs,
            current_device,
            device_type,
            prompt,
        }
    }

    /// Initial transcript, with a console banner when the page has none
    pub fn initial_transcript(&self) -> Vec<TranscriptEntry> {
        if self.initial_logs.is_empty() {
            return vec![TranscriptEntry::output(format!(
                "Connected to {} console.",
                self.current_device
            ))];
        }
        self.initial_logs
            .iter()
            .cloned()
            .map(|e| TranscriptEntry::from_wire(e, &self.prompt))
            .collect()
    }
}

fn parse_field<T: DeserializeOwned>(lookup: &impl Fn(&str) -> Option<String>, id: &str) -> Option<T> {
    let raw = lookup(id)?;
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            crate::console_log!("[page] Error parsing JSON for {}: {}", id, e);
            None
        }
    }
}
