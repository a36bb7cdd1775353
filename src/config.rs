//! Terminal configuration
//!
//! Everything has a default that matches the stock lab page. A page may
//! override any field with a `terminal-config` JSON element.

use serde::Deserialize;

use crate::history::DEFAULT_HISTORY_LIMIT;

/// DOM ids the view binds to
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ElementIds {
    /// Invisible native `<input>` that owns keyboard focus
    pub input: String,
    /// Line holding the prompt and the mirrored input
    pub input_line: String,
    /// Transcript container
    pub output: String,
    pub prompt: String,
    /// Scrollable frame around the terminal
    pub wrapper: String,
    /// Lab completion badge
    pub status: String,
}

impl Default for ElementIds {
    fn default() -> Self {
        Self {
            input: "cmd-input".to_string(),
            input_line: "active-input-line".to_string(),
            output: "terminal-output".to_string(),
            prompt: "prompt".to_string(),
            wrapper: "terminal-wrapper".to_string(),
            status: "lab-status".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TerminalConfig {
    /// Prefix of the lab endpoints
    pub api_base: String,
    pub history_limit: usize,
    /// Device assumed active when the page doesn't say
    pub default_device: String,
    pub elements: ElementIds,
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            api_base: "/api/lab".to_string(),
            history_limit: DEFAULT_HISTORY_LIMIT,
            default_device: "R1".to_string(),
            elements: ElementIds::default(),
        }
    }
}

impl TerminalConfig {
    /// Parse an override document; on error the defaults are kept
    pub fn from_json(json: Option<&str>) -> Self {
        let Some(json) = json else {
            return Self::default();
        };
        match serde_json::from_str(json) {
            Ok(config) => config,
            Err(e) => {
                crate::console_log!("[config] Ignoring malformed terminal-config: {}", e);
                Self::default()
            }
        }
    }
}
