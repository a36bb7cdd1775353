//! Tab completion against the device vocabulary
//!
//! Only the last space-separated token is completed. A unique match is
//! finished with a trailing space; several matches extend the token to
//! their longest common prefix.

use serde::{Deserialize, Serialize};

const VOCAB_COMMON: &[&str] = &[
    "show",
    "running-config",
    "interface",
    "ip",
    "address",
    "brief",
    "configure",
    "terminal",
    "enable",
    "exit",
    "end",
    "no",
    "shutdown",
    "description",
    "hostname",
    "write",
    "copy",
    "do",
    "line",
    "vty",
    "console",
    "login",
    "password",
    "FastEthernet0/0",
    "FastEthernet0/1",
    "service",
    "password-encryption",
];

const VOCAB_ROUTER: &[&str] = &[
    "crypto",
    "isakmp",
    "policy",
    "encryption",
    "authentication",
    "group",
    "pre-share",
    "key",
    "transform-set",
    "esp-aes",
    "esp-sha-hmac",
    "access-list",
    "permit",
    "udp",
    "tcp",
    "host",
    "any",
    "match",
    "set",
    "peer",
    "map",
];

const VOCAB_SWITCH: &[&str] = &[
    "vlan",
    "name",
    "switchport",
    "mode",
    "access",
    "trunk",
    "native",
    "allowed",
    "spanning-tree",
    "port-security",
];

/// Kind of device behind the console
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    Switch,
    #[default]
    #[serde(other)]
    Router,
}

/// Completion candidates for one device type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vocabulary {
    words: Vec<String>,
}

impl Vocabulary {
    /// Baseline words plus the ones specific to `device_type`
    pub fn for_device(device_type: DeviceType) -> Self {
        let extra = match device_type {
            DeviceType::Router => VOCAB_ROUTER,
            DeviceType::Switch => VOCAB_SWITCH,
        };
        Self::from_words(VOCAB_COMMON.iter().chain(extra))
    }

    /// Build from arbitrary words; duplicates keep their first position
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut out: Vec<String> = Vec::new();
        for word in words {
            let word = word.as_ref();
            if !word.is_empty() && !out.iter().any(|w| w == word) {
                out.push(word.to_string());
            }
        }
        Self { words: out }
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.iter().any(|w| w == word)
    }

    /// Words starting with `prefix`, ignoring case
    pub fn matches(&self, prefix: &str) -> Vec<&str> {
        let prefix = prefix.to_lowercase();
        self.words
            .iter()
            .filter(|w| w.to_lowercase().starts_with(&prefix))
            .map(String::as_str)
            .collect()
    }
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self::for_device(DeviceType::Router)
    }
}

/// Complete the last token of `text`.
///
/// Returns the new line, or `None` when nothing changes.
pub fn complete(text: &str, vocabulary: &Vocabulary) -> Option<String> {
    let mut parts: Vec<&str> = text.split(' ').collect();
    let last = parts.pop()?;
    if last.is_empty() {
        return None;
    }

    let matches = vocabulary.matches(last);
    let replacement = match matches.as_slice() {
        [] => return None,
        [only] => format!("{} ", only),
        many => {
            let common = common_prefix(many);
            if common.chars().count() <= last.chars().count() {
                return None;
            }
            common
        }
    };

    parts.push(&replacement);
    Some(parts.join(" "))
}

/// Longest case-insensitive common prefix, in the first word's casing
fn common_prefix(words: &[&str]) -> String {
    let Some((first, rest)) = words.split_first() else {
        return String::new();
    };

    let mut len = first.chars().count();
    for word in rest {
        let shared = first
            .chars()
            .zip(word.chars())
            .take_while(|(a, b)| a.to_lowercase().eq(b.to_lowercase()))
            .count();
        len = len.min(shared);
    }
    first.chars().take(len).collect()
}
