//! Transcript - commands and their output for the active device
//!
//! Command entries carry the prompt captured when they were submitted,
//! so a replayed log still shows `R1>` even after the device was renamed.

use serde::{Deserialize, Serialize};

use crate::mirror::BLANK_CELL;

/// One transcript record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscriptEntry {
    Command { prompt: String, text: String },
    Output { text: String },
}

impl TranscriptEntry {
    pub fn command(prompt: impl Into<String>, text: impl Into<String>) -> Self {
        TranscriptEntry::Command {
            prompt: prompt.into(),
            text: text.into(),
        }
    }

    pub fn output(text: impl Into<String>) -> Self {
        TranscriptEntry::Output { text: text.into() }
    }

    /// Convert a log record from the lab service.
    ///
    /// Anything not tagged `cmd` is output. A command without a prompt
    /// borrows `fallback_prompt`.
    pub fn from_wire(entry: WireEntry, fallback_prompt: &str) -> Self {
        match entry.kind.as_str() {
            "cmd" | "command" => TranscriptEntry::Command {
                prompt: entry.prompt.unwrap_or_else(|| fallback_prompt.to_string()),
                text: entry.text,
            },
            _ => TranscriptEntry::Output { text: entry.text },
        }
    }

    pub fn to_wire(&self) -> WireEntry {
        match self {
            TranscriptEntry::Command { prompt, text } => WireEntry {
                kind: "cmd".to_string(),
                text: text.clone(),
                prompt: Some(prompt.clone()),
            },
            TranscriptEntry::Output { text } => WireEntry {
                kind: "out".to_string(),
                text: text.clone(),
                prompt: None,
            },
        }
    }

    /// The line as it appears on screen
    pub fn render(&self) -> TranscriptLine {
        match self {
            TranscriptEntry::Command { prompt, text } => TranscriptLine {
                kind: LineKind::Command,
                text: format!("{} {}", prompt, text),
            },
            TranscriptEntry::Output { text } => {
                let trimmed = text.trim_matches('\n');
                let text = if trimmed.is_empty() && !text.is_empty() {
                    BLANK_CELL.to_string()
                } else {
                    trimmed.to_string()
                };
                TranscriptLine {
                    kind: LineKind::Output,
                    text,
                }
            }
        }
    }
}

/// Log record as exchanged with the lab service and embedded in the page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireEntry {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Command,
    Output,
}

/// A rendered transcript line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptLine {
    pub kind: LineKind,
    pub text: String,
}

/// Ordered log for the active device
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
    /// Bumped on every `replace_all`, so renderers know to start over
    generation: u64,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, entry: TranscriptEntry) {
        self.entries.push(entry);
    }

    /// Swap in a whole new log (device switch)
    pub fn replace_all(&mut self, entries: impl IntoIterator<Item = TranscriptEntry>) {
        self.entries = entries.into_iter().collect();
        self.generation += 1;
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn last(&self) -> Option<&TranscriptEntry> {
        self.entries.last()
    }

    pub fn lines(&self) -> impl Iterator<Item = TranscriptLine> + '_ {
        self.entries.iter().map(TranscriptEntry::render)
    }

    /// Lines a renderer that has seen `mark` still needs.
    ///
    /// Returns `(reset, lines)`: when `reset` is set the renderer must drop
    /// what it has and draw `lines` from scratch.
    pub fn pending_since(&self, mark: RenderMark) -> (bool, Vec<TranscriptLine>) {
        if mark.generation != self.generation || mark.count > self.entries.len() {
            (true, self.lines().collect())
        } else {
            (
                false,
                self.entries[mark.count..]
                    .iter()
                    .map(TranscriptEntry::render)
                    .collect(),
            )
        }
    }

    /// Mark for the current contents
    pub fn mark(&self) -> RenderMark {
        RenderMark {
            generation: self.generation,
            count: self.entries.len(),
        }
    }
}

/// How much of a transcript a renderer has already drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderMark {
    pub generation: u64,
    pub count: usize,
}

impl Default for RenderMark {
    /// A mark that never matches, forcing a full first draw
    fn default() -> Self {
        Self {
            generation: u64::MAX,
            count: 0,
        }
    }
}
