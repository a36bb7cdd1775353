//! Command history with up/down browsing

/// Default cap on remembered commands
pub const DEFAULT_HISTORY_LIMIT: usize = 500;

/// Submitted commands, oldest first
#[derive(Debug, Clone)]
pub struct History {
    entries: Vec<String>,
    /// Index being shown while browsing; `None` when not browsing
    cursor: Option<usize>,
    limit: usize,
}

impl History {
    pub fn new() -> Self {
        Self::with_limit(DEFAULT_HISTORY_LIMIT)
    }

    pub fn with_limit(limit: usize) -> Self {
        Self {
            entries: Vec::new(),
            cursor: None,
            limit: limit.max(1),
        }
    }

    /// Remember a submitted command.
    ///
    /// Blank commands and repeats of the last entry are skipped.
    pub fn record(&mut self, cmd: &str) {
        self.cursor = None;

        if cmd.trim().is_empty() {
            return;
        }
        if self.entries.last().map(String::as_str) == Some(cmd) {
            return;
        }

        self.entries.push(cmd.to_string());
        if self.entries.len() > self.limit {
            let excess = self.entries.len() - self.limit;
            self.entries.drain(..excess);
        }
    }

    /// Step back toward older commands (ArrowUp)
    pub fn recall_previous(&mut self) -> Option<&str> {
        if self.entries.is_empty() {
            return None;
        }

        let idx = match self.cursor {
            None => self.entries.len() - 1,
            Some(idx) => idx.saturating_sub(1),
        };
        self.cursor = Some(idx);
        Some(&self.entries[idx])
    }

    /// Step forward toward newer commands (ArrowDown).
    ///
    /// Moving past the newest entry ends browsing and yields `""`.
    pub fn recall_next(&mut self) -> Option<&str> {
        let idx = self.cursor?;

        if idx + 1 < self.entries.len() {
            self.cursor = Some(idx + 1);
            Some(&self.entries[idx + 1])
        } else {
            self.cursor = None;
            Some("")
        }
    }

    /// Stop browsing (the user edited the line)
    pub fn reset_cursor(&mut self) {
        self.cursor = None;
    }

    pub fn is_browsing(&self) -> bool {
        self.cursor.is_some()
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}
