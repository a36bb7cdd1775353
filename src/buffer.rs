//! Edit buffer - the text being typed plus its caret
//!
//! The caret is a char index, never a byte index, so multi-byte input
//! can't split a character. Every mutator keeps `caret <= len`.
//!
//! The browser's native input reports selection offsets in UTF-16 code
//! units; `utf16_to_caret`/`caret_to_utf16` translate between the two.

/// Current input line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditBuffer {
    text: String,
    caret: usize,
}

impl EditBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffer holding `text` with the caret at the end
    pub fn with_text(text: impl Into<String>) -> Self {
        let text = text.into();
        let caret = text.chars().count();
        Self { text, caret }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn caret(&self) -> usize {
        self.caret
    }

    /// Length in chars
    pub fn len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Move the caret, clamped to the buffer
    pub fn set_caret(&mut self, caret: usize) {
        self.caret = caret.min(self.len());
    }

    /// Replace the whole text, caret to end
    pub fn replace(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.caret = self.len();
    }

    /// Take the text out, leaving an empty buffer
    pub fn take(&mut self) -> String {
        self.caret = 0;
        std::mem::take(&mut self.text)
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.caret = 0;
    }

    /// Byte offset of a char index
    fn byte_at(&self, idx: usize) -> usize {
        self.text
            .char_indices()
            .nth(idx)
            .map(|(i, _)| i)
            .unwrap_or(self.text.len())
    }

    /// Insert a character at the caret
    pub fn insert(&mut self, ch: char) {
        let at = self.byte_at(self.caret);
        self.text.insert(at, ch);
        self.caret += 1;
    }

    /// Delete the char before the caret
    pub fn backspace(&mut self) -> bool {
        if self.caret == 0 {
            return false;
        }
        self.caret -= 1;
        let at = self.byte_at(self.caret);
        self.text.remove(at);
        true
    }

    /// Delete the char under the caret
    pub fn delete(&mut self) -> bool {
        if self.caret >= self.len() {
            return false;
        }
        let at = self.byte_at(self.caret);
        self.text.remove(at);
        true
    }

    pub fn move_left(&mut self) {
        self.caret = self.caret.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        if self.caret < self.len() {
            self.caret += 1;
        }
    }

    pub fn move_home(&mut self) {
        self.caret = 0;
    }

    pub fn move_end(&mut self) {
        self.caret = self.len();
    }

    /// Ctrl+K
    pub fn kill_to_end(&mut self) {
        let at = self.byte_at(self.caret);
        self.text.truncate(at);
    }

    /// Ctrl+U
    pub fn kill_to_start(&mut self) {
        let at = self.byte_at(self.caret);
        self.text.drain(..at);
        self.caret = 0;
    }

    /// Ctrl+W - delete the word before the caret, and any spaces after it
    pub fn delete_word_back(&mut self) {
        if self.caret == 0 {
            return;
        }
        let chars: Vec<char> = self.text.chars().collect();

        let mut start = self.caret;
        while start > 0 && chars[start - 1] == ' ' {
            start -= 1;
        }
        while start > 0 && chars[start - 1] != ' ' {
            start -= 1;
        }

        let from = self.byte_at(start);
        let to = self.byte_at(self.caret);
        self.text.drain(from..to);
        self.caret = start;
    }

    /// Caret position in UTF-16 code units, for `setSelectionRange`
    pub fn caret_utf16(&self) -> u32 {
        caret_to_utf16(&self.text, self.caret)
    }
}

/// Convert a char index into a UTF-16 offset
pub fn caret_to_utf16(text: &str, caret: usize) -> u32 {
    text.chars()
        .take(caret)
        .map(|c| c.len_utf16() as u32)
        .sum()
}

/// Convert a UTF-16 offset (from the DOM) into a char index.
///
/// An offset landing inside a surrogate pair rounds down.
pub fn utf16_to_caret(text: &str, offset: u32) -> usize {
    let mut units = 0u32;
    for (idx, ch) in text.chars().enumerate() {
        let next = units + ch.len_utf16() as u32;
        if next > offset {
            return idx;
        }
        units = next;
    }
    text.chars().count()
}


#[cfg(all(test, not(target_arch = "wasm32")))]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    #[derive(Debug, Clone)]
    enum Op {
        Insert(char),
        Backspace,
        Delete,
        Left,
        Right,
        Home,
        End,
        KillToEnd,
        KillToStart,
        DeleteWord,
        SetCaret(usize),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            any::<char>().prop_map(Op::Insert),
            Just(Op::Backspace),
            Just(Op::Delete),
            Just(Op::Left),
            Just(Op::Right),
            Just(Op::Home),
            Just(Op::End),
            Just(Op::KillToEnd),
            Just(Op::KillToStart),
            Just(Op::DeleteWord),
            (0usize..64).prop_map(Op::SetCaret),
        ]
    }

    proptest! {
        #[test]
        fn caret_stays_within_text(ops in prop::collection::vec(op(), 0..60)) {
            let mut buf = EditBuffer::new();
            for op in ops {
                match op {
                    Op::Insert(c) => buf.insert(c),
                    Op::Backspace => { buf.backspace(); }
                    Op::Delete => { buf.delete(); }
                    Op::Left => buf.move_left(),
                    Op::Right => buf.move_right(),
                    Op::Home => buf.move_home(),
                    Op::End => buf.move_end(),
                    Op::KillToEnd => buf.kill_to_end(),
                    Op::KillToStart => buf.kill_to_start(),
                    Op::DeleteWord => buf.delete_word_back(),
                    Op::SetCaret(n) => buf.set_caret(n),
                }
                prop_assert!(buf.caret() <= buf.len());
            }
        }

        #[test]
        fn utf16_caret_round_trips(text in "\\PC{0,30}", caret in 0usize..34) {
            let mut buf = EditBuffer::with_text(text.clone());
            buf.set_caret(caret);
            prop_assert_eq!(utf16_to_caret(&text, buf.caret_utf16()), buf.caret());
        }
    }
}
