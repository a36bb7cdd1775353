//! Mirror renderer
//!
//! The page can't draw a caret inside styled text, so the input line is
//! mirrored as three spans: text before the caret, a one-cell cursor, and
//! text after it. The real `<input>` stays invisible underneath.
//!
//! This module is the pure half: it turns an [`EditBuffer`] into
//! [`MirrorSegments`]. The DOM half lives in `view`.

use crate::buffer::EditBuffer;

/// Placeholder shown when the caret sits past the last character
pub const BLANK_CELL: &str = "\u{a0}";

/// The cell under the cursor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorCell {
    /// Caret is on a character; it's drawn highlighted
    Char(char),
    /// Caret is at end of line; an empty block is drawn
    Blank,
}

impl CursorCell {
    /// Text to put in the cursor span. Never empty.
    pub fn display_text(&self) -> String {
        match self {
            CursorCell::Char(c) => c.to_string(),
            CursorCell::Blank => BLANK_CELL.to_string(),
        }
    }

    /// Whether the cell covers a real character (`cursor-block` style)
    pub fn is_block(&self) -> bool {
        matches!(self, CursorCell::Char(_))
    }
}

/// The three visual pieces of the input line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorSegments {
    pub before: String,
    pub cursor: CursorCell,
    pub after: String,
}

impl MirrorSegments {
    /// Reassemble the buffer text the segments were cut from
    pub fn buffer_text(&self) -> String {
        let mut text = self.before.clone();
        if let CursorCell::Char(c) = self.cursor {
            text.push(c);
        }
        text.push_str(&self.after);
        text
    }

    /// Full visible line (what a screen reader or a snapshot sees)
    pub fn visible_text(&self) -> String {
        format!("{}{}{}", self.before, self.cursor.display_text(), self.after)
    }
}

/// Split a buffer at its caret
pub fn render(buffer: &EditBuffer) -> MirrorSegments {
    let mut chars = buffer.text().chars();
    let before: String = chars.by_ref().take(buffer.caret()).collect();
    let cursor = match chars.next() {
        Some(c) => CursorCell::Char(c),
        None => CursorCell::Blank,
    };
    let after: String = chars.collect();

    MirrorSegments {
        before,
        cursor,
        after,
    }
}


#[cfg(all(test, not(target_arch = "wasm32")))]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn segments_concatenate_to_buffer(text in "\\PC{0,40}", caret in 0usize..48) {
            let mut buf = EditBuffer::with_text(text.clone());
            buf.set_caret(caret);
            let segs = render(&buf);
            prop_assert_eq!(segs.buffer_text(), text);
            prop_assert!(!segs.cursor.display_text().is_empty());
            prop_assert_eq!(segs.before.chars().count(), buf.caret());
        }

        #[test]
        fn render_is_idempotent(text in "[ -~]{0,30}", caret in 0usize..32) {
            let mut buf = EditBuffer::with_text(text);
            buf.set_caret(caret);
            prop_assert_eq!(render(&buf), render(&buf));
        }
    }
}
