//! DOM view of the lab console
//!
//! Applies session state to the page:
//! - prompt text and the mirrored input line (before / cursor / after spans)
//! - transcript lines, inserted above the input line
//! - device labels, active-device highlight, completion badge
//! - keeping the invisible `<input>` in step with the edit buffer
//!
//! All state lives in `TerminalSession`; this only draws it.

#![cfg(target_arch = "wasm32")]

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlElement, HtmlInputElement};

use crate::config::ElementIds;
use crate::mirror::MirrorSegments;
use crate::session::{SessionEvent, TerminalSession};
use crate::transcript::{LineKind, RenderMark, TranscriptLine};

const LOG_LINE_CLASS: &str = "log-line";

/// Handles to the terminal's elements
pub struct TerminalView {
    document: Document,
    input: HtmlInputElement,
    input_line: Element,
    output: Element,
    prompt: Element,
    wrapper: HtmlElement,
    status_id: String,
    /// How much of the transcript is already on screen
    drawn: RenderMark,
}

impl TerminalView {
    /// Bind to the page. Fails if a required element is missing.
    pub fn mount(document: Document, ids: &ElementIds) -> Result<Self, JsValue> {
        let input: HtmlInputElement = find(&document, &ids.input)?.dyn_into()?;
        let input_line = find(&document, &ids.input_line)?;
        let output = find(&document, &ids.output)?;
        let prompt = find(&document, &ids.prompt)?;
        let wrapper: HtmlElement = find(&document, &ids.wrapper)?.dyn_into()?;

        Ok(Self {
            document,
            input,
            input_line,
            output,
            prompt,
            wrapper,
            status_id: ids.status.clone(),
            drawn: RenderMark::default(),
        })
    }

    pub fn input(&self) -> &HtmlInputElement {
        &self.input
    }

    pub fn wrapper(&self) -> &HtmlElement {
        &self.wrapper
    }

    /// Bring the page up to date with the session
    pub fn sync(&mut self, session: &mut TerminalSession) {
        for event in session.drain_events() {
            self.apply_event(session, event);
        }

        self.prompt.set_text_content(Some(session.prompt()));
        self.sync_transcript(session);
        self.sync_input(session);
        self.render_mirror(&session.mirror());
    }

    /// Replace everything after the prompt with the three mirror spans
    pub fn render_mirror(&self, segments: &MirrorSegments) {
        while let Some(next) = self.prompt.next_sibling() {
            let _ = self.input_line.remove_child(&next);
        }

        if let Ok(span) = self.span(&segments.before) {
            let _ = self.input_line.append_child(&span);
        }

        if let Ok(cursor) = self.span(&segments.cursor.display_text()) {
            let class = if segments.cursor.is_block() {
                "cursor cursor-block"
            } else {
                "cursor"
            };
            cursor.set_class_name(class);
            let _ = self.input_line.append_child(&cursor);
        }

        if !segments.after.is_empty() {
            if let Ok(span) = self.span(&segments.after) {
                let _ = self.input_line.append_child(&span);
            }
        }

        self.scroll_to_bottom();
    }

    fn span(&self, text: &str) -> Result<Element, JsValue> {
        let span = self.document.create_element("span")?;
        span.set_text_content(Some(text));
        Ok(span)
    }

    fn sync_transcript(&mut self, session: &TerminalSession) {
        let transcript = session.transcript();
        let (reset, lines) = transcript.pending_since(self.drawn);
        if reset {
            self.clear_transcript();
        }
        for line in &lines {
            if let Err(e) = self.append_line(line) {
                web_sys::console::error_1(&e);
            }
        }
        self.drawn = transcript.mark();
    }

    fn clear_transcript(&self) {
        if let Ok(nodes) = self.output.query_selector_all(&format!(".{}", LOG_LINE_CLASS)) {
            for i in 0..nodes.length() {
                if let Some(node) = nodes.item(i) {
                    let _ = self.output.remove_child(&node);
                }
            }
        }
    }

    /// Insert a transcript line just above the input line
    fn append_line(&self, line: &TranscriptLine) -> Result<(), JsValue> {
        let div: HtmlElement = self.document.create_element("div")?.dyn_into()?;
        div.set_class_name(LOG_LINE_CLASS);
        div.set_text_content(Some(&line.text));
        if line.kind == LineKind::Command {
            div.style().set_property("font-weight", "bold")?;
        }
        let anchor: &web_sys::Node = &self.input_line;
        self.output.insert_before(&div, Some(anchor))?;
        Ok(())
    }

    /// Push buffer text, caret and enabled state into the native input
    fn sync_input(&self, session: &TerminalSession) {
        let buffer = session.buffer();
        if self.input.value() != buffer.text() {
            self.input.set_value(buffer.text());
        }
        let caret = buffer.caret_utf16();
        let _ = self.input.set_selection_range(caret, caret);
        self.input.set_disabled(!session.is_idle());
    }

    fn apply_event(&self, session: &TerminalSession, event: SessionEvent) {
        match event {
            SessionEvent::Alert(message) => {
                if let Some(window) = web_sys::window() {
                    let _ = window.alert_with_message(&message);
                }
            }
            SessionEvent::DeviceRenamed {
                device_id,
                hostname,
            } => self.set_device_label(&device_id, &hostname),
            SessionEvent::DeviceActivated(device_id) => self.highlight_device(&device_id),
            SessionEvent::LabCompleted => self.show_completed(),
            SessionEvent::Focus => {
                // Disabled inputs can't take focus; re-enable first
                self.input.set_disabled(!session.is_idle());
                self.focus();
            }
        }
    }

    pub fn focus(&self) {
        let _ = self.input.focus();
        let _ = self.wrapper.class_list().remove_1("blur");
    }

    pub fn scroll_to_bottom(&self) {
        self.wrapper.set_scroll_top(self.wrapper.scroll_height());
    }

    /// Relabel the device tab and topology node
    pub fn set_device_label(&self, device_id: &str, label: &str) {
        for id in [format!("tab-{}", device_id), format!("label-{}", device_id)] {
            if let Some(el) = self.document.get_element_by_id(&id) {
                el.set_text_content(Some(label));
            }
        }
    }

    /// Mark `device_id` as the active tab and topology node
    pub fn highlight_device(&self, device_id: &str) {
        self.toggle_exclusive(".device-tab", &format!("tab-{}", device_id), "active");
        self.toggle_exclusive(".node-wrapper", &format!("node-{}", device_id), "active-node");
    }

    fn toggle_exclusive(&self, selector: &str, active_id: &str, class: &str) {
        for el in self.select_all(selector) {
            let _ = el.class_list().remove_1(class);
        }
        if let Some(el) = self.document.get_element_by_id(active_id) {
            let _ = el.class_list().add_1(class);
        }
    }

    fn show_completed(&self) {
        let Some(status) = self.document.get_element_by_id(&self.status_id) else {
            return;
        };
        status.set_text_content(Some("DONE ✅"));
        if let Ok(status) = status.dyn_into::<HtmlElement>() {
            let _ = status.style().set_property("color", "green");
        }
    }

    /// Show the named info panel and mark its tab
    pub fn switch_info_tab(&self, name: &str) {
        for tab in self.select_all(".info-tab") {
            let _ = tab.class_list().remove_1("active");
        }
        for area in self.select_all(".content-area") {
            let _ = area.class_list().add_1("hidden");
        }

        let selector = format!(".info-tab[onclick=\"lab.switchInfoTab('{}')\"]", name);
        if let Ok(Some(tab)) = self.document.query_selector(&selector) {
            let _ = tab.class_list().add_1("active");
        }
        if let Some(area) = self.document.get_element_by_id(&format!("tab-{}", name)) {
            let _ = area.class_list().remove_1("hidden");
        }
    }

    fn select_all(&self, selector: &str) -> Vec<Element> {
        let Ok(nodes) = self.document.query_selector_all(selector) else {
            return Vec::new();
        };
        (0..nodes.length())
            .filter_map(|i| nodes.item(i))
            .filter_map(|node| node.dyn_into::<Element>().ok())
            .collect()
    }
}

fn find(document: &Document, id: &str) -> Result<Element, JsValue> {
    document
        .get_element_by_id(id)
        .ok_or_else(|| JsValue::from_str(&format!("Terminal element #{} missing", id)))
}
