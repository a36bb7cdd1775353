//! Terminal session - the state machine behind the lab console
//!
//! One `TerminalSession` owns the edit buffer, history, transcript and
//! device context for the page. Key presses mutate it synchronously;
//! anything that needs the lab service is handed back as a [`Request`]
//! and finished later through `finish_command` / `finish_switch`.
//!
//! While a request is in flight the session is `AwaitingResponse` and
//! ignores keys and further requests, so at most one round-trip is ever
//! pending.

use std::cell::RefCell;
use std::collections::BTreeMap;

use crate::buffer::{utf16_to_caret, EditBuffer};
use crate::completion::{self, DeviceType, Vocabulary};
use crate::history::History;
use crate::mirror::{self, MirrorSegments};
use crate::page::PageData;
use crate::remote::{CommandResponse, LabApi, RemoteResult, SwitchResponse};
use crate::transcript::{Transcript, TranscriptEntry};

/// Key event from the input element
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyEvent {
    /// DOM `key` value ("a", "Enter", "ArrowUp")
    pub key: String,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl KeyEvent {
    pub fn plain(key: &str) -> Self {
        Self {
            key: key.to_string(),
            ..Self::default()
        }
    }

    pub fn ctrl(key: &str) -> Self {
        Self {
            key: key.to_string(),
            ctrl: true,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Accepting input
    Idle,
    /// A command, help query or switch is in flight; input is inert
    AwaitingResponse,
}

/// Round-trip the session needs performed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Command(String),
    /// Help query; the text already ends in `?`
    Help(String),
    Switch(String),
}

/// What a key press did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyAction {
    /// Buffer or caret changed; redraw
    Edited,
    /// Start this request (the transcript/buffer already reflect it)
    Dispatch(Request),
    /// Not ours; let the browser have it
    Ignored,
}

/// One-shot effects for the view
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Modal error for the user
    Alert(String),
    /// Hostname changed; relabel tabs and topology nodes
    DeviceRenamed { device_id: String, hostname: String },
    /// Switch completed; highlight the new device
    DeviceActivated(String),
    /// Lab criteria met
    LabCompleted,
    /// Re-enable and focus the input
    Focus,
}

/// Which device the console is attached to. Always replaced whole.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    pub active_device: String,
    pub prompt: String,
    pub device_type: DeviceType,
    pub vocabulary: Vocabulary,
}

impl SessionContext {
    pub fn new(active_device: impl Into<String>, prompt: impl Into<String>, device_type: DeviceType) -> Self {
        Self {
            active_device: active_device.into(),
            prompt: prompt.into(),
            device_type,
            vocabulary: Vocabulary::for_device(device_type),
        }
    }
}

pub struct TerminalSession {
    buffer: EditBuffer,
    history: History,
    transcript: Transcript,
    context: SessionContext,
    /// device id -> display hostname
    hostnames: BTreeMap<String, String>,
    state: SessionState,
    lab_completed: bool,
    events: Vec<SessionEvent>,
}

impl TerminalSession {
    pub fn new(context: SessionContext, history: History) -> Self {
        Self {
            buffer: EditBuffer::new(),
            history,
            transcript: Transcript::new(),
            context,
            hostnames: BTreeMap::new(),
            state: SessionState::Idle,
            lab_completed: false,
            events: Vec::new(),
        }
    }

    /// Session as described by the page
    pub fn from_page(page: &PageData, history: History) -> Self {
        let context = SessionContext::new(&page.current_device, &page.prompt, page.device_type);
        let mut session = Self::new(context, history);
        session.hostnames = page.hostnames.clone();
        session.transcript.replace_all(page.initial_transcript());
        session
    }

    // ===== Accessors =====

    pub fn buffer(&self) -> &EditBuffer {
        &self.buffer
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    pub fn prompt(&self) -> &str {
        &self.context.prompt
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == SessionState::Idle
    }

    pub fn lab_completed(&self) -> bool {
        self.lab_completed
    }

    pub fn hostnames(&self) -> &BTreeMap<String, String> {
        &self.hostnames
    }

    /// Label shown for a device
    pub fn hostname<'a>(&'a self, device_id: &'a str) -> &'a str {
        self.hostnames
            .get(device_id)
            .map(String::as_str)
            .unwrap_or(device_id)
    }

    /// Mirror segments for the current line
    pub fn mirror(&self) -> MirrorSegments {
        mirror::render(&self.buffer)
    }

    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    // ===== Keyboard =====

    /// Handle a key press on the input
    pub fn handle_key(&mut self, event: &KeyEvent) -> KeyAction {
        if !self.is_idle() {
            return KeyAction::Ignored;
        }

        if event.ctrl {
            return self.handle_ctrl(&event.key);
        }

        match event.key.as_str() {
            "Enter" => return self.dispatch_or_ignore(Self::begin_command),
            "?" => return self.dispatch_or_ignore(Self::begin_help),
            "Tab" => {
                self.complete();
                return KeyAction::Edited;
            }
            "ArrowUp" => {
                if let Some(cmd) = self.history.recall_previous() {
                    let cmd = cmd.to_string();
                    self.buffer.replace(cmd);
                }
                return KeyAction::Edited;
            }
            "ArrowDown" => {
                if let Some(cmd) = self.history.recall_next() {
                    let cmd = cmd.to_string();
                    self.buffer.replace(cmd);
                }
                return KeyAction::Edited;
            }
            "ArrowLeft" => self.buffer.move_left(),
            "ArrowRight" => self.buffer.move_right(),
            "Home" => self.buffer.move_home(),
            "End" => self.buffer.move_end(),
            "Backspace" => {
                self.buffer.backspace();
                self.history.reset_cursor();
            }
            "Delete" => {
                self.buffer.delete();
                self.history.reset_cursor();
            }
            key => {
                let mut chars = key.chars();
                match (chars.next(), chars.next()) {
                    (Some(ch), None) if !ch.is_control() && !event.alt && !event.meta => {
                        self.buffer.insert(ch);
                        self.history.reset_cursor();
                    }
                    _ => return KeyAction::Ignored,
                }
            }
        }
        KeyAction::Edited
    }

    /// Readline-style control keys
    fn handle_ctrl(&mut self, key: &str) -> KeyAction {
        match key {
            "a" => self.buffer.move_home(),
            "e" => self.buffer.move_end(),
            "k" => {
                self.buffer.kill_to_end();
                self.history.reset_cursor();
            }
            "u" => {
                self.buffer.kill_to_start();
                self.history.reset_cursor();
            }
            "w" => {
                self.buffer.delete_word_back();
                self.history.reset_cursor();
            }
            "c" => {
                let line = self.buffer.take();
                self.transcript
                    .append(TranscriptEntry::command(&self.context.prompt, format!("{}^C", line)));
                self.history.reset_cursor();
            }
            _ => return KeyAction::Ignored,
        }
        KeyAction::Edited
    }

    fn dispatch_or_ignore(&mut self, begin: fn(&mut Self) -> Option<Request>) -> KeyAction {
        match begin(self) {
            Some(request) => KeyAction::Dispatch(request),
            None => KeyAction::Ignored,
        }
    }

    /// Tab completion on the last token; caret goes to the end
    pub fn complete(&mut self) -> bool {
        match completion::complete(self.buffer.text(), &self.context.vocabulary) {
            Some(line) => {
                self.buffer.replace(line);
                self.history.reset_cursor();
                true
            }
            None => false,
        }
    }

    /// The native input changed under us (paste, IME, mobile keyboards)
    pub fn input_replaced(&mut self, value: &str, selection_utf16: u32) {
        if !self.is_idle() {
            return;
        }
        if value != self.buffer.text() {
            self.buffer.replace(value);
            self.history.reset_cursor();
        }
        self.buffer.set_caret(utf16_to_caret(value, selection_utf16));
    }

    // ===== Commands =====

    /// Submit the current line.
    ///
    /// The command is echoed right away with the prompt in effect now,
    /// the buffer is cleared and the line goes into history.
    pub fn begin_command(&mut self) -> Option<Request> {
        if !self.is_idle() {
            return None;
        }

        let cmd = self.buffer.take();
        self.transcript
            .append(TranscriptEntry::command(&self.context.prompt, &cmd));
        if !cmd.trim().is_empty() {
            self.history.record(&cmd);
        }
        self.history.reset_cursor();

        self.state = SessionState::AwaitingResponse;
        Some(Request::Command(cmd))
    }

    /// Ask for context help on the current line. The line is kept.
    pub fn begin_help(&mut self) -> Option<Request> {
        if !self.is_idle() {
            return None;
        }

        let query = format!("{}?", self.buffer.text());
        self.transcript
            .append(TranscriptEntry::command(&self.context.prompt, &query));

        self.state = SessionState::AwaitingResponse;
        Some(Request::Help(query))
    }

    /// Apply the reply to a command or help query
    pub fn finish_command(&mut self, result: RemoteResult<CommandResponse>) {
        match result {
            Ok(resp) => {
                if let Some(output) = resp.output.filter(|o| !o.is_empty()) {
                    self.transcript.append(TranscriptEntry::output(output));
                }
                self.context.prompt = resp.prompt;

                if let Some(hostname) = resp.new_hostname.filter(|h| !h.is_empty()) {
                    let device_id = self.context.active_device.clone();
                    if self.hostname(&device_id) != hostname {
                        crate::console_log!("[session] {} is now {}", device_id, hostname);
                        self.hostnames.insert(device_id.clone(), hostname.clone());
                        self.events
                            .push(SessionEvent::DeviceRenamed { device_id, hostname });
                    }
                }

                if resp.completed && !self.lab_completed {
                    self.lab_completed = true;
                    self.events.push(SessionEvent::LabCompleted);
                }
            }
            Err(e) => {
                crate::console_log!("[session] Command failed: {}", e);
                self.transcript
                    .append(TranscriptEntry::output(format!("% Error: {}", e)));
            }
        }

        self.state = SessionState::Idle;
        self.events.push(SessionEvent::Focus);
    }

    // ===== Device switching =====

    /// Start switching to `target`. Returns `None` when it's already
    /// active or something else is in flight.
    pub fn request_switch(&mut self, target: &str) -> Option<Request> {
        if target == self.context.active_device || !self.is_idle() {
            return None;
        }
        self.state = SessionState::AwaitingResponse;
        Some(Request::Switch(target.to_string()))
    }

    /// Apply the reply to a switch. On any failure the context is untouched.
    pub fn finish_switch(&mut self, target: &str, result: RemoteResult<SwitchResponse>) {
        match result {
            Ok(resp) if resp.is_ok() => {
                let context = SessionContext::new(target, resp.prompt, resp.device_type);
                let logs: Vec<TranscriptEntry> = resp
                    .logs
                    .into_iter()
                    .map(|e| TranscriptEntry::from_wire(e, &context.prompt))
                    .collect();

                self.context = context;
                self.transcript.replace_all(logs);
                self.buffer.clear();
                self.history.reset_cursor();

                self.events.push(SessionEvent::DeviceActivated(target.to_string()));
            }
            Ok(resp) => {
                let message = resp.message.unwrap_or_else(|| resp.status.clone());
                crate::console_log!("[session] Switch to {} refused: {}", target, message);
                self.events.push(SessionEvent::Alert(format!("Error: {}", message)));
            }
            Err(e) => {
                crate::console_log!("[session] Switch to {} failed: {}", target, e);
                self.events.push(SessionEvent::Alert(format!("Error: {}", e)));
            }
        }

        self.state = SessionState::Idle;
        self.events.push(SessionEvent::Focus);
    }
}

/// Perform `request` against `api` and apply the result.
///
/// The session is only borrowed before and after the await, never across
/// it, so other callbacks can still read it while the request is pending.
pub async fn dispatch<A: LabApi>(session: &RefCell<TerminalSession>, api: &A, request: Request) {
    match request {
        Request::Command(line) | Request::Help(line) => {
            let result = api.submit_command(&line).await;
            session.borrow_mut().finish_command(result);
        }
        Request::Switch(target) => {
            let result = api.switch_device(&target).await;
            session.borrow_mut().finish_switch(&target, result);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::RemoteError;
    use crate::transcript::WireEntry;

    fn session() -> TerminalSession {
        TerminalSession::new(SessionContext::new("R1", "R1>", DeviceType::Router), History::new())
    }

    fn type_text(s: &mut TerminalSession, text: &str) {
        for ch in text.chars() {
            s.handle_key(&KeyEvent::plain(&ch.to_string()));
        }
    }

    fn reply(prompt: &str) -> RemoteResult<CommandResponse> {
        Ok(CommandResponse {
            prompt: prompt.to_string(),
            ..CommandResponse::default()
        })
    }

    #[test]
    fn test_typing_and_editing() {
        let mut s = session();
        type_text(&mut s, "shw");
        s.handle_key(&KeyEvent::plain("ArrowLeft"));
        s.handle_key(&KeyEvent::plain("o"));
        assert_eq!(s.buffer().text(), "show");
        assert_eq!(s.buffer().caret(), 3);

        s.handle_key(&KeyEvent::plain("End"));
        s.handle_key(&KeyEvent::plain("Backspace"));
        assert_eq!(s.buffer().text(), "sho");
    }

    #[test]
    fn test_ctrl_keys() {
        let mut s = session();
        type_text(&mut s, "show ip");
        s.handle_key(&KeyEvent::ctrl("w"));
        assert_eq!(s.buffer().text(), "show ");
        s.handle_key(&KeyEvent::ctrl("a"));
        assert_eq!(s.buffer().caret(), 0);
        s.handle_key(&KeyEvent::ctrl("k"));
        assert_eq!(s.buffer().text(), "");
        assert_eq!(s.handle_key(&KeyEvent::ctrl("z")), KeyAction::Ignored);
    }

    #[test]
    fn test_ctrl_c_echoes_and_clears() {
        let mut s = session();
        type_text(&mut s, "conf");
        assert_eq!(s.handle_key(&KeyEvent::ctrl("c")), KeyAction::Edited);
        assert!(s.buffer().is_empty());
        assert_eq!(s.transcript().last(), Some(&TranscriptEntry::command("R1>", "conf^C")));
        assert!(s.history().is_empty());
    }

    #[test]
    fn test_non_printable_keys_ignored() {
        let mut s = session();
        assert_eq!(s.handle_key(&KeyEvent::plain("Shift")), KeyAction::Ignored);
        assert_eq!(s.handle_key(&KeyEvent::plain("F5")), KeyAction::Ignored);
        let alt_f = KeyEvent {
            key: "f".to_string(),
            alt: true,
            ..KeyEvent::default()
        };
        assert_eq!(s.handle_key(&alt_f), KeyAction::Ignored);
        assert!(s.buffer().is_empty());
    }

    #[test]
    fn test_tab_completes() {
        let mut s = session();
        type_text(&mut s, "sh");
        s.handle_key(&KeyEvent::plain("ArrowLeft"));
        s.handle_key(&KeyEvent::plain("Tab"));
        // "show" / "shutdown" share only "sh"
        assert_eq!(s.buffer().text(), "sh");

        s.handle_key(&KeyEvent::plain("End"));
        type_text(&mut s, "o");
        s.handle_key(&KeyEvent::plain("Tab"));
        assert_eq!(s.buffer().text(), "show ");
        assert_eq!(s.buffer().caret(), 5);
    }

    #[test]
    fn test_completion_follows_device_vocabulary() {
        let mut s = session();
        type_text(&mut s, "vla");
        s.handle_key(&KeyEvent::plain("Tab"));
        assert_eq!(s.buffer().text(), "vla");

        s.request_switch("SW1");
        s.finish_switch("SW1", Ok(SwitchResponse::ok("SW1>", vec![], DeviceType::Switch)));
        type_text(&mut s, "vla");
        s.handle_key(&KeyEvent::plain("Tab"));
        assert_eq!(s.buffer().text(), "vlan ");
    }

    #[test]
    fn test_enter_echoes_clears_and_records() {
        let mut s = session();
        type_text(&mut s, "enable");
        let action = s.handle_key(&KeyEvent::plain("Enter"));

        assert_eq!(action, KeyAction::Dispatch(Request::Command("enable".to_string())));
        assert_eq!(s.transcript().last(), Some(&TranscriptEntry::command("R1>", "enable")));
        assert!(s.buffer().is_empty());
        assert_eq!(s.history().entries(), ["enable"]);
        assert_eq!(s.state(), SessionState::AwaitingResponse);
    }

    #[test]
    fn test_empty_enter_still_sent_not_recorded() {
        let mut s = session();
        let action = s.handle_key(&KeyEvent::plain("Enter"));
        assert_eq!(action, KeyAction::Dispatch(Request::Command(String::new())));
        assert!(s.history().is_empty());
        assert_eq!(s.transcript().last().map(|e| e.render().text), Some("R1> ".to_string()));
    }

    #[test]
    fn test_keys_ignored_while_awaiting() {
        let mut s = session();
        s.begin_command();
        assert_eq!(s.handle_key(&KeyEvent::plain("a")), KeyAction::Ignored);
        assert_eq!(s.handle_key(&KeyEvent::plain("Enter")), KeyAction::Ignored);
        assert!(s.buffer().is_empty());
        assert_eq!(s.begin_help(), None);
        assert_eq!(s.request_switch("R2"), None);
    }

    #[test]
    fn test_help_keeps_buffer() {
        let mut s = session();
        type_text(&mut s, "show ");
        let action = s.handle_key(&KeyEvent::plain("?"));

        assert_eq!(action, KeyAction::Dispatch(Request::Help("show ?".to_string())));
        assert_eq!(s.buffer().text(), "show ");
        assert_eq!(s.transcript().last(), Some(&TranscriptEntry::command("R1>", "show ?")));
        assert!(s.history().is_empty());

        s.finish_command(Ok(CommandResponse {
            output: Some("  running-config".to_string()),
            prompt: "R1>".to_string(),
            ..CommandResponse::default()
        }));
        assert!(s.is_idle());
        assert_eq!(s.buffer().text(), "show ");
        assert_eq!(s.transcript().last(), Some(&TranscriptEntry::output("  running-config")));
    }

    #[test]
    fn test_finish_command_updates_prompt() {
        let mut s = session();
        type_text(&mut s, "enable");
        s.begin_command();
        let before = s.transcript().len();
        s.finish_command(reply("R1#"));

        assert_eq!(s.prompt(), "R1#");
        assert_eq!(s.transcript().len(), before);
        assert!(s.is_idle());
        assert_eq!(s.drain_events(), vec![SessionEvent::Focus]);
    }

    #[test]
    fn test_hostname_falls_back_to_device_id() {
        let s = session();
        let device = String::from("SW9");
        let label = s.hostname(&device);
        assert_eq!(label, "SW9");
    }

    #[test]
    fn test_hostname_change_emits_rename_once() {
        let mut s = session();
        s.begin_command();
        s.finish_command(Ok(CommandResponse {
            prompt: "Core(config)#".to_string(),
            new_hostname: Some("Core".to_string()),
            ..CommandResponse::default()
        }));
        let events = s.drain_events();
        assert!(events.contains(&SessionEvent::DeviceRenamed {
            device_id: "R1".to_string(),
            hostname: "Core".to_string(),
        }));
        assert_eq!(s.hostname("R1"), "Core");

        s.begin_command();
        s.finish_command(Ok(CommandResponse {
            prompt: "Core(config)#".to_string(),
            new_hostname: Some("Core".to_string()),
            ..CommandResponse::default()
        }));
        assert_eq!(s.drain_events(), vec![SessionEvent::Focus]);
    }

    #[test]
    fn test_unchanged_hostname_not_reported() {
        let mut s = session();
        s.begin_command();
        s.finish_command(Ok(CommandResponse {
            prompt: "R1>".to_string(),
            new_hostname: Some("R1".to_string()),
            ..CommandResponse::default()
        }));
        assert_eq!(s.drain_events(), vec![SessionEvent::Focus]);
    }

    #[test]
    fn test_prompt_captured_at_submit() {
        let mut s = session();
        type_text(&mut s, "hostname Core");
        s.begin_command();
        s.finish_command(reply("Core>"));

        let lines: Vec<String> = s.transcript().lines().map(|l| l.text).collect();
        assert_eq!(lines.last().map(String::as_str), Some("R1> hostname Core"));
        assert_eq!(s.prompt(), "Core>");
    }

    #[test]
    fn test_lab_completed_once() {
        let mut s = session();
        for _ in 0..2 {
            s.begin_command();
            s.finish_command(Ok(CommandResponse {
                prompt: "R1#".to_string(),
                completed: true,
                ..CommandResponse::default()
            }));
        }
        assert!(s.lab_completed());
        let completions = s
            .drain_events()
            .into_iter()
            .filter(|e| *e == SessionEvent::LabCompleted)
            .count();
        assert_eq!(completions, 1);
    }

    #[test]
    fn test_transport_failure_appends_error_and_recovers() {
        let mut s = session();
        type_text(&mut s, "show run");
        s.begin_command();
        s.finish_command(Err(RemoteError::Transport("Failed to fetch".to_string())));

        assert!(s.is_idle());
        assert_eq!(s.prompt(), "R1>");
        assert_eq!(s.transcript().last(), Some(&TranscriptEntry::output("% Error: Failed to fetch")));
        assert_eq!(s.handle_key(&KeyEvent::plain("x")), KeyAction::Edited);
    }

    #[test]
    fn test_history_navigation_through_keys() {
        let mut s = session();
        for cmd in ["enable", "show ip"] {
            type_text(&mut s, cmd);
            s.begin_command();
            s.finish_command(reply("R1#"));
        }

        s.handle_key(&KeyEvent::plain("ArrowUp"));
        assert_eq!(s.buffer().text(), "show ip");
        assert_eq!(s.buffer().caret(), 7);
        s.handle_key(&KeyEvent::plain("ArrowUp"));
        assert_eq!(s.buffer().text(), "enable");
        s.handle_key(&KeyEvent::plain("ArrowDown"));
        assert_eq!(s.buffer().text(), "show ip");
        s.handle_key(&KeyEvent::plain("ArrowDown"));
        assert_eq!(s.buffer().text(), "");
        s.handle_key(&KeyEvent::plain("ArrowDown"));
        assert_eq!(s.buffer().text(), "");
    }

    #[test]
    fn test_edit_resets_history_browsing() {
        let mut s = session();
        type_text(&mut s, "enable");
        s.begin_command();
        s.finish_command(reply("R1#"));

        s.handle_key(&KeyEvent::plain("ArrowUp"));
        assert!(s.history().is_browsing());
        s.handle_key(&KeyEvent::plain("x"));
        assert!(!s.history().is_browsing());
        // Down does nothing once browsing ended
        s.handle_key(&KeyEvent::plain("ArrowDown"));
        assert_eq!(s.buffer().text(), "enablex");
    }

    #[test]
    fn test_switch_to_active_device_is_noop() {
        let mut s = session();
        assert_eq!(s.request_switch("R1"), None);
        assert!(s.is_idle());
    }

    #[test]
    fn test_switch_success_swaps_context() {
        let mut s = session();
        type_text(&mut s, "half typed");
        let req = s.request_switch("SW1");
        assert_eq!(req, Some(Request::Switch("SW1".to_string())));
        assert!(!s.is_idle());

        let logs = vec![
            WireEntry {
                kind: "cmd".to_string(),
                text: "enable".to_string(),
                prompt: Some("SW1>".to_string()),
            },
            WireEntry {
                kind: "out".to_string(),
                text: "Switched to SW1 (switch).".to_string(),
                prompt: None,
            },
        ];
        s.finish_switch("SW1", Ok(SwitchResponse::ok("SW1#", logs, DeviceType::Switch)));

        assert!(s.is_idle());
        assert_eq!(s.context().active_device, "SW1");
        assert_eq!(s.prompt(), "SW1#");
        assert_eq!(s.context().device_type, DeviceType::Switch);
        assert!(s.context().vocabulary.contains("vlan"));
        assert!(s.buffer().is_empty());
        assert_eq!(
            s.transcript().entries(),
            [
                TranscriptEntry::command("SW1>", "enable"),
                TranscriptEntry::output("Switched to SW1 (switch)."),
            ]
        );
        assert_eq!(
            s.drain_events(),
            vec![SessionEvent::DeviceActivated("SW1".to_string()), SessionEvent::Focus]
        );
    }

    #[test]
    fn test_switch_refused_leaves_context() {
        let mut s = session();
        s.transcript.append(TranscriptEntry::output("keep me"));
        let before = s.context().clone();

        s.request_switch("R9");
        s.finish_switch("R9", Ok(SwitchResponse::error("Access Denied")));

        assert!(s.is_idle());
        assert_eq!(s.context(), &before);
        assert_eq!(s.transcript().last(), Some(&TranscriptEntry::output("keep me")));
        assert_eq!(
            s.drain_events(),
            vec![SessionEvent::Alert("Error: Access Denied".to_string()), SessionEvent::Focus]
        );
    }

    #[test]
    fn test_switch_transport_error_alerts() {
        let mut s = session();
        s.request_switch("R2");
        s.finish_switch("R2", Err(RemoteError::Transport("offline".to_string())));
        assert_eq!(s.context().active_device, "R1");
        assert!(s.drain_events().contains(&SessionEvent::Alert("Error: offline".to_string())));
    }

    #[test]
    fn test_input_replaced_syncs_buffer() {
        let mut s = session();
        s.input_replaced("show ip int", 4);
        assert_eq!(s.buffer().text(), "show ip int");
        assert_eq!(s.buffer().caret(), 4);

        s.input_replaced("show ip int", 99);
        assert_eq!(s.buffer().caret(), 11);
    }

    #[test]
    fn test_mirror_tracks_caret() {
        let mut s = session();
        type_text(&mut s, "end");
        s.handle_key(&KeyEvent::plain("Home"));
        let segs = s.mirror();
        assert_eq!(segs.before, "");
        assert_eq!(segs.cursor, mirror::CursorCell::Char('e'));
        assert_eq!(segs.after, "nd");
    }
}
