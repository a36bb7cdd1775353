//! labterm - a Cisco-style lab console for the browser, compiled to WASM
//!
//! The page shows a terminal; the device CLI runs on the lab service.
//! This crate is the terminal itself:
//! - a mirrored input line with a block cursor placed inside the text
//! - line editing, tab completion and command history
//! - command / help / device-switch round-trips to the lab service
//!
//! Everything except the DOM and fetch glue is plain Rust and is tested
//! natively.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

pub mod buffer;
pub mod completion;
pub mod config;
pub mod history;
pub mod mirror;
pub mod page;
pub mod remote;
pub mod session;
pub mod transcript;

#[cfg(target_arch = "wasm32")]
pub mod network;

#[cfg(target_arch = "wasm32")]
pub mod view;

#[cfg(target_arch = "wasm32")]
mod runtime;

pub use buffer::EditBuffer;
pub use completion::{DeviceType, Vocabulary};
pub use config::TerminalConfig;
pub use history::History;
pub use mirror::{render, CursorCell, MirrorSegments};
pub use remote::{CommandResponse, LabApi, RemoteError, RemoteResult, SwitchResponse};
pub use session::{
    dispatch, KeyAction, KeyEvent, Request, SessionContext, SessionEvent, SessionState,
    TerminalSession,
};
pub use transcript::{Transcript, TranscriptEntry};

/// Initialize panic hook for better error messages in browser console
#[cfg(target_arch = "wasm32")]
fn init_panic_hook() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Mount the terminal. This is the WASM entry point.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn main() {
    init_panic_hook();
    if let Err(e) = runtime::start() {
        web_sys::console::error_1(&e);
    }
}

/// Console logging helper
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = console)]
    fn log(s: &str);
}

/// Log to browser console (WASM)
#[cfg(target_arch = "wasm32")]
#[macro_export]
macro_rules! console_log {
    ($($t:tt)*) => {
        $crate::log(&format!($($t)*))
    };
}

/// Log to stderr (native)
#[cfg(not(target_arch = "wasm32"))]
#[macro_export]
macro_rules! console_log {
    ($($t:tt)*) => {
        eprintln!($($t)*)
    };
}
