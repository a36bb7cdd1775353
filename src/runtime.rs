//! Browser runtime integration
//!
//! This module bridges the session to the page:
//! - reads the embedded page data and mounts the view
//! - DOM events on the input are turned into session calls
//! - remote requests run on `spawn_local` and redraw when they settle
//! - `window.lab` is exported for the page's tab `onclick` handlers

#![cfg(target_arch = "wasm32")]

use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

use crate::config::TerminalConfig;
use crate::console_log;
use crate::history::History;
use crate::network::HttpLabApi;
use crate::page::{self, PageData};
use crate::session::{dispatch, KeyAction, KeyEvent, Request, TerminalSession};
use crate::view::TerminalView;

/// The one terminal on the page. Shared by every event closure.
struct App {
    session: RefCell<TerminalSession>,
    view: RefCell<TerminalView>,
    api: HttpLabApi,
}

impl App {
    /// Redraw from session state
    fn refresh(&self) {
        let mut session = self.session.borrow_mut();
        self.view.borrow_mut().sync(&mut session);
    }

    /// Show the request's local effects, then run it in the background
    fn run(self: &Rc<Self>, request: Request) {
        self.refresh();

        let app = Rc::clone(self);
        wasm_bindgen_futures::spawn_local(async move {
            dispatch(&app.session, &app.api, request).await;
            app.refresh();
        });
    }

    fn on_key(self: &Rc<Self>, event: &web_sys::KeyboardEvent) {
        let key = KeyEvent {
            key: event.key(),
            ctrl: event.ctrl_key(),
            alt: event.alt_key(),
            meta: event.meta_key(),
        };

        let action = self.session.borrow_mut().handle_key(&key);
        match action {
            KeyAction::Edited => {
                event.prevent_default();
                self.refresh();
            }
            KeyAction::Dispatch(request) => {
                event.prevent_default();
                self.run(request);
            }
            KeyAction::Ignored => {}
        }
    }

    /// The native input changed or its caret moved without us
    fn on_input_changed(&self) {
        let (value, selection) = {
            let view = self.view.borrow();
            let input = view.input();
            let value = input.value();
            let selection = input
                .selection_start()
                .ok()
                .flatten()
                .unwrap_or(u32::MAX);
            (value, selection)
        };
        self.session.borrow_mut().input_replaced(&value, selection);
        self.refresh();
    }

    fn switch_device(self: &Rc<Self>, target: &str) {
        let request = self.session.borrow_mut().request_switch(target);
        match request {
            Some(request) => {
                console_log!("[runtime] Switching to {}", target);
                self.run(request);
            }
            None => console_log!("[runtime] Switch to {} skipped", target),
        }
    }
}

/// Start the terminal on the current page
pub fn start() -> Result<(), JsValue> {
    let window = web_sys::window().ok_or("no window")?;
    let document = window.document().ok_or("no document")?;

    let lookup = |id: &str| {
        document
            .get_element_by_id(id)
            .and_then(|el| el.text_content())
    };
    let config = TerminalConfig::from_json(lookup(page::TERMINAL_CONFIG).as_deref());
    let page = PageData::load(lookup, &config);

    let view = TerminalView::mount(document.clone(), &config.elements)?;
    let session = TerminalSession::from_page(&page, History::with_limit(config.history_limit));

    for (device_id, hostname) in &page.hostnames {
        view.set_device_label(device_id, hostname);
    }
    view.highlight_device(&page.current_device);

    let app = Rc::new(App {
        session: RefCell::new(session),
        view: RefCell::new(view),
        api: HttpLabApi::new(&config.api_base, &page.session_id),
    });

    setup_event_listeners(&app)?;
    export_lab_object(&window, &app)?;

    app.refresh();
    app.view.borrow().focus();

    console_log!(
        "[runtime] Terminal ready on {} (session {})",
        page.current_device,
        page.session_id
    );
    Ok(())
}

/// Set up event listeners for input
fn setup_event_listeners(app: &Rc<App>) -> Result<(), JsValue> {
    let (input, wrapper) = {
        let view = app.view.borrow();
        (view.input().clone(), view.wrapper().clone())
    };

    // Key down
    {
        let app = Rc::clone(app);
        let closure = Closure::wrap(Box::new(move |event: web_sys::KeyboardEvent| {
            app.on_key(&event);
        }) as Box<dyn FnMut(_)>);
        input.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref())?;
        closure.forget(); // Leak intentionally - lives for page lifetime
    }

    // Paste, IME, and caret moves by mouse
    for name in ["input", "click", "keyup"] {
        let app = Rc::clone(app);
        let closure = Closure::wrap(Box::new(move |_event: web_sys::Event| {
            app.on_input_changed();
        }) as Box<dyn FnMut(_)>);
        input.add_event_listener_with_callback(name, closure.as_ref().unchecked_ref())?;
        closure.forget();
    }

    // Focus / blur. These fire synchronously from `focus()` while the view
    // is borrowed, so they only touch the wrapper's class list.
    for (name, blurred) in [("focus", false), ("blur", true)] {
        let wrapper = wrapper.clone();
        let closure = Closure::wrap(Box::new(move |_event: web_sys::FocusEvent| {
            let classes = wrapper.class_list();
            let _ = if blurred {
                classes.add_1("blur")
            } else {
                classes.remove_1("blur")
            };
        }) as Box<dyn FnMut(_)>);
        input.add_event_listener_with_callback(name, closure.as_ref().unchecked_ref())?;
        closure.forget();
    }

    // Clicking the terminal focuses the input, unless the user is selecting text
    {
        let app = Rc::clone(app);
        let closure = Closure::wrap(Box::new(move |_event: web_sys::MouseEvent| {
            let selecting = web_sys::window()
                .and_then(|w| w.get_selection().ok().flatten())
                .map(|sel| !String::from(sel.to_string()).is_empty())
                .unwrap_or(false);
            if !selecting {
                app.view.borrow().focus();
            }
        }) as Box<dyn FnMut(_)>);
        wrapper.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())?;
        closure.forget();
    }

    console_log!("[runtime] Event listeners installed");
    Ok(())
}

/// `window.lab = { switchDevice, switchInfoTab }`
fn export_lab_object(window: &web_sys::Window, app: &Rc<App>) -> Result<(), JsValue> {
    let lab = js_sys::Object::new();

    let switch_device = {
        let app = Rc::clone(app);
        Closure::wrap(Box::new(move |target: String| {
            app.switch_device(&target);
        }) as Box<dyn FnMut(String)>)
    };
    js_sys::Reflect::set(&lab, &"switchDevice".into(), switch_device.as_ref())?;
    switch_device.forget();

    let switch_info_tab = {
        let app = Rc::clone(app);
        Closure::wrap(Box::new(move |name: String| {
            app.view.borrow().switch_info_tab(&name);
        }) as Box<dyn FnMut(String)>)
    };
    js_sys::Reflect::set(&lab, &"switchInfoTab".into(), switch_info_tab.as_ref())?;
    switch_info_tab.forget();

    js_sys::Reflect::set(window, &"lab".into(), &lab)?;
    Ok(())
}
