//! Fetch client for the lab service
//!
//! A small request builder over the browser Fetch API, plus
//! [`HttpLabApi`], the [`LabApi`] the page uses.
//!
//! Limitations (browser sandbox):
//! - Subject to CORS restrictions
//! - No timeout; a hung request stays pending until the browser gives up

#![cfg(target_arch = "wasm32")]

use std::collections::HashMap;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;

use crate::remote::{
    decode_command, decode_switch, CommandRequest, CommandResponse, Endpoints, LabApi,
    RemoteError, RemoteResult, SwitchResponse,
};

/// HTTP method
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }
}

/// HTTP response
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub status_text: String,
    pub body: String,
}

impl HttpResponse {
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// HTTP request builder
pub struct HttpRequest {
    url: String,
    method: HttpMethod,
    headers: HashMap<String, String>,
    body: Option<String>,
}

impl HttpRequest {
    /// Create a new GET request
    pub fn get(url: &str) -> Self {
        Self {
            url: url.to_string(),
            method: HttpMethod::Get,
            headers: HashMap::new(),
            body: None,
        }
    }

    /// Create a new POST request
    pub fn post(url: &str) -> Self {
        Self {
            url: url.to_string(),
            method: HttpMethod::Post,
            headers: HashMap::new(),
            body: None,
        }
    }

    /// Add a header
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_string(), value.to_string());
        self
    }

    /// Set JSON body
    pub fn json(mut self, json: String) -> Self {
        self.headers
            .insert("Content-Type".to_string(), "application/json".to_string());
        self.body = Some(json);
        self
    }

    /// Execute the request
    pub async fn send(self) -> RemoteResult<HttpResponse> {
        let window = web_sys::window().ok_or_else(|| RemoteError::Transport("No window object".into()))?;

        let opts = web_sys::RequestInit::new();
        opts.set_method(self.method.as_str());
        opts.set_mode(web_sys::RequestMode::SameOrigin);
        if let Some(body) = &self.body {
            opts.set_body(&wasm_bindgen::JsValue::from_str(body));
        }

        let request = web_sys::Request::new_with_str_and_init(&self.url, &opts)
            .map_err(|e| RemoteError::Transport(format!("Failed to create request: {}", js_message(&e))))?;

        let headers = request.headers();
        for (name, value) in &self.headers {
            headers
                .set(name, value)
                .map_err(|e| RemoteError::Transport(format!("Failed to set header: {}", js_message(&e))))?;
        }

        let resp_value = JsFuture::from(window.fetch_with_request(&request))
            .await
            .map_err(|e| RemoteError::Transport(js_message(&e)))?;

        let resp: web_sys::Response = resp_value
            .dyn_into()
            .map_err(|_| RemoteError::Transport("Failed to cast response".into()))?;

        let text_promise = resp
            .text()
            .map_err(|e| RemoteError::Transport(format!("Failed to get body: {}", js_message(&e))))?;
        let body = JsFuture::from(text_promise)
            .await
            .map_err(|e| RemoteError::Transport(format!("Failed to read body: {}", js_message(&e))))?
            .as_string()
            .unwrap_or_default();

        Ok(HttpResponse {
            status: resp.status(),
            status_text: resp.status_text(),
            body,
        })
    }
}

/// Best-effort message out of a thrown JS value (usually a `TypeError`)
fn js_message(value: &wasm_bindgen::JsValue) -> String {
    if let Some(err) = value.dyn_ref::<js_sys::Error>() {
        return String::from(err.message());
    }
    value.as_string().unwrap_or_else(|| format!("{:?}", value))
}

/// Decode a body; if it isn't what we expect and the status was an error,
/// report the status instead of the parse failure.
fn decode_or_status<T>(resp: HttpResponse, decode: fn(&str) -> RemoteResult<T>) -> RemoteResult<T> {
    match decode(&resp.body) {
        Err(RemoteError::Parse(_)) if !resp.ok() => {
            crate::console_log!("[network] HTTP {} {}", resp.status, resp.status_text);
            Err(RemoteError::Http {
                status: resp.status,
                status_text: resp.status_text,
            })
        }
        result => result,
    }
}

/// Lab service over fetch
pub struct HttpLabApi {
    endpoints: Endpoints,
}

impl HttpLabApi {
    pub fn new(api_base: &str, session_id: &str) -> Self {
        Self {
            endpoints: Endpoints::new(api_base, session_id),
        }
    }
}

impl LabApi for HttpLabApi {
    async fn switch_device(&self, device_id: &str) -> RemoteResult<SwitchResponse> {
        let device = String::from(js_sys::encode_uri_component(device_id));
        let resp = HttpRequest::get(&self.endpoints.switch_url(&device))
            .header("Accept", "application/json")
            .send()
            .await?;
        decode_or_status(resp, decode_switch)
    }

    async fn submit_command(&self, command: &str) -> RemoteResult<CommandResponse> {
        let body = serde_json::to_string(&CommandRequest {
            command: command.to_string(),
        })?;
        let resp = HttpRequest::post(&self.endpoints.command_url())
            .header("Accept", "application/json")
            .json(body)
            .send()
            .await?;
        decode_or_status(resp, decode_command)
    }
}
