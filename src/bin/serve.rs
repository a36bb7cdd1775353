//! Development server for labterm
//!
//! Serves the lab page and the wasm-pack output, and answers the two lab
//! endpoints with a tiny in-memory device model so the console can be
//! tried without the real lab service.
//!
//! The model knows user/privileged/config modes, `hostname`, and `?`.
//! Anything else is invalid input.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tiny_http::{Header, Method, Request, Response, Server};

use labterm::remote::{CommandRequest, CommandResponse, SwitchResponse};
use labterm::transcript::{TranscriptEntry, WireEntry};
use labterm::DeviceType;

const DEFAULT_PORT: u16 = 8080;
const SESSION_ID: &str = "1";

#[derive(Debug, Clone, Copy, PartialEq)]
enum Mode {
    User,
    Privileged,
    Config,
}

struct MockDevice {
    hostname: String,
    device_type: DeviceType,
    mode: Mode,
    logs: Vec<WireEntry>,
}

impl MockDevice {
    fn new(name: &str, device_type: DeviceType) -> Self {
        Self {
            hostname: name.to_string(),
            device_type,
            mode: Mode::User,
            logs: vec![TranscriptEntry::output(format!("Connected to {} console.", name)).to_wire()],
        }
    }

    fn prompt(&self) -> String {
        match self.mode {
            Mode::User => format!("{}>", self.hostname),
            Mode::Privileged => format!("{}#", self.hostname),
            Mode::Config => format!("{}(config)#", self.hostname),
        }
    }

    fn help(&self) -> &'static str {
        match self.mode {
            Mode::User => "  enable     Turn on privileged commands\n  exit       Exit from the EXEC",
            Mode::Privileged => {
                "  configure  Enter configuration mode\n  disable    Turn off privileged commands\n  exit       Exit from the EXEC"
            }
            Mode::Config => {
                "  end        Exit from configure mode\n  exit       Exit from configure mode\n  hostname   Set system's network name"
            }
        }
    }

    fn run(&mut self, line: &str) -> CommandResponse {
        let prompt_before = self.prompt();
        let words: Vec<&str> = line.split_whitespace().collect();

        let output = if line.trim_end().ends_with('?') {
            Some(self.help().to_string())
        } else {
            match (self.mode, words.as_slice()) {
                (_, []) => None,
                (Mode::User, ["enable" | "en"]) => {
                    self.mode = Mode::Privileged;
                    None
                }
                (Mode::Privileged, ["disable"]) | (Mode::Privileged, ["exit"]) => {
                    self.mode = Mode::User;
                    None
                }
                (Mode::Privileged, ["configure" | "conf", "terminal" | "t"]) => {
                    self.mode = Mode::Config;
                    Some("Enter configuration commands, one per line.  End with CNTL/Z.".to_string())
                }
                (Mode::Config, ["exit" | "end"]) => {
                    self.mode = Mode::Privileged;
                    None
                }
                (Mode::Config, ["hostname", name]) => {
                    self.hostname = name.to_string();
                    None
                }
                _ => Some("% Invalid input detected at '^' marker.".to_string()),
            }
        };

        self.logs.push(TranscriptEntry::command(prompt_before, line).to_wire());
        if let Some(text) = &output {
            self.logs.push(TranscriptEntry::output(text.clone()).to_wire());
        }

        CommandResponse {
            output,
            prompt: self.prompt(),
            new_hostname: Some(self.hostname.clone()),
            completed: false,
        }
    }
}

struct MockLab {
    devices: BTreeMap<String, MockDevice>,
    current: String,
}

impl MockLab {
    fn new() -> Self {
        let mut devices = BTreeMap::new();
        devices.insert("R1".to_string(), MockDevice::new("R1", DeviceType::Router));
        devices.insert("R2".to_string(), MockDevice::new("R2", DeviceType::Router));
        devices.insert("SW1".to_string(), MockDevice::new("SW1", DeviceType::Switch));
        Self {
            devices,
            current: "R1".to_string(),
        }
    }

    fn switch(&mut self, device_id: &str) -> SwitchResponse {
        match self.devices.get(device_id) {
            Some(dev) => {
                self.current = device_id.to_string();
                SwitchResponse::ok(dev.prompt(), dev.logs.clone(), dev.device_type)
            }
            None => SwitchResponse::error(format!("Unknown device {}", device_id)),
        }
    }

    fn command(&mut self, line: &str) -> Option<CommandResponse> {
        self.devices.get_mut(&self.current).map(|dev| dev.run(line))
    }

    fn page(&self) -> String {
        let dev = &self.devices[&self.current];
        let hostnames: BTreeMap<&str, &str> = self
            .devices
            .iter()
            .map(|(id, d)| (id.as_str(), d.hostname.as_str()))
            .collect();
        let tabs: String = self
            .devices
            .keys()
            .map(|id| {
                format!(
                    "<button class=\"device-tab\" id=\"tab-{id}\" onclick=\"lab.switchDevice('{id}')\">{id}</button>"
                )
            })
            .collect();

        PAGE_TEMPLATE
            .replace("{{tabs}}", &tabs)
            .replace("{{session_id}}", &json(&SESSION_ID))
            .replace("{{hostnames}}", &json(&hostnames))
            .replace("{{logs}}", &json(&dev.logs))
            .replace("{{current}}", &json(&self.current))
            .replace("{{prompt}}", &dev.prompt())
    }
}

fn json<T: serde::Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string(value)
        .unwrap_or_else(|_| "null".to_string())
        .replace("</", "<\\/")
}

const PAGE_TEMPLATE: &str = r#"<!doctype html>
<html>
<head>
<meta charset="utf-8">
<title>labterm</title>
<style>
  body { background: #111; color: #ddd; font-family: monospace; }
  .device-tab.active { background: #2a6; }
  #terminal-wrapper { height: 80vh; overflow-y: auto; padding: 8px; }
  #terminal-wrapper.blur .cursor { opacity: 0.4; }
  .log-line { white-space: pre-wrap; }
  .cursor { background: #ddd; color: #111; }
  #cmd-input { position: absolute; left: -9999px; }
</style>
</head>
<body>
<div>{{tabs}} <span id="lab-status"></span></div>
<div id="terminal-wrapper">
  <div id="terminal-output">
    <div id="active-input-line"><span id="prompt">{{prompt}}</span></div>
  </div>
  <input id="cmd-input" autocomplete="off" autocapitalize="off" spellcheck="false">
</div>
<script id="session-id" type="application/json">{{session_id}}</script>
<script id="hostnames-data" type="application/json">{{hostnames}}</script>
<script id="initial-logs-data" type="application/json">{{logs}}</script>
<script id="current-device-id" type="application/json">{{current}}</script>
<script type="module">
  import init from "./pkg/labterm.js";
  init();
</script>
</body>
</html>
"#;

fn main() {
    let port = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_PORT);

    let addr = format!("0.0.0.0:{}", port);
    let server = Server::http(&addr).expect("Failed to start server");
    let mut lab = MockLab::new();

    println!("┌─────────────────────────────────────┐");
    println!("│  labterm dev server                 │");
    println!("├─────────────────────────────────────┤");
    println!("│  http://localhost:{}              │", port);
    println!("└─────────────────────────────────────┘");

    for mut request in server.incoming_requests() {
        let response = route(&mut lab, &mut request);
        let _ = request.respond(response);
    }
}

fn route(lab: &mut MockLab, request: &mut Request) -> Response<std::io::Cursor<Vec<u8>>> {
    let url_path = request.url().to_string();
    let segments: Vec<&str> = url_path.trim_matches('/').split('/').collect();

    match (request.method(), segments.as_slice()) {
        (Method::Get, [""]) => html(lab.page()),
        (Method::Get, ["api", "lab", _, "switch", device]) => json_response(&lab.switch(device), 200),
        (Method::Post, ["api", "lab", _, "command"]) => {
            let mut body = String::new();
            if request.as_reader().read_to_string(&mut body).is_err() {
                return error_response("unreadable body", 400);
            }
            let Ok(cmd) = serde_json::from_str::<CommandRequest>(&body) else {
                return error_response("invalid JSON", 400);
            };
            match lab.command(&cmd.command) {
                Some(resp) => json_response(&resp, 200),
                None => error_response("no active device", 500),
            }
        }
        _ => serve_file(url_path.trim_start_matches('/')),
    }
}

fn html(page: String) -> Response<std::io::Cursor<Vec<u8>>> {
    Response::from_string(page).with_header(content_type("text/html; charset=utf-8"))
}

fn json_response<T: serde::Serialize>(value: &T, status: u16) -> Response<std::io::Cursor<Vec<u8>>> {
    Response::from_string(json(value))
        .with_status_code(status)
        .with_header(content_type("application/json"))
}

fn error_response(message: &str, status: u16) -> Response<std::io::Cursor<Vec<u8>>> {
    json_response(&serde_json::json!({ "status": "error", "message": message }), status)
}

fn content_type(mime: &str) -> Header {
    Header::from_bytes("Content-Type", mime).unwrap()
}

fn serve_file(path: &str) -> Response<std::io::Cursor<Vec<u8>>> {
    let path = Path::new(path);

    match fs::read(path) {
        Ok(contents) => Response::from_data(contents).with_header(content_type(mime_type(path))),
        Err(_) => Response::from_string("404 Not Found")
            .with_status_code(404)
            .with_header(content_type("text/plain")),
    }
}

fn mime_type(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("html") => "text/html; charset=utf-8",
        Some("js") => "application/javascript",
        Some("wasm") => "application/wasm",
        Some("css") => "text/css",
        Some("json") => "application/json",
        _ => "application/octet-stream",
    }
}
