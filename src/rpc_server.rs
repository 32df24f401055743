//! Route history RPC server: JSON-RPC over stdin/stdout for a UI shell.
//!
//! Protocol: one JSON object per line (newline-delimited JSON).
//! Request:  {"id":1, "method":"history.add", "params":{"route":{...}}}
//! Response: {"id":1, "result":{...}} or {"id":1, "error":"..."}
//!
//! Logs go to stderr; stdout carries only protocol lines.

use std::io::{self, BufRead, Write};
use std::process::ExitCode;
use std::sync::Mutex;
use std::time::Instant;

use route_history::app::App;
use route_history::rpc_handler::handle_method;
use route_history::services::settings_engine::data_dir;

use serde_json::{json, Value};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Simple rate limiter: max requests per second.
struct RateLimiter {
    window_start: Instant,
    request_count: u32,
    max_per_second: u32,
}

impl RateLimiter {
    fn new(max_per_second: u32) -> Self {
        Self { window_start: Instant::now(), request_count: 0, max_per_second }
    }

    /// Returns true if the request is allowed, false if rate-limited.
    fn check(&mut self) -> bool {
        if self.window_start.elapsed().as_secs() >= 1 {
            self.window_start = Instant::now();
            self.request_count = 0;
        }
        self.request_count += 1;
        self.request_count <= self.max_per_second
    }
}

fn respond(out: &mut impl Write, response: &Value) -> io::Result<()> {
    writeln!(out, "{}", response)?;
    out.flush()
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "route_history=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let db_path = data_dir().join("route_history.db");
    let app = match App::new(&db_path.to_string_lossy()) {
        Ok(app) => Mutex::new(app),
        Err(e) => {
            tracing::error!(path = %db_path.display(), error = %e, "failed to open route history");
            return ExitCode::FAILURE;
        }
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();

    let ready = json!({"event":"ready","version":env!("CARGO_PKG_VERSION")});
    if respond(&mut out, &ready).is_err() {
        return ExitCode::FAILURE;
    }

    let mut rate_limiter = RateLimiter::new(200);

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(_) => break,
        };
        if line.trim().is_empty() { continue; }

        let response = match serde_json::from_str::<Value>(&line) {
            Err(e) => json!({"id":null,"error":format!("parse error: {}",e)}),
            Ok(req) => {
                let id = req.get("id").cloned().unwrap_or(Value::Null);
                if !rate_limiter.check() {
                    json!({"id": id, "error": "rate limit exceeded"})
                } else {
                    let method = req.get("method").and_then(|v| v.as_str()).unwrap_or("");
                    let params = req.get("params").cloned().unwrap_or(json!({}));
                    tracing::debug!(method = %method, "rpc request");

                    match handle_method(&app, method, &params) {
                        Ok(val) => json!({"id": id, "result": val}),
                        Err(err) => json!({"id": id, "error": err}),
                    }
                }
            }
        };

        if respond(&mut out, &response).is_err() {
            break;
        }
    }

    ExitCode::SUCCESS
}
