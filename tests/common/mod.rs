// Shared test helpers: in-process fake upstreams and config builders.
#![allow(dead_code)]

use axum::{
    Json, Router,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
};
use bytes::BytesMut;
use opsboard::config::AppConfig;
use opsboard::rcon_client::packet::{
    AUTH_FAILED_ID, Packet, TYPE_AUTH_RESPONSE, TYPE_COMMAND, TYPE_LOGIN, TYPE_RESPONSE,
};
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

pub const SERVER_ID: &str = "5a931111";
pub const API_KEY: &str = "ptlc_test";
pub const RCON_PASSWORD: &str = "hunter2";

/// Port nothing listens on; connections are refused immediately.
pub const CLOSED_PORT: u16 = 1;

pub fn usage_body(state: &str, memory_bytes: u64, cpu: f64, disk_bytes: u64) -> Value {
    json!({
        "object": "stats",
        "attributes": {
            "current_state": state,
            "is_suspended": false,
            "resources": {
                "memory_bytes": memory_bytes,
                "cpu_absolute": cpu,
                "disk_bytes": disk_bytes,
                "network_rx_bytes": 0,
                "network_tx_bytes": 0,
                "uptime": 1000
            }
        }
    })
}

pub fn details_body(identifier: &str, memory_mb: u64, cpu: f64) -> Value {
    json!({
        "object": "server",
        "attributes": {
            "identifier": identifier,
            "limits": { "memory": memory_mb, "swap": 0, "disk": 10240, "io": 500, "cpu": cpu }
        }
    })
}

fn reply(headers: &HeaderMap, body: Option<Value>) -> Response {
    let expected = format!("Bearer {}", API_KEY);
    let authorized = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == expected);
    if !authorized {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    match body {
        Some(v) => Json(v).into_response(),
        None => StatusCode::BAD_GATEWAY.into_response(),
    }
}

/// Fake control plane. `None` bodies answer 502. Returns the API base URL.
pub async fn spawn_panel(usage: Option<Value>, details: Option<Value>) -> String {
    let app = Router::new()
        .route(
            "/api/client/servers/{id}/resources",
            get(move |headers: HeaderMap| {
                let usage = usage.clone();
                async move { reply(&headers, usage) }
            }),
        )
        .route(
            "/api/client/servers/{id}",
            get(move |headers: HeaderMap| {
                let details = details.clone();
                async move { reply(&headers, details) }
            }),
        );
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}/api/client", addr)
}

#[derive(Clone)]
pub enum ConsoleBehavior {
    /// Authenticate with `password`, answer every command with `reply`.
    Respond { password: String, reply: String },
    /// Accept the connection and never answer.
    Silent,
}

pub struct FakeConsole {
    pub port: u16,
    /// Connections the client closed (read returned EOF).
    pub closed: Arc<AtomicUsize>,
}

impl FakeConsole {
    pub fn closed_count(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

pub async fn spawn_console(behavior: ConsoleBehavior) -> FakeConsole {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let closed = Arc::new(AtomicUsize::new(0));
    let closed_task = closed.clone();
    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let behavior = behavior.clone();
            let closed = closed_task.clone();
            tokio::spawn(async move {
                serve_console(stream, behavior).await;
                closed.fetch_add(1, Ordering::SeqCst);
            });
        }
    });
    FakeConsole { port, closed }
}

async fn serve_console(mut stream: TcpStream, behavior: ConsoleBehavior) {
    let mut buf = BytesMut::new();
    loop {
        let packet = loop {
            match Packet::decode(&mut buf) {
                Ok(Some(p)) => break p,
                Ok(None) => {}
                Err(_) => return,
            }
            match stream.read_buf(&mut buf).await {
                Ok(0) | Err(_) => return,
                Ok(_) => {}
            }
        };
        let ConsoleBehavior::Respond { password, reply } = &behavior else {
            continue;
        };
        let responses = match packet.kind {
            TYPE_LOGIN if packet.body == *password => vec![
                Packet::new(packet.id, TYPE_RESPONSE, ""),
                Packet::new(packet.id, TYPE_AUTH_RESPONSE, ""),
            ],
            TYPE_LOGIN => vec![Packet::new(AUTH_FAILED_ID, TYPE_AUTH_RESPONSE, "")],
            TYPE_COMMAND => fragments(reply)
                .into_iter()
                .map(|part| Packet::new(packet.id, TYPE_RESPONSE, part))
                .collect(),
            // Vanilla servers answer an unknown request type with this text.
            TYPE_RESPONSE => vec![Packet::new(
                packet.id,
                TYPE_RESPONSE,
                format!("Unknown request {:x}", TYPE_RESPONSE),
            )],
            _ => vec![],
        };
        for p in responses {
            if stream.write_all(&p.encode().unwrap()).await.is_err() {
                return;
            }
        }
    }
}

/// Split a reply at the 4096-byte payload limit, as a real server does. ASCII replies only.
pub fn fragments(reply: &str) -> Vec<String> {
    if reply.is_empty() {
        return vec![String::new()];
    }
    reply
        .as_bytes()
        .chunks(4096)
        .map(|c| String::from_utf8_lossy(c).into_owned())
        .collect()
}

/// Full config pointing at the given upstreams. The database is unreachable.
pub fn test_config(
    panel_url: &str,
    api_key: Option<&str>,
    console_port: u16,
    console_password: Option<&str>,
) -> AppConfig {
    let toml = format!(
        r#"
[server]
port = 8081
host = "127.0.0.1"

[panel]
base_url = "{panel_url}"
timeout_ms = 2000

[console]
host = "127.0.0.1"
port = {console_port}
timeout_ms = 300

[database]
host = "127.0.0.1"
port = {CLOSED_PORT}
user = "plan"
password = "secret"
name = "minecraft"
timeout_ms = 500
"#
    );
    let mut config = AppConfig::load_from_str(&toml).unwrap();
    config.panel.api_key = api_key.map(str::to_string);
    config.panel.server_id = Some(SERVER_ID.to_string());
    config.console.password = console_password.map(str::to_string);
    config
}
