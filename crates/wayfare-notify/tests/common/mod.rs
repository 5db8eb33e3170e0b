//! Loopback backend serving the notification REST routes and the push socket.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    Json, Router,
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header},
    response::IntoResponse,
    routing::{delete, get},
};
use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::sync::mpsc;

pub const GOOD_TOKEN: &str = "good-token";
pub const INCOMPLETE_TOKEN: &str = "half-signed-up";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SocketEvent {
    Connected(i64),
    Disconnected(i64),
}

#[derive(Clone)]
pub struct Backend {
    rows: Arc<Mutex<Vec<Value>>>,
    sockets: Arc<Mutex<HashMap<i64, mpsc::UnboundedSender<String>>>>,
    events: mpsc::UnboundedSender<SocketEvent>,
}

pub struct Running {
    pub backend: Backend,
    pub base: String,
    pub events: mpsc::UnboundedReceiver<SocketEvent>,
}

impl Backend {
    pub fn set_rows(&self, rows: Vec<Value>) {
        *self.rows.lock().unwrap() = rows;
    }

    pub fn row_ids(&self) -> Vec<i64> {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .filter_map(|r| r["id"].as_i64())
            .collect()
    }

    /// Send a raw text frame to the user's socket. Returns false if the user
    /// has no socket.
    pub fn push(&self, user_id: i64, frame: &str) -> bool {
        match self.sockets.lock().unwrap().get(&user_id) {
            Some(tx) => tx.send(frame.to_string()).is_ok(),
            None => false,
        }
    }

    /// Close the user's socket from the server side.
    pub fn hang_up(&self, user_id: i64) {
        self.sockets.lock().unwrap().remove(&user_id);
    }
}

pub async fn spawn() -> Running {
    let (events_tx, events) = mpsc::unbounded_channel();
    let backend = Backend {
        rows: Arc::new(Mutex::new(Vec::new())),
        sockets: Arc::new(Mutex::new(HashMap::new())),
        events: events_tx,
    };

    let app = Router::new()
        .route("/notifications/", get(list_rows).delete(delete_all_rows))
        .route("/notifications/{id}", delete(delete_row))
        .route("/user/profile", get(profile))
        .route("/ws/notify/{user_id}", get(ws_notify))
        .with_state(backend.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    Running {
        backend,
        base: format!("http://{addr}"),
        events,
    }
}

pub async fn next_event(events: &mut mpsc::UnboundedReceiver<SocketEvent>) -> SocketEvent {
    tokio::time::timeout(Duration::from_secs(5), events.recv())
        .await
        .expect("timed out waiting for socket event")
        .expect("backend gone")
}

pub fn row(id: i64, kind: &str, is_read: bool) -> Value {
    json!({
        "id": id,
        "type": kind,
        "message": format!("notification {id}"),
        "is_read": is_read,
        "created_at": "2025-05-02T09:14:00",
        "data": null,
    })
}

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

fn authorize(headers: &HeaderMap) -> Result<(), StatusCode> {
    match bearer(headers) {
        Some(GOOD_TOKEN) | Some(INCOMPLETE_TOKEN) => Ok(()),
        _ => Err(StatusCode::UNAUTHORIZED),
    }
}

async fn list_rows(
    State(backend): State<Backend>,
    headers: HeaderMap,
) -> Result<Json<Vec<Value>>, StatusCode> {
    authorize(&headers)?;
    Ok(Json(backend.rows.lock().unwrap().clone()))
}

async fn delete_row(
    State(backend): State<Backend>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> StatusCode {
    if let Err(status) = authorize(&headers) {
        return status;
    }
    let mut rows = backend.rows.lock().unwrap();
    match rows.iter().position(|r| r["id"].as_i64() == Some(id)) {
        Some(pos) => {
            rows.remove(pos);
            StatusCode::OK
        }
        None => StatusCode::NOT_FOUND,
    }
}

async fn delete_all_rows(State(backend): State<Backend>, headers: HeaderMap) -> StatusCode {
    if let Err(status) = authorize(&headers) {
        return status;
    }
    backend.rows.lock().unwrap().clear();
    StatusCode::OK
}

async fn profile(headers: HeaderMap) -> Result<Json<Value>, StatusCode> {
    match bearer(&headers) {
        Some(GOOD_TOKEN) => Ok(Json(json!({
            "id": 42, "userid": "mina", "email": "mina@example.com",
            "nickname": "Mina", "role": "user", "provider": null,
        }))),
        Some(INCOMPLETE_TOKEN) => Ok(Json(json!({
            "id": 43, "userid": null, "email": "new@example.com",
            "nickname": null, "role": "user",
        }))),
        _ => Err(StatusCode::UNAUTHORIZED),
    }
}

async fn ws_notify(
    State(backend): State<Backend>,
    Path(user_id): Path<i64>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| serve_socket(backend, user_id, socket))
}

async fn serve_socket(backend: Backend, user_id: i64, socket: WebSocket) {
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    backend.sockets.lock().unwrap().insert(user_id, tx);
    let _ = backend.events.send(SocketEvent::Connected(user_id));

    loop {
        tokio::select! {
            outgoing = rx.recv() => match outgoing {
                Some(text) => {
                    if sender.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                None => {
                    let _ = sender.send(Message::Close(None)).await;
                    break;
                }
            },
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }

    let _ = backend.events.send(SocketEvent::Disconnected(user_id));
}
