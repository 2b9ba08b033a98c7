// klip-panel/tests/stores.rs
// Stores against a fake printer service, an in-process panel API and
// websocket host

use async_trait::async_trait;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::StreamExt;
use klip_client::{
    ClientConfig, ClientError, ClientResult, LinkConfig, LinkState, PrinterInfo, PrinterLink,
    PrinterService,
};
use klip_panel::stores::UNKNOWN_STATUS;
use klip_panel::{AuthStore, PrinterStore};
use serde_json::{Value, json};
use shared::LoginRequest;
use shared::printer::{HeaterLimits, ObjectsQuery, TemperatureLimits};
use shared::temperature;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;

const WAIT: Duration = Duration::from_secs(5);

#[derive(Default)]
struct FakePrinter {
    scripts: Mutex<Vec<String>>,
    offline: AtomicBool,
}

#[async_trait]
impl PrinterService for FakePrinter {
    async fn info(&self) -> ClientResult<PrinterInfo> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(ClientError::Network("connection refused".into()));
        }
        Ok(PrinterInfo {
            state: "ready".into(),
            state_message: "Printer is ready".into(),
            hostname: "voron".into(),
            software_version: "v0.12.0".into(),
            cpu_info: String::new(),
        })
    }

    async fn send_gcode(&self, script: &str) -> ClientResult<Value> {
        self.scripts.lock().unwrap().push(script.to_string());
        Ok(json!({ "result": "ok" }))
    }

    async fn query_objects(&self, _objects: &[String]) -> ClientResult<ObjectsQuery> {
        Ok(ObjectsQuery::default())
    }

    async fn temperature_limits(&self) -> ClientResult<TemperatureLimits> {
        Ok(TemperatureLimits {
            extruder: HeaterLimits {
                min_temp: 0.0,
                max_temp: 230.0,
            },
            heater_bed: HeaterLimits {
                min_temp: 0.0,
                max_temp: 70.0,
            },
        })
    }
}

fn printer_store(fake: Arc<FakePrinter>, ws_url: &str) -> PrinterStore {
    let link = PrinterLink::new(LinkConfig::new(ws_url).with_reconnect_delay(Duration::from_secs(10)));
    PrinterStore::new(fake, link)
}

async fn eventually(what: &str, check: impl Fn() -> bool) {
    let polled = tokio::time::timeout(WAIT, async {
        while !check() {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await;
    assert!(polled.is_ok(), "timed out waiting for {what}");
}

#[tokio::test]
async fn test_fetch_printer_info_updates_snapshot() {
    let fake = Arc::new(FakePrinter::default());
    let store = printer_store(fake.clone(), "ws://127.0.0.1:9/websocket");

    assert_eq!(store.printer_status(), UNKNOWN_STATUS);
    assert!(store.printer_info().is_none());
    assert!(!store.is_connected());

    let info = store.fetch_printer_info().await.unwrap();
    assert_eq!(info.hostname, "voron");
    assert_eq!(store.printer_status(), "ready");

    // a failed refresh keeps the last snapshot
    fake.offline.store(true, Ordering::SeqCst);
    let err = store.fetch_printer_info().await.unwrap_err();
    assert!(matches!(err, ClientError::Network(_)));
    assert_eq!(store.printer_status(), "ready");
    assert_eq!(store.printer_info().unwrap().hostname, "voron");
}

#[tokio::test]
async fn test_send_gcode_and_presets() {
    let fake = Arc::new(FakePrinter::default());
    let store = printer_store(fake.clone(), "ws://127.0.0.1:9/websocket");

    store.send_gcode("G28").await.unwrap();

    let petg = temperature::preset("petg").unwrap();
    let target = store.apply_preset(petg).await.unwrap();
    assert_eq!(target.hotend, 230.0);
    assert_eq!(target.bed, 70.0);

    let scripts = fake.scripts.lock().unwrap().clone();
    assert_eq!(scripts, vec!["G28".to_string(), "M104 S230\nM140 S70".to_string()]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_init_websocket_tracks_connection() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}/websocket", listener.local_addr().unwrap());
    let (frames_tx, mut frames) = tokio::sync::mpsc::unbounded_channel();
    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let frames_tx = frames_tx.clone();
            tokio::spawn(async move {
                let Ok(mut ws) = accept_async(stream).await else {
                    return;
                };
                while let Some(Ok(frame)) = ws.next().await {
                    if let Message::Text(text) = frame {
                        let _ = frames_tx.send(text.as_str().to_string());
                    }
                }
            });
        }
    });

    let store = printer_store(Arc::new(FakePrinter::default()), &url);
    store.init_websocket();
    store.init_websocket();

    let subscription = tokio::time::timeout(WAIT, frames.recv()).await.unwrap().unwrap();
    assert!(subscription.contains("printer.objects.subscribe"));
    eventually("connected", || store.is_connected()).await;

    store.disconnect();
    assert!(!store.is_connected());
    assert_eq!(store.link().state(), LinkState::Disconnected);
}

async fn login(Json(req): Json<LoginRequest>) -> Json<Value> {
    if req.password == "secret" {
        Json(json!({ "code": 1, "data": { "token": format!("token-{}", req.username) }, "msg": "" }))
    } else {
        Json(json!({ "code": 0, "data": null, "msg": "wrong password" }))
    }
}

async fn panel_api() -> String {
    let app = Router::new()
        .route("/login", post(login))
        .route("/file/list", get(|| async { StatusCode::UNAUTHORIZED }));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

#[tokio::test]
async fn test_login_and_logout() {
    let client = ClientConfig::new(panel_api().await)
        .build_request_client()
        .unwrap();
    let auth = AuthStore::new(client.clone());

    assert!(!auth.is_authenticated());
    assert!(!auth.login("alice", "nope").await);
    assert!(!auth.is_authenticated());

    assert!(auth.login("alice", "secret").await);
    assert!(auth.is_authenticated());
    assert_eq!(client.token().as_deref(), Some("token-alice"));
    assert_eq!(auth.user().unwrap().username, "alice");

    auth.logout();
    assert!(!auth.is_authenticated());
    assert!(auth.user().is_none());
    assert!(client.token().is_none());
}

#[tokio::test]
async fn test_expired_session_logs_out() {
    let client = ClientConfig::new(panel_api().await)
        .build_request_client()
        .unwrap();
    let auth = Arc::new(AuthStore::new(client.clone()));
    let listener = auth.spawn_event_listener();

    assert!(auth.login("bob", "secret").await);

    let err = client.get::<Value>("/file/list").await.unwrap_err();
    assert!(err.is_auth_expired());
    eventually("logout", || auth.user().is_none()).await;
    assert!(!auth.is_authenticated());

    listener.abort();
}
