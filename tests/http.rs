use attendance_calendar::models::{
    CalendarView, GenerateResponse, NoticeLevel, PressEndResponse, PressStartResponse,
    SaveResponse,
};
use axum::{Router, extract::Query, routing::get};
use once_cell::sync::Lazy;
use reqwest::{Client, StatusCode};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::net::TcpListener;
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, mpsc};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::sleep;

struct TestServer {
    base_url: String,
    child: Child,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

static TEST_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));
static SERVER: Lazy<Mutex<Option<Arc<TestServer>>>> = Lazy::new(|| Mutex::new(None));
static LOADS: AtomicUsize = AtomicUsize::new(0);
static SAVES: Lazy<std::sync::Mutex<Vec<Value>>> = Lazy::new(|| std::sync::Mutex::new(Vec::new()));
static PRESS_IDS: AtomicU64 = AtomicU64::new(1);

#[cfg(unix)]
mod cleanup {
    use std::sync::atomic::{AtomicI32, Ordering};
    use std::sync::Once;

    static REGISTER: Once = Once::new();
    static PID: AtomicI32 = AtomicI32::new(0);

    pub fn register(pid: u32) {
        REGISTER.call_once(|| {
            PID.store(pid as i32, Ordering::SeqCst);
            unsafe {
                libc::atexit(on_exit);
            }
        });
    }

    extern "C" fn on_exit() {
        let pid = PID.load(Ordering::SeqCst);
        if pid > 0 {
            unsafe {
                libc::kill(pid, libc::SIGTERM);
            }
        }
    }
}

fn pick_free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind random port");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

async fn mock_load(Query(params): Query<HashMap<String, String>>) -> String {
    LOADS.fetch_add(1, Ordering::SeqCst);
    let callback = params.get("callback").cloned().unwrap_or_default();
    let name = params.get("name").map(String::as_str);
    let month = params.get("month").map(String::as_str);
    let body = match (name, month) {
        (Some("Legacy"), Some("2024-02")) => json!({
            "found": true,
            "dailyStatuses": { "3": "round", "7": "" }
        }),
        (Some("Broken"), _) => json!({ "found": true, "dailyStatuses": [1, 2] }),
        _ => json!({ "found": false }),
    };
    format!("{callback}({body});")
}

async fn mock_save(body: String) -> &'static str {
    let payload = serde_json::from_str(&body).expect("save body is JSON");
    SAVES.lock().unwrap().push(payload);
    "ok"
}

/// Serves the remote endpoint from its own thread so it outlives each test's runtime.
fn spawn_mock_remote() -> String {
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("mock runtime");
        runtime.block_on(async move {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
                .await
                .expect("bind mock remote");
            tx.send(listener.local_addr().unwrap().port()).unwrap();
            let app = Router::new().route("/exec", get(mock_load).post(mock_save));
            axum::serve(listener, app).await.unwrap();
        });
    });
    let port = rx.recv().expect("mock remote port");
    format!("http://127.0.0.1:{port}/exec")
}

async fn wait_until_ready(base_url: &str) {
    let client = Client::new();
    let deadline = Instant::now() + Duration::from_secs(3);
    loop {
        if let Ok(resp) = client.get(format!("{base_url}/api/calendar")).send().await {
            if resp.status().is_success() {
                return;
            }
        }
        if Instant::now() > deadline {
            panic!("server did not become ready");
        }
        sleep(Duration::from_millis(100)).await;
    }
}

async fn spawn_server() -> TestServer {
    let port = pick_free_port();
    let remote_url = spawn_mock_remote();
    let child = Command::new(env!("CARGO_BIN_EXE_attendance_calendar"))
        .env("PORT", port.to_string())
        .env("TRACKER_REMOTE_URL", remote_url)
        .env("RUST_LOG", "info")
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .expect("failed to spawn server");

    #[cfg(unix)]
    cleanup::register(child.id());

    let base_url = format!("http://127.0.0.1:{port}");
    wait_until_ready(&base_url).await;

    TestServer { base_url, child }
}

async fn shared_server() -> Arc<TestServer> {
    let mut guard = SERVER.lock().await;
    if let Some(server) = guard.as_ref() {
        return Arc::clone(server);
    }
    let server = Arc::new(spawn_server().await);
    *guard = Some(Arc::clone(&server));
    server
}

async fn post(client: &Client, url: String, body: Value) -> reqwest::Response {
    client.post(url).json(&body).send().await.unwrap()
}

async fn generate(client: &Client, server: &TestServer, name: &str, month: &str) -> GenerateResponse {
    let response = post(
        client,
        format!("{}/api/calendar/generate", server.base_url),
        json!({ "name": name, "month": month }),
    )
    .await;
    assert!(response.status().is_success());
    response.json().await.unwrap()
}

async fn tap(client: &Client, server: &TestServer, day: u32) -> CalendarView {
    post(client, format!("{}/api/days/{day}/tap", server.base_url), json!({}))
        .await
        .json()
        .await
        .unwrap()
}

fn next_press() -> u64 {
    PRESS_IDS.fetch_add(1, Ordering::SeqCst)
}

fn statuses(view: &CalendarView, day: u32) -> Vec<String> {
    view.days
        .iter()
        .find(|cell| cell.day == day)
        .map(|cell| cell.statuses.clone())
        .expect("missing day")
}

#[tokio::test]
async fn http_generate_normalizes_legacy_data() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let data = generate(&client, &server, "Legacy", "2024-02").await;
    assert_eq!(data.notice.level, NoticeLevel::Success);
    assert!(data.calendar.generated);
    assert_eq!(data.calendar.days_in_month, 29);
    assert_eq!(data.calendar.first_weekday, 4);
    assert_eq!(statuses(&data.calendar, 3), vec!["round".to_string()]);
    assert!(statuses(&data.calendar, 7).is_empty());
    assert_eq!(data.calendar.total_count, 1);
}

#[tokio::test]
async fn http_taps_cycle_through_statuses() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let data = generate(&client, &server, "Fresh", "2024-04").await;
    assert_eq!(data.notice.level, NoticeLevel::Info);
    assert_eq!(data.calendar.days_in_month, 30);

    let mut seen = Vec::new();
    for _ in 0..4 {
        seen.push(statuses(&tap(&client, &server, 5).await, 5));
    }
    assert_eq!(
        seen,
        vec![
            vec!["practice".to_string()],
            vec!["round".to_string()],
            vec!["caddy".to_string()],
            vec![],
        ]
    );

    let response = post(&client, format!("{}/api/days/31/tap", server.base_url), json!({})).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn http_invalid_input_never_reaches_remote() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();
    let before = LOADS.load(Ordering::SeqCst);

    for body in [
        json!({ "name": "Fresh", "month": "2024-4" }),
        json!({ "name": "", "month": "2024-04" }),
        json!({ "name": "Fresh", "month": "" }),
    ] {
        let response = post(&client, format!("{}/api/calendar/generate", server.base_url), body).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    let response = post(
        &client,
        format!("{}/api/calendar/save", server.base_url),
        json!({ "name": "Fresh", "month": "April" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(LOADS.load(Ordering::SeqCst), before);
}

#[tokio::test]
async fn http_broken_payload_resets_calendar() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    generate(&client, &server, "Fresh", "2024-04").await;
    tap(&client, &server, 2).await;

    let response = post(
        &client,
        format!("{}/api/calendar/generate", server.base_url),
        json!({ "name": "Broken", "month": "2024-04" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let view: CalendarView = client
        .get(format!("{}/api/calendar", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(view.generated);
    assert!(view.days.iter().all(|cell| cell.statuses.is_empty()));
    assert_eq!(view.total_count, 0);
}

#[tokio::test]
async fn http_editor_then_save_posts_month() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    generate(&client, &server, "Fresh", "2024-04").await;
    tap(&client, &server, 10).await;

    let view: CalendarView = post(
        &client,
        format!("{}/api/editor/open", server.base_url),
        json!({ "day": 10 }),
    )
    .await
    .json()
    .await
    .unwrap();
    let editor = view.editor.expect("editor open");
    assert_eq!(editor.selected, vec!["practice".to_string()]);

    post(
        &client,
        format!("{}/api/editor/toggle", server.base_url),
        json!({ "status": "round" }),
    )
    .await;
    let view: CalendarView = post(&client, format!("{}/api/editor/save", server.base_url), json!({}))
        .await
        .json()
        .await
        .unwrap();
    assert!(view.editor.is_none());
    assert_eq!(statuses(&view, 10), vec!["practice".to_string(), "round".to_string()]);
    assert_eq!(view.total_count, 2);
    assert_eq!(view.days_attended, 1);

    let saved_before = SAVES.lock().unwrap().len();
    let response = post(
        &client,
        format!("{}/api/calendar/save", server.base_url),
        json!({ "name": "Fresh", "month": "2024-04" }),
    )
    .await;
    assert!(response.status().is_success());
    let data: SaveResponse = response.json().await.unwrap();
    assert_eq!(data.notice.level, NoticeLevel::Success);

    let saves = SAVES.lock().unwrap();
    assert_eq!(saves.len(), saved_before + 1);
    let payload = saves.last().unwrap();
    assert_eq!(payload["action"], "save");
    assert_eq!(payload["month"], "2024-04");
    assert_eq!(payload["name"], "Fresh");
    assert_eq!(payload["totalCount"], 2);
    let daily: Value = serde_json::from_str(payload["dailyStatuses"].as_str().unwrap()).unwrap();
    assert_eq!(daily, json!({ "10": ["practice", "round"] }));
}

#[tokio::test]
async fn http_long_press_opens_editor() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    generate(&client, &server, "Fresh", "2024-04").await;
    let press = next_press();

    let start = tokio::spawn({
        let client = client.clone();
        let url = format!("{}/api/press/start", server.base_url);
        async move {
            post(&client, url, json!({ "press": press, "day": 8 }))
                .await
                .json::<PressStartResponse>()
                .await
        }
    });
    sleep(Duration::from_millis(800)).await;

    let started = start.await.unwrap().unwrap();
    assert!(started.long_press);
    assert_eq!(started.calendar.editor.as_ref().map(|editor| editor.day), Some(8));

    let ended: PressEndResponse = post(
        &client,
        format!("{}/api/press/end", server.base_url),
        json!({ "press": press, "day": 8 }),
    )
    .await
        .json()
        .await
        .unwrap();
    assert_eq!(ended.gesture, "suppressed");
    assert!(statuses(&ended.calendar, 8).is_empty());
}

#[tokio::test]
async fn http_short_press_is_a_tap() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    generate(&client, &server, "Fresh", "2024-04").await;
    let press = next_press();

    let start = tokio::spawn({
        let client = client.clone();
        let url = format!("{}/api/press/start", server.base_url);
        async move {
            post(&client, url, json!({ "press": press, "day": 9 }))
                .await
                .json::<PressStartResponse>()
                .await
        }
    });
    sleep(Duration::from_millis(100)).await;

    let ended: PressEndResponse = post(
        &client,
        format!("{}/api/press/end", server.base_url),
        json!({ "press": press, "day": 9 }),
    )
    .await
        .json()
        .await
        .unwrap();
    assert_eq!(ended.gesture, "tap");
    assert_eq!(statuses(&ended.calendar, 9), vec!["practice".to_string()]);

    let started = start.await.unwrap().unwrap();
    assert!(!started.long_press);
    assert!(started.calendar.editor.is_none());
}

#[tokio::test]
async fn http_release_before_start_is_a_single_tap() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    generate(&client, &server, "Fresh", "2024-04").await;
    let press = next_press();

    let ended: PressEndResponse = post(
        &client,
        format!("{}/api/press/end", server.base_url),
        json!({ "press": press, "day": 11 }),
    )
    .await
    .json()
    .await
    .unwrap();
    assert_eq!(ended.gesture, "tap");

    let started: PressStartResponse = post(
        &client,
        format!("{}/api/press/start", server.base_url),
        json!({ "press": press, "day": 11 }),
    )
    .await
    .json()
    .await
    .unwrap();
    assert!(!started.long_press);
    assert!(started.calendar.editor.is_none());
    assert_eq!(statuses(&started.calendar, 11), vec!["practice".to_string()]);
}

#[tokio::test]
async fn http_save_under_another_name_is_rejected() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    generate(&client, &server, "Fresh", "2024-04").await;
    tap(&client, &server, 4).await;

    let saved_before = SAVES.lock().unwrap().len();
    let response = post(
        &client,
        format!("{}/api/calendar/save", server.base_url),
        json!({ "name": "Someone", "month": "2024-04" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(SAVES.lock().unwrap().len(), saved_before);
}

#[tokio::test]
async fn http_page_prefills_from_query() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let page = client
        .get(format!("{}/", server.base_url))
        .query(&[("部員名", "Legacy"), ("対象月", "2024-02")])
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(page.contains(r#"value="Legacy""#));
    assert!(page.contains(r#"value="2024-02""#));
    assert!(page.contains("const AUTO_GENERATE = true;"));

    let page = client
        .get(format!("{}/?name=Legacy&month=2024-2", server.base_url))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(page.contains("const AUTO_GENERATE = false;"));
}
