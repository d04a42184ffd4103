use once_cell::sync::Lazy;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::net::TcpListener;
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::sleep;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventResponse {
    tab_count: u64,
    window_count: u64,
    total_tabs: u64,
    badge: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DataResponse {
    tab_count: u64,
    window_count: u64,
    result: Map<String, Value>,
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
struct HistoryEntry {
    timestamp: i64,
    tab_count: u64,
}

#[derive(Debug, Deserialize)]
struct TabDataResponse {
    data: Vec<HistoryEntry>,
}

#[derive(Debug, Deserialize)]
struct BadgeResponse {
    text: String,
}

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

fn unique_data_path() -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let mut path = std::env::temp_dir();
    path.push(format!("tab_tally_http_{}_{}.json", std::process::id(), nanos));
    path.to_string_lossy().to_string()
}

async fn wait_until_ready(base_url: &str) {
    let client = Client::new();
    let deadline = Instant::now() + Duration::from_secs(3);
    loop {
        if let Ok(resp) = client.get(format!("{base_url}/api/badge")).send().await {
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
    let data_path = unique_data_path();
    let child = Command::new(env!("CARGO_BIN_EXE_tab_tally"))
        .env("PORT", port.to_string())
        .env("APP_DATA_PATH", data_path)
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

fn windows_json(tab_counts: &[u64]) -> Value {
    let mut next_tab = 1;
    let windows: Vec<Value> = tab_counts
        .iter()
        .enumerate()
        .map(|(index, count)| {
            let tabs: Vec<Value> = (0..*count)
                .map(|_| {
                    next_tab += 1;
                    json!({ "id": next_tab })
                })
                .collect();
            json!({ "id": index + 1, "tabs": tabs })
        })
        .collect();
    Value::Array(windows)
}

async fn startup(client: &Client, base_url: &str, tab_counts: &[u64]) -> EventResponse {
    client
        .post(format!("{base_url}/api/startup"))
        .json(&json!({ "windows": windows_json(tab_counts) }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap()
}

async fn send_event(client: &Client, base_url: &str, event: Value) -> EventResponse {
    let response = client
        .post(format!("{base_url}/api/events"))
        .json(&event)
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
    response.json().await.unwrap()
}

async fn get_data(client: &Client, base_url: &str) -> DataResponse {
    client
        .get(format!("{base_url}/api/data"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap()
}

async fn all_history(client: &Client, base_url: &str) -> Vec<HistoryEntry> {
    let response: TabDataResponse = client
        .get(format!("{base_url}/api/tab-data?range=allTime"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    response.data
}

async fn export(client: &Client, base_url: &str) -> String {
    client
        .get(format!("{base_url}/api/export"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap()
}

#[tokio::test]
async fn http_fresh_install_seeds_counts() {
    let _guard = TEST_LOCK.lock().await;
    let server = spawn_server().await;
    let client = Client::new();

    let seeded = startup(&client, &server.base_url, &[3]).await;
    assert_eq!(seeded.tab_count, 3);
    assert_eq!(seeded.window_count, 1);
    assert_eq!(seeded.total_tabs, 0);
    assert_eq!(seeded.badge, "3");

    let data = get_data(&client, &server.base_url).await;
    assert_eq!(data.tab_count, 3);
    assert_eq!(data.window_count, 1);
    assert_eq!(data.result.get("totalTabs"), Some(&json!(0)));
    assert!(
        data.result
            .values()
            .any(|value| value == &json!({ "tabs": 3, "windows": 1 }))
    );
    assert!(all_history(&client, &server.base_url).await.is_empty());
}

#[tokio::test]
async fn http_opening_tabs_grows_total_by_delta() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let before = startup(&client, &server.base_url, &[3]).await;
    let history_before = all_history(&client, &server.base_url).await.len();

    send_event(
        &client,
        &server.base_url,
        json!({ "type": "tabCreated", "windowId": 1, "tabId": 500 }),
    )
    .await;
    let after = send_event(
        &client,
        &server.base_url,
        json!({ "type": "tabCreated", "windowId": 1, "tabId": 501 }),
    )
    .await;

    assert_eq!(after.tab_count, 5);
    assert_eq!(after.total_tabs, before.total_tabs + 2);
    assert_eq!(after.badge, "5");

    let closed = send_event(
        &client,
        &server.base_url,
        json!({ "type": "tabRemoved", "tabId": 500 }),
    )
    .await;
    assert_eq!(closed.tab_count, 4);
    assert_eq!(closed.total_tabs, after.total_tabs);

    let history = all_history(&client, &server.base_url).await;
    assert_eq!(history.len(), history_before + 3);
    let tail: Vec<u64> = history[history.len() - 3..]
        .iter()
        .map(|entry| entry.tab_count)
        .collect();
    assert_eq!(tail, vec![4, 5, 4]);
    assert!(history.windows(2).all(|pair| pair[0].timestamp <= pair[1].timestamp));
}

#[tokio::test]
async fn http_reset_requires_confirmation_and_keeps_history() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    startup(&client, &server.base_url, &[1]).await;
    send_event(
        &client,
        &server.base_url,
        json!({ "type": "tabCreated", "windowId": 1, "tabId": 700 }),
    )
    .await;
    let history_before = all_history(&client, &server.base_url).await;

    let refused = client
        .post(format!("{}/api/reset", server.base_url))
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(refused.status(), StatusCode::BAD_REQUEST);
    assert_ne!(
        get_data(&client, &server.base_url).await.result.get("totalTabs"),
        Some(&json!(0))
    );

    let reset: Value = client
        .post(format!("{}/api/message", server.base_url))
        .json(&json!({ "action": "resetTotalTabs", "confirm": true }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(reset, json!({ "totalTabs": 0 }));

    let data = get_data(&client, &server.base_url).await;
    assert_eq!(data.result.get("totalTabs"), Some(&json!(0)));
    assert_eq!(all_history(&client, &server.base_url).await, history_before);
}

#[tokio::test]
async fn http_import_rejects_array_root() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    startup(&client, &server.base_url, &[2]).await;
    let before = export(&client, &server.base_url).await;

    let response = client
        .post(format!("{}/api/import?confirm=true", server.base_url))
        .body("[1, 2, 3]")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(!response.text().await.unwrap().is_empty());

    assert_eq!(export(&client, &server.base_url).await, before);
}

#[tokio::test]
async fn http_message_dispatch_handles_tab_data_and_unknown_actions() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    startup(&client, &server.base_url, &[1]).await;
    send_event(
        &client,
        &server.base_url,
        json!({ "type": "windowCreated", "windowId": 9 }),
    )
    .await;

    let today: TabDataResponse = client
        .post(format!("{}/api/message", server.base_url))
        .json(&json!({ "action": "getTabData", "range": "sometime" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(!today.data.is_empty());
    assert!(today.data.len() <= all_history(&client, &server.base_url).await.len());

    let data: DataResponse = client
        .post(format!("{}/api/message", server.base_url))
        .json(&json!({ "action": "getData" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(data.tab_count, 1);
    assert_eq!(data.window_count, 2);

    let unknown = client
        .post(format!("{}/api/message", server.base_url))
        .json(&json!({ "action": "deleteEverything" }))
        .send()
        .await
        .unwrap();
    assert!(unknown.status().is_client_error());
}

#[tokio::test]
async fn http_badge_follows_settings() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    startup(&client, &server.base_url, &[2, 2, 1]).await;

    let settings: Value = client
        .post(format!("{}/api/settings", server.base_url))
        .json(&json!({ "showTabsNumber": false }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(settings["showTabsNumber"], json!(false));
    assert_eq!(settings["numOfDays"], json!(7));

    let badge: BadgeResponse = client
        .get(format!("{}/api/badge", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(badge.text, "3");

    client
        .post(format!("{}/api/settings", server.base_url))
        .json(&json!({ "showTabsNumber": true }))
        .send()
        .await
        .unwrap();
    let badge: BadgeResponse = client
        .get(format!("{}/api/badge", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(badge.text, "5");
}

#[tokio::test]
async fn http_concurrent_events_are_all_counted() {
    const EVENTS: u64 = 25;

    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let before = startup(&client, &server.base_url, &[1]).await;
    let history_before = all_history(&client, &server.base_url).await.len();

    let mut tasks = tokio::task::JoinSet::new();
    for tab_id in 0..EVENTS {
        let client = client.clone();
        let base_url = server.base_url.clone();
        tasks.spawn(async move {
            send_event(
                &client,
                &base_url,
                json!({ "type": "tabCreated", "windowId": 1, "tabId": 10_000 + tab_id }),
            )
            .await
        });
    }
    while let Some(joined) = tasks.join_next().await {
        joined.unwrap();
    }

    let data = get_data(&client, &server.base_url).await;
    assert_eq!(data.tab_count, 1 + EVENTS);
    assert_eq!(
        data.result.get("totalTabs"),
        Some(&json!(before.total_tabs + EVENTS))
    );

    let history = all_history(&client, &server.base_url).await;
    assert_eq!(history.len(), history_before + EVENTS as usize);
    let mut counts: Vec<u64> = history[history_before..]
        .iter()
        .map(|entry| entry.tab_count)
        .collect();
    counts.sort_unstable();
    assert_eq!(counts, (2..=1 + EVENTS).collect::<Vec<_>>());
}
