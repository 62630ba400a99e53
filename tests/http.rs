use once_cell::sync::Lazy;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::net::TcpListener;
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::sleep;

#[derive(Debug, Deserialize)]
struct EntryView {
    id: String,
    date: String,
    race_name: Option<String>,
    profit: f64,
    recovery_rate: f64,
}

#[derive(Debug, Deserialize)]
struct SummaryStats {
    total_stake: f64,
    total_payout: f64,
    net_profit: f64,
}

#[derive(Debug, Deserialize)]
struct Point {
    label: String,
    value: f64,
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
    path.push(format!("bet_ledger_http_{}_{}.json", std::process::id(), nanos));
    path.to_string_lossy().to_string()
}

async fn wait_until_ready(base_url: &str) {
    let client = Client::new();
    let deadline = Instant::now() + Duration::from_secs(3);
    loop {
        if let Ok(resp) = client.get(format!("{base_url}/api/stats")).send().await {
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
    let child = Command::new(env!("CARGO_BIN_EXE_bet_ledger"))
        .env("PORT", port.to_string())
        .env("APP_DATA_PATH", data_path)
        .env("RUST_LOG", "info")
        .env_remove("PREDICTOR_API_KEY")
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

async fn stats(client: &Client, base_url: &str) -> SummaryStats {
    client
        .get(format!("{base_url}/api/stats"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap()
}

async fn create(client: &Client, base_url: &str, body: serde_json::Value) -> EntryView {
    let response = client
        .post(format!("{base_url}/api/entries"))
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    response.json().await.unwrap()
}

async fn series(client: &Client, url: String) -> Vec<Point> {
    client.get(url).send().await.unwrap().json().await.unwrap()
}

#[tokio::test]
async fn http_create_entry_updates_stats() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let before = stats(&client, &server.base_url).await;
    let entry = create(
        &client,
        &server.base_url,
        serde_json::json!({ "date": "2031-03-10", "race_name": " Yayoi Sho ", "stake": 100.0, "payout": 250.0 }),
    )
    .await;

    assert_eq!(entry.date, "2031-03-10");
    assert_eq!(entry.race_name.as_deref(), Some("Yayoi Sho"));
    assert_eq!(entry.profit, 150.0);
    assert_eq!(entry.recovery_rate, 250.0);

    let after = stats(&client, &server.base_url).await;
    assert_eq!(after.total_stake, before.total_stake + 100.0);
    assert_eq!(after.total_payout, before.total_payout + 250.0);
    assert_eq!(after.net_profit, before.net_profit + 150.0);

    let listed: Vec<EntryView> = client
        .get(format!("{}/api/entries", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(listed.iter().any(|item| item.id == entry.id));
}

#[tokio::test]
async fn http_series_endpoints_bucket_by_period() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    create(
        &client,
        &server.base_url,
        serde_json::json!({ "date": "2032-07-05", "stake": 100.0, "payout": 110.0 }),
    )
    .await;
    create(
        &client,
        &server.base_url,
        serde_json::json!({ "date": "2032-07-05", "stake": 50.0, "payout": 45.0 }),
    )
    .await;

    let daily = series(
        &client,
        format!("{}/api/series/profit?granularity=daily", server.base_url),
    )
    .await;
    let day = daily
        .iter()
        .find(|point| point.label == "2032-07-05")
        .expect("missing day");
    assert_eq!(day.value, 5.0);

    let cumulative = series(
        &client,
        format!("{}/api/series/cumulative?granularity=monthly", server.base_url),
    )
    .await;
    let total = stats(&client, &server.base_url).await.net_profit;
    let last = cumulative.last().expect("cumulative series");
    assert!((last.value - total).abs() < 1e-9);

    let response = client
        .get(format!("{}/api/series/profit?granularity=hourly", server.base_url))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn http_update_and_delete_entry() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let entry = create(
        &client,
        &server.base_url,
        serde_json::json!({ "date": "2033-01-02", "stake": 100.0, "payout": 0.0 }),
    )
    .await;

    let updated: EntryView = client
        .put(format!("{}/api/entries/{}", server.base_url, entry.id))
        .json(&serde_json::json!({ "date": "2033-01-03", "stake": 100.0, "payout": 400.0 }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(updated.id, entry.id);
    assert_eq!(updated.profit, 300.0);

    let response = client
        .delete(format!("{}/api/entries/{}", server.base_url, entry.id))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = client
        .delete(format!("{}/api/entries/{}", server.base_url, entry.id))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn http_rejects_invalid_entries() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let response = client
        .post(format!("{}/api/entries", server.base_url))
        .json(&serde_json::json!({ "date": "2033-02-30", "stake": 100.0, "payout": 0.0 }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = client
        .post(format!("{}/api/entries/bulk", server.base_url))
        .json(&serde_json::json!([
            { "date": "2033-03-01", "stake": 100.0, "payout": 0.0 },
            { "date": "2033-03-02", "stake": -5.0, "payout": 0.0 }
        ]))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn http_form_submission_redirects_home() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();

    let response = client
        .post(format!("{}/entries", server.base_url))
        .header("content-type", "application/x-www-form-urlencoded")
        .body("date=2034-04-06&race_name=Oka+Sho&stake=300&payout=0")
        .send()
        .await
        .unwrap();
    assert!(response.status().is_redirection());

    let page = client
        .get(format!("{}/", server.base_url))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(page.contains("Oka Sho"));
}

#[tokio::test]
async fn http_predictor_requires_configuration() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let response = client
        .post(format!("{}/api/predict", server.base_url))
        .json(&serde_json::json!({ "race_name": "Arima Kinen", "date": "2034-12-24" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}
