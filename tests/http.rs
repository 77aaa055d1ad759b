use axum::{extract::State, http::StatusCode, http::Uri, response::IntoResponse, Json, Router};
use once_cell::sync::Lazy;
use reqwest::Client;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::net::TcpListener;
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::sleep;

type Hits = Arc<std::sync::Mutex<HashMap<String, usize>>>;

struct StatsBackend {
    base_url: String,
    hits: Hits,
}

impl StatsBackend {
    fn hits(&self, path: &str) -> usize {
        self.hits.lock().unwrap().get(path).copied().unwrap_or(0)
    }
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
static BACKEND: Lazy<StatsBackend> = Lazy::new(start_stats_backend);

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

fn backend_body(path: &str) -> Option<Value> {
    let body = match path {
        "/cities" => json!([{"code": "T", "name": "Taipei"}, {"code": "K", "name": "Kaohsiung"}]),
        "/city/T/gender" => json!({"city": "T", "data": [
            {"year": 2023, "gender": "Male", "suicide_rate": 21.0},
            {"year": 2023, "gender": "Female", "suicide_rate": 9.0},
            {"year": 2024, "gender": "Male", "suicide_rate": 20.0},
            {"year": 2024, "gender": "Female", "suicide_rate": 10.0},
            {"year": 2024, "gender": "Unknown", "suicide_rate": 50.0}
        ]}),
        "/city/T/welfare" | "/city/K/welfare" => json!({"data": [
            {"year": 2023, "spending": 900},
            {"year": 2024, "spending": 950}
        ]}),
        "/city/T/details" | "/city/K/details" => json!({
            "center_number": 12, "online_center_number": 3, "population": 2500000, "area": 271.8
        }),
        "/age_trend" => json!({"data": [
            {"year": 2023, "age_group": "15-24", "crude_suicide_rate": 7.9},
            {"year": 2024, "age_group": "15-24", "crude_suicide_rate": 8.1}
        ]}),
        "/chart/resource" => json!({"data": [
            {"year": 2024, "happiness_score": 6.2, "suicide_rate": 14.0, "city_name": "Taipei", "special_municipality": "Yes"}
        ]}),
        "/nationwide_welfare_avg" => json!({"data": [{"year": "2024", "avg_nationwide_spending": 800}]}),
        "/map/accessibility" => json!({"data": [
            {"city_code": "T", "city_name": "Taipei", "latitude": 25.03, "longitude": 121.56, "total_facilities": 40, "density_per_area": 1.5},
            {"city_code": "K", "city_name": "Kaohsiung", "total_facilities": 30, "combined_facilities_per_100k_pop": 1.1}
        ]}),
        _ => return None,
    };
    Some(body)
}

async fn serve_backend(State(hits): State<Hits>, uri: Uri) -> impl IntoResponse {
    let path = uri.path().to_string();
    *hits.lock().unwrap().entry(path.clone()).or_default() += 1;

    // Kaohsiung's gender series is always broken.
    if path == "/city/K/gender" {
        return (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"error": "Failed to fetch gender chart data."})));
    }
    match backend_body(&path) {
        Some(body) => (StatusCode::OK, Json(body)),
        None => (StatusCode::NOT_FOUND, Json(json!({"error": "not found"}))),
    }
}

fn start_stats_backend() -> StatsBackend {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind backend port");
    listener.set_nonblocking(true).expect("nonblocking listener");
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    let hits: Hits = Arc::default();

    let state = Arc::clone(&hits);
    std::thread::spawn(move || {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("backend runtime");
        runtime.block_on(async move {
            let listener = tokio::net::TcpListener::from_std(listener).expect("tokio listener");
            let app = Router::new().fallback(serve_backend).with_state(state);
            axum::serve(listener, app).await.expect("backend server");
        });
    });

    StatsBackend { base_url, hits }
}

fn pick_free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind random port");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

async fn get_dashboard(client: &Client, base_url: &str) -> Value {
    client
        .get(format!("{base_url}/api/dashboard"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap()
}

async fn wait_until_started(base_url: &str) {
    let client = Client::new();
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        if let Ok(resp) = client.get(format!("{base_url}/api/dashboard")).send().await {
            if resp.status().is_success() {
                let snapshot: Value = resp.json().await.unwrap();
                let rendered = snapshot["panels"].as_object().map_or(0, |panels| panels.len());
                if rendered == 7 {
                    return;
                }
            }
        }
        if Instant::now() > deadline {
            panic!("dashboard did not finish starting");
        }
        sleep(Duration::from_millis(100)).await;
    }
}

async fn spawn_server() -> TestServer {
    let port = pick_free_port();
    let child = Command::new(env!("CARGO_BIN_EXE_city_dashboard"))
        .env("PORT", port.to_string())
        .env("DASHBOARD_API_URL", &BACKEND.base_url)
        .env("RUST_LOG", "info")
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .expect("failed to spawn server");

    #[cfg(unix)]
    cleanup::register(child.id());

    let base_url = format!("http://127.0.0.1:{port}");
    wait_until_started(&base_url).await;

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

#[tokio::test]
async fn http_startup_loads_the_first_city_once() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let snapshot = get_dashboard(&client, &server.base_url).await;
    assert_eq!(snapshot["selected_city"], "T");
    assert_eq!(snapshot["cities"].as_array().unwrap().len(), 2);
    assert_eq!(snapshot["year_options"], json!([2020, 2021, 2022, 2023, 2024]));

    let gender = &snapshot["panels"]["gender_trend"];
    assert_eq!(gender["view"], "chart");
    assert_eq!(gender["title"], "Taipei: Gender SMR Trend");
    assert_eq!(gender["traces"].as_array().unwrap().len(), 2);

    assert_eq!(BACKEND.hits("/cities"), 1);
    assert_eq!(BACKEND.hits("/city/T/gender"), 1);
    assert_eq!(BACKEND.hits("/city/T/welfare"), 1);
    assert_eq!(BACKEND.hits("/age_trend"), 1);
    assert_eq!(BACKEND.hits("/map/accessibility"), 1);
}

#[tokio::test]
async fn http_invalid_selections_are_rejected() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let before = get_dashboard(&client, &server.base_url).await;

    let response = client
        .post(format!("{}/api/select/city", server.base_url))
        .json(&json!({ "code": "X" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);

    let response = client
        .post(format!("{}/api/select/year", server.base_url))
        .json(&json!({ "year": 2030 }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);

    let after = get_dashboard(&client, &server.base_url).await;
    assert_eq!(after["selected_city"], before["selected_city"]);
    assert_eq!(after["selected_year"], before["selected_year"]);
}

#[tokio::test]
async fn http_year_change_rerenders_year_panels() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let resource_hits = BACKEND.hits("/chart/resource");
    let gender_hits = BACKEND.hits("/city/T/gender");

    let snapshot: Value = client
        .post(format!("{}/api/select/year", server.base_url))
        .json(&json!({ "year": 2023 }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(snapshot["selected_year"], 2023);
    assert_eq!(snapshot["panels"]["summary"]["year"], 2023);
    assert_eq!(snapshot["panels"]["summary"]["average_rate_display"], "15.00");
    assert_eq!(snapshot["panels"]["age_trend"]["title"], "Crude Suicide Rate by Age Group, 2023");
    // Resource rows only exist for 2024.
    assert_eq!(snapshot["panels"]["resource_scatter"]["annotation"], "No data for this selection");

    assert_eq!(BACKEND.hits("/chart/resource"), resource_hits + 1);
    assert_eq!(BACKEND.hits("/city/T/gender"), gender_hits);

    let response = client
        .post(format!("{}/api/select/year", server.base_url))
        .json(&json!({ "year": 2024 }))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
}

#[tokio::test]
async fn http_failed_panel_reports_status_and_keeps_prior_chart() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let snapshot: Value = client
        .post(format!("{}/api/select/city", server.base_url))
        .json(&json!({ "code": "K" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(snapshot["selected_city"], "K");
    assert_eq!(snapshot["status"]["message"], "Failed to load gender chart data.");
    assert_eq!(snapshot["panels"]["gender_trend"]["title"], "Taipei: Gender SMR Trend");
    assert_eq!(
        snapshot["panels"]["accessibility_map"]["title"],
        "Service Accessibility: Kaohsiung highlighted"
    );

    let snapshot: Value = client
        .post(format!("{}/api/select/city", server.base_url))
        .json(&json!({ "code": "T" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(snapshot["selected_city"], "T");
    assert!(snapshot["status"]["message"].is_null());
    assert_eq!(BACKEND.hits("/city/T/gender"), 1);
}

#[tokio::test]
async fn http_panels_and_index_are_served() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let panel: Value = client
        .get(format!("{}/api/panels/accessibility_map", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(panel["view"], "chart");
    assert_eq!(panel["traces"][0]["type"], "geo");
    assert_eq!(panel["traces"][0]["lat"].as_array().unwrap().len(), 2);

    let response = client
        .get(format!("{}/api/panels/not_a_panel", server.base_url))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_client_error());

    let html = client
        .get(format!("{}/", server.base_url))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(html.contains("City Wellbeing Dashboard"));
    assert!(html.contains(r#"data-year="2020""#));
}
