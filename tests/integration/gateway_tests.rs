//! End-to-end pin runs against mocked GitHub and IPFS endpoints

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use gexpin::config::Config;
use gexpin::gateway::Gateway;
use gexpin::server;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct Harness {
    _dir: TempDir,
    log_path: PathBuf,
    raw: MockServer,
    ipfs: MockServer,
    app: Router,
}

impl Harness {
    async fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let raw = MockServer::start().await;
        let ipfs = MockServer::start().await;

        let mut config = Config::default();
        config.resolver.raw_base_url = raw.uri();
        config.ipfs.api_url = ipfs.uri();
        config.pin.log_path = dir.path().join("pinlogs");
        config.network.external_ip = Some("203.0.113.7".to_string());

        let gateway = Arc::new(Gateway::start(&config).await.unwrap());
        let app = server::router(gateway, dir.path());

        Self {
            log_path: config.pin.log_path.clone(),
            _dir: dir,
            raw,
            ipfs,
            app,
        }
    }

    async fn publish(&self, repo: &str, body: &str) {
        Mock::given(method("GET"))
            .and(path(format!("/{repo}/master/.gx/lastpubver")))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&self.raw)
            .await;
    }

    async fn refs(&self, root: &str, refs: &[&str]) {
        let body: String = refs
            .iter()
            .map(|r| format!("{{\"Ref\":\"{r}\",\"Err\":\"\"}}\n"))
            .collect();
        Mock::given(method("POST"))
            .and(path("/api/v0/refs"))
            .and(query_param("arg", root))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&self.ipfs)
            .await;
    }

    async fn accept_pins(&self) {
        Mock::given(method("POST"))
            .and(path("/api/v0/pin/add"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{\"Pins\":[]}"))
            .mount(&self.ipfs)
            .await;
    }

    async fn pin(&self, ghurl: &str) -> (StatusCode, String) {
        let request = Request::builder()
            .method("POST")
            .uri("/pin_package")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(format!("ghurl={ghurl}")))
            .unwrap();
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        (status, body_text(response.into_body()).await)
    }

    async fn recent(&self) -> serde_json::Value {
        let response = self
            .app
            .clone()
            .oneshot(Request::get("/recent").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        serde_json::from_str(&body_text(response.into_body()).await).unwrap()
    }

    fn log(&self) -> String {
        std::fs::read_to_string(&self.log_path).unwrap()
    }
}

async fn body_text(body: Body) -> String {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn pins_published_package() {
    let h = Harness::new().await;
    h.publish("acme/widget", "1.2.3 QmAbc123\n").await;
    h.refs("QmAbc123", &["QmAbc123", "QmDef456"]).await;
    h.accept_pins().await;

    let (status, body) = h.pin("https://github.com/acme/widget").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("pinning github.com/acme/widget version 1.2.3: QmAbc123"));
    let first = body.find("<li>QmAbc123</li>").unwrap();
    let second = body.find("<li>QmDef456</li>").unwrap();
    let done = body.find("<p>success!</p>").unwrap();
    assert!(first < second && second < done);

    assert_eq!(h.log(), "acme/widget QmAbc123 1.2.3\n");
    assert_eq!(
        h.recent().await,
        serde_json::json!([{"Url": "acme/widget", "Hash": "QmAbc123", "Version": "1.2.3"}])
    );
}

#[tokio::test]
async fn malformed_metadata_is_client_error() {
    let h = Harness::new().await;
    h.publish("acme/widget", "onlyonetoken").await;

    let (status, body) = h.pin("https://github.com/acme/widget").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("malformed metadata"));
    assert_eq!(h.log(), "");
    assert_eq!(h.recent().await, serde_json::json!([]));
}

#[tokio::test]
async fn missing_metadata_is_client_error() {
    let h = Harness::new().await;

    let (status, _body) = h.pin("github.com/acme/unpublished").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(h.log(), "");
}

#[tokio::test]
async fn enumeration_failure_reports_error_without_recording() {
    let h = Harness::new().await;
    h.publish("acme/widget", "1.2.3 QmAbc123").await;
    Mock::given(method("POST"))
        .and(path("/api/v0/refs"))
        .respond_with(ResponseTemplate::new(500).set_body_json(serde_json::json!({
            "Message": "merkledag: not found",
            "Code": 0,
            "Type": "error"
        })))
        .mount(&h.ipfs)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v0/pin/add"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&h.ipfs)
        .await;

    let (_status, body) = h.pin("https://github.com/acme/widget").await;

    assert!(body.contains("error (500)"));
    assert!(body.contains("merkledag: not found"));
    assert!(!body.contains("success!"));
    assert_eq!(h.log(), "");
    assert_eq!(h.recent().await, serde_json::json!([]));
}

#[tokio::test]
async fn pin_failure_reports_error_without_recording() {
    let h = Harness::new().await;
    h.publish("acme/widget", "1.2.3 QmAbc123").await;
    h.refs("QmAbc123", &["QmAbc123"]).await;
    Mock::given(method("POST"))
        .and(path("/api/v0/pin/add"))
        .respond_with(ResponseTemplate::new(500).set_body_string("daemon exploded"))
        .mount(&h.ipfs)
        .await;

    let (_status, body) = h.pin("https://github.com/acme/widget").await;

    assert!(body.contains("<li>QmAbc123</li>"));
    assert!(body.contains("error (500)"));
    assert!(!body.contains("success!"));
    assert_eq!(h.log(), "");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_distinct_pins_are_all_recorded() {
    const N: usize = 16;
    let h = Arc::new(Harness::new().await);
    for i in 0..N {
        let root = format!("QmPkg{i}");
        h.publish(&format!("acme/pkg{i}"), &format!("0.{i}.0 {root}"))
            .await;
        h.refs(&root, &[root.as_str(), "QmShared"]).await;
    }
    h.accept_pins().await;

    let mut handles = Vec::new();
    for i in 0..N {
        let h = Arc::clone(&h);
        handles.push(tokio::spawn(async move {
            h.pin(&format!("https://github.com/acme/pkg{i}")).await
        }));
    }
    for handle in handles {
        let (status, body) = handle.await.unwrap();
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("success!"));
    }

    let log = h.log();
    let mut lines: Vec<&str> = log.lines().collect();
    lines.sort();
    let mut expected: Vec<String> = (0..N)
        .map(|i| format!("acme/pkg{i} QmPkg{i} 0.{i}.0"))
        .collect();
    expected.sort();
    assert_eq!(lines, expected);

    let recent = h.recent().await;
    assert_eq!(recent.as_array().unwrap().len(), N);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_same_source_pins_write_whole_lines() {
    let h = Arc::new(Harness::new().await);
    h.publish("acme/widget", "1.2.3 QmAbc123").await;
    h.refs("QmAbc123", &["QmAbc123"]).await;
    h.accept_pins().await;

    let mut handles = Vec::new();
    for _ in 0..8 {
        let h = Arc::clone(&h);
        handles.push(tokio::spawn(
            async move { h.pin("github.com/acme/widget").await },
        ));
    }
    for handle in handles {
        assert_eq!(handle.await.unwrap().0, StatusCode::OK);
    }

    let log = h.log();
    assert_eq!(log.lines().count(), 8);
    assert!(log.lines().all(|l| l == "acme/widget QmAbc123 1.2.3"));
    assert_eq!(h.recent().await.as_array().unwrap().len(), 1);
}
