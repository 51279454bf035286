// SPDX-License-Identifier: Apache-2.0

use edna_server::{build_router, AppState, InMemoryStore};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

async fn spawn_server() -> std::net::SocketAddr {
    let store = InMemoryStore::seeded().expect("seed fixtures");
    let app = build_router(AppState::new(Arc::new(store)));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move { axum::serve(listener, app).await.expect("serve app") });
    addr
}

async fn send_raw(
    addr: std::net::SocketAddr,
    method: &str,
    path: &str,
    extra_headers: &[(&str, &str)],
    body: Option<&str>,
) -> (u16, String, String) {
    let mut stream = tokio::net::TcpStream::connect(addr)
        .await
        .expect("connect server");
    let mut req = format!("{method} {path} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n");
    for (name, value) in extra_headers {
        req.push_str(&format!("{name}: {value}\r\n"));
    }
    if let Some(body) = body {
        req.push_str(&format!(
            "content-type: application/json\r\ncontent-length: {}\r\n\r\n{body}",
            body.len()
        ));
    } else {
        req.push_str("\r\n");
    }
    stream
        .write_all(req.as_bytes())
        .await
        .expect("write request");
    let mut response = String::new();
    stream
        .read_to_string(&mut response)
        .await
        .expect("read response");
    let (head, body) = response
        .split_once("\r\n\r\n")
        .expect("http response separator");
    let status = head
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|s| s.parse::<u16>().ok())
        .expect("status");
    (status, head.to_string(), body.to_string())
}

fn header_value(head: &str, name: &str) -> Option<String> {
    head.lines().find_map(|line| {
        let (key, value) = line.split_once(':')?;
        if key.eq_ignore_ascii_case(name) {
            Some(value.trim().to_string())
        } else {
            None
        }
    })
}

#[tokio::test]
async fn ops_endpoints_answer() {
    let addr = spawn_server().await;

    let (status, _, body) = send_raw(addr, "GET", "/healthz", &[], None).await;
    assert_eq!(status, 200);
    assert_eq!(body, "ok");

    let (status, _, body) = send_raw(addr, "GET", "/readyz", &[], None).await;
    assert_eq!(status, 200);
    assert_eq!(body, "ready");

    let (status, _, body) = send_raw(addr, "GET", "/v1/version", &[], None).await;
    assert_eq!(status, 200);
    let version: Value = serde_json::from_str(&body).expect("version json");
    assert_eq!(version["name"], json!("edna-server"));
    assert_eq!(version["config_schema_version"], json!("1"));

    let (status, _, body) = send_raw(addr, "GET", "/v1/openapi.json", &[], None).await;
    assert_eq!(status, 200);
    let spec: Value = serde_json::from_str(&body).expect("openapi json");
    assert!(spec["paths"]["/api/samples"].is_object());
}

#[tokio::test]
async fn request_id_is_echoed_and_generated() {
    let addr = spawn_server().await;

    let (_, head, _) = send_raw(addr, "GET", "/healthz", &[("x-request-id", "abc-123")], None).await;
    assert_eq!(header_value(&head, "x-request-id").as_deref(), Some("abc-123"));

    let (_, head, _) = send_raw(addr, "GET", "/healthz", &[], None).await;
    let generated = header_value(&head, "x-request-id").expect("generated id");
    assert!(generated.starts_with("req-"));
}

#[tokio::test]
async fn sample_listing_paginates_and_filters() {
    let addr = spawn_server().await;

    let (status, _, body) = send_raw(addr, "GET", "/api/samples", &[], None).await;
    assert_eq!(status, 200);
    let page: Value = serde_json::from_str(&body).expect("samples json");
    assert_eq!(page["success"], json!(true));
    assert_eq!(page["samples"].as_array().map(Vec::len), Some(2));
    assert_eq!(page["pagination"]["page"], json!(1));
    assert_eq!(page["pagination"]["limit"], json!(10));
    assert_eq!(page["pagination"]["total"], json!(2));
    assert_eq!(page["pagination"]["totalPages"], json!(1));

    let (status, _, body) =
        send_raw(addr, "GET", "/api/samples?status=analyzed", &[], None).await;
    assert_eq!(status, 200);
    let filtered: Value = serde_json::from_str(&body).expect("filtered json");
    assert_eq!(filtered["samples"].as_array().map(Vec::len), Some(1));
    assert_eq!(filtered["samples"][0]["sampleId"], json!("NS_2024_001"));

    let (status, _, body) =
        send_raw(addr, "GET", "/api/samples?page=2&limit=1", &[], None).await;
    assert_eq!(status, 200);
    let second: Value = serde_json::from_str(&body).expect("second page json");
    assert_eq!(second["samples"][0]["id"], json!("SAMPLE_002"));
    assert_eq!(second["pagination"]["totalPages"], json!(2));

    let (status, _, body) = send_raw(
        addr,
        "GET",
        "/api/samples?page=18446744073709551615",
        &[],
        None,
    )
    .await;
    assert_eq!(status, 200);
    let far: Value = serde_json::from_str(&body).expect("far page json");
    assert_eq!(far["samples"].as_array().map(Vec::len), Some(0));
    assert_eq!(far["pagination"]["total"], json!(2));

    let (status, _, body) = send_raw(addr, "GET", "/api/samples?status=done", &[], None).await;
    assert_eq!(status, 400);
    let err: Value = serde_json::from_str(&body).expect("error json");
    assert_eq!(err["success"], json!(false));
    assert_eq!(err["details"]["code"], json!("InvalidQueryParameter"));
}

#[tokio::test]
async fn sample_create_validates_and_persists() {
    let addr = spawn_server().await;

    let (status, _, body) = send_raw(addr, "POST", "/api/samples", &[], Some("{}")).await;
    assert_eq!(status, 400);
    let err: Value = serde_json::from_str(&body).expect("error json");
    assert_eq!(err["error"], json!("Missing required field: sampleId"));

    let draft = json!({
        "sampleId": "AR_2024_007",
        "collectionDate": "2024-02-01",
        "location": {"name": "Arabian Sea Station C", "lat": 15.2, "lng": 68.4},
        "depth": 40,
        "researcher": "Dr. Deep Diver",
    })
    .to_string();
    let (status, _, body) = send_raw(addr, "POST", "/api/samples", &[], Some(&draft)).await;
    assert_eq!(status, 200);
    let stored: Value = serde_json::from_str(&body).expect("stored json");
    assert_eq!(stored["success"], json!(true));
    assert_eq!(stored["message"], json!("Sample uploaded successfully"));
    assert_eq!(stored["sample"]["status"], json!("uploaded"));
    assert!(stored["sample"]["id"]
        .as_str()
        .is_some_and(|id| id.starts_with("SAMPLE_")));

    let (_, _, body) = send_raw(addr, "GET", "/api/samples", &[], None).await;
    let page: Value = serde_json::from_str(&body).expect("samples json");
    assert_eq!(page["pagination"]["total"], json!(3));
}

#[tokio::test]
async fn taxonomy_search_and_hierarchy_modes() {
    let addr = spawn_server().await;

    let (status, _, body) = send_raw(addr, "GET", "/api/taxonomy?q=gadus", &[], None).await;
    assert_eq!(status, 200);
    let search: Value = serde_json::from_str(&body).expect("search json");
    assert_eq!(search["success"], json!(true));
    assert_eq!(search["totalCount"], json!(1));
    assert_eq!(search["results"][0]["scientificName"], json!("Gadus morhua"));
    assert_eq!(search["results"][0]["conservationStatus"], json!("Vulnerable"));

    // common-name matches count too
    let (_, _, body) = send_raw(addr, "GET", "/api/taxonomy?q=cod", &[], None).await;
    let search: Value = serde_json::from_str(&body).expect("search json");
    assert_eq!(search["totalCount"], json!(1));

    let (status, head, body) = send_raw(addr, "GET", "/api/taxonomy", &[], None).await;
    assert_eq!(status, 200);
    let hierarchy: Value = serde_json::from_str(&body).expect("hierarchy json");
    assert_eq!(hierarchy["totalSpecies"], json!(12847));
    assert_eq!(hierarchy["kingdoms"][0]["name"], json!("Animalia"));
    let etag = header_value(&head, "etag").expect("hierarchy etag");

    let (status, _, _) =
        send_raw(addr, "GET", "/api/taxonomy", &[("if-none-match", &etag)], None).await;
    assert_eq!(status, 304);
}

#[tokio::test]
async fn access_log_filters_compose() {
    let addr = spawn_server().await;

    let (status, _, body) = send_raw(addr, "GET", "/api/security/logs", &[], None).await;
    assert_eq!(status, 200);
    let all: Value = serde_json::from_str(&body).expect("logs json");
    assert_eq!(all["total"], json!(4));
    assert_eq!(all["logs"][0]["id"], json!("1"));

    let (_, _, body) =
        send_raw(addr, "GET", "/api/security/logs?status=failed", &[], None).await;
    let failed: Value = serde_json::from_str(&body).expect("failed json");
    assert_eq!(failed["total"], json!(1));
    assert_eq!(failed["logs"][0]["user"], json!("unknown@suspicious.com"));

    let (_, _, body) = send_raw(
        addr,
        "GET",
        "/api/security/logs?search=credential&status=all",
        &[],
        None,
    )
    .await;
    let searched: Value = serde_json::from_str(&body).expect("search json");
    assert_eq!(searched["total"], json!(2));

    let (_, _, body) = send_raw(addr, "GET", "/api/security/logs?limit=1", &[], None).await;
    let limited: Value = serde_json::from_str(&body).expect("limited json");
    assert_eq!(limited["total"], json!(1));

    let (status, _, _) =
        send_raw(addr, "GET", "/api/security/logs?status=bogus", &[], None).await;
    assert_eq!(status, 400);
}

#[tokio::test]
async fn metrics_expose_request_counters() {
    let addr = spawn_server().await;

    let (status, _, _) = send_raw(addr, "GET", "/api/samples", &[], None).await;
    assert_eq!(status, 200);

    let (status, _, body) = send_raw(addr, "GET", "/metrics", &[], None).await;
    assert_eq!(status, 200);
    assert!(body.contains("edna_http_requests_total"));
    assert!(body.contains("/api/samples"));
}
