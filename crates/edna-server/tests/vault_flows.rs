// SPDX-License-Identifier: Apache-2.0

use edna_server::{build_router, AppState, InMemoryStore};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

const MASK: &str = "••••••••••••••••••••••••••••••••";

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
    body: Option<&str>,
) -> (u16, String, String) {
    let mut stream = tokio::net::TcpStream::connect(addr)
        .await
        .expect("connect server");
    let mut req = format!("{method} {path} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n");
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
async fn credential_listing_masks_every_value() {
    let addr = spawn_server().await;

    let (status, head, body) = send_raw(addr, "GET", "/api/credentials", None).await;
    assert_eq!(status, 200);
    let listing: Value = serde_json::from_str(&body).expect("credentials json");
    assert_eq!(listing["success"], json!(true));
    assert_eq!(listing["total"], json!(2));
    for cred in listing["credentials"].as_array().expect("array") {
        assert_eq!(cred["value"], json!(MASK));
        assert_eq!(cred["encrypted"], json!(true));
    }
    assert!(!body.contains("postgres"));
    assert!(!body.contains("sk-demo"));
    assert!(header_value(&head, "etag").is_some());

    let (status, _, body) = send_raw(addr, "GET", "/api/credentials?type=api_key", None).await;
    assert_eq!(status, 200);
    let filtered: Value = serde_json::from_str(&body).expect("filtered json");
    assert_eq!(filtered["total"], json!(1));
    assert_eq!(filtered["credentials"][0]["name"], json!("OpenAI API Key"));

    let (status, _, _) = send_raw(addr, "GET", "/api/credentials?type=ssh", None).await;
    assert_eq!(status, 400);
}

#[tokio::test]
async fn credential_create_masks_response_and_writes_audit_entry() {
    let addr = spawn_server().await;

    let (status, _, body) = send_raw(
        addr,
        "POST",
        "/api/credentials",
        Some(r#"{"name": "Deploy Token", "type": "token"}"#),
    )
    .await;
    assert_eq!(status, 400);
    let err: Value = serde_json::from_str(&body).expect("error json");
    assert_eq!(err["error"], json!("Missing required field: value"));

    let draft = json!({
        "name": "Deploy Token",
        "type": "token",
        "description": "CI deploy token",
        "value": "tok-super-secret-123",
    })
    .to_string();
    let (status, _, body) = send_raw(addr, "POST", "/api/credentials", Some(&draft)).await;
    assert_eq!(status, 200);
    let stored: Value = serde_json::from_str(&body).expect("stored json");
    assert_eq!(stored["message"], json!("Credential stored successfully"));
    assert_eq!(stored["credential"]["value"], json!(MASK));
    assert_eq!(stored["credential"]["lastAccessed"], json!("Never"));
    assert!(!body.contains("tok-super-secret-123"));

    let (_, _, body) = send_raw(addr, "GET", "/api/credentials", None).await;
    let listing: Value = serde_json::from_str(&body).expect("credentials json");
    assert_eq!(listing["total"], json!(3));

    // the vault audits its own mutations
    let (_, _, body) =
        send_raw(addr, "GET", "/api/security/logs?search=Deploy%20Token", None).await;
    let logs: Value = serde_json::from_str(&body).expect("logs json");
    assert_eq!(logs["total"], json!(1));
    assert_eq!(logs["logs"][0]["action"], json!("CREATE_CREDENTIAL"));
    assert_eq!(logs["logs"][0]["user"], json!("system@edna.platform"));
}

#[tokio::test]
async fn credential_delete_flow() {
    let addr = spawn_server().await;

    let (status, _, body) = send_raw(addr, "DELETE", "/api/credentials", None).await;
    assert_eq!(status, 400);
    let err: Value = serde_json::from_str(&body).expect("error json");
    assert_eq!(err["error"], json!("Credential ID required"));

    let (status, _, body) = send_raw(addr, "DELETE", "/api/credentials?id=404", None).await;
    assert_eq!(status, 404);
    let err: Value = serde_json::from_str(&body).expect("error json");
    assert_eq!(err["details"]["code"], json!("CredentialNotFound"));

    let (status, _, body) = send_raw(addr, "DELETE", "/api/credentials?id=2", None).await;
    assert_eq!(status, 200);
    let deleted: Value = serde_json::from_str(&body).expect("deleted json");
    assert_eq!(deleted["message"], json!("Credential deleted successfully"));

    let (_, _, body) = send_raw(addr, "GET", "/api/credentials", None).await;
    let listing: Value = serde_json::from_str(&body).expect("credentials json");
    assert_eq!(listing["total"], json!(1));
    assert_eq!(
        listing["credentials"][0]["name"],
        json!("Supabase Database URL")
    );

    let (_, _, body) =
        send_raw(addr, "GET", "/api/security/logs?search=DELETE_CREDENTIAL", None).await;
    let logs: Value = serde_json::from_str(&body).expect("logs json");
    assert_eq!(logs["total"], json!(1));
}

#[tokio::test]
async fn security_event_post_appends_to_log() {
    let addr = spawn_server().await;

    let (status, _, body) = send_raw(
        addr,
        "POST",
        "/api/security/logs",
        Some(r#"{"user": "ops@edna.platform", "action": "ROTATE_CREDENTIAL"}"#),
    )
    .await;
    assert_eq!(status, 400);
    let err: Value = serde_json::from_str(&body).expect("error json");
    assert_eq!(err["error"], json!("Missing required field: resource"));

    let event = json!({
        "user": "ops@edna.platform",
        "action": "ROTATE_CREDENTIAL",
        "resource": "OpenAI API Key",
        "status": "warning",
        "ipAddress": "10.0.0.9",
        "userAgent": "edna-cli/0.1",
    })
    .to_string();
    let (status, _, body) = send_raw(addr, "POST", "/api/security/logs", Some(&event)).await;
    assert_eq!(status, 200);
    let logged: Value = serde_json::from_str(&body).expect("logged json");
    assert_eq!(logged["message"], json!("Security event logged successfully"));

    let (_, _, body) = send_raw(addr, "GET", "/api/security/logs", None).await;
    let logs: Value = serde_json::from_str(&body).expect("logs json");
    assert_eq!(logs["total"], json!(5));
    assert_eq!(logs["logs"][0]["action"], json!("ROTATE_CREDENTIAL"));
    assert_eq!(logs["logs"][0]["status"], json!("warning"));
    assert_eq!(logs["logs"][0]["ipAddress"], json!("10.0.0.9"));
}
