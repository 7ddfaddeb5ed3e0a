//! Wire-level tests against a canned local HTTP server.
//!
//! Each test binds an ephemeral port, answers exactly one request with a
//! fixed response, and hands back the raw request for inspection.

use allergen_client::{
    AllergenDraft, AllergenStore, ClientError, HttpAllergenStore, HttpScanService, ScanRequest,
    ScanService,
};
use allergen_core::{AllergenId, FileUpload, InputPayload, Selection, Severity};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Serve one request with `status` and a JSON `body`; resolves to the raw request text.
async fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let base_url = format!("http://{}", listener.local_addr().expect("local addr"));

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.expect("accept");
        let request = read_request(&mut socket).await;

        let response = format!(
            "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        );
        socket
            .write_all(response.as_bytes())
            .await
            .expect("write response");
        socket.shutdown().await.ok();
        request
    });

    (base_url, handle)
}

/// Read headers plus a body framed by content-length or chunked encoding.
async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    loop {
        let n = socket.read(&mut chunk).await.expect("read");
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);

        let text = String::from_utf8_lossy(&buf).to_string();
        let Some(header_end) = text.find("\r\n\r\n") else {
            continue;
        };
        let headers = text[..header_end].to_ascii_lowercase();
        let body_len = buf.len() - (header_end + 4);

        if let Some(len) = headers
            .lines()
            .find_map(|l| l.strip_prefix("content-length:"))
            .and_then(|v| v.trim().parse::<usize>().ok())
        {
            if body_len >= len {
                break;
            }
        } else if headers.contains("transfer-encoding: chunked") {
            if text.ends_with("\r\n0\r\n\r\n") {
                break;
            }
        } else {
            break;
        }
    }

    String::from_utf8_lossy(&buf).to_string()
}

fn selection(ids: &[&str]) -> Selection {
    ids.iter()
        .map(|id| AllergenId::new(*id).expect("valid id"))
        .collect()
}

#[tokio::test]
async fn test_list_allergens() {
    let (base_url, server) = serve_once(
        "200 OK",
        r#"[{"_id":"a1","name":"Peanut","keywords":["peanut"],"severity":"HIGH"},
            {"id":"a2","name":"Milk","keywords":["milk","whey"],"severity":"MEDIUM"}]"#,
    )
    .await;

    let store = HttpAllergenStore::new(base_url, Duration::from_secs(5)).expect("store");
    let records = store.list().await.expect("list");

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].id.as_str(), "a1");
    assert_eq!(records[1].keywords, vec!["milk", "whey"]);

    let request = server.await.expect("server task");
    assert!(request.starts_with("GET /allergens HTTP/1.1"));
}

#[tokio::test]
async fn test_create_allergen_sends_json_body() {
    let (base_url, server) = serve_once(
        "201 Created",
        r#"{"id":"new-1","name":"Sesame","keywords":["sesame","tahini"],"severity":"LOW"}"#,
    )
    .await;

    let store = HttpAllergenStore::new(base_url, Duration::from_secs(5)).expect("store");
    let draft = AllergenDraft {
        name: "Sesame".to_string(),
        keywords: vec!["sesame".to_string(), "tahini".to_string()],
        severity: Severity::Low,
    };
    let record = store.create(&draft).await.expect("create");
    assert_eq!(record.id.as_str(), "new-1");

    let request = server.await.expect("server task");
    assert!(request.starts_with("POST /allergens HTTP/1.1"));
    assert!(request.contains(r#""keywords":["sesame","tahini"]"#));
    assert!(request.contains(r#""severity":"LOW""#));
}

#[tokio::test]
async fn test_delete_allergen_rejected() {
    let (base_url, server) =
        serve_once("404 Not Found", r#"{"detail":"Allergen not found"}"#).await;

    let store = HttpAllergenStore::new(base_url, Duration::from_secs(5)).expect("store");
    let err = store
        .delete(&AllergenId::new("gone").expect("valid id"))
        .await
        .unwrap_err();

    match err {
        ClientError::Api { status, detail, .. } => {
            assert_eq!(status, 404);
            assert_eq!(detail, "Allergen not found");
        }
        other => panic!("expected Api error, got {other:?}"),
    }

    let request = server.await.expect("server task");
    assert!(request.starts_with("DELETE /allergens/gone HTTP/1.1"));
}

#[tokio::test]
async fn test_scan_text_multipart() {
    let (base_url, server) = serve_once(
        "200 OK",
        r#"{"matches":[{"allergen":"Peanut","keyword_found":"peanut","severity":"HIGH","position":{"start":9,"end":16}}],
            "safe":false,"timestamp":"2026-10-16 10:00:00","scanner_version":"2"}"#,
    )
    .await;

    let service = HttpScanService::new(base_url, Duration::from_secs(5)).expect("service");
    let request = ScanRequest::new(
        &selection(&["peanut-id", "milk-id"]),
        &InputPayload::Text("Contains peanuts and milk".to_string()),
    );
    let response = service.scan(request).await.expect("scan");

    assert!(!response.safe);
    assert_eq!(response.matches.len(), 1);
    assert_eq!(response.matches[0].keyword_found, "peanut");

    let raw = server.await.expect("server task");
    assert!(raw.starts_with("POST /scan HTTP/1.1"));
    assert!(raw.to_ascii_lowercase().contains("multipart/form-data"));
    assert_eq!(raw.matches(r#"name="selected_allergen_ids""#).count(), 2);
    assert!(raw.contains(r#"name="text""#));
    assert!(raw.contains("Contains peanuts and milk"));
    assert!(!raw.contains(r#"name="file""#));
}

#[tokio::test]
async fn test_scan_file_multipart() {
    let (base_url, server) =
        serve_once("200 OK", r#"{"matches":[],"safe":true,"timestamp":"t"}"#).await;

    let service = HttpScanService::new(base_url, Duration::from_secs(5)).expect("service");
    let request = ScanRequest::new(
        &selection(&["egg-id"]),
        &InputPayload::Document(FileUpload::new("recipe.pdf", b"%PDF-1.7 eggs".to_vec())),
    );
    let response = service.scan(request).await.expect("scan");
    assert!(response.safe);

    let raw = server.await.expect("server task");
    assert!(raw.contains(r#"name="file"; filename="recipe.pdf""#));
    assert!(raw.contains("application/pdf"));
    assert!(!raw.contains(r#"name="text""#));
}

#[tokio::test]
async fn test_scan_rejection_passes_detail_through() {
    let (base_url, server) = serve_once(
        "413 Payload Too Large",
        r#"{"detail":"File exceeds 10MB limit"}"#,
    )
    .await;

    let service = HttpScanService::new(base_url, Duration::from_secs(5)).expect("service");
    let request = ScanRequest::new(
        &selection(&["egg-id"]),
        &InputPayload::Text("eggs".to_string()),
    );
    let err = service.scan(request).await.unwrap_err();
    assert_eq!(err.detail(), Some("File exceeds 10MB limit"));
    server.await.expect("server task");
}

#[tokio::test]
async fn test_scan_rejection_without_detail_uses_fallback() {
    let (base_url, server) = serve_once("500 Internal Server Error", r#"{"oops":true}"#).await;

    let service = HttpScanService::new(base_url, Duration::from_secs(5)).expect("service");
    let request = ScanRequest::new(
        &selection(&["egg-id"]),
        &InputPayload::Text("eggs".to_string()),
    );
    let err = service.scan(request).await.unwrap_err();
    assert_eq!(err.detail(), Some("Scan failed"));
    server.await.expect("server task");
}

#[tokio::test]
async fn test_unreachable_backend_is_transport_error() {
    // Bind then drop to get a port with nothing listening
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let base_url = format!("http://{}", listener.local_addr().expect("addr"));
    drop(listener);

    let store = HttpAllergenStore::new(base_url, Duration::from_secs(2)).expect("store");
    let err = store.list().await.unwrap_err();
    assert!(err.is_transport(), "expected transport error, got {err:?}");
}
