//! API integration tests against a running server

use reqwest::Client;
use serde_json::{json, Value};

fn base_url() -> String {
    std::env::var("BOOKSHELF_TEST_URL").unwrap_or_else(|_| "http://localhost:5000".to_string())
}

/// ISBN that no other test run has used
fn unique_isbn() -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("clock after epoch")
        .as_nanos();
    format!("TEST-{}", nanos)
}

async fn create_book(client: &Client, isbn: &str) -> reqwest::Response {
    client
        .post(format!("{}/api/books", base_url()))
        .json(&json!({
            "title": "Dune",
            "author": "Frank Herbert",
            "isbn": isbn,
            "year": 1965
        }))
        .send()
        .await
        .expect("Failed to send request")
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_root() {
    let client = Client::new();

    let response = client
        .get(format!("{}/", base_url()))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["message"], "Library Management System API");
}

#[tokio::test]
#[ignore]
async fn test_readiness() {
    let client = Client::new();

    let response = client
        .get(format!("{}/ready", base_url()))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "ready");
}

#[tokio::test]
#[ignore]
async fn test_create_duplicate_and_delete_book() {
    let client = Client::new();
    let isbn = unique_isbn();

    let response = create_book(&client, &isbn).await;
    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["data"]["isbn"], isbn.as_str());
    let id = body["data"]["_id"].as_str().expect("No book ID").to_string();

    let response = create_book(&client, &isbn).await;
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["message"], "A book with this ISBN already exists");

    let response = client
        .get(format!("{}/api/books", base_url()))
        .send()
        .await
        .expect("Failed to send request");
    let body: Value = response.json().await.expect("Failed to parse response");
    let matching = body["data"]
        .as_array()
        .expect("data is an array")
        .iter()
        .filter(|book| book["isbn"] == isbn.as_str())
        .count();
    assert_eq!(matching, 1);

    let response = client
        .delete(format!("{}/api/books/{}", base_url(), id))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 200);

    let response = client
        .delete(format!("{}/api/books/{}", base_url(), id))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 404);
}

#[tokio::test]
#[ignore]
async fn test_concurrent_duplicate_creates() {
    let client = Client::new();
    let isbn = unique_isbn();

    let (first, second) = tokio::join!(create_book(&client, &isbn), create_book(&client, &isbn));
    let mut statuses = vec![first.status().as_u16(), second.status().as_u16()];
    statuses.sort();
    assert_eq!(statuses, vec![201, 400]);

    let created = if first.status() == 201 { first } else { second };
    let body: Value = created.json().await.expect("Failed to parse response");
    let id = body["data"]["_id"].as_str().expect("No book ID");

    let _ = client
        .delete(format!("{}/api/books/{}", base_url(), id))
        .send()
        .await;
}

#[tokio::test]
#[ignore]
async fn test_invalid_year() {
    let client = Client::new();

    let response = client
        .post(format!("{}/api/books", base_url()))
        .json(&json!({
            "title": "Future Book",
            "author": "Nobody",
            "isbn": unique_isbn(),
            "year": 99999
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["error"], "InvalidRange");
}

#[tokio::test]
#[ignore]
async fn test_delete_malformed_id() {
    let client = Client::new();

    let response = client
        .delete(format!("{}/api/books/xyz", base_url()))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 400);
}
