//! REST API tests against the router, backed by the in-memory store

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chrono::{NaiveDate, Utc};
use serde_json::{json, Value};
use tower::ServiceExt;

use bibliotheque::{
    api,
    config::{AppConfig, StorageBackend},
    models::BookInput,
    repository::Repository,
    AppState,
};

async fn app() -> (Router, AppState) {
    let mut config = AppConfig::default();
    config.storage.backend = StorageBackend::Memory;
    let state = AppState::new(config, Repository::in_memory());
    let today = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
    state.services.fixtures.load(today).await.unwrap();
    (api::router(state.clone()), state)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn health_and_readiness() {
    let (app, _) = app().await;

    let (status, body) = send(&app, "GET", "/api/v1/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, body) = send(&app, "GET", "/api/v1/ready", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
    assert_eq!(body["storage"], "memory");
}

#[tokio::test]
async fn stats_summary() {
    let (app, _) = app().await;
    let (status, body) = send(&app, "GET", "/api/v1/stats", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_books"], 15);
    assert_eq!(body["available_books"], 12);
    assert_eq!(body["borrowed_books"], 3);
    assert_eq!(body["open_loans"], 3);
}

#[tokio::test]
async fn book_search_and_lenient_page() {
    let (app, _) = app().await;

    let (status, body) = send(&app, "GET", "/api/v1/books?q=9780451524935", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_count"], 1);
    assert_eq!(body["items"][0]["title"], "1984");
    assert_eq!(body["items"][0]["available"], false);

    let (status, body) = send(&app, "GET", "/api/v1/books?page=abc", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["page"], 1);
    assert_eq!(body["page_size"], 10);

    let (_, body) = send(&app, "GET", "/api/v1/books?page=50", None).await;
    assert_eq!(body["page"], 2);
    assert_eq!(body["items"].as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn book_crud() {
    let (app, _) = app().await;

    let (status, created) = send(
        &app,
        "POST",
        "/api/v1/books",
        Some(json!({"title": "Candide", "author": "Voltaire", "isbn": "9782253098065"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = created["id"].as_i64().unwrap();

    let (status, body) = send(&app, "GET", &format!("/api/v1/books/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Candide");
    assert_eq!(body["available"], true);
    assert_eq!(body["loan_count"], 0);

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/api/v1/books/{}", id),
        Some(json!({"title": "Candide ou l'Optimisme", "author": "Voltaire", "isbn": "9782253098065"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Candide ou l'Optimisme");

    let (status, _) = send(&app, "DELETE", &format!("/api/v1/books/{}", id), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(&app, "GET", &format!("/api/v1/books/{}", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "NoSuchData");
    assert_eq!(body["code"], 20);
}

#[tokio::test]
async fn book_validation_errors() {
    let (app, _) = app().await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/books",
        Some(json!({"title": "Candide", "author": ""})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "MissingField");

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/books",
        Some(json!({"title": "Copy", "author": "Someone", "isbn": "9780451524935"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "DuplicateIsbn");

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/books",
        Some(json!({"title": "Long", "author": "Someone", "isbn": "97804515249350000"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "BadValue");
}

#[tokio::test]
async fn loan_lifecycle_over_http() {
    let (app, state) = app().await;
    let page = state
        .services
        .catalog
        .list_books(Some("9782070360420"), 1)
        .await
        .unwrap();
    let book_id = page.items[0].id;

    let (status, loan) = send(&app, "POST", "/api/v1/loans", Some(json!({"book_id": book_id}))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(loan["loan_date"], Utc::now().date_naive().to_string());
    assert!(loan["return_date"].is_null());
    let loan_id = loan["id"].as_i64().unwrap();

    let (status, body) = send(&app, "POST", "/api/v1/loans", Some(json!({"book_id": book_id}))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "BookUnavailable");

    let (status, body) = send(&app, "GET", &format!("/api/v1/loans/{}", loan_id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["book"]["title"], "La Peste");
    assert_eq!(body["is_open"], true);

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/v1/loans/{}/return", loan_id),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "MissingField");

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/v1/loans/{}/return", loan_id),
        Some(json!({"return_date": "2024-07-01"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["return_date"], "2024-07-01");

    let (status, _) = send(&app, "DELETE", &format!("/api/v1/loans/{}", loan_id), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, "DELETE", &format!("/api/v1/loans/{}", loan_id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn loan_creation_needs_a_book() {
    let (app, _) = app().await;

    let (status, body) = send(&app, "POST", "/api/v1/loans", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "MissingField");

    let (status, _) = send(&app, "POST", "/api/v1/loans", Some(json!({"book_id": 99999}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn loan_list_filters() {
    let (app, _) = app().await;

    let (status, body) = send(&app, "GET", "/api/v1/loans?filter=open", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_count"], 3);
    assert_eq!(body["filter"], "open");
    assert_eq!(body["page_size"], 15);
    // most recent loan date first: 1984 (5 days), Seigneur (3 days), Harry Potter (10 days)
    assert_eq!(body["items"][0]["book"]["title"], "Le Seigneur des Anneaux");

    let (_, body) = send(&app, "GET", "/api/v1/loans?filter=closed", None).await;
    assert_eq!(body["total_count"], 7);
    assert!(body["items"]
        .as_array()
        .unwrap()
        .iter()
        .all(|l| !l["return_date"].is_null()));

    let (_, body) = send(&app, "GET", "/api/v1/loans?page=9999", None).await;
    assert_eq!(body["total_count"], 10);
    assert_eq!(body["page"], 1);

    let (status, body) = send(&app, "GET", "/api/v1/loans?filter=late", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "BadValue");
}

#[tokio::test]
async fn openapi_document_is_served() {
    let (app, _) = app().await;
    let (status, body) = send(&app, "GET", "/api-docs/openapi.json", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/books"].is_object());
}

#[tokio::test]
async fn oversized_loan_page_is_the_last_page() {
    let (app, state) = app().await;
    let book = state
        .services
        .catalog
        .create_book(BookInput {
            title: Some("Notre-Dame de Paris".to_string()),
            author: Some("Victor Hugo".to_string()),
            isbn: Some("9782253009689".to_string()),
        })
        .await
        .unwrap();
    for day in 1..=8 {
        let loan_date = NaiveDate::from_ymd_opt(2024, 3, day).unwrap();
        let loan = state
            .services
            .loans
            .create_loan(book.id, Some(loan_date))
            .await
            .unwrap();
        state
            .services
            .loans
            .return_loan(loan.id, loan_date.succ_opt())
            .await
            .unwrap();
    }

    let (status, body) = send(&app, "GET", "/api/v1/loans?page=99999999999999999999", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_count"], 18);
    assert_eq!(body["total_pages"], 2);
    assert_eq!(body["page"], 2);
    assert_eq!(body["items"].as_array().unwrap().len(), 3);

    let (_, body) = send(&app, "GET", "/api/v1/loans?page=abc", None).await;
    assert_eq!(body["page"], 1);
}
