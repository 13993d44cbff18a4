//! The REST surface, driven through the router without binding a socket.

use api_lib::adapters::MemoryAdapter;
use api_lib::config::Config;
use api_lib::web::rest::{
    ClaimProgressResponse, LegacyImportResponse, ParticipantResponse, RecipientResponse,
    SetHiddenResponse, ShareableLinkResponse,
};
use api_lib::web::{api_router, AppState};
use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tower::ServiceExt;

fn app() -> Router {
    let config = Arc::new(Config::local());
    api_router(Arc::new(AppState::new(Arc::new(MemoryAdapter::new()), config)))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Vec<u8>) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, bytes.to_vec())
}

fn parse<T: DeserializeOwned>(bytes: &[u8]) -> T {
    serde_json::from_slice(bytes).unwrap()
}

async fn create_recipient(app: &Router, name: &str) -> RecipientResponse {
    let (status, body) = send(app, Method::POST, "/recipients", Some(json!({ "name": name }))).await;
    assert_eq!(status, StatusCode::CREATED);
    parse(&body)
}

#[tokio::test]
async fn health_is_ok() {
    let (status, _) = send(&app(), Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn recipient_lifecycle() {
    let app = app();
    let recipient = create_recipient(&app, "  Sarah bat Rivka ").await;
    assert_eq!(recipient.name, "Sarah bat Rivka");
    assert!(!recipient.hidden);

    let uri = format!("/recipients/{}/hidden", recipient.id);
    let (status, body) = send(&app, Method::PUT, &uri, Some(json!({ "hidden": true }))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(parse::<SetHiddenResponse>(&body).success);

    let (_, body) = send(&app, Method::GET, "/recipients", None).await;
    assert!(parse::<Vec<RecipientResponse>>(&body).is_empty());

    let (_, body) = send(&app, Method::GET, "/recipients?include_hidden=true", None).await;
    let all: Vec<RecipientResponse> = parse(&body);
    assert_eq!(all.len(), 1);
    assert!(all[0].hidden);

    let (status, body) = send(&app, Method::GET, &format!("/recipients/{}", recipient.id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(parse::<RecipientResponse>(&body).id, recipient.id);
}

#[tokio::test]
async fn blank_recipient_name_is_bad_request() {
    let (status, _) = send(&app(), Method::POST, "/recipients", Some(json!({ "name": "   " }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_recipient_is_not_found() {
    let app = app();
    let id = uuid::Uuid::new_v4();

    let (status, _) = send(&app, Method::GET, &format!("/recipients/{}", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let uri = format!("/recipients/{}/hidden", id);
    let (status, _) = send(&app, Method::PUT, &uri, Some(json!({ "hidden": true }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let uri = format!("/recipients/{}/participants", id);
    let body = json!({ "name": "Dana", "psalm_numbers": [1] });
    let (status, _) = send(&app, Method::POST, &uri, Some(body)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn shareable_link_uses_public_origin() {
    let app = app();
    let recipient = create_recipient(&app, "Moshe ben Leah").await;

    let (_, body) = send(&app, Method::GET, &format!("/recipients/{}/link", recipient.id), None).await;

    assert_eq!(
        parse::<ShareableLinkResponse>(&body).url,
        format!("http://localhost:3000/pray-for/{}", recipient.id)
    );
}

#[tokio::test]
async fn sign_up_flow_updates_counts_and_roster() {
    let app = app();
    let recipient = create_recipient(&app, "Chana bat Sarah").await;
    let participants_uri = format!("/recipients/{}/participants", recipient.id);

    let (_, body) = send(&app, Method::GET, &format!("/recipients/{}/counts", recipient.id), None).await;
    let counts: BTreeMap<String, u32> = parse(&body);
    assert_eq!(counts.len(), 150);
    assert!(counts.values().all(|&c| c == 0));

    let submission = json!({ "name": " Dana ", "psalm_numbers": [12, 12, 45] });
    let (status, body) = send(&app, Method::POST, &participants_uri, Some(submission)).await;
    assert_eq!(status, StatusCode::CREATED);
    let participant: ParticipantResponse = parse(&body);
    assert_eq!(participant.name, "Dana");
    assert_eq!(participant.psalm_numbers, vec![12, 45]);

    let (_, body) = send(&app, Method::GET, &format!("/recipients/{}/counts", recipient.id), None).await;
    let counts: BTreeMap<String, u32> = parse(&body);
    assert_eq!(counts["12"], 1);
    assert_eq!(counts["45"], 1);
    assert_eq!(counts.values().sum::<u32>(), 2);

    let (_, body) = send(&app, Method::GET, &format!("/recipients/{}/claimed", recipient.id), None).await;
    assert_eq!(parse::<Vec<u8>>(&body), vec![12, 45]);

    let (_, body) = send(&app, Method::GET, &participants_uri, None).await;
    let roster: Vec<ParticipantResponse> = parse(&body);
    assert_eq!(roster.len(), 1);
    assert_eq!(roster[0].id, participant.id);

    let (_, body) = send(&app, Method::GET, &format!("/recipients/{}/progress", recipient.id), None).await;
    let progress: ClaimProgressResponse = parse(&body);
    assert_eq!(progress.claimed, 2);
    assert_eq!(progress.unclaimed, 148);
    assert_eq!(progress.participants, 1);
}

#[tokio::test]
async fn invalid_submissions_are_bad_requests() {
    let app = app();
    let recipient = create_recipient(&app, "Yosef ben Miriam").await;
    let uri = format!("/recipients/{}/participants", recipient.id);

    for body in [
        json!({ "name": "", "psalm_numbers": [1] }),
        json!({ "name": "Dana", "psalm_numbers": [] }),
        json!({ "name": "Dana", "psalm_numbers": [151] }),
    ] {
        let (status, _) = send(&app, Method::POST, &uri, Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    let (_, body) = send(&app, Method::GET, &uri, None).await;
    assert!(parse::<Vec<ParticipantResponse>>(&body).is_empty());
}

#[tokio::test]
async fn legacy_import_endpoint_records_participants() {
    let app = app();
    let recipient = create_recipient(&app, "Devorah bat Yaakov").await;
    let uri = format!("/recipients/{}/legacy-import", recipient.id);
    let legacy = json!([
        { "id": "abc", "name": "Dana", "psalmNumber": 1, "timestamp": "2024-01-01T00:00:00.000Z" },
        { "id": "def", "name": "Avi", "psalmNumbers": [1, 2] }
    ]);

    let (status, body) = send(&app, Method::POST, &uri, Some(legacy)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(parse::<LegacyImportResponse>(&body).imported, 2);

    let (status, _) = send(&app, Method::POST, &uri, Some(json!({ "not": "an array" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = send(&app, Method::GET, &format!("/recipients/{}/counts", recipient.id), None).await;
    let counts: BTreeMap<String, u32> = parse(&body);
    assert_eq!(counts["1"], 2);
    assert_eq!(counts["2"], 1);
}
