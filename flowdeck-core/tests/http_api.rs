//! HttpApi against an in-process stub of the catalogue server

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use flowdeck_core::filters::{CategoryFilter, ComplexityFilter, TriggerFilter};
use flowdeck_core::loader::{execute, LoadKind};
use flowdeck_core::{Complexity, Controller, DeckError, HttpApi, TriggerType, ViewState, WorkflowApi};
use serde_json::{json, Value};
use tokio::net::TcpListener;

#[derive(Clone, Default)]
struct Stub {
    requests: Arc<Mutex<Vec<HashMap<String, String>>>>,
}

const RECORDS: usize = 130;

fn record(i: usize) -> Value {
    json!({
        "filename": format!("{:04}_flow.json", i),
        "name": format!("Flow {}", i),
        "description": "stub",
        "active": i % 2 == 0,
        "trigger_type": "Webhook",
        "complexity": "low",
        "node_count": 3,
        "integrations": ["Slack"],
    })
}

async fn workflows(State(stub): State<Stub>, Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    stub.requests.lock().unwrap().push(params.clone());
    let page: usize = params.get("page").and_then(|p| p.parse().ok()).unwrap_or(1);
    let per_page: usize = params.get("per_page").and_then(|p| p.parse().ok()).unwrap_or(20);
    let start = (page - 1) * per_page;
    let items: Vec<Value> = (start..RECORDS.min(start + per_page)).map(record).collect();
    Json(json!({
        "workflows": items,
        "total": RECORDS,
        "pages": RECORDS.div_ceil(per_page),
    }))
}

async fn workflow_detail(Path(filename): Path<String>) -> impl IntoResponse {
    if filename == "missing.json" {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({"error": "not_found", "message": "Workflow not found", "code": "E404"})),
        );
    }
    if filename == "hostile.json" {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "error": true,
                "message": "\u{1b}]52;c;aGk=\u{07}boom\u{1b}[2J",
                "code": "E500",
            })),
        );
    }
    if filename == "invalid.json" {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({"error": true, "details": {"q": "too long"}})),
        );
    }
    (
        StatusCode::OK,
        Json(json!({
            "filename": filename,
            "raw_json": "{\"nodes\":[{\"name\":\"Start\"}]}",
        })),
    )
}

async fn diagram(Path(filename): Path<String>) -> Json<Value> {
    Json(json!({ "diagram": format!("graph TD\n  A[{}] --> B", filename) }))
}

async fn download(Path(filename): Path<String>) -> String {
    format!("{{\"file\":\"{}\"}}", filename)
}

async fn spawn_stub() -> (String, Stub) {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let stub = Stub::default();
    let app = Router::new()
        .route("/api/categories", get(|| async { Json(json!({"categories": ["Sales", "Ops"]})) }))
        .route(
            "/api/category-mappings",
            get(|| async {
                Json(json!({"mappings": {"0003_flow.json": "Sales", "0120_flow.json": "Sales", "0004_flow.json": ""}}))
            }),
        )
        .route(
            "/api/stats",
            get(|| async {
                Json(json!({
                    "total": RECORDS,
                    "active": 65,
                    "total_nodes": 390,
                    "unique_integrations": 1,
                    "triggers": {"Webhook": RECORDS},
                }))
            }),
        )
        .route("/api/workflows", get(workflows))
        .route("/api/workflows/{filename}", get(workflow_detail))
        .route("/api/workflows/{filename}/diagram", get(diagram))
        .route("/api/workflows/{filename}/download", get(download))
        .with_state(stub.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (format!("http://{addr}/api"), stub)
}

#[tokio::test]
async fn test_listing_sends_filter_params() {
    let (base, stub) = spawn_stub().await;
    let api = HttpApi::new(&base).unwrap();

    let mut controller = Controller::default();
    let ticket = controller
        .update_filters(|f| {
            f.query = "slack".to_string();
            f.trigger = TriggerFilter::Only(TriggerType::Webhook);
            f.complexity = ComplexityFilter::Only(Complexity::Low);
            f.active_only = true;
        })
        .unwrap();
    let response = execute(&api, &ticket, controller.category_map()).await;
    controller.apply(ticket.token, ticket.kind, response);

    assert_eq!(controller.workflows().len(), 20);
    assert_eq!(controller.total(), RECORDS);
    assert!(controller.can_load_more());

    let requests = stub.requests.lock().unwrap();
    let sent = &requests[0];
    assert_eq!(sent.get("q").map(String::as_str), Some("slack"));
    assert_eq!(sent.get("trigger").map(String::as_str), Some("Webhook"));
    assert_eq!(sent.get("complexity").map(String::as_str), Some("low"));
    assert_eq!(sent.get("active_only").map(String::as_str), Some("true"));
    assert_eq!(sent.get("page").map(String::as_str), Some("1"));
    assert_eq!(sent.get("per_page").map(String::as_str), Some("20"));
}

#[tokio::test]
async fn test_initial_load_then_category_walk() {
    let (base, stub) = spawn_stub().await;
    let api = HttpApi::new(&base).unwrap();
    let mut controller = Controller::default();

    let ticket = controller.begin_initial().unwrap();
    assert_eq!(ticket.kind, LoadKind::Initial);
    let response = execute(&api, &ticket, controller.category_map()).await;
    controller.apply(ticket.token, ticket.kind, response);
    assert_eq!(controller.categories(), ["Sales".to_string(), "Ops".to_string()]);
    assert_eq!(controller.stats().map(|s| s.active), Some(65));
    assert_eq!(controller.view_state(), &ViewState::Content);

    stub.requests.lock().unwrap().clear();
    let ticket = controller
        .update_filters(|f| f.category = CategoryFilter::Only("Sales".to_string()))
        .unwrap();
    let response = execute(&api, &ticket, controller.category_map()).await;
    controller.apply(ticket.token, ticket.kind, response);

    let names: Vec<&str> = controller
        .workflows()
        .iter()
        .map(|w| w.filename.as_str())
        .collect();
    assert_eq!(names, ["0003_flow.json", "0120_flow.json"]);
    assert_eq!(controller.total(), 2);
    assert!(!controller.can_load_more());

    let mut pages: Vec<(String, String)> = stub
        .requests
        .lock()
        .unwrap()
        .iter()
        .map(|r| (r["page"].clone(), r["per_page"].clone()))
        .collect();
    pages.sort();
    assert_eq!(
        pages,
        [("1".to_string(), "100".to_string()), ("2".to_string(), "100".to_string())]
    );
}

#[tokio::test]
async fn test_error_status_maps_to_http_error() {
    let (base, _) = spawn_stub().await;
    let api = HttpApi::new(&base).unwrap();

    match api.workflow_json("missing.json").await {
        Err(DeckError::Http { status, message, .. }) => {
            assert_eq!(status, 404);
            assert_eq!(message, "Workflow not found");
        }
        other => panic!("expected HTTP error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_error_message_is_sanitized_and_falls_back_to_details() {
    let (base, _) = spawn_stub().await;
    let api = HttpApi::new(&base).unwrap();

    match api.workflow_json("hostile.json").await {
        Err(DeckError::Http { status, message, .. }) => {
            assert_eq!(status, 500);
            assert_eq!(message, "boom");
        }
        other => panic!("expected HTTP error, got {:?}", other),
    }

    match api.workflow_json("invalid.json").await {
        Err(DeckError::Http { status, message, .. }) => {
            assert_eq!(status, 422);
            assert_eq!(message, r#"{"q":"too long"}"#);
        }
        other => panic!("expected HTTP error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_detail_endpoints() {
    let (base, _) = spawn_stub().await;
    let api = HttpApi::new(&base).unwrap();

    let raw = api.workflow_json("0001_flow.json").await.unwrap();
    assert_eq!(raw["nodes"][0]["name"], "Start");

    let diagram = api.workflow_diagram("0001_flow.json").await.unwrap();
    assert!(diagram.starts_with("graph TD"));

    let body = api.download("0001_flow.json").await.unwrap();
    assert_eq!(body, br#"{"file":"0001_flow.json"}"#);
}

#[tokio::test]
async fn test_unreachable_server_is_network_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let api = HttpApi::new(format!("http://{addr}/api")).unwrap();
    let err = api.stats().await.unwrap_err();
    assert!(matches!(err, DeckError::Network { .. }));
    assert!(err.is_remote());
}
