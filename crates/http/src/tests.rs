//! Router tests driving the JSON API with a scripted generator.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode};
use dqbot_core::Turn;
use dqbot_llm::{GenerationParams, LlmError, TextGenerator};
use dqbot_service::{ConversationGateway, ReportingService, RunPipeline};
use dqbot_storage::{AssertionStore, Database, HistoryStore};
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt as _;

use crate::{AppState, SessionRegistry, create_router};

struct Scripted(Mutex<VecDeque<String>>);

#[async_trait]
impl TextGenerator for Scripted {
    async fn generate(&self, _turns: &[Turn], _params: &GenerationParams) -> Result<String, LlmError> {
        self.0.lock().unwrap().pop_front().ok_or(LlmError::EmptyResponse)
    }
}

fn app(replies: &[&str]) -> (TempDir, Arc<AppState>) {
    app_with_sessions(replies, SessionRegistry::new("schema"))
}

fn app_with_sessions(replies: &[&str], sessions: SessionRegistry) -> (TempDir, Arc<AppState>) {
    let dir = TempDir::new().unwrap();
    let db = Arc::new(Database::open(&dir.path().join("crm.db")).unwrap());
    db.execute_batch(
        "CREATE TABLE customers (id INTEGER PRIMARY KEY, email TEXT);
         INSERT INTO customers (id, email) VALUES (1, 'a@x.io'), (2, NULL);",
    )
    .unwrap();
    let store = AssertionStore::new(dir.path().join("generated"));
    let pipeline = Arc::new(RunPipeline::for_database(store.clone(), Arc::clone(&db), 2));
    let generator = Arc::new(Scripted(Mutex::new(replies.iter().map(|r| (*r).to_owned()).collect())));
    let gateway = ConversationGateway::new(generator, store.clone(), Arc::clone(&pipeline));
    let state = Arc::new(AppState {
        gateway: Arc::new(gateway),
        sessions,
        pipeline,
        reporting: ReportingService::new(db as Arc<dyn HistoryStore>),
        store,
    });
    (dir, state)
}

async fn call(state: &Arc<AppState>, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(json.to_string())
        },
        None => Body::empty(),
    };
    let response = create_router(Arc::clone(state)).oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
    (status, value)
}

#[tokio::test]
async fn health_and_version() {
    let (_dir, state) = app(&[]);
    let (status, body) = call(&state, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("ok".to_owned()));

    let (status, body) = call(&state, Method::GET, "/api/version", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn chat_save_flow_over_http() {
    let sql = "SELECT id, CASE WHEN email IS NULL THEN 'FAIL' ELSE 'PASS' END AS test_result FROM customers";
    let fenced = format!("```sql\n{sql}\n```");
    let (_dir, state) = app(&["Check for NULL emails.", &fenced]);

    let (status, body) = call(&state, Method::POST, "/chat", Some(json!({"message": "ideas?"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["kind"], "assistant");
    let session_id = body["session_id"].as_str().unwrap().to_owned();

    let (_, body) =
        call(&state, Method::POST, "/chat", Some(json!({"message": "save test", "session_id": session_id}))).await;
    assert_eq!(body["kind"], "awaiting_name");
    assert_eq!(body["state"], "awaiting_name");

    let (_, body) =
        call(&state, Method::POST, "/chat", Some(json!({"message": "emails", "session_id": session_id}))).await;
    assert_eq!(body["kind"], "saved");
    assert_eq!(body["state"], "chatting");

    let (_, ids) = call(&state, Method::GET, "/api/ids", None).await;
    assert_eq!(ids, json!(["emails"]));

    let (_, rows) = call(&state, Method::GET, "/api/data?ids=emails", None).await;
    assert_eq!(rows[0]["sql_query_id"], "emails");
    assert_eq!(rows[0]["PASS"], 1);
    assert_eq!(rows[0]["FAIL"], 1);
    assert_eq!(rows[0]["pass_rate"], 0.5);

    let (_, listed) = call(&state, Method::GET, "/api/assertions", None).await;
    assert_eq!(listed[0]["body"], sql);
}

#[tokio::test]
async fn exit_closes_the_session() {
    let (_dir, state) = app(&["hi"]);
    let (_, body) = call(&state, Method::POST, "/chat", Some(json!({"message": "hello"}))).await;
    let session_id = body["session_id"].as_str().unwrap().to_owned();

    let (_, body) =
        call(&state, Method::POST, "/chat", Some(json!({"message": "quit", "session_id": session_id}))).await;
    assert_eq!(body["kind"], "exit");
    assert_eq!(state.sessions.count().await, 0);

    let (status, _) =
        call(&state, Method::POST, "/chat", Some(json!({"message": "hello", "session_id": session_id}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn generation_failure_is_bad_gateway() {
    let (_dir, state) = app(&[]);
    let (status, body) = call(&state, Method::POST, "/chat", Some(json!({"message": "hello"}))).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["error"].as_str().unwrap().contains("empty response"));
    assert!(body.get("session_id").is_none());
    assert_eq!(state.sessions.count().await, 0);
}

#[tokio::test]
async fn failed_turn_keeps_an_existing_session() {
    let (_dir, state) = app(&["hi"]);
    let (_, body) = call(&state, Method::POST, "/chat", Some(json!({"message": "hello"}))).await;
    let session_id = body["session_id"].as_str().unwrap().to_owned();

    let (status, _) =
        call(&state, Method::POST, "/chat", Some(json!({"message": "again", "session_id": session_id}))).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(state.sessions.count().await, 1);
    assert!(state.sessions.get(&session_id).await.is_some());
}

#[tokio::test]
async fn idle_sessions_are_evicted() {
    let sessions = SessionRegistry::new("schema").with_idle_ttl(Duration::ZERO);
    let (_dir, state) = app_with_sessions(&["one", "two"], sessions);

    let (_, first) = call(&state, Method::POST, "/chat", Some(json!({"message": "hello"}))).await;
    let (_, _second) = call(&state, Method::POST, "/chat", Some(json!({"message": "hello"}))).await;
    assert_eq!(state.sessions.count().await, 1);

    let (status, _) =
        call(&state, Method::POST, "/chat", Some(json!({"message": "back", "session_id": first["session_id"]}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    assert_eq!(state.sessions.evict_idle().await, 1);
    assert_eq!(state.sessions.count().await, 0);
}

#[tokio::test]
async fn blank_message_is_rejected() {
    let (_dir, state) = app(&[]);
    let (status, _) = call(&state, Method::POST, "/chat", Some(json!({"message": "  "}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn delete_unknown_session_is_not_found() {
    let (_dir, state) = app(&[]);
    let (status, body) = call(&state, Method::DELETE, "/chat/nope", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn run_endpoint_and_empty_reports() {
    let (_dir, state) = app(&[]);
    let (_, rows) = call(&state, Method::GET, "/api/data", None).await;
    assert_eq!(rows, json!([]));

    state.store.save("always", "SELECT 'PASS' AS test_result").unwrap();
    let (status, report) = call(&state, Method::POST, "/api/run", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["assertions_run"], 1);
    assert_eq!(report["records_written"], 2);

    let (status, _) = call(&state, Method::GET, "/api/data?order=sideways", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
