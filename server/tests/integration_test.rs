//! Integration tests for the Publikator server
//!
//! These tests drive the HTTP router end to end against a file-backed
//! database:
//! - Authentication and permission checks
//! - Monitoring creation and the error envelope
//! - Answer submission and progress views

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use publikator::app::AppState;
use publikator::config::{Settings, PERM_ADD_MONITORING, PERM_CHANGE_MONITORING};
use publikator::database::{create_pool, Repository, User};
use publikator::routes::create_router;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

struct TestApp {
    router: Router,
    repo: Repository,
    _temp: TempDir,
}

/// Helper to create a router over a fresh database
async fn create_test_app() -> TestApp {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.db");

    let pool = create_pool(&db_path).await.unwrap();
    let state = AppState::new(pool, &Settings::default());

    TestApp {
        router: create_router(state.clone()),
        repo: state.repo,
        _temp: temp_dir,
    }
}

async fn send(
    app: &TestApp,
    method: &str,
    uri: &str,
    user: Option<&User>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header("x-user-id", user.id.to_string());
    }
    let body = match body {
        Some(value) => {
            builder = builder.header("content-type", "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .router
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).to_string()))
    };

    (status, value)
}

/// An editor allowed to create and change monitorings
async fn editor(app: &TestApp) -> User {
    let user = app.repo.create_user("editor", false).await.unwrap();
    app.repo.grant_permission(user.id, PERM_ADD_MONITORING).await.unwrap();
    app.repo.grant_permission(user.id, PERM_CHANGE_MONITORING).await.unwrap();
    user
}

fn monitoring_definition() -> Value {
    json!({
        "name": "Budżet obywatelski",
        "description": "<p>Participatory budget</p>",
        "active": true,
        "max_point": 2,
        "questions": [
            {"name": "Who decides?", "type": "short_text"},
            {
                "name": "Is the vote online?",
                "type": "choice",
                "options": [{"key": "yes", "value": "Yes"}, {"key": "no", "value": "No"}],
                "hideConditions": [{"type": "equals", "value": "Mayor", "target": 0}]
            }
        ]
    })
}

#[tokio::test]
async fn test_health() {
    let app = create_test_app().await;

    let (status, body) = send(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("OK".to_string()));
}

#[tokio::test]
async fn test_create_requires_user_and_permission() {
    let app = create_test_app().await;
    let viewer = app.repo.create_user("viewer", false).await.unwrap();

    let (status, body) =
        send(&app, "POST", "/monitorings", None, Some(monitoring_definition())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);

    let (status, _) = send(
        &app,
        "POST",
        "/monitorings",
        Some(&viewer),
        Some(monitoring_definition()),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_create_and_read_monitoring() {
    let app = create_test_app().await;
    let user = editor(&app).await;

    let (status, body) = send(
        &app,
        "POST",
        "/monitorings",
        Some(&user),
        Some(monitoring_definition()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true, "url": "/monitorings/budzet-obywatelski"}));

    let (status, detail) = send(&app, "GET", "/monitorings/budzet-obywatelski", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["owner"], "editor");
    assert_eq!(detail["questions"].as_array().unwrap().len(), 2);
    assert_eq!(detail["questions"][1]["options"].as_array().unwrap().len(), 2);
    assert_eq!(
        detail["questions"][1]["hideConditions"][0]["target_id"],
        detail["questions"][0]["id"]
    );

    let (_, listing) = send(&app, "GET", "/monitorings", None, None).await;
    assert_eq!(listing["results"][0]["started"], false);

    let (_, suggestions) = send(&app, "GET", "/monitorings/autocomplete?q=bud", None, None).await;
    assert_eq!(suggestions["results"][0]["slug"], "budzet-obywatelski");
}

#[tokio::test]
async fn test_error_envelopes() {
    let app = create_test_app().await;
    let user = editor(&app).await;

    let mut no_questions = monitoring_definition();
    no_questions["questions"] = json!([]);
    let (status, body) = send(&app, "POST", "/monitorings", Some(&user), Some(no_questions)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({"success": false, "error": "Questions are required. No questions provided"})
    );

    let mut bad_target = monitoring_definition();
    bad_target["questions"][1]["hideConditions"][0]["target"] = json!(5);
    let (status, body) = send(&app, "POST", "/monitorings", Some(&user), Some(bad_target)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Attempt to create reference to non-existent target.");

    let mut bad_question = monitoring_definition();
    bad_question["questions"][0]["name"] = json!("");
    let (status, body) = send(&app, "POST", "/monitorings", Some(&user), Some(bad_question)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"], json!([[["name", "This field is required."]], []]));

    let (status, body) =
        send(&app, "POST", "/monitorings", Some(&user), Some(json!({"name": "x"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0], json!(["description", "This field is required."]));

    let (status, body) = send(&app, "GET", "/monitorings/nope", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);

    // Nothing was persisted by the rejected requests
    let (_, listing) = send(&app, "GET", "/monitorings", None, None).await;
    assert!(listing["results"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_answer_flow() {
    let app = create_test_app().await;
    let user = editor(&app).await;
    let respondent = app.repo.create_user("respondent", false).await.unwrap();

    send(&app, "POST", "/monitorings", Some(&user), Some(monitoring_definition())).await;
    let (status, body) = send(
        &app,
        "POST",
        "/institutions",
        Some(&user),
        Some(json!({"name": "Urząd Miasta"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["url"], "/institutions/urzad-miasta");

    let (status, _) = send(
        &app,
        "POST",
        "/monitorings/budzet-obywatelski/assign",
        Some(&user),
        Some(json!({"institutions": ["urzad-miasta"]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, detail) = send(&app, "GET", "/monitorings/budzet-obywatelski", None, None).await;
    let first = detail["questions"][0]["id"].as_i64().unwrap();
    let second = detail["questions"][1]["id"].as_i64().unwrap();

    let answer_url = "/monitorings/budzet-obywatelski/institutions/urzad-miasta/answer";

    let partial = json!([{"question_id": first, "value": "Council"}]);
    let (status, body) = send(&app, "POST", answer_url, Some(&respondent), Some(partial)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], format!("Missing answer for question #{}", second));

    let answers = json!([
        {"question_id": first, "value": "Council"},
        {"question_id": second, "value": "yes"}
    ]);
    let (status, body) =
        send(&app, "POST", answer_url, Some(&respondent), Some(answers.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "success": true,
            "return_url": "/monitorings/budzet-obywatelski/institutions/urzad-miasta"
        })
    );

    let (status, body) = send(&app, "POST", answer_url, Some(&respondent), Some(answers)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Unable to answer twice");

    let (_, progress) =
        send(&app, "GET", "/monitorings/budzet-obywatelski/institutions", None, None).await;
    assert_eq!(progress["institutions"][0]["sheet_count"], 1);

    let (_, sheets) = send(
        &app,
        "GET",
        "/monitorings/budzet-obywatelski/institutions/urzad-miasta",
        Some(&user),
        None,
    )
    .await;
    assert_eq!(sheets["sheets"][0]["username"], "respondent");
    assert_eq!(sheets["sheets"][0]["answer_count"], 2);

    let (_, listing) = send(&app, "GET", "/monitorings", None, None).await;
    assert_eq!(listing["results"][0]["started"], true);
}

#[tokio::test]
async fn test_malformed_json_rejected() {
    let app = create_test_app().await;
    let user = editor(&app).await;

    let request = Request::builder()
        .method("POST")
        .uri("/monitorings")
        .header("x-user-id", user.id.to_string())
        .body(Body::from("{broken"))
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_institution_permissions() {
    let app = create_test_app().await;
    let user = app.repo.create_user("clerk", false).await.unwrap();
    let admin = app.repo.create_user("admin", true).await.unwrap();

    send(&app, "POST", "/institutions", Some(&user), Some(json!({"name": "Archive"}))).await;

    let (status, _) = send(&app, "DELETE", "/institutions/archive", Some(&user), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        &app,
        "PATCH",
        "/institutions/archive",
        Some(&admin),
        Some(json!({"name": "State Archive"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["url"], "/institutions/archive");

    let (status, _) = send(&app, "DELETE", "/institutions/archive", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, "GET", "/institutions/archive", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_duplicate_choice_keys_rejected() {
    let app = create_test_app().await;
    let user = editor(&app).await;

    let mut definition = monitoring_definition();
    definition["questions"][1]["options"] =
        json!([{"key": "yes", "value": "Yes"}, {"key": "yes", "value": "Sure"}]);
    let (status, body) = send(&app, "POST", "/monitorings", Some(&user), Some(definition)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["errors"][0], json!([]));
    assert_eq!(body["errors"][1][0][0], "key");

    let (status, _) = send(&app, "GET", "/monitorings/budzet-obywatelski", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_autocomplete_named_monitoring_stays_reachable() {
    let app = create_test_app().await;
    let user = editor(&app).await;

    let mut definition = monitoring_definition();
    definition["name"] = json!("Autocomplete");
    let (status, body) = send(&app, "POST", "/monitorings", Some(&user), Some(definition)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["url"], "/monitorings/autocomplete-2");

    let (status, detail) = send(&app, "GET", "/monitorings/autocomplete-2", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["name"], "Autocomplete");
}
