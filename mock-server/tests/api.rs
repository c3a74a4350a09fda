use axum::http::{self, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use questlog_mock_server::{app, AuthResponse, LeaderboardEntry, Todo, TodoPatch, User};
use tower::ServiceExt;

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn request(method: &str, uri: &str, token: Option<&str>, body: &str) -> Request<String> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(http::header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(body.to_string()).unwrap()
}

async fn send(app: &Router, req: Request<String>) -> axum::response::Response {
    app.clone().oneshot(req).await.unwrap()
}

async fn error_message(response: axum::response::Response) -> String {
    let body: serde_json::Value = body_json(response).await;
    body["error"].as_str().unwrap().to_string()
}

async fn signup(app: &Router, username: &str) -> AuthResponse {
    let body = format!(r#"{{"username":"{username}","password":"pw"}}"#);
    let resp = send(app, request("POST", "/api/auth/signup", None, &body)).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    body_json(resp).await
}

async fn create(app: &Router, token: &str, body: &str) -> Todo {
    let resp = send(app, request("POST", "/api/todos", Some(token), body)).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    body_json(resp).await
}

// --- auth ---

#[tokio::test]
async fn signup_returns_token_and_fresh_user() {
    let app = app();
    let auth = signup(&app, "hero").await;

    assert!(!auth.token.is_empty());
    assert_eq!(auth.user.username, "hero");
    assert_eq!(auth.user.xp, 0);
    assert_eq!(auth.user.level, 1);
    assert_eq!(auth.user.rank, "Novice");
}

#[tokio::test]
async fn signup_rejects_taken_username() {
    let app = app();
    signup(&app, "hero").await;

    let resp = send(
        &app,
        request("POST", "/api/auth/signup", None, r#"{"username":"hero","password":"x"}"#),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_message(resp).await, "Username already taken");
}

#[tokio::test]
async fn login_with_wrong_password_is_rejected() {
    let app = app();
    signup(&app, "hero").await;

    let resp = send(
        &app,
        request("POST", "/api/auth/login", None, r#"{"username":"hero","password":"nope"}"#),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(error_message(resp).await, "Invalid credentials");
}

#[tokio::test]
async fn login_then_me() {
    let app = app();
    let created = signup(&app, "hero").await;

    let resp = send(
        &app,
        request("POST", "/api/auth/login", None, r#"{"username":"hero","password":"pw"}"#),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let auth: AuthResponse = body_json(resp).await;
    assert_eq!(auth.user.id, created.user.id);

    let resp = send(&app, request("GET", "/api/auth/me", Some(&auth.token), "")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let me: User = body_json(resp).await;
    assert_eq!(me, created.user);
}

#[tokio::test]
async fn me_without_token_is_401() {
    let app = app();
    let resp = send(&app, request("GET", "/api/auth/me", None, "")).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = send(&app, request("GET", "/api/auth/me", Some("bogus"), "")).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

// --- todos ---

#[tokio::test]
async fn list_todos_empty() {
    let app = app();
    let auth = signup(&app, "hero").await;

    let resp = send(&app, request("GET", "/api/todos", Some(&auth.token), "")).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let todos: Vec<Todo> = body_json(resp).await;
    assert!(todos.is_empty());
}

#[tokio::test]
async fn create_todo_keeps_fields_and_starts_pending() {
    let app = app();
    let auth = signup(&app, "hero").await;

    let todo = create(
        &app,
        &auth.token,
        r#"{"title":"Buy milk","category":"shopping","priority":"low"}"#,
    )
    .await;

    assert_eq!(todo.title, "Buy milk");
    assert_eq!(todo.category.as_deref(), Some("shopping"));
    assert_eq!(todo.priority.as_deref(), Some("low"));
    assert!(!todo.completed);
    assert!(!todo.time.is_empty());
}

#[tokio::test]
async fn create_todo_blank_title_is_400() {
    let app = app();
    let auth = signup(&app, "hero").await;

    let resp = send(&app, request("POST", "/api/todos", Some(&auth.token), r#"{"title":"  "}"#)).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_message(resp).await, "Title is required");
}

#[tokio::test]
async fn create_todo_malformed_json_returns_422() {
    let app = app();
    let auth = signup(&app, "hero").await;

    let resp = send(&app, request("POST", "/api/todos", Some(&auth.token), r#"{"not_title":1}"#)).await;

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn todos_are_private_and_newest_first() {
    let app = app();
    let alice = signup(&app, "alice").await;
    let bob = signup(&app, "bob").await;

    create(&app, &alice.token, r#"{"title":"first"}"#).await;
    create(&app, &alice.token, r#"{"title":"second"}"#).await;
    create(&app, &bob.token, r#"{"title":"bob's"}"#).await;

    let resp = send(&app, request("GET", "/api/todos", Some(&alice.token), "")).await;
    let todos: Vec<Todo> = body_json(resp).await;
    let titles: Vec<_> = todos.iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, ["second", "first"]);

    let alices = todos[0].id;
    let resp = send(
        &app,
        request("DELETE", &format!("/api/todos/{alices}"), Some(&bob.token), ""),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn update_todo_bad_uuid_returns_400() {
    let app = app();
    let auth = signup(&app, "hero").await;

    let resp = send(
        &app,
        request("PATCH", "/api/todos/not-a-uuid", Some(&auth.token), r#"{"completed":true}"#),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn update_todo_not_found() {
    let app = app();
    let auth = signup(&app, "hero").await;

    let resp = send(
        &app,
        request(
            "PATCH",
            "/api/todos/00000000-0000-0000-0000-000000000000",
            Some(&auth.token),
            r#"{"title":"Nope"}"#,
        ),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(error_message(resp).await, "Todo not found");
}

#[tokio::test]
async fn completing_awards_xp_and_reopening_takes_it_back() {
    let app = app();
    let auth = signup(&app, "hero").await;
    let todo = create(&app, &auth.token, r#"{"title":"Walk dog"}"#).await;
    let uri = format!("/api/todos/{}", todo.id);

    let resp = send(&app, request("PATCH", &uri, Some(&auth.token), r#"{"completed":true}"#)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let patch: TodoPatch = body_json(resp).await;
    assert!(patch.todo.completed);
    assert_eq!(patch.todo.title, "Walk dog");
    assert_eq!(patch.xp, 10);
    assert_eq!(patch.streak, 1);

    // same value again is not a second completion
    let resp = send(&app, request("PATCH", &uri, Some(&auth.token), r#"{"completed":true}"#)).await;
    let patch: TodoPatch = body_json(resp).await;
    assert_eq!(patch.xp, 10);

    let resp = send(&app, request("PATCH", &uri, Some(&auth.token), r#"{"completed":false}"#)).await;
    let patch: TodoPatch = body_json(resp).await;
    assert!(!patch.todo.completed);
    assert_eq!(patch.xp, 0);

    let resp = send(&app, request("GET", "/api/auth/me", Some(&auth.token), "")).await;
    let me: User = body_json(resp).await;
    assert_eq!(me.xp, 0);
    assert_eq!(me.streak, 1);
}

#[tokio::test]
async fn partial_update_keeps_other_fields() {
    let app = app();
    let auth = signup(&app, "hero").await;
    let todo = create(
        &app,
        &auth.token,
        r#"{"title":"Read","note":"ch. 3","category":"study","priority":"high"}"#,
    )
    .await;
    let uri = format!("/api/todos/{}", todo.id);

    let resp = send(&app, request("PATCH", &uri, Some(&auth.token), r#"{"priority":"low"}"#)).await;
    let patch: TodoPatch = body_json(resp).await;

    assert_eq!(patch.todo.title, "Read");
    assert_eq!(patch.todo.note.as_deref(), Some("ch. 3"));
    assert_eq!(patch.todo.category.as_deref(), Some("study"));
    assert_eq!(patch.todo.priority.as_deref(), Some("low"));
}

#[tokio::test]
async fn delete_todo_lifecycle() {
    let app = app();
    let auth = signup(&app, "hero").await;
    let todo = create(&app, &auth.token, r#"{"title":"Walk dog"}"#).await;
    let uri = format!("/api/todos/{}", todo.id);

    let resp = send(&app, request("DELETE", &uri, Some(&auth.token), "")).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert!(body_bytes(resp).await.is_empty());

    let resp = send(&app, request("DELETE", &uri, Some(&auth.token), "")).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = send(&app, request("GET", "/api/todos", Some(&auth.token), "")).await;
    let todos: Vec<Todo> = body_json(resp).await;
    assert!(todos.is_empty());
}

// --- leaderboard ---

#[tokio::test]
async fn leaderboard_orders_by_xp() {
    let app = app();
    let alice = signup(&app, "alice").await;
    let bob = signup(&app, "bob").await;

    let todo = create(&app, &bob.token, r#"{"title":"quest"}"#).await;
    send(
        &app,
        request(
            "PATCH",
            &format!("/api/todos/{}", todo.id),
            Some(&bob.token),
            r#"{"completed":true}"#,
        ),
    )
    .await;

    let resp = send(&app, request("GET", "/api/leaderboard", Some(&alice.token), "")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let rows: Vec<LeaderboardEntry> = body_json(resp).await;
    let names: Vec<_> = rows.iter().map(|r| r.username.as_str()).collect();
    assert_eq!(names, ["bob", "alice"]);
    assert_eq!(rows[0].xp, 10);
}

#[tokio::test]
async fn leaderboard_requires_token() {
    let app = app();
    let resp = send(&app, request("GET", "/api/leaderboard", None, "")).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}
