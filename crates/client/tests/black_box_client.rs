use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use axum::extract::{Path, Query, Request, State};
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use moderation_auth::SessionStore;
use moderation_client::{
    ApiClient, ApiError, ClientConfig, DetailState, ItemsResource, ListController, ListQuery,
    ListStatus, PageSize, UsersResource,
};
use moderation_core::{RegisterDraft, Slug};
use parking_lot::Mutex;
use serde_json::{Value, json};

// ─────────────────────────────────────────────────────────────────────────────
// Stub backend
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct Recorded {
    method: String,
    path: String,
    query: Option<String>,
    authorization: Option<String>,
}

#[derive(Default)]
struct Backend {
    requests: Mutex<Vec<Recorded>>,
    valid_access: Mutex<String>,
    fail_items: AtomicBool,
    reject_users: AtomicBool,
}

impl Backend {
    fn authorized(&self, headers: &HeaderMap) -> bool {
        let expected = format!("Bearer {}", self.valid_access.lock());
        headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v == expected)
    }
}

type Shared = Arc<Backend>;

fn detail(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "detail": message }))).into_response()
}

fn user_json(id: i64, username: &str, superuser: bool) -> Value {
    json!({
        "id": id,
        "username": username,
        "email": format!("{username}@example.com"),
        "is_active": true,
        "is_superuser": superuser,
        "created_at": "2024-01-01T12:00:00"
    })
}

fn item_json(n: i64) -> Value {
    json!({
        "id": n,
        "name": format!("Item {n}"),
        "slug": format!("item-{n}"),
        "rating": 4.5,
        "available": true,
        "created_at": "2024-02-01T08:30:00Z",
        "owner": user_json(1, "admin", true)
    })
}

async fn record(State(backend): State<Shared>, request: Request, next: Next) -> Response {
    backend.requests.lock().push(Recorded {
        method: request.method().to_string(),
        path: request.uri().path().to_string(),
        query: request.uri().query().map(str::to_string),
        authorization: request
            .headers()
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    });
    next.run(request).await
}

async fn token(State(backend): State<Shared>, Form(form): Form<HashMap<String, String>>) -> Response {
    if form.get("password").map(String::as_str) != Some("correct-horse") {
        return detail(StatusCode::UNAUTHORIZED, "Incorrect username or password");
    }
    *backend.valid_access.lock() = "access-1".to_string();
    Json(json!({
        "access_token": "access-1",
        "refresh_token": "refresh-1",
        "token_type": "bearer"
    }))
    .into_response()
}

async fn refresh(State(backend): State<Shared>, Json(body): Json<Value>) -> Response {
    if body["refresh_token"] != "refresh-1" {
        return detail(StatusCode::UNAUTHORIZED, "Could not validate refresh token");
    }
    *backend.valid_access.lock() = "access-2".to_string();
    Json(json!({ "access_token": "access-2", "refresh_token": "refresh-2" })).into_response()
}

async fn me(State(backend): State<Shared>, headers: HeaderMap) -> Response {
    if !backend.authorized(&headers) {
        return detail(StatusCode::UNAUTHORIZED, "Could not validate credentials");
    }
    Json(user_json(1, "admin", true)).into_response()
}

async fn register(Json(body): Json<Value>) -> Response {
    if body["username"] == "taken" {
        return detail(StatusCode::CONFLICT, "Username already registered");
    }
    let mut user = user_json(7, body["username"].as_str().unwrap_or_default(), false);
    user["email"] = body["email"].clone();
    (StatusCode::CREATED, Json(user)).into_response()
}

async fn list_items(
    State(backend): State<Shared>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if backend.fail_items.load(Ordering::SeqCst) {
        return detail(StatusCode::INTERNAL_SERVER_ERROR, "database unavailable");
    }
    let limit: i64 = params.get("limit").and_then(|v| v.parse().ok()).unwrap_or(20);
    let items: Vec<Value> = (1..=5.min(limit)).map(item_json).collect();
    Json(json!({ "items": items, "total": 5 })).into_response()
}

async fn get_item(Path(slug): Path<String>) -> Response {
    match slug.strip_prefix("item-").and_then(|n| n.parse::<i64>().ok()) {
        Some(n) if (1..=5).contains(&n) => Json(item_json(n)).into_response(),
        _ => detail(StatusCode::NOT_FOUND, "Item not found"),
    }
}

async fn list_users(State(backend): State<Shared>, headers: HeaderMap) -> Response {
    if backend.reject_users.load(Ordering::SeqCst) || !backend.authorized(&headers) {
        return detail(StatusCode::UNAUTHORIZED, "Could not validate credentials");
    }
    Json(json!({
        "users": [user_json(1, "admin", true), user_json(2, "bob", false)],
        "total": 2,
        "skip": 0,
        "limit": 20
    }))
    .into_response()
}

struct TestServer {
    base_url: String,
    backend: Shared,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        moderation_observability::init();

        let backend: Shared = Arc::new(Backend::default());
        let app = Router::new()
            .route("/health", get(|| async { StatusCode::OK }))
            .route("/auth/token", post(token))
            .route("/auth/refresh", post(refresh))
            .route("/auth/me", get(me))
            .route("/auth/register", post(register))
            .route("/api/v1/items/", get(list_items))
            .route("/api/v1/items/:slug", get(get_item))
            .route("/api/v1/users/", get(list_users))
            .layer(middleware::from_fn_with_state(backend.clone(), record))
            .with_state(backend.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, backend, handle }
    }

    fn client(&self, session: &SessionStore) -> ApiClient {
        let config = ClientConfig::new(&self.base_url).unwrap();
        ApiClient::new(config, session.clone()).unwrap()
    }

    fn requests_to(&self, path: &str) -> Vec<Recorded> {
        self.backend
            .requests
            .lock()
            .iter()
            .filter(|r| r.path == path)
            .cloned()
            .collect()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Session lifecycle
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn login_saves_tokens_then_profile() {
    let server = TestServer::spawn().await;
    let session = SessionStore::in_memory();
    let client = server.client(&session);

    let profile = client.auth().login("  admin ", "correct-horse").await.unwrap();

    assert_eq!(profile.username, "admin");
    assert!(session.is_logged_in());
    assert_eq!(session.access_token(), "access-1");
    assert_eq!(session.refresh_token(), "refresh-1");
    assert_eq!(session.user_profile(), Some(profile));

    let token_calls = server.requests_to("/auth/token");
    assert_eq!(token_calls.len(), 1);
    assert_eq!(token_calls[0].authorization, None);

    let me_calls = server.requests_to("/auth/me");
    assert_eq!(me_calls.len(), 1);
    assert_eq!(me_calls[0].authorization.as_deref(), Some("Bearer access-1"));
}

#[tokio::test]
async fn wrong_password_keeps_existing_session() {
    let server = TestServer::spawn().await;
    let session = SessionStore::in_memory();
    session.save_tokens("existing", "existing-refresh");
    let client = server.client(&session);

    let err = client.auth().login("admin", "nope").await.unwrap_err();

    assert_eq!(err, ApiError::Unauthorized(Some("Incorrect username or password".into())));
    assert_eq!(err.user_message("Login failed."), "Incorrect username or password");
    assert_eq!(session.access_token(), "existing");
    assert!(server.requests_to("/auth/refresh").is_empty());
}

#[tokio::test]
async fn register_reports_server_conflict() {
    let server = TestServer::spawn().await;
    let session = SessionStore::in_memory();
    let client = server.client(&session);

    let taken = RegisterDraft {
        username: "taken".into(),
        password: "long-enough".into(),
        email: String::new(),
    }
    .validate()
    .unwrap();
    let err = client.auth().register(&taken).await.unwrap_err();
    assert_eq!(err.status(), Some(409));
    assert_eq!(err.user_message("Registration failed."), "Username already registered");

    let fresh = RegisterDraft {
        username: "newbie".into(),
        password: "long-enough".into(),
        email: "newbie@example.com".into(),
    }
    .validate()
    .unwrap();
    let profile = client.auth().register(&fresh).await.unwrap();
    assert_eq!(profile.username, "newbie");
    assert_eq!(profile.email.as_deref(), Some("newbie@example.com"));
    assert!(!session.is_logged_in());
}

#[tokio::test]
async fn logout_clears_everything() {
    let server = TestServer::spawn().await;
    let session = SessionStore::in_memory();
    let client = server.client(&session);

    client.auth().login("admin", "correct-horse").await.unwrap();
    client.auth().logout();

    assert!(!session.is_logged_in());
    assert_eq!(session.refresh_token(), "");
    assert_eq!(session.user_profile(), None);
}

#[tokio::test]
async fn health_reports_connectivity() {
    let server = TestServer::spawn().await;
    let client = server.client(&SessionStore::in_memory());

    assert!(client.health().await);
    assert_eq!(server.requests_to("/health")[0].method, "HEAD");
}

// ─────────────────────────────────────────────────────────────────────────────
// 401 handling
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn expired_token_is_refreshed_once_and_request_retried() {
    let server = TestServer::spawn().await;
    let session = SessionStore::in_memory();
    session.save_tokens("stale", "refresh-1");
    let client = server.client(&session);
    let users = ListController::<UsersResource>::new(client);

    assert!(users.refresh().await);

    users.with_state(|q| {
        assert_eq!(q.status(), &ListStatus::Ready);
        assert_eq!(q.rows().len(), 2);
        assert_eq!(q.rows()[1].username, "bob");
    });
    assert_eq!(session.access_token(), "access-2");
    assert_eq!(session.refresh_token(), "refresh-2");

    let calls = server.requests_to("/api/v1/users/");
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].authorization.as_deref(), Some("Bearer stale"));
    assert_eq!(calls[1].authorization.as_deref(), Some("Bearer access-2"));
    assert_eq!(server.requests_to("/auth/refresh").len(), 1);
}

#[tokio::test]
async fn failed_refresh_signs_out() {
    let server = TestServer::spawn().await;
    let session = SessionStore::in_memory();
    session.save_tokens("stale", "revoked");
    let client = server.client(&session);
    let users = ListController::<UsersResource>::new(client);

    users.refresh().await;

    users.with_state(|q| {
        assert_eq!(q.status(), &ListStatus::Error("Could not validate credentials".into()));
        assert!(q.rows().is_empty());
    });
    assert!(!session.is_logged_in());
    assert_eq!(server.requests_to("/api/v1/users/").len(), 1);
}

#[tokio::test]
async fn missing_refresh_token_signs_out_without_refreshing() {
    let server = TestServer::spawn().await;
    let session = SessionStore::in_memory();
    session.save_tokens("stale", "");
    let client = server.client(&session);
    let users = ListController::<UsersResource>::new(client);

    users.refresh().await;

    users.with_state(|q| {
        assert_eq!(q.status(), &ListStatus::Error("Could not validate credentials".into()));
    });
    assert!(!session.is_logged_in());
    assert!(server.requests_to("/auth/refresh").is_empty());
    assert_eq!(server.requests_to("/api/v1/users/").len(), 1);
}

#[tokio::test]
async fn rejection_after_refresh_signs_out() {
    let server = TestServer::spawn().await;
    server.backend.reject_users.store(true, Ordering::SeqCst);
    let session = SessionStore::in_memory();
    session.save_tokens("stale", "refresh-1");
    let client = server.client(&session);

    let request = ListQuery::<UsersResource>::new().begin_fetch();
    let err = client.users().list(&request).await.unwrap_err();

    assert_eq!(err, ApiError::Unauthorized(Some("Could not validate credentials".into())));
    assert!(!session.is_logged_in());
    assert_eq!(session.refresh_token(), "");
    assert_eq!(server.requests_to("/auth/refresh").len(), 1);

    let calls = server.requests_to("/api/v1/users/");
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[1].authorization.as_deref(), Some("Bearer access-2"));
}

#[tokio::test]
async fn concurrent_rejections_share_one_refresh() {
    let server = TestServer::spawn().await;
    let session = SessionStore::in_memory();
    session.save_tokens("stale", "refresh-1");
    let client = server.client(&session);
    let first = ListController::<UsersResource>::new(client.clone());
    let second = ListController::<UsersResource>::new(client);

    let (a, b) = tokio::join!(first.refresh(), second.refresh());

    assert!(a && b);
    for controller in [&first, &second] {
        controller.with_state(|q| {
            assert_eq!(q.status(), &ListStatus::Ready);
            assert_eq!(q.rows().len(), 2);
        });
    }
    assert_eq!(session.access_token(), "access-2");
    assert_eq!(server.requests_to("/auth/refresh").len(), 1);
    assert_eq!(server.requests_to("/api/v1/users/").len(), 4);
}

// ─────────────────────────────────────────────────────────────────────────────
// Lists and detail views
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn items_first_page_request_and_render() {
    let server = TestServer::spawn().await;
    let client = server.client(&SessionStore::in_memory());
    let items = ListController::<ItemsResource>::new(client);

    assert!(items.refresh().await);

    let calls = server.requests_to("/api/v1/items/");
    assert_eq!(calls.len(), 1);
    assert_eq!(
        calls[0].query.as_deref(),
        Some("skip=0&limit=20&sort_field=name&sort_direction=desc")
    );
    assert_eq!(calls[0].authorization, None);

    items.with_state(|q| {
        assert_eq!(q.rows().len(), 5);
        assert_eq!(q.total(), 5);
        assert_eq!(q.displayed_rows_label(), "1-5 / 5");
        assert_eq!(q.rows()[0].owner.as_ref().map(|o| o.username.as_str()), Some("admin"));
    });
}

#[tokio::test]
async fn sort_and_page_size_changes_drive_the_next_request() {
    let server = TestServer::spawn().await;
    let session = SessionStore::in_memory();
    session.save_tokens("access-1", "refresh-1");
    let client = server.client(&session);
    let items = ListController::<ItemsResource>::new(client);

    assert!(items.sort_by("rating"));
    items.refresh().await;
    assert!(items.set_page_size(PageSize::Ten));
    items.refresh().await;
    assert!(!items.sort_by("description"));

    let queries: Vec<String> = server
        .requests_to("/api/v1/items/")
        .into_iter()
        .filter_map(|r| r.query)
        .collect();
    assert_eq!(
        queries,
        vec![
            "skip=0&limit=20&sort_field=rating&sort_direction=asc".to_string(),
            "skip=0&limit=10&sort_field=rating&sort_direction=asc".to_string(),
        ]
    );
    assert_eq!(
        server.requests_to("/api/v1/items/")[0].authorization.as_deref(),
        Some("Bearer access-1")
    );
}

#[tokio::test]
async fn server_error_empties_the_table() {
    let server = TestServer::spawn().await;
    let client = server.client(&SessionStore::in_memory());
    let items = ListController::<ItemsResource>::new(client);

    items.refresh().await;
    server.backend.fail_items.store(true, Ordering::SeqCst);
    items.refresh().await;

    items.with_state(|q| {
        assert_eq!(q.status(), &ListStatus::Error("database unavailable".into()));
        assert!(q.rows().is_empty());
        assert_eq!(q.total(), 0);
        assert_eq!(q.displayed_rows_label(), "0-0 / 0");
    });
}

#[tokio::test]
async fn missing_item_is_not_found_state() {
    let server = TestServer::spawn().await;
    let client = server.client(&SessionStore::in_memory());

    let missing = client.items().detail(&Slug::parse("no-such-item").unwrap()).await;
    assert_eq!(missing, DetailState::NotFound);

    let found = client.items().detail(&Slug::parse("item-3").unwrap()).await;
    let record = found.record().expect("item should load");
    assert_eq!(record.name, "Item 3");
    assert_eq!(record.rating, Some(4.5));
}
