//! Group lookups against a stub identity service

mod common;

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode, Uri},
    response::IntoResponse,
    routing::get,
    Router,
};
use common::*;
use projgrant::*;

#[derive(Clone, Default)]
struct Seen {
    requests: Arc<Mutex<Vec<(String, Option<String>, Option<String>)>>>,
}

impl Seen {
    fn record(&self, uri: &Uri, headers: &HeaderMap) {
        let h = |n: &str| headers.get(n).and_then(|v| v.to_str().ok()).map(String::from);
        self.requests
            .lock()
            .unwrap()
            .push((uri.path().to_string(), h("x-service-token"), h("content-type")));
    }

    fn all(&self) -> Vec<(String, Option<String>, Option<String>)> {
        self.requests.lock().unwrap().clone()
    }
}

async fn groups_ok(State(seen): State<Seen>, uri: Uri, headers: HeaderMap) -> impl IntoResponse {
    seen.record(&uri, &headers);
    axum::Json(serde_json::json!([
        { "group_id": "eng" },
        { "groupId": "ops" },
        { "id": "eng" },
        { "id": "" }
    ]))
}

async fn groups_500() -> impl IntoResponse {
    (StatusCode::INTERNAL_SERVER_ERROR, "boom")
}

async fn groups_slow() -> impl IntoResponse {
    tokio::time::sleep(Duration::from_millis(800)).await;
    axum::Json(serde_json::json!([{ "id": "late" }]))
}

async fn groups_garbage() -> impl IntoResponse {
    (StatusCode::OK, "<html>not json</html>")
}

async fn groups_object() -> impl IntoResponse {
    axum::Json(serde_json::json!({ "groups": [{ "id": "wrapped" }] }))
}

async fn spawn_stub() -> (SocketAddr, Seen) {
    let seen = Seen::default();
    let app = Router::new()
        .route("/ok/admin/users/:email/groups", get(groups_ok))
        .route("/fail/admin/users/:email/groups", get(groups_500))
        .route("/slow/admin/users/:email/groups", get(groups_slow))
        .route("/garbage/admin/users/:email/groups", get(groups_garbage))
        .route("/object/admin/users/:email/groups", get(groups_object))
        .with_state(seen.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
    (addr, seen)
}

fn client(base: Option<String>, token: Option<&str>) -> IdentityClient {
    IdentityClient::new(&Config {
        auth_url: base,
        service_token: token.map(String::from),
        lookup_timeout: Duration::from_millis(200),
        ..Config::default()
    })
    .unwrap()
}

#[tokio::test]
async fn resolves_and_normalizes_groups() {
    let (addr, seen) = spawn_stub().await;
    let c = client(Some(format!("http://{addr}/ok")), Some("s3cret"));
    let lookup = c.groups_for("Ann.Lee+ops@Example.com").await;
    assert_eq!(lookup, GroupLookup::Resolved(set(&["eng", "ops"])));

    let reqs = seen.all();
    assert_eq!(reqs.len(), 1);
    let (path, token, content_type) = &reqs[0];
    assert_eq!(path, "/ok/admin/users/ann.lee%2Bops%40example.com/groups");
    assert_eq!(token.as_deref(), Some("s3cret"));
    assert_eq!(content_type.as_deref(), Some("application/json"));
}

#[tokio::test]
async fn token_header_is_optional() {
    let (addr, seen) = spawn_stub().await;
    let c = client(Some(format!("http://{addr}/ok")), None);
    assert!(matches!(c.groups_for("a@b.c").await, GroupLookup::Resolved(_)));
    assert_eq!(seen.all()[0].1, None);
}

#[tokio::test]
async fn server_error_is_a_failure() {
    let (addr, _) = spawn_stub().await;
    let c = client(Some(format!("http://{addr}/fail")), None);
    assert_eq!(c.groups_for("a@b.c").await, GroupLookup::Failed(LookupFailure::Status(500)));
}

#[tokio::test]
async fn slow_service_times_out() {
    let (addr, _) = spawn_stub().await;
    let c = client(Some(format!("http://{addr}/slow")), None);
    let started = std::time::Instant::now();
    assert_eq!(c.groups_for("a@b.c").await, GroupLookup::Failed(LookupFailure::Timeout));
    assert!(started.elapsed() < Duration::from_millis(700));
}

#[tokio::test]
async fn malformed_payloads_are_failures() {
    let (addr, _) = spawn_stub().await;
    for route in ["garbage", "object"] {
        let c = client(Some(format!("http://{addr}/{route}")), None);
        assert!(
            matches!(c.groups_for("a@b.c").await, GroupLookup::Failed(LookupFailure::Malformed(_))),
            "{route}"
        );
    }
}

#[tokio::test]
async fn unreachable_service_is_a_failure() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let c = client(Some(format!("http://{addr}")), None);
    assert!(matches!(
        c.groups_for("a@b.c").await,
        GroupLookup::Failed(LookupFailure::Transport(_) | LookupFailure::Timeout)
    ));
}

#[tokio::test]
async fn unconfigured_service_is_a_failure() {
    let c = client(None, None);
    assert_eq!(c.groups_for("a@b.c").await, GroupLookup::Failed(LookupFailure::NotConfigured));
}

#[tokio::test]
async fn failing_service_still_allows_open_reads() {
    let (addr, _) = spawn_stub().await;
    let _g = setup();
    grant("P1", "eng", Role::Owner);
    let p = Principal::new("dev@example.com");
    for route in ["fail", "slow"] {
        let auth = Authorizer::new(
            client(Some(format!("http://{addr}/{route}")), None),
            LmdbGrants,
            PolicySource::Fixed(ReadPolicy::AllAuthenticated),
        );
        assert!(auth.authorize(Some(&p), "P1", Permission::ProjectRead).await.unwrap().allowed);

        let auth = auth.with_policy(PolicySource::Fixed(ReadPolicy::GroupsOnly));
        let d = auth.authorize(Some(&p), "P1", Permission::ProjectRead).await.unwrap();
        assert!(!d.allowed);
        assert_eq!(d.status_code, 403);
    }
}

#[tokio::test]
async fn looked_up_groups_grant_roles() {
    let (addr, _) = spawn_stub().await;
    let _g = setup();
    grant("P1", "ops", Role::Manager);
    let auth = Authorizer::new(
        client(Some(format!("http://{addr}/ok")), None),
        LmdbGrants,
        PolicySource::Fixed(ReadPolicy::GroupsOnly),
    );
    let p = Principal::new("dev@example.com");
    let d = auth.authorize(Some(&p), "P1", Permission::LinksManage).await.unwrap();
    assert!(d.allowed);
    assert_eq!(d.resolved_role, Some(Role::Manager));
}
