use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use retroboard_auth::{PasswordManager, TokenManager};
use retroboard_broker::{Broker, MemoryBus, QueueProducer};
use retroboard_server::{build_router, AppState};
use retroboard_session::{Session, SessionTimings};
use retroboard_store::{MemoryKv, StateStore};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

const SECRET: &[u8] = b"test-secret";

fn app() -> Router {
    let bus = MemoryBus::new();
    let broker = Arc::new(Broker::new(bus.clone()));
    let queue = Arc::new(QueueProducer::new(Broker::new(bus), "persist"));
    let store = Arc::new(StateStore::new(MemoryKv::new()));

    let session = Arc::new(Session::new(
        Arc::clone(&broker),
        Arc::clone(&queue),
        Arc::clone(&store),
        SessionTimings::default(),
    ));

    let state = AppState {
        store,
        broker,
        queue,
        tokens: Arc::new(TokenManager::new(SECRET)),
        passwords: PasswordManager::new(),
        session,
        shutdown: CancellationToken::new(),
    };

    build_router("v1", state)
}

fn registration_request(endpoint: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(format!("/api/v1/registration/{endpoint}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn creating_a_room_sets_the_token_cookie() {
    let app = app();

    let response = app
        .oneshot(registration_request(
            "create",
            r#"{"id":"testroom","password":"hunter2"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);

    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("missing Set-Cookie")
        .to_str()
        .unwrap();
    assert!(cookie.starts_with("token="));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Strict"));

    let location = response
        .headers()
        .get(header::CONTENT_LOCATION)
        .expect("missing Content-Location")
        .to_str()
        .unwrap();
    assert_eq!(location, "/retrospective?roomId=testroom");

    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .unwrap()
        .to_str()
        .unwrap();
    assert_eq!(content_type, "application/json");
}

#[tokio::test]
async fn creating_a_duplicate_room_is_rejected() {
    let app = app();

    let first = app
        .clone()
        .oneshot(registration_request(
            "create",
            r#"{"id":"testroom","password":"hunter2"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = app
        .oneshot(registration_request(
            "create",
            r#"{"id":"testroom","password":"other"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn joining_an_existing_room_succeeds() {
    let app = app();

    app.clone()
        .oneshot(registration_request(
            "create",
            r#"{"id":"testroom","password":"hunter2"}"#,
        ))
        .await
        .unwrap();

    let response = app
        .oneshot(registration_request(
            "join",
            r#"{"id":"testroom","password":"hunter2"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key(header::SET_COOKIE));
}

#[tokio::test]
async fn joining_with_the_wrong_password_is_rejected() {
    let app = app();

    app.clone()
        .oneshot(registration_request(
            "create",
            r#"{"id":"testroom","password":"hunter2"}"#,
        ))
        .await
        .unwrap();

    let response = app
        .oneshot(registration_request(
            "join",
            r#"{"id":"testroom","password":"wrong"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn joining_an_unknown_room_is_rejected() {
    let app = app();

    let response = app
        .oneshot(registration_request(
            "join",
            r#"{"id":"nosuchroom","password":"hunter2"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn invalid_room_ids_are_rejected() {
    let app = app();

    let response = app
        .oneshot(registration_request(
            "create",
            r#"{"id":"bad room!","password":"hunter2"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn empty_passwords_are_rejected() {
    let app = app();

    let response = app
        .oneshot(registration_request(
            "create",
            r#"{"id":"testroom","password":""}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn malformed_bodies_are_rejected() {
    let app = app();

    let response = app
        .oneshot(registration_request("create", "not json"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn responses_carry_a_correlation_id() {
    let app = app();

    let response = app
        .oneshot(registration_request(
            "create",
            r#"{"id":"testroom","password":"hunter2"}"#,
        ))
        .await
        .unwrap();

    assert!(response.headers().contains_key("x-correlation-id"));
}

fn retrospective_request(room_id: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("GET")
        .uri(format!("/api/v1/retrospectives/{room_id}"));

    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }

    builder.body(Body::empty()).unwrap()
}

#[tokio::test]
async fn a_retrospective_without_a_token_is_rejected() {
    let app = app();

    let response = app
        .oneshot(retrospective_request("testroom", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn a_token_for_another_room_is_rejected() {
    let app = app();

    let (token, _) = TokenManager::new(SECRET).issue("otherroom").unwrap();
    let cookie = format!("token={token}");

    let response = app
        .oneshot(retrospective_request("testroom", Some(&cookie)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn a_token_signed_elsewhere_is_rejected() {
    let app = app();

    let (token, _) = TokenManager::new(b"other-secret").issue("testroom").unwrap();
    let cookie = format!("token={token}");

    let response = app
        .oneshot(retrospective_request("testroom", Some(&cookie)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn a_malformed_room_id_is_rejected() {
    let app = app();

    let (token, _) = TokenManager::new(SECRET).issue("testroom").unwrap();
    let cookie = format!("token={token}");

    let response = app
        .oneshot(retrospective_request("not%20a%20room", Some(&cookie)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
