//! Request middleware: room authentication, correlation ids, content type.

use crate::AppState;
use axum::extract::{Path, Request, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum_extra::extract::CookieJar;
use retroboard_auth::TOKEN_COOKIE;
use retroboard_broker::PubSub;
use retroboard_data::is_valid_room_id;
use retroboard_store::Kv;
use tracing::{info_span, warn, Instrument};
use uuid::Uuid;

/// The room a request has proven access to, inserted by [`authenticate`].
#[derive(Debug, Clone)]
pub struct AuthenticatedRoom(pub String);

fn bad_request() -> Response {
    (StatusCode::BAD_REQUEST, "Bad Request").into_response()
}

/// Validates the room id in the path against the token cookie's claim.
///
/// Authorization happened at registration; this only proves the caller
/// holds a token for the room they are asking for. Every failure is a 400,
/// matching the registration contract.
pub async fn authenticate<P: PubSub, K: Kv>(
    State(state): State<AppState<P, K>>,
    Path(room_id): Path<String>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    if !is_valid_room_id(&room_id) {
        warn!(%room_id, "invalid room id");
        return bad_request();
    }

    let Some(cookie) = jar.get(TOKEN_COOKIE) else {
        warn!(%room_id, "missing token cookie");
        return bad_request();
    };

    if let Err(err) = state.tokens.verify(cookie.value(), &room_id) {
        warn!(%room_id, %err, "token rejected");
        return bad_request();
    }

    request.extensions_mut().insert(AuthenticatedRoom(room_id));
    next.run(request).await
}

/// Tags the request with a correlation id, on the span and on the response.
pub async fn correlate(request: Request, next: Next) -> Response {
    let correlation_id = Uuid::new_v4().to_string();
    let span = info_span!(
        "request",
        %correlation_id,
        method = %request.method(),
        path = %request.uri().path(),
    );

    let mut response = next.run(request).instrument(span).await;

    if let Ok(value) = HeaderValue::from_str(&correlation_id) {
        response.headers_mut().insert("x-correlation-id", value);
    }

    response
}

/// Stamps registration responses as JSON.
pub async fn json_content_type(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;

    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );

    response
}
