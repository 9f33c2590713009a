//! Room creation and joining.
//!
//! Both endpoints answer with a token cookie and a `Content-Location`
//! pointing at the room. Anything the caller got wrong — malformed body,
//! bad room id, duplicate room, unknown room, wrong password — is a 400;
//! backend failures are 500s with no detail.

use crate::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use retroboard_auth::token_cookie;
use retroboard_broker::PubSub;
use retroboard_data::Room;
use retroboard_store::{Kv, StoreError};
use tracing::{error, warn};

fn internal_error() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
}

/// `POST /api/<v>/registration/create`
pub async fn create<P: PubSub, K: Kv>(
    State(state): State<AppState<P, K>>,
    body: Result<Json<Room>, JsonRejection>,
) -> Response {
    let Some(room) = decode_room(body) else {
        return (StatusCode::BAD_REQUEST, "Bad Request").into_response();
    };

    if let Err(err) = room.validate() {
        return (StatusCode::BAD_REQUEST, err.to_string()).into_response();
    }

    let hash = match state.passwords.hash_password(&room.password) {
        Ok(hash) => hash,
        Err(err) => {
            error!(%err, "could not hash password");
            return internal_error();
        }
    };

    match state.store.store_hashed_password(&room.id, &hash).await {
        Ok(()) => {}
        Err(err @ StoreError::AlreadyExists(_)) => {
            warn!(room_id = %room.id, "room already exists");
            return (StatusCode::BAD_REQUEST, err.to_string()).into_response();
        }
        Err(err) => {
            error!(%err, "could not store password hash");
            return internal_error();
        }
    }

    token_response(&state, &room.id, StatusCode::CREATED)
}

/// `POST /api/<v>/registration/join`
pub async fn join<P: PubSub, K: Kv>(
    State(state): State<AppState<P, K>>,
    body: Result<Json<Room>, JsonRejection>,
) -> Response {
    let Some(room) = decode_room(body) else {
        return (StatusCode::BAD_REQUEST, "Bad Request").into_response();
    };

    if let Err(err) = room.validate() {
        return (StatusCode::BAD_REQUEST, err.to_string()).into_response();
    }

    let hash = match state.store.hashed_password(&room.id).await {
        Ok(hash) => hash,
        Err(err @ StoreError::DoesNotExist(_)) => {
            warn!(room_id = %room.id, "unknown room");
            return (StatusCode::BAD_REQUEST, err.to_string()).into_response();
        }
        Err(err) => {
            error!(%err, "could not read password hash");
            return internal_error();
        }
    };

    if let Err(err) = state
        .passwords
        .compare_hash_and_password(&hash, &room.password)
    {
        warn!(room_id = %room.id, "password rejected");
        return (StatusCode::BAD_REQUEST, err.to_string()).into_response();
    }

    token_response(&state, &room.id, StatusCode::OK)
}

fn decode_room(body: Result<Json<Room>, JsonRejection>) -> Option<Room> {
    match body {
        Ok(Json(room)) => Some(room),
        Err(rejection) => {
            warn!(%rejection, "could not decode room");
            None
        }
    }
}

fn token_response<P: PubSub, K: Kv>(
    state: &AppState<P, K>,
    room_id: &str,
    status: StatusCode,
) -> Response {
    let (token, expires_at) = match state.tokens.issue(room_id) {
        Ok(issued) => issued,
        Err(err) => {
            error!(%err, "could not issue token");
            return internal_error();
        }
    };

    (
        status,
        [
            (header::SET_COOKIE, token_cookie(&token, expires_at)),
            (
                header::CONTENT_LOCATION,
                format!("/retrospective?roomId={room_id}"),
            ),
        ],
    )
        .into_response()
}
