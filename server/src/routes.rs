use crate::error::{ApiError, bad_request};
use axum::Router;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::Json;
use futures_util::{Stream, StreamExt};
use graph::{AuthFlow, GraphClient, TokenProvider};
use serde::Deserialize;
use serde_json::{Value, json};
use std::convert::Infallible;
use std::path::PathBuf;
use std::sync::Arc;
use sw_core::AccessClient;
use sw_core::types::ResourceId;
use tokio_stream::wrappers::BroadcastStream;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use watcher::WatchEngine;

#[derive(Clone)]
pub struct AppState {
    pub tokens: TokenProvider,
    pub auth: Arc<AuthFlow>,
    pub graph_client: Arc<GraphClient>,
    pub engine: Arc<WatchEngine>,
    pub download_dir: PathBuf,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(login))
        .route("/auth/redirect", get(auth_redirect))
        .route("/files", get(list_files))
        .route("/users", get(list_users))
        .route("/download/{file}", post(download_file))
        .route("/subscribe/{file}", post(subscribe_file))
        .route("/subscriptions/{file}", get(subscription_status))
        .route("/events", get(event_stream))
        .route("/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> StatusCode {
    StatusCode::OK
}

async fn login(State(state): State<AppState>) -> Redirect {
    Redirect::temporary(&state.auth.authorize_url())
}

#[derive(Debug, Deserialize)]
struct AuthRedirectQuery {
    code: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

async fn auth_redirect(
    State(state): State<AppState>,
    Query(query): Query<AuthRedirectQuery>,
) -> Response {
    if let Some(err) = query.error {
        warn!(
            error = %err,
            description = query.error_description.as_deref().unwrap_or(""),
            "authority returned an error"
        );
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Error completing authentication.",
        )
            .into_response();
    }

    let Some(code) = query.code else {
        return bad_request("missing authorization code");
    };

    match state.auth.redeem_code(&code).await {
        Ok(token) => {
            state.tokens.set_token(token).await;
            info!("login completed; ready for serving APIs");
            "Login successful!".into_response()
        }
        Err(e) => {
            error!(error = %e, "authorization code exchange failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error completing authentication.",
            )
                .into_response()
        }
    }
}

async fn list_files(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let files = state.graph_client.list_files().await?;
    Ok(Json(json!({ "status": 200, "result": { "files": files } })))
}

#[derive(Debug, Deserialize)]
struct UsersQuery {
    file: Option<String>,
}

/// One-shot access query; bypasses the snapshot store.
async fn list_users(State(state): State<AppState>, Query(query): Query<UsersQuery>) -> Response {
    let Some(file) = query.file else {
        return bad_request("missing file parameter");
    };
    let Some(resource) = ResourceId::new(file) else {
        return bad_request("invalid file name");
    };

    match state.graph_client.fetch_permissions(&resource).await {
        Ok(snapshot) => {
            let mut users: Vec<String> = snapshot
                .iter()
                .map(|principal| principal.as_str().to_string())
                .collect();
            users.sort();
            Json(json!({ "status": 200, "result": { "users": users } })).into_response()
        }
        Err(e) => ApiError::from(e).into_response(),
    }
}

async fn download_file(State(state): State<AppState>, Path(file): Path<String>) -> Response {
    let Some(resource) = ResourceId::new(file.clone()) else {
        return bad_request("invalid file name");
    };
    // The download lands under the configured directory, keyed by the leaf
    // name only.
    let Some(name) = std::path::Path::new(&file).file_name() else {
        return bad_request("invalid file name");
    };
    let dest = state.download_dir.join(name);

    match state.graph_client.download_to(&resource, &dest).await {
        Ok(bytes) => {
            info!(resource = %resource, bytes, dest = %dest.display(), "file downloaded");
            Json(json!({ "status": 200, "result": "success" })).into_response()
        }
        Err(e) => ApiError::from(e).into_response(),
    }
}

async fn subscribe_file(State(state): State<AppState>, Path(file): Path<String>) -> Response {
    let Some(resource) = ResourceId::new(file) else {
        return bad_request("invalid file name");
    };

    let subscribed = state.engine.ensure_subscribed(resource.clone());
    info!(
        resource = %resource,
        started = subscribed.started,
        "subscribed to access list"
    );
    Json(json!({ "status": 200, "result": { "started": subscribed.started } })).into_response()
}

async fn subscription_status(
    State(state): State<AppState>,
    Path(file): Path<String>,
) -> Response {
    let Some(resource) = ResourceId::new(file) else {
        return bad_request("invalid file name");
    };

    match state.engine.status(&resource).await {
        Some(status) => Json(status).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "not subscribed" })),
        )
            .into_response(),
    }
}

/// Change events as server-sent events, one JSON object per event.
async fn event_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let stream = BroadcastStream::new(state.engine.subscribe_events()).filter_map(|event| async {
        match event {
            Ok(event) => Event::default().json_data(&event).ok().map(Ok),
            // A lagged receiver skips ahead rather than ending the stream.
            Err(_) => None,
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
