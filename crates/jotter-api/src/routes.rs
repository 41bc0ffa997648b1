use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use chrono::Utc;
use jotter_core::db::Database;
use jotter_core::models::NoteDraft;
use jotter_core::{Note, UserId};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::accounts::AuthService;
use crate::auth::{extract_bearer_token, AuthenticatedUser, TokenIssuer};
use crate::config::AppConfig;
use crate::error::AppError;
use crate::extract::{ApiJson, NoteIdPath};
use crate::notes::NotesService;
use crate::rate_limit::{AuthEndpoint, AuthRateLimiter, RateLimitMetricsSnapshot};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    tokens: Arc<TokenIssuer>,
    accounts: AuthService,
    notes: NotesService,
    auth_rate_limiter: Arc<AuthRateLimiter>,
}

impl AppState {
    pub fn new(config: Arc<AppConfig>, db: Arc<Database>) -> Self {
        let tokens = Arc::new(TokenIssuer::new(&config.jwt_secret, config.token_ttl));
        Self {
            accounts: AuthService::new(db.clone(), tokens.clone()),
            notes: NotesService::new(db),
            auth_rate_limiter: Arc::new(AuthRateLimiter::from_config(config.as_ref())),
            tokens,
            config,
        }
    }
}

pub fn app_router(state: AppState) -> Router {
    let note_routes = Router::new()
        .route("/notes", get(list_notes).post(create_note))
        .route(
            "/notes/{id}",
            get(get_note).put(update_note).delete(delete_note),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .route("/", get(root))
        .route("/healthz", get(healthz))
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .merge(note_routes)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_headers(Any)
                .allow_methods(Any),
        )
        .with_state(state)
}

async fn root() -> &'static str {
    "API is running"
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp: i64,
    rate_limit: RateLimitMetricsSnapshot,
}

async fn healthz(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        timestamp: Utc::now().timestamp(),
        rate_limit: state.auth_rate_limiter.metrics_snapshot(),
    })
}

async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_bearer_token(request.headers())?;
    let user = state.tokens.verify(token)?;
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

#[derive(Debug, Deserialize)]
struct CredentialsRequest {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RegisterResponse {
    user_id: UserId,
}

#[derive(Debug, Serialize)]
struct LoginResponse {
    token: String,
}

async fn register(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CredentialsRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), AppError> {
    state
        .auth_rate_limiter
        .check(AuthEndpoint::Register, &request.email)
        .await?;
    let user_id = state
        .accounts
        .register(&request.email, &request.password)
        .await?;
    Ok((StatusCode::CREATED, Json(RegisterResponse { user_id })))
}

async fn login(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CredentialsRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    state
        .auth_rate_limiter
        .check(AuthEndpoint::Login, &request.email)
        .await?;
    let token = state
        .accounts
        .login(&request.email, &request.password)
        .await?;
    Ok(Json(LoginResponse { token }))
}

#[derive(Debug, Deserialize)]
struct NoteRequest {
    #[serde(default)]
    title: String,
    #[serde(default)]
    content: String,
}

impl From<NoteRequest> for NoteDraft {
    fn from(request: NoteRequest) -> Self {
        Self::new(request.title, request.content)
    }
}

#[derive(Debug, Serialize)]
struct MessageResponse {
    message: &'static str,
}

async fn list_notes(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<Vec<Note>>, AppError> {
    Ok(Json(state.notes.list(user.user_id).await?))
}

async fn get_note(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    NoteIdPath(id): NoteIdPath,
) -> Result<Json<Note>, AppError> {
    Ok(Json(state.notes.get(user.user_id, id).await?))
}

async fn create_note(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    ApiJson(request): ApiJson<NoteRequest>,
) -> Result<(StatusCode, Json<Note>), AppError> {
    let note = state.notes.create(user.user_id, &request.into()).await?;
    Ok((StatusCode::CREATED, Json(note)))
}

async fn update_note(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    NoteIdPath(id): NoteIdPath,
    ApiJson(request): ApiJson<NoteRequest>,
) -> Result<Json<Note>, AppError> {
    let note = state
        .notes
        .update(user.user_id, id, &request.into())
        .await?;
    Ok(Json(note))
}

async fn delete_note(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    NoteIdPath(id): NoteIdPath,
) -> Result<Json<MessageResponse>, AppError> {
    state.notes.delete(user.user_id, id).await?;
    Ok(Json(MessageResponse {
        message: "Note deleted successfully",
    }))
}
