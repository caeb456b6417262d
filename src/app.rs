use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, State},
    http::HeaderValue,
    response::Json,
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::auth::Authenticator;
use crate::config::AppConfig;
use crate::database::ResourceStore;
use crate::error::ApiError;
use crate::handlers::{protected, public};
use crate::middleware::{ApiResponse, ApiResult, Guard};

/// Everything a handler needs, built once at startup and shared
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn ResourceStore>,
    pub authenticator: Arc<Authenticator>,
    pub guard: Guard,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        store: Arc<dyn ResourceStore>,
        authenticator: Authenticator,
        guard: Guard,
    ) -> Self {
        Self {
            config: Arc::new(config),
            store,
            authenticator: Arc::new(authenticator),
            guard,
        }
    }
}

pub fn router(state: AppState) -> Router {
    let mut app = Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        .merge(auth_routes())
        // Guarded
        .merge(client_routes())
        .merge(athlete_routes())
        .merge(tournament_routes())
        .merge(enrollment_routes())
        .merge(payment_routes())
        .layer(DefaultBodyLimit::max(state.config.api.max_request_size_bytes));

    if state.config.security.enable_cors {
        app = app.layer(cors_layer(&state.config.security.cors_origins));
    }
    if state.config.api.enable_request_logging {
        app = app.layer(TraceLayer::new_for_http());
    }

    app.with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "ignoring unparsable CORS origin");
                None
            }
        })
        .collect();
    CorsLayer::permissive().allow_origin(AllowOrigin::list(origins))
}

fn auth_routes() -> Router<AppState> {
    use public::auth;

    Router::new()
        .route("/auth/register", post(auth::register_post))
        .route("/auth/login", post(auth::login_post))
        .route("/auth/whoami", get(protected::whoami::whoami))
}

fn client_routes() -> Router<AppState> {
    use protected::clients;

    Router::new()
        .route("/clients", get(clients::list).post(clients::create))
        .route("/clients/:client_id", get(clients::get))
}

fn athlete_routes() -> Router<AppState> {
    use protected::athletes;

    Router::new()
        .route(
            "/clients/:client_id/athletes",
            get(athletes::list).post(athletes::create),
        )
        .route(
            "/clients/:client_id/athletes/:athlete_id",
            get(athletes::get).put(athletes::update).delete(athletes::delete),
        )
}

fn tournament_routes() -> Router<AppState> {
    use protected::tournaments;

    Router::new()
        .route("/tournaments", get(tournaments::list).post(tournaments::create))
        .route(
            "/tournaments/:id",
            get(tournaments::get).put(tournaments::update).delete(tournaments::delete),
        )
}

fn enrollment_routes() -> Router<AppState> {
    use protected::enrollments;

    Router::new()
        .route("/enrollments", get(enrollments::list).post(enrollments::create))
        .route(
            "/enrollments/:id",
            get(enrollments::get).put(enrollments::update).delete(enrollments::delete),
        )
}

fn payment_routes() -> Router<AppState> {
    use protected::payments;

    Router::new()
        .route("/payments", get(payments::list).post(payments::create))
        .route(
            "/payments/:id",
            get(payments::get).put(payments::update).delete(payments::delete),
        )
}

async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "message": "Welcome to the club API",
        "data": {
            "name": "club-api",
            "version": version,
            "endpoints": {
                "auth": "/auth/register, /auth/login (public), /auth/whoami",
                "clients": "/clients[/:clientId]",
                "athletes": "/clients/:clientId/athletes[/:athleteId]",
                "tournaments": "/tournaments[/:id]",
                "enrollments": "/enrollments[/:id]",
                "payments": "/payments[/:id]",
            }
        }
    }))
}

async fn health(State(state): State<AppState>) -> ApiResult<Value> {
    let now = chrono::Utc::now();

    match state.store.ping().await {
        Ok(()) => Ok(ApiResponse::success(json!({
            "status": "ok",
            "timestamp": now,
            "database": "ok"
        }))),
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            Err(ApiError::ServiceUnavailable("database unavailable".to_string()))
        }
    }
}
