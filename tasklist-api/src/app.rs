/// Application state, router builder and auth middleware
///
/// # Example
///
/// ```no_run
/// use tasklist_api::{app::AppState, config::Config};
/// use tasklist_shared::mail::SmtpNotifier;
/// use sqlx::PgPool;
/// use std::sync::Arc;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let notifier = Arc::new(SmtpNotifier::new(&config.mail)?);
/// let state = AppState::new(pool, config, notifier);
/// let app = tasklist_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::config::Config;
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{delete, get, post, put},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use tasklist_shared::auth::{google::GoogleVerifier, jwt};
use tasklist_shared::mail::Notifier;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use uuid::Uuid;

/// Shared application state
///
/// Holds exactly the collaborators the handlers need: the store pool, the
/// configuration (token signing), the notifier and the external identity
/// verifier. Cloned per request via Axum's `State` extractor; Arc makes the
/// clone cheap and lets tests substitute a notifier double.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,

    /// Task-creation notifier (fire-and-forget)
    pub notifier: Arc<dyn Notifier>,

    /// External identity token verifier; None when not configured
    pub google: Option<GoogleVerifier>,
}

impl AppState {
    /// Creates new application state
    pub fn new(db: PgPool, config: Config, notifier: Arc<dyn Notifier>) -> Self {
        let google = config
            .google
            .client_id
            .as_deref()
            .map(GoogleVerifier::new);

        Self {
            db,
            config: Arc::new(config),
            notifier,
            google,
        }
    }

    /// Gets the bearer token secret
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }

    /// Issues a signed bearer token for a user
    pub fn issue_token(&self, user_id: Uuid) -> Result<String, jwt::JwtError> {
        let claims = jwt::Claims::with_expiration(
            user_id,
            chrono::Duration::hours(self.config.jwt.ttl_hours),
        );
        jwt::create_token(&claims, self.jwt_secret())
    }
}

/// The authenticated caller, inserted into request extensions by
/// [`auth_layer`]
///
/// Handlers behind the auth layer extract this with `Extension<AuthUser>`;
/// its id is the only identity fact the token carries.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    /// Authenticated user id
    pub id: Uuid,
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health              # Health check (public)
/// ├── /auth/
/// │   ├── POST /register   # Register with email + password (public)
/// │   ├── POST /login      # Password login (public)
/// │   ├── POST /external   # External identity token login (public)
/// │   └── GET  /me         # Current user (bearer)
/// └── /tasks/
///     ├── GET    /         # List own tasks (bearer)
///     ├── POST   /         # Create task (bearer)
///     ├── GET    /:id      # Get own task (bearer)
///     ├── PUT    /:id      # Partially update own task (bearer)
///     └── DELETE /:id      # Delete own task (bearer)
/// ```
///
/// Middleware stack: tracing (tower-http TraceLayer), CORS, and the bearer
/// auth layer on the owner-scoped routes.
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    // Public auth endpoints
    let auth_public = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/external", post(routes::auth::external_login));

    // Owner-scoped auth endpoints
    let auth_private = Router::new()
        .route("/me", get(routes::auth::me))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth_layer,
        ));

    // Task endpoints, all owner-scoped
    let task_routes = Router::new()
        .route("/", get(routes::tasks::list_tasks))
        .route("/", post(routes::tasks::create_task))
        .route("/:id", get(routes::tasks::get_task))
        .route("/:id", put(routes::tasks::update_task))
        .route("/:id", delete(routes::tasks::delete_task))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth_layer,
        ));

    let cors = build_cors(&state.config);

    Router::new()
        .merge(health_routes)
        .nest("/auth", auth_public.merge(auth_private))
        .nest("/tasks", task_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}

/// Configures CORS from the allowed-origins list
///
/// `*` anywhere in the list means permissive mode (development).
fn build_cors(config: &Config) -> CorsLayer {
    if config.api.cors_origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .api
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
}

/// Bearer token authentication middleware
///
/// Extracts and validates the token from the Authorization header, then
/// injects [`AuthUser`] into request extensions. Short-circuits with 401 on
/// any failure; owner-scoped handlers never run unauthenticated.
pub async fn auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, crate::error::ApiError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            crate::error::ApiError::Unauthorized("Missing authorization header".to_string())
        })?;

    let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
        crate::error::ApiError::Unauthorized("Expected Bearer token".to_string())
    })?;

    let claims = jwt::validate_token(token, state.jwt_secret())?;

    req.extensions_mut().insert(AuthUser { id: claims.sub });

    Ok(next.run(req).await)
}
