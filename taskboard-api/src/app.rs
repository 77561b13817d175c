/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use taskboard_api::{app::AppState, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let app = taskboard_api::app::build_router(AppState::new(pool, config));
///
/// let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
/// axum::serve(listener, app).await?;
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, error::ApiError, middleware::security::SecurityHeadersLayer};
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{delete, get, post},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use taskboard_shared::auth::middleware::authenticate;
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state, cloned into every handler
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,

    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(db: PgPool, config: Config) -> Self {
        Self {
            db,
            config: Arc::new(config),
        }
    }

    pub fn session_secret(&self) -> &str {
        &self.config.session.secret
    }

    pub fn login_path(&self) -> &str {
        &self.config.api.login_path
    }
}

/// Builds the router with every route and middleware
///
/// ```text
/// /
/// ├── GET  /                          redirect to my tasks or login
/// ├── GET  /health
/// └── /v1
///     ├── /auth                       public
///     │   ├── POST /register
///     │   ├── GET|POST /login
///     │   └── POST /logout
///     ├── /tasks                      session required
///     │   ├── GET|POST /
///     │   ├── GET /search
///     │   ├── GET|PUT|DELETE /:id
///     │   ├── POST /:id/mark-done
///     │   ├── POST /:id/leave
///     │   └── POST /:id/comments
///     ├── DELETE /comments/:id
///     ├── /projects
///     │   ├── GET|POST /
///     │   ├── GET|PUT|DELETE /:id
///     │   ├── POST|PUT|DELETE /:id/tasks
///     │   ├── DELETE /:id/tasks/:task_id
///     │   ├── GET /:id/report
///     │   └── GET /:id/report/export
///     └── /users
///         ├── GET /
///         └── GET /:id/tasks
/// ```
///
/// Middleware, outermost first: security headers, CORS, compression,
/// tracing, then the session layer on guarded routes.
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let public_routes = Router::new()
        .route("/", get(routes::root::index))
        .route("/health", get(routes::health::health_check));

    let auth_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", get(routes::auth::login_page).post(routes::auth::login))
        .route("/logout", post(routes::auth::logout));

    let task_routes = Router::new()
        .route("/", get(routes::tasks::list_my_tasks).post(routes::tasks::create_task))
        .route("/search", get(routes::tasks::search_tasks))
        .route(
            "/:id",
            get(routes::tasks::get_task)
                .put(routes::tasks::update_task)
                .delete(routes::tasks::delete_task),
        )
        .route("/:id/mark-done", post(routes::tasks::mark_done))
        .route("/:id/leave", post(routes::tasks::leave_task))
        .route("/:id/comments", post(routes::comments::create_comment));

    let project_routes = Router::new()
        .route("/", get(routes::projects::list_projects).post(routes::projects::create_project))
        .route(
            "/:id",
            get(routes::projects::get_project)
                .put(routes::projects::update_project)
                .delete(routes::projects::delete_project),
        )
        .route(
            "/:id/tasks",
            post(routes::projects::add_tasks)
                .put(routes::projects::set_tasks)
                .delete(routes::projects::clear_tasks),
        )
        .route("/:id/tasks/:task_id", delete(routes::projects::remove_task))
        .route("/:id/report", get(routes::projects::project_report))
        .route("/:id/report/export", get(routes::projects::export_report));

    let user_routes = Router::new()
        .route("/", get(routes::users::list_users))
        .route("/:id/tasks", get(routes::users::list_user_tasks));

    let guarded_routes = Router::new()
        .nest("/tasks", task_routes)
        .route("/comments/:id", delete(routes::comments::delete_comment))
        .nest("/projects", project_routes)
        .nest("/users", user_routes)
        .route_layer(axum::middleware::from_fn_with_state(state.clone(), session_layer));

    let v1_routes = Router::new().nest("/auth", auth_routes).merge(guarded_routes);

    let cors = if state.config.api.cors_origins.iter().any(|o| o == "*") {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    let production = state.config.api.production;

    Router::new()
        .merge(public_routes)
        .nest("/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(CompressionLayer::new())
        .layer(cors)
        .layer(SecurityHeadersLayer::new(production))
        .with_state(state)
}

/// Resolves the session and injects `Extension<AuthContext>`
///
/// Anonymous or stale sessions are redirected to the login page.
async fn session_layer(State(state): State<AppState>, mut req: Request, next: Next) -> Result<Response, ApiError> {
    let auth = authenticate(&state.db, req.headers(), state.session_secret())
        .await
        .map_err(|err| {
            tracing::debug!(error = %err, path = %req.uri().path(), "Rejecting unauthenticated request");
            ApiError::from_auth(err, state.login_path())
        })?;

    req.extensions_mut().insert(auth);

    Ok(next.run(req).await)
}
