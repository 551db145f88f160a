/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use teamboard_api::{app::{build_router, AppState}, config::Config};
/// use teamboard_shared::db::pool::{create_pool, DatabaseConfig};
/// use teamboard_shared::store::postgres::PgStore;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = create_pool(DatabaseConfig {
///     url: config.database.url.clone(),
///     ..Default::default()
/// })
/// .await?;
/// let state = AppState::new(Arc::new(PgStore::new(pool)), config);
/// let app = build_router(state);
///
/// let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
/// axum::serve(listener, app).await?;
/// # Ok(())
/// # }
/// ```

use crate::config::Config;
use crate::error::ApiError;
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::{self, Next},
    response::Response,
    routing::{get, patch, post, put},
    Router,
};
use std::sync::Arc;
use teamboard_shared::auth::middleware::authenticate;
use teamboard_shared::store::Store;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state, cloned into every handler
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, config: Config) -> Self {
        Self {
            store,
            config: Arc::new(config),
        }
    }

    pub fn store(&self) -> &dyn Store {
        self.store.as_ref()
    }

    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the router with all routes and middleware
///
/// ```text
/// /health                                   public
/// /api/auth/{signup,signin,refresh}         public
/// /api/teams                                GET, POST
/// /api/teams/:team_id                       GET
/// /api/teams/:team_id/boards                GET, POST
/// /api/teams/:team_id/members               GET
/// /api/teams/:team_id/members/:member_id    PATCH, DELETE
/// /api/teams/:team_id/invite                POST
/// /api/invitations                          GET
/// /api/invitations/:invitation_id           POST
/// /api/boards/:board_id                     GET, PUT, DELETE
/// /api/boards/:board_id/tasks               POST
/// /api/tasks/:task_id                       PUT, DELETE
/// /api/notifications                        GET, PATCH
/// /api/profile                              GET, PUT
/// ```
///
/// Everything under `/api` except `/api/auth` requires a bearer access token.
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    let auth_routes = Router::new()
        .route("/signup", post(routes::auth::signup))
        .route("/signin", post(routes::auth::signin))
        .route("/refresh", post(routes::auth::refresh));

    let protected_routes = Router::new()
        .route(
            "/teams",
            get(routes::teams::list_teams).post(routes::teams::create_team),
        )
        .route("/teams/:team_id", get(routes::teams::get_team))
        .route(
            "/teams/:team_id/boards",
            get(routes::boards::list_boards).post(routes::boards::create_board),
        )
        .route("/teams/:team_id/members", get(routes::members::list_members))
        .route(
            "/teams/:team_id/members/:member_id",
            patch(routes::members::update_member).delete(routes::members::remove_member),
        )
        .route("/teams/:team_id/invite", post(routes::invitations::invite))
        .route("/invitations", get(routes::invitations::list_pending))
        .route(
            "/invitations/:invitation_id",
            post(routes::invitations::respond),
        )
        .route(
            "/boards/:board_id",
            get(routes::boards::get_board)
                .put(routes::boards::update_board)
                .delete(routes::boards::delete_board),
        )
        .route("/boards/:board_id/tasks", post(routes::tasks::create_task))
        .route(
            "/tasks/:task_id",
            put(routes::tasks::update_task).delete(routes::tasks::delete_task),
        )
        .route(
            "/notifications",
            get(routes::notifications::list_notifications)
                .patch(routes::notifications::mark_notifications),
        )
        .route(
            "/profile",
            get(routes::profile::get_profile).put(routes::profile::update_profile),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let api_routes = Router::new()
        .nest("/auth", auth_routes)
        .merge(protected_routes);

    let cors = if state.config.allows_any_origin() {
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
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(health_routes)
        .nest("/api", api_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}

/// Resolves the bearer token to a [`CurrentUser`](teamboard_shared::auth::CurrentUser)
/// and stores it in the request extensions
async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = authenticate(state.store(), state.jwt_secret(), req.headers()).await?;
    req.extensions_mut().insert(user);

    Ok(next.run(req).await)
}
