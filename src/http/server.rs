//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with all handlers
//! - Wire the request gate in pipeline order (shape limits → generic
//!   rate tier → payload guard → origin policy → endpoint tiers → auth)
//! - Wire cross-cutting middleware (tracing, request ID, timeout,
//!   security headers)
//! - Bind the server and serve with graceful shutdown

use axum::{
    Router,
    http::{HeaderValue, Request, header},
    middleware,
    routing::{get, post, put},
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::{
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    set_header::SetResponseHeaderLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::admin;
use crate::config::AppConfig;
use crate::routes;
use crate::security::limits::preflight;
use crate::security::origin::origin_guard;
use crate::security::payload::payload_guard;
use crate::security::rate_limit::{
    RateLimiters, admin_rate_limit, api_rate_limit, contact_rate_limit, newsletter_rate_limit,
};
use crate::store::ContentStore;

/// Application state injected into handlers and gate middleware.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<ContentStore>,
    pub limiters: Arc<RateLimiters>,
    pub config: Arc<AppConfig>,
}

#[derive(Clone, Copy)]
struct MakeRequestUuid;

impl MakeRequestId for MakeRequestUuid {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let id = uuid::Uuid::new_v4().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

/// Build the full router, gate included. Exposed for integration tests.
pub fn build_router(state: AppState) -> Router {
    let contact = Router::new()
        .route("/contact", post(routes::submit_contact))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            contact_rate_limit,
        ));

    let newsletter = Router::new()
        .route("/newsletter", post(routes::subscribe_newsletter))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            newsletter_rate_limit,
        ));

    let admin = Router::new()
        .route("/content", get(admin::handlers::get_content))
        .route("/settings", put(admin::handlers::update_settings))
        .route("/impact", put(admin::handlers::update_impact))
        .route("/projects", post(admin::handlers::create_project))
        .route(
            "/projects/{id}",
            put(admin::handlers::update_project).delete(admin::handlers::delete_project),
        )
        .route("/news", post(admin::handlers::create_news))
        .route(
            "/news/{id}",
            put(admin::handlers::update_news).delete(admin::handlers::delete_news),
        )
        .route("/media", post(admin::handlers::create_media))
        .route(
            "/media/{id}",
            put(admin::handlers::update_media).delete(admin::handlers::delete_media),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            admin::auth::admin_auth_middleware,
        ))
        .layer(middleware::from_fn_with_state(state.clone(), admin_rate_limit));

    let api = Router::new()
        .route("/health", get(routes::health))
        .route("/content", get(routes::get_content))
        .merge(contact)
        .merge(newsletter)
        .nest("/admin", admin);

    // Layers run top-down from the last added: request ID and tracing
    // outermost, then the gate stages in pipeline order.
    Router::new()
        .nest("/api", api)
        .layer(middleware::from_fn_with_state(state.clone(), origin_guard))
        .layer(middleware::from_fn_with_state(state.clone(), payload_guard))
        .layer(middleware::from_fn_with_state(state.clone(), api_rate_limit))
        .layer(middleware::from_fn_with_state(state.clone(), preflight))
        .layer(TimeoutLayer::new(Duration::from_secs(
            state.config.server.request_timeout_secs,
        )))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .with_state(state)
}

/// HTTP server for the content backend.
pub struct HttpServer {
    router: Router,
    config: Arc<AppConfig>,
}

impl HttpServer {
    pub fn new(state: AppState) -> Self {
        let config = state.config.clone();
        let router = build_router(state);
        Self { router, config }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutdown signal received");
}
