use crate::config::db::DB;
use crate::config::AppConfig;
use crate::errors::{any_error, ApiError};
use crate::route::post_api;
use axum::http::Uri;
use axum::response::{IntoResponse, Response};
use axum::Router;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;
use tracing::error;

pub mod config;
pub mod errors;
pub mod model;
pub mod route;
pub mod service;
pub mod util;

// Application state shared across handlers.
// Cloning is cheap: everything sits behind an Arc.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: Arc<DB>,
}

impl AppState {
    pub async fn new(config: AppConfig) -> anyhow::Result<Self> {
        let db = DB::new(&config.db.url, config.db.pool_size).await?;

        Ok(AppState {
            config: Arc::new(config),
            db: Arc::new(db),
        })
    }
}

// The order of the layers is important.
// https://docs.rs/axum/latest/axum/middleware/index.html#ordering
pub fn create_app(state: AppState) -> anyhow::Result<Router> {
    let config = &state.config;
    let cors = config.http.cors.clone().into_layer()?;

    let mut app = Router::new()
        .merge(post_api::create_routes())
        .fallback(handle_404)
        .method_not_allowed_fallback(handle_405)
        .layer(
            ServiceBuilder::new()
                .layer(CatchPanicLayer::custom(handle_panic))
                .layer(cors),
        );

    if config.log.log_requests {
        app = app.layer(TraceLayer::new_for_http());
    }
    Ok(app.with_state(state))
}

pub async fn handle_404(_uri: Uri) -> ApiError {
    any_error(404, "Not Found", None)
}

async fn handle_405() -> ApiError {
    any_error(405, "Method Not Allowed", None)
}

// Logs the panic and answers with a JSON 500
fn handle_panic(panic: Box<dyn std::any::Any + Send>) -> Response {
    let panic_message = if let Some(s) = panic.downcast_ref::<&str>() {
        *s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.as_str()
    } else {
        "Unknown panic"
    };

    error!("App panicked: {}", panic_message);
    any_error(500, "Internal Server Error", None).into_response()
}
