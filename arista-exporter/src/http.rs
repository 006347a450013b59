//! HTTP server for the probe and self-metrics endpoints.

use std::net::SocketAddr;

use axum::Router;
use axum::extract::{Query, State};
use axum::http::{StatusCode, header};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use serde::Deserialize;
use tokio::sync::watch;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::collection::OPENMETRICS_CONTENT_TYPE;
use crate::config::WebConfig;
use crate::error::ScrapeError;
use crate::scrape::Scraper;

const TEXT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

/// Application state shared across handlers.
#[derive(Clone)]
struct AppState {
    scraper: Scraper,
    probe_path: String,
    metrics_path: String,
}

/// Query parameters of the probe endpoint.
#[derive(Debug, Default, Deserialize)]
struct ProbeParams {
    target: Option<String>,
    module: Option<String>,
}

impl IntoResponse for ScrapeError {
    fn into_response(self) -> Response {
        (
            self.status(),
            [(header::CONTENT_TYPE, TEXT_CONTENT_TYPE)],
            format!("{}\n", self),
        )
            .into_response()
    }
}

/// Create the HTTP router.
pub fn create_router(scraper: Scraper, web: &WebConfig) -> Router {
    let state = AppState {
        scraper,
        probe_path: web.probe_path.clone(),
        metrics_path: web.metrics_path.clone(),
    };

    Router::new()
        .route("/", get(index_handler))
        .route(&web.probe_path, get(probe_handler))
        .route(&web.metrics_path, get(metrics_handler))
        .route("/health", get(health_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Landing page.
async fn index_handler(State(state): State<AppState>) -> Html<String> {
    Html(format!(
        r#"<html>
<head><title>Arista Exporter</title></head>
<body>
<h1>Arista Exporter</h1>
<form action="{probe}">
<label>Target:</label> <input type="text" name="target" placeholder="switch1">
<label>Modules:</label> <input type="text" name="module" placeholder="power,mlag">
<input type="submit" value="Probe">
</form>
<p><a href="{metrics}">Exporter metrics</a></p>
</body>
</html>
"#,
        probe = state.probe_path,
        metrics = state.metrics_path,
    ))
}

/// Handler for the probe endpoint: one scrape of one target.
async fn probe_handler(
    State(state): State<AppState>,
    Query(params): Query<ProbeParams>,
) -> Result<Response, ScrapeError> {
    let body = state
        .scraper
        .serve(params.target.as_deref(), params.module.as_deref())
        .await?;

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, OPENMETRICS_CONTENT_TYPE)],
        body,
    )
        .into_response())
}

/// Handler for the exporter's own metrics.
async fn metrics_handler(State(state): State<AppState>) -> Response {
    match state.scraper.stats().render() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, OPENMETRICS_CONTENT_TYPE)],
            body,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to render exporter metrics");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [(header::CONTENT_TYPE, TEXT_CONTENT_TYPE)],
                format!("{}\n", e),
            )
                .into_response()
        }
    }
}

/// Handler for the /health endpoint.
async fn health_handler() -> Response {
    (StatusCode::OK, "healthy\n").into_response()
}

/// HTTP server configuration.
pub struct HttpServer {
    scraper: Scraper,
    listen_addr: SocketAddr,
    web: WebConfig,
}

impl HttpServer {
    /// Create a new HTTP server.
    pub fn new(scraper: Scraper, listen_addr: SocketAddr, web: WebConfig) -> Self {
        Self {
            scraper,
            listen_addr,
            web,
        }
    }

    /// Run the HTTP server until the shutdown signal is received.
    pub async fn run(self, shutdown: watch::Receiver<bool>) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.listen_addr)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {}", self.listen_addr, e))?;

        self.serve(listener, shutdown).await
    }

    /// Serve on an already bound listener until the shutdown signal is
    /// received.
    pub async fn serve(
        self,
        listener: tokio::net::TcpListener,
        mut shutdown: watch::Receiver<bool>,
    ) -> anyhow::Result<()> {
        let router = create_router(self.scraper, &self.web);
        let addr = listener.local_addr()?;

        info!(
            addr = %addr,
            probe_path = %self.web.probe_path,
            metrics_path = %self.web.metrics_path,
            "HTTP server listening"
        );

        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                loop {
                    if shutdown.changed().await.is_err() {
                        break;
                    }
                    if *shutdown.borrow() {
                        break;
                    }
                }
                info!("HTTP server shutting down");
            })
            .await
            .map_err(|e| anyhow::anyhow!("HTTP server error: {}", e))?;

        info!("HTTP server stopped");
        Ok(())
    }
}
