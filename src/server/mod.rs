//! HTTP surface: the embedded dashboard page plus a JSON API over [`Dashboard`].

mod handlers;
mod response;

use std::sync::Arc;
use std::time::Duration;

use axum::routing::{delete, get, post, put};
use axum::Router;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;

use crate::charts::PlotlyCharts;
use crate::config::Config;
use crate::dashboard::Dashboard;
use crate::enrichment::UnpaywallClient;
use crate::error::ServerError;
use crate::session::SessionStore;

const INDEX_HTML: &str = include_str!("static/index.html");
const BASE_PATH_MARKER: &str = "__BASE_PATH__";

pub(crate) struct AppState {
    pub(crate) dashboard: Dashboard,
    pub(crate) index_html: String,
}

/// Build the router, mounted under `mount_path` (`""` for the root).
pub fn router(dashboard: Dashboard, mount_path: &str) -> Router {
    let mount_path = mount_path.trim_end_matches('/');
    let state = Arc::new(AppState {
        dashboard,
        index_html: INDEX_HTML.replace(BASE_PATH_MARKER, mount_path),
    });

    let routes = Router::new()
        .route("/", get(handlers::index))
        .route("/healthz", get(handlers::healthz))
        .route("/api/sessions", post(handlers::create_session))
        .route("/api/sessions/:id", delete(handlers::end_session))
        .route("/api/sessions/:id/separator", put(handlers::set_separator))
        .route("/api/sessions/:id/upload", post(handlers::upload))
        .route("/api/sessions/:id/enrich", post(handlers::enrich))
        .route("/api/sessions/:id/export", put(handlers::select_export))
        .route(
            "/api/sessions/:id/download",
            get(handlers::download).post(handlers::download_by_clicks),
        )
        .with_state(state);

    let app = if mount_path.is_empty() {
        routes
    } else {
        Router::new().nest(mount_path, routes)
    };
    app.layer(TraceLayer::new_for_http())
}

/// Periodically drop sessions idle for longer than `ttl`.
pub fn spawn_session_reaper(sessions: Arc<SessionStore>, ttl: Duration) -> JoinHandle<()> {
    let period = (ttl / 4).max(Duration::from_secs(1));
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            sessions.purge_idle(ttl);
        }
    })
}

/// Validate `config`, wire the production collaborators and serve until Ctrl-C.
pub async fn run(config: Config) -> Result<(), ServerError> {
    config.validate()?;
    let addr = config.bind_addr()?;

    let enricher = UnpaywallClient::new(config.unpaywall())?;
    let charts = PlotlyCharts::new(config.chart_options());
    let dashboard = Dashboard::new(Arc::new(enricher), Arc::new(charts));

    let reaper = spawn_session_reaper(Arc::clone(dashboard.sessions()), config.session_ttl());
    let app = router(dashboard, config.mount_path());

    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, base_path = %config.base_path, "dashboard listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    reaper.abort();
    tracing::info!("dashboard stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for ctrl-c");
    }
}
