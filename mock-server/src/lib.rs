//! A stand-in for the Ergast API serving canned payloads from `test-vectors/`.
//!
//! Every request under `/ergast/f1/` is looked up by its path (query string
//! ignored) and counted, so tests can tell live calls from cache hits.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tokio::net::TcpListener;

pub const API_PREFIX: &str = "/ergast/f1";

/// Canned responses keyed by path below `API_PREFIX`.
#[derive(Clone, Debug)]
pub struct Fixtures {
    routes: HashMap<String, (StatusCode, String)>,
}

impl Fixtures {
    pub fn empty() -> Self {
        Self { routes: HashMap::new() }
    }

    /// The payloads shipped in `test-vectors/`, plus a failing route at
    /// `error/status.json`.
    pub fn ergast() -> Self {
        Self::empty()
            .with("2020/races.json", include_str!("../../test-vectors/races_2020.json"))
            .with("current/last/results.json", include_str!("../../test-vectors/results_last.json"))
            .with("2022/4/drivers.json", include_str!("../../test-vectors/drivers_2022_4.json"))
            .with("driverStandings/1.json", include_str!("../../test-vectors/driver_champions.json"))
            .with("current/last/laps/1.json", include_str!("../../test-vectors/laps_last_1.json"))
            .with("current/last/pitstops.json", include_str!("../../test-vectors/pitstops_last.json"))
            .with("1949/drivers.json", include_str!("../../test-vectors/empty.json"))
            .with("seasons.json", include_str!("../../test-vectors/malformed.json"))
            .with_status("error/status.json", StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded")
    }

    pub fn with(self, path: &str, body: &str) -> Self {
        self.with_status(path, StatusCode::OK, body)
    }

    pub fn with_status(mut self, path: &str, status: StatusCode, body: &str) -> Self {
        self.routes.insert(path.to_string(), (status, body.to_string()));
        self
    }
}

#[derive(Clone, Debug)]
pub struct AppState {
    fixtures: Arc<Fixtures>,
    hits: Arc<AtomicUsize>,
}

impl AppState {
    pub fn new(fixtures: Fixtures) -> Self {
        Self {
            fixtures: Arc::new(fixtures),
            hits: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Requests served so far, unknown paths included.
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route(&format!("{API_PREFIX}/{{*path}}"), get(serve_fixture))
        .with_state(state)
}

pub async fn run(listener: TcpListener, state: AppState) -> Result<(), std::io::Error> {
    axum::serve(listener, app(state)).await
}

async fn serve_fixture(State(state): State<AppState>, Path(path): Path<String>) -> Response {
    state.hits.fetch_add(1, Ordering::SeqCst);
    tracing::debug!(%path, "fixture request");
    match state.fixtures.routes.get(&path) {
        Some((status, body)) => (*status, [(header::CONTENT_TYPE, "application/json")], body.clone()).into_response(),
        None => (StatusCode::NOT_FOUND, format!("no fixture for {path}")).into_response(),
    }
}
