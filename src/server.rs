//! HTTP front-end for the highscores table.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use parking_lot::Mutex;
use tokio::sync::oneshot;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::data::{HighscoresList, UserScore};
use crate::table::ScoreTable;

/// Hard cap on the number of entries in a `GET /highscorelist` response.
pub const HIGHSCORE_LIST_LIMIT: usize = 20_000;

/// Shared state for the route handlers.
#[derive(Clone)]
struct AppState {
    table: Arc<dyn ScoreTable>,
}

/// The highscores HTTP server: three routes over one [`ScoreTable`].
pub struct GameServer {
    /// Server address
    addr: SocketAddr,
    /// The table served by the routes
    table: Arc<dyn ScoreTable>,
    /// Shutdown signal
    shutdown_tx: Arc<Mutex<Option<oneshot::Sender<()>>>>,
}

impl GameServer {
    /// Creates a server for `table`; nothing is bound until
    /// [`GameServer::start`].
    pub fn new(addr: SocketAddr, table: Arc<dyn ScoreTable>) -> Self {
        Self {
            addr,
            table,
            shutdown_tx: Arc::new(Mutex::new(None)),
        }
    }

    /// The route table, usable standalone for in-process testing.
    pub fn router(table: Arc<dyn ScoreTable>) -> Router {
        Router::new()
            .route("/score", post(add_score))
            .route("/score/:user_id/position", get(find_user))
            .route("/highscorelist", get(high_scores))
            .with_state(AppState { table })
            .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
    }

    /// Binds the address and starts serving in a background task.
    pub async fn start(&self) -> eyre::Result<()> {
        let app = Self::router(Arc::clone(&self.table));

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        {
            let mut lock = self.shutdown_tx.lock();
            *lock = Some(shutdown_tx);
        }

        let server = axum::Server::try_bind(&self.addr)?
            .serve(app.into_make_service())
            .with_graceful_shutdown(async {
                shutdown_rx.await.ok();
            });

        tracing::info!("highscores server listening on {}", self.addr);

        tokio::spawn(async move {
            if let Err(err) = server.await {
                tracing::error!("server error: {}", err);
            }
        });

        Ok(())
    }

    /// Signals the serving task to drain connections and stop.
    pub async fn shutdown(&self) {
        let tx = {
            let mut lock = self.shutdown_tx.lock();
            lock.take()
        };
        if let Some(tx) = tx {
            let _ = tx.send(());
            tracing::info!("shutdown signal sent");
        }
    }
}

/// `POST /score`.
///
/// The body is parsed by hand rather than through an extractor so that every
/// flavor of bad payload collapses to one answer: 422.
async fn add_score(State(state): State<AppState>, body: String) -> StatusCode {
    let update: UserScore = match serde_json::from_str(&body) {
        Ok(update) => update,
        Err(error) => {
            tracing::debug!(%error, "rejected score payload");
            return StatusCode::UNPROCESSABLE_ENTITY;
        }
    };
    match state.table.add_score(update.user_id, update.points) {
        Ok(()) => StatusCode::OK,
        Err(error) => {
            tracing::warn!(%error, "rejected score update");
            StatusCode::UNPROCESSABLE_ENTITY
        }
    }
}

/// `GET /score/{userId}/position`.
///
/// An unparseable id is 404; an unknown user is an empty 200, since absence
/// is a valid answer, not an error.
async fn find_user(State(state): State<AppState>, Path(user_id): Path<String>) -> Response {
    let Ok(user_id) = user_id.parse::<u64>() else {
        return StatusCode::NOT_FOUND.into_response();
    };
    match state.table.find_user(user_id) {
        Some(found) => Json(found).into_response(),
        None => StatusCode::OK.into_response(),
    }
}

/// `GET /highscorelist`.
async fn high_scores(State(state): State<AppState>) -> Json<HighscoresList> {
    Json(HighscoresList {
        highscores: state.table.high_scores(HIGHSCORE_LIST_LIMIT),
    })
}
