use crate::config::{SeatingConfig, ServerConfig};
use crate::data::{AllocationRequest, AllocationResult};
use crate::solver;
use axum::extract::State;
use axum::http::StatusCode;
use axum::{Json, Router, routing::post};
use log::{info, warn};
use std::sync::Arc;

async fn allocate_handler(
    State(config): State<Arc<SeatingConfig>>,
    Json(request): Json<AllocationRequest>,
) -> Result<Json<AllocationResult>, (StatusCode, String)> {
    match solver::solve(&request, &config) {
        Ok(result) => Ok(Json(result)),
        Err(e) => {
            warn!("Rejected allocation request: {}", e);
            Err((StatusCode::BAD_REQUEST, e.to_string()))
        }
    }
}

pub fn router(config: SeatingConfig) -> Router {
    Router::new()
        .route("/v1/seating/allocate", post(allocate_handler))
        .with_state(Arc::new(config))
}

pub async fn run_server(server: &ServerConfig, seating: SeatingConfig) -> std::io::Result<()> {
    let app = router(seating);
    let listener = tokio::net::TcpListener::bind(&server.bind_addr).await?;

    info!("Server running at http://{}", listener.local_addr()?);

    axum::serve(listener, app).await
}
