/// Analytics overview endpoint

use crate::{
    analytics::{overview, Overview},
    api::AppState,
    error::ApiError,
};
use axum::{extract::State, response::Json, routing::get, Router};

pub fn create_analytics_routes() -> Router<AppState> {
    Router::new().route("/analytics/overview", get(analytics_overview))
}

/// GET /analytics/overview
async fn analytics_overview(State(state): State<AppState>) -> Result<Json<Overview>, ApiError> {
    overview(&state.workflows, &state.team).await.map(Json)
}
