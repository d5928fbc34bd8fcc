use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};
use marketmind_core::{Match, Product, TrendRecord};
use marketmind_matchmaker::{IntegrityIssue, ModelClient};
use serde::{Deserialize, Serialize};

use super::{map_pipeline_error, ApiError, ApiResponse, AppState, ResponseMeta};
use crate::middleware::RequestId;

#[derive(Debug, Deserialize)]
pub(super) struct MatchRequest {
    products: Vec<Product>,
    trends: Vec<TrendRecord>,
}

#[derive(Debug, Serialize)]
pub(super) struct MatchData {
    filtered_trends: Vec<TrendRecord>,
    matches: Vec<Match>,
    dropped: Vec<IntegrityIssue>,
    corrected: Vec<IntegrityIssue>,
}

pub(super) async fn create_matches<M: ModelClient + 'static>(
    State(state): State<AppState<M>>,
    Extension(req_id): Extension<RequestId>,
    payload: Result<Json<MatchRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<MatchData>>, ApiError> {
    let Json(request) = payload.map_err(|rejection| {
        ApiError::new(req_id.0.clone(), "bad_request", rejection.body_text())
    })?;

    tracing::info!(
        request_id = %req_id.0,
        products = request.products.len(),
        trends = request.trends.len(),
        "match request received"
    );

    let outcome = state
        .pipeline
        .run(&request.products, &request.trends)
        .await
        .map_err(|e| map_pipeline_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: MatchData {
            filtered_trends: outcome.filtered_trends,
            matches: outcome.matches,
            dropped: outcome.dropped,
            corrected: outcome.corrected,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}
