use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::Value;

use crate::tableland::{QueryError, Row, TableReader};

use super::{
    models::{ErrorResponse, HealthResponse, QueryParams},
    AppState,
};

pub async fn health<R: TableReader + Clone + Send + Sync + 'static>(
    State(state): State<AppState<R>>,
) -> impl IntoResponse {
    let uptime_secs = state.started_at.elapsed().map(|d| d.as_secs()).unwrap_or(0);
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok",
            uptime_secs,
            chain_id: state.chain_id,
        }),
    )
}

pub async fn query<R: TableReader + Clone + Send + Sync + 'static>(
    State(state): State<AppState<R>>,
    Query(params): Query<QueryParams>,
) -> impl IntoResponse {
    match state.reader.query(&params.s) {
        Ok(rows) => Json(render_rows(rows)).into_response(),
        Err(err) => {
            match &err {
                QueryError::NotReadOnly => log::warn!("Rejected statement `{}`", params.s),
                QueryError::Failed(reason) => log::warn!("Query `{}` failed: {}", params.s, reason),
            }
            (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    message: err.to_string(),
                }),
            )
                .into_response()
        }
    }
}

pub async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            message: "endpoint not found".to_string(),
        }),
    )
}

/// A lone cell holding a JSON object or array is returned as that value,
/// which is what a metadata query selects. Anything else is a list of rows.
fn render_rows(rows: Vec<Row>) -> Value {
    if let [row] = rows.as_slice() {
        if let (1, Some(Value::String(text))) = (row.len(), row.values().next()) {
            if let Ok(json) = serde_json::from_str::<Value>(text) {
                if json.is_object() || json.is_array() {
                    return json;
                }
            }
        }
    }
    Value::Array(rows.into_iter().map(Value::Object).collect())
}
