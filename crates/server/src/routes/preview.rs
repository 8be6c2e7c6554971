//! `/preview` and `/previews` handlers.

use axum::Json;
use axum::extract::{RawQuery, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};

use super::{cache_control, first_url, query_urls};
use crate::error::ApiError;
use crate::handler::AppState;

/// `GET /preview?url=...`: one record, `200` even when the fetch failed.
pub async fn single(State(state): State<AppState>, RawQuery(query): RawQuery) -> Result<Response, ApiError> {
    let url = first_url(query.as_deref()).ok_or_else(|| ApiError::BadRequest("Missing url parameter".into()))?;

    let record = state.service.preview(&url).await;
    let max_age = cache_control(state.service.config().preview_max_age_secs);

    Ok(([(header::CACHE_CONTROL, max_age)], Json(record)).into_response())
}

/// `GET /previews?url=a&url=b...`: records in request order.
pub async fn batch(State(state): State<AppState>, RawQuery(query): RawQuery) -> Result<Response, ApiError> {
    let urls = query_urls(query.as_deref());

    let records = state.service.preview_batch(urls).await?;
    let max_age = cache_control(state.service.config().preview_max_age_secs);

    Ok(([(header::CACHE_CONTROL, max_age)], Json(records)).into_response())
}
