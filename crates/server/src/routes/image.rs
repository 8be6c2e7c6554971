//! `/proxy-image` handler.

use axum::extract::{RawQuery, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};

use super::{cache_control, first_url};
use crate::error::ApiError;
use crate::handler::AppState;

/// `GET /proxy-image?url=...`: raw bytes with the upstream content type.
pub async fn proxy(State(state): State<AppState>, RawQuery(query): RawQuery) -> Result<Response, ApiError> {
    let url = first_url(query.as_deref()).ok_or_else(|| ApiError::BadRequest("Missing url parameter".into()))?;

    let asset = state.service.proxy_image(&url).await?;
    let max_age = cache_control(state.service.config().image_cache_ttl_secs);

    Ok(([(header::CONTENT_TYPE, asset.content_type), (header::CACHE_CONTROL, max_age)], asset.data).into_response())
}
