//! Path extractor for positive numeric entity ids.

use axum::{
    async_trait,
    extract::{FromRequestParts, Path},
    http::request::Parts,
};
use storefront_core::EntityId;

use crate::error::ApiError;
use crate::validation::validate_positive_id;

/// A path id that parsed as an integer and is greater than zero.
///
/// Rejections are `ApiError::Validation` with parameter scope, so a bad id
/// is answered before any handler or store code runs.
///
/// ```rust,ignore
/// async fn get_order(PositiveId(id): PositiveId) -> ApiResult<Json<Order>> { .. }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositiveId(pub EntityId);

#[async_trait]
impl<S> FromRequestParts<S> for PositiveId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw): Path<String> = Path::from_request_parts(parts, state).await?;
        let id = raw
            .trim()
            .parse::<EntityId>()
            .map_err(|_| ApiError::invalid_parameter("id", "must be a whole number"))?;
        validate_positive_id("id", id).map(PositiveId)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;
    use axum::{routing::get, Router};
    use tower::ServiceExt;

    async fn echo(PositiveId(id): PositiveId) -> String {
        id.to_string()
    }

    async fn status_for(uri: &str) -> u16 {
        let app = Router::new().route("/thing/:id", get(echo));
        let request = match Request::builder().uri(uri).body(axum::body::Body::empty()) {
            Ok(request) => request,
            Err(e) => panic!("bad request: {}", e),
        };
        match app.oneshot(request).await {
            Ok(response) => response.status().as_u16(),
            Err(e) => match e {},
        }
    }

    #[tokio::test]
    async fn test_positive_id_accepts_positive() {
        assert_eq!(status_for("/thing/12").await, 200);
    }

    #[tokio::test]
    async fn test_positive_id_rejects_zero_negative_and_text() {
        assert_eq!(status_for("/thing/0").await, 400);
        assert_eq!(status_for("/thing/-3").await, 400);
        assert_eq!(status_for("/thing/abc").await, 400);
    }
}
