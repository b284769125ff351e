//! # Common API Types
//!
//! Shared response wrappers, pagination parameters and small serde helpers
//! used across the resource handlers.

use axum::{
    extract::{FromRequest, FromRequestParts, Query, Request},
    http::request::Parts,
    response::Json,
};
use chrono::{DateTime, Utc};
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Deserializer, Serialize, de::DeserializeOwned};
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::repositories::Page;

/// JSON body extractor whose rejections are reported as [`ApiError`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}

/// Query string extractor whose rejections are reported as [`ApiError`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state).await?;
        Ok(Self(value))
    }
}

/// Offset-paginated response wrapper for list endpoints
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ListResponse<T> {
    /// Items on the current page
    pub data: Vec<T>,
    /// Page size that was applied
    pub limit: u64,
    /// Number of items skipped
    pub offset: u64,
}

impl<T> ListResponse<T> {
    pub fn new<M>(models: Vec<M>, page: Page) -> Self
    where
        T: From<M>,
    {
        Self {
            data: models.into_iter().map(T::from).collect(),
            limit: page.limit,
            offset: page.offset,
        }
    }
}

/// Stored timestamps carry an offset; the API always speaks UTC.
pub fn utc(value: DateTimeWithTimeZone) -> DateTime<Utc> {
    value.with_timezone(&Utc)
}

pub fn utc_opt(value: Option<DateTimeWithTimeZone>) -> Option<DateTime<Utc>> {
    value.map(utc)
}

/// Distinguishes an absent field (`None`) from an explicit `null`
/// (`Some(None)`) in PATCH-style bodies. Use with `#[serde(default)]`.
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[derive(Debug, Deserialize)]
    struct Patch {
        #[serde(default, deserialize_with = "double_option")]
        parent_id: Option<Option<Uuid>>,
    }

    #[test]
    fn double_option_separates_missing_from_null() {
        let missing: Patch = serde_json::from_str("{}").unwrap();
        assert_eq!(missing.parent_id, None);

        let cleared: Patch = serde_json::from_str(r#"{"parent_id": null}"#).unwrap();
        assert_eq!(cleared.parent_id, Some(None));

        let id = Uuid::new_v4();
        let set: Patch = serde_json::from_str(&format!(r#"{{"parent_id": "{id}"}}"#)).unwrap();
        assert_eq!(set.parent_id, Some(Some(id)));
    }

    #[test]
    fn list_response_records_the_applied_page() {
        let response: ListResponse<String> =
            ListResponse::new(vec!["a", "b"], Page::new(Some(1000), Some(4)));
        assert_eq!(response.data, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(response.limit, Page::MAX_LIMIT);
        assert_eq!(response.offset, 4);
    }
}
