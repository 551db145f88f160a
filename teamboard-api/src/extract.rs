/// Request extractors that reject with [`ApiError`]
///
/// Axum's own extractors answer malformed input with plain-text bodies; these
/// wrappers keep every failure inside the JSON envelope.

use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Path, Query, Request},
    http::request::Parts,
    Json,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use validator::Validate;

use crate::error::ApiError;

/// JSON body that has passed its `validator` rules
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        value.validate()?;
        Ok(Self(value))
    }
}

/// Path parameters
pub struct ApiPath<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for ApiPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state).await?;
        Ok(Self(value))
    }
}

/// Query string parameters
pub struct ApiQuery<T>(pub T);

#[async_trait]
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

/// Distinguishes an absent field (`None`) from an explicit `null`
/// (`Some(None)`). Pair with `#[serde(default)]`.
pub fn nullable<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
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

    #[derive(Deserialize)]
    struct Patch {
        #[serde(default, deserialize_with = "nullable")]
        assignee_id: Option<Option<Uuid>>,
    }

    #[test]
    fn test_nullable_field() {
        let absent: Patch = serde_json::from_str("{}").unwrap();
        assert_eq!(absent.assignee_id, None);

        let cleared: Patch = serde_json::from_str(r#"{"assignee_id": null}"#).unwrap();
        assert_eq!(cleared.assignee_id, Some(None));

        let id = Uuid::new_v4();
        let set: Patch = serde_json::from_str(&format!(r#"{{"assignee_id": "{}"}}"#, id)).unwrap();
        assert_eq!(set.assignee_id, Some(Some(id)));
    }
}
