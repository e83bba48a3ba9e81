//! Validating extractors
//!
//! `ValidatedQuery` and `ValidatedJson` deserialize like axum's `Query` and
//! `Json`, then run `validator::Validate`. A body or query string that does
//! not deserialize is a server error; a value that deserializes but fails
//! validation is a logic error carrying the first message.

use axum::{
    extract::{FromRequest, FromRequestParts, Query, Request},
    http::request::Parts,
    Json,
};
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors};

use super::ApiError;

/// Query string extractor with validation
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for ValidatedQuery<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::server(format!("Failed to bind query: {}", e)))?;
        value
            .validate()
            .map_err(|e| ApiError::logic(first_message(&e)))?;
        Ok(Self(value))
    }
}

/// JSON body extractor with validation
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| ApiError::server(format!("Failed to bind body: {}", e)))?;
        value
            .validate()
            .map_err(|e| ApiError::logic(first_message(&e)))?;
        Ok(Self(value))
    }
}

/// First validation message, taking fields in name order
pub fn first_message(errors: &ValidationErrors) -> String {
    let fields = errors.field_errors();
    let mut names: Vec<_> = fields.keys().collect();
    names.sort();

    for name in names {
        if let Some(error) = fields.get(name).and_then(|list| list.first()) {
            return match &error.message {
                Some(message) => message.to_string(),
                None => format!("{}: {}", name, error.code),
            };
        }
    }

    errors.to_string()
}
