//! Bind + validate extractors
//!
//! The gate between the router and a handler: deserialize the request into
//! its DTO, run the DTO's `Validate` rules, and reject with a 400-class
//! envelope before the handler runs. Handlers declare `ValidatedJson<T>` or
//! `ValidatedQuery<T>` instead of the raw extractors.

use async_trait::async_trait;
use axum::extract::{FromRequest, FromRequestParts, Query, Request};
use axum::http::request::Parts;
use axum::Json;
use serde::de::DeserializeOwned;
use shared::error::AppError;
use shared::params::Validate;

/// JSON body, bound then validated
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| AppError::param_error(e.body_text()))?;
        value.validate().map_err(AppError::param_error)?;
        Ok(ValidatedJson(value))
    }
}

/// Query string, bound then validated
pub struct ValidatedQuery<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for ValidatedQuery<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|e| AppError::param_error(e.to_string()))?;
        value.validate().map_err(AppError::param_error)?;
        Ok(ValidatedQuery(value))
    }
}
