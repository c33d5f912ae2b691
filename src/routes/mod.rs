use std::{error::Error, fmt::Debug};

use actix_web::{http::{header::USER_AGENT, StatusCode}, FromRequest, HttpRequest, HttpResponse, ResponseError};
use futures_util::future::{ready, Ready};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::{
    db_interaction::{audit::{log_action, AuditRecord}, QueryError},
    security::request_client_ip,
    utils::{error_fmt_chain, DbPool}
};

pub mod health_check;
pub mod authentication;
pub mod profile;
pub mod catalog;
pub mod order;
pub mod payments;
pub mod cart;
pub mod wishlist;
pub mod vendor;
pub mod admin;

pub use health_check::health_check;

/// Error returned by every JSON handler. Rendered as `{"error": "<message>"}`.
#[derive(Error)]
pub enum ApiError{
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("Too many attempts, try again in {retry_after_secs} seconds")]
    RateLimited{ retry_after_secs: u64 },
    #[error("Unexpected error occured")]
    Unexpected(#[from] anyhow::Error)
}

impl Debug for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self)?;
        error_fmt_chain(f, &self.source())
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::RateLimited{..} => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR
        }
    }

    fn error_response(&self) -> HttpResponse<actix_web::body::BoxBody> {
        let mut response = HttpResponse::build(self.status_code());
        if let ApiError::RateLimited{ retry_after_secs } = self {
            response.insert_header(("Retry-After", retry_after_secs.to_string()));
        }
        response.json(json!({ "error": self.to_string() }))
    }
}

impl From<QueryError> for ApiError {
    fn from(e: QueryError) -> Self {
        match e {
            QueryError::NotFound(_) => ApiError::NotFound(e.to_string()),
            QueryError::Conflict(message) => ApiError::Conflict(message),
            QueryError::Invalid(message) => ApiError::Validation(message),
            other => ApiError::Unexpected(anyhow::Error::new(other))
        }
    }
}

/// Client address and user agent, recorded with audit entries
#[derive(Debug, Clone, Default)]
pub struct RequestMeta{
    pub ip: Option<String>,
    pub user_agent: Option<String>
}

impl FromRequest for RequestMeta {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
        let ip = request_client_ip(req);
        let user_agent = req.headers()
            .get(USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);

        ready(Ok(RequestMeta{ ip, user_agent }))
    }
}

/// Records an admin mutation; see [`log_action`]
pub async fn audit(
    pool: &DbPool,
    admin_id: Uuid,
    meta: &RequestMeta,
    action: &'static str,
    resource_type: &'static str,
    resource_id: impl ToString,
    changes: serde_json::Value
){
    log_action(pool, AuditRecord{
        admin_id,
        action,
        resource_type,
        resource_id: Some(resource_id.to_string()),
        changes,
        ip_address: meta.ip.clone(),
        user_agent: meta.user_agent.clone()
    })
    .await
}

#[cfg(test)]
mod tests {
    use actix_web::{body::to_bytes, http::StatusCode, ResponseError};

    use super::ApiError;
    use crate::db_interaction::QueryError;

    #[test]
    fn query_errors_map_to_client_statuses(){
        assert_eq!(ApiError::from(QueryError::NotFound("order")).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::from(QueryError::Conflict("taken".into())).status_code(), StatusCode::CONFLICT);
        assert_eq!(ApiError::from(QueryError::Invalid("bad".into())).status_code(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn rate_limited_response_carries_retry_after(){
        let response = ApiError::RateLimited{ retry_after_secs: 42 }.error_response();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers().get("Retry-After").unwrap(), "42");

        let body = to_bytes(response.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "Too many attempts, try again in 42 seconds");
    }
}
