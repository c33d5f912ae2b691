use actix_web::{web, HttpResponse};
use anyhow::Context;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::{
    auth::{Tokenizer, UserRole},
    db_interaction::{security::record_event, users},
    domain::UserEmail,
    models::{NewSecurityEvent, Profile},
    password::verify_password,
    routes::{ApiError, RequestMeta},
    security::{RateLimitDecision, RateLimiter},
    utils::DbPool
};

#[derive(Deserialize, Debug)]
pub struct LoginBody{
    pub email: String,
    pub password: SecretString
}

#[derive(Serialize, Debug)]
pub struct LoginResponse{
    pub token: String,
    pub role: UserRole,
    pub profile: Profile
}

/// Checks the credentials against the stored hash, counting the attempt
/// against `rate_key`. The counter is cleared on success.
#[tracing::instrument("Authenticating credentials", skip(pool, limiter, meta, password))]
pub async fn authenticate(
    pool: &DbPool,
    limiter: &RateLimiter,
    meta: &RequestMeta,
    rate_key: &str,
    email: &UserEmail,
    password: SecretString
) -> Result<Profile, ApiError>{
    if let RateLimitDecision::Denied{ attempts, retry_after } = limiter.check(rate_key) {
        tracing::warn!(attempts, "Login rate limit exceeded");
        record_event(pool, NewSecurityEvent{
            id: Uuid::new_v4(),
            event_type: "rate_limit_exceeded".to_string(),
            identifier: Some(email.inner()),
            details: json!({ "attempts": attempts, "retry_after_secs": retry_after.as_secs() }),
            ip_address: meta.ip.clone(),
            user_agent: meta.user_agent.clone()
        })
        .await;

        return Err(ApiError::RateLimited{ retry_after_secs: retry_after.as_secs().max(1) });
    }

    let profile = users::find_by_email(pool, email.inner())
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Email or password is incorrect".into()))?;

    let matches = verify_password(password, profile.password_hash.clone())
        .await
        .context("Failed to verify password")?;
    if !matches {
        tracing::info!("Passwords did not match");
        return Err(ApiError::Unauthorized("Email or password is incorrect".into()));
    }

    limiter.clear(rate_key);
    Ok(profile)
}

pub fn issue_token(tokenizer: &Tokenizer, profile: Profile, role: UserRole) -> Result<LoginResponse, ApiError>{
    let token = tokenizer.generate_key(profile.id, &profile.email, role)
        .context("Failed to sign token")?;

    Ok(LoginResponse{ token, role, profile })
}

#[tracing::instrument(
    "Logging in user",
    skip(pool, tokenizer, limiter, body, meta)
)]
pub async fn login(
    pool: web::Data<DbPool>,
    tokenizer: web::Data<Tokenizer>,
    limiter: web::Data<RateLimiter>,
    body: web::Json<LoginBody>,
    meta: RequestMeta
) -> Result<HttpResponse, ApiError>{
    let body = body.into_inner();
    let email = UserEmail::parse(body.email).map_err(ApiError::Validation)?;

    let profile = authenticate(&pool, &limiter, &meta, email.as_ref(), &email, body.password).await?;
    let role = UserRole::from(profile.role);

    Ok(HttpResponse::Ok().json(issue_token(&tokenizer, profile, role)?))
}
