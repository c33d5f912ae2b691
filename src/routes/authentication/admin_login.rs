use actix_web::{web, HttpResponse};

use crate::{
    auth::{Tokenizer, UserRole},
    db_interaction::staff::{admin_access, AdminAccess},
    domain::UserEmail,
    routes::{ApiError, RequestMeta},
    security::RateLimiter,
    utils::DbPool
};

use super::login::{authenticate, issue_token, LoginBody};

/// Login for the admin portal. Valid credentials of a non-admin account get
/// 403; a failure to look up the account's permissions is a 500.
#[tracing::instrument(
    "Logging in admin",
    skip(pool, tokenizer, limiter, body, meta)
)]
pub async fn admin_login(
    pool: web::Data<DbPool>,
    tokenizer: web::Data<Tokenizer>,
    limiter: web::Data<RateLimiter>,
    body: web::Json<LoginBody>,
    meta: RequestMeta
) -> Result<HttpResponse, ApiError>{
    let body = body.into_inner();
    let email = UserEmail::parse(body.email).map_err(ApiError::Validation)?;
    let rate_key = format!("admin:{}", email);

    let profile = authenticate(&pool, &limiter, &meta, &rate_key, &email, body.password).await?;

    let role = match admin_access(&pool, profile.id).await {
        Ok(AdminAccess::SuperAdmin) => UserRole::SuperAdmin,
        Ok(AdminAccess::Admin) => UserRole::Admin,
        Ok(AdminAccess::NotAdmin) => {
            tracing::warn!(profile_id = %profile.id, "Non-admin account attempted admin login");
            return Err(ApiError::Forbidden("This account does not have admin access".into()));
        },
        Err(e) => {
            return Err(ApiError::Unexpected(
                anyhow::Error::new(e).context("Failed to check admin access")
            ));
        }
    };

    Ok(HttpResponse::Ok().json(issue_token(&tokenizer, profile, role)?))
}
