use actix_web::{web, HttpResponse};
use serde_json::json;
use uuid::Uuid;

use crate::{
    auth::IsAdmin,
    db_interaction::users::{list_users, suspend_user, UserFilters},
    routes::{audit, ApiError, RequestMeta},
    utils::{DbPool, Page, PageQuery}
};

#[tracing::instrument("Listing users", skip(pool, _admin))]
pub async fn get_admin_users(
    pool: web::Data<DbPool>,
    _admin: IsAdmin,
    filters: web::Query<UserFilters>,
    page: web::Query<PageQuery>
) -> Result<HttpResponse, ApiError>{
    let (users, count) = list_users(&pool, filters.into_inner(), *page).await?;
    Ok(HttpResponse::Ok().json(Page::new(users, count, &page)))
}

#[tracing::instrument("Suspending user", skip(pool, admin, meta))]
pub async fn post_user_suspend(
    pool: web::Data<DbPool>,
    admin: IsAdmin,
    meta: RequestMeta,
    path: web::Path<Uuid>
) -> Result<HttpResponse, ApiError>{
    let user_id = path.into_inner();
    if user_id == admin.0 {
        return Err(ApiError::Validation("You cannot suspend your own account".into()));
    }

    let profile = suspend_user(&pool, user_id).await?;
    audit(&pool, admin.0, &meta, "user_suspended", "user", profile.id, json!({ "suspended": true })).await;

    Ok(HttpResponse::Ok().json(profile))
}
