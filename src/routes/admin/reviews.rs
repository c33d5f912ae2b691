use actix_web::{web, HttpResponse};
use serde_json::json;
use uuid::Uuid;

use crate::{
    auth::IsAdmin,
    db_interaction::reviews::{approve_review, delete_review, list_reviews, ReviewFilters},
    routes::{audit, ApiError, RequestMeta},
    utils::{DbPool, Page, PageQuery}
};

#[tracing::instrument("Listing reviews for moderation", skip(pool, _admin))]
pub async fn get_admin_reviews(
    pool: web::Data<DbPool>,
    _admin: IsAdmin,
    filters: web::Query<ReviewFilters>,
    page: web::Query<PageQuery>
) -> Result<HttpResponse, ApiError>{
    let (reviews, count) = list_reviews(&pool, filters.into_inner(), *page).await?;
    Ok(HttpResponse::Ok().json(Page::new(reviews, count, &page)))
}

#[tracing::instrument("Approving review", skip(pool, admin, meta))]
pub async fn post_review_approve(
    pool: web::Data<DbPool>,
    admin: IsAdmin,
    meta: RequestMeta,
    path: web::Path<Uuid>
) -> Result<HttpResponse, ApiError>{
    let review = approve_review(&pool, path.into_inner()).await?;
    audit(&pool, admin.0, &meta, "review_approved", "review", review.id, json!({ "is_approved": true })).await;

    Ok(HttpResponse::Ok().json(review))
}

#[tracing::instrument("Deleting review", skip(pool, admin, meta))]
pub async fn delete_admin_review(
    pool: web::Data<DbPool>,
    admin: IsAdmin,
    meta: RequestMeta,
    path: web::Path<Uuid>
) -> Result<HttpResponse, ApiError>{
    let review_id = path.into_inner();
    delete_review(&pool, review_id).await?;
    audit(&pool, admin.0, &meta, "review_deleted", "review", review_id, json!({})).await;

    Ok(HttpResponse::NoContent().finish())
}
