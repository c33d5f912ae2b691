use actix_web::{web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    auth::{IsUser, UserRole},
    db_interaction::reviews::{create_review, list_product_reviews, mark_helpful, review_stats, ReviewSubmission},
    domain::Rating,
    routes::ApiError,
    utils::{DbPool, Page, PageQuery}
};

#[derive(Deserialize, Debug)]
pub struct ReviewBody{
    pub rating: i32,
    pub title: Option<String>,
    pub comment: Option<String>,
    pub order_id: Option<Uuid>
}

#[tracing::instrument("Listing product reviews", skip(pool))]
pub async fn get_reviews(
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
    page: web::Query<PageQuery>
) -> Result<HttpResponse, ApiError>{
    let (reviews, count) = list_product_reviews(&pool, path.into_inner(), *page).await?;
    Ok(HttpResponse::Ok().json(Page::new(reviews, count, &page)))
}

#[tracing::instrument("Getting product review stats", skip(pool))]
pub async fn get_review_stats(
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>
) -> Result<HttpResponse, ApiError>{
    Ok(HttpResponse::Ok().json(review_stats(&pool, path.into_inner()).await?))
}

#[tracing::instrument("Posting review", skip(pool, user, body))]
pub async fn post_review(
    pool: web::Data<DbPool>,
    user: IsUser,
    path: web::Path<Uuid>,
    body: web::Json<ReviewBody>
) -> Result<HttpResponse, ApiError>{
    if user.1 != UserRole::Buyer {
        return Err(ApiError::Forbidden("Only buyers can review products".into()));
    }

    let body = body.into_inner();
    let rating = Rating::parse(body.rating).map_err(ApiError::Validation)?;

    let review = create_review(&pool, ReviewSubmission{
        product_id: path.into_inner(),
        buyer_id: user.0,
        order_id: body.order_id,
        rating,
        title: body.title.filter(|t| !t.trim().is_empty()),
        comment: body.comment.filter(|c| !c.trim().is_empty())
    })
    .await?;

    Ok(HttpResponse::Created().json(review))
}

#[tracing::instrument("Marking review helpful", skip(pool, _user))]
pub async fn post_helpful(
    pool: web::Data<DbPool>,
    _user: IsUser,
    path: web::Path<Uuid>
) -> Result<HttpResponse, ApiError>{
    Ok(HttpResponse::Ok().json(mark_helpful(&pool, path.into_inner()).await?))
}
