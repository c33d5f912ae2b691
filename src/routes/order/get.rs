use actix_web::{web, HttpResponse};
use uuid::Uuid;

use crate::{
    auth::IsUser,
    db_interaction::orders::{get_order, list_buyer_orders},
    routes::ApiError,
    utils::{DbPool, Page, PageQuery}
};

#[tracing::instrument(
    "Getting list of orders",
    skip(pool, user)
)]
pub async fn get_orders(
    pool: web::Data<DbPool>,
    page: web::Query<PageQuery>,
    user: IsUser
) -> Result<HttpResponse, ApiError>{
    let (orders, count) = list_buyer_orders(&pool, user.0, *page).await?;
    Ok(HttpResponse::Ok().json(Page::new(orders, count, &page)))
}

#[tracing::instrument(
    "Getting order with items",
    skip(pool, user)
)]
pub async fn get_order_by_id(
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
    user: IsUser
) -> Result<HttpResponse, ApiError>{
    Ok(HttpResponse::Ok().json(get_order(&pool, path.into_inner(), Some(user.0), None).await?))
}
