use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::{
    auth::IsAdmin,
    db_interaction::orders::{list_orders, update_status, OrderFilters},
    domain::OrderStatus,
    routes::{audit, ApiError, RequestMeta},
    utils::{DbPool, Page, PageQuery}
};

#[derive(Deserialize, Debug)]
pub struct OrderStatusBody{
    pub status: OrderStatus,
    pub reason: Option<String>
}

#[tracing::instrument("Listing orders for admin", skip(pool, _admin))]
pub async fn get_admin_orders(
    pool: web::Data<DbPool>,
    _admin: IsAdmin,
    filters: web::Query<OrderFilters>,
    page: web::Query<PageQuery>
) -> Result<HttpResponse, ApiError>{
    let (orders, count) = list_orders(&pool, filters.into_inner(), *page).await?;
    Ok(HttpResponse::Ok().json(Page::new(orders, count, &page)))
}

#[tracing::instrument("Admin updating order status", skip(pool, admin, meta))]
pub async fn put_admin_order_status(
    pool: web::Data<DbPool>,
    admin: IsAdmin,
    meta: RequestMeta,
    path: web::Path<Uuid>,
    body: web::Json<OrderStatusBody>
) -> Result<HttpResponse, ApiError>{
    let body = body.into_inner();
    let changes = json!({ "status": body.status, "reason": body.reason });

    let order = update_status(&pool, path.into_inner(), None, body.status, body.reason).await?;
    audit(&pool, admin.0, &meta, "order_status_updated", "order", order.id, changes).await;

    Ok(HttpResponse::Ok().json(order))
}
