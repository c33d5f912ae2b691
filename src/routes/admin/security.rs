use actix_web::{web, HttpResponse};
use serde_json::json;
use uuid::Uuid;

use crate::{
    auth::IsAdmin,
    db_interaction::security::{list_events, list_fraud_alerts, resolve_fraud_alert, FraudAlertFilters, SecurityEventFilters},
    routes::{audit, ApiError, RequestMeta},
    utils::{DbPool, Page, PageQuery}
};

#[tracing::instrument("Listing security events", skip(pool, _admin))]
pub async fn get_security_events(
    pool: web::Data<DbPool>,
    _admin: IsAdmin,
    filters: web::Query<SecurityEventFilters>,
    page: web::Query<PageQuery>
) -> Result<HttpResponse, ApiError>{
    let (events, count) = list_events(&pool, filters.into_inner(), *page).await?;
    Ok(HttpResponse::Ok().json(Page::new(events, count, &page)))
}

#[tracing::instrument("Listing fraud alerts", skip(pool, _admin))]
pub async fn get_fraud_alerts(
    pool: web::Data<DbPool>,
    _admin: IsAdmin,
    filters: web::Query<FraudAlertFilters>,
    page: web::Query<PageQuery>
) -> Result<HttpResponse, ApiError>{
    let (alerts, count) = list_fraud_alerts(&pool, filters.into_inner(), *page).await?;
    Ok(HttpResponse::Ok().json(Page::new(alerts, count, &page)))
}

#[tracing::instrument("Resolving fraud alert", skip(pool, admin, meta))]
pub async fn post_fraud_alert_resolve(
    pool: web::Data<DbPool>,
    admin: IsAdmin,
    meta: RequestMeta,
    path: web::Path<Uuid>
) -> Result<HttpResponse, ApiError>{
    let alert = resolve_fraud_alert(&pool, path.into_inner(), admin.0).await?;
    audit(&pool, admin.0, &meta, "fraud_alert_resolved", "fraud_alert", alert.id, json!({ "status": alert.status })).await;

    Ok(HttpResponse::Ok().json(alert))
}
