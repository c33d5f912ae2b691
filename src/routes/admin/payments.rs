use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::{
    auth::IsAdmin,
    configuration::PaymentSettings,
    db_interaction::{finance::financial_report, payments::{list_payments, PaymentFilters}, vendors::find_by_id},
    routes::{audit, ApiError, RequestMeta},
    utils::{DbPool, Page, PageQuery}
};

#[derive(Deserialize, Debug)]
pub struct PayoutBody{
    pub vendor_id: Uuid,
    pub amount: Decimal,
    pub reference: Option<String>
}

#[derive(Deserialize, Debug)]
pub struct ReportQuery{
    pub date_from: DateTime<Utc>,
    pub date_to: DateTime<Utc>
}

#[tracing::instrument("Listing payments for admin", skip(pool, _admin))]
pub async fn get_admin_payments(
    pool: web::Data<DbPool>,
    _admin: IsAdmin,
    filters: web::Query<PaymentFilters>,
    page: web::Query<PageQuery>
) -> Result<HttpResponse, ApiError>{
    let (payments, count) = list_payments(&pool, filters.into_inner(), *page).await?;
    Ok(HttpResponse::Ok().json(Page::new(payments, count, &page)))
}

/// Records a vendor payout. Money moves outside this service; the audit
/// entry is the record.
#[tracing::instrument("Processing payout", skip(pool, admin, meta))]
pub async fn post_payout(
    pool: web::Data<DbPool>,
    admin: IsAdmin,
    meta: RequestMeta,
    body: web::Json<PayoutBody>
) -> Result<HttpResponse, ApiError>{
    let body = body.into_inner();
    if body.amount <= Decimal::ZERO {
        return Err(ApiError::Validation("payout amount must be positive".into()));
    }
    if body.amount.normalize().scale() > 2 {
        return Err(ApiError::Validation("payout amount cannot have fractions of a cent".into()));
    }
    let vendor = find_by_id(&pool, body.vendor_id).await?;

    let payout = json!({
        "vendor_id": vendor.id,
        "amount": body.amount,
        "reference": body.reference,
        "processed_at": Utc::now()
    });
    audit(&pool, admin.0, &meta, "payout_processed", "vendor", vendor.id, payout.clone()).await;

    Ok(HttpResponse::Ok().json(payout))
}

#[tracing::instrument("Generating finance report", skip(pool, _admin, settings))]
pub async fn get_finance_report(
    pool: web::Data<DbPool>,
    _admin: IsAdmin,
    settings: web::Data<PaymentSettings>,
    query: web::Query<ReportQuery>
) -> Result<HttpResponse, ApiError>{
    let report = financial_report(&pool, query.date_from, query.date_to, settings.commission_rate).await?;
    Ok(HttpResponse::Ok().json(report))
}
