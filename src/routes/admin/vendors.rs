use actix_web::{web, HttpResponse};
use serde_json::json;
use uuid::Uuid;

use crate::{
    auth::IsAdmin,
    db_interaction::vendors::{find_by_id, list_vendors, review_vendor, VendorFilters, VendorReview},
    routes::{audit, vendor::VendorView, ApiError, RequestMeta},
    utils::{DbPool, Page, PageQuery}
};

#[tracing::instrument("Listing vendors", skip(pool, _admin))]
pub async fn get_admin_vendors(
    pool: web::Data<DbPool>,
    _admin: IsAdmin,
    filters: web::Query<VendorFilters>,
    page: web::Query<PageQuery>
) -> Result<HttpResponse, ApiError>{
    let (vendors, count) = list_vendors(&pool, filters.into_inner(), *page).await?;
    let vendors = vendors.into_iter().map(VendorView::from).collect();

    Ok(HttpResponse::Ok().json(Page::new(vendors, count, &page)))
}

#[tracing::instrument("Getting vendor", skip(pool, _admin))]
pub async fn get_admin_vendor(
    pool: web::Data<DbPool>,
    _admin: IsAdmin,
    path: web::Path<Uuid>
) -> Result<HttpResponse, ApiError>{
    let vendor = find_by_id(&pool, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(VendorView::from(vendor)))
}

async fn decide(
    pool: &DbPool,
    admin: IsAdmin,
    meta: RequestMeta,
    vendor_id: Uuid,
    decision: VendorReview
) -> Result<HttpResponse, ApiError>{
    let vendor = review_vendor(pool, vendor_id, decision).await?;

    audit(
        pool,
        admin.0,
        &meta,
        decision.audit_action(),
        "vendor",
        vendor.id,
        json!({ "is_verified": vendor.is_verified, "kyc_status": vendor.kyc_status })
    )
    .await;

    Ok(HttpResponse::Ok().json(VendorView::from(vendor)))
}

#[tracing::instrument("Approving vendor", skip(pool, admin, meta))]
pub async fn post_vendor_approve(
    pool: web::Data<DbPool>,
    admin: IsAdmin,
    meta: RequestMeta,
    path: web::Path<Uuid>
) -> Result<HttpResponse, ApiError>{
    decide(&pool, admin, meta, path.into_inner(), VendorReview::Approve).await
}

#[tracing::instrument("Rejecting vendor", skip(pool, admin, meta))]
pub async fn post_vendor_reject(
    pool: web::Data<DbPool>,
    admin: IsAdmin,
    meta: RequestMeta,
    path: web::Path<Uuid>
) -> Result<HttpResponse, ApiError>{
    decide(&pool, admin, meta, path.into_inner(), VendorReview::Reject).await
}

#[tracing::instrument("Suspending vendor", skip(pool, admin, meta))]
pub async fn post_vendor_suspend(
    pool: web::Data<DbPool>,
    admin: IsAdmin,
    meta: RequestMeta,
    path: web::Path<Uuid>
) -> Result<HttpResponse, ApiError>{
    decide(&pool, admin, meta, path.into_inner(), VendorReview::Suspend).await
}
