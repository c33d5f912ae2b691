use actix_web::{web, HttpResponse};

use crate::{
    auth::IsAdmin,
    db_interaction::{audit::{list_audit_log, AuditFilters, DEFAULT_AUDIT_PAGE_SIZE}, dashboard::platform_kpis},
    routes::ApiError,
    utils::{DbPool, Page, PageQuery}
};

#[tracing::instrument("Loading dashboard", skip(pool, _admin))]
pub async fn get_dashboard(pool: web::Data<DbPool>, _admin: IsAdmin) -> Result<HttpResponse, ApiError>{
    Ok(HttpResponse::Ok().json(platform_kpis(&pool).await?))
}

#[tracing::instrument("Reading audit log", skip(pool, _admin))]
pub async fn get_audit_log(
    pool: web::Data<DbPool>,
    _admin: IsAdmin,
    filters: web::Query<AuditFilters>,
    page: web::Query<PageQuery>
) -> Result<HttpResponse, ApiError>{
    let page = page.into_inner().or_limit(DEFAULT_AUDIT_PAGE_SIZE);
    let (entries, count) = list_audit_log(&pool, filters.into_inner(), page).await?;

    Ok(HttpResponse::Ok().json(Page::new(entries, count, &page)))
}
