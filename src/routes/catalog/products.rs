use actix_web::{web, HttpResponse};
use uuid::Uuid;

use crate::{
    db_interaction::products::{find_product, list_products, ProductFilters},
    routes::ApiError,
    utils::{DbPool, Page, PageQuery}
};

/// Storefront listing; only active products are visible
#[tracing::instrument("Listing products", skip(pool))]
pub async fn get_products(
    pool: web::Data<DbPool>,
    filters: web::Query<ProductFilters>,
    page: web::Query<PageQuery>
) -> Result<HttpResponse, ApiError>{
    let filters = ProductFilters{ is_active: Some(true), ..filters.into_inner() };
    if let (Some(min), Some(max)) = (filters.min_price, filters.max_price) {
        if min > max {
            return Err(ApiError::Validation("min_price must not exceed max_price".into()));
        }
    }

    let (products, count) = list_products(&pool, filters, *page).await?;
    Ok(HttpResponse::Ok().json(Page::new(products, count, &page)))
}

#[tracing::instrument("Getting product", skip(pool))]
pub async fn get_product(
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>
) -> Result<HttpResponse, ApiError>{
    Ok(HttpResponse::Ok().json(find_product(&pool, path.into_inner(), true).await?))
}
