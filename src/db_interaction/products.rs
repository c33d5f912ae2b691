use chrono::Utc;
use diesel::{pg::Pg, prelude::*};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    domain::{SubscriptionPlan, SubscriptionStatus},
    models::{NewProduct, Product, ProductChanges},
    schema::{products, vendor_subscriptions},
    utils::{DbPool, PageQuery}
};

use super::{like_pattern, run_query, QueryError};

#[derive(Deserialize, Debug, Default, Clone)]
pub struct ProductFilters{
    pub vendor_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub search: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub is_active: Option<bool>
}

fn filtered(filters: &ProductFilters) -> products::BoxedQuery<'static, Pg>{
    let mut query = products::table.into_boxed();

    if let Some(vendor_id) = filters.vendor_id {
        query = query.filter(products::vendor_id.eq(vendor_id));
    }
    if let Some(category_id) = filters.category_id {
        query = query.filter(products::category_id.eq(category_id));
    }
    if let Some(search) = filters.search.as_deref().filter(|s| !s.trim().is_empty()) {
        let pattern = like_pattern(search);
        query = query.filter(
            products::name.ilike(pattern.clone()).or(products::description.ilike(pattern))
        );
    }
    if let Some(min) = filters.min_price {
        query = query.filter(products::price.ge(min));
    }
    if let Some(max) = filters.max_price {
        query = query.filter(products::price.le(max));
    }
    if let Some(active) = filters.is_active {
        query = query.filter(products::is_active.eq(active));
    }

    query
}

#[tracing::instrument("Listing products", skip(pool))]
pub async fn list_products(pool: &DbPool, filters: ProductFilters, page: PageQuery) -> Result<(Vec<Product>, i64), QueryError>{
    run_query(pool, move |conn| {
        let count = filtered(&filters).count().get_result::<i64>(conn)?;
        let products = filtered(&filters)
            .select(Product::as_select())
            .order(products::created_at.desc())
            .limit(page.limit())
            .offset(page.offset())
            .load(conn)?;

        Ok((products, count))
    })
    .await
}

#[tracing::instrument("Getting product", skip(pool))]
pub async fn find_product(pool: &DbPool, product_id: Uuid, active_only: bool) -> Result<Product, QueryError>{
    run_query(pool, move |conn| {
        let mut query = products::table.filter(products::id.eq(product_id)).into_boxed();
        if active_only {
            query = query.filter(products::is_active.eq(true));
        }

        query
            .select(Product::as_select())
            .first(conn)
            .map_err(|e| QueryError::from(e).or_missing("product"))
    })
    .await
}

/// Product limit of the vendor's active plan; vendors without an active
/// subscription get the basic allowance.
pub fn vendor_plan(conn: &mut PgConnection, vendor_id: Uuid) -> Result<SubscriptionPlan, QueryError>{
    let plan = vendor_subscriptions::table
        .filter(vendor_subscriptions::vendor_id.eq(vendor_id))
        .filter(vendor_subscriptions::status.eq(SubscriptionStatus::Active))
        .order(vendor_subscriptions::start_date.desc())
        .select(vendor_subscriptions::plan)
        .first::<SubscriptionPlan>(conn)
        .optional()?;

    Ok(plan.unwrap_or(SubscriptionPlan::Basic))
}

#[tracing::instrument("Inserting product", skip(pool, product), fields(vendor_id = %product.vendor_id))]
pub async fn insert_product(pool: &DbPool, product: NewProduct) -> Result<Product, QueryError>{
    run_query(pool, move |conn| {
        conn.transaction::<_, QueryError, _>(|conn| {
            let plan = vendor_plan(conn, product.vendor_id)?;

            if let Some(limit) = plan.sku_limit() {
                let listed: i64 = products::table
                    .filter(products::vendor_id.eq(product.vendor_id))
                    .count()
                    .get_result(conn)?;

                if listed >= limit {
                    return Err(QueryError::Conflict(format!(
                        "The {} plan allows {} products; upgrade the subscription to list more",
                        plan, limit
                    )));
                }
            }

            Ok(diesel::insert_into(products::table)
                .values(&product)
                .returning(Product::as_returning())
                .get_result(conn)?)
        })
    })
    .await
}

/// Updates a product. With `vendor_id` set, only that vendor's product matches.
#[tracing::instrument("Updating product", skip(pool))]
pub async fn update_product(
    pool: &DbPool,
    product_id: Uuid,
    vendor_id: Option<Uuid>,
    mut changes: ProductChanges
) -> Result<Product, QueryError>{
    changes.validate().map_err(QueryError::Invalid)?;
    changes.updated_at = Some(Utc::now());

    run_query(pool, move |conn| {
        let mut target = products::table.filter(products::id.eq(product_id)).into_boxed();
        if let Some(vendor_id) = vendor_id {
            target = target.filter(products::vendor_id.eq(vendor_id));
        }
        let owned = target.select(products::id).first::<Uuid>(conn).optional()?;
        if owned.is_none() {
            return Err(QueryError::NotFound("product"));
        }

        Ok(diesel::update(products::table.find(product_id))
            .set(&changes)
            .returning(Product::as_returning())
            .get_result(conn)?)
    })
    .await
}

#[tracing::instrument("Deleting product", skip(pool))]
pub async fn delete_product(pool: &DbPool, product_id: Uuid, vendor_id: Uuid) -> Result<(), QueryError>{
    run_query(pool, move |conn| {
        let deleted = diesel::delete(products::table)
            .filter(products::id.eq(product_id))
            .filter(products::vendor_id.eq(vendor_id))
            .execute(conn)
            .map_err(|e| match QueryError::from(e) {
                QueryError::Conflict(_) => QueryError::Conflict("Product has orders; deactivate it instead".into()),
                other => other
            })?;

        if deleted == 0 {
            return Err(QueryError::NotFound("product"));
        }
        Ok(())
    })
    .await
}
