use chrono::Utc;
use diesel::prelude::*;
use uuid::Uuid;

use crate::{
    domain::Quantity,
    models::{CartItem, NewCartItem},
    schema::{cart_items, products},
    utils::DbPool
};

use super::{run_query, QueryError};

#[tracing::instrument("Listing cart items", skip(pool))]
pub async fn list_cart(pool: &DbPool, buyer_id: Uuid) -> Result<Vec<CartItem>, QueryError>{
    run_query(pool, move |conn| {
        Ok(cart_items::table
            .filter(cart_items::buyer_id.eq(buyer_id))
            .select(CartItem::as_select())
            .order(cart_items::created_at.asc())
            .load(conn)?)
    })
    .await
}

/// Adds `quantity` of a product to the buyer's cart. An existing entry for the
/// same (product, variant) key has its quantity increased instead.
#[tracing::instrument("Upserting cart item", skip(pool))]
pub async fn upsert_cart_item(
    pool: &DbPool,
    buyer_id: Uuid,
    product_id: Uuid,
    variant_id: Option<Uuid>,
    quantity: Quantity
) -> Result<CartItem, QueryError>{
    run_query(pool, move |conn| {
        conn.transaction::<_, QueryError, _>(|conn| {
            let active = products::table
                .filter(products::id.eq(product_id))
                .filter(products::is_active.eq(true))
                .select(products::id)
                .first::<Uuid>(conn)
                .optional()?;
            if active.is_none() {
                return Err(QueryError::NotFound("product"));
            }

            let existing = cart_items::table
                .filter(cart_items::buyer_id.eq(buyer_id))
                .filter(cart_items::product_id.eq(product_id))
                .filter(cart_items::variant_id.is_not_distinct_from(variant_id))
                .select(CartItem::as_select())
                .for_update()
                .first(conn)
                .optional()?;

            match existing {
                Some(item) => {
                    let merged = Quantity::parse(item.quantity)
                        .unwrap_or(Quantity::ONE)
                        .saturating_add(quantity);
                    Ok(diesel::update(cart_items::table.find(item.id))
                        .set((
                            cart_items::quantity.eq(merged.get()),
                            cart_items::updated_at.eq(Utc::now())
                        ))
                        .returning(CartItem::as_returning())
                        .get_result(conn)?)
                },
                None => Ok(diesel::insert_into(cart_items::table)
                    .values(&NewCartItem{
                        id: Uuid::new_v4(),
                        buyer_id,
                        product_id,
                        variant_id,
                        quantity: quantity.get()
                    })
                    .returning(CartItem::as_returning())
                    .get_result(conn)?)
            }
        })
    })
    .await
}

/// Sets an entry's quantity; zero or less removes it and returns `None`
#[tracing::instrument("Updating cart item quantity", skip(pool))]
pub async fn update_cart_quantity(
    pool: &DbPool,
    buyer_id: Uuid,
    item_id: Uuid,
    quantity: i32
) -> Result<Option<CartItem>, QueryError>{
    if quantity <= 0 {
        remove_cart_item(pool, buyer_id, item_id).await?;
        return Ok(None);
    }
    let quantity = Quantity::parse(quantity).map_err(QueryError::Invalid)?;

    run_query(pool, move |conn| {
        diesel::update(cart_items::table)
            .filter(cart_items::id.eq(item_id))
            .filter(cart_items::buyer_id.eq(buyer_id))
            .set((
                cart_items::quantity.eq(quantity.get()),
                cart_items::updated_at.eq(Utc::now())
            ))
            .returning(CartItem::as_returning())
            .get_result(conn)
            .map(Some)
            .map_err(|e| QueryError::from(e).or_missing("cart item"))
    })
    .await
}

#[tracing::instrument("Removing cart item", skip(pool))]
pub async fn remove_cart_item(pool: &DbPool, buyer_id: Uuid, item_id: Uuid) -> Result<(), QueryError>{
    run_query(pool, move |conn| {
        let deleted = diesel::delete(cart_items::table)
            .filter(cart_items::id.eq(item_id))
            .filter(cart_items::buyer_id.eq(buyer_id))
            .execute(conn)?;
        if deleted == 0 {
            return Err(QueryError::NotFound("cart item"));
        }
        Ok(())
    })
    .await
}

/// Empties the buyer's cart, returning how many entries were removed
#[tracing::instrument("Clearing cart", skip(pool))]
pub async fn clear_cart(pool: &DbPool, buyer_id: Uuid) -> Result<usize, QueryError>{
    run_query(pool, move |conn| {
        Ok(diesel::delete(cart_items::table)
            .filter(cart_items::buyer_id.eq(buyer_id))
            .execute(conn)?)
    })
    .await
}
