use diesel::prelude::*;
use uuid::Uuid;

use crate::{
    models::WishlistItem,
    schema::{products, wishlists},
    utils::DbPool
};

use super::{run_query, QueryError};

#[tracing::instrument("Listing wishlist", skip(pool))]
pub async fn list_wishlist(pool: &DbPool, buyer_id: Uuid) -> Result<Vec<WishlistItem>, QueryError>{
    run_query(pool, move |conn| {
        Ok(wishlists::table
            .filter(wishlists::buyer_id.eq(buyer_id))
            .select(WishlistItem::as_select())
            .order(wishlists::created_at.desc())
            .load(conn)?)
    })
    .await
}

/// Adds a product to the wishlist. Adding it twice returns the existing entry.
#[tracing::instrument("Adding to wishlist", skip(pool))]
pub async fn add_to_wishlist(pool: &DbPool, buyer_id: Uuid, product_id: Uuid) -> Result<WishlistItem, QueryError>{
    run_query(pool, move |conn| {
        let exists = products::table
            .find(product_id)
            .select(products::id)
            .first::<Uuid>(conn)
            .optional()?;
        if exists.is_none() {
            return Err(QueryError::NotFound("product"));
        }

        let inserted = diesel::insert_into(wishlists::table)
            .values((
                wishlists::id.eq(Uuid::new_v4()),
                wishlists::buyer_id.eq(buyer_id),
                wishlists::product_id.eq(product_id)
            ))
            .on_conflict((wishlists::buyer_id, wishlists::product_id))
            .do_nothing()
            .returning(WishlistItem::as_returning())
            .get_result(conn)
            .optional()?;

        match inserted {
            Some(item) => Ok(item),
            None => Ok(wishlists::table
                .filter(wishlists::buyer_id.eq(buyer_id))
                .filter(wishlists::product_id.eq(product_id))
                .select(WishlistItem::as_select())
                .first(conn)?)
        }
    })
    .await
}

#[tracing::instrument("Removing from wishlist", skip(pool))]
pub async fn remove_from_wishlist(pool: &DbPool, buyer_id: Uuid, item_id: Uuid) -> Result<(), QueryError>{
    run_query(pool, move |conn| {
        let deleted = diesel::delete(wishlists::table)
            .filter(wishlists::id.eq(item_id))
            .filter(wishlists::buyer_id.eq(buyer_id))
            .execute(conn)?;
        if deleted == 0 {
            return Err(QueryError::NotFound("wishlist item"));
        }
        Ok(())
    })
    .await
}

#[tracing::instrument("Checking wishlist", skip(pool))]
pub async fn wishlist_contains(pool: &DbPool, buyer_id: Uuid, product_id: Uuid) -> Result<bool, QueryError>{
    run_query(pool, move |conn| {
        let count: i64 = wishlists::table
            .filter(wishlists::buyer_id.eq(buyer_id))
            .filter(wishlists::product_id.eq(product_id))
            .count()
            .get_result(conn)?;
        Ok(count > 0)
    })
    .await
}
