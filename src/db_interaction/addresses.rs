use diesel::prelude::*;
use uuid::Uuid;

use crate::{models::{Address, NewAddress}, schema::addresses, utils::DbPool};

use super::{run_query, QueryError};

#[tracing::instrument("Listing addresses", skip(pool))]
pub async fn list_addresses(pool: &DbPool, profile_id: Uuid) -> Result<Vec<Address>, QueryError>{
    run_query(pool, move |conn| {
        Ok(addresses::table
            .filter(addresses::profile_id.eq(profile_id))
            .select(Address::as_select())
            .order((addresses::is_default.desc(), addresses::created_at.asc()))
            .load(conn)?)
    })
    .await
}

/// Inserts an address. A profile's first address becomes its default, and a
/// new default demotes the previous one in the same transaction.
#[tracing::instrument("Inserting address", skip(pool))]
pub async fn insert_address(pool: &DbPool, mut address: NewAddress) -> Result<Address, QueryError>{
    run_query(pool, move |conn| {
        conn.transaction::<_, QueryError, _>(|conn| {
            let existing: i64 = addresses::table
                .filter(addresses::profile_id.eq(address.profile_id))
                .count()
                .get_result(conn)?;

            if existing == 0 {
                address.is_default = true;
            }
            if address.is_default {
                clear_default(conn, address.profile_id)?;
            }

            Ok(diesel::insert_into(addresses::table)
                .values(&address)
                .returning(Address::as_returning())
                .get_result(conn)?)
        })
    })
    .await
}

fn clear_default(conn: &mut PgConnection, profile_id: Uuid) -> Result<(), QueryError>{
    diesel::update(addresses::table)
        .filter(addresses::profile_id.eq(profile_id))
        .filter(addresses::is_default.eq(true))
        .set(addresses::is_default.eq(false))
        .execute(conn)?;
    Ok(())
}

#[tracing::instrument("Setting default address", skip(pool))]
pub async fn set_default_address(pool: &DbPool, profile_id: Uuid, address_id: Uuid) -> Result<Address, QueryError>{
    run_query(pool, move |conn| {
        conn.transaction::<_, QueryError, _>(|conn| {
            let owned = addresses::table
                .filter(addresses::id.eq(address_id))
                .filter(addresses::profile_id.eq(profile_id))
                .select(addresses::id)
                .first::<Uuid>(conn)
                .optional()?;
            if owned.is_none() {
                return Err(QueryError::NotFound("address"));
            }

            clear_default(conn, profile_id)?;

            Ok(diesel::update(addresses::table.find(address_id))
                .set(addresses::is_default.eq(true))
                .returning(Address::as_returning())
                .get_result(conn)?)
        })
    })
    .await
}

#[tracing::instrument("Deleting address", skip(pool))]
pub async fn delete_address(pool: &DbPool, profile_id: Uuid, address_id: Uuid) -> Result<(), QueryError>{
    run_query(pool, move |conn| {
        let deleted = diesel::delete(addresses::table)
            .filter(addresses::id.eq(address_id))
            .filter(addresses::profile_id.eq(profile_id))
            .execute(conn)?;

        if deleted == 0 {
            return Err(QueryError::NotFound("address"));
        }
        Ok(())
    })
    .await
}
