use chrono::{DateTime, Utc};
use diesel::{pg::Pg, prelude::*};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    domain::{OrderStatus, PaymentMethod, PaymentStatus},
    models::{NewPayment, Payment},
    schema::{orders, payments},
    utils::{DbPool, PageQuery}
};

use super::{run_query, QueryError};

#[derive(Deserialize, Debug, Default, Clone)]
pub struct PaymentFilters{
    pub status: Option<PaymentStatus>,
    pub method: Option<PaymentMethod>,
    pub buyer_id: Option<Uuid>,
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>
}

/// Records a pending payment for the full order total. Provider integration
/// happens outside this service; the row tracks the attempt.
#[tracing::instrument("Initiating payment", skip(pool))]
pub async fn initiate_payment(pool: &DbPool, buyer_id: Uuid, order_id: Uuid, method: PaymentMethod) -> Result<Payment, QueryError>{
    run_query(pool, move |conn| {
        conn.transaction::<_, QueryError, _>(|conn| {
            let (total, currency, status): (Decimal, String, OrderStatus) = orders::table
                .filter(orders::id.eq(order_id))
                .filter(orders::buyer_id.eq(buyer_id))
                .select((orders::total, orders::currency, orders::status))
                .first(conn)
                .map_err(|e| QueryError::from(e).or_missing("order"))?;

            if matches!(status, OrderStatus::Cancelled | OrderStatus::Refunded) {
                return Err(QueryError::Conflict(format!("Order is {} and cannot be paid", status)));
            }

            let settled: i64 = payments::table
                .filter(payments::order_id.eq(order_id))
                .filter(payments::status.eq_any(vec![PaymentStatus::Pending, PaymentStatus::Completed]))
                .count()
                .get_result(conn)?;
            if settled > 0 {
                return Err(QueryError::Conflict("Order already has a pending or completed payment".into()));
            }

            Ok(diesel::insert_into(payments::table)
                .values(&NewPayment{
                    id: Uuid::new_v4(),
                    order_id,
                    buyer_id,
                    amount: total,
                    currency,
                    payment_method: method,
                    status: PaymentStatus::Pending
                })
                .returning(Payment::as_returning())
                .get_result(conn)?)
        })
    })
    .await
}

fn filtered(filters: &PaymentFilters) -> payments::BoxedQuery<'static, Pg>{
    let mut query = payments::table.into_boxed();

    if let Some(status) = filters.status {
        query = query.filter(payments::status.eq(status));
    }
    if let Some(method) = filters.method {
        query = query.filter(payments::payment_method.eq(method));
    }
    if let Some(buyer_id) = filters.buyer_id {
        query = query.filter(payments::buyer_id.eq(buyer_id));
    }
    if let Some(from) = filters.date_from {
        query = query.filter(payments::created_at.ge(from));
    }
    if let Some(to) = filters.date_to {
        query = query.filter(payments::created_at.le(to));
    }

    query
}

#[tracing::instrument("Listing payments", skip(pool))]
pub async fn list_payments(pool: &DbPool, filters: PaymentFilters, page: PageQuery) -> Result<(Vec<Payment>, i64), QueryError>{
    run_query(pool, move |conn| {
        let count = filtered(&filters).count().get_result::<i64>(conn)?;
        let payments = filtered(&filters)
            .select(Payment::as_select())
            .order(payments::created_at.desc())
            .limit(page.limit())
            .offset(page.offset())
            .load(conn)?;

        Ok((payments, count))
    })
    .await
}
