use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use diesel::{pg::Pg, prelude::*};
use rand::Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    configuration::OrderSettings,
    domain::{pricing::price_order, FraudAlertStatus, OrderStatus, Quantity},
    models::{NewFraudAlert, NewOrder, NewOrderItem, Order, OrderItem, Product},
    schema::{fraud_alerts, order_items, orders, products},
    utils::{DbPool, PageQuery}
};

use super::{like_pattern, run_query, QueryError};

const FRAUD_RISK_SCORE: i32 = 70;

#[derive(Deserialize, Debug, Clone)]
pub struct OrderLine{
    pub product_id: Uuid,
    pub variant_id: Option<Uuid>,
    pub quantity: Quantity
}

#[derive(Debug, Clone)]
pub struct Checkout{
    pub buyer_id: Uuid,
    pub lines: Vec<OrderLine>,
    pub shipping_address: serde_json::Value,
    pub notes: Option<String>,
    pub currency: String,
    pub fraud_review_threshold: Decimal
}

#[derive(Serialize, Debug)]
pub struct OrderWithItems{
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>
}

#[derive(Deserialize, Debug, Default, Clone)]
pub struct OrderFilters{
    pub status: Option<OrderStatus>,
    pub vendor_id: Option<Uuid>,
    pub buyer_id: Option<Uuid>,
    pub search: Option<String>,
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>
}

/// `ORD-<base36 millis>-<6 random base36 chars>`, upper case
pub fn generate_order_number() -> String{
    const DIGITS: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

    let mut millis = Utc::now().timestamp_millis().max(0) as u64;
    let mut timestamp = Vec::new();
    loop {
        timestamp.push(DIGITS[(millis % 36) as usize]);
        millis /= 36;
        if millis == 0 {
            break;
        }
    }
    timestamp.reverse();

    let mut rng = rand::thread_rng();
    let random: String = (0..6)
        .map(|_| char::from(DIGITS[rng.gen_range(0..DIGITS.len())]))
        .collect();

    format!("ORD-{}-{}", String::from_utf8_lossy(&timestamp), random)
}

/// Merges repeated (product, variant) lines into one
fn merge_lines(lines: Vec<OrderLine>) -> Vec<OrderLine>{
    let mut merged: Vec<OrderLine> = Vec::with_capacity(lines.len());
    for line in lines {
        match merged.iter_mut().find(|l| l.product_id == line.product_id && l.variant_id == line.variant_id) {
            Some(existing) => existing.quantity = existing.quantity.saturating_add(line.quantity),
            None => merged.push(line)
        }
    }
    merged
}

/// Places one order per vendor for the submitted lines. Prices come from the
/// products table and stock is decremented in the same transaction; any line
/// without enough stock aborts the whole checkout.
#[tracing::instrument(
    "Creating orders and decrementing stock",
    skip_all,
    fields(buyer_id = %checkout.buyer_id, lines = checkout.lines.len())
)]
pub async fn create_orders(pool: &DbPool, checkout: Checkout, settings: OrderSettings) -> Result<Vec<OrderWithItems>, QueryError>{
    if checkout.lines.is_empty() {
        return Err(QueryError::Invalid("An order needs at least one item".into()));
    }

    run_query(pool, move |conn| {
        conn.transaction::<_, QueryError, _>(|conn| {
            let lines = merge_lines(checkout.lines);
            let product_ids: Vec<Uuid> = lines.iter().map(|l| l.product_id).collect();

            let catalog: HashMap<Uuid, Product> = products::table
                .filter(products::id.eq_any(&product_ids))
                .filter(products::is_active.eq(true))
                .select(Product::as_select())
                .load(conn)?
                .into_iter()
                .map(|p| (p.id, p))
                .collect();

            let mut by_vendor: BTreeMap<Uuid, Vec<(&Product, &OrderLine)>> = BTreeMap::new();
            for line in &lines {
                let product = catalog.get(&line.product_id)
                    .ok_or_else(|| QueryError::Invalid(format!("Product {} is not available", line.product_id)))?;

                let updated = diesel::update(products::table.find(product.id))
                    .filter(products::stock.ge(line.quantity.get()))
                    .set((
                        products::stock.eq(products::stock - line.quantity.get()),
                        products::updated_at.eq(Utc::now())
                    ))
                    .execute(conn)?;
                if updated == 0 {
                    return Err(QueryError::Conflict(format!("Insufficient stock for {}", product.name)));
                }

                by_vendor.entry(product.vendor_id).or_default().push((product, line));
            }

            let mut placed = Vec::with_capacity(by_vendor.len());
            for (vendor_id, vendor_lines) in by_vendor {
                let priced: Vec<(Decimal, Quantity)> = vendor_lines.iter()
                    .map(|(product, line)| (product.price, line.quantity))
                    .collect();
                let totals = price_order(&priced, &settings);

                if totals.total > settings.max_order_amount {
                    return Err(QueryError::Invalid(format!(
                        "Order total {:.2} exceeds the maximum of {:.2}", totals.total, settings.max_order_amount
                    )));
                }

                let order = diesel::insert_into(orders::table)
                    .values(&NewOrder{
                        id: Uuid::new_v4(),
                        order_number: generate_order_number(),
                        buyer_id: checkout.buyer_id,
                        vendor_id,
                        status: OrderStatus::Pending,
                        subtotal: totals.subtotal,
                        tax: totals.tax,
                        shipping_cost: totals.shipping_cost,
                        discount: totals.discount,
                        total: totals.total,
                        currency: checkout.currency.clone(),
                        shipping_address: checkout.shipping_address.clone(),
                        notes: checkout.notes.clone()
                    })
                    .returning(Order::as_returning())
                    .get_result(conn)?;

                let new_items: Vec<NewOrderItem> = vendor_lines.iter()
                    .zip(totals.lines.iter())
                    .map(|((product, line), line_totals)| NewOrderItem{
                        id: Uuid::new_v4(),
                        order_id: order.id,
                        product_id: product.id,
                        variant_id: line.variant_id,
                        product_name: product.name.clone(),
                        quantity: line_totals.quantity,
                        unit_price: line_totals.unit_price,
                        subtotal: line_totals.subtotal,
                        tax: line_totals.tax,
                        total: line_totals.total
                    })
                    .collect();

                let items = diesel::insert_into(order_items::table)
                    .values(&new_items)
                    .returning(OrderItem::as_returning())
                    .get_results(conn)?;

                if order.total >= checkout.fraud_review_threshold {
                    tracing::warn!(order_id = %order.id, total = %order.total, "Order flagged for fraud review");
                    diesel::insert_into(fraud_alerts::table)
                        .values(&NewFraudAlert{
                            id: Uuid::new_v4(),
                            order_id: Some(order.id),
                            profile_id: Some(checkout.buyer_id),
                            reason: format!("Order total {:.2} reached the review threshold", order.total),
                            risk_score: FRAUD_RISK_SCORE,
                            status: FraudAlertStatus::Open
                        })
                        .execute(conn)?;
                }

                placed.push(OrderWithItems{ order, items });
            }

            Ok(placed)
        })
    })
    .await
}

fn load_items(conn: &mut PgConnection, order_id: Uuid) -> Result<Vec<OrderItem>, QueryError>{
    Ok(order_items::table
        .filter(order_items::order_id.eq(order_id))
        .select(OrderItem::as_select())
        .order(order_items::created_at.asc())
        .load(conn)?)
}

#[tracing::instrument("Listing buyer orders", skip(pool))]
pub async fn list_buyer_orders(pool: &DbPool, buyer_id: Uuid, page: PageQuery) -> Result<(Vec<Order>, i64), QueryError>{
    list_orders(pool, OrderFilters{ buyer_id: Some(buyer_id), ..Default::default() }, page).await
}

/// Loads an order with its items. `buyer_id` / `vendor_id` restrict the
/// lookup to orders that party is on.
#[tracing::instrument("Getting order with items", skip(pool))]
pub async fn get_order(
    pool: &DbPool,
    order_id: Uuid,
    buyer_id: Option<Uuid>,
    vendor_id: Option<Uuid>
) -> Result<OrderWithItems, QueryError>{
    run_query(pool, move |conn| {
        let mut query = orders::table.filter(orders::id.eq(order_id)).into_boxed();
        if let Some(buyer_id) = buyer_id {
            query = query.filter(orders::buyer_id.eq(buyer_id));
        }
        if let Some(vendor_id) = vendor_id {
            query = query.filter(orders::vendor_id.eq(vendor_id));
        }

        let order = query
            .select(Order::as_select())
            .first(conn)
            .map_err(|e| QueryError::from(e).or_missing("order"))?;
        let items = load_items(conn, order.id)?;

        Ok(OrderWithItems{ order, items })
    })
    .await
}

fn filtered(filters: &OrderFilters) -> orders::BoxedQuery<'static, Pg>{
    let mut query = orders::table.into_boxed();

    if let Some(status) = filters.status {
        query = query.filter(orders::status.eq(status));
    }
    if let Some(vendor_id) = filters.vendor_id {
        query = query.filter(orders::vendor_id.eq(vendor_id));
    }
    if let Some(buyer_id) = filters.buyer_id {
        query = query.filter(orders::buyer_id.eq(buyer_id));
    }
    if let Some(search) = filters.search.as_deref().filter(|s| !s.trim().is_empty()) {
        query = query.filter(orders::order_number.ilike(like_pattern(search)));
    }
    if let Some(from) = filters.date_from {
        query = query.filter(orders::created_at.ge(from));
    }
    if let Some(to) = filters.date_to {
        query = query.filter(orders::created_at.le(to));
    }

    query
}

#[tracing::instrument("Listing orders", skip(pool))]
pub async fn list_orders(pool: &DbPool, filters: OrderFilters, page: PageQuery) -> Result<(Vec<Order>, i64), QueryError>{
    run_query(pool, move |conn| {
        let count = filtered(&filters).count().get_result::<i64>(conn)?;
        let orders = filtered(&filters)
            .select(Order::as_select())
            .order(orders::created_at.desc())
            .limit(page.limit())
            .offset(page.offset())
            .load(conn)?;

        Ok((orders, count))
    })
    .await
}

/// Sets the status and the matching timestamp. Cancelling an order that was
/// not already cancelled puts its stock back.
#[tracing::instrument("Updating order status", skip(pool))]
pub async fn update_status(
    pool: &DbPool,
    order_id: Uuid,
    vendor_id: Option<Uuid>,
    status: OrderStatus,
    reason: Option<String>
) -> Result<Order, QueryError>{
    run_query(pool, move |conn| {
        conn.transaction::<_, QueryError, _>(|conn| {
            let current = orders::table
                .find(order_id)
                .select(Order::as_select())
                .for_update()
                .first(conn)
                .map_err(|e| QueryError::from(e).or_missing("order"))?;
            if vendor_id.is_some_and(|vendor_id| vendor_id != current.vendor_id) {
                return Err(QueryError::NotFound("order"));
            }

            let now = Utc::now();
            diesel::update(orders::table.find(order_id))
                .set((orders::status.eq(status), orders::updated_at.eq(now)))
                .execute(conn)?;

            match status {
                OrderStatus::Shipped => {
                    diesel::update(orders::table.find(order_id))
                        .set(orders::shipped_at.eq(now))
                        .execute(conn)?;
                },
                OrderStatus::Delivered => {
                    diesel::update(orders::table.find(order_id))
                        .set(orders::delivered_at.eq(now))
                        .execute(conn)?;
                },
                OrderStatus::Cancelled if current.status != OrderStatus::Cancelled => {
                    diesel::update(orders::table.find(order_id))
                        .set((orders::cancelled_at.eq(now), orders::cancellation_reason.eq(reason)))
                        .execute(conn)?;

                    for item in load_items(conn, order_id)? {
                        diesel::update(products::table.find(item.product_id))
                            .set(products::stock.eq(products::stock + item.quantity))
                            .execute(conn)?;
                    }
                },
                _ => {}
            }

            Ok(orders::table.find(order_id).select(Order::as_select()).first(conn)?)
        })
    })
    .await
}

#[tracing::instrument("Setting tracking number", skip(pool))]
pub async fn set_tracking_number(pool: &DbPool, order_id: Uuid, vendor_id: Uuid, tracking_number: String) -> Result<Order, QueryError>{
    run_query(pool, move |conn| {
        diesel::update(orders::table)
            .filter(orders::id.eq(order_id))
            .filter(orders::vendor_id.eq(vendor_id))
            .set((orders::tracking_number.eq(tracking_number), orders::updated_at.eq(Utc::now())))
            .returning(Order::as_returning())
            .get_result(conn)
            .map_err(|e| QueryError::from(e).or_missing("order"))
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_number_has_prefix_and_random_suffix(){
        let number = generate_order_number();
        let parts: Vec<&str> = number.split('-').collect();

        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "ORD");
        assert!(u64::from_str_radix(parts[1], 36).is_ok());
        assert_eq!(parts[2].len(), 6);
        assert!(parts[2].chars().all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
    }

    #[test]
    fn repeated_lines_are_merged(){
        let product_id = Uuid::new_v4();
        let line = |n| OrderLine{ product_id, variant_id: None, quantity: Quantity::parse(n).unwrap() };
        let other = OrderLine{ product_id, variant_id: Some(Uuid::new_v4()), quantity: Quantity::ONE };

        let merged = merge_lines(vec![line(2), other, line(3)]);

        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].quantity.get(), 5);
        assert_eq!(merged[1].quantity.get(), 1);
    }
}
