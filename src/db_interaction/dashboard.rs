use diesel::{dsl::sum, prelude::*};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::{
    domain::{KycStatus, OrderStatus, PaymentStatus, SubscriptionStatus},
    schema::{orders, payments, products, profiles, vendor_subscriptions, vendors},
    utils::DbPool
};

use super::{run_query, QueryError};

#[derive(Serialize, Debug, Default, PartialEq)]
pub struct PlatformKpis{
    pub total_users: i64,
    pub total_vendors: i64,
    pub total_products: i64,
    pub total_orders: i64,
    pub total_revenue: Decimal,
    pub pending_vendor_approvals: i64,
    pub pending_kyc_reviews: i64,
    pub pending_disputes: i64,
    pub pending_refunds: i64,
    pub active_subscriptions: i64,
    pub monthly_recurring_revenue: Decimal
}

#[tracing::instrument("Computing platform KPIs", skip(pool))]
pub async fn platform_kpis(pool: &DbPool) -> Result<PlatformKpis, QueryError>{
    run_query(pool, move |conn| {
        let total_users = profiles::table.count().get_result(conn)?;
        let total_vendors = vendors::table.count().get_result(conn)?;
        let total_products = products::table
            .filter(products::is_active.eq(true))
            .count()
            .get_result(conn)?;
        let total_orders = orders::table.count().get_result(conn)?;

        let total_revenue: Option<Decimal> = payments::table
            .filter(payments::status.eq(PaymentStatus::Completed))
            .select(sum(payments::amount))
            .first(conn)?;

        let pending_vendor_approvals = vendors::table
            .filter(vendors::is_verified.eq(false))
            .filter(vendors::kyc_status.eq(KycStatus::Pending))
            .count()
            .get_result(conn)?;
        let pending_kyc_reviews = vendors::table
            .filter(vendors::kyc_status.eq(KycStatus::Pending))
            .count()
            .get_result(conn)?;

        let disputes: Vec<OrderStatus> = OrderStatus::DISPUTE_STATES.to_vec();
        let pending_disputes = orders::table
            .filter(orders::status.eq_any(disputes))
            .count()
            .get_result(conn)?;
        let pending_refunds = payments::table
            .filter(payments::status.eq(PaymentStatus::Refunded))
            .count()
            .get_result(conn)?;

        let active_subscriptions = vendor_subscriptions::table
            .filter(vendor_subscriptions::status.eq(SubscriptionStatus::Active))
            .count()
            .get_result(conn)?;
        let monthly_recurring_revenue: Option<Decimal> = vendor_subscriptions::table
            .filter(vendor_subscriptions::status.eq(SubscriptionStatus::Active))
            .select(sum(vendor_subscriptions::monthly_fee))
            .first(conn)?;

        Ok(PlatformKpis{
            total_users,
            total_vendors,
            total_products,
            total_orders,
            total_revenue: total_revenue.unwrap_or_default(),
            pending_vendor_approvals,
            pending_kyc_reviews,
            pending_disputes,
            pending_refunds,
            active_subscriptions,
            monthly_recurring_revenue: monthly_recurring_revenue.unwrap_or_default()
        })
    })
    .await
}
