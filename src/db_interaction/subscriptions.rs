use chrono::Utc;
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use crate::{
    domain::{SubscriptionPlan, SubscriptionStatus},
    models::{NewVendorSubscription, VendorSubscription},
    schema::{products, vendor_subscriptions},
    utils::DbPool
};

use super::{products::vendor_plan, run_query, QueryError};

/// The vendor's effective plan and how much of its allowance is used
#[derive(Serialize, Debug)]
pub struct SubscriptionSummary{
    pub subscription: Option<VendorSubscription>,
    pub plan: SubscriptionPlan,
    pub product_limit: Option<i64>,
    pub products_listed: i64
}

#[tracing::instrument("Getting vendor subscription", skip(pool))]
pub async fn subscription_summary(pool: &DbPool, vendor_id: Uuid) -> Result<SubscriptionSummary, QueryError>{
    run_query(pool, move |conn| {
        let subscription = vendor_subscriptions::table
            .filter(vendor_subscriptions::vendor_id.eq(vendor_id))
            .filter(vendor_subscriptions::status.eq(SubscriptionStatus::Active))
            .order(vendor_subscriptions::start_date.desc())
            .select(VendorSubscription::as_select())
            .first(conn)
            .optional()?;
        let plan = vendor_plan(conn, vendor_id)?;

        let products_listed = products::table
            .filter(products::vendor_id.eq(vendor_id))
            .count()
            .get_result(conn)?;

        Ok(SubscriptionSummary{
            subscription,
            plan,
            product_limit: plan.sku_limit(),
            products_listed
        })
    })
    .await
}

/// Starts a new subscription, cancelling whichever one is active
#[tracing::instrument("Subscribing vendor", skip(pool))]
pub async fn subscribe(pool: &DbPool, vendor_id: Uuid, plan: SubscriptionPlan) -> Result<VendorSubscription, QueryError>{
    run_query(pool, move |conn| {
        conn.transaction::<_, QueryError, _>(|conn| {
            let now = Utc::now();

            diesel::update(vendor_subscriptions::table)
                .filter(vendor_subscriptions::vendor_id.eq(vendor_id))
                .filter(vendor_subscriptions::status.eq(SubscriptionStatus::Active))
                .set((
                    vendor_subscriptions::status.eq(SubscriptionStatus::Cancelled),
                    vendor_subscriptions::end_date.eq(now)
                ))
                .execute(conn)?;

            Ok(diesel::insert_into(vendor_subscriptions::table)
                .values(&NewVendorSubscription{
                    id: Uuid::new_v4(),
                    vendor_id,
                    plan,
                    monthly_fee: plan.monthly_fee(),
                    status: SubscriptionStatus::Active,
                    start_date: now
                })
                .returning(VendorSubscription::as_returning())
                .get_result(conn)?)
        })
    })
    .await
}
