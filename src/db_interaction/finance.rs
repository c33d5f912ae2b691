use chrono::{DateTime, Utc};
use diesel::{dsl::sum, prelude::*};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::{
    domain::{pricing::round_money, PaymentStatus, SubscriptionStatus},
    schema::{payments, vendor_subscriptions},
    utils::DbPool
};

use super::{run_query, QueryError};

#[derive(Serialize, Debug, PartialEq)]
pub struct FinancialReport{
    pub period: String,
    pub revenue: Decimal,
    pub commissions: Decimal,
    pub payouts: Decimal,
    pub subscriptions: Decimal,
    pub ads_revenue: Decimal,
    pub promotions_revenue: Decimal,
    pub net_profit: Decimal
}

impl FinancialReport {
    /// Splits completed-payment revenue into the platform commission and the
    /// vendor payouts.
    pub fn compute(
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        revenue: Decimal,
        subscriptions: Decimal,
        commission_rate: Decimal
    ) -> Self{
        let commissions = round_money(revenue * commission_rate);
        let payouts = round_money(revenue - commissions);

        FinancialReport{
            period: format!("{} to {}", from.to_rfc3339(), to.to_rfc3339()),
            revenue: round_money(revenue),
            commissions,
            payouts,
            subscriptions: round_money(subscriptions),
            ads_revenue: Decimal::ZERO,
            promotions_revenue: Decimal::ZERO,
            net_profit: round_money(revenue - payouts)
        }
    }
}

#[tracing::instrument("Generating financial report", skip(pool))]
pub async fn financial_report(
    pool: &DbPool,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
    commission_rate: Decimal
) -> Result<FinancialReport, QueryError>{
    if from > to {
        return Err(QueryError::Invalid("date_from must not be after date_to".into()));
    }

    run_query(pool, move |conn| {
        let revenue: Option<Decimal> = payments::table
            .filter(payments::status.eq(PaymentStatus::Completed))
            .filter(payments::created_at.ge(from))
            .filter(payments::created_at.le(to))
            .select(sum(payments::amount))
            .first(conn)?;

        let subscriptions: Option<Decimal> = vendor_subscriptions::table
            .filter(vendor_subscriptions::status.eq(SubscriptionStatus::Active))
            .filter(vendor_subscriptions::start_date.ge(from))
            .filter(vendor_subscriptions::start_date.le(to))
            .select(sum(vendor_subscriptions::monthly_fee))
            .first(conn)?;

        Ok(FinancialReport::compute(
            from,
            to,
            revenue.unwrap_or_default(),
            subscriptions.unwrap_or_default(),
            commission_rate
        ))
    })
    .await
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use rust_decimal::Decimal;

    use super::FinancialReport;

    fn money(amount: &str) -> Decimal{
        amount.parse().unwrap()
    }

    #[test]
    fn commission_and_payouts_split_revenue(){
        let to = Utc::now();
        let report = FinancialReport::compute(to - Duration::days(30), to, money("10000"), money("7500"), money("0.1"));

        assert_eq!(report.commissions, money("1000"));
        assert_eq!(report.payouts, money("9000"));
        assert_eq!(report.net_profit, report.commissions);
        assert_eq!(report.subscriptions, money("7500"));
        assert_eq!(report.ads_revenue, Decimal::ZERO);
    }

    #[test]
    fn commission_is_rounded_to_the_cent(){
        let to = Utc::now();
        let report = FinancialReport::compute(to, to, money("333.35"), Decimal::ZERO, money("0.1"));

        assert_eq!(report.commissions, money("33.34"));
        assert_eq!(report.payouts + report.commissions, report.revenue);
    }

    #[test]
    fn empty_period_reports_zeroes(){
        let to = Utc::now();
        let report = FinancialReport::compute(to, to, Decimal::ZERO, Decimal::ZERO, money("0.1"));

        assert_eq!(report.revenue, Decimal::ZERO);
        assert_eq!(report.net_profit, Decimal::ZERO);
    }
}
