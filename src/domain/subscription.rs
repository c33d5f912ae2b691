use diesel::{deserialize::FromSqlRow, expression::AsExpression};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsExpression, FromSqlRow)]
#[diesel(sql_type = diesel::sql_types::Text)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionPlan{
    Basic,
    Bronze,
    Silver,
    Gold,
    Platinum
}

text_column_enum!(SubscriptionPlan {
    Basic => "basic",
    Bronze => "bronze",
    Silver => "silver",
    Gold => "gold",
    Platinum => "platinum"
});

impl SubscriptionPlan {
    /// Monthly fee in KES
    pub fn monthly_fee(&self) -> Decimal{
        let shillings: i64 = match self {
            SubscriptionPlan::Basic => 2_000,
            SubscriptionPlan::Bronze => 3_500,
            SubscriptionPlan::Silver => 5_500,
            SubscriptionPlan::Gold => 7_500,
            SubscriptionPlan::Platinum => 12_000
        };
        Decimal::from(shillings)
    }

    /// Maximum number of products a vendor on this plan may list.
    /// `None` means unlimited.
    pub fn sku_limit(&self) -> Option<i64>{
        match self {
            SubscriptionPlan::Basic => Some(50),
            SubscriptionPlan::Bronze => Some(150),
            SubscriptionPlan::Silver => Some(500),
            SubscriptionPlan::Gold => Some(1_000),
            SubscriptionPlan::Platinum => None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsExpression, FromSqlRow)]
#[diesel(sql_type = diesel::sql_types::Text)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus{
    Active,
    Cancelled,
    Expired
}

text_column_enum!(SubscriptionStatus {
    Active => "active",
    Cancelled => "cancelled",
    Expired => "expired"
});

#[cfg(test)]
mod tests {
    use super::SubscriptionPlan;

    #[test]
    fn higher_plans_cost_more_and_allow_more_products(){
        let plans = [
            SubscriptionPlan::Basic,
            SubscriptionPlan::Bronze,
            SubscriptionPlan::Silver,
            SubscriptionPlan::Gold
        ];

        for pair in plans.windows(2) {
            assert!(pair[0].monthly_fee() < pair[1].monthly_fee());
            assert!(pair[0].sku_limit() < pair[1].sku_limit());
        }
        assert_eq!(SubscriptionPlan::Platinum.sku_limit(), None);
    }
}
