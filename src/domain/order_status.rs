use diesel::{deserialize::FromSqlRow, expression::AsExpression};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsExpression, FromSqlRow)]
#[diesel(sql_type = diesel::sql_types::Text)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus{
    Pending,
    Confirmed,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
    Refunded,
    Disputed
}

text_column_enum!(OrderStatus {
    Pending => "pending",
    Confirmed => "confirmed",
    Processing => "processing",
    Shipped => "shipped",
    Delivered => "delivered",
    Cancelled => "cancelled",
    Refunded => "refunded",
    Disputed => "disputed"
});

impl OrderStatus {
    // Statuses counted as open disputes on the admin dashboard
    pub const DISPUTE_STATES: [OrderStatus; 2] = [OrderStatus::Disputed, OrderStatus::Cancelled];
}

#[cfg(test)]
mod tests {
    use super::OrderStatus;

    #[test]
    fn status_parses_from_its_column_text(){
        for status in [OrderStatus::Pending, OrderStatus::Shipped, OrderStatus::Refunded] {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
        assert!("lost".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn status_deserializes_from_snake_case(){
        let status: OrderStatus = serde_json::from_str("\"delivered\"").unwrap();
        assert_eq!(status, OrderStatus::Delivered);
    }
}
