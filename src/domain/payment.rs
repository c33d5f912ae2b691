use diesel::{deserialize::FromSqlRow, expression::AsExpression};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsExpression, FromSqlRow)]
#[diesel(sql_type = diesel::sql_types::Text)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod{
    Mpesa,
    Card,
    BankTransfer,
    CashOnDelivery
}

text_column_enum!(PaymentMethod {
    Mpesa => "mpesa",
    Card => "card",
    BankTransfer => "bank_transfer",
    CashOnDelivery => "cash_on_delivery"
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsExpression, FromSqlRow)]
#[diesel(sql_type = diesel::sql_types::Text)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus{
    Pending,
    Completed,
    Failed,
    Refunded
}

text_column_enum!(PaymentStatus {
    Pending => "pending",
    Completed => "completed",
    Failed => "failed",
    Refunded => "refunded"
});
