use diesel::{deserialize::FromSqlRow, expression::AsExpression};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsExpression, FromSqlRow)]
#[diesel(sql_type = diesel::sql_types::Text)]
#[serde(rename_all = "snake_case")]
pub enum FraudAlertStatus{
    Open,
    Resolved
}

text_column_enum!(FraudAlertStatus {
    Open => "open",
    Resolved => "resolved"
});
