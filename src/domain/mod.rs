use thiserror::Error;

// Implements text conversions plus the diesel `Text` mapping for an enum stored
// as a lowercase string column. Unknown values are rejected when a row is read.
macro_rules! text_column_enum {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            pub fn as_str(&self) -> &'static str{
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::domain::ParseEnumError;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                match value {
                    $($text => Ok($name::$variant),)+
                    other => Err($crate::domain::ParseEnumError::new(stringify!($name), other))
                }
            }
        }

        impl diesel::deserialize::FromSql<diesel::sql_types::Text, diesel::pg::Pg> for $name {
            fn from_sql(bytes: diesel::pg::PgValue<'_>) -> diesel::deserialize::Result<Self> {
                let text = <String as diesel::deserialize::FromSql<diesel::sql_types::Text, diesel::pg::Pg>>::from_sql(bytes)?;
                Ok(text.parse::<$name>()?)
            }
        }

        impl diesel::serialize::ToSql<diesel::sql_types::Text, diesel::pg::Pg> for $name {
            fn to_sql<'b>(&'b self, out: &mut diesel::serialize::Output<'b, '_, diesel::pg::Pg>) -> diesel::serialize::Result {
                <str as diesel::serialize::ToSql<diesel::sql_types::Text, diesel::pg::Pg>>::to_sql(self.as_str(), out)
            }
        }
    };
}

pub mod user_email;
pub mod phone_number;
pub mod quantity;
pub mod rating;
pub mod roles;
pub mod vendor_status;
pub mod order_status;
pub mod payment;
pub mod subscription;
pub mod fraud;
pub mod pricing;

pub use user_email::UserEmail;
pub use phone_number::PhoneNumberDomain;
pub use quantity::Quantity;
pub use rating::Rating;
pub use roles::{Permission, ProfileRole, StaffRole};
pub use vendor_status::{KycStatus, VendorStatus};
pub use order_status::OrderStatus;
pub use payment::{PaymentMethod, PaymentStatus};
pub use subscription::{SubscriptionPlan, SubscriptionStatus};
pub use fraud::FraudAlertStatus;

#[derive(Debug, Error)]
#[error("'{value}' is not a valid {kind}")]
pub struct ParseEnumError{
    kind: &'static str,
    value: String
}

impl ParseEnumError {
    pub fn new(kind: &'static str, value: &str) -> Self{
        ParseEnumError{
            kind,
            value: value.to_string()
        }
    }
}
