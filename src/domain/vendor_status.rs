use diesel::{deserialize::FromSqlRow, expression::AsExpression};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsExpression, FromSqlRow)]
#[diesel(sql_type = diesel::sql_types::Text)]
#[serde(rename_all = "snake_case")]
pub enum KycStatus{
    Pending,
    Approved,
    Rejected
}

text_column_enum!(KycStatus {
    Pending => "pending",
    Approved => "approved",
    Rejected => "rejected"
});

/// Status shown to admins in the vendor list, derived from the verification
/// flag and the KYC status. Also used as the list filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VendorStatus{
    Approved,
    Pending,
    Rejected,
    Suspended
}

impl VendorStatus {
    pub fn derive(is_verified: bool, kyc_status: KycStatus) -> VendorStatus{
        match (is_verified, kyc_status) {
            (true, KycStatus::Approved) => VendorStatus::Approved,
            (_, KycStatus::Pending) => VendorStatus::Pending,
            (_, KycStatus::Rejected) => VendorStatus::Rejected,
            (false, KycStatus::Approved) => VendorStatus::Suspended
        }
    }

    pub fn label(&self) -> &'static str{
        match self {
            VendorStatus::Approved => "Approved",
            VendorStatus::Pending => "Pending",
            VendorStatus::Rejected => "Rejected",
            VendorStatus::Suspended => "Suspended"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verified_and_approved_vendor_is_approved(){
        assert_eq!(VendorStatus::derive(true, KycStatus::Approved), VendorStatus::Approved);
        assert_eq!(VendorStatus::Approved.label(), "Approved");
    }

    #[test]
    fn pending_kyc_is_pending_regardless_of_verification(){
        assert_eq!(VendorStatus::derive(true, KycStatus::Pending), VendorStatus::Pending);
        assert_eq!(VendorStatus::derive(false, KycStatus::Pending), VendorStatus::Pending);
    }

    #[test]
    fn rejected_kyc_is_rejected(){
        assert_eq!(VendorStatus::derive(false, KycStatus::Rejected), VendorStatus::Rejected);
        assert_eq!(VendorStatus::derive(true, KycStatus::Rejected), VendorStatus::Rejected);
    }

    #[test]
    fn unverified_approved_vendor_is_suspended(){
        assert_eq!(VendorStatus::derive(false, KycStatus::Approved), VendorStatus::Suspended);
        assert_eq!(VendorStatus::Suspended.label(), "Suspended");
    }
}
