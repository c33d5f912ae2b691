use chrono::{DateTime, Utc};
use diesel::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    domain::{FraudAlertStatus, KycStatus, SubscriptionPlan, SubscriptionStatus, VendorStatus},
    schema::{audit_log, fraud_alerts, security_events, vendor_subscriptions, vendors}
};

#[derive(Queryable, Selectable, Serialize, Debug, Clone)]
#[diesel(table_name = vendors)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Vendor{
    pub id: Uuid,
    pub owner_id: Uuid,
    pub business_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub description: Option<String>,
    pub logo_url: Option<String>,
    pub is_verified: bool,
    pub kyc_status: KycStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>
}

impl Vendor {
    pub fn status(&self) -> VendorStatus{
        VendorStatus::derive(self.is_verified, self.kyc_status)
    }
}

#[derive(Insertable)]
#[diesel(table_name = vendors)]
pub struct NewVendor{
    pub id: Uuid,
    pub owner_id: Uuid,
    pub business_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub description: Option<String>,
    pub logo_url: Option<String>,
    pub is_verified: bool,
    pub kyc_status: KycStatus
}

#[derive(AsChangeset, Deserialize, Default, Debug)]
#[diesel(table_name = vendors)]
pub struct VendorChanges{
    pub business_name: Option<String>,
    pub phone: Option<String>,
    pub description: Option<String>,
    pub logo_url: Option<String>,
    #[serde(skip)]
    pub updated_at: Option<DateTime<Utc>>
}

#[derive(Queryable, Selectable, Serialize, Debug, Clone)]
#[diesel(table_name = vendor_subscriptions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct VendorSubscription{
    pub id: Uuid,
    pub vendor_id: Uuid,
    pub plan: SubscriptionPlan,
    pub monthly_fee: Decimal,
    pub status: SubscriptionStatus,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>
}

#[derive(Insertable)]
#[diesel(table_name = vendor_subscriptions)]
pub struct NewVendorSubscription{
    pub id: Uuid,
    pub vendor_id: Uuid,
    pub plan: SubscriptionPlan,
    pub monthly_fee: Decimal,
    pub status: SubscriptionStatus,
    pub start_date: DateTime<Utc>
}

#[derive(Queryable, Selectable, Serialize, Debug, Clone)]
#[diesel(table_name = audit_log)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct AuditEntry{
    pub id: Uuid,
    pub admin_id: Uuid,
    pub action: String,
    pub resource_type: String,
    pub resource_id: Option<String>,
    pub changes: serde_json::Value,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = audit_log)]
pub struct NewAuditEntry{
    pub id: Uuid,
    pub admin_id: Uuid,
    pub action: String,
    pub resource_type: String,
    pub resource_id: Option<String>,
    pub changes: serde_json::Value,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>
}

#[derive(Queryable, Selectable, Serialize, Debug, Clone)]
#[diesel(table_name = security_events)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct SecurityEvent{
    pub id: Uuid,
    pub event_type: String,
    pub identifier: Option<String>,
    pub details: serde_json::Value,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = security_events)]
pub struct NewSecurityEvent{
    pub id: Uuid,
    pub event_type: String,
    pub identifier: Option<String>,
    pub details: serde_json::Value,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>
}

#[derive(Queryable, Selectable, Serialize, Debug, Clone)]
#[diesel(table_name = fraud_alerts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct FraudAlert{
    pub id: Uuid,
    pub order_id: Option<Uuid>,
    pub profile_id: Option<Uuid>,
    pub reason: String,
    pub risk_score: i32,
    pub status: FraudAlertStatus,
    pub resolved_by: Option<Uuid>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>
}

#[derive(Insertable)]
#[diesel(table_name = fraud_alerts)]
pub struct NewFraudAlert{
    pub id: Uuid,
    pub order_id: Option<Uuid>,
    pub profile_id: Option<Uuid>,
    pub reason: String,
    pub risk_score: i32,
    pub status: FraudAlertStatus
}
