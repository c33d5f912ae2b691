//! Admin portal handlers. Every route here sits behind the admin access guard
//! and requires an admin token; mutations leave an audit row.

mod vendors;
mod users;
mod staff;
mod catalog;
mod orders;
mod payments;
mod reviews;
mod security;
mod overview;

pub use vendors::{get_admin_vendor, get_admin_vendors, post_vendor_approve, post_vendor_reject, post_vendor_suspend};
pub use users::{get_admin_users, post_user_suspend};
pub use staff::{delete_staff, get_staff, post_staff, put_staff_permissions};
pub use catalog::{delete_category, get_admin_products, post_category, put_admin_product, put_category};
pub use orders::{get_admin_orders, put_admin_order_status};
pub use payments::{get_admin_payments, get_finance_report, post_payout};
pub use reviews::{delete_admin_review, get_admin_reviews, post_review_approve};
pub use security::{get_fraud_alerts, get_security_events, post_fraud_alert_resolve};
pub use overview::{get_audit_log, get_dashboard};
