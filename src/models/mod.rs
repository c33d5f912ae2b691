//! Typed rows for every table. Enum-valued text columns are decoded into
//! `crate::domain` enums, so a row carrying an unknown status fails to load.

pub mod accounts;
pub mod catalog;
pub mod commerce;
pub mod admin;

pub use accounts::{Address, AdminPermission, NewAddress, NewAdminPermission, NewProfile, Profile, ProfileChanges};
pub use catalog::{Category, CategoryChanges, NewCategory, NewProduct, NewReview, Product, ProductChanges, Review};
pub use commerce::{CartItem, NewCartItem, NewOrder, NewOrderItem, NewPayment, Order, OrderItem, Payment, WishlistItem};
pub use admin::{AuditEntry, FraudAlert, NewAuditEntry, NewFraudAlert, NewSecurityEvent, NewVendor, NewVendorSubscription, SecurityEvent, Vendor, VendorChanges, VendorSubscription};
