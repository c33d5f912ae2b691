use chrono::{DateTime, Utc};
use diesel::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{domain::{OrderStatus, PaymentMethod, PaymentStatus}, schema::{cart_items, order_items, orders, payments, wishlists}};

#[derive(Queryable, Selectable, Serialize, Debug, Clone)]
#[diesel(table_name = orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Order{
    pub id: Uuid,
    pub order_number: String,
    pub buyer_id: Uuid,
    pub vendor_id: Uuid,
    pub status: OrderStatus,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub shipping_cost: Decimal,
    pub discount: Decimal,
    pub total: Decimal,
    pub currency: String,
    pub shipping_address: serde_json::Value,
    pub notes: Option<String>,
    pub tracking_number: Option<String>,
    pub shipped_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub cancellation_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>
}

#[derive(Insertable, Debug)]
#[diesel(table_name = orders)]
pub struct NewOrder{
    pub id: Uuid,
    pub order_number: String,
    pub buyer_id: Uuid,
    pub vendor_id: Uuid,
    pub status: OrderStatus,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub shipping_cost: Decimal,
    pub discount: Decimal,
    pub total: Decimal,
    pub currency: String,
    pub shipping_address: serde_json::Value,
    pub notes: Option<String>
}

#[derive(Queryable, Selectable, Serialize, Debug, Clone)]
#[diesel(table_name = order_items)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderItem{
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub variant_id: Option<Uuid>,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
    pub created_at: DateTime<Utc>
}

#[derive(Insertable, Debug)]
#[diesel(table_name = order_items)]
pub struct NewOrderItem{
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub variant_id: Option<Uuid>,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub total: Decimal
}

#[derive(Queryable, Selectable, Serialize, Debug, Clone)]
#[diesel(table_name = payments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Payment{
    pub id: Uuid,
    pub order_id: Uuid,
    pub buyer_id: Uuid,
    pub amount: Decimal,
    pub currency: String,
    pub payment_method: PaymentMethod,
    pub status: PaymentStatus,
    pub provider_reference: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>
}

#[derive(Insertable)]
#[diesel(table_name = payments)]
pub struct NewPayment{
    pub id: Uuid,
    pub order_id: Uuid,
    pub buyer_id: Uuid,
    pub amount: Decimal,
    pub currency: String,
    pub payment_method: PaymentMethod,
    pub status: PaymentStatus
}

/// Remote cart row. Shared with `crate::client`, which receives it as JSON.
#[derive(Queryable, Selectable, Serialize, Deserialize, Debug, Clone, PartialEq)]
#[diesel(table_name = cart_items)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CartItem{
    pub id: Uuid,
    pub buyer_id: Uuid,
    pub product_id: Uuid,
    pub variant_id: Option<Uuid>,
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>
}

#[derive(Insertable)]
#[diesel(table_name = cart_items)]
pub struct NewCartItem{
    pub id: Uuid,
    pub buyer_id: Uuid,
    pub product_id: Uuid,
    pub variant_id: Option<Uuid>,
    pub quantity: i32
}

#[derive(Queryable, Selectable, Insertable, Serialize, Debug, Clone)]
#[diesel(table_name = wishlists)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct WishlistItem{
    pub id: Uuid,
    pub buyer_id: Uuid,
    pub product_id: Uuid,
    pub created_at: DateTime<Utc>
}
