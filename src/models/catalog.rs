use chrono::{DateTime, Utc};
use diesel::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::schema::{categories, products, reviews};

#[derive(Queryable, Selectable, Serialize, Deserialize, Debug, Clone)]
#[diesel(table_name = categories)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Category{
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub parent_id: Option<Uuid>,
    pub sort_order: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>
}

#[derive(Insertable, Debug)]
#[diesel(table_name = categories)]
pub struct NewCategory{
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub parent_id: Option<Uuid>,
    pub sort_order: i32,
    pub is_active: bool
}

#[derive(AsChangeset, Deserialize, Serialize, Default, Debug)]
#[diesel(table_name = categories)]
pub struct CategoryChanges{
    pub name: Option<String>,
    pub description: Option<String>,
    pub sort_order: Option<i32>,
    pub is_active: Option<bool>
}

#[derive(Queryable, Selectable, Serialize, Deserialize, Debug, Clone, PartialEq)]
#[diesel(table_name = products)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Product{
    pub id: Uuid,
    pub vendor_id: Uuid,
    pub category_id: Option<Uuid>,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub stock: i32,
    pub images: Vec<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>
}

#[derive(Insertable, Debug)]
#[diesel(table_name = products)]
pub struct NewProduct{
    pub id: Uuid,
    pub vendor_id: Uuid,
    pub category_id: Option<Uuid>,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub stock: i32,
    pub images: Vec<String>,
    pub is_active: bool
}

#[derive(AsChangeset, Deserialize, Serialize, Default, Debug, Clone)]
#[diesel(table_name = products)]
pub struct ProductChanges{
    pub category_id: Option<Uuid>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub stock: Option<i32>,
    pub images: Option<Vec<String>>,
    pub is_active: Option<bool>,
    #[serde(skip)]
    pub updated_at: Option<DateTime<Utc>>
}

impl ProductChanges {
    pub fn validate(&self) -> Result<(), String>{
        if let Some(price) = self.price {
            if price < Decimal::ZERO {
                return Err("price must be a non-negative number".into());
            }
            if price.normalize().scale() > 2 {
                return Err("price cannot have fractions of a cent".into());
            }
        }
        if let Some(stock) = self.stock {
            if stock < 0 {
                return Err("stock cannot be negative".into());
            }
        }
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err("product name cannot be empty".into());
            }
        }
        Ok(())
    }
}

#[derive(Queryable, Selectable, Serialize, Debug, Clone)]
#[diesel(table_name = reviews)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Review{
    pub id: Uuid,
    pub product_id: Uuid,
    pub buyer_id: Uuid,
    pub order_id: Option<Uuid>,
    pub rating: i32,
    pub title: Option<String>,
    pub comment: Option<String>,
    pub is_verified_purchase: bool,
    pub helpful_count: i32,
    pub is_approved: bool,
    pub vendor_response: Option<String>,
    pub vendor_responded_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>
}

#[derive(Insertable)]
#[diesel(table_name = reviews)]
pub struct NewReview{
    pub id: Uuid,
    pub product_id: Uuid,
    pub buyer_id: Uuid,
    pub order_id: Option<Uuid>,
    pub rating: i32,
    pub title: Option<String>,
    pub comment: Option<String>,
    pub is_verified_purchase: bool,
    pub is_approved: bool
}

#[cfg(test)]
mod tests {
    use super::ProductChanges;
    use claim::{assert_err, assert_ok};
    use rust_decimal::Decimal;

    #[test]
    fn empty_changes_are_valid(){
        assert_ok!(ProductChanges::default().validate());
    }

    #[test]
    fn negative_stock_or_price_is_rejected(){
        assert_err!(ProductChanges{ stock: Some(-1), ..Default::default() }.validate());
        assert_err!(ProductChanges{ price: Some(Decimal::new(-5, 1)), ..Default::default() }.validate());
        assert_ok!(ProductChanges{ price: Some(Decimal::ZERO), ..Default::default() }.validate());
    }
}
