use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Product details shown next to cart lines
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CatalogProduct{
    pub id: Uuid,
    pub name: String,
    pub price: Decimal,
    #[serde(default)]
    pub image: Option<String>
}

/// In-memory product snapshot shipped with the storefront. Prices may lag
/// behind the server.
#[derive(Debug, Clone, Default)]
pub struct Catalog{
    products: HashMap<Uuid, CatalogProduct>
}

impl Catalog {
    pub fn new(products: impl IntoIterator<Item = CatalogProduct>) -> Self{
        Catalog{
            products: products.into_iter().map(|p| (p.id, p)).collect()
        }
    }

    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error>{
        let products: Vec<CatalogProduct> = serde_json::from_str(raw)?;
        Ok(Catalog::new(products))
    }

    pub fn get(&self, product_id: Uuid) -> Option<&CatalogProduct>{
        self.products.get(&product_id)
    }

    pub fn len(&self) -> usize{
        self.products.len()
    }

    pub fn is_empty(&self) -> bool{
        self.products.is_empty()
    }
}
