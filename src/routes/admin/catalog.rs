use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::{
    auth::IsAdmin,
    db_interaction::{
        categories::{self, insert_category, slugify, update_category},
        products::{list_products, update_product, ProductFilters}
    },
    models::{CategoryChanges, NewCategory, ProductChanges},
    routes::{audit, ApiError, RequestMeta},
    utils::{DbPool, Page, PageQuery}
};

#[derive(Deserialize, Debug)]
pub struct CategoryBody{
    pub name: String,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub parent_id: Option<Uuid>,
    #[serde(default)]
    pub sort_order: i32,
    pub is_active: Option<bool>
}

impl CategoryBody {
    pub fn into_new_category(self) -> Result<NewCategory, String>{
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err("category name is required".into());
        }

        let slug = self.slug
            .map(|s| slugify(&s))
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| slugify(&name));
        if slug.is_empty() {
            return Err("category name must contain letters or digits".into());
        }

        Ok(NewCategory{
            id: Uuid::new_v4(),
            name,
            slug,
            description: self.description,
            parent_id: self.parent_id,
            sort_order: self.sort_order,
            is_active: self.is_active.unwrap_or(true)
        })
    }
}

#[tracing::instrument("Creating category", skip(pool, admin, meta, body))]
pub async fn post_category(
    pool: web::Data<DbPool>,
    admin: IsAdmin,
    meta: RequestMeta,
    body: web::Json<CategoryBody>
) -> Result<HttpResponse, ApiError>{
    let category = body.into_inner().into_new_category().map_err(ApiError::Validation)?;
    let category = insert_category(&pool, category).await?;

    audit(&pool, admin.0, &meta, "category_created", "category", category.id, json!({ "name": category.name, "slug": category.slug })).await;

    Ok(HttpResponse::Created().json(category))
}

#[tracing::instrument("Updating category", skip(pool, admin, meta, body))]
pub async fn put_category(
    pool: web::Data<DbPool>,
    admin: IsAdmin,
    meta: RequestMeta,
    path: web::Path<Uuid>,
    body: web::Json<CategoryChanges>
) -> Result<HttpResponse, ApiError>{
    let changes = body.into_inner();
    if changes.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
        return Err(ApiError::Validation("category name cannot be empty".into()));
    }
    let snapshot = json!(changes);

    let category = update_category(&pool, path.into_inner(), changes).await?;
    audit(&pool, admin.0, &meta, "category_updated", "category", category.id, snapshot).await;

    Ok(HttpResponse::Ok().json(category))
}

#[tracing::instrument("Deleting category", skip(pool, admin, meta))]
pub async fn delete_category(
    pool: web::Data<DbPool>,
    admin: IsAdmin,
    meta: RequestMeta,
    path: web::Path<Uuid>
) -> Result<HttpResponse, ApiError>{
    let category_id = path.into_inner();
    categories::delete_category(&pool, category_id).await?;

    audit(&pool, admin.0, &meta, "category_deleted", "category", category_id, json!({})).await;

    Ok(HttpResponse::NoContent().finish())
}

/// Every product, active or not
#[tracing::instrument("Listing products for admin", skip(pool, _admin))]
pub async fn get_admin_products(
    pool: web::Data<DbPool>,
    _admin: IsAdmin,
    filters: web::Query<ProductFilters>,
    page: web::Query<PageQuery>
) -> Result<HttpResponse, ApiError>{
    let (products, count) = list_products(&pool, filters.into_inner(), *page).await?;
    Ok(HttpResponse::Ok().json(Page::new(products, count, &page)))
}

#[tracing::instrument("Admin updating product", skip(pool, admin, meta, body))]
pub async fn put_admin_product(
    pool: web::Data<DbPool>,
    admin: IsAdmin,
    meta: RequestMeta,
    path: web::Path<Uuid>,
    body: web::Json<ProductChanges>
) -> Result<HttpResponse, ApiError>{
    let changes = body.into_inner();
    let snapshot = json!(changes);

    let product = update_product(&pool, path.into_inner(), None, changes).await?;
    audit(&pool, admin.0, &meta, "product_updated", "product", product.id, snapshot).await;

    Ok(HttpResponse::Ok().json(product))
}

#[cfg(test)]
mod tests {
    use claim::{assert_err, assert_ok};

    use super::CategoryBody;

    fn body(name: &str, slug: Option<&str>) -> CategoryBody{
        CategoryBody{
            name: name.into(),
            slug: slug.map(str::to_owned),
            description: None,
            parent_id: None,
            sort_order: 0,
            is_active: None
        }
    }

    #[test]
    fn slug_defaults_to_the_name(){
        let category = assert_ok!(body("Home & Garden", None).into_new_category());
        assert_eq!(category.slug, "home-garden");
        assert!(category.is_active);
    }

    #[test]
    fn explicit_slug_is_normalised(){
        let category = assert_ok!(body("Phones", Some("Smart Phones")).into_new_category());
        assert_eq!(category.slug, "smart-phones");
    }

    #[test]
    fn blank_name_is_rejected(){
        assert_err!(body("   ", None).into_new_category());
        assert_err!(body("!!!", None).into_new_category());
    }
}
