use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    auth::IsUser,
    db_interaction::cart::{clear_cart, list_cart, remove_cart_item, update_cart_quantity, upsert_cart_item},
    domain::Quantity,
    routes::ApiError,
    utils::DbPool
};

/// Body of `POST /cart`. Shared with the cart client, which sends it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AddCartItemBody{
    pub product_id: Uuid,
    pub variant_id: Option<Uuid>,
    pub quantity: i32
}

/// Body of `PUT /cart/{id}`; zero or less removes the entry
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct UpdateCartItemBody{
    pub quantity: i32
}

#[tracing::instrument("Getting cart", skip(pool, user))]
pub async fn get_cart(pool: web::Data<DbPool>, user: IsUser) -> Result<HttpResponse, ApiError>{
    Ok(HttpResponse::Ok().json(list_cart(&pool, user.0).await?))
}

#[tracing::instrument("Adding cart item", skip(pool, user))]
pub async fn post_cart_item(
    pool: web::Data<DbPool>,
    user: IsUser,
    body: web::Json<AddCartItemBody>
) -> Result<HttpResponse, ApiError>{
    let body = body.into_inner();
    let quantity = Quantity::parse(body.quantity).map_err(ApiError::Validation)?;

    let item = upsert_cart_item(&pool, user.0, body.product_id, body.variant_id, quantity).await?;
    Ok(HttpResponse::Ok().json(item))
}

#[tracing::instrument("Updating cart item", skip(pool, user))]
pub async fn put_cart_item(
    pool: web::Data<DbPool>,
    user: IsUser,
    path: web::Path<Uuid>,
    body: web::Json<UpdateCartItemBody>
) -> Result<HttpResponse, ApiError>{
    match update_cart_quantity(&pool, user.0, path.into_inner(), body.quantity).await? {
        Some(item) => Ok(HttpResponse::Ok().json(item)),
        None => Ok(HttpResponse::NoContent().finish())
    }
}

#[tracing::instrument("Removing cart item", skip(pool, user))]
pub async fn delete_cart_item(
    pool: web::Data<DbPool>,
    user: IsUser,
    path: web::Path<Uuid>
) -> Result<HttpResponse, ApiError>{
    remove_cart_item(&pool, user.0, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[tracing::instrument("Clearing cart", skip(pool, user))]
pub async fn delete_cart(pool: web::Data<DbPool>, user: IsUser) -> Result<HttpResponse, ApiError>{
    let removed = clear_cart(&pool, user.0).await?;
    tracing::info!(removed, "Cart cleared");
    Ok(HttpResponse::NoContent().finish())
}
