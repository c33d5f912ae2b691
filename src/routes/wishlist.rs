use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::{
    auth::IsUser,
    db_interaction::wishlist::{add_to_wishlist, list_wishlist, remove_from_wishlist, wishlist_contains},
    routes::ApiError,
    utils::DbPool
};

#[derive(Deserialize, Debug)]
pub struct WishlistBody{
    pub product_id: Uuid
}

#[tracing::instrument("Getting wishlist", skip(pool, user))]
pub async fn get_wishlist(pool: web::Data<DbPool>, user: IsUser) -> Result<HttpResponse, ApiError>{
    Ok(HttpResponse::Ok().json(list_wishlist(&pool, user.0).await?))
}

#[tracing::instrument("Adding to wishlist", skip(pool, user))]
pub async fn post_wishlist(
    pool: web::Data<DbPool>,
    user: IsUser,
    body: web::Json<WishlistBody>
) -> Result<HttpResponse, ApiError>{
    Ok(HttpResponse::Ok().json(add_to_wishlist(&pool, user.0, body.product_id).await?))
}

#[tracing::instrument("Removing from wishlist", skip(pool, user))]
pub async fn delete_wishlist_item(
    pool: web::Data<DbPool>,
    user: IsUser,
    path: web::Path<Uuid>
) -> Result<HttpResponse, ApiError>{
    remove_from_wishlist(&pool, user.0, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[tracing::instrument("Checking wishlist", skip(pool, user))]
pub async fn get_wishlist_contains(
    pool: web::Data<DbPool>,
    user: IsUser,
    path: web::Path<Uuid>
) -> Result<HttpResponse, ApiError>{
    let contains = wishlist_contains(&pool, user.0, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "in_wishlist": contains })))
}
