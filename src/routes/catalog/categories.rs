use actix_web::{web, HttpResponse};

use crate::{db_interaction::categories::list_categories, routes::ApiError, utils::DbPool};

#[tracing::instrument("Listing active categories", skip(pool))]
pub async fn get_categories(pool: web::Data<DbPool>) -> Result<HttpResponse, ApiError>{
    Ok(HttpResponse::Ok().json(list_categories(&pool, false).await?))
}
