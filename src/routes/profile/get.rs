use actix_web::{web, HttpResponse};

use crate::{auth::IsUser, db_interaction::users::find_by_id, routes::ApiError, utils::DbPool};

#[tracing::instrument(
    "Get profile data of logged in user",
    skip(pool, user)
)]
pub async fn get_profile(
    pool: web::Data<DbPool>,
    user: IsUser
) -> Result<HttpResponse, ApiError>{
    let profile = find_by_id(&pool, user.0).await?;
    Ok(HttpResponse::Ok().json(profile))
}
