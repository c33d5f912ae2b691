use actix_web::{web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    auth::IsUser,
    db_interaction::addresses::{delete_address, insert_address, list_addresses, set_default_address},
    domain::PhoneNumberDomain,
    models::NewAddress,
    routes::ApiError,
    utils::DbPool
};

#[derive(Deserialize, Debug)]
pub struct AddressBody{
    pub label: Option<String>,
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub region: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    pub phone: Option<String>,
    #[serde(default)]
    pub is_default: bool
}

fn required(value: String, field: &str) -> Result<String, String>{
    let value = value.trim().to_string();
    if value.is_empty() {
        Err(format!("{} is required", field))
    } else {
        Ok(value)
    }
}

impl AddressBody {
    pub fn into_new_address(self, profile_id: Uuid) -> Result<NewAddress, String>{
        Ok(NewAddress{
            id: Uuid::new_v4(),
            profile_id,
            label: self.label.unwrap_or_else(|| "Home".into()),
            line1: required(self.line1, "line1")?,
            line2: self.line2,
            city: required(self.city, "city")?,
            region: self.region,
            postal_code: self.postal_code,
            country: self.country.unwrap_or_else(|| "KE".into()),
            phone: self.phone.map(PhoneNumberDomain::parse).transpose()?.map(|p| p.inner()),
            is_default: self.is_default
        })
    }
}

#[tracing::instrument("Listing addresses of logged in user", skip(pool, user))]
pub async fn get_addresses(pool: web::Data<DbPool>, user: IsUser) -> Result<HttpResponse, ApiError>{
    Ok(HttpResponse::Ok().json(list_addresses(&pool, user.0).await?))
}

#[tracing::instrument("Adding address", skip(pool, user, body))]
pub async fn post_address(
    pool: web::Data<DbPool>,
    user: IsUser,
    body: web::Json<AddressBody>
) -> Result<HttpResponse, ApiError>{
    let address = body.into_inner()
        .into_new_address(user.0)
        .map_err(ApiError::Validation)?;

    Ok(HttpResponse::Created().json(insert_address(&pool, address).await?))
}

#[tracing::instrument("Setting default address", skip(pool, user))]
pub async fn make_default_address(
    pool: web::Data<DbPool>,
    user: IsUser,
    path: web::Path<Uuid>
) -> Result<HttpResponse, ApiError>{
    Ok(HttpResponse::Ok().json(set_default_address(&pool, user.0, path.into_inner()).await?))
}

#[tracing::instrument("Deleting address", skip(pool, user))]
pub async fn remove_address(
    pool: web::Data<DbPool>,
    user: IsUser,
    path: web::Path<Uuid>
) -> Result<HttpResponse, ApiError>{
    delete_address(&pool, user.0, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}
