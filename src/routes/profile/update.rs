use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::{
    auth::IsUser,
    db_interaction::users::update_profile,
    domain::PhoneNumberDomain,
    models::ProfileChanges,
    routes::ApiError,
    utils::DbPool
};

#[derive(Deserialize, Debug, Default)]
pub struct ProfileUpdateBody{
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub avatar_url: Option<String>
}

impl TryFrom<ProfileUpdateBody> for ProfileChanges {
    type Error = String;

    fn try_from(body: ProfileUpdateBody) -> Result<Self, Self::Error> {
        let full_name = match body.full_name.map(|n| n.trim().to_string()) {
            Some(name) if name.is_empty() => return Err("full name cannot be empty".into()),
            other => other
        };
        let phone = body.phone
            .map(PhoneNumberDomain::parse)
            .transpose()?
            .map(|p| p.inner());

        Ok(ProfileChanges{
            full_name,
            phone,
            avatar_url: body.avatar_url,
            updated_at: None
        })
    }
}

#[tracing::instrument(
    "Updating profile of logged in user",
    skip(pool, user, body)
)]
pub async fn update_profile_info(
    pool: web::Data<DbPool>,
    user: IsUser,
    body: web::Json<ProfileUpdateBody>
) -> Result<HttpResponse, ApiError>{
    let changes = ProfileChanges::try_from(body.into_inner()).map_err(ApiError::Validation)?;
    let profile = update_profile(&pool, user.0, changes).await?;

    Ok(HttpResponse::Ok().json(profile))
}

#[cfg(test)]
mod tests {
    use claim::{assert_err, assert_ok};

    use super::*;

    #[test]
    fn blank_name_is_rejected(){
        let body = ProfileUpdateBody{ full_name: Some("   ".into()), ..Default::default() };
        assert_err!(ProfileChanges::try_from(body));
    }

    #[test]
    fn kenyan_local_number_is_normalized(){
        let body = ProfileUpdateBody{ phone: Some("0712345678".into()), ..Default::default() };
        let changes = assert_ok!(ProfileChanges::try_from(body));
        assert_eq!(changes.phone.as_deref(), Some("+254712345678"));
    }
}
