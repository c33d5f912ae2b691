use actix_web::{web, HttpResponse};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    auth::{Tokenizer, UserRole},
    db_interaction::users::insert_profile,
    domain::{PhoneNumberDomain, ProfileRole, UserEmail},
    models::NewProfile,
    password::{hash_password, validate_password_strength},
    routes::ApiError,
    utils::DbPool
};

use super::login::issue_token;

#[derive(Deserialize, Debug)]
pub struct RegistrationBody{
    pub email: String,
    pub password: SecretString,
    pub full_name: String,
    pub phone: Option<String>,
    /// `buyer` (default) or `vendor`
    pub role: Option<ProfileRole>
}

#[derive(Debug)]
pub struct NewAccount{
    pub email: UserEmail,
    pub full_name: String,
    pub phone: Option<PhoneNumberDomain>,
    pub role: ProfileRole
}

impl TryFrom<&RegistrationBody> for NewAccount {
    type Error = String;

    fn try_from(body: &RegistrationBody) -> Result<Self, Self::Error> {
        let email = UserEmail::parse(body.email.clone())?;

        let full_name = body.full_name.trim().to_string();
        if full_name.is_empty() || full_name.chars().count() > 120 {
            return Err("full name must be between 1 and 120 characters".into());
        }

        let phone = body.phone.clone()
            .filter(|p| !p.trim().is_empty())
            .map(PhoneNumberDomain::parse)
            .transpose()?;

        let role = match body.role.unwrap_or(ProfileRole::Buyer) {
            ProfileRole::Admin => return Err("admin accounts cannot be self-registered".into()),
            role => role
        };

        validate_password_strength(&body.password)?;

        Ok(NewAccount{ email, full_name, phone, role })
    }
}

#[tracing::instrument(
    "User registration started",
    skip(pool, tokenizer, body),
    fields(email = %body.email)
)]
pub async fn register(
    pool: web::Data<DbPool>,
    tokenizer: web::Data<Tokenizer>,
    body: web::Json<RegistrationBody>
) -> Result<HttpResponse, ApiError>{
    let account = NewAccount::try_from(&*body).map_err(ApiError::Validation)?;
    let password_hash = hash_password(body.into_inner().password).await?;

    let profile = insert_profile(&pool, NewProfile{
        id: Uuid::new_v4(),
        email: account.email.inner(),
        password_hash: password_hash.expose_secret().to_string(),
        full_name: account.full_name,
        phone: account.phone.map(|p| p.inner()),
        role: account.role,
        is_verified: false
    })
    .await?;

    let role = UserRole::from(profile.role);
    Ok(HttpResponse::Created().json(issue_token(&tokenizer, profile, role)?))
}

#[cfg(test)]
mod tests {
    use claim::{assert_err, assert_ok};
    use fake::{faker::{internet::en::SafeEmail, name::en::Name}, Fake};
    use secrecy::SecretString;

    use super::*;

    fn body(role: Option<ProfileRole>) -> RegistrationBody{
        RegistrationBody{
            email: SafeEmail().fake(),
            password: SecretString::from("market2024"),
            full_name: Name().fake(),
            phone: None,
            role
        }
    }

    #[test]
    fn buyers_and_vendors_can_register(){
        assert_ok!(NewAccount::try_from(&body(None)));
        assert_ok!(NewAccount::try_from(&body(Some(ProfileRole::Vendor))));
    }

    #[test]
    fn admin_role_cannot_be_self_assigned(){
        assert_err!(NewAccount::try_from(&body(Some(ProfileRole::Admin))));
    }

    #[test]
    fn weak_password_is_rejected(){
        let mut weak = body(None);
        weak.password = SecretString::from("short");
        assert_err!(NewAccount::try_from(&weak));
    }

    #[test]
    fn invalid_phone_is_rejected(){
        let mut with_phone = body(None);
        with_phone.phone = Some("not a phone".into());
        assert_err!(NewAccount::try_from(&with_phone));
    }
}
