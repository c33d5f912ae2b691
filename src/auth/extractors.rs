use actix_web::{error::{ErrorForbidden, ErrorInternalServerError, ErrorUnauthorized}, web, FromRequest, HttpRequest};
use futures_util::future::{ready, Ready};
use uuid::Uuid;

use super::jwt::{Claims, Tokenizer, UserRole};

/// Any authenticated account
pub struct IsUser(pub Uuid, pub UserRole);

/// Account holding the vendor role
pub struct IsVendor(pub Uuid);

/// Admin or super admin; the flag is set for super admins
pub struct IsAdmin(pub Uuid, pub bool);

pub struct IsSuperAdmin(pub Uuid);

fn bearer_claims(req: &HttpRequest) -> Result<Claims, actix_web::Error>{
    let tokenizer = req.app_data::<web::Data<Tokenizer>>()
        .ok_or_else(|| ErrorInternalServerError("Token validation is not configured"))?;

    let header = req.headers()
        .get("Authorization")
        .ok_or_else(|| ErrorUnauthorized("Missing bearer token"))?
        .to_str()
        .map_err(|_| ErrorUnauthorized("Invalid token"))?;

    let token = header.strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| ErrorUnauthorized("Invalid token"))?;

    tokenizer.decode_key(token)
        .ok_or_else(|| ErrorUnauthorized("Invalid token"))
}

impl FromRequest for IsUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
        ready(bearer_claims(req).map(|claims| IsUser(claims.sub, claims.role)))
    }
}

impl FromRequest for IsVendor {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
        ready(bearer_claims(req).and_then(|claims| match claims.role {
            UserRole::Vendor => Ok(IsVendor(claims.sub)),
            _ => Err(ErrorForbidden("Vendor account required"))
        }))
    }
}

impl FromRequest for IsAdmin {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
        ready(bearer_claims(req).and_then(|claims| match claims.role {
            UserRole::Admin => Ok(IsAdmin(claims.sub, false)),
            UserRole::SuperAdmin => Ok(IsAdmin(claims.sub, true)),
            _ => Err(ErrorForbidden("Unauthorized Role"))
        }))
    }
}

impl FromRequest for IsSuperAdmin {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
        ready(bearer_claims(req).and_then(|claims| match claims.role {
            UserRole::SuperAdmin => Ok(IsSuperAdmin(claims.sub)),
            _ => Err(ErrorForbidden("Super admin access required"))
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{http::StatusCode, test::TestRequest, FromRequest};
    use secrecy::SecretString;

    use crate::configuration::JWTSettings;

    fn tokenizer() -> Tokenizer{
        Tokenizer::new(&JWTSettings{ secret: SecretString::from("extractor-secret"), expiry_hours: 1 })
    }

    fn request_with_token(role: UserRole) -> (HttpRequest, Uuid){
        let tokenizer = tokenizer();
        let user_id = Uuid::new_v4();
        let token = tokenizer.generate_key(user_id, "someone@example.com", role).unwrap();
        let req = TestRequest::default()
            .app_data(web::Data::new(tokenizer))
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .to_http_request();
        (req, user_id)
    }

    #[actix_web::test]
    async fn missing_header_is_unauthorized(){
        let req = TestRequest::default()
            .app_data(web::Data::new(tokenizer()))
            .to_http_request();

        let err = IsUser::extract(&req).await.err().unwrap();
        assert_eq!(err.as_response_error().status_code(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn non_bearer_scheme_is_unauthorized(){
        let req = TestRequest::default()
            .app_data(web::Data::new(tokenizer()))
            .insert_header(("Authorization", "Basic dXNlcjpwYXNz"))
            .to_http_request();

        let err = IsUser::extract(&req).await.err().unwrap();
        assert_eq!(err.as_response_error().status_code(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn buyer_token_is_forbidden_for_admin_routes(){
        let (req, _) = request_with_token(UserRole::Buyer);

        let err = IsAdmin::extract(&req).await.err().unwrap();
        assert_eq!(err.as_response_error().status_code(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn super_admin_passes_every_admin_extractor(){
        let (req, user_id) = request_with_token(UserRole::SuperAdmin);

        let IsAdmin(id, is_super) = IsAdmin::extract(&req).await.unwrap();
        assert_eq!(id, user_id);
        assert!(is_super);
        assert!(IsSuperAdmin::extract(&req).await.is_ok());
    }

    #[actix_web::test]
    async fn vendor_extractor_accepts_vendor_tokens_only(){
        let (req, user_id) = request_with_token(UserRole::Vendor);
        assert_eq!(IsVendor::extract(&req).await.unwrap().0, user_id);

        let (req, _) = request_with_token(UserRole::Admin);
        assert!(IsVendor::extract(&req).await.is_err());
    }
}
