use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{configuration::JWTSettings, domain::ProfileRole};

#[derive(Clone)]
pub struct Tokenizer{
    pub secret: SecretString,
    pub expiry_hours: u64
}

impl Tokenizer {
    pub fn new(settings: &JWTSettings) -> Self {
        Self{
            secret: settings.secret.clone(),
            expiry_hours: settings.expiry_hours
        }
    }

    pub fn generate_key(&self, user_id: Uuid, email: &str, role: UserRole) -> Result<String, jsonwebtoken::errors::Error>{
        let expiry = Utc::now() + Duration::hours(self.expiry_hours as i64);

        let claims = Claims{
            sub: user_id,
            exp: expiry.timestamp() as usize,
            email: email.to_string(),
            role
        };

        jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.expose_secret().as_bytes())
        )
    }

    pub fn decode_key(&self, token: &str) -> Option<Claims>{
        match jsonwebtoken::decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.expose_secret().as_bytes()),
            &Validation::new(Algorithm::HS256)
        ) {
            Ok(decoded_data) => Some(decoded_data.claims),
            Err(e) => {
                tracing::debug!(error = %e, "Rejected bearer token");
                None
            }
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims{
    pub sub: Uuid,
    pub exp: usize,
    pub email: String,
    pub role: UserRole
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UserRole{
    Buyer,
    Vendor,
    Admin,
    SuperAdmin
}

impl UserRole {
    pub fn is_admin(&self) -> bool{
        matches!(self, UserRole::Admin | UserRole::SuperAdmin)
    }
}

impl From<ProfileRole> for UserRole {
    fn from(role: ProfileRole) -> Self {
        match role {
            ProfileRole::Buyer => UserRole::Buyer,
            ProfileRole::Vendor => UserRole::Vendor,
            ProfileRole::Admin => UserRole::Admin
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn create_test_settings(secret: &str) -> JWTSettings {
        JWTSettings {
            secret: SecretString::from(secret),
            expiry_hours: 24,
        }
    }

    #[test]
    fn test_tokenizer_new() {
        let settings = create_test_settings("test_secret");
        let tokenizer = Tokenizer::new(&settings);

        assert_eq!(tokenizer.secret.expose_secret(), "test_secret");
        assert_eq!(tokenizer.expiry_hours, settings.expiry_hours);
    }

    #[test]
    fn test_generate_key_for_buyer() {
        let tokenizer = Tokenizer::new(&create_test_settings("test_secret"));
        let user_id = Uuid::new_v4();
        let token = tokenizer.generate_key(user_id, "buyer@example.com", UserRole::Buyer).unwrap();

        let claims = tokenizer.decode_key(&token).expect("Failed to decode token");

        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.email, "buyer@example.com");
        assert_eq!(claims.role, UserRole::Buyer);
        assert!(!claims.role.is_admin());
    }

    #[test]
    fn test_generate_key_for_super_admin() {
        let tokenizer = Tokenizer::new(&create_test_settings("test_secret"));
        let token = tokenizer.generate_key(Uuid::new_v4(), "root@example.com", UserRole::SuperAdmin).unwrap();

        let claims = tokenizer.decode_key(&token).expect("Failed to decode token");

        assert_eq!(claims.role, UserRole::SuperAdmin);
        assert!(claims.role.is_admin());
    }

    #[test]
    fn test_token_expiry() {
        let tokenizer = Tokenizer::new(&create_test_settings("test_secret"));
        let token = tokenizer.generate_key(Uuid::new_v4(), "buyer@example.com", UserRole::Buyer).unwrap();

        let claims = tokenizer.decode_key(&token).expect("Failed to decode token");
        let expected_expiry = Utc::now() + chrono::Duration::hours(24);

        assert!(
            (claims.exp as i64 - expected_expiry.timestamp()).abs() < 5,
            "Expiry time differs significantly from expected"
        );
    }

    #[test]
    fn test_decode_invalid_token() {
        let tokenizer = Tokenizer::new(&create_test_settings("test_secret"));
        assert!(tokenizer.decode_key("invalid_token").is_none());
    }

    #[test]
    fn test_decode_token_with_wrong_secret() {
        let token = Tokenizer::new(&create_test_settings("secret1"))
            .generate_key(Uuid::new_v4(), "buyer@example.com", UserRole::Vendor)
            .unwrap();

        let result = Tokenizer::new(&create_test_settings("secret2")).decode_key(&token);
        assert!(result.is_none());
    }

    #[test]
    fn profile_roles_map_to_token_roles() {
        assert_eq!(UserRole::from(ProfileRole::Vendor), UserRole::Vendor);
        assert_eq!(UserRole::from(ProfileRole::Admin), UserRole::Admin);
    }
}
