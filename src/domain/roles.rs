use diesel::{deserialize::FromSqlRow, expression::AsExpression};
use serde::{Deserialize, Serialize};

/// Role stored on a profile row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsExpression, FromSqlRow)]
#[diesel(sql_type = diesel::sql_types::Text)]
#[serde(rename_all = "snake_case")]
pub enum ProfileRole{
    Buyer,
    Vendor,
    Admin
}

text_column_enum!(ProfileRole {
    Buyer => "buyer",
    Vendor => "vendor",
    Admin => "admin"
});

/// Job function of an admin staff account. Recorded in the audit trail only;
/// access is decided by permissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaffRole{
    Admin,
    Moderator,
    Support,
    Analyst
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Permission(String);

impl Permission {
    pub const SUPER_ADMIN: &'static str = "super_admin";

    pub fn parse(value: String) -> Result<Permission, String>{
        let valid = !value.is_empty()
            && value.len() <= 64
            && value.chars().all(|c| c.is_ascii_lowercase() || c == '_' || c == ':');

        if valid {
            Ok(Permission(value))
        } else {
            Err(format!("{} is not a valid permission name", value))
        }
    }

    pub fn super_admin() -> Permission{
        Permission(Self::SUPER_ADMIN.to_string())
    }

    pub fn is_super_admin(&self) -> bool{
        self.0 == Self::SUPER_ADMIN
    }

    pub fn as_str(&self) -> &str{
        &self.0
    }
}

impl TryFrom<String> for Permission {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Permission::parse(value)
    }
}

impl From<Permission> for String {
    fn from(value: Permission) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use claim::{assert_err, assert_ok};

    #[test]
    fn profile_role_round_trips_through_text(){
        assert_eq!("vendor".parse::<ProfileRole>().unwrap(), ProfileRole::Vendor);
        assert_eq!(ProfileRole::Admin.as_str(), "admin");
        assert_err!("superuser".parse::<ProfileRole>());
    }

    #[test]
    fn permission_names_are_restricted(){
        assert_ok!(Permission::parse("vendors:approve".to_string()));
        assert_err!(Permission::parse("".to_string()));
        assert_err!(Permission::parse("Drop Table".to_string()));
    }

    #[test]
    fn super_admin_permission_is_recognized(){
        assert!(Permission::super_admin().is_super_admin());
        assert!(!Permission::parse("orders:read".to_string()).unwrap().is_super_admin());
    }
}
