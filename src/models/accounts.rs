use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use crate::{domain::ProfileRole, schema::{addresses, admin_permissions, profiles}};

#[derive(Queryable, Selectable, Serialize, Debug, Clone)]
#[diesel(table_name = profiles)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Profile{
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
    pub role: ProfileRole,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>
}

#[derive(Insertable)]
#[diesel(table_name = profiles)]
pub struct NewProfile{
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub role: ProfileRole,
    pub is_verified: bool
}

// `None` fields are left untouched by the update
#[derive(AsChangeset, Default, Debug)]
#[diesel(table_name = profiles)]
pub struct ProfileChanges{
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
    pub updated_at: Option<DateTime<Utc>>
}

#[derive(Queryable, Selectable, Serialize, Debug, Clone)]
#[diesel(table_name = addresses)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Address{
    pub id: Uuid,
    pub profile_id: Uuid,
    pub label: String,
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub region: Option<String>,
    pub postal_code: Option<String>,
    pub country: String,
    pub phone: Option<String>,
    pub is_default: bool,
    pub created_at: DateTime<Utc>
}

#[derive(Insertable, Debug)]
#[diesel(table_name = addresses)]
pub struct NewAddress{
    pub id: Uuid,
    pub profile_id: Uuid,
    pub label: String,
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub region: Option<String>,
    pub postal_code: Option<String>,
    pub country: String,
    pub phone: Option<String>,
    pub is_default: bool
}

#[derive(Queryable, Selectable, Serialize, Debug, Clone)]
#[diesel(table_name = admin_permissions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct AdminPermission{
    pub id: Uuid,
    pub admin_id: Uuid,
    pub permission: String,
    pub granted_by: Option<Uuid>,
    pub created_at: DateTime<Utc>
}

#[derive(Insertable)]
#[diesel(table_name = admin_permissions)]
pub struct NewAdminPermission{
    pub id: Uuid,
    pub admin_id: Uuid,
    pub permission: String,
    pub granted_by: Option<Uuid>
}
