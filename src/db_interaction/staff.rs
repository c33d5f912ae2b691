use std::collections::HashMap;

use chrono::Utc;
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use crate::{
    domain::{Permission, ProfileRole},
    models::{AdminPermission, NewAdminPermission, NewProfile, Profile},
    schema::{admin_permissions, profiles},
    utils::DbPool
};

use super::{run_query, QueryError};

#[derive(Serialize, Debug)]
pub struct StaffMember{
    #[serde(flatten)]
    pub profile: Profile,
    pub permissions: Vec<String>
}

/// What an account may do in the admin portal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminAccess{
    NotAdmin,
    Admin,
    SuperAdmin
}

fn grant_all(
    conn: &mut PgConnection,
    admin_id: Uuid,
    permissions: &[Permission],
    granted_by: Uuid
) -> Result<Vec<AdminPermission>, QueryError>{
    let rows: Vec<NewAdminPermission> = permissions.iter()
        .map(|p| NewAdminPermission{
            id: Uuid::new_v4(),
            admin_id,
            permission: p.as_str().to_string(),
            granted_by: Some(granted_by)
        })
        .collect();

    Ok(diesel::insert_into(admin_permissions::table)
        .values(&rows)
        .on_conflict_do_nothing()
        .returning(AdminPermission::as_returning())
        .get_results(conn)?)
}

#[tracing::instrument("Listing admin staff", skip(pool))]
pub async fn list_staff(pool: &DbPool) -> Result<Vec<StaffMember>, QueryError>{
    run_query(pool, move |conn| {
        let admins = profiles::table
            .filter(profiles::role.eq(ProfileRole::Admin))
            .select(Profile::as_select())
            .order(profiles::created_at.asc())
            .load(conn)?;

        let ids: Vec<Uuid> = admins.iter().map(|p| p.id).collect();
        let mut granted: HashMap<Uuid, Vec<String>> = HashMap::new();
        for (admin_id, permission) in admin_permissions::table
            .filter(admin_permissions::admin_id.eq_any(ids))
            .select((admin_permissions::admin_id, admin_permissions::permission))
            .order(admin_permissions::permission.asc())
            .load::<(Uuid, String)>(conn)?
        {
            granted.entry(admin_id).or_default().push(permission);
        }

        Ok(admins.into_iter()
            .map(|profile| StaffMember{
                permissions: granted.remove(&profile.id).unwrap_or_default(),
                profile
            })
            .collect())
    })
    .await
}

/// Creates an admin account and grants it `permissions`
#[tracing::instrument("Creating staff member", skip(pool, profile, permissions), fields(email = %profile.email))]
pub async fn create_staff(
    pool: &DbPool,
    profile: NewProfile,
    permissions: Vec<Permission>,
    granted_by: Uuid
) -> Result<StaffMember, QueryError>{
    run_query(pool, move |conn| {
        conn.transaction::<_, QueryError, _>(|conn| {
            let profile = diesel::insert_into(profiles::table)
                .values(&profile)
                .returning(Profile::as_returning())
                .get_result(conn)
                .map_err(|e| match QueryError::from(e) {
                    QueryError::Conflict(_) => QueryError::Conflict("An account with this email already exists".into()),
                    other => other
                })?;

            let permissions = grant_all(conn, profile.id, &permissions, granted_by)?
                .into_iter()
                .map(|p| p.permission)
                .collect();

            Ok(StaffMember{ profile, permissions })
        })
    })
    .await
}

/// Replaces the permission set of an admin account
#[tracing::instrument("Replacing staff permissions", skip(pool))]
pub async fn replace_permissions(
    pool: &DbPool,
    admin_id: Uuid,
    permissions: Vec<Permission>,
    granted_by: Uuid
) -> Result<Vec<AdminPermission>, QueryError>{
    run_query(pool, move |conn| {
        conn.transaction::<_, QueryError, _>(|conn| {
            let role = profiles::table
                .find(admin_id)
                .select(profiles::role)
                .first::<ProfileRole>(conn)
                .optional()?;
            if role != Some(ProfileRole::Admin) {
                return Err(QueryError::NotFound("staff member"));
            }

            diesel::delete(admin_permissions::table)
                .filter(admin_permissions::admin_id.eq(admin_id))
                .execute(conn)?;

            grant_all(conn, admin_id, &permissions, granted_by)
        })
    })
    .await
}

/// Removes every permission and demotes the account to a buyer
#[tracing::instrument("Revoking staff access", skip(pool))]
pub async fn revoke_staff(pool: &DbPool, admin_id: Uuid) -> Result<Profile, QueryError>{
    run_query(pool, move |conn| {
        conn.transaction::<_, QueryError, _>(|conn| {
            diesel::delete(admin_permissions::table)
                .filter(admin_permissions::admin_id.eq(admin_id))
                .execute(conn)?;

            diesel::update(profiles::table)
                .filter(profiles::id.eq(admin_id))
                .filter(profiles::role.eq(ProfileRole::Admin))
                .set((
                    profiles::role.eq(ProfileRole::Buyer),
                    profiles::updated_at.eq(Utc::now())
                ))
                .returning(Profile::as_returning())
                .get_result(conn)
                .map_err(|e| QueryError::from(e).or_missing("staff member"))
        })
    })
    .await
}

#[tracing::instrument("Checking admin access", skip(pool))]
pub async fn admin_access(pool: &DbPool, profile_id: Uuid) -> Result<AdminAccess, QueryError>{
    run_query(pool, move |conn| {
        let role = profiles::table
            .find(profile_id)
            .select(profiles::role)
            .first::<ProfileRole>(conn)
            .optional()?;
        if role != Some(ProfileRole::Admin) {
            return Ok(AdminAccess::NotAdmin);
        }

        let super_grants: i64 = admin_permissions::table
            .filter(admin_permissions::admin_id.eq(profile_id))
            .filter(admin_permissions::permission.eq(Permission::SUPER_ADMIN))
            .count()
            .get_result(conn)?;

        Ok(if super_grants > 0 { AdminAccess::SuperAdmin } else { AdminAccess::Admin })
    })
    .await
}
