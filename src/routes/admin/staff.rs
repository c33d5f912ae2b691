use actix_web::{web, HttpResponse};
use anyhow::Context;
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::{
    auth::IsSuperAdmin,
    db_interaction::staff::{create_staff, list_staff, replace_permissions, revoke_staff},
    domain::{Permission, ProfileRole, StaffRole, UserEmail},
    models::NewProfile,
    password::{generate_temporary_password, hash_password},
    routes::{audit, ApiError, RequestMeta},
    utils::DbPool
};

#[derive(Deserialize, Debug)]
pub struct StaffBody{
    pub email: String,
    pub full_name: String,
    pub role: StaffRole,
    #[serde(default)]
    pub permissions: Vec<Permission>
}

#[derive(Deserialize, Debug)]
pub struct PermissionsBody{
    pub permissions: Vec<Permission>
}

#[tracing::instrument("Listing staff", skip(pool, _admin))]
pub async fn get_staff(pool: web::Data<DbPool>, _admin: IsSuperAdmin) -> Result<HttpResponse, ApiError>{
    Ok(HttpResponse::Ok().json(list_staff(&pool).await?))
}

/// Creates an admin account. The generated password is returned in this
/// response only.
#[tracing::instrument("Creating staff member", skip(pool, admin, meta, body), fields(email = %body.email))]
pub async fn post_staff(
    pool: web::Data<DbPool>,
    admin: IsSuperAdmin,
    meta: RequestMeta,
    body: web::Json<StaffBody>
) -> Result<HttpResponse, ApiError>{
    let body = body.into_inner();
    let email = UserEmail::parse(body.email).map_err(ApiError::Validation)?;
    let full_name = body.full_name.trim().to_string();
    if full_name.is_empty() {
        return Err(ApiError::Validation("full name is required".into()));
    }

    let temporary_password = generate_temporary_password();
    let password_hash = hash_password(temporary_password.clone())
        .await
        .context("Failed to hash temporary password")?;

    let member = create_staff(
        &pool,
        NewProfile{
            id: Uuid::new_v4(),
            email: email.inner(),
            password_hash: password_hash.expose_secret().to_string(),
            full_name,
            phone: None,
            role: ProfileRole::Admin,
            is_verified: true
        },
        body.permissions,
        admin.0
    )
    .await?;

    audit(
        &pool,
        admin.0,
        &meta,
        "staff_created",
        "admin",
        member.profile.id,
        json!({ "role": body.role, "permissions": member.permissions })
    )
    .await;

    Ok(HttpResponse::Created().json(json!({
        "staff": member,
        "temporary_password": temporary_password.expose_secret()
    })))
}

#[tracing::instrument("Replacing staff permissions", skip(pool, admin, meta, body))]
pub async fn put_staff_permissions(
    pool: web::Data<DbPool>,
    admin: IsSuperAdmin,
    meta: RequestMeta,
    path: web::Path<Uuid>,
    body: web::Json<PermissionsBody>
) -> Result<HttpResponse, ApiError>{
    let staff_id = path.into_inner();
    let granted = replace_permissions(&pool, staff_id, body.into_inner().permissions, admin.0).await?;
    let names: Vec<String> = granted.into_iter().map(|p| p.permission).collect();

    audit(&pool, admin.0, &meta, "staff_permissions_updated", "admin", staff_id, json!({ "permissions": names })).await;

    Ok(HttpResponse::Ok().json(json!({ "permissions": names })))
}

#[tracing::instrument("Revoking staff access", skip(pool, admin, meta))]
pub async fn delete_staff(
    pool: web::Data<DbPool>,
    admin: IsSuperAdmin,
    meta: RequestMeta,
    path: web::Path<Uuid>
) -> Result<HttpResponse, ApiError>{
    let staff_id = path.into_inner();
    if staff_id == admin.0 {
        return Err(ApiError::Validation("You cannot revoke your own access".into()));
    }

    let profile = revoke_staff(&pool, staff_id).await?;
    audit(&pool, admin.0, &meta, "staff_revoked", "admin", profile.id, json!({ "role": profile.role })).await;

    Ok(HttpResponse::NoContent().finish())
}
