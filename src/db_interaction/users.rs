use chrono::{DateTime, Utc};
use diesel::{pg::Pg, prelude::*};
use serde::Deserialize;
use uuid::Uuid;

use crate::{domain::ProfileRole, models::{NewProfile, Profile, ProfileChanges}, schema::profiles, utils::{DbPool, PageQuery}};

use super::{like_pattern, run_query, QueryError};

#[derive(Deserialize, Debug, Default, Clone)]
pub struct UserFilters{
    pub role: Option<ProfileRole>,
    pub search: Option<String>,
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>
}

#[tracing::instrument("Getting profile by email", skip(pool))]
pub async fn find_by_email(pool: &DbPool, email: String) -> Result<Option<Profile>, QueryError>{
    run_query(pool, move |conn| {
        Ok(profiles::table
            .filter(profiles::email.eq(email))
            .select(Profile::as_select())
            .first(conn)
            .optional()?)
    })
    .await
}

#[tracing::instrument("Getting profile by id", skip(pool))]
pub async fn find_by_id(pool: &DbPool, profile_id: Uuid) -> Result<Profile, QueryError>{
    run_query(pool, move |conn| {
        profiles::table
            .find(profile_id)
            .select(Profile::as_select())
            .first(conn)
            .map_err(|e| QueryError::from(e).or_missing("profile"))
    })
    .await
}

#[tracing::instrument("Inserting profile into the database", skip_all, fields(email = %profile.email))]
pub async fn insert_profile(pool: &DbPool, profile: NewProfile) -> Result<Profile, QueryError>{
    run_query(pool, move |conn| {
        diesel::insert_into(profiles::table)
            .values(&profile)
            .returning(Profile::as_returning())
            .get_result(conn)
            .map_err(|e| match QueryError::from(e) {
                QueryError::Conflict(_) => QueryError::Conflict("An account with this email already exists".into()),
                other => other
            })
    })
    .await
}

#[tracing::instrument("Updating profile", skip(pool))]
pub async fn update_profile(pool: &DbPool, profile_id: Uuid, mut changes: ProfileChanges) -> Result<Profile, QueryError>{
    changes.updated_at = Some(Utc::now());

    run_query(pool, move |conn| {
        diesel::update(profiles::table.find(profile_id))
            .set(&changes)
            .returning(Profile::as_returning())
            .get_result(conn)
            .map_err(|e| QueryError::from(e).or_missing("profile"))
    })
    .await
}

fn filtered(filters: &UserFilters) -> profiles::BoxedQuery<'static, Pg>{
    let mut query = profiles::table.into_boxed();

    if let Some(role) = filters.role {
        query = query.filter(profiles::role.eq(role));
    }
    if let Some(search) = filters.search.as_deref().filter(|s| !s.trim().is_empty()) {
        let pattern = like_pattern(search);
        query = query.filter(
            profiles::email.ilike(pattern.clone())
                .or(profiles::full_name.ilike(pattern.clone()))
                .or(profiles::phone.ilike(pattern))
        );
    }
    if let Some(from) = filters.date_from {
        query = query.filter(profiles::created_at.ge(from));
    }
    if let Some(to) = filters.date_to {
        query = query.filter(profiles::created_at.le(to));
    }

    query
}

#[tracing::instrument("Listing profiles", skip(pool))]
pub async fn list_users(pool: &DbPool, filters: UserFilters, page: PageQuery) -> Result<(Vec<Profile>, i64), QueryError>{
    run_query(pool, move |conn| {
        let count = filtered(&filters).count().get_result::<i64>(conn)?;
        let users = filtered(&filters)
            .select(Profile::as_select())
            .order(profiles::created_at.desc())
            .limit(page.limit())
            .offset(page.offset())
            .load(conn)?;

        Ok((users, count))
    })
    .await
}

/// Suspension clears the verified flag, matching how vendors are suspended
#[tracing::instrument("Suspending user", skip(pool))]
pub async fn suspend_user(pool: &DbPool, profile_id: Uuid) -> Result<Profile, QueryError>{
    run_query(pool, move |conn| {
        diesel::update(profiles::table.find(profile_id))
            .set((profiles::is_verified.eq(false), profiles::updated_at.eq(Utc::now())))
            .returning(Profile::as_returning())
            .get_result(conn)
            .map_err(|e| QueryError::from(e).or_missing("user"))
    })
    .await
}
