use chrono::{DateTime, Utc};
use diesel::{pg::Pg, prelude::*};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    domain::{KycStatus, ProfileRole, VendorStatus},
    models::{NewVendor, Vendor, VendorChanges},
    schema::{profiles, vendors},
    utils::{DbPool, PageQuery}
};

use super::{like_pattern, run_query, QueryError};

#[derive(Deserialize, Debug, Default, Clone)]
pub struct VendorFilters{
    pub status: Option<VendorStatus>,
    pub verification: Option<bool>,
    pub search: Option<String>,
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>
}

/// Admin decisions on a vendor account
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VendorReview{
    Approve,
    Reject,
    Suspend
}

impl VendorReview {
    pub fn audit_action(&self) -> &'static str{
        match self {
            VendorReview::Approve => "vendor_approved",
            VendorReview::Reject => "vendor_rejected",
            VendorReview::Suspend => "vendor_suspended"
        }
    }
}

/// Creates the vendor row for `owner_id` and switches the owner's profile to
/// the vendor role. New vendors start unverified with KYC pending.
#[tracing::instrument("Registering vendor", skip(pool, vendor), fields(owner_id = %vendor.owner_id))]
pub async fn register_vendor(pool: &DbPool, vendor: NewVendor) -> Result<Vendor, QueryError>{
    run_query(pool, move |conn| {
        conn.transaction::<_, QueryError, _>(|conn| {
            let role: ProfileRole = profiles::table
                .find(vendor.owner_id)
                .select(profiles::role)
                .first(conn)
                .map_err(|e| QueryError::from(e).or_missing("profile"))?;

            if role == ProfileRole::Admin {
                return Err(QueryError::Invalid("Admin accounts cannot register as vendors".into()));
            }

            let created = diesel::insert_into(vendors::table)
                .values(&vendor)
                .returning(Vendor::as_returning())
                .get_result(conn)
                .map_err(|e| match QueryError::from(e) {
                    QueryError::Conflict(_) => QueryError::Conflict("This account already has a vendor profile".into()),
                    other => other
                })?;

            diesel::update(profiles::table.find(vendor.owner_id))
                .set((profiles::role.eq(ProfileRole::Vendor), profiles::updated_at.eq(Utc::now())))
                .execute(conn)?;

            Ok(created)
        })
    })
    .await
}

#[tracing::instrument("Getting vendor by owner", skip(pool))]
pub async fn find_by_owner(pool: &DbPool, owner_id: Uuid) -> Result<Vendor, QueryError>{
    run_query(pool, move |conn| {
        vendors::table
            .filter(vendors::owner_id.eq(owner_id))
            .select(Vendor::as_select())
            .first(conn)
            .map_err(|e| QueryError::from(e).or_missing("vendor"))
    })
    .await
}

#[tracing::instrument("Getting vendor by id", skip(pool))]
pub async fn find_by_id(pool: &DbPool, vendor_id: Uuid) -> Result<Vendor, QueryError>{
    run_query(pool, move |conn| {
        vendors::table
            .find(vendor_id)
            .select(Vendor::as_select())
            .first(conn)
            .map_err(|e| QueryError::from(e).or_missing("vendor"))
    })
    .await
}

#[tracing::instrument("Updating vendor profile", skip(pool))]
pub async fn update_vendor(pool: &DbPool, owner_id: Uuid, mut changes: VendorChanges) -> Result<Vendor, QueryError>{
    changes.updated_at = Some(Utc::now());

    run_query(pool, move |conn| {
        diesel::update(vendors::table.filter(vendors::owner_id.eq(owner_id)))
            .set(&changes)
            .returning(Vendor::as_returning())
            .get_result(conn)
            .map_err(|e| QueryError::from(e).or_missing("vendor"))
    })
    .await
}

fn filtered(filters: &VendorFilters) -> vendors::BoxedQuery<'static, Pg>{
    let mut query = vendors::table.into_boxed();

    query = match filters.status {
        Some(VendorStatus::Pending) => query
            .filter(vendors::is_verified.eq(false))
            .filter(vendors::kyc_status.eq(KycStatus::Pending)),
        Some(VendorStatus::Approved) => query.filter(vendors::is_verified.eq(true)),
        Some(VendorStatus::Rejected) => query.filter(vendors::kyc_status.eq(KycStatus::Rejected)),
        Some(VendorStatus::Suspended) => query
            .filter(vendors::is_verified.eq(false))
            .filter(vendors::kyc_status.ne(KycStatus::Pending)),
        None => query
    };

    if let Some(verified) = filters.verification {
        query = query.filter(vendors::is_verified.eq(verified));
    }
    if let Some(search) = filters.search.as_deref().filter(|s| !s.trim().is_empty()) {
        let pattern = like_pattern(search);
        query = query.filter(
            vendors::business_name.ilike(pattern.clone())
                .or(vendors::email.ilike(pattern.clone()))
                .or(vendors::phone.ilike(pattern))
        );
    }
    if let Some(from) = filters.date_from {
        query = query.filter(vendors::created_at.ge(from));
    }
    if let Some(to) = filters.date_to {
        query = query.filter(vendors::created_at.le(to));
    }

    query
}

#[tracing::instrument("Listing vendors", skip(pool))]
pub async fn list_vendors(pool: &DbPool, filters: VendorFilters, page: PageQuery) -> Result<(Vec<Vendor>, i64), QueryError>{
    run_query(pool, move |conn| {
        let count = filtered(&filters).count().get_result::<i64>(conn)?;
        let vendors = filtered(&filters)
            .select(Vendor::as_select())
            .order(vendors::created_at.desc())
            .limit(page.limit())
            .offset(page.offset())
            .load(conn)?;

        Ok((vendors, count))
    })
    .await
}

/// Applies an admin decision. Suspension only clears the verified flag and
/// leaves the KYC outcome in place.
#[tracing::instrument("Reviewing vendor", skip(pool))]
pub async fn review_vendor(pool: &DbPool, vendor_id: Uuid, decision: VendorReview) -> Result<Vendor, QueryError>{
    run_query(pool, move |conn| {
        let target = vendors::table.find(vendor_id);
        let now = Utc::now();

        let updated = match decision {
            VendorReview::Approve => diesel::update(target)
                .set((vendors::is_verified.eq(true), vendors::kyc_status.eq(KycStatus::Approved), vendors::updated_at.eq(now)))
                .returning(Vendor::as_returning())
                .get_result(conn),
            VendorReview::Reject => diesel::update(target)
                .set((vendors::is_verified.eq(false), vendors::kyc_status.eq(KycStatus::Rejected), vendors::updated_at.eq(now)))
                .returning(Vendor::as_returning())
                .get_result(conn),
            VendorReview::Suspend => diesel::update(target)
                .set((vendors::is_verified.eq(false), vendors::updated_at.eq(now)))
                .returning(Vendor::as_returning())
                .get_result(conn)
        };

        updated.map_err(|e| QueryError::from(e).or_missing("vendor"))
    })
    .await
}
