use chrono::{DateTime, Utc};
use diesel::{pg::Pg, prelude::*};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    models::{AuditEntry, NewAuditEntry},
    schema::audit_log,
    utils::{DbPool, PageQuery}
};

use super::{run_query, QueryError};

pub const DEFAULT_AUDIT_PAGE_SIZE: i64 = 50;

/// One admin mutation to be recorded
#[derive(Debug, Clone)]
pub struct AuditRecord{
    pub admin_id: Uuid,
    pub action: &'static str,
    pub resource_type: &'static str,
    pub resource_id: Option<String>,
    pub changes: serde_json::Value,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>
}

#[derive(Deserialize, Debug, Default, Clone)]
pub struct AuditFilters{
    pub admin_id: Option<Uuid>,
    pub action: Option<String>,
    pub resource_type: Option<String>,
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>
}

/// Writes an audit row. A failed write is logged and otherwise ignored, the
/// mutation it describes has already happened.
#[tracing::instrument("Writing audit entry", skip(pool, record), fields(action = record.action, resource_type = record.resource_type))]
pub async fn log_action(pool: &DbPool, record: AuditRecord){
    let result = run_query(pool, move |conn| {
        diesel::insert_into(audit_log::table)
            .values(&NewAuditEntry{
                id: Uuid::new_v4(),
                admin_id: record.admin_id,
                action: record.action.to_string(),
                resource_type: record.resource_type.to_string(),
                resource_id: record.resource_id,
                changes: record.changes,
                ip_address: record.ip_address,
                user_agent: record.user_agent
            })
            .execute(conn)?;
        Ok(())
    })
    .await;

    if let Err(e) = result {
        tracing::error!(error = ?e, "Failed to write audit entry");
    }
}

fn filtered(filters: &AuditFilters) -> audit_log::BoxedQuery<'static, Pg>{
    let mut query = audit_log::table.into_boxed();

    if let Some(admin_id) = filters.admin_id {
        query = query.filter(audit_log::admin_id.eq(admin_id));
    }
    if let Some(action) = filters.action.clone() {
        query = query.filter(audit_log::action.eq(action));
    }
    if let Some(resource_type) = filters.resource_type.clone() {
        query = query.filter(audit_log::resource_type.eq(resource_type));
    }
    if let Some(from) = filters.date_from {
        query = query.filter(audit_log::created_at.ge(from));
    }
    if let Some(to) = filters.date_to {
        query = query.filter(audit_log::created_at.le(to));
    }

    query
}

#[tracing::instrument("Listing audit log", skip(pool))]
pub async fn list_audit_log(pool: &DbPool, filters: AuditFilters, page: PageQuery) -> Result<(Vec<AuditEntry>, i64), QueryError>{
    let page = page.or_limit(DEFAULT_AUDIT_PAGE_SIZE);

    run_query(pool, move |conn| {
        let count = filtered(&filters).count().get_result::<i64>(conn)?;
        let entries = filtered(&filters)
            .select(AuditEntry::as_select())
            .order(audit_log::created_at.desc())
            .limit(page.limit())
            .offset(page.offset())
            .load(conn)?;

        Ok((entries, count))
    })
    .await
}
