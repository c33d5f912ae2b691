use diesel::prelude::*;
use uuid::Uuid;

use crate::{models::{Category, CategoryChanges, NewCategory}, schema::categories, utils::DbPool};

use super::{run_query, QueryError};

#[tracing::instrument("Listing categories", skip(pool))]
pub async fn list_categories(pool: &DbPool, include_inactive: bool) -> Result<Vec<Category>, QueryError>{
    run_query(pool, move |conn| {
        let mut query = categories::table.into_boxed();
        if !include_inactive {
            query = query.filter(categories::is_active.eq(true));
        }

        Ok(query
            .select(Category::as_select())
            .order((categories::sort_order.asc(), categories::name.asc()))
            .load(conn)?)
    })
    .await
}

#[tracing::instrument("Inserting category", skip(pool, category), fields(slug = %category.slug))]
pub async fn insert_category(pool: &DbPool, category: NewCategory) -> Result<Category, QueryError>{
    run_query(pool, move |conn| {
        if let Some(parent_id) = category.parent_id {
            let parent = categories::table.find(parent_id).select(categories::id).first::<Uuid>(conn).optional()?;
            if parent.is_none() {
                return Err(QueryError::Invalid("Parent category does not exist".into()));
            }
        }

        diesel::insert_into(categories::table)
            .values(&category)
            .returning(Category::as_returning())
            .get_result(conn)
            .map_err(|e| match QueryError::from(e) {
                QueryError::Conflict(_) => QueryError::Conflict("A category with this slug already exists".into()),
                other => other
            })
    })
    .await
}

#[tracing::instrument("Updating category", skip(pool))]
pub async fn update_category(pool: &DbPool, category_id: Uuid, changes: CategoryChanges) -> Result<Category, QueryError>{
    run_query(pool, move |conn| {
        diesel::update(categories::table.find(category_id))
            .set(&changes)
            .returning(Category::as_returning())
            .get_result(conn)
            .map_err(|e| QueryError::from(e).or_missing("category"))
    })
    .await
}

#[tracing::instrument("Deleting category", skip(pool))]
pub async fn delete_category(pool: &DbPool, category_id: Uuid) -> Result<(), QueryError>{
    run_query(pool, move |conn| {
        let deleted = diesel::delete(categories::table.find(category_id)).execute(conn)?;
        if deleted == 0 {
            return Err(QueryError::NotFound("category"));
        }
        Ok(())
    })
    .await
}

/// Lowercase, dash separated slug built from a category name
pub fn slugify(name: &str) -> String{
    let mut slug = String::with_capacity(name.len());
    for c in name.trim().chars() {
        if c.is_alphanumeric() {
            slug.extend(c.to_lowercase());
        } else if !slug.ends_with('-') && !slug.is_empty() {
            slug.push('-');
        }
    }
    slug.trim_end_matches('-').to_string()
}

#[cfg(test)]
mod tests {
    use super::slugify;

    #[test]
    fn slugify_collapses_separators(){
        assert_eq!(slugify("  Home & Garden "), "home-garden");
        assert_eq!(slugify("Phones/Tablets"), "phones-tablets");
        assert_eq!(slugify("!!!"), "");
    }
}
