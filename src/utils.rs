use std::error::Error;

use diesel::{r2d2::ConnectionManager, PgConnection};
use r2d2::Pool;
use serde::{Deserialize, Serialize};

pub type DbPool = Pool<ConnectionManager<PgConnection>>;

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;

pub fn error_fmt_chain(f: &mut std::fmt::Formatter<'_>, source: &Option<impl Error>) -> std::fmt::Result{
    if let Some(error) = source{
        write!(f, "\n\tCaused By:\n\t")?;
        write!(f, "{:?}", &error)?;
        error_fmt_chain(f, &error.source())
    } else {
        Ok(())
    }
}

// Query parameters shared by every paginated listing
#[derive(Deserialize, Debug, Clone, Copy, Default)]
pub struct PageQuery{
    pub page: Option<i64>,
    pub limit: Option<i64>
}

impl PageQuery {
    pub fn page(&self) -> i64{
        self.page.unwrap_or(1).max(1)
    }

    pub fn limit(&self) -> i64{
        self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
    }

    pub fn offset(&self) -> i64{
        (self.page() - 1) * self.limit()
    }

    /// Uses `limit` when the caller did not ask for a page size
    pub fn or_limit(self, limit: i64) -> PageQuery{
        PageQuery{ limit: self.limit.or(Some(limit)), ..self }
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct Page<T>{
    pub data: Vec<T>,
    pub count: i64,
    pub page: i64,
    pub limit: i64
}

impl<T> Page<T> {
    pub fn new(data: Vec<T>, count: i64, query: &PageQuery) -> Self{
        Page{
            data,
            count,
            page: query.page(),
            limit: query.limit()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_query_defaults_to_first_page(){
        let query = PageQuery::default();
        assert_eq!(query.page(), 1);
        assert_eq!(query.limit(), DEFAULT_PAGE_SIZE);
        assert_eq!(query.offset(), 0);
    }

    #[test]
    fn page_query_clamps_out_of_range_values(){
        let query = PageQuery{ page: Some(-3), limit: Some(10_000) };
        assert_eq!(query.page(), 1);
        assert_eq!(query.limit(), MAX_PAGE_SIZE);

        let query = PageQuery{ page: Some(3), limit: Some(0) };
        assert_eq!(query.limit(), 1);
        assert_eq!(query.offset(), 2);
    }

    #[test]
    fn or_limit_keeps_an_explicit_page_size(){
        assert_eq!(PageQuery::default().or_limit(50).limit(), 50);
        assert_eq!(PageQuery{ page: None, limit: Some(5) }.or_limit(50).limit(), 5);
    }
}
