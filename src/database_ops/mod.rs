pub mod activity;
pub mod db;
pub mod games;
pub mod users;

use serde::Serialize;

/// One page of a listing plus the figures needed to render pagination.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
    pub num_pages: u32,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, page: u32, per_page: u32, total: i64) -> Self {
        let num_pages = if per_page == 0 || total <= 0 {
            1
        } else {
            ((total as u64).div_ceil(per_page as u64)) as u32
        };
        Self {
            items,
            page,
            per_page,
            total,
            num_pages,
        }
    }

    pub fn has_next(&self) -> bool {
        self.page < self.num_pages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_count_rounds_up() {
        let p: Page<()> = Page::new(vec![], 1, 12, 25);
        assert_eq!(p.num_pages, 3);
        assert!(p.has_next());
        let empty: Page<()> = Page::new(vec![], 1, 12, 0);
        assert_eq!(empty.num_pages, 1);
        assert!(!empty.has_next());
    }
}
