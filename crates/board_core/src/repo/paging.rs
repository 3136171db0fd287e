//! Sorting and paging value types shared by all repositories.

use crate::repo::crud::{RepoError, RepoResult};
use rusqlite::types::Value;
use serde::Serialize;

/// Sort direction for one property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// One sort criterion. `property` is the entity field name, either
/// `snake_case` (`created_at`) or `camelCase` (`createdAt`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub property: String,
    pub direction: Direction,
}

/// Ordered list of sort criteria. Empty means storage-default order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sort {
    orders: Vec<Order>,
}

impl Sort {
    pub fn unsorted() -> Self {
        Self::default()
    }

    pub fn asc(property: impl Into<String>) -> Self {
        Self::unsorted().then(property, Direction::Asc)
    }

    pub fn desc(property: impl Into<String>) -> Self {
        Self::unsorted().then(property, Direction::Desc)
    }

    /// Appends a lower-priority criterion.
    pub fn then(mut self, property: impl Into<String>, direction: Direction) -> Self {
        self.orders.push(Order {
            property: property.into(),
            direction,
        });
        self
    }

    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    pub fn is_unsorted(&self) -> bool {
        self.orders.is_empty()
    }

    /// Renders an `ORDER BY` clause, mapping properties through `resolve`.
    ///
    /// `id ASC` is appended as the final tiebreaker unless `id` is already
    /// part of the sort, so pages never overlap.
    pub(crate) fn to_order_by<F>(&self, resolve: F) -> RepoResult<String>
    where
        F: Fn(&str) -> Option<&'static str>,
    {
        let mut terms = Vec::with_capacity(self.orders.len() + 1);
        let mut has_id = false;
        for order in &self.orders {
            let column = resolve(order.property.as_str())
                .ok_or_else(|| RepoError::UnknownSortProperty(order.property.clone()))?;
            has_id |= column == "id";
            terms.push(format!("{column} {}", order.direction.as_sql()));
        }
        if !has_id {
            terms.push("id ASC".to_string());
        }
        Ok(format!(" ORDER BY {}", terms.join(", ")))
    }
}

/// Zero-based page request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    size: u32,
    sort: Sort,
}

impl PageRequest {
    pub fn of(page: u32, size: u32) -> Self {
        Self {
            page,
            size,
            sort: Sort::unsorted(),
        }
    }

    pub fn with_sort(mut self, sort: Sort) -> Self {
        self.sort = sort;
        self
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn sort(&self) -> &Sort {
        &self.sort
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page) * u64::from(self.size)
    }

    pub(crate) fn validate(&self) -> RepoResult<()> {
        if self.size == 0 {
            return Err(RepoError::InvalidPageRequest(
                "page size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// `LIMIT ? OFFSET ?` bind values.
    pub(crate) fn bounds(&self) -> RepoResult<Vec<Value>> {
        let offset = i64::try_from(self.offset())
            .map_err(|_| RepoError::InvalidPageRequest("page offset overflows".to_string()))?;
        Ok(vec![
            Value::Integer(i64::from(self.size)),
            Value::Integer(offset),
        ])
    }
}

/// One page of results plus totals.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub content: Vec<T>,
    pub number: u32,
    pub size: u32,
    pub total_elements: u64,
}

impl<T> Page<T> {
    pub fn total_pages(&self) -> u64 {
        if self.size == 0 {
            return 0;
        }
        self.total_elements.div_ceil(u64::from(self.size))
    }

    pub fn has_next(&self) -> bool {
        u64::from(self.number) + 1 < self.total_pages()
    }

    pub fn has_previous(&self) -> bool {
        self.number > 0
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::{Direction, Page, PageRequest, Sort};
    use crate::repo::crud::RepoError;
    use rusqlite::types::Value;

    fn resolve(property: &str) -> Option<&'static str> {
        match property {
            "id" => Some("id"),
            "title" => Some("title"),
            "createdAt" | "created_at" => Some("created_at"),
            _ => None,
        }
    }

    #[test]
    fn unsorted_falls_back_to_identity_order() {
        let clause = Sort::unsorted().to_order_by(resolve).unwrap();
        assert_eq!(clause, " ORDER BY id ASC");
    }

    #[test]
    fn sort_renders_criteria_in_priority_order_with_tiebreak() {
        let sort = Sort::desc("createdAt").then("title", Direction::Asc);
        let clause = sort.to_order_by(resolve).unwrap();
        assert_eq!(clause, " ORDER BY created_at DESC, title ASC, id ASC");
    }

    #[test]
    fn explicit_id_sort_is_not_duplicated() {
        let clause = Sort::desc("id").to_order_by(resolve).unwrap();
        assert_eq!(clause, " ORDER BY id DESC");
    }

    #[test]
    fn unknown_property_is_rejected() {
        let err = Sort::asc("title; DROP TABLE article")
            .to_order_by(resolve)
            .unwrap_err();
        assert!(matches!(err, RepoError::UnknownSortProperty(_)));
    }

    #[test]
    fn page_request_rejects_zero_size() {
        assert!(matches!(
            PageRequest::of(0, 0).validate(),
            Err(RepoError::InvalidPageRequest(_))
        ));
        assert_eq!(PageRequest::of(3, 20).offset(), 60);
    }

    #[test]
    fn page_totals() {
        let page = Page {
            content: vec![1, 2],
            number: 1,
            size: 2,
            total_elements: 5,
        };
        assert_eq!(page.total_pages(), 3);
        assert!(page.has_next());
        assert!(page.has_previous());

        let last = Page {
            content: vec![5],
            number: 2,
            size: 2,
            total_elements: 5,
        };
        assert!(!last.has_next());
    }

    #[test]
    fn bounds_bind_limit_then_offset() {
        let bounds = PageRequest::of(3, 20).bounds().unwrap();
        assert_eq!(bounds, vec![Value::Integer(20), Value::Integer(60)]);
    }
}
