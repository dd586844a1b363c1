//! Data select queries
//!
//! A [`DataSelectQuery`] is built once per inbound request and only read
//! afterwards. "No sort", "no filter" and "no pagination" are plain
//! constructors rather than shared defaults.

use super::value::PropertyName;

// =============================================================================
// Sort
// =============================================================================

/// Direction code for ascending order in raw sort tokens
pub const ASCENDING_CODE: &str = "a";
/// Direction code for descending order in raw sort tokens
pub const DESCENDING_CODE: &str = "b";
/// Also accepted for descending order
pub const DESCENDING_ALIAS: &str = "d";

/// One sort key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortBy {
    pub property: PropertyName,
    pub ascending: bool,
}

/// Ordered list of sort keys
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortQuery {
    pub sort_by: Vec<SortBy>,
}

impl SortQuery {
    pub fn none() -> Self {
        Self::default()
    }

    /// Build from alternating `(direction, property)` tokens, e.g.
    /// `["a", "name", "b", "creationTimestamp"]`.
    ///
    /// An odd number of tokens or an unknown direction code yields no sort.
    pub fn from_tokens<S: AsRef<str>>(tokens: &[S]) -> Self {
        if tokens.len() % 2 == 1 {
            return Self::none();
        }

        let mut sort_by = Vec::with_capacity(tokens.len() / 2);
        for pair in tokens.chunks_exact(2) {
            let ascending = match pair[0].as_ref() {
                ASCENDING_CODE => true,
                DESCENDING_CODE | DESCENDING_ALIAS => false,
                _ => return Self::none(),
            };
            sort_by.push(SortBy {
                property: PropertyName::from(pair[1].as_ref()),
                ascending,
            });
        }
        Self { sort_by }
    }

    pub fn is_empty(&self) -> bool {
        self.sort_by.is_empty()
    }
}

// =============================================================================
// Filter
// =============================================================================

/// One filter term: the property must exist and match `value`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterBy {
    pub property: PropertyName,
    pub value: String,
}

/// Filter terms, all of which must match
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterQuery {
    pub filter_by: Vec<FilterBy>,
}

impl FilterQuery {
    pub fn none() -> Self {
        Self::default()
    }

    /// Build from alternating `(property, value)` tokens.
    ///
    /// An odd number of tokens yields no filter.
    pub fn from_tokens<S: AsRef<str>>(tokens: &[S]) -> Self {
        if tokens.len() % 2 == 1 {
            return Self::none();
        }

        let filter_by = tokens
            .chunks_exact(2)
            .map(|pair| FilterBy {
                property: PropertyName::from(pair[0].as_ref()),
                value: pair[1].as_ref().to_string(),
            })
            .collect();
        Self { filter_by }
    }

    pub fn is_empty(&self) -> bool {
        self.filter_by.is_empty()
    }
}

// =============================================================================
// Pagination
// =============================================================================

/// Page size and zero-based page index.
///
/// Negative values make the query invalid, which means "do not paginate".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationQuery {
    pub items_per_page: i64,
    pub page: i64,
}

impl PaginationQuery {
    pub fn new(items_per_page: i64, page: i64) -> Self {
        Self {
            items_per_page,
            page,
        }
    }

    /// Return everything
    pub fn none() -> Self {
        Self::new(-1, -1)
    }

    /// Return nothing
    pub fn empty() -> Self {
        Self::new(0, 0)
    }

    pub fn is_valid(&self) -> bool {
        self.items_per_page >= 0 && self.page >= 0
    }

    /// True when at least one item can be placed on the page starting at `start`
    pub fn is_page_available(&self, count: usize, start: usize) -> bool {
        count > start && self.items_per_page > 0
    }

    /// `(start, end)` item indices of the page, `end` clamped to `count`.
    ///
    /// Only meaningful for a valid query.
    pub fn bounds(&self, count: usize) -> (usize, usize) {
        let per_page = usize::try_from(self.items_per_page).unwrap_or(0);
        let page = usize::try_from(self.page).unwrap_or(0);
        let start = per_page.saturating_mul(page);
        let end = start.saturating_add(per_page).min(count);
        (start, end)
    }
}

impl Default for PaginationQuery {
    fn default() -> Self {
        Self::none()
    }
}

// =============================================================================
// Data Select Query
// =============================================================================

/// Combined sort, filter and pagination request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataSelectQuery {
    pub sort: SortQuery,
    pub filter: FilterQuery,
    pub pagination: PaginationQuery,
}

impl DataSelectQuery {
    pub fn new(sort: SortQuery, filter: FilterQuery, pagination: PaginationQuery) -> Self {
        Self {
            sort,
            filter,
            pagination,
        }
    }

    /// Select everything in input order
    pub fn everything() -> Self {
        Self::default()
    }

    /// Bind raw request parameters.
    ///
    /// `sort_by` and `filter_by` are comma-separated token lists. The page
    /// number is one-based on the wire; if either pagination value is
    /// missing or not an integer, no pagination is applied. Page `0` maps to
    /// index `-1` and likewise disables pagination.
    pub fn from_params(
        sort_by: Option<&str>,
        filter_by: Option<&str>,
        items_per_page: Option<&str>,
        page: Option<&str>,
    ) -> Self {
        let sort = sort_by
            .map(|raw| SortQuery::from_tokens(split_tokens(raw).as_slice()))
            .unwrap_or_default();
        let filter = filter_by
            .map(|raw| FilterQuery::from_tokens(split_tokens(raw).as_slice()))
            .unwrap_or_default();

        let pagination = match (
            items_per_page.and_then(|v| v.trim().parse::<i64>().ok()),
            page.and_then(|v| v.trim().parse::<i64>().ok()),
        ) {
            (Some(items_per_page), Some(page)) => {
                PaginationQuery::new(items_per_page, page.saturating_sub(1))
            }
            _ => PaginationQuery::none(),
        };

        Self::new(sort, filter, pagination)
    }
}

fn split_tokens(raw: &str) -> Vec<&str> {
    if raw.is_empty() {
        return Vec::new();
    }
    raw.split(',').collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_from_tokens() {
        let sort = SortQuery::from_tokens(&["a", "name", "d", "creationTimestamp"]);
        assert_eq!(
            sort.sort_by,
            vec![
                SortBy {
                    property: PropertyName::Name,
                    ascending: true
                },
                SortBy {
                    property: PropertyName::CreationTimestamp,
                    ascending: false
                },
            ]
        );
    }

    #[test]
    fn test_sort_descending_codes() {
        let descending = vec![SortBy {
            property: PropertyName::Name,
            ascending: false,
        }];
        assert_eq!(SortQuery::from_tokens(&["b", "name"]).sort_by, descending);
        assert_eq!(SortQuery::from_tokens(&["d", "name"]).sort_by, descending);

        let query = DataSelectQuery::from_params(Some("b,namespace,a,name"), None, None, None);
        assert!(!query.sort.sort_by[0].ascending);
        assert!(query.sort.sort_by[1].ascending);
    }

    #[test]
    fn test_malformed_sort_degrades_to_none() {
        assert!(SortQuery::from_tokens(&["a", "name", "d"]).is_empty());
        assert!(SortQuery::from_tokens(&["x", "name"]).is_empty());
        assert!(SortQuery::from_tokens::<&str>(&[]).is_empty());
    }

    #[test]
    fn test_filter_from_tokens() {
        let filter = FilterQuery::from_tokens(&["name", "web", "namespace", "prod"]);
        assert_eq!(filter.filter_by.len(), 2);
        assert_eq!(filter.filter_by[1].property, PropertyName::Namespace);
        assert_eq!(filter.filter_by[1].value, "prod");

        assert!(FilterQuery::from_tokens(&["name"]).is_empty());
    }

    #[test]
    fn test_pagination_validity() {
        assert!(!PaginationQuery::none().is_valid());
        assert!(PaginationQuery::empty().is_valid());
        assert!(!PaginationQuery::new(10, -1).is_valid());
        assert!(!PaginationQuery::new(-1, 0).is_valid());
    }

    #[test]
    fn test_pagination_bounds() {
        assert_eq!(PaginationQuery::new(10, 0).bounds(25), (0, 10));
        assert_eq!(PaginationQuery::new(10, 2).bounds(25), (20, 25));
        assert_eq!(PaginationQuery::new(10, 5).bounds(25), (50, 25));
        assert_eq!(PaginationQuery::new(0, 3).bounds(25), (0, 0));
    }

    #[test]
    fn test_pagination_bounds_property() {
        for count in 0..30usize {
            for per_page in 1..8i64 {
                for page in 0..8i64 {
                    let (start, end) = PaginationQuery::new(per_page, page).bounds(count);
                    if start < count {
                        assert!(start <= end && end <= count);
                    }
                    assert!(end.saturating_sub(start) <= per_page as usize);
                }
            }
        }
    }

    #[test]
    fn test_from_params() {
        let query = DataSelectQuery::from_params(Some("d,name"), Some("namespace,prod"), Some("10"), Some("3"));
        assert_eq!(query.sort.sort_by.len(), 1);
        assert!(!query.sort.sort_by[0].ascending);
        assert_eq!(query.filter.filter_by[0].value, "prod");
        assert_eq!(query.pagination, PaginationQuery::new(10, 2));

        let unpaged = DataSelectQuery::from_params(None, None, Some("ten"), Some("1"));
        assert_eq!(unpaged.pagination, PaginationQuery::none());
        assert!(unpaged.sort.is_empty());
        assert!(unpaged.filter.is_empty());

        let first_page_zero = DataSelectQuery::from_params(None, None, Some("10"), Some("0"));
        assert_eq!(first_page_zero.pagination, PaginationQuery::new(10, -1));
        assert!(!first_page_zero.pagination.is_valid());

        let odd = DataSelectQuery::from_params(Some("a,name,d"), Some("name"), None, None);
        assert!(odd.sort.is_empty());
        assert!(odd.filter.is_empty());
    }
}
