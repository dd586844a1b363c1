//! Data selector: filter, sort and paginate over data cells
//!
//! The selector never looks at the concrete domain type; it only reads
//! properties through [`DataCell`].

use super::query::{DataSelectQuery, FilterQuery, PaginationQuery, SortQuery};
use super::value::DataCell;
use std::cmp::Ordering;

/// Select cells according to `query`.
///
/// Returns the selected page together with the number of cells that passed
/// the filter, before pagination. That total is what callers report as
/// "total items".
pub fn select<C: DataCell>(cells: Vec<C>, query: &DataSelectQuery) -> (Vec<C>, usize) {
    let filtered = filter(cells, &query.filter);
    let total = filtered.len();
    let page = paginate(sort(filtered, &query.sort), &query.pagination);
    (page, total)
}

/// Keep the cells for which every filter term resolves and matches.
/// Order of surviving cells is preserved.
pub fn filter<C: DataCell>(cells: Vec<C>, query: &FilterQuery) -> Vec<C> {
    if query.is_empty() {
        return cells;
    }
    cells
        .into_iter()
        .filter(|cell| {
            query.filter_by.iter().all(|term| {
                cell.get_property(&term.property)
                    .map_or(false, |value| value.matches_raw(&term.value))
            })
        })
        .collect()
}

/// Stable multi-key sort
pub fn sort<C: DataCell>(cells: Vec<C>, query: &SortQuery) -> Vec<C> {
    if query.is_empty() {
        return cells;
    }
    merge_sort(cells, &mut |a, b| compare_cells(a, b, query))
}

/// Compare two cells key by key.
///
/// As soon as either cell lacks the property of the current key, the pair
/// has no preference: the remaining keys are not evaluated.
pub fn compare_cells<C: DataCell>(a: &C, b: &C, query: &SortQuery) -> Ordering {
    for key in &query.sort_by {
        let (Some(left), Some(right)) = (a.get_property(&key.property), b.get_property(&key.property))
        else {
            break;
        };
        match left.compare(&right) {
            Ordering::Equal => continue,
            ord if key.ascending => return ord,
            ord => return ord.reverse(),
        }
    }
    Ordering::Equal
}

/// Cut out the requested page.
///
/// Guard order: an invalid query returns everything, then an unavailable
/// page returns nothing, then the page is sliced.
pub fn paginate<C>(mut cells: Vec<C>, query: &PaginationQuery) -> Vec<C> {
    if !query.is_valid() {
        return cells;
    }

    let (start, end) = query.bounds(cells.len());
    if !query.is_page_available(cells.len(), start) {
        return Vec::new();
    }

    cells.truncate(end);
    cells.split_off(start)
}

// The comparator is not a total order once properties are missing, so the
// standard library sort (which may panic on such comparators) is avoided.
fn merge_sort<T, F>(mut items: Vec<T>, cmp: &mut F) -> Vec<T>
where
    F: FnMut(&T, &T) -> Ordering,
{
    if items.len() <= 1 {
        return items;
    }

    let right = items.split_off(items.len() / 2);
    let left = merge_sort(items, cmp);
    let right = merge_sort(right, cmp);

    let mut merged = Vec::with_capacity(left.len() + right.len());
    let mut left = left.into_iter().peekable();
    let mut right = right.into_iter().peekable();
    loop {
        let take_right = match (left.peek(), right.peek()) {
            (Some(l), Some(r)) => cmp(r, l) == Ordering::Less,
            (Some(_), None) => false,
            (None, Some(_)) => true,
            (None, None) => break,
        };
        let next = if take_right { right.next() } else { left.next() };
        merged.extend(next);
    }
    merged
}
