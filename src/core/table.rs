//! Search, sort and pagination for admin list screens.
//!
//! Rows are filtered and ordered in memory through their JSON form, so any
//! serialisable row type works.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;

/// Rows per page when the request does not say
pub const DEFAULT_PAGE_SIZE: u64 = 10;
/// Largest page a client may ask for
pub const MAX_PAGE_SIZE: u64 = 100;
/// Page links shown around the current page
pub const PAGE_WINDOW: u64 = 5;

/// Sort order
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Smallest first
    #[default]
    Asc,
    /// Largest first
    Desc,
}

/// Query-string parameters of a list screen
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TableQuery {
    /// Case-insensitive text matched against every column
    pub search: Option<String>,
    /// Column to sort on
    pub sort_by: Option<String>,
    /// Sort order
    pub direction: Direction,
    /// 1-based page number
    pub page: Option<u64>,
    /// Rows per page
    pub page_size: Option<u64>,
}

/// One page of rows plus what the pager needs
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    /// Rows on this page
    pub items: Vec<T>,
    /// Current page, clamped to the available range
    pub page: u64,
    /// Rows per page
    pub page_size: u64,
    /// Rows matching the search across all pages
    pub total_items: u64,
    /// Number of pages; 0 when nothing matches
    pub total_pages: u64,
    /// Page numbers to render as links
    pub page_window: Vec<u64>,
}

fn matches_search(value: &Value, needle: &str) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => s.to_lowercase().contains(needle),
        Value::Array(items) => items.iter().any(|v| matches_search(v, needle)),
        Value::Object(map) => map.values().any(|v| matches_search(v, needle)),
        other => other.to_string().to_lowercase().contains(needle),
    }
}

fn compare(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None | Some(Value::Null), None | Some(Value::Null)) => Ordering::Equal,
        (None | Some(Value::Null), _) => Ordering::Less,
        (_, None | Some(Value::Null)) => Ordering::Greater,
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::String(x)), Some(Value::String(y))) => x.to_lowercase().cmp(&y.to_lowercase()),
        (Some(x), Some(y)) => x.to_string().cmp(&y.to_string()),
    }
}

/// Up to [`PAGE_WINDOW`] page numbers centred on `page` where possible.
#[must_use]
pub fn page_window(page: u64, total_pages: u64) -> Vec<u64> {
    if total_pages == 0 {
        return Vec::new();
    }
    let half = PAGE_WINDOW / 2;
    let mut start = page.saturating_sub(half).max(1);
    let end = (start + PAGE_WINDOW - 1).min(total_pages);
    if end + 1 - start < PAGE_WINDOW {
        start = (end + 1).saturating_sub(PAGE_WINDOW).max(1);
    }
    (start..=end).collect()
}

impl TableQuery {
    /// Effective page size, clamped to `1..=MAX_PAGE_SIZE`
    #[must_use]
    pub fn page_size(&self) -> u64 {
        self.page_size
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE)
    }

    /// Filters, sorts and slices `rows`. Out-of-range pages are clamped to the last page.
    #[must_use]
    pub fn apply<T>(&self, rows: Vec<T>) -> Page<T>
    where
        T: Serialize,
    {
        let needle = self
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);

        let mut keyed: Vec<(Value, T)> = rows
            .into_iter()
            .map(|row| (serde_json::to_value(&row).unwrap_or(Value::Null), row))
            .filter(|(value, _)| needle.as_deref().is_none_or(|n| matches_search(value, n)))
            .collect();

        if let Some(column) = self.sort_by.as_deref() {
            keyed.sort_by(|(a, _), (b, _)| {
                let ordering = compare(a.get(column), b.get(column));
                match self.direction {
                    Direction::Asc => ordering,
                    Direction::Desc => ordering.reverse(),
                }
            });
        }

        let page_size = self.page_size();
        let total_items = keyed.len() as u64;
        let total_pages = total_items.div_ceil(page_size);
        let page = self.page.unwrap_or(1).clamp(1, total_pages.max(1));
        let skip = usize::try_from((page - 1) * page_size).unwrap_or(usize::MAX);
        let take = usize::try_from(page_size).unwrap_or(usize::MAX);

        Page {
            items: keyed.into_iter().skip(skip).take(take).map(|(_, row)| row).collect(),
            page,
            page_size,
            total_items,
            total_pages,
            page_window: page_window(page, total_pages),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Serialize, PartialEq)]
    struct Row {
        name: &'static str,
        score: i32,
        note: Option<&'static str>,
    }

    fn rows() -> Vec<Row> {
        vec![
            Row { name: "Budi", score: 70, note: None },
            Row { name: "ani", score: 90, note: Some("Juara kelas") },
            Row { name: "Citra", score: 80, note: None },
            Row { name: "Dodi", score: 70, note: Some("pindahan") },
        ]
    }

    #[test]
    fn test_search_is_case_insensitive_across_columns() {
        let query = TableQuery {
            search: Some("JUARA".to_string()),
            ..Default::default()
        };
        let page = query.apply(rows());
        assert_eq!(page.total_items, 1);
        assert_eq!(page.items[0].name, "ani");

        let query = TableQuery {
            search: Some("80".to_string()),
            ..Default::default()
        };
        assert_eq!(query.apply(rows()).items[0].name, "Citra");
    }

    #[test]
    fn test_sort_is_stable_and_directional() {
        let query = TableQuery {
            sort_by: Some("score".to_string()),
            ..Default::default()
        };
        let names: Vec<_> = query.apply(rows()).items.iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["Budi", "Dodi", "Citra", "ani"]);

        let query = TableQuery {
            sort_by: Some("name".to_string()),
            direction: Direction::Desc,
            ..Default::default()
        };
        let names: Vec<_> = query.apply(rows()).items.iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["Dodi", "Citra", "Budi", "ani"]);
    }

    #[test]
    fn test_pagination() {
        let many: Vec<Row> = (0..23)
            .map(|i| Row { name: "x", score: i, note: None })
            .collect();
        let query = TableQuery {
            page: Some(3),
            ..Default::default()
        };
        let page = query.apply(many.clone());
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.items.len(), 3);
        assert_eq!(page.items[0].score, 20);

        let query = TableQuery {
            page: Some(99),
            page_size: Some(1000),
            ..Default::default()
        };
        let page = query.apply(many);
        assert_eq!(page.page_size, MAX_PAGE_SIZE);
        assert_eq!(page.page, 1);
        assert_eq!(page.items.len(), 23);
    }

    #[test]
    fn test_page_window() {
        assert_eq!(page_window(1, 0), Vec::<u64>::new());
        assert_eq!(page_window(1, 3), vec![1, 2, 3]);
        assert_eq!(page_window(1, 10), vec![1, 2, 3, 4, 5]);
        assert_eq!(page_window(6, 10), vec![4, 5, 6, 7, 8]);
        assert_eq!(page_window(10, 10), vec![6, 7, 8, 9, 10]);
    }
}
