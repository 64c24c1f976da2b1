//! View model builder
//!
//! Derives the list a section shows from the full snapshot it holds: text
//! search, category filter, the fixed class display order and pagination.
//! Nothing is memoized; every call re-derives from the snapshot.

use serde::Serialize;

use crate::models::{
    ArticleRecord, ClassRecord, GalleryCategory, GalleryItemRecord, ListParams, PagedResult,
};

/// Default display order of the classes page
pub const DEFAULT_CLASS_ORDER: &[&str] = &[
    "Bouncy Bunnies",
    "Jolly Giraffe",
    "Smart Lions",
    "Clever Cats",
    "Wise Mice",
    "Brainy Elephants",
];

/// Sentinel category value that disables the category filter
pub const ALL_CATEGORIES: &str = "All";

/// What the text and category filters look at
pub trait Searchable {
    fn title(&self) -> &str;

    fn description(&self) -> &str;

    fn tags(&self) -> &[String] {
        &[]
    }

    /// `None` for records without a category
    fn category(&self) -> Option<&str> {
        None
    }

    /// Name used by the fixed display order, if the kind has one
    fn display_name(&self) -> Option<&str> {
        None
    }
}

impl Searchable for ClassRecord {
    fn title(&self) -> &str {
        &self.classname
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn display_name(&self) -> Option<&str> {
        Some(&self.classname)
    }
}

impl Searchable for ArticleRecord {
    fn title(&self) -> &str {
        &self.title
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn category(&self) -> Option<&str> {
        Some(self.category.as_str())
    }
}

impl Searchable for GalleryItemRecord {
    fn title(&self) -> &str {
        &self.title
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn tags(&self) -> &[String] {
        &self.tags
    }

    fn category(&self) -> Option<&str> {
        Some(self.category.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(String),
}

impl CategoryFilter {
    /// Empty input and the `All` sentinel both disable the filter
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            None | Some("") | Some(ALL_CATEGORIES) => CategoryFilter::All,
            Some(other) => CategoryFilter::Only(other.to_string()),
        }
    }

    pub fn admits(&self, category: Option<&str>) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(wanted) => category == Some(wanted.as_str()),
        }
    }
}

/// Local UI state of a section's list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewQuery {
    pub search: String,
    pub category: CategoryFilter,
}

impl ViewQuery {
    pub fn new(search: impl Into<String>, category: CategoryFilter) -> Self {
        Self {
            search: search.into(),
            category,
        }
    }
}

/// Case-insensitive substring search over title, description and tags
pub fn matches_search<T: Searchable>(item: &T, search: &str) -> bool {
    if search.is_empty() {
        return true;
    }
    let needle = search.to_lowercase();
    item.title().to_lowercase().contains(&needle)
        || item.description().to_lowercase().contains(&needle)
        || item.tags().iter().any(|t| t.to_lowercase().contains(&needle))
}

/// Inclusion test: search AND category
pub fn matches<T: Searchable>(item: &T, query: &ViewQuery) -> bool {
    matches_search(item, &query.search) && query.category.admits(item.category())
}

pub fn filter<T: Searchable + Clone>(items: &[T], query: &ViewQuery) -> Vec<T> {
    items.iter().filter(|i| matches(*i, query)).cloned().collect()
}

/// Stable sort by position in `order`.
///
/// Names missing from `order` get index -1, so they come first and keep
/// their relative input order.
pub fn order_by_reference<T, S, F>(items: &mut [T], order: &[S], name: F)
where
    S: AsRef<str>,
    F: Fn(&T) -> &str,
{
    items.sort_by_key(|item| reference_index(order, name(item)));
}

fn reference_index<S: AsRef<str>>(order: &[S], name: &str) -> i64 {
    order
        .iter()
        .position(|o| o.as_ref() == name)
        .map(|i| i as i64)
        .unwrap_or(-1)
}

/// Full derivation: filter, apply the display order when given, paginate.
pub fn build_view<T, S>(
    items: &[T],
    query: &ViewQuery,
    order: Option<&[S]>,
    params: &ListParams,
) -> PagedResult<T>
where
    T: Searchable + Clone,
    S: AsRef<str>,
{
    let mut visible = filter(items, query);
    if let Some(order) = order {
        order_by_reference(&mut visible, order, |item| item.display_name().unwrap_or(""));
    }
    PagedResult::from_vec(visible, params)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub category: GalleryCategory,
    pub count: usize,
}

/// Gallery dashboard numbers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GalleryStats {
    pub total: usize,
    pub categories: Vec<CategoryCount>,
}

impl GalleryStats {
    pub fn compute(items: &[GalleryItemRecord]) -> Self {
        let categories = GalleryCategory::ALL
            .into_iter()
            .map(|category| CategoryCount {
                category,
                count: items.iter().filter(|i| i.category == category).count(),
            })
            .collect();
        Self {
            total: items.len(),
            categories,
        }
    }

    pub fn count(&self, category: GalleryCategory) -> usize {
        self.categories
            .iter()
            .find(|c| c.category == category)
            .map(|c| c.count)
            .unwrap_or(0)
    }
}
