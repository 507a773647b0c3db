//! The listing query pipeline: filter, sort, paginate.
//!
//! Three pure stages, always run in that order, over the full in-memory
//! collection. The pipeline is idempotent so derived pages can be memoized
//! keyed by the (dataset, filter) pair: re-running it on unchanged inputs
//! yields an identical page.

use super::model::Listing;
use serde::{Deserialize, Serialize};

/// Fixed number of listings per page.
pub const PAGE_SIZE: usize = 9;

/// Sort key for the result ordering stage.
///
/// `Default` preserves source order. Numeric keys treat missing values as
/// zero rather than failing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    Default,
    PriceAsc,
    PriceDesc,
    RatingDesc,
    YearDesc,
}

impl SortKey {
    /// The wire value used in catalog query parameters.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::PriceAsc => "price_asc",
            Self::PriceDesc => "price_desc",
            Self::RatingDesc => "rating_desc",
            Self::YearDesc => "year_desc",
        }
    }
}

/// User-controlled filter state.
///
/// Mutated only by user input. Callers that change any field other than
/// `page` must reset `page` to 1; the pipeline itself only clamps the page
/// into the valid range for the current result size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryFilter {
    /// Make to match exactly, or `"all"` for no make constraint
    pub make: String,
    /// Free-text search over make, model and year
    pub search: String,
    pub sort: SortKey,
    pub category: Option<String>,
    /// 1-based page index
    pub page: usize,
}

impl QueryFilter {
    /// Whether two filters select and order the same result set.
    ///
    /// Ignores `page`: a page change re-slices an existing selection
    /// instead of re-running it.
    pub fn same_selection(&self, other: &Self) -> bool {
        self.make == other.make
            && self.search == other.search
            && self.sort == other.sort
            && self.category == other.category
    }
}

impl Default for QueryFilter {
    fn default() -> Self {
        Self {
            make: "all".to_string(),
            search: String::new(),
            sort: SortKey::Default,
            category: None,
            page: 1,
        }
    }
}

/// One derived page of results.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPage {
    pub items: Vec<Listing>,
    /// 1-based page index, clamped into `[1, total_pages]`
    pub page: usize,
    pub total_pages: usize,
    pub total_matches: usize,
}

fn matches(listing: &Listing, filter: &QueryFilter) -> bool {
    if filter.make != "all" && !listing.make.eq_ignore_ascii_case(&filter.make) {
        return false;
    }
    if let Some(category) = &filter.category {
        match &listing.category {
            Some(c) if c.eq_ignore_ascii_case(category) => {}
            _ => return false,
        }
    }
    if !filter.search.is_empty() {
        let haystack =
            format!("{} {} {}", listing.make, listing.model, listing.year).to_lowercase();
        if !haystack.contains(&filter.search.to_lowercase()) {
            return false;
        }
    }
    true
}

/// Runs the selection stages (filter + sort) over `listings`.
///
/// 1. **filter** - make equality (unless `"all"`), case-insensitive
///    substring match against `"make model year"`, optional category match.
/// 2. **sort** - stable; missing numeric fields sort as zero.
///
/// The returned list is the full ordered match set; `page` is ignored.
/// Callers slice pages out of it with [`slice`].
pub fn select(listings: &[Listing], filter: &QueryFilter) -> Vec<Listing> {
    let mut matched: Vec<Listing> = listings
        .iter()
        .filter(|l| matches(l, filter))
        .cloned()
        .collect();

    match filter.sort {
        SortKey::Default => {}
        SortKey::PriceAsc => matched.sort_by(|a, b| a.price.total_cmp(&b.price)),
        SortKey::PriceDesc => matched.sort_by(|a, b| b.price.total_cmp(&a.price)),
        SortKey::RatingDesc => matched.sort_by(|a, b| {
            b.rating
                .unwrap_or(0.0)
                .total_cmp(&a.rating.unwrap_or(0.0))
        }),
        SortKey::YearDesc => matched.sort_by(|a, b| b.year.cmp(&a.year)),
    }

    matched
}

/// Slices one page out of an ordered match set.
///
/// Fixed page size, requested page clamped into `[1, max(1, total_pages)]`.
pub fn slice(matched: &[Listing], requested_page: usize) -> QueryPage {
    let total_matches = matched.len();
    let total_pages = total_matches.div_ceil(PAGE_SIZE).max(1);
    let page = requested_page.clamp(1, total_pages);

    let start = (page - 1) * PAGE_SIZE;
    let items: Vec<Listing> = matched
        .iter()
        .skip(start)
        .take(PAGE_SIZE)
        .cloned()
        .collect();

    QueryPage {
        items,
        page,
        total_pages,
        total_matches,
    }
}

/// Runs the full pipeline (filter, sort, paginate) and returns the
/// requested page.
pub fn apply(listings: &[Listing], filter: &QueryFilter) -> QueryPage {
    slice(&select(listings, filter), filter.page)
}
