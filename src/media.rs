use std::fmt;

use serde::Deserialize;

pub type MovieId = u64;
pub type GenreId = u64;

pub const REVIEW_PREVIEW_CHARS: usize = 300;

pub const UNKNOWN: &str = "unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Category {
    #[default]
    All,
    Trending,
    Newest,
    TopRated,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::All => write!(f, "All"),
            Category::Trending => write!(f, "Trending"),
            Category::Newest => write!(f, "New"),
            Category::TopRated => write!(f, "Top"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FilterEdit {
    Genre(Option<GenreId>),
    MinRating(Option<f32>),
    Year(Option<i32>),
}

/// Every `with_*` method returns a new value; all of them except
/// [`Query::with_page`] reset `page` to 1.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub search_text: String,
    pub genre_id: Option<GenreId>,
    pub min_rating: Option<f32>,
    pub year: Option<i32>,
    pub category: Category,
    pub page: u32,
}

impl Default for Query {
    fn default() -> Self {
        Self {
            search_text: String::new(),
            genre_id: None,
            min_rating: None,
            year: None,
            category: Category::All,
            page: 1,
        }
    }
}

impl Query {
    pub fn with_search_text(&self, text: impl Into<String>) -> Self {
        Self {
            search_text: text.into(),
            page: 1,
            ..self.clone()
        }
    }

    pub fn with_filter(&self, edit: FilterEdit) -> Self {
        let mut next = Self {
            page: 1,
            ..self.clone()
        };
        match edit {
            FilterEdit::Genre(genre_id) => next.genre_id = genre_id,
            FilterEdit::MinRating(rating) => {
                next.min_rating = rating.filter(|r| r.is_finite()).map(|r| r.clamp(0.0, 10.0));
            }
            FilterEdit::Year(year) => {
                next.year = year.filter(|y| (1000..=9999).contains(y));
            }
        }
        next
    }

    pub fn with_category(&self, category: Category) -> Self {
        Self {
            category,
            page: 1,
            ..self.clone()
        }
    }

    pub fn with_page(&self, page: u32) -> Self {
        Self {
            page: page.max(1),
            ..self.clone()
        }
    }

    pub fn search_term(&self) -> Option<&str> {
        let term = self.search_text.trim();
        (!term.is_empty()).then_some(term)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Year {
    Known(i32),
    Unknown,
}

impl fmt::Display for Year {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Year::Known(year) => write!(f, "{}", year),
            Year::Unknown => f.write_str(UNKNOWN),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Genre {
    pub id: GenreId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MovieSummary {
    pub id: MovieId,
    pub title: String,
    pub rating_display: String,
    pub year: Year,
    pub poster_url: Option<String>,
    pub backdrop_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MovieDetail {
    pub summary: MovieSummary,
    pub duration_display: String,
    pub genres: Vec<String>,
    pub director: String,
    pub top_cast: Vec<String>,
    pub synopsis: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Review {
    pub id: String,
    pub author: String,
    pub content: String,
    pub rating_out_of_10: Option<f32>,
    pub avatar_url: Option<String>,
    pub created_at: String,
}

impl Review {
    pub fn preview(&self, limit: usize) -> (&str, bool) {
        match self.content.char_indices().nth(limit) {
            Some((end, _)) => (&self.content[..end], true),
            None => (&self.content, false),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReviewPage {
    pub reviews: Vec<Review>,
    pub page_index: u32,
    pub total_pages: u32,
    pub total_count: u32,
}

impl ReviewPage {
    pub fn has_more(&self) -> bool {
        self.page_index < self.total_pages
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    #[error("{operation} failed: {reason}")]
    FetchFailure {
        operation: &'static str,
        status: Option<u16>,
        reason: String,
    },
    #[error("movie {id} not found")]
    NotFound { id: MovieId },
    #[error("{operation} returned a malformed payload: {reason}")]
    Malformed {
        operation: &'static str,
        reason: String,
    },
}

impl ApiError {
    pub fn operation(&self) -> Option<&'static str> {
        match self {
            ApiError::FetchFailure { operation, .. } | ApiError::Malformed { operation, .. } => {
                Some(*operation)
            }
            ApiError::NotFound { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filtered_query() -> Query {
        Query {
            search_text: String::from("alien"),
            genre_id: Some(878),
            min_rating: Some(7.0),
            year: Some(1979),
            category: Category::TopRated,
            page: 4,
        }
    }

    #[test]
    fn test_default_query_shape() {
        let query = Query::default();

        assert_eq!(query.search_text, "");
        assert_eq!(query.genre_id, None);
        assert_eq!(query.min_rating, None);
        assert_eq!(query.year, None);
        assert_eq!(query.category, Category::All);
        assert_eq!(query.page, 1);
    }

    #[test]
    fn test_every_non_page_edit_resets_page() {
        let base = filtered_query();

        assert_eq!(base.with_search_text("aliens").page, 1);
        assert_eq!(base.with_filter(FilterEdit::Genre(Some(27))).page, 1);
        assert_eq!(base.with_filter(FilterEdit::Genre(None)).page, 1);
        assert_eq!(base.with_filter(FilterEdit::MinRating(Some(8.0))).page, 1);
        assert_eq!(base.with_filter(FilterEdit::Year(Some(1986))).page, 1);
        assert_eq!(base.with_category(Category::Newest).page, 1);
    }

    #[test]
    fn test_page_edit_keeps_other_fields() {
        let base = filtered_query();

        let next = base.with_page(5);

        assert_eq!(next, Query { page: 5, ..base });
    }

    #[test]
    fn test_page_zero_is_coerced_to_first_page() {
        assert_eq!(Query::default().with_page(0).page, 1);
    }

    #[test]
    fn test_min_rating_is_clamped() {
        let query = Query::default().with_filter(FilterEdit::MinRating(Some(12.5)));
        assert_eq!(query.min_rating, Some(10.0));

        let query = Query::default().with_filter(FilterEdit::MinRating(Some(f32::NAN)));
        assert_eq!(query.min_rating, None);
    }

    #[test]
    fn test_year_outside_four_digits_is_dropped() {
        let query = Query::default().with_filter(FilterEdit::Year(Some(123_456)));
        assert_eq!(query.year, None);

        let query = Query::default().with_filter(FilterEdit::Year(Some(-1)));
        assert_eq!(query.year, None);

        let query = Query::default().with_filter(FilterEdit::Year(Some(1999)));
        assert_eq!(query.year, Some(1999));
    }

    #[test]
    fn test_blank_search_text_is_no_search() {
        assert_eq!(Query::default().with_search_text("   ").search_term(), None);
        assert_eq!(
            Query::default().with_search_text(" dune ").search_term(),
            Some("dune")
        );
    }

    #[test]
    fn test_year_display() {
        assert_eq!(Year::Known(2024).to_string(), "2024");
        assert_eq!(Year::Unknown.to_string(), "unknown");
    }

    #[test]
    fn test_review_preview_truncates_on_char_boundary() {
        let review = Review {
            id: String::from("r1"),
            author: String::from("critic"),
            content: String::from("película estupenda"),
            rating_out_of_10: None,
            avatar_url: None,
            created_at: String::new(),
        };

        assert_eq!(review.preview(8), ("película", true));
        assert_eq!(review.preview(REVIEW_PREVIEW_CHARS), ("película estupenda", false));
    }

    #[test]
    fn test_review_page_has_more() {
        let page = ReviewPage {
            reviews: Vec::new(),
            page_index: 1,
            total_pages: 2,
            total_count: 25,
        };
        assert!(page.has_more());
        assert!(!ReviewPage { page_index: 2, ..page }.has_more());
    }
}
