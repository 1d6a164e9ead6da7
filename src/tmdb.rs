use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Datelike, NaiveDate};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::instrument;

use crate::media::{
    ApiError, Category, Genre, MovieDetail, MovieId, MovieSummary, Query, Review, ReviewPage,
    Year, UNKNOWN,
};
use crate::settings::AppSettings;
use crate::video::{select_trailer, VideosResponse};

pub const TOP_RATED_MIN_VOTES: u32 = 100;

pub const TOP_CAST_LIMIT: usize = 5;

pub const NO_SYNOPSIS: &str = "No synopsis available.";

const REVIEW_DATE_FORMAT: &str = "%B %-d, %Y";

#[async_trait]
pub trait MetadataGateway: Send + Sync {
    async fn fetch_movies(&self, query: &Query) -> Result<Vec<MovieSummary>, ApiError>;

    async fn fetch_genres(&self) -> Result<Vec<Genre>, ApiError>;

    async fn fetch_movie_detail(&self, id: MovieId) -> Result<MovieDetail, ApiError>;

    /// `Ok(None)` means the movie has no playable trailer.
    async fn fetch_trailer_key(&self, id: MovieId) -> Result<Option<String>, ApiError>;

    async fn fetch_reviews(&self, id: MovieId, page: u32) -> Result<ReviewPage, ApiError>;
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenreListResponse {
    pub genres: Vec<Genre>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbMovieResult {
    pub id: MovieId,
    pub title: String,
    pub vote_average: Option<f64>,
    pub release_date: Option<String>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbListResponse {
    pub results: Vec<TmdbMovieResult>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbMovieDetails {
    pub id: MovieId,
    pub title: String,
    pub vote_average: Option<f64>,
    pub release_date: Option<String>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub runtime: Option<u32>,
    #[serde(default)]
    pub genres: Vec<Genre>,
    pub overview: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbCreditsResponse {
    #[serde(default)]
    pub cast: Vec<TmdbCastMember>,
    #[serde(default)]
    pub crew: Vec<TmdbCrewMember>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbCastMember {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbCrewMember {
    pub name: String,
    #[serde(default)]
    pub job: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbReviewsResponse {
    pub page: u32,
    pub results: Vec<TmdbReview>,
    pub total_pages: u32,
    pub total_results: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbReview {
    pub id: String,
    pub author: String,
    pub content: String,
    pub created_at: String,
    #[serde(default)]
    pub author_details: TmdbAuthorDetails,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TmdbAuthorDetails {
    pub rating: Option<f32>,
    pub avatar_path: Option<String>,
}

#[derive(Debug, Clone, Copy)]
pub enum ImageSize {
    Poster,
    Backdrop,
    Avatar,
}

impl ImageSize {
    fn token(self) -> &'static str {
        match self {
            ImageSize::Poster => "w500",
            ImageSize::Avatar => "w185",
            ImageSize::Backdrop => "original",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListingRequest {
    pub endpoint: &'static str,
    pub params: Vec<(&'static str, String)>,
}

// Search wins over category; every other branch carries the genre/year/rating filters.
pub fn listing_request(query: &Query) -> ListingRequest {
    let page = ("page", query.page.max(1).to_string());

    if let Some(term) = query.search_term() {
        return ListingRequest {
            endpoint: "/search/movie",
            params: vec![("query", term.to_string()), page],
        };
    }

    let (endpoint, mut params) = match query.category {
        Category::Trending => ("/trending/movie/week", vec![page]),
        Category::Newest => (
            "/discover/movie",
            vec![page, ("sort_by", String::from("primary_release_date.desc"))],
        ),
        Category::TopRated => (
            "/discover/movie",
            vec![
                page,
                ("sort_by", String::from("vote_average.desc")),
                ("vote_count.gte", TOP_RATED_MIN_VOTES.to_string()),
            ],
        ),
        Category::All => ("/discover/movie", vec![page]),
    };

    if let Some(genre_id) = query.genre_id {
        params.push(("with_genres", genre_id.to_string()));
    }
    if let Some(year) = query.year {
        params.push(("year", year.to_string()));
    }
    if let Some(rating) = query.min_rating {
        params.push(("vote_average.gte", rating.to_string()));
    }

    ListingRequest { endpoint, params }
}

pub fn format_rating(vote_average: Option<f64>) -> String {
    match vote_average {
        Some(v) if v.is_finite() && v != 0.0 => format!("{:.1}", (v * 10.0).round() / 10.0),
        _ => String::from("0.0"),
    }
}

pub fn release_year(release_date: Option<&str>) -> Year {
    release_date
        .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
        .map_or(Year::Unknown, |d| Year::Known(d.year()))
}

pub fn format_duration(runtime: Option<u32>) -> String {
    match runtime {
        Some(minutes) if minutes > 0 => format!("{}min", minutes),
        _ => String::from(UNKNOWN),
    }
}

pub fn find_director(crew: &[TmdbCrewMember]) -> String {
    crew.iter()
        .find(|c| c.job == "Director")
        .map_or_else(|| String::from(UNKNOWN), |c| c.name.clone())
}

pub fn top_cast(cast: &[TmdbCastMember]) -> Vec<String> {
    cast.iter()
        .take(TOP_CAST_LIMIT)
        .map(|c| c.name.clone())
        .collect()
}

pub fn format_review_date(created_at: &str) -> String {
    DateTime::parse_from_rfc3339(created_at)
        .map(|dt| dt.format(REVIEW_DATE_FORMAT).to_string())
        .unwrap_or_else(|_| created_at.to_string())
}

#[derive(Clone)]
pub struct TmdbClient {
    api_key: String,
    base_url: String,
    image_base_url: String,
    language: String,
    http_client: Arc<reqwest::Client>,
}

impl std::fmt::Debug for TmdbClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TmdbClient")
            .field("base_url", &self.base_url)
            .field("image_base_url", &self.image_base_url)
            .field("language", &self.language)
            .finish_non_exhaustive()
    }
}

impl TmdbClient {
    pub fn from_settings(settings: &AppSettings) -> Self {
        Self {
            api_key: settings.api_key.clone(),
            base_url: settings.api_base_url.trim_end_matches('/').to_string(),
            image_base_url: settings.image_base_url.trim_end_matches('/').to_string(),
            language: settings.language.clone(),
            http_client: Arc::new(reqwest::Client::new()),
        }
    }

    pub fn image_url(&self, path: &str, size: ImageSize) -> String {
        format!("{}/{}{}", self.image_base_url, size.token(), path)
    }

    fn optional_image_url(&self, path: Option<&str>, size: ImageSize) -> Option<String> {
        path.filter(|p| !p.is_empty())
            .map(|p| self.image_url(p, size))
    }

    // Upstream sometimes stores a full gravatar URL behind a stray leading `/`.
    fn avatar_url(&self, avatar_path: Option<&str>) -> Option<String> {
        let path = avatar_path.filter(|p| !p.is_empty())?;
        match path.get(1..) {
            Some(rest) if rest.starts_with("http") => Some(rest.to_string()),
            _ => Some(self.image_url(path, ImageSize::Avatar)),
        }
    }

    fn summary(&self, movie: TmdbMovieResult) -> MovieSummary {
        MovieSummary {
            id: movie.id,
            rating_display: format_rating(movie.vote_average),
            year: release_year(movie.release_date.as_deref()),
            poster_url: self.optional_image_url(movie.poster_path.as_deref(), ImageSize::Poster),
            backdrop_url: self
                .optional_image_url(movie.backdrop_path.as_deref(), ImageSize::Backdrop),
            title: movie.title,
        }
    }

    fn detail(&self, movie: TmdbMovieDetails, credits: &TmdbCreditsResponse) -> MovieDetail {
        let synopsis = movie
            .overview
            .filter(|o| !o.trim().is_empty())
            .unwrap_or_else(|| String::from(NO_SYNOPSIS));
        MovieDetail {
            duration_display: format_duration(movie.runtime),
            genres: movie.genres.into_iter().map(|g| g.name).collect(),
            director: find_director(&credits.crew),
            top_cast: top_cast(&credits.cast),
            synopsis,
            summary: MovieSummary {
                id: movie.id,
                rating_display: format_rating(movie.vote_average),
                year: release_year(movie.release_date.as_deref()),
                poster_url: self
                    .optional_image_url(movie.poster_path.as_deref(), ImageSize::Poster),
                backdrop_url: self
                    .optional_image_url(movie.backdrop_path.as_deref(), ImageSize::Backdrop),
                title: movie.title,
            },
        }
    }

    fn review(&self, review: TmdbReview) -> Review {
        Review {
            avatar_url: self.avatar_url(review.author_details.avatar_path.as_deref()),
            rating_out_of_10: review.author_details.rating,
            created_at: format_review_date(&review.created_at),
            id: review.id,
            author: review.author,
            content: review.content,
        }
    }

    async fn fetch_response(
        &self,
        operation: &'static str,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<reqwest::Response, ApiError> {
        let url = format!("{}{}", self.base_url, endpoint);
        tracing::debug!(operation, endpoint, ?params, "TMDB request");

        let response = self
            .http_client
            .get(&url)
            .query(&[("api_key", &self.api_key), ("language", &self.language)])
            .query(params)
            .send()
            .await
            .map_err(|e| ApiError::FetchFailure {
                operation,
                status: None,
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::FetchFailure {
                operation,
                status: Some(status.as_u16()),
                reason: format!("HTTP error: {}", status),
            });
        }
        Ok(response)
    }

    async fn fetch_json<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let body = self
            .fetch_response(operation, endpoint, params)
            .await?
            .text()
            .await
            .map_err(|e| ApiError::FetchFailure {
                operation,
                status: None,
                reason: e.to_string(),
            })?;
        serde_json::from_str(&body).map_err(|e| ApiError::Malformed {
            operation,
            reason: e.to_string(),
        })
    }
}

#[async_trait]
impl MetadataGateway for TmdbClient {
    #[instrument(skip_all, fields(page = query.page, category = %query.category))]
    async fn fetch_movies(&self, query: &Query) -> Result<Vec<MovieSummary>, ApiError> {
        let request = listing_request(query);
        let response: TmdbListResponse = self
            .fetch_json("fetch_movies", request.endpoint, &request.params)
            .await?;
        Ok(response
            .results
            .into_iter()
            .map(|movie| self.summary(movie))
            .collect())
    }

    #[instrument(skip_all)]
    async fn fetch_genres(&self) -> Result<Vec<Genre>, ApiError> {
        let response: GenreListResponse = self
            .fetch_json("fetch_genres", "/genre/movie/list", &[])
            .await?;
        Ok(response.genres)
    }

    #[instrument(skip(self))]
    async fn fetch_movie_detail(&self, id: MovieId) -> Result<MovieDetail, ApiError> {
        let detail_endpoint = format!("/movie/{}", id);
        let credits_endpoint = format!("/movie/{}/credits", id);
        let joined = tokio::try_join!(
            self.fetch_json::<TmdbMovieDetails>("fetch_movie_detail", &detail_endpoint, &[]),
            self.fetch_json::<TmdbCreditsResponse>("fetch_credits", &credits_endpoint, &[]),
        );
        let (movie, credits) = joined.map_err(|e| match e {
            ApiError::FetchFailure {
                status: Some(404), ..
            } => ApiError::NotFound { id },
            other => other,
        })?;
        Ok(self.detail(movie, &credits))
    }

    #[instrument(skip(self))]
    async fn fetch_trailer_key(&self, id: MovieId) -> Result<Option<String>, ApiError> {
        let response: VideosResponse = self
            .fetch_json("fetch_videos", &format!("/movie/{}/videos", id), &[])
            .await?;
        Ok(select_trailer(&response.results).map(|v| v.key.clone()))
    }

    #[instrument(skip(self))]
    async fn fetch_reviews(&self, id: MovieId, page: u32) -> Result<ReviewPage, ApiError> {
        let params = [("page", page.max(1).to_string())];
        let response: TmdbReviewsResponse = self
            .fetch_json("fetch_reviews", &format!("/movie/{}/reviews", id), &params)
            .await?;
        Ok(ReviewPage {
            page_index: response.page,
            total_pages: response.total_pages,
            total_count: response.total_results,
            reviews: response
                .results
                .into_iter()
                .map(|review| self.review(review))
                .collect(),
        })
    }
}

pub async fn load_initial_content(
    gateway: &dyn MetadataGateway,
) -> Result<(Vec<MovieSummary>, Vec<Genre>), ApiError> {
    let query = Query::default();
    tokio::try_join!(gateway.fetch_movies(&query), gateway.fetch_genres())
}
