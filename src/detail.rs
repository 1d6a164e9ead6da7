use std::sync::Arc;

use crate::media::{ApiError, MovieDetail, MovieId, ReviewPage};
use crate::tmdb::MetadataGateway;

#[derive(Debug, Clone, PartialEq)]
pub struct DetailView {
    pub detail: MovieDetail,
    pub trailer_key: Option<String>,
    pub review_page: ReviewPage,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DetailState {
    Loading,
    Ready(DetailView),
    Failed { error: ApiError },
}

pub struct DetailController {
    gateway: Arc<dyn MetadataGateway>,
    movie_id: MovieId,
    state: DetailState,
}

impl std::fmt::Debug for DetailController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DetailController")
            .field("movie_id", &self.movie_id)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl DetailController {
    pub fn new(gateway: Arc<dyn MetadataGateway>, movie_id: MovieId) -> Self {
        Self {
            gateway,
            movie_id,
            state: DetailState::Loading,
        }
    }

    pub fn movie_id(&self) -> MovieId {
        self.movie_id
    }

    pub fn state(&self) -> &DetailState {
        &self.state
    }

    pub async fn load(&mut self) -> &DetailState {
        self.state = DetailState::Loading;
        let id = self.movie_id;
        let (detail, trailer, reviews) = tokio::join!(
            self.gateway.fetch_movie_detail(id),
            self.gateway.fetch_trailer_key(id),
            self.gateway.fetch_reviews(id, 1),
        );

        let trailer_key = trailer.unwrap_or_else(|e| {
            tracing::warn!(movie_id = id, error = %e, "trailer lookup failed, hiding trailer");
            None
        });

        let loaded = detail.and_then(|detail| reviews.map(|page| (detail, page)));
        self.state = match loaded {
            Ok((detail, review_page)) => DetailState::Ready(DetailView {
                detail,
                trailer_key,
                review_page,
            }),
            Err(error) => {
                tracing::error!(movie_id = id, error = %error, "failed to load movie detail");
                DetailState::Failed { error }
            }
        };
        &self.state
    }

    pub async fn retry(&mut self) -> &DetailState {
        self.load().await
    }

    /// Appends the next review page. Returns `Ok(false)` when there is nothing
    /// more to load or the detail is not loaded.
    pub async fn load_more_reviews(&mut self) -> Result<bool, ApiError> {
        let next_page = match &self.state {
            DetailState::Ready(view) if view.review_page.has_more() => {
                view.review_page.page_index + 1
            }
            _ => return Ok(false),
        };

        let page = self
            .gateway
            .fetch_reviews(self.movie_id, next_page)
            .await
            .map_err(|e| {
                tracing::warn!(
                    movie_id = self.movie_id,
                    page = next_page,
                    error = %e,
                    "failed to load more reviews"
                );
                e
            })?;

        if let DetailState::Ready(view) = &mut self.state {
            let current = &mut view.review_page;
            current.reviews.extend(page.reviews);
            current.page_index = page.page_index.max(next_page);
            current.total_pages = page.total_pages;
            current.total_count = page.total_count;
        }
        Ok(true)
    }
}
