use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use movix_discover::video::trailer_embed_url;
use movix_discover::{
    load_initial_content, AppSettings, DetailController, DetailState, MetadataGateway, MovieId,
    QueryController, TmdbClient,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "movix_discover=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = AppSettings::resolve().context("failed to load TMDB settings")?;
    let gateway: Arc<dyn MetadataGateway> = Arc::new(TmdbClient::from_settings(&settings));

    let (movies, genres) = load_initial_content(gateway.as_ref())
        .await
        .context("failed to load initial content")?;
    tracing::info!(
        movies = movies.len(),
        genres = genres.len(),
        "initial content loaded"
    );

    let mut args = std::env::args().skip(1);
    let argument = args.next();
    if argument.as_deref() == Some("--id") {
        let movie_id = args
            .next()
            .context("--id needs a movie id")?
            .parse::<MovieId>()
            .context("movie id must be a number")?;
        return show_detail(gateway, movie_id).await;
    }

    let controller = QueryController::new(gateway);
    controller.seed(movies);

    if let Some(search) = argument {
        let mut updates = controller.subscribe();
        controller.set_search_text(search);
        updates
            .wait_for(|snapshot| snapshot.is_settled())
            .await
            .context("listing controller shut down")?;
    }

    for movie in controller.snapshot().movies {
        tracing::info!(
            id = movie.id,
            rating = %movie.rating_display,
            year = %movie.year,
            "{}",
            movie.title
        );
    }
    Ok(())
}

async fn show_detail(gateway: Arc<dyn MetadataGateway>, movie_id: MovieId) -> anyhow::Result<()> {
    let mut detail = DetailController::new(gateway, movie_id);
    let view = match detail.load().await {
        DetailState::Ready(view) => view.clone(),
        DetailState::Failed { error } => {
            return Err(error.clone()).context("failed to load movie detail");
        }
        DetailState::Loading => return Ok(()),
    };

    let movie = &view.detail;
    tracing::info!(
        title = %movie.summary.title,
        year = %movie.summary.year,
        rating = %movie.summary.rating_display,
        duration = %movie.duration_display,
        director = %movie.director,
        cast = ?movie.top_cast,
        genres = ?movie.genres,
        "{}",
        movie.synopsis
    );
    if let Some(key) = &view.trailer_key {
        tracing::info!(url = %trailer_embed_url(key), "trailer");
    }
    for review in &view.review_page.reviews {
        tracing::info!(
            author = %review.author,
            rating = ?review.rating_out_of_10,
            date = %review.created_at,
            "{}",
            review.preview(movix_discover::media::REVIEW_PREVIEW_CHARS).0
        );
    }
    Ok(())
}
