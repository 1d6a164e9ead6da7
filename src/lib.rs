pub mod controller;
pub mod debounce;
pub mod detail;
pub mod media;
pub mod settings;
pub mod tmdb;
pub mod video;

pub use controller::{ListingPhase, ListingSnapshot, QueryController};
pub use detail::{DetailController, DetailState, DetailView};
pub use media::{
    ApiError, Category, FilterEdit, Genre, MovieDetail, MovieId, MovieSummary, Query, Review,
    ReviewPage, Year,
};
pub use settings::{AppSettings, SettingsError};
pub use tmdb::{load_initial_content, MetadataGateway, TmdbClient};
