use serde::Deserialize;

pub const VIDEO_HOST: &str = "YouTube";

#[derive(Debug, Clone, Deserialize)]
pub struct TrailerVideo {
    pub key: String,
    pub site: String,
    #[serde(rename = "type")]
    pub video_type: String,
    #[serde(default)]
    pub official: bool,
}

impl TrailerVideo {
    fn is_playable_preview(&self) -> bool {
        self.site == VIDEO_HOST && matches!(self.video_type.as_str(), "Trailer" | "Teaser")
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct VideosResponse {
    #[serde(default)]
    pub results: Vec<TrailerVideo>,
}

pub fn select_trailer(videos: &[TrailerVideo]) -> Option<&TrailerVideo> {
    videos.iter().find(|v| v.is_playable_preview())
}

pub fn trailer_embed_url(key: &str) -> String {
    format!("https://www.youtube.com/embed/{}?autoplay=1", key)
}
