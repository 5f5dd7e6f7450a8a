use chrono::NaiveDateTime;
use serde_derive::Serialize;

/// Normalized info about a video, ready for display
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VideoItem {
    pub video_id: String,
    pub title: Option<String>,
    pub channel_name: Option<String>,
    pub published: Option<NaiveDateTime>,
    pub thumbnail: Option<String>,
    /// Seconds
    pub duration: Option<u64>,
    /// Watch page
    pub url: Option<String>,
    /// Player suitable for an iframe
    pub embed_url: Option<String>,
}

fn usable_id(video_id: Option<&str>) -> Option<&str> {
    video_id.filter(|id| !id.trim().is_empty())
}

/// Inline player URL with related videos and branding suppressed
pub fn embed_url(video_id: Option<&str>) -> Option<String> {
    usable_id(video_id).map(|id| {
        format!(
            "https://www.youtube.com/embed/{}?rel=0&modestbranding=1&playsinline=1",
            id
        )
    })
}

pub fn watch_url(video_id: Option<&str>) -> Option<String> {
    usable_id(video_id).map(|id| format!("https://www.youtube.com/watch?v={}", id))
}

impl VideoItem {
    /// Item with only the ID and derived URLs populated
    pub fn new(video_id: &str) -> VideoItem {
        VideoItem {
            video_id: video_id.into(),
            title: None,
            channel_name: None,
            published: None,
            thumbnail: None,
            duration: None,
            url: watch_url(Some(video_id)),
            embed_url: embed_url(Some(video_id)),
        }
    }

    pub fn title_str(&self) -> &str {
        self.title.as_deref().unwrap_or("")
    }

    pub fn channel_name_str(&self) -> &str {
        self.channel_name.as_deref().unwrap_or("")
    }

    /// `M:SS`, or `H:MM:SS` for anything an hour or longer
    pub fn duration_str(&self) -> Option<String> {
        self.duration.map(|d| {
            let (h, m, s) = (d / 3600, (d % 3600) / 60, d % 60);
            if h > 0 {
                format!("{}:{:02}:{:02}", h, m, s)
            } else {
                format!("{}:{:02}", m, s)
            }
        })
    }

    pub fn published_str(&self) -> Option<String> {
        self.published.map(|p| p.format("%Y-%m-%d").to_string())
    }
}
