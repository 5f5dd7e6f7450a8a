/// What kind of listing an identifier refers to
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SourceKind {
    Channel,
    Playlist,
    Handle,
    Url,
}

impl SourceKind {
    pub fn as_str(&self) -> &str {
        match self {
            SourceKind::Channel => "channel",
            SourceKind::Playlist => "playlist",
            SourceKind::Handle => "handle",
            SourceKind::Url => "url",
        }
    }
}

/// Identifier for a channel or playlist, as written in the config
#[derive(Debug, Clone, PartialEq)]
pub struct SourceID {
    pub id: String,
    pub kind: SourceKind,
}

impl SourceID {
    /// Work out what `id` refers to. Identifiers starting with any of
    /// `playlist_prefixes` are playlists, everything else without a more
    /// specific shape is a channel ID.
    pub fn classify<S: AsRef<str>>(id: &str, playlist_prefixes: &[S]) -> SourceID {
        let id = id.trim();
        let kind = if id.starts_with("http://") || id.starts_with("https://") {
            SourceKind::Url
        } else if id.starts_with('@') {
            SourceKind::Handle
        } else if playlist_prefixes
            .iter()
            .any(|p| !p.as_ref().is_empty() && id.starts_with(p.as_ref()))
        {
            SourceKind::Playlist
        } else {
            SourceKind::Channel
        };
        SourceID {
            id: id.into(),
            kind,
        }
    }

    pub fn id_str(&self) -> &str {
        &self.id
    }

    /// URL handed to the downloader
    pub fn url(&self) -> String {
        match self.kind {
            SourceKind::Url => self.id.clone(),
            SourceKind::Handle => format!("https://www.youtube.com/{}/videos", self.id),
            SourceKind::Playlist => format!("https://www.youtube.com/playlist?list={}", self.id),
            SourceKind::Channel => format!("https://www.youtube.com/channel/{}", self.id),
        }
    }
}
