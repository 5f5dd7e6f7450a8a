use crate::video::VideoItem;

/// Which video the viewer picked, and whether focus mode is on. Lives for one
/// request: the web layer rebuilds it from the query string each time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    video_id: Option<String>,
    focus: bool,
}

impl Selection {
    pub fn new(video_id: Option<String>, focus: bool) -> Selection {
        Selection {
            video_id: video_id.filter(|id| !id.trim().is_empty()),
            focus,
        }
    }

    pub fn select(&mut self, video_id: &str) {
        if video_id.trim().is_empty() {
            self.video_id = None;
        } else {
            self.video_id = Some(video_id.into());
        }
    }

    pub fn clear(&mut self) {
        self.video_id = None;
    }

    /// Leaving the focused player drops the selection, the toggle stays as is
    pub fn exit_focus(&mut self) {
        self.clear();
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.video_id.as_deref()
    }

    pub fn is_focus(&self) -> bool {
        self.focus
    }

    pub fn is_selected(&self, video_id: &str) -> bool {
        self.selected_id() == Some(video_id)
    }

    /// Clear the selection if the selected video isn't among `items`
    pub fn retain_visible(&mut self, items: &[VideoItem]) {
        let missing = match self.selected_id() {
            Some(id) => !items.iter().any(|v| v.video_id == id),
            None => false,
        };
        if missing {
            self.clear();
        }
    }

    /// The video to show full size, if focus mode is on and the selection is
    /// playable
    pub fn focused<'a>(&self, items: &'a [VideoItem]) -> Option<&'a VideoItem> {
        if !self.focus {
            return None;
        }
        let id = self.selected_id()?;
        items
            .iter()
            .find(|v| v.video_id == id)
            .filter(|v| v.embed_url.is_some())
    }
}
