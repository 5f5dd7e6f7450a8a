use serde::de::{DeserializeOwned, Deserializer};
use serde::Deserialize;
use thiserror::Error;

use crate::common::SourceID;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Failed to run {program:?}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read downloader output")]
    Io(#[from] std::io::Error),
}

/// Deserialize a field, treating a value of the wrong type as absent instead
/// of rejecting the whole record
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// Per-video metadata as emitted by the downloader. Only the fields used for
/// normalization are kept, everything else is ignored.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct RawRecord {
    #[serde(default, deserialize_with = "lenient")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub uploader: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub channel: Option<String>,
    /// Usually `YYYYMMDD`
    #[serde(default, deserialize_with = "lenient")]
    pub upload_date: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub thumbnail: Option<String>,
    /// Ordered lowest to highest resolution
    #[serde(default, deserialize_with = "lenient")]
    pub thumbnails: Option<Vec<RawThumbnail>>,
    /// Seconds, sometimes fractional
    #[serde(default, deserialize_with = "lenient")]
    pub duration: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub availability: Option<String>,
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct RawThumbnail {
    #[serde(default, deserialize_with = "lenient")]
    pub url: Option<String>,
}

impl RawRecord {
    /// Parse one line of `--dump-json` output. Anything other than a JSON
    /// object gives `None`.
    pub fn from_json_line(line: &str) -> Option<RawRecord> {
        let value: serde_json::Value = serde_json::from_str(line).ok()?;
        if !value.is_object() {
            return None;
        }
        serde_json::from_value(value).ok()
    }

    /// Duration as whole seconds
    pub fn duration_secs(&self) -> Option<u64> {
        self.duration
            .filter(|d| d.is_finite() && *d >= 0.0)
            .map(|d| d.trunc() as u64)
    }
}

/// Something that can list the videos belonging to a channel or playlist
pub trait VideoSource: Send + Sync {
    /// Raw records in the order the source lists them (usually newest first)
    fn fetch(&self, id: &SourceID) -> Result<Vec<RawRecord>, FetchError>;
}
