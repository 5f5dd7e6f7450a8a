//! Turns raw downloader records into a sorted list of [`VideoItem`]s, and
//! filters such lists by a search query.
//!
//! Nothing in here fails: records which can't be used are dropped and fields
//! which can't be parsed are left empty.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use log::debug;

use crate::source::base::RawRecord;
use crate::video::VideoItem;

/// Titles the site substitutes for videos which can no longer be watched
const UNAVAILABLE_TITLES: &[&str] = &["[deleted video]", "[private video]"];

/// `availability` tags for videos which can't be played without extra access
const UNAVAILABLE_TAGS: &[&str] = &["private", "needs_auth", "unavailable"];

fn folded(value: Option<&str>) -> String {
    value.unwrap_or("").trim().to_lowercase()
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// True if the record is a placeholder for a deleted, private or restricted video
pub fn is_unavailable(rec: &RawRecord) -> bool {
    let title = folded(rec.title.as_deref());
    if UNAVAILABLE_TITLES.contains(&title.as_str()) {
        return true;
    }
    let availability = folded(rec.availability.as_deref());
    UNAVAILABLE_TAGS.contains(&availability.as_str())
}

/// Strict `YYYYMMDD`, as used by `upload_date`
fn parse_yyyymmdd(value: &str) -> Option<NaiveDateTime> {
    if value.len() != 8 || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    NaiveDate::parse_from_str(value, "%Y%m%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Fallback for dates written in one of the common ISO-ish forms. Offsets are
/// converted to UTC.
fn parse_flexible(value: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_utc());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(value) {
        return Some(dt.naive_utc());
    }
    for fmt in &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(dt);
        }
    }
    for fmt in &["%Y-%m-%d", "%Y/%m/%d"] {
        if let Ok(d) = NaiveDate::parse_from_str(value, fmt) {
            return d.and_hms_opt(0, 0, 0);
        }
    }
    None
}

/// Publish date of a record, or `None` if missing or unparseable
pub fn parse_published(value: Option<&str>) -> Option<NaiveDateTime> {
    let value = value?.trim();
    if value.is_empty() {
        return None;
    }
    parse_yyyymmdd(value).or_else(|| parse_flexible(value))
}

fn best_thumbnail(rec: &RawRecord) -> Option<String> {
    if let Some(t) = non_empty(&rec.thumbnail) {
        return Some(t.into());
    }
    // Last entry is the highest resolution
    rec.thumbnails
        .as_ref()
        .and_then(|thumbs| thumbs.last())
        .and_then(|t| t.url.clone())
}

/// Convert a single record, or `None` if it should not be shown
fn normalize_one(rec: &RawRecord) -> Option<VideoItem> {
    if is_unavailable(rec) {
        return None;
    }
    let video_id = rec.id.as_deref().filter(|id| !id.trim().is_empty())?;

    Some(VideoItem {
        title: rec.title.clone(),
        channel_name: non_empty(&rec.uploader)
            .or_else(|| non_empty(&rec.channel))
            .map(String::from),
        published: parse_published(rec.upload_date.as_deref()),
        thumbnail: best_thumbnail(rec),
        duration: rec.duration_secs(),
        ..VideoItem::new(video_id)
    })
}

/// Normalize records in input order, dropping unavailable and ID-less
/// entries, then sort newest first
pub fn normalize<'a, I>(records: I) -> Vec<VideoItem>
where
    I: IntoIterator<Item = &'a RawRecord>,
{
    let mut total = 0;
    let items: Vec<VideoItem> = records
        .into_iter()
        .inspect(|_| total += 1)
        .filter_map(normalize_one)
        .collect();
    debug!(
        "Normalized {} records, kept {} dropped {}",
        total,
        items.len(),
        total - items.len()
    );
    sort_items(items)
}

/// Stable sort newest first. Items without a publish date go last, keeping
/// their relative order.
pub fn sort_items(mut items: Vec<VideoItem>) -> Vec<VideoItem> {
    // `None` orders before any `Some`, so descending puts undated items last
    items.sort_by(|a, b| b.published.cmp(&a.published));
    items
}

/// Items whose title or channel name contains `query`, ignoring case. An
/// empty query returns `items` as-is.
pub fn filter_items(items: Vec<VideoItem>, query: &str) -> Vec<VideoItem> {
    if query.is_empty() {
        return items;
    }
    let needle = query.to_lowercase();
    items
        .into_iter()
        .filter(|v| {
            v.title_str().to_lowercase().contains(&needle)
                || v.channel_name_str().to_lowercase().contains(&needle)
        })
        .collect()
}
