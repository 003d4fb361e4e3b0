use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::feed::RawMediaRecord;

static HASHTAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"#([^\s]+)").expect("valid hashtag regex"));

// Any of these after the leading '#' disqualifies the candidate.
const TAG_REJECT: &[char] = &[
    '~', '`', '!', '@', '#', '$', '%', '^', '&', '*', '(', ')', '-', '+', '=', '{', '}', '[', ']',
    ':', ';', '"', '\'', '<', '>', '?', ',', '.', '/', '|', '\\',
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
    Album,
}

impl MediaKind {
    pub fn from_media_type(media_type: &str) -> Option<Self> {
        match media_type {
            "IMAGE" => Some(MediaKind::Image),
            "VIDEO" => Some(MediaKind::Video),
            "CAROUSEL_ALBUM" => Some(MediaKind::Album),
            _ => None,
        }
    }
}

/// Render-ready view of one media record. Recomputed on every pass, never cached.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedItem {
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<MediaKind>,
    pub image: Option<String>,
    pub link: Option<String>,
    pub caption: Option<String>,
    pub tags: Vec<String>,
    pub timestamp: Option<String>,
    pub username: Option<String>,
    pub raw: RawMediaRecord,
}

impl NormalizedItem {
    /// Items without a recognized type have no image to show and should be skipped.
    pub fn is_renderable(&self) -> bool {
        self.kind.is_some() && self.image.is_some()
    }
}

pub fn normalize(record: &RawMediaRecord) -> NormalizedItem {
    let kind = record.media_type.as_deref().and_then(MediaKind::from_media_type);
    let image = match kind {
        Some(MediaKind::Image) | Some(MediaKind::Album) => record.media_url.clone(),
        Some(MediaKind::Video) => record.thumbnail_url.clone(),
        None => None,
    };

    NormalizedItem {
        id: record.id.clone(),
        kind,
        image,
        link: record.permalink.clone(),
        caption: record.caption.clone(),
        tags: extract_tags(record.caption.as_deref()),
        timestamp: record.timestamp.clone(),
        username: record.username.clone(),
        raw: record.clone(),
    }
}

/// Hashtags in caption order. Duplicates are kept.
pub fn extract_tags(caption: Option<&str>) -> Vec<String> {
    let Some(text) = caption else {
        return Vec::new();
    };
    HASHTAG
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .filter(|tag| !tag.contains(TAG_REJECT))
        .map(str::to_owned)
        .collect()
}
