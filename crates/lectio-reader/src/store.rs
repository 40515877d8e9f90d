//! External store boundaries.
//!
//! The remote annotation store is a keyed read/write surface with per-key
//! atomic puts and no transactions; the local preference store is plain
//! string KV. Both are collaborator interfaces: the core consumes them,
//! injected at construction, and ships in-memory implementations used by
//! tests and as an offline default.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use lectio_bridge::codec;
use lectio_bridge::types::{DisplayOptions, Font, FontSize, HighlightColor, Theme};
use serde::{Deserialize, Serialize};

use crate::annotations::{Comment, Day, DayComments, DayHighlights};
use crate::error::{Result, StoreError};

/// Remote, per-user annotation store.
///
/// Reads are best-effort: an absent value is `Ok(None)`, never an error.
#[async_trait]
pub trait AnnotationStore: Send + Sync {
    async fn read_highlights(&self, user: &str, day: &str) -> Result<Option<DayHighlights>>;
    async fn write_highlights(&self, user: &str, highlights: &DayHighlights) -> Result<()>;
    async fn read_comments(&self, user: &str, day: &str) -> Result<Option<DayComments>>;
    async fn write_comments(&self, user: &str, comments: &DayComments) -> Result<()>;
    async fn read_day(&self, lesson: &str, day: &str) -> Result<Option<Day>>;
}

/// Local string KV persistence for display preferences.
pub trait PreferenceStore: Send + Sync {
    fn get(&self, key: &str, default: &str) -> String;
    fn put(&self, key: &str, value: &str);
}

pub const PREF_THEME: &str = "reader.theme";
pub const PREF_FONT: &str = "reader.font";
pub const PREF_SIZE: &str = "reader.size";
pub const PREF_LAST_HIGHLIGHT_COLOR: &str = "reader.last_highlight_color";

/// Load display options, falling back to defaults for unknown stored tokens.
pub fn load_display_options(prefs: &dyn PreferenceStore) -> DisplayOptions {
    let defaults = DisplayOptions::default();
    DisplayOptions {
        theme: Theme::parse(&prefs.get(PREF_THEME, defaults.theme.as_str()))
            .unwrap_or(defaults.theme),
        font: Font::parse(&prefs.get(PREF_FONT, defaults.font.as_str())).unwrap_or(defaults.font),
        size: FontSize::parse(&prefs.get(PREF_SIZE, defaults.size.as_str()))
            .unwrap_or(defaults.size),
    }
}

pub fn save_display_options(prefs: &dyn PreferenceStore, options: DisplayOptions) {
    prefs.put(PREF_THEME, options.theme.as_str());
    prefs.put(PREF_FONT, options.font.as_str());
    prefs.put(PREF_SIZE, options.size.as_str());
}

pub fn load_last_highlight_color(prefs: &dyn PreferenceStore) -> HighlightColor {
    HighlightColor::parse(&prefs.get(PREF_LAST_HIGHLIGHT_COLOR, HighlightColor::Orange.as_str()))
        .unwrap_or(HighlightColor::Orange)
}

pub fn save_last_highlight_color(prefs: &dyn PreferenceStore, color: HighlightColor) {
    prefs.put(PREF_LAST_HIGHLIGHT_COLOR, color.as_str());
}

// Wire form of the store records. Comment text is base64-framed through the
// same codec the bridge uses, so the two representations cannot disagree.

#[derive(Debug, Serialize, Deserialize)]
struct HighlightsRecord {
    day: String,
    ranges: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct CommentsRecord {
    day: String,
    comments: Vec<CommentRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
struct CommentRecord {
    anchor: String,
    text: String,
}

fn encode_comments(comments: &DayComments) -> CommentsRecord {
    CommentsRecord {
        day: comments.day.clone(),
        comments: comments
            .comments
            .iter()
            .map(|comment| CommentRecord {
                anchor: comment.anchor_id.clone(),
                text: codec::encode_text(&comment.text),
            })
            .collect(),
    }
}

fn decode_comments(record: CommentsRecord) -> Result<DayComments> {
    let mut comments = Vec::with_capacity(record.comments.len());
    for comment in record.comments {
        let text = codec::decode_text(&comment.text).map_err(|err| StoreError::Read {
            key: format!("comments/{}", record.day),
            reason: err.to_string(),
        })?;
        comments.push(Comment {
            anchor_id: comment.anchor,
            text,
        });
    }
    Ok(DayComments {
        day: record.day,
        comments,
    })
}

/// In-memory annotation store. Counts writes so tests can assert the
/// write-through path issues exactly one put per renderer event.
#[derive(Default)]
pub struct MemoryAnnotationStore {
    records: Mutex<HashMap<String, String>>,
    days: Mutex<HashMap<String, Day>>,
    writes: AtomicUsize,
}

impl MemoryAnnotationStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_day(&self, lesson: &str, day: Day) {
        self.days
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(format!("{lesson}/{}", day.id), day);
    }

    #[must_use]
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn get_record(&self, key: &str) -> Option<String> {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(key)
            .cloned()
    }

    fn put_record(&self, key: String, value: String) {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(key, value);
    }

    fn highlights_key(user: &str, day: &str) -> String {
        format!("{user}/{day}#highlights")
    }

    fn comments_key(user: &str, day: &str) -> String {
        format!("{user}/{day}#comments")
    }
}

#[async_trait]
impl AnnotationStore for MemoryAnnotationStore {
    async fn read_highlights(&self, user: &str, day: &str) -> Result<Option<DayHighlights>> {
        let Some(raw) = self.get_record(&Self::highlights_key(user, day)) else {
            return Ok(None);
        };
        let record: HighlightsRecord = serde_json::from_str(&raw)?;
        Ok(Some(DayHighlights {
            day: record.day,
            serialized: record.ranges,
        }))
    }

    async fn write_highlights(&self, user: &str, highlights: &DayHighlights) -> Result<()> {
        let record = HighlightsRecord {
            day: highlights.day.clone(),
            ranges: highlights.serialized.clone(),
        };
        self.put_record(
            Self::highlights_key(user, &highlights.day),
            serde_json::to_string(&record)?,
        );
        Ok(())
    }

    async fn read_comments(&self, user: &str, day: &str) -> Result<Option<DayComments>> {
        let Some(raw) = self.get_record(&Self::comments_key(user, day)) else {
            return Ok(None);
        };
        let record: CommentsRecord = serde_json::from_str(&raw)?;
        decode_comments(record).map(Some)
    }

    async fn write_comments(&self, user: &str, comments: &DayComments) -> Result<()> {
        self.put_record(
            Self::comments_key(user, &comments.day),
            serde_json::to_string(&encode_comments(comments))?,
        );
        Ok(())
    }

    async fn read_day(&self, lesson: &str, day: &str) -> Result<Option<Day>> {
        Ok(self
            .days
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(&format!("{lesson}/{day}"))
            .cloned())
    }
}

/// In-memory preference KV.
#[derive(Default)]
pub struct MemoryPreferenceStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryPreferenceStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn get(&self, key: &str, default: &str) -> String {
        self.values
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(key)
            .cloned()
            .unwrap_or_else(|| default.to_string())
    }

    fn put(&self, key: &str, value: &str) {
        self.values
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(key.to_string(), value.to_string());
    }
}
