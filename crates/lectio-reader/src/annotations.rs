//! Per-day annotation state: highlight ranges and inline comments.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One reading day. Immutable once fetched; panes read it, never edit it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Day {
    pub id: String,
    pub date: NaiveDate,
    pub title: String,
    pub content: String,
    /// Ordinal position within the lesson.
    pub index: usize,
}

impl Day {
    /// Whether this day's date range covers the given date. A daily reading
    /// covers exactly its display date.
    #[must_use]
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.date == date
    }
}

/// Highlighted ranges for one day.
///
/// The ranges themselves are an opaque blob serialized by the renderer;
/// per-range colors and the day-scoped numeric highlight ids live inside it.
/// The host only relays the blob, and every change replaces it wholesale
/// (stated last-write-wins limitation).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayHighlights {
    pub day: String,
    pub serialized: String,
}

impl DayHighlights {
    #[must_use]
    pub fn empty(day: &str) -> Self {
        Self {
            day: day.to_string(),
            serialized: String::new(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.serialized.is_empty()
    }
}

/// One inline comment, attached to a stable content location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub anchor_id: String,
    pub text: String,
}

/// The comment set for one day, unique by anchor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayComments {
    pub day: String,
    pub comments: Vec<Comment>,
}

impl DayComments {
    #[must_use]
    pub fn empty(day: &str) -> Self {
        Self {
            day: day.to_string(),
            comments: Vec::new(),
        }
    }

    /// Last-write-wins per anchor: a second comment on the same anchor
    /// replaces the first. Empty text deletes the comment at that anchor.
    pub fn upsert(&mut self, anchor_id: &str, text: &str) {
        if text.is_empty() {
            self.comments.retain(|comment| comment.anchor_id != anchor_id);
            return;
        }
        if let Some(existing) = self
            .comments
            .iter_mut()
            .find(|comment| comment.anchor_id == anchor_id)
        {
            existing.text = text.to_string();
            return;
        }
        self.comments.push(Comment {
            anchor_id: anchor_id.to_string(),
            text: text.to_string(),
        });
    }

    #[must_use]
    pub fn get(&self, anchor_id: &str) -> Option<&Comment> {
        self.comments
            .iter()
            .find(|comment| comment.anchor_id == anchor_id)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.comments.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::{Day, DayComments, DayHighlights};
    use chrono::NaiveDate;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn day_covers_exactly_its_date() {
        let day = Day {
            id: "2024-01-03".to_string(),
            date: date("2024-01-03"),
            title: "Day three".to_string(),
            content: String::new(),
            index: 2,
        };
        assert!(day.covers(date("2024-01-03")));
        assert!(!day.covers(date("2024-01-04")));
    }

    #[test]
    fn upsert_replaces_by_anchor_and_appends_for_new_anchors() {
        let mut comments = DayComments::empty("2024-01-03");
        comments.upsert("a1", "x");
        comments.upsert("a1", "y");
        assert_eq!(comments.comments.len(), 1);
        assert_eq!(comments.get("a1").unwrap().text, "y");

        comments.upsert("a2", "y");
        assert_eq!(comments.comments.len(), 2);
        assert_eq!(comments.get("a1").unwrap().text, "y");
        assert_eq!(comments.get("a2").unwrap().text, "y");
    }

    #[test]
    fn upsert_with_empty_text_deletes_the_anchor() {
        let mut comments = DayComments::empty("2024-01-03");
        comments.upsert("a1", "note");
        comments.upsert("a1", "");
        assert!(comments.is_empty());
    }

    #[test]
    fn empty_highlights_carry_their_day_key() {
        let highlights = DayHighlights::empty("2024-01-05");
        assert!(highlights.is_empty());
        assert_eq!(highlights.day, "2024-01-05");
    }
}
