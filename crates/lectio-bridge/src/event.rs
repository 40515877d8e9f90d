//! Content → host events.
//!
//! The renderer invokes one named handler method per event, always with a
//! single string argument. Multi-field events concatenate two segments with
//! a single `,` (not in the base64 alphabet); the decoder splits on the
//! first separator only.

use crate::codec::{self, CodecError};

/// Wire method names for every content → host event.
pub const EVENT_METHODS: &[&str] = &[
    "highlightsChanged",
    "verseClicked",
    "commentEdited",
    "highlightTapped",
    "textCopied",
    "textSearched",
    "textShared",
    "editableFieldFocused",
    "editableFieldBlurred",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// The renderer re-serialized its highlight ranges after an add/remove.
    /// The payload replaces the day's highlights value wholesale.
    HighlightsChanged { serialized: String },
    /// A verse reference was tapped; payload is base64 verse text.
    VerseClicked { verse: String },
    /// A comment was created or edited. Payload: `base64(text),base64(anchorId)`.
    CommentEdited { text: String, anchor_id: String },
    /// An existing highlight was tapped; ids are day-scoped and > 0.
    HighlightTapped { highlight_id: u64 },
    TextCopied { text: String },
    TextSearched { text: String },
    TextShared { text: String },
    EditableFieldFocused,
    EditableFieldBlurred,
}

impl Event {
    #[must_use]
    pub fn method(&self) -> &'static str {
        match self {
            Self::HighlightsChanged { .. } => "highlightsChanged",
            Self::VerseClicked { .. } => "verseClicked",
            Self::CommentEdited { .. } => "commentEdited",
            Self::HighlightTapped { .. } => "highlightTapped",
            Self::TextCopied { .. } => "textCopied",
            Self::TextSearched { .. } => "textSearched",
            Self::TextShared { .. } => "textShared",
            Self::EditableFieldFocused => "editableFieldFocused",
            Self::EditableFieldBlurred => "editableFieldBlurred",
        }
    }

    /// Decode one handler callback into a typed event.
    pub fn parse(method: &str, payload: &str) -> Result<Self, CodecError> {
        match method {
            "highlightsChanged" => Ok(Self::HighlightsChanged {
                serialized: payload.to_string(),
            }),
            "verseClicked" => Ok(Self::VerseClicked {
                verse: codec::decode_text(payload)?,
            }),
            "commentEdited" => {
                let (text, anchor_id) = codec::split_event_pair(payload)?;
                Ok(Self::CommentEdited { text, anchor_id })
            }
            "highlightTapped" => Ok(Self::HighlightTapped {
                highlight_id: codec::decode_number(payload)?,
            }),
            "textCopied" => Ok(Self::TextCopied {
                text: codec::decode_text(payload)?,
            }),
            "textSearched" => Ok(Self::TextSearched {
                text: codec::decode_text(payload)?,
            }),
            "textShared" => Ok(Self::TextShared {
                text: codec::decode_text(payload)?,
            }),
            "editableFieldFocused" => Ok(Self::EditableFieldFocused),
            "editableFieldBlurred" => Ok(Self::EditableFieldBlurred),
            other => Err(CodecError::UnknownMethod(other.to_string())),
        }
    }
}
