//! Host → content commands.
//!
//! A command serializes to a single-line script invocation on the named
//! bridge object inside the content surface. String arguments are
//! single-quoted; anything that can carry quotes, newlines or non-ASCII
//! bytes is base64-framed first, so the invocation line never needs
//! escaping. Enum and numeric arguments are bare tokens.

use crate::codec;
use crate::types::{Font, FontSize, HighlightColor, Theme};

/// Name of the object the renderer exposes to the host for invocations.
pub const BRIDGE_OBJECT: &str = "lectioReader";

/// Wire method names for every host → content command.
pub const COMMAND_METHODS: &[&str] = &[
    "setTheme",
    "setFont",
    "setFontSize",
    "setHighlights",
    "setComment",
    "highlightSelection",
    "unhighlightSelection",
    "removeHighlight",
    "copySelection",
    "shareSelection",
    "searchSelection",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    SetTheme(Theme),
    SetFont(Font),
    SetFontSize(FontSize),
    /// Push the full highlights snapshot for the pane's day. The serialized
    /// ranges blob is opaque to the host and base64-framed on the wire.
    SetHighlights { serialized: String },
    /// Attach (or replace) the comment at `anchor_id`.
    SetComment { anchor_id: String, text: String },
    /// Paint the current native selection in the given color.
    HighlightSelection(HighlightColor),
    /// Clear highlighting from the current selection.
    UnhighlightSelection,
    /// Remove an existing highlight by its renderer-assigned id.
    RemoveHighlight { highlight_id: u64 },
    CopySelection,
    ShareSelection,
    SearchSelection,
}

impl Command {
    #[must_use]
    pub fn method(&self) -> &'static str {
        match self {
            Self::SetTheme(_) => "setTheme",
            Self::SetFont(_) => "setFont",
            Self::SetFontSize(_) => "setFontSize",
            Self::SetHighlights { .. } => "setHighlights",
            Self::SetComment { .. } => "setComment",
            Self::HighlightSelection(_) => "highlightSelection",
            Self::UnhighlightSelection => "unhighlightSelection",
            Self::RemoveHighlight { .. } => "removeHighlight",
            Self::CopySelection => "copySelection",
            Self::ShareSelection => "shareSelection",
            Self::SearchSelection => "searchSelection",
        }
    }

    /// Render the single-line invocation string injected into the surface.
    #[must_use]
    pub fn to_invocation(&self) -> String {
        match self {
            Self::SetTheme(theme) => invoke1(self.method(), quoted(theme.as_str())),
            Self::SetFont(font) => invoke1(self.method(), quoted(font.as_str())),
            Self::SetFontSize(size) => invoke1(self.method(), quoted(size.as_str())),
            Self::SetHighlights { serialized } => {
                invoke1(self.method(), quoted(&codec::encode_text(serialized)))
            }
            Self::SetComment { anchor_id, text } => format!(
                "{BRIDGE_OBJECT}.{}({}, {});",
                self.method(),
                quoted(&codec::encode_text(text)),
                quoted(anchor_id),
            ),
            Self::HighlightSelection(color) => invoke1(self.method(), quoted(color.as_str())),
            Self::RemoveHighlight { highlight_id } => {
                invoke1(self.method(), highlight_id.to_string())
            }
            Self::UnhighlightSelection | Self::CopySelection | Self::ShareSelection
            | Self::SearchSelection => invoke0(self.method()),
        }
    }
}

fn invoke0(method: &str) -> String {
    format!("{BRIDGE_OBJECT}.{method}();")
}

fn invoke1(method: &str, arg: String) -> String {
    format!("{BRIDGE_OBJECT}.{method}({arg});")
}

fn quoted(arg: &str) -> String {
    format!("'{arg}'")
}

#[cfg(test)]
mod tests {
    use super::{BRIDGE_OBJECT, COMMAND_METHODS, Command};
    use crate::codec;
    use crate::types::{FontSize, HighlightColor, Theme};
    use std::collections::BTreeSet;

    #[test]
    fn command_methods_are_unique_and_cover_every_variant() {
        let unique: BTreeSet<&str> = COMMAND_METHODS.iter().copied().collect();
        assert_eq!(unique.len(), COMMAND_METHODS.len());

        let commands = [
            Command::SetTheme(Theme::Dark),
            Command::SetFont(crate::types::Font::Lato),
            Command::SetFontSize(FontSize::Large),
            Command::SetHighlights {
                serialized: String::new(),
            },
            Command::SetComment {
                anchor_id: "a1".to_string(),
                text: String::new(),
            },
            Command::HighlightSelection(HighlightColor::Yellow),
            Command::UnhighlightSelection,
            Command::RemoveHighlight { highlight_id: 1 },
            Command::CopySelection,
            Command::ShareSelection,
            Command::SearchSelection,
        ];
        for command in &commands {
            assert!(unique.contains(command.method()), "{}", command.method());
        }
        assert_eq!(commands.len(), COMMAND_METHODS.len());
    }

    #[test]
    fn enum_tokens_ride_the_wire_bare() {
        let script = Command::SetTheme(Theme::Sepia).to_invocation();
        assert_eq!(script, format!("{BRIDGE_OBJECT}.setTheme('sepia');"));
    }

    #[test]
    fn invocations_are_single_line_even_for_hostile_text() {
        let command = Command::SetComment {
            anchor_id: "verse-3".to_string(),
            text: "line one\nline 'two' with \"quotes\"".to_string(),
        };
        let script = command.to_invocation();
        assert!(!script.contains('\n'));
        assert!(script.starts_with(&format!("{BRIDGE_OBJECT}.setComment(")));
        assert!(script.ends_with(", 'verse-3');"));
    }

    #[test]
    fn comment_text_is_base64_framed() {
        let command = Command::SetComment {
            anchor_id: "a1".to_string(),
            text: "note".to_string(),
        };
        let script = command.to_invocation();
        assert!(script.contains(&codec::encode_text("note")));
        assert!(!script.contains("(note"));
    }

    #[test]
    fn highlight_ids_are_bare_numeric_tokens() {
        let script = Command::RemoveHighlight { highlight_id: 12 }.to_invocation();
        assert_eq!(script, format!("{BRIDGE_OBJECT}.removeHighlight(12);"));
    }
}
