//! One instantiated content pane, bound to one reading day.
//!
//! The pane owns its bridge channel, the day's local annotation state and a
//! selection tracker. Commands issued before the surface signals
//! content-ready are buffered in FIFO order; the renderer silently drops
//! anything injected earlier, so the buffer is what turns fire-and-forget
//! sends into reliable delivery.

use std::collections::VecDeque;
use std::sync::Arc;

use lectio_bridge::channel::{BridgeChannel, ScriptSurface};
use lectio_bridge::command::Command;
use lectio_bridge::event::Event;
use lectio_bridge::types::{DisplayOptions, HighlightColor};
use tokio::sync::mpsc;

use crate::annotations::{Day, DayComments, DayHighlights};
use crate::selection::{MenuChange, Point, SelectionTracker, Size};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaneState {
    Unloaded,
    Loading,
    Ready,
}

/// Host-side work a renderer event asks for. The pane applies the local
/// edit optimistically and hands the write/navigation up; it never touches
/// the store or the navigation chrome itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaneEffect {
    WriteHighlights(DayHighlights),
    WriteComments(DayComments),
    OpenVerse { day: String, verse: String },
    ClipboardCopy(String),
    ShareText(String),
    SearchText(String),
    /// An existing highlight wants its menu re-opened (bound for removal).
    HighlightMenu { highlight_id: u64 },
    HideMenu,
}

pub struct ContentPane {
    day: Day,
    state: PaneState,
    bridge: BridgeChannel,
    options: DisplayOptions,
    highlights: DayHighlights,
    comments: DayComments,
    selection: SelectionTracker,
    pending: VecDeque<Command>,
}

impl ContentPane {
    pub fn new(
        day: Day,
        highlights: DayHighlights,
        comments: DayComments,
        options: DisplayOptions,
        surface: Arc<dyn ScriptSurface>,
    ) -> (Self, mpsc::UnboundedReceiver<Event>) {
        let (bridge, events) = BridgeChannel::new(surface);
        (
            Self {
                day,
                state: PaneState::Unloaded,
                bridge,
                options,
                highlights,
                comments,
                selection: SelectionTracker::new(),
                pending: VecDeque::new(),
            },
            events,
        )
    }

    #[must_use]
    pub fn day(&self) -> &Day {
        &self.day
    }

    #[must_use]
    pub fn state(&self) -> PaneState {
        self.state
    }

    #[must_use]
    pub fn highlights(&self) -> &DayHighlights {
        &self.highlights
    }

    #[must_use]
    pub fn comments(&self) -> &DayComments {
        &self.comments
    }

    #[must_use]
    pub fn bridge(&self) -> &BridgeChannel {
        &self.bridge
    }

    pub fn begin_load(&mut self) {
        if self.state == PaneState::Unloaded {
            self.state = PaneState::Loading;
        }
    }

    /// The renderer signaled page-load completion.
    ///
    /// Sends, in order: theme, font, size, the highlights snapshot, one
    /// `setComment` per existing comment, then the backlog buffered while
    /// loading. Calling this on an already-`Ready` pane does nothing.
    pub fn mark_ready(&mut self) {
        if self.state == PaneState::Ready {
            return;
        }
        self.state = PaneState::Ready;
        tracing::debug!(day = %self.day.id, "pane ready, flushing initial state");

        self.bridge.send(&Command::SetTheme(self.options.theme));
        self.bridge.send(&Command::SetFont(self.options.font));
        self.bridge.send(&Command::SetFontSize(self.options.size));
        self.bridge.send(&Command::SetHighlights {
            serialized: self.highlights.serialized.clone(),
        });
        for comment in &self.comments.comments {
            self.bridge.send(&Command::SetComment {
                anchor_id: comment.anchor_id.clone(),
                text: comment.text.clone(),
            });
        }
        while let Some(command) = self.pending.pop_front() {
            self.bridge.send(&command);
        }
    }

    /// Send a command now, or buffer it until the pane is `Ready`.
    pub fn send(&mut self, command: Command) {
        if self.state == PaneState::Ready {
            self.bridge.send(&command);
        } else {
            self.pending.push_back(command);
        }
    }

    /// Apply a display-option change. A `Ready` pane re-sends the same
    /// three commands each time; an earlier pane picks them up on flush.
    pub fn apply_display_options(&mut self, options: DisplayOptions) {
        self.options = options;
        self.send(Command::SetTheme(options.theme));
        self.send(Command::SetFont(options.font));
        self.send(Command::SetFontSize(options.size));
    }

    /// Apply one renderer-originated event to local state.
    ///
    /// Local edits are optimistic: the returned write effect may later fail
    /// against the store without rolling this state back.
    pub fn handle_event(&mut self, event: Event) -> Option<PaneEffect> {
        match event {
            Event::HighlightsChanged { serialized } => {
                self.highlights.serialized = serialized;
                Some(PaneEffect::WriteHighlights(self.highlights.clone()))
            }
            Event::CommentEdited { text, anchor_id } => {
                self.comments.upsert(&anchor_id, &text);
                Some(PaneEffect::WriteComments(self.comments.clone()))
            }
            Event::VerseClicked { verse } => Some(PaneEffect::OpenVerse {
                day: self.day.id.clone(),
                verse,
            }),
            Event::HighlightTapped { highlight_id } => {
                if self.selection.bind_highlight(highlight_id) {
                    Some(PaneEffect::HighlightMenu { highlight_id })
                } else {
                    None
                }
            }
            Event::TextCopied { text } => Some(PaneEffect::ClipboardCopy(text)),
            Event::TextShared { text } => Some(PaneEffect::ShareText(text)),
            Event::TextSearched { text } => Some(PaneEffect::SearchText(text)),
            Event::EditableFieldFocused => {
                self.selection.editing_started();
                Some(PaneEffect::HideMenu)
            }
            Event::EditableFieldBlurred => {
                self.selection.editing_finished();
                None
            }
        }
    }

    // Gesture entry points, driven by the host's touch recognizer.

    pub fn long_press(&mut self, touch: Point, menu: Size, viewport: Size) -> Option<MenuChange> {
        self.selection.long_press(touch, menu, viewport)
    }

    pub fn native_selection_started(
        &mut self,
        touch: Point,
        menu: Size,
        viewport: Size,
    ) -> Option<MenuChange> {
        self.selection.native_selection_started(touch, menu, viewport)
    }

    /// Single tap elsewhere; hides the menu when a selection was active.
    pub fn tap_elsewhere(&mut self) -> Option<MenuChange> {
        self.selection.tap_elsewhere().then_some(MenuChange::Hide)
    }

    // Action-menu entry points.

    /// Paint the current selection. The color also becomes the session's
    /// last-used color (persisted by the caller).
    pub fn highlight_selection(&mut self, color: HighlightColor) {
        self.send(Command::HighlightSelection(color));
    }

    /// Remove highlighting: a bound existing highlight is removed by id,
    /// a fresh selection is simply un-painted.
    pub fn remove_highlight(&mut self) {
        match self.selection.bound_highlight() {
            Some(highlight_id) => self.send(Command::RemoveHighlight { highlight_id }),
            None => self.send(Command::UnhighlightSelection),
        }
    }

    pub fn copy_selection(&mut self) {
        self.send(Command::CopySelection);
    }

    pub fn share_selection(&mut self) {
        self.send(Command::ShareSelection);
    }

    pub fn search_selection(&mut self) {
        self.send(Command::SearchSelection);
    }
}
