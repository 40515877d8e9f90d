//! Reader session: the single owner of lifecycle + pipeline state.
//!
//! Everything here runs on the host's cooperative thread. Store completions
//! and renderer events arrive as messages and are applied one at a time, so
//! no two callbacks can interleave a mutation of the same pane; the session
//! holds an explicit dispatcher position instead of any ambient UI handle.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use lectio_bridge::channel::ScriptSurface;
use lectio_bridge::event::Event;
use lectio_bridge::types::{DisplayOptions, HighlightColor};

use crate::lifecycle::{PaneLifecycleManager, PaneSlot};
use crate::pane::PaneEffect;
use crate::store::{
    AnnotationStore, PreferenceStore, load_display_options, save_display_options,
    save_last_highlight_color,
};
use crate::sync::{DayBundle, LessonLoad, LoadUpdate, SyncPipeline, select_initial_day};

/// Outbound request to the embedding shell. The core signals these; it
/// never performs navigation, clipboard or share itself.
#[derive(Debug, Clone, PartialEq)]
pub enum HostRequest {
    OpenVerse { day: String, verse: String },
    ClipboardCopy(String),
    ShareText(String),
    SearchText(String),
    HighlightMenu { highlight_id: u64 },
    HideMenu,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Loading,
    Ready,
    /// A store read or write failed. The UI shows the offline state; retry
    /// happens on user action, not automatically.
    Offline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionSignal {
    /// Every day's triple arrived; fired at most once per lesson load.
    LessonReady,
    WentOffline,
}

pub struct ReaderSession {
    pipeline: SyncPipeline,
    lifecycle: PaneLifecycleManager,
    prefs: Arc<dyn PreferenceStore>,
    lesson: String,
    bundles: HashMap<usize, DayBundle>,
    status: SessionStatus,
    ready_signaled: bool,
}

impl ReaderSession {
    pub fn new(
        store: Arc<dyn AnnotationStore>,
        prefs: Arc<dyn PreferenceStore>,
        user: impl Into<String>,
        lesson: impl Into<String>,
        day_ids: Vec<String>,
    ) -> Self {
        let options = load_display_options(prefs.as_ref());
        Self {
            pipeline: SyncPipeline::new(store, user),
            lifecycle: PaneLifecycleManager::new(day_ids, options),
            prefs,
            lesson: lesson.into(),
            bundles: HashMap::new(),
            status: SessionStatus::Loading,
            ready_signaled: false,
        }
    }

    #[must_use]
    pub fn status(&self) -> SessionStatus {
        self.status
    }

    #[must_use]
    pub fn lifecycle(&self) -> &PaneLifecycleManager {
        &self.lifecycle
    }

    pub fn lifecycle_mut(&mut self) -> &mut PaneLifecycleManager {
        &mut self.lifecycle
    }

    /// Kick off the concurrent per-day fetches for this lesson.
    #[must_use]
    pub fn start_load(&mut self) -> LessonLoad {
        self.status = SessionStatus::Loading;
        self.ready_signaled = false;
        self.bundles.clear();
        let day_ids: Vec<String> = (0..self.lifecycle.day_count())
            .filter_map(|index| self.lifecycle.day_id(index).map(str::to_string))
            .collect();
        self.pipeline.load_lesson(&self.lesson, &day_ids)
    }

    /// Apply one pipeline update on the owner thread.
    pub fn apply_update(&mut self, update: LoadUpdate) -> Option<SessionSignal> {
        match update {
            LoadUpdate::DayLoaded { index, bundle } => {
                self.bundles.insert(index, *bundle);
                None
            }
            LoadUpdate::AllReady => {
                if self.ready_signaled {
                    return None;
                }
                self.ready_signaled = true;
                self.status = SessionStatus::Ready;
                Some(SessionSignal::LessonReady)
            }
            LoadUpdate::DayFailed { day, error, .. } => {
                tracing::warn!(day = %day, error = %error, "lesson load went offline");
                self.status = SessionStatus::Offline;
                Some(SessionSignal::WentOffline)
            }
        }
    }

    /// Pager's initial position: today's day, else the requested one, else
    /// the first.
    #[must_use]
    pub fn initial_index(&self, today: NaiveDate, requested: Option<&str>) -> usize {
        let mut days: Vec<_> = self.bundles.values().map(|bundle| bundle.day.clone()).collect();
        days.sort_by_key(|day| day.index);
        select_initial_day(&days, today, requested)
    }

    /// Instantiate the pane for a page slot whose bundle has resolved.
    /// Returns `false` while the day's data is still in flight.
    pub fn ensure_pane(&mut self, index: usize, surface: Arc<dyn ScriptSurface>) -> bool {
        let Some(bundle) = self.bundles.get(&index) else {
            return false;
        };
        let bundle = bundle.clone();
        let slot = self.lifecycle.ensure_pane(index, bundle, surface);
        slot.pane.begin_load();
        true
    }

    pub fn slot_mut(&mut self, index: usize) -> Option<&mut PaneSlot> {
        self.lifecycle.slot_mut(index)
    }

    /// The surface for this pane signaled page-load completion.
    pub fn pane_ready(&mut self, index: usize) {
        if let Some(pane) = self.lifecycle.pane_mut(index) {
            pane.mark_ready();
        }
    }

    pub fn evict_pane(&mut self, index: usize) {
        self.lifecycle.evict_pane(index);
    }

    /// Route one renderer event through its pane, performing the resulting
    /// write-through. Exactly one store write per annotation event; the
    /// optimistic local edit stays even if the write fails.
    pub async fn handle_pane_event(&mut self, index: usize, event: Event) -> Option<HostRequest> {
        let effect = self.lifecycle.pane_mut(index)?.handle_event(event)?;
        match effect {
            PaneEffect::WriteHighlights(highlights) => {
                if let Err(err) = self.pipeline.write_highlights(&highlights).await {
                    tracing::warn!(day = %highlights.day, error = %err, "highlight write failed");
                    self.status = SessionStatus::Offline;
                }
                None
            }
            PaneEffect::WriteComments(comments) => {
                if let Err(err) = self.pipeline.write_comments(&comments).await {
                    tracing::warn!(day = %comments.day, error = %err, "comment write failed");
                    self.status = SessionStatus::Offline;
                }
                None
            }
            PaneEffect::OpenVerse { day, verse } => Some(HostRequest::OpenVerse { day, verse }),
            PaneEffect::ClipboardCopy(text) => Some(HostRequest::ClipboardCopy(text)),
            PaneEffect::ShareText(text) => Some(HostRequest::ShareText(text)),
            PaneEffect::SearchText(text) => Some(HostRequest::SearchText(text)),
            PaneEffect::HighlightMenu { highlight_id } => {
                Some(HostRequest::HighlightMenu { highlight_id })
            }
            PaneEffect::HideMenu => Some(HostRequest::HideMenu),
        }
    }

    /// Persist and fan out a display-option change to every live pane.
    pub fn set_display_options(&mut self, options: DisplayOptions) {
        save_display_options(self.prefs.as_ref(), options);
        self.lifecycle.broadcast_display_options(options);
    }

    /// Paint the active pane's selection and remember the color as the
    /// session's last-used one.
    pub fn highlight_selection(&mut self, index: usize, color: HighlightColor) {
        save_last_highlight_color(self.prefs.as_ref(), color);
        if let Some(pane) = self.lifecycle.pane_mut(index) {
            pane.highlight_selection(color);
        }
    }
}
