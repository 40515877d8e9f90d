//! Pane lifecycle management behind the paging surface.
//!
//! The manager keeps the ordered day list and a sparse map of currently
//! instantiated panes; pages that are not visible or adjacent need not
//! exist. Display-option changes fan out to every live pane, and eviction
//! cancels any in-flight work tied to the pane so a late completion can
//! never mutate a torn-down instance. Each slot carries a generation
//! number; completions tagged with a stale generation are ignored.

use std::collections::HashMap;
use std::sync::Arc;

use lectio_bridge::channel::ScriptSurface;
use lectio_bridge::event::Event;
use lectio_bridge::types::DisplayOptions;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::pane::ContentPane;
use crate::sync::DayBundle;

pub struct PaneSlot {
    pub pane: ContentPane,
    pub events: mpsc::UnboundedReceiver<Event>,
    generation: u64,
    tasks: Vec<JoinHandle<()>>,
}

impl PaneSlot {
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

pub struct PaneLifecycleManager {
    day_ids: Vec<String>,
    options: DisplayOptions,
    slots: HashMap<usize, PaneSlot>,
    next_generation: u64,
}

impl PaneLifecycleManager {
    #[must_use]
    pub fn new(day_ids: Vec<String>, options: DisplayOptions) -> Self {
        Self {
            day_ids,
            options,
            slots: HashMap::new(),
            next_generation: 1,
        }
    }

    #[must_use]
    pub fn day_count(&self) -> usize {
        self.day_ids.len()
    }

    #[must_use]
    pub fn day_id(&self, index: usize) -> Option<&str> {
        self.day_ids.get(index).map(String::as_str)
    }

    #[must_use]
    pub fn is_instantiated(&self, index: usize) -> bool {
        self.slots.contains_key(&index)
    }

    #[must_use]
    pub fn options(&self) -> DisplayOptions {
        self.options
    }

    /// Idempotent: returns the existing pane for this page slot, or
    /// constructs an `Unloaded` one over the bundle the sync pipeline
    /// resolved for that index.
    pub fn ensure_pane(
        &mut self,
        index: usize,
        bundle: DayBundle,
        surface: Arc<dyn ScriptSurface>,
    ) -> &mut PaneSlot {
        if !self.slots.contains_key(&index) {
            let generation = self.next_generation;
            self.next_generation = self.next_generation.saturating_add(1);

            let (pane, events) = ContentPane::new(
                bundle.day,
                bundle.highlights,
                bundle.comments,
                self.options,
                surface,
            );
            tracing::debug!(index, generation, "pane instantiated");
            self.slots.insert(
                index,
                PaneSlot {
                    pane,
                    events,
                    generation,
                    tasks: Vec::new(),
                },
            );
        }
        // Just inserted above when missing.
        #[allow(clippy::unwrap_used)]
        self.slots.get_mut(&index).unwrap()
    }

    #[must_use]
    pub fn pane(&self, index: usize) -> Option<&ContentPane> {
        self.slots.get(&index).map(|slot| &slot.pane)
    }

    pub fn pane_mut(&mut self, index: usize) -> Option<&mut ContentPane> {
        self.slots.get_mut(&index).map(|slot| &mut slot.pane)
    }

    pub fn slot_mut(&mut self, index: usize) -> Option<&mut PaneSlot> {
        self.slots.get_mut(&index)
    }

    /// Track an in-flight task tied to this pane instance so eviction can
    /// cancel it.
    pub fn attach_task(&mut self, index: usize, task: JoinHandle<()>) {
        if let Some(slot) = self.slots.get_mut(&index) {
            slot.tasks.push(task);
        } else {
            // Pane already gone; the work must not outlive it.
            task.abort();
        }
    }

    /// Apply to every instantiated pane, not just the active one: a later
    /// swipe must show content already in the new style. Panes that are not
    /// yet `Ready` pick the change up through their own command buffering.
    pub fn broadcast_display_options(&mut self, options: DisplayOptions) {
        self.options = options;
        for slot in self.slots.values_mut() {
            slot.pane.apply_display_options(options);
        }
    }

    /// Tear down the pane for a page slot evicted by the pager.
    ///
    /// Cancels the pane's in-flight tasks and bumps the slot generation so
    /// a callback that already resolved cannot touch a successor pane.
    /// Remote-store state is unaffected.
    pub fn evict_pane(&mut self, index: usize) {
        let Some(slot) = self.slots.remove(&index) else {
            return;
        };
        for task in &slot.tasks {
            task.abort();
        }
        tracing::debug!(index, generation = slot.generation, "pane evicted");
    }

    /// Whether a completion tagged with `generation` still addresses the
    /// live pane at `index`.
    #[must_use]
    pub fn is_current(&self, index: usize, generation: u64) -> bool {
        self.slots
            .get(&index)
            .is_some_and(|slot| slot.generation == generation)
    }

    /// Run a mutation against the pane at `index` only if the tagged
    /// generation is still current. Returns whether it ran.
    pub fn apply_if_current<F>(&mut self, index: usize, generation: u64, apply: F) -> bool
    where
        F: FnOnce(&mut ContentPane),
    {
        match self.slots.get_mut(&index) {
            Some(slot) if slot.generation == generation => {
                apply(&mut slot.pane);
                true
            }
            _ => false,
        }
    }
}
