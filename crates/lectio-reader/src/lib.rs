//! Core of the daily-lesson reader: per-day annotation model, remote
//! annotation sync, pane lifecycle behind a paging surface, and the
//! selection/context-menu state machine. The script bridge itself lives in
//! `lectio-bridge`; this crate owns everything on the host side of it.

pub mod annotations;
pub mod error;
pub mod lifecycle;
pub mod pane;
pub mod selection;
pub mod session;
pub mod store;
pub mod sync;

pub use annotations::{Comment, Day, DayComments, DayHighlights};
pub use error::{Result, StoreError};
pub use lifecycle::{PaneLifecycleManager, PaneSlot};
pub use pane::{ContentPane, PaneEffect, PaneState};
pub use selection::{MenuChange, Point, SelectionState, SelectionTracker, Size, menu_position};
pub use session::{HostRequest, ReaderSession, SessionSignal, SessionStatus};
pub use store::{AnnotationStore, MemoryAnnotationStore, MemoryPreferenceStore, PreferenceStore};
pub use sync::{DayBundle, LessonLoad, LoadUpdate, SyncPipeline, select_initial_day};
