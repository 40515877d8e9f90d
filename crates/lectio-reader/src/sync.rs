//! Annotation sync pipeline.
//!
//! For a lesson with *n* days, each day independently fetches its remote
//! highlights, then comments, then the reading content, in that order; the
//! *n* per-day pipelines run concurrently. A completion counter fires a
//! one-time "all days ready" update once every triple has arrived, whatever
//! the network decides the arrival order is. A store failure marks the day
//! failed instead of counting it; retry is user-action policy, never
//! automatic.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use chrono::NaiveDate;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::annotations::{Day, DayComments, DayHighlights};
use crate::error::Result;
use crate::store::AnnotationStore;

/// Everything a pane needs for one day, with the remote snapshot already
/// resolved. Panes are only ever constructed over a bundle, which is what
/// enforces the merge-into-never-overwrite invariant: no local mutation can
/// round-trip before the remote state was fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayBundle {
    pub day: Day,
    pub highlights: DayHighlights,
    pub comments: DayComments,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadUpdate {
    DayLoaded { index: usize, bundle: Box<DayBundle> },
    /// The store failed for this day; the aggregate ready signal will not
    /// fire for this load. Surfaced as an offline/error flag upstream.
    DayFailed {
        index: usize,
        day: String,
        error: String,
    },
    /// Fired exactly once, only after all *n* triples completed.
    AllReady,
}

/// Handle to an in-flight lesson load. Dropping it cancels every per-day
/// fetch that has not yet completed.
pub struct LessonLoad {
    pub updates: mpsc::UnboundedReceiver<LoadUpdate>,
    tasks: Vec<JoinHandle<()>>,
}

impl LessonLoad {
    pub fn abort(&self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

impl Drop for LessonLoad {
    fn drop(&mut self) {
        self.abort();
    }
}

pub struct SyncPipeline {
    store: Arc<dyn AnnotationStore>,
    user: String,
}

impl SyncPipeline {
    pub fn new(store: Arc<dyn AnnotationStore>, user: impl Into<String>) -> Self {
        Self {
            store,
            user: user.into(),
        }
    }

    #[must_use]
    pub fn user(&self) -> &str {
        &self.user
    }

    /// Start the concurrent per-day pipelines for one lesson. A lesson with
    /// no days is trivially ready.
    pub fn load_lesson(&self, lesson: &str, day_ids: &[String]) -> LessonLoad {
        let (updates_tx, updates_rx) = mpsc::unbounded_channel();
        let total = day_ids.len();
        if total == 0 {
            let _ = updates_tx.send(LoadUpdate::AllReady);
        }
        let completed = Arc::new(AtomicUsize::new(0));
        let ready_fired = Arc::new(AtomicBool::new(false));

        let mut tasks = Vec::with_capacity(total);
        for (index, day_id) in day_ids.iter().enumerate() {
            let store = self.store.clone();
            let user = self.user.clone();
            let lesson = lesson.to_string();
            let day_id = day_id.clone();
            let updates_tx = updates_tx.clone();
            let completed = completed.clone();
            let ready_fired = ready_fired.clone();

            tasks.push(tokio::spawn(async move {
                match fetch_day_bundle(store.as_ref(), &user, &lesson, &day_id, index).await {
                    Ok(bundle) => {
                        let _ = updates_tx.send(LoadUpdate::DayLoaded {
                            index,
                            bundle: Box::new(bundle),
                        });
                        let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                        if done == total && !ready_fired.swap(true, Ordering::SeqCst) {
                            let _ = updates_tx.send(LoadUpdate::AllReady);
                        }
                    }
                    Err(err) => {
                        tracing::warn!(day = %day_id, error = %err, "day fetch failed");
                        let _ = updates_tx.send(LoadUpdate::DayFailed {
                            index,
                            day: day_id,
                            error: err.to_string(),
                        });
                    }
                }
            }));
        }

        LessonLoad {
            updates: updates_rx,
            tasks,
        }
    }

    /// Write-through for a renderer highlight event: immediate, unbatched,
    /// full replacement of the day's value keyed `(user, day)`.
    pub async fn write_highlights(&self, highlights: &DayHighlights) -> Result<()> {
        self.store.write_highlights(&self.user, highlights).await
    }

    /// Write-through for a comment upsert, same policy as highlights.
    pub async fn write_comments(&self, comments: &DayComments) -> Result<()> {
        self.store.write_comments(&self.user, comments).await
    }
}

/// One day's sequenced triple: highlights, then comments, then content.
/// Absent values become empty defaults; only genuine store failures error.
async fn fetch_day_bundle(
    store: &dyn AnnotationStore,
    user: &str,
    lesson: &str,
    day_id: &str,
    index: usize,
) -> Result<DayBundle> {
    let highlights = store
        .read_highlights(user, day_id)
        .await?
        .unwrap_or_else(|| DayHighlights::empty(day_id));
    let comments = store
        .read_comments(user, day_id)
        .await?
        .unwrap_or_else(|| DayComments::empty(day_id));
    let day = store
        .read_day(lesson, day_id)
        .await?
        .unwrap_or_else(|| placeholder_day(day_id, index));
    Ok(DayBundle {
        day,
        highlights,
        comments,
    })
}

fn placeholder_day(day_id: &str, index: usize) -> Day {
    Day {
        id: day_id.to_string(),
        date: NaiveDate::parse_from_str(day_id, "%Y-%m-%d").unwrap_or_default(),
        title: String::new(),
        content: String::new(),
        index,
    }
}

/// Pick the pager's initial position: the day whose date range contains
/// today, else an externally requested day id, else the first day.
#[must_use]
pub fn select_initial_day(days: &[Day], today: NaiveDate, requested: Option<&str>) -> usize {
    if let Some(index) = days.iter().position(|day| day.covers(today)) {
        return index;
    }
    if let Some(requested) = requested {
        if let Some(index) = days.iter().position(|day| day.id == requested) {
            return index;
        }
    }
    0
}

#[cfg(test)]
mod tests {
    use super::{LoadUpdate, SyncPipeline, select_initial_day};
    use crate::annotations::{Day, DayComments, DayHighlights};
    use crate::error::{Result, StoreError};
    use crate::store::{AnnotationStore, MemoryAnnotationStore};
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::sync::Arc;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn day(id: &str, index: usize) -> Day {
        Day {
            id: id.to_string(),
            date: date(id),
            title: format!("Day {index}"),
            content: "<p>reading</p>".to_string(),
            index,
        }
    }

    fn week_ids() -> Vec<String> {
        (1..=7).map(|n| format!("2024-01-0{n}")).collect()
    }

    #[tokio::test]
    async fn all_ready_fires_exactly_once_for_seven_days() {
        let store = Arc::new(MemoryAnnotationStore::new());
        for (index, id) in week_ids().iter().enumerate() {
            store.seed_day("lesson-1", day(id, index));
        }

        let pipeline = SyncPipeline::new(store, "u1");
        let mut load = pipeline.load_lesson("lesson-1", &week_ids());

        let mut loaded = 0;
        let mut ready = 0;
        while let Some(update) = load.updates.recv().await {
            match update {
                LoadUpdate::DayLoaded { .. } => loaded += 1,
                LoadUpdate::AllReady => {
                    ready += 1;
                    // All tasks sent their final updates before AllReady can
                    // fire; drain whatever is left and stop.
                    while let Ok(update) = load.updates.try_recv() {
                        assert!(!matches!(update, LoadUpdate::AllReady));
                    }
                    break;
                }
                LoadUpdate::DayFailed { day, error, .. } => {
                    panic!("unexpected failure for {day}: {error}");
                }
            }
        }
        assert_eq!(loaded, 7);
        assert_eq!(ready, 1);
    }

    #[tokio::test]
    async fn an_empty_lesson_is_ready_immediately() {
        let pipeline = SyncPipeline::new(Arc::new(MemoryAnnotationStore::new()), "u1");
        let mut load = pipeline.load_lesson("lesson-1", &[]);

        assert!(matches!(load.updates.recv().await, Some(LoadUpdate::AllReady)));
        assert!(load.updates.recv().await.is_none());
    }

    #[tokio::test]
    async fn missing_remote_values_become_empty_defaults() {
        let store = Arc::new(MemoryAnnotationStore::new());
        store.seed_day("lesson-1", day("2024-01-03", 0));

        let pipeline = SyncPipeline::new(store, "u1");
        let mut load = pipeline.load_lesson("lesson-1", &["2024-01-03".to_string()]);

        let Some(LoadUpdate::DayLoaded { bundle, .. }) = load.updates.recv().await else {
            panic!("expected the day to load");
        };
        assert!(bundle.highlights.is_empty());
        assert!(bundle.comments.is_empty());
        assert_eq!(bundle.day.title, "Day 0");
    }

    struct FailingStore;

    #[async_trait]
    impl AnnotationStore for FailingStore {
        async fn read_highlights(&self, _user: &str, day: &str) -> Result<Option<DayHighlights>> {
            Err(StoreError::Read {
                key: format!("highlights/{day}"),
                reason: "network unreachable".to_string(),
            })
        }

        async fn write_highlights(&self, _user: &str, _h: &DayHighlights) -> Result<()> {
            Ok(())
        }

        async fn read_comments(&self, _user: &str, _day: &str) -> Result<Option<DayComments>> {
            Ok(None)
        }

        async fn write_comments(&self, _user: &str, _c: &DayComments) -> Result<()> {
            Ok(())
        }

        async fn read_day(&self, _lesson: &str, _day: &str) -> Result<Option<Day>> {
            Ok(None)
        }
    }

    #[tokio::test]
    async fn a_failed_day_blocks_the_aggregate_ready_signal() {
        let pipeline = SyncPipeline::new(Arc::new(FailingStore), "u1");
        let mut load = pipeline.load_lesson("lesson-1", &["2024-01-01".to_string()]);

        let Some(LoadUpdate::DayFailed { day, .. }) = load.updates.recv().await else {
            panic!("expected the day to fail");
        };
        assert_eq!(day, "2024-01-01");
        // The single task has finished; with the senders dropped the channel
        // closes without ever producing AllReady.
        assert!(load.updates.recv().await.is_none());
    }

    #[tokio::test]
    async fn write_through_replaces_the_full_highlights_value() {
        let store = Arc::new(MemoryAnnotationStore::new());
        let pipeline = SyncPipeline::new(store.clone(), "u1");

        let mut highlights = DayHighlights::empty("2024-01-03");
        highlights.serialized = "H1".to_string();
        pipeline.write_highlights(&highlights).await.unwrap();
        highlights.serialized = "H2".to_string();
        pipeline.write_highlights(&highlights).await.unwrap();

        let stored = store
            .read_highlights("u1", "2024-01-03")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.serialized, "H2");
        assert_eq!(store.write_count(), 2);
    }

    #[test]
    fn initial_day_prefers_today_then_requested_then_first() {
        let days: Vec<Day> = week_ids()
            .iter()
            .enumerate()
            .map(|(index, id)| day(id, index))
            .collect();

        assert_eq!(select_initial_day(&days, date("2024-01-04"), None), 3);
        assert_eq!(
            select_initial_day(&days, date("2024-02-01"), Some("2024-01-06")),
            5
        );
        assert_eq!(
            select_initial_day(&days, date("2024-02-01"), Some("not-a-day")),
            0
        );
        assert_eq!(select_initial_day(&days, date("2024-02-01"), None), 0);
    }
}
