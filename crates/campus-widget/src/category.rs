//! Per-topic cache of dropdown categories fetched from the backend.
//!
//! Each [`CategoryCache`] tracks `loading`/`loaded` flags for one topic and
//! renders the dropdown in exactly one of its views. Non-forced loads are
//! skipped while a load is pending or after one has succeeded; forced loads
//! always fetch. When loads overlap, only the latest one to start may write
//! its result.

use std::collections::HashMap;
use std::sync::Mutex;

use serde::Serialize;

use campus_core::types::{CategoryOption, CategoryTopic};

use crate::backend::{ChatBackend, FeesPayload, ScholarshipsPayload};
use crate::events::{EventSink, WidgetEvent};
use crate::lock_or_recover;

/// Cache flags. `loading` and `loaded` are never both true.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DropdownStatus {
    pub loading: bool,
    pub loaded: bool,
}

/// What the dropdown currently shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "options", rename_all = "snake_case")]
pub enum DropdownView {
    Loading,
    NoCategories,
    Ready(Vec<CategoryOption>),
    Failed,
}

impl DropdownView {
    /// Text of the first, unselectable entry.
    pub fn placeholder(&self, topic: CategoryTopic) -> &'static str {
        match (self, topic) {
            (DropdownView::Loading, _) => "Loading categories...",
            (DropdownView::NoCategories, CategoryTopic::Fees) => "No fee categories configured",
            (DropdownView::NoCategories, CategoryTopic::Scholarships) => {
                "No scholarship categories configured"
            }
            (DropdownView::Ready(_), _) => "Choose a category",
            (DropdownView::Failed, _) => "Unable to load categories",
        }
    }

    /// Only a populated dropdown accepts selections.
    pub fn is_enabled(&self) -> bool {
        matches!(self, DropdownView::Ready(_))
    }

    pub fn options(&self) -> &[CategoryOption] {
        match self {
            DropdownView::Ready(options) => options,
            _ => &[],
        }
    }
}

/// Result of a [`CategoryCache::load`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Already loading or loaded and the call was not forced.
    Skipped,
    Loaded(usize),
    Empty,
    Failed(String),
    /// A newer load started while this one was in flight; its result was dropped.
    Superseded,
}

/// Deduplicate raw category keys and sort them by label.
///
/// Blank keys are dropped. Keys are compared case-sensitively, so `"SC"` and
/// `"sc"` stay separate options even though both are labelled `"Sc"`. Labels
/// sort case-insensitively with the raw key as tie-break.
pub fn build_category_options<'a, I>(keys: I) -> Vec<CategoryOption>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut by_value: HashMap<&str, CategoryOption> = HashMap::new();
    for key in keys {
        if key.trim().is_empty() {
            continue;
        }
        by_value.insert(key, CategoryOption::from_value(key));
    }

    let mut options: Vec<CategoryOption> = by_value.into_values().collect();
    options.sort_by(|a, b| {
        a.label
            .to_lowercase()
            .cmp(&b.label.to_lowercase())
            .then_with(|| a.value.cmp(&b.value))
    });
    options
}

/// Options from every fee row that names a category.
pub fn fee_category_options(payload: &FeesPayload) -> Vec<CategoryOption> {
    build_category_options(payload.fees.iter().filter_map(|f| f.category.as_deref()))
}

/// Options from active scholarship rows only.
pub fn scholarship_category_options(payload: &ScholarshipsPayload) -> Vec<CategoryOption> {
    build_category_options(
        payload
            .scholarships
            .iter()
            .filter(|s| s.is_active)
            .filter_map(|s| s.category.as_deref()),
    )
}

#[derive(Debug)]
struct CacheState {
    status: DropdownStatus,
    view: DropdownView,
    /// Bumped by every load that actually fetches.
    generation: u64,
}

/// Dropdown category cache for one topic.
#[derive(Debug)]
pub struct CategoryCache {
    topic: CategoryTopic,
    state: Mutex<CacheState>,
}

impl CategoryCache {
    pub fn new(topic: CategoryTopic) -> Self {
        Self {
            topic,
            state: Mutex::new(CacheState {
                status: DropdownStatus::default(),
                view: DropdownView::Loading,
                generation: 0,
            }),
        }
    }

    pub fn topic(&self) -> CategoryTopic {
        self.topic
    }

    pub fn status(&self) -> DropdownStatus {
        lock_or_recover(&self.state).status
    }

    pub fn view(&self) -> DropdownView {
        lock_or_recover(&self.state).view.clone()
    }

    /// Whether `value` is one of the currently offered options.
    pub fn contains(&self, value: &str) -> bool {
        lock_or_recover(&self.state)
            .view
            .options()
            .iter()
            .any(|o| o.value == value)
    }

    /// Populate the dropdown from the backend.
    ///
    /// The lock is released before the request is issued and re-taken when it
    /// completes, so the flags can be observed (and concurrent calls skipped)
    /// while the request is pending.
    pub async fn load(
        &self,
        backend: &dyn ChatBackend,
        events: &EventSink,
        force: bool,
    ) -> LoadOutcome {
        let generation = {
            let mut state = lock_or_recover(&self.state);
            if !force && (state.status.loading || state.status.loaded) {
                tracing::debug!(
                    topic = %self.topic,
                    loading = state.status.loading,
                    loaded = state.status.loaded,
                    "Category load skipped"
                );
                return LoadOutcome::Skipped;
            }
            state.generation += 1;
            state.status = DropdownStatus {
                loading: true,
                loaded: false,
            };
            state.view = DropdownView::Loading;
            state.generation
        };
        self.publish(events, DropdownView::Loading);
        tracing::debug!(topic = %self.topic, force, generation, "Loading categories");

        let result = match self.topic {
            CategoryTopic::Fees => backend.fees(None).await.map(|p| fee_category_options(&p)),
            CategoryTopic::Scholarships => backend
                .scholarships(None)
                .await
                .map(|p| scholarship_category_options(&p)),
        };

        let (view, outcome) = {
            let mut state = lock_or_recover(&self.state);
            if state.generation != generation {
                tracing::debug!(
                    topic = %self.topic,
                    generation,
                    latest = state.generation,
                    "Stale category load dropped"
                );
                return LoadOutcome::Superseded;
            }

            let (view, outcome) = match result {
                Ok(options) if options.is_empty() => (DropdownView::NoCategories, LoadOutcome::Empty),
                Ok(options) => {
                    let count = options.len();
                    (DropdownView::Ready(options), LoadOutcome::Loaded(count))
                }
                Err(e) => {
                    tracing::warn!(topic = %self.topic, error = %e, "Failed to load categories");
                    (DropdownView::Failed, LoadOutcome::Failed(e.to_string()))
                }
            };
            state.status = DropdownStatus {
                loading: false,
                loaded: !matches!(view, DropdownView::Failed),
            };
            state.view = view.clone();
            (view, outcome)
        };

        if let LoadOutcome::Loaded(count) = outcome {
            tracing::info!(topic = %self.topic, count, "Categories loaded");
        }
        self.publish(events, view);
        outcome
    }

    fn publish(&self, events: &EventSink, view: DropdownView) {
        events.publish(WidgetEvent::DropdownChanged {
            topic: self.topic,
            view,
        });
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{FeeRecord, ScholarshipRecord};
    use crate::error::BackendError;
    use crate::testing::MockBackend;

    fn fees(categories: &[&str]) -> FeesPayload {
        FeesPayload {
            fees: categories
                .iter()
                .map(|c| FeeRecord {
                    category: Some(c.to_string()),
                    ..FeeRecord::default()
                })
                .collect(),
            formatted_text: None,
        }
    }

    fn values(options: &[CategoryOption]) -> Vec<&str> {
        options.iter().map(|o| o.value.as_str()).collect()
    }

    // ---- Option building ----

    #[test]
    fn test_options_sorted_by_label_case_insensitive() {
        let options = build_category_options(["obc", "Open_Category", "ews", "NT_b"]);
        assert_eq!(values(&options), vec!["ews", "NT_b", "obc", "Open_Category"]);
        assert_eq!(options[1].label, "Nt B");
    }

    #[test]
    fn test_duplicates_collapse() {
        let options = build_category_options(["open", "sc", "open", "open"]);
        assert_eq!(values(&options), vec!["open", "sc"]);
    }

    #[test]
    fn test_dedup_is_case_sensitive() {
        let options = build_category_options(["sc", "SC"]);
        assert_eq!(options.len(), 2);
        assert!(options.iter().all(|o| o.label == "Sc"));
        // Same label: raw key breaks the tie.
        assert_eq!(values(&options), vec!["SC", "sc"]);
    }

    #[test]
    fn test_blank_keys_dropped() {
        let options = build_category_options(["", "  ", "open"]);
        assert_eq!(values(&options), vec!["open"]);
    }

    #[test]
    fn test_fee_rows_without_category_ignored() {
        let mut payload = fees(&["open"]);
        payload.fees.push(FeeRecord::default());
        assert_eq!(fee_category_options(&payload).len(), 1);
    }

    #[test]
    fn test_inactive_scholarships_filtered() {
        let payload = ScholarshipsPayload {
            scholarships: vec![
                ScholarshipRecord {
                    category: Some("sc".into()),
                    is_active: true,
                    ..ScholarshipRecord::default()
                },
                ScholarshipRecord {
                    category: Some("obc".into()),
                    is_active: false,
                    ..ScholarshipRecord::default()
                },
            ],
            formatted_text: None,
        };
        assert_eq!(values(&scholarship_category_options(&payload)), vec!["sc"]);
    }

    // ---- Views ----

    #[test]
    fn test_view_placeholders() {
        assert_eq!(
            DropdownView::Loading.placeholder(CategoryTopic::Fees),
            "Loading categories..."
        );
        assert_eq!(
            DropdownView::NoCategories.placeholder(CategoryTopic::Scholarships),
            "No scholarship categories configured"
        );
        assert_eq!(
            DropdownView::Ready(vec![]).placeholder(CategoryTopic::Fees),
            "Choose a category"
        );
        assert_eq!(
            DropdownView::Failed.placeholder(CategoryTopic::Fees),
            "Unable to load categories"
        );
    }

    #[test]
    fn test_only_ready_is_enabled() {
        assert!(DropdownView::Ready(vec![CategoryOption::from_value("sc")]).is_enabled());
        assert!(!DropdownView::Loading.is_enabled());
        assert!(!DropdownView::NoCategories.is_enabled());
        assert!(!DropdownView::Failed.is_enabled());
    }

    #[test]
    fn test_view_serializes_tagged() {
        let json = serde_json::to_value(DropdownView::Ready(vec![CategoryOption::from_value(
            "sc",
        )]))
        .unwrap();
        assert_eq!(json["state"], "ready");
        assert_eq!(json["options"][0]["label"], "Sc");
        assert_eq!(
            serde_json::to_value(DropdownView::Failed).unwrap()["state"],
            "failed"
        );
    }

    // ---- Loading ----

    #[tokio::test]
    async fn test_load_populates_and_marks_loaded() {
        let backend = MockBackend::new();
        backend.set_fees(Ok(fees(&["sc", "open"])));
        let events = EventSink::new();
        let mut rx = events.subscribe();
        let cache = CategoryCache::new(CategoryTopic::Fees);

        let outcome = cache.load(&backend, &events, false).await;
        assert_eq!(outcome, LoadOutcome::Loaded(2));
        assert_eq!(
            cache.status(),
            DropdownStatus {
                loading: false,
                loaded: true
            }
        );
        assert!(cache.view().is_enabled());
        assert!(cache.contains("sc"));
        assert!(!cache.contains("SC"));

        assert!(matches!(
            rx.try_recv().unwrap(),
            WidgetEvent::DropdownChanged {
                view: DropdownView::Loading,
                ..
            }
        ));
        assert!(matches!(
            rx.try_recv().unwrap(),
            WidgetEvent::DropdownChanged {
                view: DropdownView::Ready(_),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_unforced_load_after_success_is_skipped() {
        let backend = MockBackend::new();
        backend.set_fees(Ok(fees(&["sc"])));
        let events = EventSink::new();
        let cache = CategoryCache::new(CategoryTopic::Fees);

        cache.load(&backend, &events, false).await;
        assert_eq!(cache.load(&backend, &events, false).await, LoadOutcome::Skipped);
        assert_eq!(backend.fees_calls(), 1);
    }

    #[tokio::test]
    async fn test_forced_load_always_fetches() {
        let backend = MockBackend::new();
        backend.set_fees(Ok(fees(&["sc"])));
        let events = EventSink::new();
        let cache = CategoryCache::new(CategoryTopic::Fees);

        for _ in 0..3 {
            cache.load(&backend, &events, true).await;
        }
        assert_eq!(backend.fees_calls(), 3);
    }

    #[tokio::test]
    async fn test_concurrent_unforced_loads_issue_one_request() {
        let backend = MockBackend::new();
        backend.set_fees(Ok(fees(&["sc"])));
        backend.hold();
        let events = EventSink::new();
        let cache = CategoryCache::new(CategoryTopic::Fees);

        let (first, second, third, _) = tokio::join!(
            cache.load(&backend, &events, false),
            cache.load(&backend, &events, false),
            cache.load(&backend, &events, false),
            async {
                tokio::task::yield_now().await;
                assert!(cache.status().loading);
                assert!(!cache.status().loaded);
                backend.release();
            }
        );

        assert_eq!(first, LoadOutcome::Loaded(1));
        assert_eq!(second, LoadOutcome::Skipped);
        assert_eq!(third, LoadOutcome::Skipped);
        assert_eq!(backend.fees_calls(), 1);
    }

    #[tokio::test]
    async fn test_overlapping_forced_loads_latest_wins() {
        let backend = MockBackend::new();
        backend.set_fees(Ok(fees(&["sc"])));
        backend.hold();
        let events = EventSink::new();
        let cache = CategoryCache::new(CategoryTopic::Fees);

        let (first, second, _) = tokio::join!(
            cache.load(&backend, &events, true),
            cache.load(&backend, &events, true),
            async {
                tokio::task::yield_now().await;
                backend.release();
            }
        );

        assert_eq!(backend.fees_calls(), 2);
        assert_eq!(first, LoadOutcome::Superseded);
        assert_eq!(second, LoadOutcome::Loaded(1));
        let status = cache.status();
        assert!(!status.loading);
        assert!(status.loaded);
    }

    #[tokio::test]
    async fn test_empty_result() {
        let backend = MockBackend::new();
        backend.set_scholarships(Ok(ScholarshipsPayload::default()));
        let events = EventSink::new();
        let cache = CategoryCache::new(CategoryTopic::Scholarships);

        assert_eq!(cache.load(&backend, &events, false).await, LoadOutcome::Empty);
        assert_eq!(cache.view(), DropdownView::NoCategories);
        assert!(cache.status().loaded);
        assert!(!cache.view().is_enabled());
    }

    #[tokio::test]
    async fn test_failure_leaves_unloaded_and_retries() {
        let backend = MockBackend::new();
        backend.set_fees(Err(BackendError::Transport("connection refused".into())));
        let events = EventSink::new();
        let cache = CategoryCache::new(CategoryTopic::Fees);

        let outcome = cache.load(&backend, &events, false).await;
        assert!(matches!(outcome, LoadOutcome::Failed(_)));
        assert_eq!(cache.view(), DropdownView::Failed);
        assert_eq!(cache.status(), DropdownStatus::default());

        backend.set_fees(Ok(fees(&["open"])));
        assert_eq!(
            cache.load(&backend, &events, false).await,
            LoadOutcome::Loaded(1)
        );
        assert_eq!(backend.fees_calls(), 2);
    }

    #[tokio::test]
    async fn test_forced_reload_failure_drops_loaded_flag() {
        let backend = MockBackend::new();
        backend.set_fees(Ok(fees(&["open"])));
        let events = EventSink::new();
        let cache = CategoryCache::new(CategoryTopic::Fees);
        cache.load(&backend, &events, false).await;

        backend.set_fees(Err(BackendError::Api {
            status: 500,
            message: "db down".into(),
        }));
        cache.load(&backend, &events, true).await;
        assert!(!cache.status().loaded);
        assert!(!cache.status().loading);
        assert!(!cache.contains("open"));
    }
}
