//! Library view helpers: name filtering, sorting, paged loading, and the
//! suggestion index that tracks the current video list.

use compacter_core::defaults::{SUGGESTION_MAX_RESULTS, TAG_INDEX_CAP};
use compacter_core::{MediaLibrary, Result, SortOrder, VideoItem};
use tracing::{debug, info};

use crate::suggest::SuggestionEngine;
use crate::tags::{build_tag_index, TagIndex};

/// Keep videos whose name contains `query`, ignoring case.
///
/// An empty query keeps everything.
pub fn filter_videos<'a>(videos: &'a [VideoItem], query: &str) -> Vec<&'a VideoItem> {
    if query.is_empty() {
        return videos.iter().collect();
    }
    let needle = query.to_lowercase();
    videos
        .iter()
        .filter(|v| v.name.to_lowercase().contains(&needle))
        .collect()
}

/// Sort in place by the chosen order. Name sorting ignores case.
pub fn sort_videos(videos: &mut [&VideoItem], order: SortOrder) {
    match order {
        SortOrder::DateDesc => videos.sort_by(|a, b| b.date_added.cmp(&a.date_added)),
        SortOrder::DateAsc => videos.sort_by_key(|v| v.date_added),
        SortOrder::SizeDesc => videos.sort_by(|a, b| b.size_bytes.cmp(&a.size_bytes)),
        SortOrder::SizeAsc => videos.sort_by_key(|v| v.size_bytes),
        SortOrder::NameAsc => videos.sort_by_cached_key(|v| v.name.to_lowercase()),
    }
}

/// Filtered then sorted view of `videos`.
pub fn visible_videos<'a>(
    videos: &'a [VideoItem],
    query: &str,
    order: SortOrder,
) -> Vec<&'a VideoItem> {
    let mut visible = filter_videos(videos, query);
    sort_videos(&mut visible, order);
    visible
}

/// Load up to `max_items` videos from the library, `page_size` at a time.
///
/// Stops at the first short page.
pub async fn load_library(
    library: &dyn MediaLibrary,
    page_size: usize,
    max_items: usize,
) -> Result<Vec<VideoItem>> {
    let page_size = page_size.max(1);
    let mut videos = Vec::new();

    while videos.len() < max_items {
        let limit = page_size.min(max_items - videos.len());
        let page = library.list_videos(limit, videos.len()).await?;
        let fetched = page.len();
        videos.extend(page);
        debug!(
            subsystem = "search",
            component = "library",
            fetched,
            total = videos.len(),
            "Loaded library page"
        );
        if fetched < limit {
            break;
        }
    }

    info!(
        subsystem = "search",
        component = "library",
        result_count = videos.len(),
        "Library loaded"
    );
    Ok(videos)
}

/// Suggestion state for a library screen.
///
/// Call [`invalidate`](Self::invalidate) whenever the video list changes;
/// the index is rebuilt from scratch each time.
pub struct LibrarySearch {
    engine: SuggestionEngine,
    index: TagIndex,
    index_cap: usize,
    max_results: usize,
}

impl Default for LibrarySearch {
    fn default() -> Self {
        Self::new(SuggestionEngine::default())
    }
}

impl LibrarySearch {
    pub fn new(engine: SuggestionEngine) -> Self {
        Self {
            engine,
            index: TagIndex::new(),
            index_cap: TAG_INDEX_CAP,
            max_results: SUGGESTION_MAX_RESULTS,
        }
    }

    pub fn with_index_cap(mut self, cap: usize) -> Self {
        self.index_cap = cap;
        self
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    /// Rebuild the tag index from the first videos in `videos`.
    pub fn invalidate(&mut self, videos: &[VideoItem]) {
        self.index = build_tag_index(videos.iter().map(|v| v.name.as_str()), self.index_cap);
    }

    pub fn index(&self) -> &TagIndex {
        &self.index
    }

    pub fn engine(&self) -> &SuggestionEngine {
        &self.engine
    }

    pub fn suggestions(&self, query: &str) -> Vec<String> {
        self.engine.suggest(query, &self.index, self.max_results)
    }
}
