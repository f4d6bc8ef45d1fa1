//! Text normalization for fuzzy matching, with a bounded LRU cache.
//!
//! Normalized form: lowercase, keeping only ASCII `[a-z0-9]` and CJK
//! characters (Han, Hiragana, Katakana, half-width Katakana). Everything
//! else (spaces, punctuation, accents, other scripts) is dropped.

use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard};

use lru::LruCache;
use tracing::trace;

use compacter_core::defaults::NORMALIZATION_CACHE_CAPACITY;

/// Whether `ch` falls in one of the CJK ranges used for tagging.
///
/// Covers U+4E00–U+9FFF (CJK unified ideographs), U+3040–U+309F
/// (Hiragana), U+30A0–U+30FF (Katakana) and U+FF66–U+FF9D (half-width
/// Katakana). Hangul is not included.
pub fn is_cjk(ch: char) -> bool {
    matches!(
        ch,
        '\u{4E00}'..='\u{9FFF}'
            | '\u{3040}'..='\u{309F}'
            | '\u{30A0}'..='\u{30FF}'
            | '\u{FF66}'..='\u{FF9D}'
    )
}

/// Normalize text without caching.
///
/// # Examples
///
/// ```
/// use compacter_search::normalize::normalize;
///
/// assert_eq!(normalize("ABC-123 Review!"), "abc123review");
/// assert_eq!(normalize("東京 Trip"), "東京trip");
/// ```
pub fn normalize(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || is_cjk(*c))
        .collect()
}

/// Bounded, thread-safe LRU cache in front of [`normalize`].
///
/// A miss only costs recomputation; cached and uncached results are always
/// identical.
pub struct NormalizationCache {
    entries: Mutex<LruCache<String, String>>,
}

impl Default for NormalizationCache {
    fn default() -> Self {
        Self::new(NORMALIZATION_CACHE_CAPACITY)
    }
}

impl NormalizationCache {
    /// Create a cache holding up to `capacity` entries (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Normalized form of `text`, from cache when present.
    pub fn normalize(&self, text: &str) -> String {
        if let Some(hit) = self.lock().get(text) {
            trace!(component = "normalization_cache", "hit");
            return hit.clone();
        }

        let normalized = normalize(text);
        self.lock().put(text.to_string(), normalized.clone());
        normalized
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.lock().cap().get()
    }

    pub fn contains(&self, text: &str) -> bool {
        self.lock().contains(text)
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    // A panic while holding the lock cannot leave a half-written entry, so
    // a poisoned cache is still usable.
    fn lock(&self) -> MutexGuard<'_, LruCache<String, String>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
