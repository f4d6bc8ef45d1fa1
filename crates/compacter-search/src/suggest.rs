//! Ranked search suggestions over a [`TagIndex`].
//!
//! ## Scoring
//!
//! Lower is better; the first rule that holds wins.
//!
//! | Score | Rule |
//! |-------|------|
//! | 0 | raw tag starts with raw query, ignoring case |
//! | 1 | normalized tag starts with normalized query |
//! | 2 | code-like tag and rule 1 holds (shadowed by rule 1, never returned) |
//! | 3 | normalized tag contains normalized query |
//! | 4 | code-like tag and rule 3 holds (shadowed by rule 3, never returned) |
//! | 99 | no match |
//!
//! Rules 2 and 4 are kept in their positions so the rule table stays stable
//! if code-like matching is ever given its own condition.
//!
//! ## Ranking
//!
//! Matches are collected in index order until 200 candidates are found,
//! then sorted by (score, length, case-folded text), deduplicated, and
//! truncated.

use std::cmp::Ordering;
use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{field, trace, trace_span};

use compacter_core::defaults::{
    SUGGESTION_MAX_RESULTS, SUGGESTION_MAX_SCORE, SUGGESTION_NO_MATCH, SUGGESTION_SCAN_LIMIT,
};
use compacter_core::logging;

use crate::normalize::NormalizationCache;
use crate::tags::{is_code_like, TagIndex};

/// Configuration for suggestion generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestionConfig {
    /// Stop scanning after this many matching candidates
    pub scan_limit: usize,
    /// Highest score still counted as a match
    pub max_score: u8,
    /// Normalization cache capacity
    pub cache_capacity: usize,
}

impl Default for SuggestionConfig {
    fn default() -> Self {
        Self {
            scan_limit: SUGGESTION_SCAN_LIMIT,
            max_score: SUGGESTION_MAX_SCORE,
            cache_capacity: compacter_core::defaults::NORMALIZATION_CACHE_CAPACITY,
        }
    }
}

/// A scored candidate during ranking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTag {
    pub text: String,
    pub score: u8,
    pub is_code: bool,
    char_len: usize,
    folded: String,
}

impl SearchTag {
    pub fn new(text: &str, score: u8) -> Self {
        Self {
            text: text.to_string(),
            score,
            is_code: is_code_like(text),
            char_len: text.chars().count(),
            folded: text.to_lowercase(),
        }
    }

    fn rank_cmp(&self, other: &Self) -> Ordering {
        self.score
            .cmp(&other.score)
            .then(self.char_len.cmp(&other.char_len))
            .then_with(|| self.folded.cmp(&other.folded))
    }
}

/// Suggestion engine owning its normalization cache.
///
/// `Send + Sync`; one instance can serve concurrent callers.
pub struct SuggestionEngine {
    config: SuggestionConfig,
    cache: NormalizationCache,
}

impl Default for SuggestionEngine {
    fn default() -> Self {
        Self::new(SuggestionConfig::default())
    }
}

impl SuggestionEngine {
    pub fn new(config: SuggestionConfig) -> Self {
        let cache = NormalizationCache::new(config.cache_capacity);
        Self { config, cache }
    }

    pub fn config(&self) -> &SuggestionConfig {
        &self.config
    }

    pub fn cache(&self) -> &NormalizationCache {
        &self.cache
    }

    /// Normalize through the engine's cache.
    pub fn normalize(&self, text: &str) -> String {
        self.cache.normalize(text)
    }

    /// Up to `max_results` tags matching `query`, best first.
    ///
    /// # Examples
    ///
    /// ```
    /// use compacter_search::{SuggestionEngine, TagIndex};
    ///
    /// let engine = SuggestionEngine::default();
    /// let index: TagIndex = ["Apple", "app", "Application", "banana"].into_iter().collect();
    /// assert_eq!(engine.suggest("app", &index, 10), vec!["app", "Apple", "Application"]);
    /// assert!(engine.suggest("", &index, 10).is_empty());
    /// ```
    pub fn suggest(&self, query: &str, index: &TagIndex, max_results: usize) -> Vec<String> {
        if query.is_empty() {
            return Vec::new();
        }

        let span = trace_span!(
            "suggest",
            subsystem = "search",
            query = %query,
            tag_count = index.len(),
            result_count = field::Empty
        );
        let _enter = span.enter();

        let normalized_query = self.cache.normalize(query);

        let mut candidates = Vec::new();
        for tag in index.iter() {
            let score = self.score(query, &normalized_query, tag);
            if score <= self.config.max_score {
                trace!(tag, score, "candidate");
                candidates.push(SearchTag::new(tag, score));
                if candidates.len() >= self.config.scan_limit {
                    break;
                }
            }
        }

        candidates.sort_by(SearchTag::rank_cmp);

        let mut seen = HashSet::new();
        let results: Vec<String> = candidates
            .into_iter()
            .filter(|c| seen.insert(c.text.clone()))
            .take(max_results)
            .map(|c| c.text)
            .collect();

        span.record(logging::RESULT_COUNT, results.len());
        results
    }

    /// [`suggest`](Self::suggest) with the default limit of 10.
    pub fn suggest_default(&self, query: &str, index: &TagIndex) -> Vec<String> {
        self.suggest(query, index, SUGGESTION_MAX_RESULTS)
    }

    /// Score one tag against a query; see the module docs for the rules.
    pub fn score(&self, query: &str, normalized_query: &str, tag: &str) -> u8 {
        let normalized_tag = self.cache.normalize(tag);
        let is_code = is_code_like(tag);

        if starts_with_ignore_case(tag, query) {
            return 0;
        }
        if normalized_tag.starts_with(normalized_query) {
            return 1;
        }
        if is_code && normalized_tag.starts_with(normalized_query) {
            return 2;
        }
        if normalized_tag.contains(normalized_query) {
            return 3;
        }
        if is_code && normalized_tag.contains(normalized_query) {
            return 4;
        }
        SUGGESTION_NO_MATCH
    }
}

/// Char-wise prefix test that treats upper and lower case as equal.
fn starts_with_ignore_case(text: &str, prefix: &str) -> bool {
    let mut text_chars = text.chars();
    prefix.chars().all(|p| match text_chars.next() {
        Some(t) => chars_eq_ignore_case(t, p),
        None => false,
    })
}

fn chars_eq_ignore_case(a: char, b: char) -> bool {
    a == b || a.to_uppercase().eq(b.to_uppercase()) || a.to_lowercase().eq(b.to_lowercase())
}
