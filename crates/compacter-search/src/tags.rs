//! Tag extraction from video display names, and the tag index built from them.
//!
//! A display name like `"ABC-123 東京旅行 review.mp4"` yields:
//! - the whole name (when at most 80 characters)
//! - CJK runs of 2-16 characters (`東京旅行`)
//! - Latin tokens of 2-16 characters starting with a letter (`ABC`, `review`, `mp4`)
//! - product codes `<letters>-<digits>` plus their letter prefix (`ABC-123`, `ABC`)

use std::collections::{BTreeSet, HashSet};

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use compacter_core::defaults::{
    TAG_INDEX_CAP, TAG_TOKEN_MAX_CHARS, TAG_TOKEN_MIN_CHARS, TAG_WHOLE_NAME_MAX_CHARS,
};

static CJK_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[\x{4E00}-\x{9FFF}\x{3040}-\x{309F}\x{30A0}-\x{30FF}\x{FF66}-\x{FF9D}]+")
        .expect("valid CJK token pattern")
});

static LATIN_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Za-z][A-Za-z0-9]{1,15}").expect("valid Latin token pattern"));

static PRODUCT_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([A-Za-z]+)-([0-9]+)").expect("valid product code pattern"));

static PRODUCT_CODE_EXACT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z]+-[0-9]+$").expect("valid product code pattern"));

fn token_len_ok(token: &str) -> bool {
    (TAG_TOKEN_MIN_CHARS..=TAG_TOKEN_MAX_CHARS).contains(&token.chars().count())
}

/// Extract search tags from one display name.
///
/// Deterministic and total: names without matching tokens simply yield
/// fewer tags (an empty name yields just `""`).
///
/// # Examples
///
/// ```
/// use compacter_search::tags::extract_tags;
///
/// let tags = extract_tags("ABC-123 review");
/// assert!(tags.contains("ABC-123 review"));
/// assert!(tags.contains("ABC-123"));
/// assert!(tags.contains("ABC"));
/// assert!(tags.contains("review"));
/// ```
pub fn extract_tags(name: &str) -> BTreeSet<String> {
    let mut tags = BTreeSet::new();

    if name.chars().count() <= TAG_WHOLE_NAME_MAX_CHARS {
        tags.insert(name.to_string());
    }

    for m in CJK_TOKEN.find_iter(name) {
        if token_len_ok(m.as_str()) {
            tags.insert(m.as_str().to_string());
        }
    }

    for m in LATIN_TOKEN.find_iter(name) {
        if token_len_ok(m.as_str()) {
            tags.insert(m.as_str().to_string());
        }
    }

    for caps in PRODUCT_CODE.captures_iter(name) {
        tags.insert(caps[0].to_string());
        tags.insert(caps[1].to_string());
    }

    tags
}

/// Whether a tag looks like a product/catalog code.
///
/// True for an exact `<letters>-<digits>` match, or for 2-6 characters that
/// are all alphabetic.
pub fn is_code_like(text: &str) -> bool {
    if PRODUCT_CODE_EXACT.is_match(text) {
        return true;
    }
    let len = text.chars().count();
    (2..=6).contains(&len) && text.chars().all(char::is_alphabetic)
}

/// Unique tags in first-seen order.
///
/// Insertion order is kept so that scans with an early exit see the same
/// tags every time.
#[derive(Debug, Clone, Default)]
pub struct TagIndex {
    tags: Vec<String>,
    seen: HashSet<String>,
}

impl TagIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a tag; returns false if it was already present.
    pub fn insert(&mut self, tag: String) -> bool {
        if self.seen.contains(&tag) {
            return false;
        }
        self.seen.insert(tag.clone());
        self.tags.push(tag);
        true
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.seen.contains(tag)
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for TagIndex {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut index = TagIndex::new();
        for tag in iter {
            index.insert(tag.into());
        }
        index
    }
}

/// Build a tag index from the first `cap` display names.
///
/// Rebuilt wholesale on every call; there is no incremental update.
pub fn build_tag_index<I, S>(display_names: I, cap: usize) -> TagIndex
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut index = TagIndex::new();
    let mut names = 0usize;
    for name in display_names.into_iter().take(cap) {
        names += 1;
        for tag in extract_tags(name.as_ref()) {
            index.insert(tag);
        }
    }
    debug!(
        subsystem = "search",
        component = "tag_index",
        names,
        tag_count = index.len(),
        "Built tag index"
    );
    index
}

/// [`build_tag_index`] with the default cap of 600 names.
pub fn build_default_tag_index<I, S>(display_names: I) -> TagIndex
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    build_tag_index(display_names, TAG_INDEX_CAP)
}
