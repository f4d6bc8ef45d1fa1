//! # compacter-search
//!
//! Search suggestions for a video library.
//!
//! This crate provides:
//! - Tag extraction from display names (titles, CJK runs, Latin tokens, product codes)
//! - Text normalization with a bounded LRU cache
//! - Ranked prefix/substring suggestions over an insertion-ordered tag index
//! - Library filtering, sorting and paged loading
//!
//! ## Example
//!
//! ```
//! use compacter_search::{build_default_tag_index, SuggestionEngine};
//!
//! let index = build_default_tag_index(["ABC-123 review", "Alpine hike"]);
//! let engine = SuggestionEngine::default();
//!
//! let suggestions = engine.suggest("abc", &index, 10);
//! assert_eq!(suggestions[0], "ABC");
//! ```

pub mod library;
pub mod normalize;
pub mod suggest;
pub mod tags;

pub use library::{filter_videos, load_library, sort_videos, visible_videos, LibrarySearch};
pub use normalize::{is_cjk, normalize, NormalizationCache};
pub use suggest::{SearchTag, SuggestionConfig, SuggestionEngine};
pub use tags::{build_default_tag_index, build_tag_index, extract_tags, is_code_like, TagIndex};
