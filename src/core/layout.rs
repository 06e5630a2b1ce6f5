//! Canonical path resolution.
//!
//! `PathResolver::resolve` is a pure function from item metadata and
//! layout policy to a relative destination path. It never touches the
//! filesystem; the canonical store appends the adapter-chosen audio
//! extension when it places the files.
//!
//! File stems always carry the item id suffix (`Title.{id}`), so two
//! distinct ids can never resolve to the same canonical path even when
//! their sanitized titles collide.

use std::path::PathBuf;

use crate::domain::{Item, LayoutPolicy};

/// Default cap on the length of a single path segment
pub const DEFAULT_MAX_SEGMENT_LEN: usize = 150;

/// Folder for hierarchical items that have an artist but no album
const SINGLES_DIR: &str = "singles";

/// Folder for hierarchical items with neither artist nor album
const UNSORTED_DIR: &str = "_singles";

/// Maps item metadata to a relative destination path under the
/// output root.
#[derive(Debug, Clone, Copy)]
pub struct PathResolver {
    policy: LayoutPolicy,
    max_segment_len: usize,
}

impl PathResolver {
    pub fn new(policy: LayoutPolicy) -> Self {
        Self {
            policy,
            max_segment_len: DEFAULT_MAX_SEGMENT_LEN,
        }
    }

    /// Override the per-segment length cap
    pub fn with_max_segment_len(mut self, max_segment_len: usize) -> Self {
        // The id suffix must always fit
        self.max_segment_len = max_segment_len.max(16);
        self
    }

    pub fn policy(&self) -> LayoutPolicy {
        self.policy
    }

    /// Resolve the relative path stem for an item (no extension).
    ///
    /// Rules, in order:
    /// - `Flat`: `Title.{id}` directly under the root, no subfolders.
    /// - `Hierarchical`, artist and album known: `Artist/Album/Title.{id}`.
    /// - `Hierarchical`, artist only: `Artist/singles/Title.{id}`.
    /// - `Hierarchical`, neither: `_singles/Title.{id}`.
    pub fn resolve(&self, item: &Item) -> PathBuf {
        let stem = self.file_stem(item);

        match self.policy {
            LayoutPolicy::Flat => PathBuf::from(stem),
            LayoutPolicy::Hierarchical => match (&item.artist, &item.album) {
                (Some(artist), Some(album)) => [
                    self.sanitize_segment(artist),
                    self.sanitize_segment(album),
                    stem,
                ]
                .iter()
                .collect(),
                (Some(artist), None) => [
                    self.sanitize_segment(artist),
                    SINGLES_DIR.to_string(),
                    stem,
                ]
                .iter()
                .collect(),
                (None, _) => [UNSORTED_DIR.to_string(), stem].iter().collect(),
            },
        }
    }

    /// File stem: sanitized title plus the disambiguating id suffix.
    /// The id goes through the sanitizer too, so a hostile id cannot
    /// smuggle a path separator into the stem.
    fn file_stem(&self, item: &Item) -> String {
        format!(
            "{}.{}",
            self.sanitize_segment(&item.title),
            self.sanitize_segment(&item.id)
        )
    }

    /// Sanitize one path segment.
    ///
    /// Replaces path separators, characters illegal on common
    /// filesystems, and control characters with `_`; strips trailing
    /// dots and whitespace; truncates to the segment cap. An empty
    /// result falls back to `_`.
    pub fn sanitize_segment(&self, segment: &str) -> String {
        let mut out: String = segment
            .chars()
            .map(|c| match c {
                '/' | '\\' | '<' | '>' | ':' | '"' | '|' | '?' | '*' => '_',
                c if c.is_control() => '_',
                c => c,
            })
            .collect();

        out.truncate(floor_char_boundary(&out, self.max_segment_len));

        let out = out.trim().trim_end_matches(['.', ' ']).to_string();
        if out.is_empty() {
            "_".to_string()
        } else {
            out
        }
    }
}

/// Largest index <= `max` that is a char boundary of `s`
fn floor_char_boundary(s: &str, max: usize) -> usize {
    if max >= s.len() {
        return s.len();
    }
    let mut idx = max;
    while !s.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Item;

    fn full_item() -> Item {
        Item::new("abc123", "Song", "https://example.com/watch?v=abc123")
            .with_artist("Band")
            .with_album("LP")
    }

    #[test]
    fn test_hierarchical_artist_and_album() {
        let resolver = PathResolver::new(LayoutPolicy::Hierarchical);
        assert_eq!(
            resolver.resolve(&full_item()),
            PathBuf::from("Band/LP/Song.abc123")
        );
    }

    #[test]
    fn test_hierarchical_artist_only() {
        let resolver = PathResolver::new(LayoutPolicy::Hierarchical);
        let item = Item::new("abc123", "Song", "url").with_artist("Band");
        assert_eq!(
            resolver.resolve(&item),
            PathBuf::from("Band/singles/Song.abc123")
        );
    }

    #[test]
    fn test_hierarchical_no_metadata() {
        let resolver = PathResolver::new(LayoutPolicy::Hierarchical);
        let item = Item::new("abc123", "Song", "url");
        assert_eq!(
            resolver.resolve(&item),
            PathBuf::from("_singles/Song.abc123")
        );
    }

    #[test]
    fn test_hierarchical_album_without_artist_is_unsorted() {
        let resolver = PathResolver::new(LayoutPolicy::Hierarchical);
        let item = Item::new("abc123", "Song", "url").with_album("LP");
        assert_eq!(
            resolver.resolve(&item),
            PathBuf::from("_singles/Song.abc123")
        );
    }

    #[test]
    fn test_flat_ignores_metadata() {
        let resolver = PathResolver::new(LayoutPolicy::Flat);
        assert_eq!(resolver.resolve(&full_item()), PathBuf::from("Song.abc123"));
    }

    #[test]
    fn test_resolve_is_deterministic() {
        let resolver = PathResolver::new(LayoutPolicy::Hierarchical);
        let item = full_item();
        assert_eq!(resolver.resolve(&item), resolver.resolve(&item));
    }

    #[test]
    fn test_colliding_titles_resolve_differently() {
        let resolver = PathResolver::new(LayoutPolicy::Flat);
        let a = Item::new("id-one", "Same Title", "url1");
        let b = Item::new("id-two", "Same Title", "url2");
        assert_ne!(resolver.resolve(&a), resolver.resolve(&b));
    }

    #[test]
    fn test_id_with_separator_cannot_escape() {
        let resolver = PathResolver::new(LayoutPolicy::Flat);
        let item = Item::new("../evil", "Song", "url");
        let path = resolver.resolve(&item);
        assert_eq!(path.components().count(), 1);
        assert_eq!(path, PathBuf::from("Song..._evil"));
    }

    #[test]
    fn test_sanitize_illegal_characters() {
        let resolver = PathResolver::new(LayoutPolicy::Flat);
        assert_eq!(
            resolver.sanitize_segment("AC/DC: Back in <Black>?"),
            "AC_DC_ Back in _Black__"
        );
    }

    #[test]
    fn test_sanitize_strips_trailing_dots_and_spaces() {
        let resolver = PathResolver::new(LayoutPolicy::Flat);
        assert_eq!(resolver.sanitize_segment("ends with dots... "), "ends with dots");
    }

    #[test]
    fn test_sanitize_control_characters() {
        let resolver = PathResolver::new(LayoutPolicy::Flat);
        assert_eq!(resolver.sanitize_segment("tab\there"), "tab_here");
    }

    #[test]
    fn test_sanitize_empty_falls_back() {
        let resolver = PathResolver::new(LayoutPolicy::Flat);
        assert_eq!(resolver.sanitize_segment("..."), "_");
        assert_eq!(resolver.sanitize_segment(""), "_");
    }

    #[test]
    fn test_truncation_keeps_id_distinct() {
        let resolver = PathResolver::new(LayoutPolicy::Flat).with_max_segment_len(20);
        let long = "x".repeat(200);
        let a = Item::new("id-one", long.clone(), "url1");
        let b = Item::new("id-two", long, "url2");

        let pa = resolver.resolve(&a);
        let pb = resolver.resolve(&b);
        assert_ne!(pa, pb);
        assert!(pa.to_str().unwrap().len() < 40);
    }

    #[test]
    fn test_truncation_respects_char_boundaries() {
        let resolver = PathResolver::new(LayoutPolicy::Flat).with_max_segment_len(16);
        let item = Item::new("id", "日本語のタイトルがとても長いです", "url");
        // Must not panic on a multi-byte boundary
        let path = resolver.resolve(&item);
        assert!(path.to_str().is_some());
    }
}
