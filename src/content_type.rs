//! Content type registry.
//!
//! Each synced content type maps a directory of MDX files to a CMS
//! collection. The registry is the single source of truth for directory
//! names, filename shape, and which types carry locale variants.

use std::env;
use std::path::{Path, PathBuf};

/// A syncable content type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentTypeSpec {
    /// CLI key, e.g. `blog`.
    pub key: &'static str,
    /// CMS collection api id, e.g. `blog-posts`.
    pub api_id: &'static str,
    /// Directory name under the content root.
    pub dir: &'static str,
    /// Environment variable overriding the directory.
    pub dir_env: &'static str,
    /// Filenames carry a `YYYY-MM-DD-` prefix.
    pub dated: bool,
    /// The type has locale variants in `<root>/<locale>/<dir>/`.
    pub localized: bool,
}

/// All registered content types, in sync order.
pub const CONTENT_TYPES: &[ContentTypeSpec] = &[
    ContentTypeSpec {
        key: "blog",
        api_id: "blog-posts",
        dir: "blog",
        dir_env: "MDXSYNC_BLOG_DIR",
        dated: true,
        localized: true,
    },
    ContentTypeSpec {
        key: "events",
        api_id: "news-events",
        dir: "events",
        dir_env: "MDXSYNC_EVENTS_DIR",
        dated: false,
        localized: false,
    },
    ContentTypeSpec {
        key: "press",
        api_id: "press-items",
        dir: "press",
        dir_env: "MDXSYNC_PRESS_DIR",
        dated: false,
        localized: false,
    },
];

/// Look up a content type by its CLI key.
pub fn find(key: &str) -> Option<&'static ContentTypeSpec> {
    CONTENT_TYPES.iter().find(|t| t.key == key)
}

impl ContentTypeSpec {
    /// Base-locale content directory for this type.
    ///
    /// The env override replaces the whole path; otherwise the directory
    /// lives directly under the content root.
    pub fn content_dir(&self, root: &Path) -> PathBuf {
        match env::var(self.dir_env) {
            Ok(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => root.join(self.dir),
        }
    }

    /// Content directory for a (normalized) non-default locale.
    pub fn locale_dir(&self, root: &Path, locale: &str) -> PathBuf {
        root.join(locale).join(self.dir)
    }
}
