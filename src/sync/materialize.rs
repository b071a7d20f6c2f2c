//! On-disk path computation and file writes.
//!
//! Deterministic mapping from (content type, locale, slug, date) to a
//! relative path, plus idempotent write/delete. Writes are plain
//! overwrites: the git publisher is the durability boundary, content is
//! only live once committed and pushed.

use chrono::NaiveDate;
use std::io;
use std::path::{Path, PathBuf};

use crate::content_type::ContentTypeSpec;

use super::locale::{is_default_locale, normalize_locale};

/// Filename for a record: `[<date>-]<slug>[.<locale>].mdx`.
///
/// The date prefix applies only to dated types; the locale suffix only to
/// non-default locales. Slugs are sanitized for the filesystem.
pub fn file_name(
    spec: &ContentTypeSpec,
    slug: &str,
    locale: &str,
    date: Option<NaiveDate>,
) -> String {
    let slug = sanitize_filename::sanitize(slug);
    let prefix = match date {
        Some(date) if spec.dated => format!("{}-", date.format("%Y-%m-%d")),
        _ => String::new(),
    };
    let suffix = if is_default_locale(locale) {
        String::new()
    } else {
        format!(".{}", normalize_locale(locale))
    };
    format!("{}{}{}.mdx", prefix, slug, suffix)
}

/// Relative path for a record under the content root.
///
/// Default locale lives in `<root>/<typeDir>/`; other locales in
/// `<root>/<locale>/<typeDir>/` with the locale normalized to its primary
/// subtag.
pub fn path_for(
    root: &Path,
    spec: &ContentTypeSpec,
    locale: &str,
    slug: &str,
    date: Option<NaiveDate>,
) -> PathBuf {
    let dir = if is_default_locale(locale) {
        spec.content_dir(root)
    } else {
        spec.locale_dir(root, &normalize_locale(locale))
    };
    dir.join(file_name(spec, slug, locale, date))
}

/// Write a file, creating parent directories as needed.
pub fn write(path: &Path, content: &str) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content)
}

/// Delete a file if present. Returns whether anything was removed;
/// an absent file is not an error.
pub fn delete(path: &Path) -> io::Result<bool> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}
