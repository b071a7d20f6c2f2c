//! MDX file scanning.
//!
//! Walks a content type's directories (base plus locale subdirectories),
//! parses frontmatter, and derives slug/locale/date from filename and
//! fields. A file that fails to parse is reported as skipped with a
//! reason; it never aborts the scan.

use chrono::NaiveDate;
use miette::Diagnostic;
use regex::Regex;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use thiserror::Error;

use crate::content_type::ContentTypeSpec;
use crate::mdx::MdxDocument;

use super::locale::{DEFAULT_LOCALE, VariantSource, normalize_locale};

/// Errors that abort a directory scan (I/O only; per-file parse problems
/// are collected as skips instead).
#[derive(Error, Diagnostic, Debug)]
pub enum ScanError {
    #[error("Failed to read directory {path}: {source}")]
    #[diagnostic(code(mdxsync::scan::read_dir))]
    ReadDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to read file {path}: {source}")]
    #[diagnostic(code(mdxsync::scan::read_file))]
    ReadFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// A parsed MDX file with its derived identity.
#[derive(Debug, Clone)]
pub struct MdxFile {
    pub path: PathBuf,
    pub name: String,
    /// Resolved slug: frontmatter `slug` if present, else derived from the
    /// filename with date prefix and locale suffix stripped.
    pub slug: String,
    /// Locale suffix taken from the filename, un-normalized.
    pub filename_locale: Option<String>,
    /// Resolved, normalized locale (filename suffix, then frontmatter
    /// `lang`, then the directory's locale, then the default).
    pub locale: String,
    pub date: Option<NaiveDate>,
    pub doc: MdxDocument,
}

impl MdxFile {
    pub fn is_base_locale(&self) -> bool {
        self.locale == DEFAULT_LOCALE
    }

    pub fn title(&self) -> Option<&str> {
        self.doc.frontmatter.str_field("title")
    }
}

impl VariantSource for MdxFile {
    fn slug(&self) -> &str {
        &self.slug
    }

    /// Explicit cross-reference: a `contentId` field, or the base-locale
    /// entry of the `translations` map.
    fn content_id(&self) -> Option<&str> {
        if let Some(id) = self.doc.frontmatter.str_field("contentId") {
            return Some(id);
        }
        self.doc
            .frontmatter
            .get("translations")
            .and_then(|v| v.as_map())
            .and_then(|entries| {
                entries
                    .iter()
                    .find(|(k, _)| k == DEFAULT_LOCALE)
                    .map(|(_, v)| v.as_str())
            })
    }

    fn document_id(&self) -> Option<&str> {
        self.doc.frontmatter.str_field("documentId")
    }
}

/// A file the scanner could not use, with the reason.
#[derive(Debug)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

/// Result of scanning one or more directories.
#[derive(Debug, Default)]
pub struct ScanOutcome {
    pub files: Vec<MdxFile>,
    pub skipped: Vec<SkippedFile>,
}

impl ScanOutcome {
    fn merge(&mut self, other: ScanOutcome) {
        self.files.extend(other.files);
        self.skipped.extend(other.skipped);
    }
}

fn date_prefix_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d{4}-\d{2}-\d{2})-(.*)$").unwrap())
}

fn locale_suffix_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\.([a-z]{2}(-[A-Z]{2})?)\.mdx$").unwrap())
}

fn locale_dir_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-z]{2}(-[A-Z]{2})?$").unwrap())
}

/// Pull the locale suffix out of a filename, e.g. `post.es.mdx` → `es`.
pub fn filename_locale(name: &str) -> Option<String> {
    locale_suffix_re()
        .captures(name)
        .map(|c| c[1].to_string())
}

/// Derive (date, slug) from a filename, stripping the date prefix and the
/// locale suffix: `2024-01-15-hello.fr.mdx` → (2024-01-15, `hello`).
pub fn filename_parts(name: &str) -> (Option<NaiveDate>, String) {
    let without_locale = locale_suffix_re().replace(name, ".mdx").into_owned();
    let stem = without_locale
        .strip_suffix(".mdx")
        .unwrap_or(&without_locale);

    match date_prefix_re().captures(stem) {
        Some(captures) => {
            let date = captures[1].parse().ok();
            (date, captures[2].to_string())
        }
        None => (None, stem.to_string()),
    }
}

/// Scan a single directory (non-recursive) of `.mdx` files.
///
/// `dir_locale` is the locale implied by the directory location, used
/// when neither filename nor frontmatter carries one. A missing directory
/// scans as empty.
pub fn scan_dir(dir: &Path, dir_locale: Option<&str>) -> Result<ScanOutcome, ScanError> {
    let mut outcome = ScanOutcome::default();

    if !dir.exists() {
        return Ok(outcome);
    }

    let entries = std::fs::read_dir(dir).map_err(|e| ScanError::ReadDir {
        path: dir.to_path_buf(),
        source: e,
    })?;

    for entry in entries {
        let entry = entry.map_err(|e| ScanError::ReadDir {
            path: dir.to_path_buf(),
            source: e,
        })?;
        let path = entry.path();
        if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some("mdx") {
            continue;
        }

        let text = std::fs::read_to_string(&path).map_err(|e| ScanError::ReadFile {
            path: path.clone(),
            source: e,
        })?;

        let name = entry.file_name().to_string_lossy().to_string();
        match MdxDocument::parse(&text) {
            Ok(doc) => outcome.files.push(build_file(path, name, doc, dir_locale)),
            Err(e) => outcome.skipped.push(SkippedFile {
                path,
                reason: e.to_string(),
            }),
        }
    }

    // Deterministic order regardless of directory iteration order.
    outcome.files.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(outcome)
}

fn build_file(path: PathBuf, name: String, doc: MdxDocument, dir_locale: Option<&str>) -> MdxFile {
    let filename_locale = filename_locale(&name);
    let (filename_date, filename_slug) = filename_parts(&name);

    let slug = doc
        .frontmatter
        .str_field("slug")
        .map(String::from)
        .unwrap_or(filename_slug);

    let locale = filename_locale
        .as_deref()
        .or_else(|| doc.frontmatter.str_field("lang"))
        .or(dir_locale)
        .map(normalize_locale)
        .unwrap_or_else(|| DEFAULT_LOCALE.to_string());

    let date = filename_date.or_else(|| {
        doc.frontmatter
            .str_field("date")
            .and_then(|d| d.parse().ok())
    });

    MdxFile {
        path,
        name,
        slug,
        filename_locale,
        locale,
        date,
        doc,
    }
}

/// Scan all directories belonging to a content type: the base directory
/// plus, for localized types, every locale subdirectory of the content
/// root that contains the type's directory.
pub fn scan_content_type(root: &Path, spec: &ContentTypeSpec) -> Result<ScanOutcome, ScanError> {
    let mut outcome = scan_dir(&spec.content_dir(root), None)?;

    if spec.localized && root.exists() {
        let entries = std::fs::read_dir(root).map_err(|e| ScanError::ReadDir {
            path: root.to_path_buf(),
            source: e,
        })?;

        let mut locale_dirs: Vec<(String, PathBuf)> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_dir())
            .filter_map(|entry| {
                let name = entry.file_name().to_string_lossy().to_string();
                locale_dir_re()
                    .is_match(&name)
                    .then(|| (name.clone(), entry.path().join(spec.dir)))
            })
            .collect();
        locale_dirs.sort();

        for (locale, dir) in locale_dirs {
            outcome.merge(scan_dir(&dir, Some(&locale))?);
        }
    }

    Ok(outcome)
}
