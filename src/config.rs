//! Runtime configuration from environment variables.
//!
//! Everything is overridable for local development; the defaults match the
//! layout of the content repository this tool runs inside.

use std::env;
use std::path::PathBuf;

/// Default CMS base URL when `MDXSYNC_CMS_URL` is not set.
pub const DEFAULT_CMS_URL: &str = "http://localhost:1337";

/// Tool-wide configuration, resolved once at startup and passed explicitly
/// into the sync functions.
#[derive(Debug, Clone)]
pub struct Config {
    /// CMS base URL, e.g. `http://localhost:1337`.
    pub cms_url: String,
    /// Bearer token for the CMS API. Mutating commands require it.
    pub cms_token: Option<String>,
    /// Root of the MDX content tree, e.g. `src/content`.
    pub content_root: PathBuf,
    /// Directory holding translation exports/imports.
    pub translations_dir: PathBuf,
    /// Media uploads directory, staged alongside every git publish.
    pub uploads_dir: PathBuf,
    /// Base URL prepended to relative media URLs coming from the CMS.
    pub uploads_url: Option<String>,
    /// When true the git publisher reports `Skipped` instead of running git.
    pub git_sync_disabled: bool,
}

impl Config {
    /// Resolve configuration from the environment.
    ///
    /// Priority for the CMS URL:
    /// 1. Explicit `cms_url` parameter (CLI flag)
    /// 2. `MDXSYNC_CMS_URL` environment variable
    /// 3. Default: `http://localhost:1337`
    pub fn from_env(cms_url: Option<String>) -> Self {
        let cms_url = cms_url
            .or_else(|| env::var("MDXSYNC_CMS_URL").ok())
            .unwrap_or_else(|| DEFAULT_CMS_URL.to_string());

        Self {
            cms_url,
            cms_token: env::var("MDXSYNC_CMS_TOKEN").ok().filter(|t| !t.is_empty()),
            content_root: env::var("MDXSYNC_CONTENT_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("src/content")),
            translations_dir: env::var("MDXSYNC_TRANSLATIONS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("exports/translations")),
            uploads_dir: env::var("MDXSYNC_UPLOADS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("public/uploads")),
            uploads_url: env::var("MDXSYNC_UPLOADS_URL").ok().filter(|u| !u.is_empty()),
            git_sync_disabled: env::var("MDXSYNC_DISABLE_GIT")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
        }
    }

    /// Absolute media URL for a CMS-relative upload path.
    pub fn media_url(&self, url: &str) -> String {
        if url.starts_with("http") {
            return url.to_string();
        }
        let base = self.uploads_url.as_deref().unwrap_or(&self.cms_url);
        format!("{}{}", base.trim_end_matches('/'), url)
    }
}
