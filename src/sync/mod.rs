//! Content synchronization between the MDX tree, the CMS, and git.
//!
//! Scanning and path computation are pure; the orchestrators take
//! explicit CMS and git handles so everything is testable without a
//! running CMS.

mod export;
mod git;
mod import;
mod locale;
mod materialize;
mod reconcile;
mod scanner;

pub use export::{ExportOptions, ExportSummary, export_translations};
pub use git::{GitError, GitOps, PublishOutcome, Publisher, RealGit};
pub use import::{ImportOptions, ImportSummary, import_translations};
pub use locale::{
    DEFAULT_LOCALE, FALLBACK_LOCALES, Resolution, Strategy, VariantSource, is_default_locale,
    normalize_locale, resolve_base, unique_slug,
};
pub use materialize::{delete, file_name, path_for, write};
pub use reconcile::{SyncError, SyncOptions, SyncSummary, sync_all, sync_content_type};
pub use scanner::{
    MdxFile, ScanError, ScanOutcome, SkippedFile, filename_locale, filename_parts, scan_content_type,
    scan_dir,
};
