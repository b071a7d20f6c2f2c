//! Batch reconciliation between the MDX tree and the CMS.
//!
//! One pass per content type, files are authoritative for base-locale
//! records: base files are upserted first, locale-variant files second
//! (linked through the resolver), and base CMS records whose slug was not
//! seen on disk are deleted. Locale-variant CMS records are never
//! auto-deleted; a published variant with no file is materialized to its
//! localized path instead, once its base resolves.
//!
//! A failure on one record increments the error counter and the loop
//! moves on; one bad record never aborts the batch.

use chrono::Utc;
use miette::Diagnostic;
use std::collections::HashSet;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::cms::{CmsApi, CmsError, ContentRecord, RecordData};
use crate::config::Config;
use crate::content_type::ContentTypeSpec;
use crate::mdx::{FieldValue, Frontmatter, MdxDocument, html_to_markdown, markdown_to_html};

use super::git::{GitOps, Publisher};
use super::locale::{is_default_locale, normalize_locale, resolve_base, unique_slug};
use super::materialize;
use super::scanner::{MdxFile, ScanError, scan_content_type};

/// Errors that abort a whole content type's pass (per-record problems are
/// counted in the summary instead).
#[derive(Error, Diagnostic, Debug)]
pub enum SyncError {
    #[error("CMS error: {0}")]
    #[diagnostic(transparent)]
    Cms(#[from] CmsError),

    #[error("Scan error: {0}")]
    #[diagnostic(transparent)]
    Scan(#[from] ScanError),

    #[error("IO error: {0}")]
    #[diagnostic(code(mdxsync::sync::io))]
    Io(#[from] std::io::Error),
}

/// Options for a reconciliation run.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncOptions {
    /// Log intended actions without mutating anything.
    pub dry_run: bool,
}

/// End-of-run counters for one or more content types.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncSummary {
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
    pub unchanged: usize,
    /// Variant files written from CMS records that had none on disk.
    pub materialized: usize,
    pub skipped: usize,
    pub errors: usize,
}

impl SyncSummary {
    pub fn merge(&mut self, other: &SyncSummary) {
        self.created += other.created;
        self.updated += other.updated;
        self.deleted += other.deleted;
        self.unchanged += other.unchanged;
        self.materialized += other.materialized;
        self.skipped += other.skipped;
        self.errors += other.errors;
    }

    /// CMS and filesystem writes performed this run.
    pub fn mutations(&self) -> usize {
        self.created + self.updated + self.deleted + self.materialized
    }

    pub fn has_errors(&self) -> bool {
        self.errors > 0
    }
}

enum Upsert {
    Created(ContentRecord),
    Updated(ContentRecord),
    Unchanged,
}

/// Desired CMS payload for a scanned file. Fields the file does not carry
/// stay unset and are neither sent nor compared.
fn record_data(file: &MdxFile) -> RecordData {
    let fm = &file.doc.frontmatter;
    RecordData {
        title: Some(
            fm.str_field("title")
                .map(String::from)
                .unwrap_or_else(|| file.slug.clone()),
        ),
        description: fm.str_field("description").map(String::from),
        slug: Some(file.slug.clone()),
        date: file
            .date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .or_else(|| fm.str_field("date").map(String::from)),
        content: Some(markdown_to_html(&file.doc.body)),
        lang: Some(file.locale.clone()),
        order: fm.int_field("order"),
        og_image_url: fm.str_field("ogImageUrl").map(String::from),
        publish_date: fm.str_field("publishDate").map(String::from),
        publication: fm.str_field("publication").map(String::from),
        publication_logo: fm.str_field("publicationLogo").map(String::from),
        external_url: fm.str_field("externalUrl").map(String::from),
        featured: fm.bool_field("featured"),
        category: fm.str_field("category").map(String::from),
        ..Default::default()
    }
}

async fn upsert<C: CmsApi>(
    cms: &C,
    api_id: &str,
    existing: Option<&ContentRecord>,
    mut data: RecordData,
    dry_run: bool,
    label: &str,
) -> Result<Upsert, CmsError> {
    match existing {
        Some(record) if data.matches(record) => Ok(Upsert::Unchanged),
        Some(record) => {
            if dry_run {
                info!("[dry-run] would update {}", label);
                return Ok(Upsert::Updated(record.clone()));
            }
            let document_id =
                record
                    .document_id
                    .as_deref()
                    .ok_or_else(|| CmsError::InvalidResponse {
                        message: format!("record {} has no document id", label),
                    })?;
            let updated = cms.update_record(api_id, document_id, &data).await?;
            info!("updated {}", label);
            Ok(Upsert::Updated(updated))
        }
        None => {
            data.published_at = Some(Utc::now().to_rfc3339());
            if dry_run {
                info!("[dry-run] would create {}", label);
                return Ok(Upsert::Created(ContentRecord {
                    slug: data.slug.clone(),
                    lang: data.lang.clone(),
                    date: data.date.clone(),
                    title: data.title.clone(),
                    ..Default::default()
                }));
            }
            let created = cms.create_record(api_id, &data).await?;
            info!("created {}", label);
            Ok(Upsert::Created(created))
        }
    }
}

/// Reconcile one content type.
pub async fn sync_content_type<C: CmsApi, G: GitOps>(
    cms: &C,
    publisher: &Publisher<G>,
    config: &Config,
    spec: &ContentTypeSpec,
    opts: &SyncOptions,
) -> Result<SyncSummary, SyncError> {
    let mut summary = SyncSummary::default();

    // 1. Scan the tree. Malformed files are diagnostics, not batch stops.
    let scan = scan_content_type(&config.content_root, spec)?;
    for skip in &scan.skipped {
        warn!("skipping {}: {}", skip.path.display(), skip.reason);
        summary.errors += 1;
    }
    info!(
        "{}: {} files on disk ({} skipped)",
        spec.key,
        scan.files.len(),
        scan.skipped.len()
    );

    // 2. Fetch the CMS side across all locales.
    let records = cms.list_records(spec.api_id, &[]).await?;
    let (mut bases, variants): (Vec<ContentRecord>, Vec<ContentRecord>) = records
        .into_iter()
        .partition(|r| r.lang.as_deref().is_none_or(is_default_locale));
    info!(
        "{}: {} base and {} variant records in CMS",
        spec.key,
        bases.len(),
        variants.len()
    );

    let (base_files, variant_files): (Vec<&MdxFile>, Vec<&MdxFile>) =
        scan.files.iter().partition(|f| f.is_base_locale());

    // 3. Upsert base records, collecting the observed slug set for the
    // deletion pass.
    let mut seen_slugs: HashSet<String> = HashSet::new();
    for &file in &base_files {
        seen_slugs.insert(file.slug.clone());

        let existing_idx = bases.iter().position(|r| r.slug_str() == file.slug);
        let existing = existing_idx.map(|i| &bases[i]);
        let result = upsert(
            cms,
            spec.api_id,
            existing,
            record_data(file),
            opts.dry_run,
            &format!("{}/{}", spec.key, file.slug),
        )
        .await;

        match result {
            Ok(Upsert::Created(record)) => {
                bases.push(record);
                summary.created += 1;
            }
            Ok(Upsert::Updated(record)) => {
                if let Some(i) = existing_idx {
                    bases[i] = record;
                }
                summary.updated += 1;
            }
            Ok(Upsert::Unchanged) => summary.unchanged += 1,
            Err(e) => {
                error!("error processing {}: {}", file.slug, e);
                summary.errors += 1;
            }
        }
    }

    // 4. Upsert locale-variant files as localizations of their base.
    let mut seen_variants: HashSet<(String, String)> = HashSet::new();
    for &file in &variant_files {
        let mut data = record_data(file);
        let slug = file
            .doc
            .frontmatter
            .str_field("uniqueSlug")
            .map(String::from)
            .unwrap_or_else(|| unique_slug(&file.slug, &file.locale));
        data.slug = Some(slug.clone());

        match resolve_base(file, &bases) {
            Some(resolution) => {
                data.content_id = Some(resolution.base.slug_str().to_string());
                if data.date.is_none() {
                    data.date = resolution.base.date.clone();
                }
            }
            None => {
                warn!(
                    "{}: no base record for variant {} ({}), syncing standalone",
                    spec.key, file.slug, file.locale
                );
            }
        }

        seen_variants.insert((slug.clone(), file.locale.clone()));
        let existing = variants.iter().find(|r| {
            r.slug_str() == slug
                && r.lang.as_deref().map(normalize_locale).as_deref() == Some(file.locale.as_str())
        });

        let result = upsert(
            cms,
            spec.api_id,
            existing,
            data,
            opts.dry_run,
            &format!("{}/{} ({})", spec.key, slug, file.locale),
        )
        .await;

        match result {
            Ok(Upsert::Created(_)) => summary.created += 1,
            Ok(Upsert::Updated(_)) => summary.updated += 1,
            Ok(Upsert::Unchanged) => summary.unchanged += 1,
            Err(e) => {
                error!("error processing {}: {}", slug, e);
                summary.errors += 1;
            }
        }
    }

    // 5. Materialize published CMS variants that have no file. A variant
    // whose base cannot be resolved is skipped; it must never become a
    // new unlinked base file.
    for record in &variants {
        let locale = record
            .lang
            .as_deref()
            .map(normalize_locale)
            .unwrap_or_default();
        if !record.is_published()
            || seen_variants.contains(&(record.slug_str().to_string(), locale.clone()))
        {
            continue;
        }

        match resolve_base(record, &bases) {
            Some(resolution) => {
                let date = resolution
                    .base
                    .date
                    .as_deref()
                    .or(record.date.as_deref())
                    .and_then(|d| d.parse().ok());
                let path = materialize::path_for(
                    &config.content_root,
                    spec,
                    &locale,
                    resolution.base.slug_str(),
                    date,
                );

                if opts.dry_run {
                    info!("[dry-run] would write {}", path.display());
                    summary.materialized += 1;
                    continue;
                }

                let doc = variant_document(record, resolution.base);
                if let Err(e) = materialize::write(&path, &doc.serialize()) {
                    error!("error writing {}: {}", path.display(), e);
                    summary.errors += 1;
                    continue;
                }
                info!("materialized {}", path.display());
                summary.materialized += 1;

                let title = record.title.as_deref().unwrap_or(record.slug_str());
                let message = format!("{}: add \"{}\"", spec.key, title);
                publisher.publish(&path, &message);
            }
            None => {
                warn!(
                    "{}: variant record {} has no file and no resolvable base, skipping",
                    spec.key,
                    record.slug_str()
                );
                summary.skipped += 1;
            }
        }
    }

    // 6. Delete base records not present on disk. Variants are left for
    // manual cleanup so resolver ambiguity can never cascade into data
    // loss.
    for record in &bases {
        let slug = record.slug_str();
        if slug.is_empty() || seen_slugs.contains(slug) {
            continue;
        }
        // Records created this run (dry-run synthetics) have no document id.
        let Some(document_id) = record.document_id.as_deref() else {
            continue;
        };

        if opts.dry_run {
            info!("[dry-run] would delete {}/{}", spec.key, slug);
            summary.deleted += 1;
            continue;
        }
        match cms.delete_record(spec.api_id, document_id).await {
            Ok(()) => {
                info!("deleted {}/{}", spec.key, slug);
                summary.deleted += 1;
            }
            Err(e) => {
                error!("error deleting {}: {}", slug, e);
                summary.errors += 1;
            }
        }
    }

    Ok(summary)
}

/// Reconcile every registered content type; a type whose pass fails
/// outright is counted as one error and the run continues.
pub async fn sync_all<C: CmsApi, G: GitOps>(
    cms: &C,
    publisher: &Publisher<G>,
    config: &Config,
    types: &[ContentTypeSpec],
    opts: &SyncOptions,
) -> SyncSummary {
    let mut summary = SyncSummary::default();
    for spec in types {
        match sync_content_type(cms, publisher, config, spec, opts).await {
            Ok(type_summary) => summary.merge(&type_summary),
            Err(e) => {
                error!("error syncing {}: {}", spec.key, e);
                summary.errors += 1;
            }
        }
    }
    summary
}

/// MDX document for a CMS variant record written to disk.
///
/// Carries the cross-links (`contentId`, `uniqueSlug`, `translations`)
/// that keep the next scan attached to the same CMS record.
fn variant_document(record: &ContentRecord, base: &ContentRecord) -> MdxDocument {
    let mut fm = Frontmatter::new();
    fm.set(
        "title",
        record.title.as_deref().unwrap_or(record.slug_str()),
    );
    if let Some(description) = record.description.as_deref() {
        fm.set("description", description);
    }
    if let Some(date) = record.date.as_deref().or(base.date.as_deref()) {
        fm.set("date", date);
    }
    fm.set("slug", base.slug_str());
    if let Some(lang) = record.lang.as_deref() {
        fm.set("lang", lang);
    }
    fm.set("contentId", base.slug_str());
    fm.set("uniqueSlug", record.slug_str());
    fm.set("isTranslated", true);
    fm.set(
        "translations",
        FieldValue::Map(vec![
            ("en".to_string(), base.slug_str().to_string()),
            (
                record
                    .lang
                    .as_deref()
                    .map(normalize_locale)
                    .unwrap_or_default(),
                record.slug_str().to_string(),
            ),
        ]),
    );

    let body = html_to_markdown(record.content.as_deref().unwrap_or_default());
    MdxDocument::new(fm, body)
}
