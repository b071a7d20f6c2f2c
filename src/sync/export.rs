//! Translation export: CMS records to MDX files.
//!
//! Emits a reference file per published base-locale record plus one file
//! per missing locale, ready to be translated and fed back through the
//! import. Existing translations are left alone unless `--force`, in
//! which case their actual CMS content is exported instead of the English
//! template.

use std::collections::{HashMap, HashSet};
use tracing::{error, info, warn};

use crate::cms::{CmsApi, ContentRecord};
use crate::config::Config;
use crate::content_type::ContentTypeSpec;
use crate::mdx::{FieldValue, Frontmatter, MdxDocument, html_to_markdown};

use super::locale::{DEFAULT_LOCALE, FALLBACK_LOCALES, is_default_locale, normalize_locale,
    resolve_base, unique_slug};
use super::materialize;
use super::reconcile::SyncError;

/// Options for a translation export run.
#[derive(Debug, Clone, Default)]
pub struct ExportOptions {
    /// Process only the first N records.
    pub limit: Option<usize>,
    /// Only records published on or after this date (`YYYY-MM-DD`).
    pub since: Option<String>,
    /// Only these record ids.
    pub ids: Vec<u64>,
    /// Only these slugs.
    pub slugs: Vec<String>,
    /// Export every locale even when a translation already exists.
    pub force: bool,
    pub dry_run: bool,
}

/// Summary of a translation export run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportSummary {
    /// Files written (reference + per-locale).
    pub exported: usize,
    /// Records skipped because every locale already has a translation.
    pub skipped: usize,
    pub errors: usize,
}

impl ExportSummary {
    pub fn has_errors(&self) -> bool {
        self.errors > 0
    }
}

/// Export base-locale records and their translation templates.
pub async fn export_translations<C: CmsApi>(
    cms: &C,
    config: &Config,
    spec: &ContentTypeSpec,
    opts: &ExportOptions,
) -> Result<ExportSummary, SyncError> {
    let mut summary = ExportSummary::default();

    let locales = translation_locales(cms).await;
    info!(
        "{} locales for translation: {}",
        locales.len(),
        locales.join(", ")
    );

    // Server-side filters narrow the fetch; the base/variant split below
    // does not depend on them.
    let mut filters = vec![(
        "filters[publishedAt][$notNull]".to_string(),
        "true".to_string(),
    )];
    if let Some(since) = &opts.since {
        filters.push(("filters[publishedAt][$gte]".to_string(), since.clone()));
    }
    for (i, id) in opts.ids.iter().enumerate() {
        filters.push((format!("filters[id][$in][{}]", i), id.to_string()));
    }
    for (i, slug) in opts.slugs.iter().enumerate() {
        filters.push((format!("filters[slug][$in][{}]", i), slug.clone()));
    }

    let records = cms.list_records(spec.api_id, &filters).await?;
    let (bases, variants): (Vec<ContentRecord>, Vec<ContentRecord>) = records
        .into_iter()
        .filter(|r| r.is_published())
        .partition(|r| r.lang.as_deref().is_none_or(is_default_locale));

    // Which locales each base already has, via the same resolver the
    // orchestrator uses.
    let mut existing_locales: HashMap<String, HashSet<String>> = HashMap::new();
    for variant in &variants {
        if let Some(resolution) = resolve_base(variant, &bases) {
            if let Some(lang) = variant.lang.as_deref() {
                existing_locales
                    .entry(resolution.base.slug_str().to_string())
                    .or_default()
                    .insert(normalize_locale(lang));
            }
        }
    }

    let mut bases = bases;
    bases.sort_by(|a, b| a.slug_str().cmp(b.slug_str()));
    if let Some(limit) = opts.limit {
        bases.truncate(limit);
        info!("limited to {} records", limit);
    }

    if bases.is_empty() {
        info!("no published records found to export");
        return Ok(summary);
    }

    for base in &bases {
        if let Err(e) = export_record(
            config,
            spec,
            base,
            &variants,
            &locales,
            existing_locales
                .get(base.slug_str())
                .unwrap_or(&HashSet::new()),
            opts,
            &mut summary,
        ) {
            error!("failed to export \"{}\": {}", base.slug_str(), e);
            summary.errors += 1;
        }
    }

    Ok(summary)
}

/// Translation target locales from the CMS registry, falling back to the
/// built-in set when the registry is unreachable.
async fn translation_locales<C: CmsApi>(cms: &C) -> Vec<String> {
    match cms.locales().await {
        Ok(locales) => {
            let codes: Vec<String> = locales
                .into_iter()
                .filter(|l| !l.is_default && !is_default_locale(&l.code))
                .map(|l| l.code)
                .collect();
            if codes.is_empty() {
                FALLBACK_LOCALES.iter().map(|s| s.to_string()).collect()
            } else {
                codes
            }
        }
        Err(e) => {
            warn!("could not fetch locales from CMS, using default set: {}", e);
            FALLBACK_LOCALES.iter().map(|s| s.to_string()).collect()
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn export_record(
    config: &Config,
    spec: &ContentTypeSpec,
    base: &ContentRecord,
    variants: &[ContentRecord],
    locales: &[String],
    existing: &HashSet<String>,
    opts: &ExportOptions,
    summary: &mut ExportSummary,
) -> Result<(), std::io::Error> {
    let slug = base.slug_str();

    let locales_to_export: Vec<&String> = if opts.force {
        locales.iter().collect()
    } else {
        locales
            .iter()
            .filter(|l| !existing.contains(&normalize_locale(l)))
            .collect()
    };

    if locales_to_export.is_empty() {
        info!(
            "skipping \"{}\": translations already exist for all locales (use --force to override)",
            slug
        );
        summary.skipped += 1;
        return Ok(());
    }

    let mut translations: Vec<(String, String)> =
        vec![(DEFAULT_LOCALE.to_string(), slug.to_string())];
    for locale in locales {
        translations.push((normalize_locale(locale), unique_slug(slug, locale)));
    }

    let date = base.date.as_deref().and_then(|d| d.parse().ok());

    // Reference file in the base locale.
    let reference = record_document(config, base, None, &translations, None);
    let path = config
        .translations_dir
        .join(materialize::file_name(spec, slug, DEFAULT_LOCALE, date));
    if opts.dry_run {
        info!("[dry-run] would write {}", path.display());
    } else {
        materialize::write(&path, &reference.serialize())?;
        info!("exported reference ({}): {}", DEFAULT_LOCALE, path.display());
    }
    summary.exported += 1;

    for locale in locales_to_export {
        let existing_translation = variants.iter().find(|v| {
            v.lang.as_deref().map(normalize_locale) == Some(normalize_locale(locale))
                && resolve_base(*v, std::slice::from_ref(base)).is_some()
        });

        let doc = match existing_translation {
            // Only reached with --force: reflect the translation that is
            // actually in the CMS.
            Some(translation) if opts.force => record_document(
                config,
                translation,
                Some(locale.as_str()),
                &translations,
                Some(true),
            ),
            _ => record_document(config, base, Some(locale.as_str()), &translations, Some(false)),
        };

        let path = config
            .translations_dir
            .join(materialize::file_name(spec, slug, locale, date));
        if opts.dry_run {
            info!("[dry-run] would write {}", path.display());
        } else {
            materialize::write(&path, &doc.serialize())?;
            info!("exported for translation ({}): {}", locale, path.display());
        }
        summary.exported += 1;
    }

    Ok(())
}

/// Build the MDX document for an exported record.
///
/// `locale` is the translation target (None for the reference file);
/// `is_translated` marks whether the body is real translated content or
/// the English template.
fn record_document(
    config: &Config,
    record: &ContentRecord,
    locale: Option<&str>,
    translations: &[(String, String)],
    is_translated: Option<bool>,
) -> MdxDocument {
    let mut fm = Frontmatter::new();
    fm.set(
        "title",
        record.title.as_deref().unwrap_or(record.slug_str()),
    );
    fm.set("description", record.description.as_deref().unwrap_or_default());
    if let Some(og) = record.og_image_url.as_deref() {
        fm.set("ogImageUrl", og);
    }
    if let Some(date) = record.date.as_deref() {
        fm.set("date", date);
    }
    fm.set("slug", record.slug_str());
    if let Some(url) = record
        .featured_image
        .as_ref()
        .and_then(|m| m.url.as_deref())
    {
        fm.set("image", config.media_url(url));
    }
    if let Some(locale) = locale {
        fm.set("lang", locale);
        fm.set("uniqueSlug", unique_slug(record.slug_str(), locale));
    }
    if let Some(is_translated) = is_translated {
        fm.set("isTranslated", is_translated);
    }
    fm.set("translations", FieldValue::Map(translations.to_vec()));

    let body = html_to_markdown(record.content.as_deref().unwrap_or_default());
    MdxDocument::new(fm, body)
}
