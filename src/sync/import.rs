//! Translation import: MDX files back into the CMS.
//!
//! Reads `slug.<locale>.mdx` files from the translations directory and
//! creates the corresponding locale-variant records. Files without a
//! locale suffix, with malformed frontmatter, or whose record already
//! exists are skipped with a reason; a create failure is counted and the
//! loop continues.

use chrono::Utc;
use tracing::{error, info, warn};

use crate::cms::{CmsApi, RecordData};
use crate::config::Config;
use crate::content_type::ContentTypeSpec;
use crate::mdx::markdown_to_html;

use super::locale::{is_default_locale, normalize_locale, unique_slug};
use super::reconcile::SyncError;
use super::scanner::{MdxFile, filename_parts, scan_dir};

/// Options for a translation import run.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImportOptions {
    pub dry_run: bool,
    /// Process only the first N files.
    pub limit: Option<usize>,
}

/// Summary of a translation import run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub imported: usize,
    pub skipped: usize,
    pub errors: usize,
}

impl ImportSummary {
    pub fn has_errors(&self) -> bool {
        self.errors > 0
    }
}

/// Import translated MDX files as CMS locale variants.
pub async fn import_translations<C: CmsApi>(
    cms: &C,
    config: &Config,
    spec: &ContentTypeSpec,
    opts: &ImportOptions,
) -> Result<ImportSummary, SyncError> {
    let mut summary = ImportSummary::default();

    let dir = &config.translations_dir;
    if !dir.exists() {
        info!("no translations directory found at {}", dir.display());
        return Ok(summary);
    }

    let scan = scan_dir(dir, None)?;
    for skip in &scan.skipped {
        warn!("skipped {}: {}", skip.path.display(), skip.reason);
        summary.skipped += 1;
    }

    info!("found {} MDX files to process", scan.files.len());

    let files: Vec<&MdxFile> = match opts.limit {
        Some(limit) => scan.files.iter().take(limit).collect(),
        None => scan.files.iter().collect(),
    };

    for file in files {
        match import_file(cms, spec, file, opts).await {
            Ok(Imported::Created(title, lang)) => {
                info!("imported \"{}\" ({})", title, lang);
                summary.imported += 1;
            }
            Ok(Imported::Skipped(reason)) => {
                warn!("skipped {}: {}", file.name, reason);
                summary.skipped += 1;
            }
            Err(e) => {
                error!("failed to import {}: {}", file.name, e);
                summary.errors += 1;
            }
        }
    }

    Ok(summary)
}

enum Imported {
    Created(String, String),
    Skipped(String),
}

async fn import_file<C: CmsApi>(
    cms: &C,
    spec: &ContentTypeSpec,
    file: &MdxFile,
    opts: &ImportOptions,
) -> Result<Imported, SyncError> {
    // The locale must come from the filename: `slug.es.mdx`. Reference
    // files without a suffix are the English source, not an import.
    let Some(lang) = file.filename_locale.clone() else {
        return Ok(Imported::Skipped(
            "no language code in filename (expected slug.<lang>.mdx)".to_string(),
        ));
    };
    let lang = normalize_locale(&lang);

    // Identity follows the filename, not the frontmatter: the exported
    // template keeps the base slug in its fields.
    let (filename_date, filename_slug) = filename_parts(&file.name);
    let slug = if is_default_locale(&lang) {
        filename_slug.clone()
    } else {
        file.doc
            .frontmatter
            .str_field("uniqueSlug")
            .map(String::from)
            .unwrap_or_else(|| unique_slug(&filename_slug, &lang))
    };

    if cms.find_record(spec.api_id, &slug, Some(&lang)).await?.is_some() {
        return Ok(Imported::Skipped(format!(
            "entry already exists for \"{}\" in language \"{}\"",
            slug, lang
        )));
    }

    let fm = &file.doc.frontmatter;
    let title = fm
        .str_field("title")
        .map(String::from)
        .unwrap_or_else(|| filename_slug.clone());

    let mut data = RecordData {
        title: Some(title.clone()),
        description: Some(fm.str_field("description").unwrap_or_default().to_string()),
        slug: Some(slug),
        date: fm
            .str_field("date")
            .map(String::from)
            .or_else(|| filename_date.map(|d| d.format("%Y-%m-%d").to_string())),
        content: Some(markdown_to_html(&file.doc.body)),
        lang: Some(lang.clone()),
        content_id: fm.str_field("contentId").map(String::from).or_else(|| {
            fm.get("translations")
                .and_then(|v| v.as_map())
                .and_then(|m| m.iter().find(|(k, _)| k == "en"))
                .map(|(_, v)| v.clone())
        }),
        og_image_url: fm.str_field("ogImageUrl").map(String::from),
        published_at: Some(Utc::now().to_rfc3339()),
        ..Default::default()
    };

    // Media references must be upload ids; exported files carry URLs,
    // which cannot be attached directly.
    if let Some(image) = fm.str_field("image") {
        match image.parse::<u64>() {
            Ok(upload_id) => data.featured_image = Some(upload_id),
            Err(_) => warn!(
                "{}: skipping featured image, expected numeric upload id, got a path",
                file.name
            ),
        }
    }

    if opts.dry_run {
        info!("[dry-run] would import \"{}\" ({})", title, lang);
        return Ok(Imported::Created(title, lang));
    }

    cms.create_record(spec.api_id, &data).await?;
    Ok(Imported::Created(title, lang))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cms::testing::InMemoryCms;
    use crate::cms::ContentRecord;
    use crate::content_type::find;
    use std::path::Path;
    use tempfile::TempDir;

    fn test_config(root: &Path) -> Config {
        Config {
            cms_url: "http://localhost:1337".to_string(),
            cms_token: Some("token".to_string()),
            content_root: root.join("content"),
            translations_dir: root.join("exports/translations"),
            uploads_dir: root.join("uploads"),
            uploads_url: None,
            git_sync_disabled: true,
        }
    }

    fn write_file(dir: &Path, name: &str, content: &str) {
        std::fs::create_dir_all(dir).unwrap();
        std::fs::write(dir.join(name), content).unwrap();
    }

    const ES_MDX: &str = "---\ntitle: \"Hola\"\ndescription: \"Una entrada\"\ndate: \"2024-01-15\"\nslug: hello-world\nlang: \"es\"\nuniqueSlug: \"es-hello-world\"\nisTranslated: true\ntranslations:\n  en: \"hello-world\"\n  es: \"es-hello-world\"\n---\n\nCuerpo **fuerte**.\n";

    #[tokio::test]
    async fn test_import_creates_variant_record() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(temp_dir.path());
        let spec = find("blog").unwrap();
        write_file(&config.translations_dir, "2024-01-15-hello-world.es.mdx", ES_MDX);

        let cms = InMemoryCms::new();
        let summary = import_translations(&cms, &config, spec, &ImportOptions::default())
            .await
            .unwrap();

        assert_eq!(summary.imported, 1);
        assert_eq!(summary.errors, 0);

        let records = cms.snapshot();
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.slug.as_deref(), Some("es-hello-world"));
        assert_eq!(record.lang.as_deref(), Some("es"));
        assert_eq!(record.content_id.as_deref(), Some("hello-world"));
        assert_eq!(record.date.as_deref(), Some("2024-01-15"));
        assert!(record.content.as_deref().unwrap().contains("<strong>fuerte</strong>"));
        assert!(record.is_published());
    }

    #[tokio::test]
    async fn test_reference_file_without_locale_is_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(temp_dir.path());
        let spec = find("blog").unwrap();
        write_file(
            &config.translations_dir,
            "2024-01-15-hello-world.mdx",
            "---\ntitle: \"Hello\"\n---\n\nBody\n",
        );

        let cms = InMemoryCms::new();
        let summary = import_translations(&cms, &config, spec, &ImportOptions::default())
            .await
            .unwrap();

        assert_eq!(summary.imported, 0);
        assert_eq!(summary.skipped, 1);
        assert!(cms.snapshot().is_empty());
    }

    #[tokio::test]
    async fn test_existing_entry_is_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(temp_dir.path());
        let spec = find("blog").unwrap();
        write_file(&config.translations_dir, "2024-01-15-hello-world.es.mdx", ES_MDX);

        let cms = InMemoryCms::with_records(vec![ContentRecord {
            id: Some(1),
            document_id: Some("doc-1".to_string()),
            slug: Some("es-hello-world".to_string()),
            lang: Some("es".to_string()),
            ..Default::default()
        }]);

        let summary = import_translations(&cms, &config, spec, &ImportOptions::default())
            .await
            .unwrap();

        assert_eq!(summary.imported, 0);
        assert_eq!(summary.skipped, 1);
        assert_eq!(cms.mutation_count(), 0);
    }

    #[tokio::test]
    async fn test_malformed_file_is_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(temp_dir.path());
        let spec = find("blog").unwrap();
        write_file(&config.translations_dir, "broken.es.mdx", "no frontmatter");

        let cms = InMemoryCms::new();
        let summary = import_translations(&cms, &config, spec, &ImportOptions::default())
            .await
            .unwrap();

        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.imported, 0);
    }

    #[tokio::test]
    async fn test_image_path_is_dropped_numeric_id_kept() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(temp_dir.path());
        let spec = find("blog").unwrap();
        write_file(
            &config.translations_dir,
            "a.es.mdx",
            "---\ntitle: \"A\"\nimage: \"42\"\n---\n\nx\n",
        );
        write_file(
            &config.translations_dir,
            "b.es.mdx",
            "---\ntitle: \"B\"\nimage: \"/uploads/b.png\"\n---\n\nx\n",
        );

        let cms = InMemoryCms::new();
        let summary = import_translations(&cms, &config, spec, &ImportOptions::default())
            .await
            .unwrap();
        assert_eq!(summary.imported, 2);

        let records = cms.snapshot();
        let a = records
            .iter()
            .find(|r| r.title.as_deref() == Some("A"))
            .unwrap();
        assert_eq!(a.featured_image.as_ref().unwrap().id, Some(42));
        let b = records
            .iter()
            .find(|r| r.title.as_deref() == Some("B"))
            .unwrap();
        assert!(b.featured_image.is_none());
    }

    #[tokio::test]
    async fn test_dry_run_creates_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(temp_dir.path());
        let spec = find("blog").unwrap();
        write_file(&config.translations_dir, "2024-01-15-hello-world.es.mdx", ES_MDX);

        let cms = InMemoryCms::new();
        let opts = ImportOptions {
            dry_run: true,
            ..Default::default()
        };
        let summary = import_translations(&cms, &config, spec, &opts).await.unwrap();

        assert_eq!(summary.imported, 1);
        assert_eq!(cms.mutation_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_directory_is_empty_run() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(temp_dir.path());
        let spec = find("blog").unwrap();

        let cms = InMemoryCms::new();
        let summary = import_translations(&cms, &config, spec, &ImportOptions::default())
            .await
            .unwrap();
        assert_eq!(summary, ImportSummary::default());
    }
}
