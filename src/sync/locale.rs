//! Locale handling and base-record resolution.
//!
//! Cross-locale links are not persisted anywhere; they are re-derived on
//! every run by matching a locale variant against the base-locale
//! candidate set. The cascade is deterministic and every decision is
//! logged with its strategy and score so mis-links can be audited.

use std::fmt;
use tracing::debug;

use crate::cms::ContentRecord;

/// The base locale all variants link back to.
pub const DEFAULT_LOCALE: &str = "en";

/// Locale set used for translation targets when the CMS registry is
/// unreachable.
pub const FALLBACK_LOCALES: &[&str] = &["es", "zh", "de", "fr"];

/// Normalize a locale code to its lowercased primary subtag:
/// `es-ES` becomes `es`.
pub fn normalize_locale(code: &str) -> String {
    code.split('-')
        .next()
        .unwrap_or(code)
        .to_ascii_lowercase()
}

pub fn is_default_locale(code: &str) -> bool {
    normalize_locale(code) == DEFAULT_LOCALE
}

/// Locale-scoped unique slug: variants get a `<locale>-` prefix so they
/// never collide with the base record's slug.
pub fn unique_slug(slug: &str, locale: &str) -> String {
    let locale = normalize_locale(locale);
    if locale == DEFAULT_LOCALE {
        slug.to_string()
    } else {
        format!("{}-{}", locale, slug)
    }
}

/// Anything that can be resolved against the base candidate set:
/// a CMS locale-variant record or a scanned locale-variant file.
pub trait VariantSource {
    fn slug(&self) -> &str;
    fn content_id(&self) -> Option<&str>;
    fn document_id(&self) -> Option<&str>;
}

impl VariantSource for ContentRecord {
    fn slug(&self) -> &str {
        self.slug_str()
    }

    fn content_id(&self) -> Option<&str> {
        self.content_id.as_deref()
    }

    fn document_id(&self) -> Option<&str> {
        self.document_id.as_deref()
    }
}

/// How a variant was linked to its base record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// The variant's explicit cross-reference matched the base slug or
    /// document id.
    ExplicitContentId,
    /// The variant shares the base record's document identity.
    SharedDocumentId,
}

impl Strategy {
    pub fn score(&self) -> u32 {
        match self {
            Strategy::ExplicitContentId => 1000,
            Strategy::SharedDocumentId => 1000,
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::ExplicitContentId => write!(f, "explicit content id"),
            Strategy::SharedDocumentId => write!(f, "shared document id"),
        }
    }
}

/// A resolved base record plus the evidence for the link.
#[derive(Debug, Clone, Copy)]
pub struct Resolution<'a> {
    pub base: &'a ContentRecord,
    pub strategy: Strategy,
}

/// Find the base-locale record a variant should attach to.
///
/// Priority cascade, first non-empty result wins:
/// 1. explicit cross-reference field against base slug or document id;
/// 2. shared document identity;
/// 3. none: the caller syncs the record standalone, without cross-links.
pub fn resolve_base<'a, V: VariantSource + ?Sized>(
    variant: &V,
    candidates: &'a [ContentRecord],
) -> Option<Resolution<'a>> {
    if let Some(content_id) = variant.content_id() {
        if let Some(base) = candidates.iter().find(|c| {
            c.slug.as_deref() == Some(content_id) || c.document_id.as_deref() == Some(content_id)
        }) {
            let strategy = Strategy::ExplicitContentId;
            debug!(
                variant = variant.slug(),
                base = base.slug_str(),
                %strategy,
                score = strategy.score(),
                "resolved base record"
            );
            return Some(Resolution { base, strategy });
        }
    }

    if let Some(document_id) = variant.document_id() {
        if let Some(base) = candidates
            .iter()
            .find(|c| c.document_id.as_deref() == Some(document_id))
        {
            let strategy = Strategy::SharedDocumentId;
            debug!(
                variant = variant.slug(),
                base = base.slug_str(),
                %strategy,
                score = strategy.score(),
                "resolved base record"
            );
            return Some(Resolution { base, strategy });
        }
    }

    debug!(variant = variant.slug(), "no base record found for variant");
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base(slug: &str, document_id: &str) -> ContentRecord {
        ContentRecord {
            slug: Some(slug.to_string()),
            document_id: Some(document_id.to_string()),
            lang: Some(DEFAULT_LOCALE.to_string()),
            ..Default::default()
        }
    }

    fn variant(slug: &str, content_id: Option<&str>, document_id: Option<&str>) -> ContentRecord {
        ContentRecord {
            slug: Some(slug.to_string()),
            content_id: content_id.map(String::from),
            document_id: document_id.map(String::from),
            lang: Some("fr".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_normalize_locale() {
        assert_eq!(normalize_locale("es-ES"), "es");
        assert_eq!(normalize_locale("zh"), "zh");
        assert_eq!(normalize_locale("PT-BR"), "pt");
        assert!(is_default_locale("en"));
        assert!(is_default_locale("en-US"));
        assert!(!is_default_locale("de"));
    }

    #[test]
    fn test_unique_slug() {
        assert_eq!(unique_slug("hello", "en"), "hello");
        assert_eq!(unique_slug("hello", "es"), "es-hello");
        assert_eq!(unique_slug("hello", "es-ES"), "es-hello");
    }

    #[test]
    fn test_explicit_content_id_wins_regardless_of_variant_slug() {
        let bases = vec![base("foo", "doc-1"), base("bar", "doc-2")];
        let v = variant("totally-different", Some("foo"), None);

        let resolution = resolve_base(&v, &bases).unwrap();
        assert_eq!(resolution.base.slug_str(), "foo");
        assert_eq!(resolution.strategy, Strategy::ExplicitContentId);
        assert_eq!(resolution.strategy.score(), 1000);
    }

    #[test]
    fn test_content_id_matches_document_id_too() {
        let bases = vec![base("foo", "doc-1")];
        let v = variant("v", Some("doc-1"), None);

        let resolution = resolve_base(&v, &bases).unwrap();
        assert_eq!(resolution.base.slug_str(), "foo");
    }

    #[test]
    fn test_shared_document_identity_fallback() {
        let bases = vec![base("foo", "doc-1"), base("bar", "doc-2")];
        let v = variant("bonjour", None, Some("doc-2"));

        let resolution = resolve_base(&v, &bases).unwrap();
        assert_eq!(resolution.base.slug_str(), "bar");
        assert_eq!(resolution.strategy, Strategy::SharedDocumentId);
    }

    #[test]
    fn test_explicit_reference_beats_document_identity() {
        let bases = vec![base("foo", "doc-1"), base("bar", "doc-2")];
        // Points at foo explicitly but shares bar's document id.
        let v = variant("v", Some("foo"), Some("doc-2"));

        let resolution = resolve_base(&v, &bases).unwrap();
        assert_eq!(resolution.base.slug_str(), "foo");
        assert_eq!(resolution.strategy, Strategy::ExplicitContentId);
    }

    #[test]
    fn test_unresolved_variant() {
        let bases = vec![base("foo", "doc-1")];
        let v = variant("orphan", None, None);
        assert!(resolve_base(&v, &bases).is_none());

        let v = variant("orphan", Some("nope"), Some("doc-nope"));
        assert!(resolve_base(&v, &bases).is_none());
    }
}
