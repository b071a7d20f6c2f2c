//! Wire types for the CMS REST API.

use serde::{Deserialize, Serialize};

/// A content record as returned by the CMS list/detail endpoints.
///
/// One shape covers all synced content types; fields a type does not use
/// simply stay `None`. `document_id` is the stable identity shared across
/// locale variants of the same document.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContentRecord {
    pub id: Option<u64>,
    pub document_id: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub slug: Option<String>,
    pub date: Option<String>,
    /// Rich-text body, stored as HTML.
    pub content: Option<String>,
    pub lang: Option<String>,
    /// Explicit cross-reference to the base record's slug or document id.
    pub content_id: Option<String>,
    pub order: Option<i64>,
    pub og_image_url: Option<String>,
    pub featured_image: Option<MediaRef>,
    pub publish_date: Option<String>,
    pub publication: Option<String>,
    pub publication_logo: Option<String>,
    pub external_url: Option<String>,
    pub featured: Option<bool>,
    pub category: Option<String>,
    pub published_at: Option<String>,
}

impl ContentRecord {
    pub fn slug_str(&self) -> &str {
        self.slug.as_deref().unwrap_or_default()
    }

    pub fn is_published(&self) -> bool {
        self.published_at.is_some()
    }
}

/// A populated media field.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MediaRef {
    pub id: Option<u64>,
    pub url: Option<String>,
    pub alternative_text: Option<String>,
}

/// A locale from the CMS locale registry.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Locale {
    pub id: Option<u64>,
    pub name: Option<String>,
    pub code: String,
    pub is_default: bool,
}

/// Write payload for create/update requests.
///
/// Only set fields are serialized; `published_at` is set on create and
/// left untouched on update so an unchanged record compares equal across
/// runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub og_image_url: Option<String>,
    /// Upload id of the media entry; paths are rejected upstream.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub featured_image: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publish_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publication: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publication_logo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub featured: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
}

impl RecordData {
    /// Whether an existing record already carries every field this payload
    /// would set. Used for idempotence: a matching record is not updated.
    ///
    /// `published_at` and `featured_image` are excluded: the former is a
    /// create-time stamp, the latter comes back populated rather than as
    /// the upload id that was sent.
    pub fn matches(&self, record: &ContentRecord) -> bool {
        fn same<T: PartialEq>(desired: &Option<T>, actual: &Option<T>) -> bool {
            desired.is_none() || desired == actual
        }

        same(&self.title, &record.title)
            && same(&self.description, &record.description)
            && same(&self.slug, &record.slug)
            && same(&self.date, &record.date)
            && same(&self.content, &record.content)
            && same(&self.lang, &record.lang)
            && same(&self.content_id, &record.content_id)
            && same(&self.order, &record.order)
            && same(&self.og_image_url, &record.og_image_url)
            && same(&self.publish_date, &record.publish_date)
            && same(&self.publication, &record.publication)
            && same(&self.publication_logo, &record.publication_logo)
            && same(&self.external_url, &record.external_url)
            && same(&self.featured, &record.featured)
            && same(&self.category, &record.category)
    }
}
