//! In-memory [`CmsApi`] implementation for tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use super::{CmsApi, CmsError, ContentRecord, Locale, MediaRef, RecordData};

/// A stateful fake CMS backed by a `Vec`, with mutation counters so tests
/// can assert idempotence.
#[derive(Default)]
pub struct InMemoryCms {
    records: Mutex<Vec<ContentRecord>>,
    pub locale_codes: Vec<&'static str>,
    next_id: AtomicU64,
    pub creates: AtomicUsize,
    pub updates: AtomicUsize,
    pub deletes: AtomicUsize,
}

impl InMemoryCms {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            ..Default::default()
        }
    }

    pub fn with_records(records: Vec<ContentRecord>) -> Self {
        let max_id = records.iter().filter_map(|r| r.id).max().unwrap_or(0);
        Self {
            records: Mutex::new(records),
            next_id: AtomicU64::new(max_id + 1),
            ..Default::default()
        }
    }

    pub fn snapshot(&self) -> Vec<ContentRecord> {
        self.records.lock().unwrap().clone()
    }

    pub fn mutation_count(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
            + self.updates.load(Ordering::SeqCst)
            + self.deletes.load(Ordering::SeqCst)
    }

    fn apply(data: &RecordData, record: &mut ContentRecord) {
        fn set<T: Clone>(desired: &Option<T>, slot: &mut Option<T>) {
            if let Some(value) = desired {
                *slot = Some(value.clone());
            }
        }

        set(&data.title, &mut record.title);
        set(&data.description, &mut record.description);
        set(&data.slug, &mut record.slug);
        set(&data.date, &mut record.date);
        set(&data.content, &mut record.content);
        set(&data.lang, &mut record.lang);
        set(&data.content_id, &mut record.content_id);
        set(&data.order, &mut record.order);
        set(&data.og_image_url, &mut record.og_image_url);
        set(&data.publish_date, &mut record.publish_date);
        set(&data.publication, &mut record.publication);
        set(&data.publication_logo, &mut record.publication_logo);
        set(&data.external_url, &mut record.external_url);
        set(&data.featured, &mut record.featured);
        set(&data.category, &mut record.category);
        set(&data.published_at, &mut record.published_at);
        if let Some(upload_id) = data.featured_image {
            record.featured_image = Some(MediaRef {
                id: Some(upload_id),
                ..Default::default()
            });
        }
    }
}

impl CmsApi for InMemoryCms {
    async fn list_records(
        &self,
        _api_id: &str,
        filters: &[(String, String)],
    ) -> Result<Vec<ContentRecord>, CmsError> {
        let slug = filters
            .iter()
            .find(|(k, _)| k == "filters[slug][$eq]")
            .map(|(_, v)| v.as_str());
        let lang = filters
            .iter()
            .find(|(k, _)| k == "filters[lang][$eq]")
            .map(|(_, v)| v.as_str());

        let records = self.records.lock().unwrap();
        Ok(records
            .iter()
            .filter(|r| slug.is_none_or(|s| r.slug.as_deref() == Some(s)))
            .filter(|r| lang.is_none_or(|l| r.lang.as_deref() == Some(l)))
            .cloned()
            .collect())
    }

    async fn find_record(
        &self,
        api_id: &str,
        slug: &str,
        lang: Option<&str>,
    ) -> Result<Option<ContentRecord>, CmsError> {
        let mut filters = vec![("filters[slug][$eq]".to_string(), slug.to_string())];
        if let Some(lang) = lang {
            filters.push(("filters[lang][$eq]".to_string(), lang.to_string()));
        }
        Ok(self.list_records(api_id, &filters).await?.into_iter().next())
    }

    async fn create_record(
        &self,
        _api_id: &str,
        data: &RecordData,
    ) -> Result<ContentRecord, CmsError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let mut record = ContentRecord {
            id: Some(id),
            document_id: Some(format!("doc-{}", id)),
            ..Default::default()
        };
        Self::apply(data, &mut record);
        self.records.lock().unwrap().push(record.clone());
        self.creates.fetch_add(1, Ordering::SeqCst);
        Ok(record)
    }

    async fn update_record(
        &self,
        _api_id: &str,
        document_id: &str,
        data: &RecordData,
    ) -> Result<ContentRecord, CmsError> {
        let mut records = self.records.lock().unwrap();
        let record = records
            .iter_mut()
            .find(|r| r.document_id.as_deref() == Some(document_id))
            .ok_or_else(|| CmsError::Api {
                status: 404,
                message: format!("no record {}", document_id),
            })?;
        Self::apply(data, record);
        self.updates.fetch_add(1, Ordering::SeqCst);
        Ok(record.clone())
    }

    async fn delete_record(&self, _api_id: &str, document_id: &str) -> Result<(), CmsError> {
        let mut records = self.records.lock().unwrap();
        let before = records.len();
        records.retain(|r| r.document_id.as_deref() != Some(document_id));
        if records.len() == before {
            return Err(CmsError::Api {
                status: 404,
                message: format!("no record {}", document_id),
            });
        }
        self.deletes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn locales(&self) -> Result<Vec<Locale>, CmsError> {
        Ok(self
            .locale_codes
            .iter()
            .map(|code| Locale {
                code: code.to_string(),
                is_default: *code == "en",
                ..Default::default()
            })
            .collect())
    }
}
