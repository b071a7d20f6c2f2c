//! HTTP client for the CMS REST API.

use miette::Diagnostic;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

use crate::config::Config;

use super::model::{ContentRecord, Locale, RecordData};

/// CMS page size for list requests.
const PAGE_SIZE: u32 = 100;

/// Errors from the CMS API layer.
#[derive(Error, Diagnostic, Debug)]
pub enum CmsError {
    #[error("Failed to reach CMS")]
    #[diagnostic(
        code(mdxsync::cms::connection_failed),
        help("Is the CMS running? Check MDXSYNC_CMS_URL or pass --cms-url.")
    )]
    ConnectionFailed {
        #[source]
        source: reqwest::Error,
    },

    #[error("CMS API error ({status}): {message}")]
    #[diagnostic(code(mdxsync::cms::api_error))]
    Api { status: u16, message: String },

    #[error("Invalid response from CMS: {message}")]
    #[diagnostic(code(mdxsync::cms::invalid_response))]
    InvalidResponse { message: String },

    #[error("CMS API token not configured")]
    #[diagnostic(
        code(mdxsync::cms::missing_token),
        help("Set MDXSYNC_CMS_TOKEN to a CMS API token with write access.")
    )]
    MissingToken,
}

impl From<reqwest::Error> for CmsError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_connect() || e.is_timeout() {
            CmsError::ConnectionFailed { source: e }
        } else {
            CmsError::InvalidResponse {
                message: e.to_string(),
            }
        }
    }
}

/// Operations the sync functions need from the CMS.
///
/// Kept as a trait so the orchestrator takes an explicit handle instead of
/// reaching for ambient state, and so tests can run against an in-memory
/// store.
#[allow(async_fn_in_trait)]
pub trait CmsApi {
    /// Fetch all records of a collection matching the given query filters,
    /// following pagination to the end.
    async fn list_records(
        &self,
        api_id: &str,
        filters: &[(String, String)],
    ) -> Result<Vec<ContentRecord>, CmsError>;

    /// Find a single record by slug, optionally restricted to a locale.
    async fn find_record(
        &self,
        api_id: &str,
        slug: &str,
        lang: Option<&str>,
    ) -> Result<Option<ContentRecord>, CmsError>;

    async fn create_record(
        &self,
        api_id: &str,
        data: &RecordData,
    ) -> Result<ContentRecord, CmsError>;

    async fn update_record(
        &self,
        api_id: &str,
        document_id: &str,
        data: &RecordData,
    ) -> Result<ContentRecord, CmsError>;

    async fn delete_record(&self, api_id: &str, document_id: &str) -> Result<(), CmsError>;

    /// The CMS locale registry.
    async fn locales(&self) -> Result<Vec<Locale>, CmsError>;
}

#[derive(Deserialize)]
struct ListResponse {
    #[serde(default)]
    data: Vec<ContentRecord>,
    #[serde(default)]
    meta: Option<Meta>,
}

#[derive(Deserialize, Default)]
struct Meta {
    #[serde(default)]
    pagination: Option<Pagination>,
}

#[derive(Deserialize)]
struct Pagination {
    page: u32,
    #[serde(rename = "pageCount")]
    page_count: u32,
}

#[derive(Deserialize)]
struct ItemResponse {
    data: Option<ContentRecord>,
}

#[derive(serde::Serialize)]
struct WriteRequest<'a> {
    data: &'a RecordData,
}

/// Real CMS client over HTTP.
pub struct RealCms {
    base_url: String,
    token: Option<String>,
    client: Client,
}

impl RealCms {
    pub fn new(config: &Config) -> Self {
        Self {
            base_url: config.cms_url.trim_end_matches('/').to_string(),
            token: config.cms_token.clone(),
            client: Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}/api/{}", self.base_url, path);
        let builder = self.client.request(method, &url);
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Deserialize a response body, mapping non-2xx statuses to
    /// [`CmsError::Api`] with the status and body for diagnostics.
    async fn handle_response<T: DeserializeOwned>(response: Response) -> Result<T, CmsError> {
        if response.status().is_success() {
            response
                .json()
                .await
                .map_err(|e| CmsError::InvalidResponse {
                    message: e.to_string(),
                })
        } else {
            let status = response.status().as_u16();
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            Err(CmsError::Api { status, message })
        }
    }
}

impl CmsApi for RealCms {
    async fn list_records(
        &self,
        api_id: &str,
        filters: &[(String, String)],
    ) -> Result<Vec<ContentRecord>, CmsError> {
        let mut records = Vec::new();
        let mut page = 1u32;

        loop {
            let response = self
                .request(Method::GET, api_id)
                .query(filters)
                .query(&[
                    ("pagination[page]", page.to_string()),
                    ("pagination[pageSize]", PAGE_SIZE.to_string()),
                ])
                .send()
                .await
                .map_err(|e| CmsError::ConnectionFailed { source: e })?;

            let body: ListResponse = Self::handle_response(response).await?;
            let fetched = body.data.len();
            records.extend(body.data);

            let page_count = body
                .meta
                .and_then(|m| m.pagination)
                .map(|p| (p.page, p.page_count));
            debug!(api_id, page, fetched, "fetched CMS page");

            match page_count {
                Some((current, total)) if current < total => page = current + 1,
                Some(_) => break,
                // No pagination metadata: stop once a page comes back short.
                None if fetched as u32 == PAGE_SIZE => page += 1,
                None => break,
            }
        }

        Ok(records)
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
        let records = self.list_records(api_id, &filters).await?;
        Ok(records.into_iter().next())
    }

    async fn create_record(
        &self,
        api_id: &str,
        data: &RecordData,
    ) -> Result<ContentRecord, CmsError> {
        if self.token.is_none() {
            return Err(CmsError::MissingToken);
        }
        let response = self
            .request(Method::POST, api_id)
            .json(&WriteRequest { data })
            .send()
            .await
            .map_err(|e| CmsError::ConnectionFailed { source: e })?;

        let body: ItemResponse = Self::handle_response(response).await?;
        body.data.ok_or_else(|| CmsError::InvalidResponse {
            message: "create returned no record".to_string(),
        })
    }

    async fn update_record(
        &self,
        api_id: &str,
        document_id: &str,
        data: &RecordData,
    ) -> Result<ContentRecord, CmsError> {
        if self.token.is_none() {
            return Err(CmsError::MissingToken);
        }
        let path = format!("{}/{}", api_id, document_id);
        let response = self
            .request(Method::PUT, &path)
            .json(&WriteRequest { data })
            .send()
            .await
            .map_err(|e| CmsError::ConnectionFailed { source: e })?;

        let body: ItemResponse = Self::handle_response(response).await?;
        body.data.ok_or_else(|| CmsError::InvalidResponse {
            message: "update returned no record".to_string(),
        })
    }

    async fn delete_record(&self, api_id: &str, document_id: &str) -> Result<(), CmsError> {
        if self.token.is_none() {
            return Err(CmsError::MissingToken);
        }
        let path = format!("{}/{}", api_id, document_id);
        let response = self
            .request(Method::DELETE, &path)
            .send()
            .await
            .map_err(|e| CmsError::ConnectionFailed { source: e })?;

        // Deletes come back 204 with an empty body.
        if response.status().is_success() {
            Ok(())
        } else {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            Err(CmsError::Api { status, message })
        }
    }

    async fn locales(&self) -> Result<Vec<Locale>, CmsError> {
        let response = self
            .request(Method::GET, "i18n/locales")
            .send()
            .await
            .map_err(|e| CmsError::ConnectionFailed { source: e })?;

        // The registry endpoint returns a bare array, unlike collection
        // endpoints which wrap data in an envelope.
        Self::handle_response(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Install the crypto provider once so client construction works in tests
    fn init_crypto() {
        let _ = rustls::crypto::ring::default_provider().install_default();
    }

    fn test_config(url: &str, token: Option<&str>) -> Config {
        Config {
            cms_url: url.to_string(),
            cms_token: token.map(String::from),
            content_root: "src/content".into(),
            translations_dir: "exports/translations".into(),
            uploads_dir: "public/uploads".into(),
            uploads_url: None,
            git_sync_disabled: true,
        }
    }

    #[test]
    fn test_base_url_trailing_slash_stripped() {
        init_crypto();
        let cms = RealCms::new(&test_config("http://localhost:1337/", None));
        assert_eq!(cms.base_url(), "http://localhost:1337");
    }

    #[tokio::test]
    async fn test_writes_require_token() {
        init_crypto();
        let cms = RealCms::new(&test_config("http://localhost:1337", None));
        let data = RecordData::default();

        let result = cms.create_record("blog-posts", &data).await;
        assert!(matches!(result, Err(CmsError::MissingToken)));

        let result = cms.update_record("blog-posts", "abc", &data).await;
        assert!(matches!(result, Err(CmsError::MissingToken)));

        let result = cms.delete_record("blog-posts", "abc").await;
        assert!(matches!(result, Err(CmsError::MissingToken)));
    }

    #[test]
    fn test_list_response_parses_without_meta() {
        let json = r#"{"data": [{"id": 1, "slug": "a"}]}"#;
        let body: ListResponse = serde_json::from_str(json).unwrap();
        assert_eq!(body.data.len(), 1);
        assert!(body.meta.is_none());
    }

    #[test]
    fn test_list_response_parses_pagination() {
        let json = r#"{"data": [], "meta": {"pagination": {"page": 2, "pageSize": 100, "pageCount": 5, "total": 421}}}"#;
        let body: ListResponse = serde_json::from_str(json).unwrap();
        let pagination = body.meta.unwrap().pagination.unwrap();
        assert_eq!(pagination.page, 2);
        assert_eq!(pagination.page_count, 5);
    }
}
