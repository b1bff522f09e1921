use anyhow::{Context, Result, bail};
use geojson::{Feature, FeatureCollection};
use reqwest::blocking::Client as HttpClient;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::load_config;
use crate::error::{ApiErrorResponse, format_api_error};
use crate::query::DataQuery;
use crate::util::urljoin;

/// The WOUDC data access documentation page.
pub const ABOUT_URL: &str = "https://woudc.org/en/data/data-access";

/// Default page size when walking a data collection.
const DEFAULT_LIMIT: usize = 25_000;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base WOUDC API URL, typically `https://api.woudc.org`.
    pub url: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Whether to verify TLS certificates.
    pub verify: bool,
}

/// Client for the WOUDC OGC API - Features service.
///
/// Construction performs no network I/O; the first request happens on the
/// first accessor call.
#[derive(Debug, Clone)]
pub struct Client {
    url: String,
    limit: usize,

    http: HttpClient,
}

impl Client {
    /// Creates a client using environment variables and/or `.woudcrc`,
    /// falling back to the public WOUDC endpoint.
    ///
    /// This is equivalent to `Client::new(None, None)`.
    pub fn from_env() -> Result<Self> {
        Self::new(None, None)
    }

    /// Creates a client using (in order of precedence):
    /// - explicit `url`/`timeout` arguments
    /// - environment variables `WOUDC_API_URL` / `WOUDC_API_TIMEOUT`
    /// - config file from `WOUDC_API_RC` or `.woudcrc`
    /// - built-in defaults
    pub fn new(url: Option<String>, timeout: Option<Duration>) -> Result<Self> {
        let cfg = load_config(url, timeout, None)?;
        Self::from_config(cfg)
    }

    pub fn from_config(cfg: ClientConfig) -> Result<Self> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("woudc-rs/{}", env!("CARGO_PKG_VERSION")))
                .unwrap_or(HeaderValue::from_static("woudc-rs")),
        );

        let mut builder = HttpClient::builder()
            .default_headers(default_headers)
            .timeout(cfg.timeout);

        if !cfg.verify {
            builder = builder.danger_accept_invalid_certs(true);
        }

        let http = builder.build().context("failed to build HTTP client")?;

        info!("Using WOUDC service at {}", cfg.url);

        Ok(Self {
            url: cfg.url,
            limit: DEFAULT_LIMIT,
            http,
        })
    }

    /// Overrides the page size used by [`Client::get_data`]. Clamped to at
    /// least 1 so the paging loop always makes progress.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit.max(1);
        self
    }

    /// The normalized service base URL (always ends with `/`).
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The About Data Access page.
    pub fn about(&self) -> &'static str {
        ABOUT_URL
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Downloads WOUDC station metadata.
    pub fn stations(&self) -> Result<FeatureCollection> {
        info!("Fetching station metadata");
        self.collection_items("stations", &DataQuery::new())
    }

    /// Downloads WOUDC instrument metadata.
    pub fn instruments(&self) -> Result<FeatureCollection> {
        info!("Fetching instrument metadata");
        self.collection_items("instruments", &DataQuery::new())
    }

    /// Downloads WOUDC contributor metadata.
    pub fn contributors(&self) -> Result<FeatureCollection> {
        info!("Fetching contributor metadata");
        self.collection_items("contributors", &DataQuery::new())
    }

    /// Looks up a single station by WOUDC identifier.
    pub fn station(&self, id: &str) -> Result<Feature> {
        self.collection_item("stations", id)
    }

    /// Looks up a single instrument by identifier.
    pub fn instrument(&self, id: &str) -> Result<Feature> {
        self.collection_item("instruments", id)
    }

    /// Looks up a single contributor by acronym.
    pub fn contributor(&self, id: &str) -> Result<Feature> {
        self.collection_item("contributors", id)
    }

    /// Runs a single filtered query against a named collection.
    ///
    /// The response is returned as parsed by the service, one page at most;
    /// use [`Client::get_data`] for queries that may exceed one page.
    /// An unknown collection name is an error (HTTP 404 from the service),
    /// never an empty result.
    pub fn collection_items(
        &self,
        collection: &str,
        query: &DataQuery,
    ) -> Result<FeatureCollection> {
        let url = self.items_url(collection);
        self.api_get(&url, &query.to_query_pairs())
    }

    /// Like [`Client::collection_items`] but returns the raw GeoJSON payload
    /// without parsing it.
    pub fn collection_items_raw(&self, collection: &str, query: &DataQuery) -> Result<String> {
        let url = self.items_url(collection);
        self.api_get_text(&url, &query.to_query_pairs())
    }

    /// Fetches a single feature by identifier from a named collection.
    pub fn collection_item(&self, collection: &str, id: &str) -> Result<Feature> {
        let url = urljoin(&self.url, &format!("collections/{collection}/items/{id}"));
        self.api_get(&url, &[("f".to_string(), "json".to_string())])
    }

    /// Downloads WOUDC observations from a data collection, e.g.
    /// `totalozone`, walking pages with `limit`/`offset` and concatenating
    /// the features into a single collection.
    pub fn get_data(&self, dataset: &str, query: &DataQuery) -> Result<FeatureCollection> {
        info!("Downloading dataset {}", dataset);

        let url = self.items_url(dataset);
        let mut offset = 0usize;

        let mut collection = self.items_page(&url, query, offset)?;
        let mut page_len = collection.features.len();
        offset += page_len;

        while page_len == self.limit {
            let page = self.items_page(&url, query, offset)?;
            page_len = page.features.len();
            offset += page_len;
            collection.features.extend(page.features);
        }

        info!("Found {} total features", collection.features.len());
        Ok(collection)
    }

    fn items_page(&self, url: &str, query: &DataQuery, offset: usize) -> Result<FeatureCollection> {
        debug!("Fetching features {} - {}", offset, offset + self.limit);
        let mut pairs = query.to_query_pairs();
        pairs.push(("limit".to_string(), self.limit.to_string()));
        pairs.push(("offset".to_string(), offset.to_string()));
        self.api_get(url, &pairs)
    }

    fn items_url(&self, collection: &str) -> String {
        urljoin(&self.url, &format!("collections/{collection}/items"))
    }

    fn api_get<T: DeserializeOwned>(&self, url: &str, params: &[(String, String)]) -> Result<T> {
        let text = self.api_get_text(url, params)?;
        serde_json::from_str::<T>(&text)
            .with_context(|| format!("failed to parse API GeoJSON (url={})", url))
    }

    fn api_get_text(&self, url: &str, params: &[(String, String)]) -> Result<String> {
        debug!("GET {}", url);

        let resp = self
            .http
            .get(url)
            .query(params)
            .send()
            .with_context(|| format!("could not connect to {}", url))?;

        let status = resp.status();
        let text = resp.text().unwrap_or_default();
        if !status.is_success() {
            // The service reports errors as a small JSON document.
            if let Ok(err_json) = serde_json::from_str::<ApiErrorResponse>(&text) {
                return Err(format_api_error(status, url, &err_json));
            }

            bail!(
                "API request failed: HTTP {} for url ({})\n{}",
                status,
                url,
                text
            );
        }

        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client(url: &str) -> Client {
        Client::from_config(ClientConfig {
            url: crate::util::normalize_base_url(url),
            timeout: Duration::from_secs(1),
            verify: true,
        })
        .unwrap()
    }

    #[test]
    fn construction_is_offline_and_normalizes_url() {
        let client = test_client("https://api.woudc.org");
        assert_eq!(client.url(), "https://api.woudc.org/");
        assert_eq!(client.about(), "https://woudc.org/en/data/data-access");
        assert_eq!(client.limit(), 25_000);
    }

    #[test]
    fn limit_override() {
        let client = test_client("https://api.woudc.org").with_limit(100);
        assert_eq!(client.limit(), 100);
    }

    #[test]
    fn items_url_targets_the_collection() {
        let client = test_client("https://api.woudc.org");
        assert_eq!(
            client.items_url("totalozone"),
            "https://api.woudc.org/collections/totalozone/items"
        );
    }

    #[test]
    fn page_merge_concatenates_features() {
        // Exercises the same merge get_data performs, without the network.
        let mut first: FeatureCollection = serde_json::from_str(
            r#"{"type": "FeatureCollection", "numberMatched": 3, "features": [
                {"type": "Feature", "id": "a", "geometry": null, "properties": {}},
                {"type": "Feature", "id": "b", "geometry": null, "properties": {}}
            ]}"#,
        )
        .unwrap();
        let second: FeatureCollection = serde_json::from_str(
            r#"{"type": "FeatureCollection", "features": [
                {"type": "Feature", "id": "c", "geometry": null, "properties": {}}
            ]}"#,
        )
        .unwrap();

        first.features.extend(second.features);
        assert_eq!(first.features.len(), 3);
        // Header of the first page survives the merge.
        assert!(
            first
                .foreign_members
                .as_ref()
                .is_some_and(|m| m.contains_key("numberMatched"))
        );
    }
}
