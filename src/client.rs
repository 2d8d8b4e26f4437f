//! Content API access.
//!
//! The generator talks to a headless CMS speaking the Prismic REST v2 wire
//! format. Everything the rest of the crate needs goes through the
//! [`ContentSource`] trait, so the pagination cursor and the fetch stage can
//! be exercised against an in-memory source in tests.
//!
//! ## Refs
//!
//! Every search must name a content ref. [`ApiClient::connect`] reads the API
//! descriptor once and keeps the master ref, or the preview ref when preview
//! mode is on. `next_page` cursor URLs returned by the API already embed the
//! ref and token, so [`ContentSource::fetch_page`] fetches them untouched.

use crate::config::ApiConfig;
use crate::preview::PreviewMode;
use crate::types::{Post, SearchResponse};
use log::debug;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug)]
pub enum ContentError {
    #[error("invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("network error: {0}")]
    Network(String),
    #[error("request timed out: {0}")]
    Timeout(String),
    #[error("content API returned HTTP {0}")]
    HttpStatus(u16),
    #[error("could not parse content API response: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("content API has no master ref")]
    MissingMasterRef,
    #[error("content API returned an already-followed cursor: {0}")]
    RepeatedCursor(String),
}

/// Sort direction for an ordering field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ordering {
    pub field: String,
    pub direction: Direction,
}

impl Ordering {
    pub fn by_first_publication(direction: Direction) -> Self {
        Self {
            field: "document.first_publication_date".to_string(),
            direction,
        }
    }

    fn to_param(&self) -> String {
        match self.direction {
            Direction::Ascending => format!("[{}]", self.field),
            Direction::Descending => format!("[{} desc]", self.field),
        }
    }
}

/// A search over documents of one type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub document_type: String,
    pub page_size: u32,
    /// Restrict returned data to these fields (`posts.title`, ...). Empty
    /// means full documents.
    pub fetch: Vec<String>,
    pub ordering: Option<Ordering>,
    /// Return only documents positioned after this document id.
    pub after: Option<String>,
}

impl Query {
    pub fn of_type(document_type: &str, page_size: u32) -> Self {
        Self {
            document_type: document_type.to_string(),
            page_size,
            fetch: Vec::new(),
            ordering: None,
            after: None,
        }
    }

    /// The listing fields: title, subtitle and author.
    pub fn listing_fields(mut self) -> Self {
        self.fetch = ["title", "subtitle", "author"]
            .iter()
            .map(|field| format!("{}.{}", self.document_type, field))
            .collect();
        self
    }

    pub fn ordered(mut self, ordering: Ordering) -> Self {
        self.ordering = Some(ordering);
        self
    }

    pub fn after(mut self, document_id: &str) -> Self {
        self.after = Some(document_id.to_string());
        self
    }

    fn predicate(&self) -> String {
        format!("[[at(document.type,\"{}\")]]", self.document_type)
    }
}

/// Where posts come from.
#[async_trait::async_trait]
pub trait ContentSource: Send + Sync {
    /// Run a search and return its first page.
    async fn query(&self, query: &Query) -> Result<SearchResponse, ContentError>;

    /// Fetch the page behind an opaque `next_page` cursor.
    async fn fetch_page(&self, cursor: &str) -> Result<SearchResponse, ContentError>;

    /// Look up one full document by its uid. `Ok(None)` if no such post.
    async fn get_by_uid(&self, document_type: &str, uid: &str)
    -> Result<Option<Post>, ContentError>;
}

/// Find the posts published immediately before and after `document_id`.
///
/// Returns `(previous, next)`: previous is the closest older post, next the
/// closest newer one.
pub async fn neighbors(
    source: &dyn ContentSource,
    document_type: &str,
    document_id: &str,
) -> Result<(Option<Post>, Option<Post>), ContentError> {
    let previous = source
        .query(
            &Query::of_type(document_type, 1)
                .listing_fields()
                .ordered(Ordering::by_first_publication(Direction::Descending))
                .after(document_id),
        )
        .await?
        .results
        .into_iter()
        .next();
    let next = source
        .query(
            &Query::of_type(document_type, 1)
                .listing_fields()
                .ordered(Ordering::by_first_publication(Direction::Ascending))
                .after(document_id),
        )
        .await?
        .results
        .into_iter()
        .next();
    Ok((previous, next))
}

#[derive(Debug, Deserialize)]
struct ApiDescriptor {
    #[serde(default)]
    refs: Vec<ApiRef>,
}

#[derive(Debug, Deserialize)]
struct ApiRef {
    #[serde(rename = "ref")]
    token: String,
    #[serde(rename = "isMasterRef", default)]
    is_master: bool,
}

/// reqwest-backed [`ContentSource`].
#[derive(Debug, Clone)]
pub struct ApiClient {
    endpoint: Url,
    access_token: Option<String>,
    content_ref: String,
    http: reqwest::Client,
}

impl ApiClient {
    /// Read the API descriptor and pin the ref all searches will use.
    pub async fn connect(api: &ApiConfig, preview: &PreviewMode) -> Result<Self, ContentError> {
        let endpoint = parse_url(&api.endpoint)?;
        let http = build_http(api.timeout_secs)?;

        let mut descriptor_url = endpoint.clone();
        if let Some(token) = &api.access_token {
            descriptor_url
                .query_pairs_mut()
                .append_pair("access_token", token);
        }
        let descriptor: ApiDescriptor = get_json(&http, descriptor_url).await?;

        let content_ref = match preview.ref_token() {
            Some(token) => token.to_string(),
            None => descriptor
                .refs
                .into_iter()
                .find(|r| r.is_master)
                .map(|r| r.token)
                .ok_or(ContentError::MissingMasterRef)?,
        };
        debug!("content API ready at {endpoint} (ref {content_ref})");

        Ok(Self {
            endpoint,
            access_token: api.access_token.clone(),
            content_ref,
            http,
        })
    }

    /// The ref every search is pinned to.
    pub fn content_ref(&self) -> &str {
        &self.content_ref
    }

    fn search_url(&self, params: &[(&str, String)]) -> Url {
        let mut url = self.endpoint.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push("documents").push("search");
        }
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("ref", &self.content_ref);
            for (key, value) in params {
                pairs.append_pair(key, value);
            }
            if let Some(token) = &self.access_token {
                pairs.append_pair("access_token", token);
            }
        }
        url
    }

    fn query_url(&self, query: &Query) -> Url {
        let mut params = vec![
            ("q", query.predicate()),
            ("pageSize", query.page_size.to_string()),
        ];
        if !query.fetch.is_empty() {
            params.push(("fetch", query.fetch.join(",")));
        }
        if let Some(ordering) = &query.ordering {
            params.push(("orderings", ordering.to_param()));
        }
        if let Some(after) = &query.after {
            params.push(("after", after.clone()));
        }
        self.search_url(&params)
    }
}

#[async_trait::async_trait]
impl ContentSource for ApiClient {
    async fn query(&self, query: &Query) -> Result<SearchResponse, ContentError> {
        get_json(&self.http, self.query_url(query)).await
    }

    async fn fetch_page(&self, cursor: &str) -> Result<SearchResponse, ContentError> {
        get_json(&self.http, parse_url(cursor)?).await
    }

    async fn get_by_uid(
        &self,
        document_type: &str,
        uid: &str,
    ) -> Result<Option<Post>, ContentError> {
        let url = self.search_url(&[
            ("q", format!("[[at(my.{document_type}.uid,\"{uid}\")]]")),
            ("pageSize", "1".to_string()),
        ]);
        let response: SearchResponse = get_json(&self.http, url).await?;
        Ok(response.results.into_iter().next())
    }
}

fn parse_url(raw: &str) -> Result<Url, ContentError> {
    Url::parse(raw).map_err(|err| ContentError::InvalidUrl {
        url: raw.to_string(),
        reason: err.to_string(),
    })
}

fn build_http(timeout_secs: Option<u64>) -> Result<reqwest::Client, ContentError> {
    let mut builder = reqwest::Client::builder();
    if let Some(secs) = timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    builder.build().map_err(map_reqwest_error)
}

async fn get_json<T: serde::de::DeserializeOwned>(
    http: &reqwest::Client,
    url: Url,
) -> Result<T, ContentError> {
    debug!("GET {url}");
    let response = http.get(url).send().await.map_err(map_reqwest_error)?;
    let status = response.status();
    if !status.is_success() {
        return Err(ContentError::HttpStatus(status.as_u16()));
    }
    let bytes = response.bytes().await.map_err(map_reqwest_error)?;
    Ok(serde_json::from_slice(&bytes)?)
}

fn map_reqwest_error(err: reqwest::Error) -> ContentError {
    if err.is_timeout() {
        return ContentError::Timeout(err.to_string());
    }
    ContentError::Network(err.to_string())
}
