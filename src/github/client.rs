//! Quota-aware hosting API client
//!
//! This module wraps one credential's HTTP session and exposes the three
//! calls the crawler needs:
//! - Paginated repository search (lazy, page by page)
//! - Directory listing
//! - Raw file content fetch
//!
//! Every response goes through [`check_response`], which separates quota
//! exhaustion from other HTTP failures. Transport failures surface as
//! [`ClientError::Unavailable`]. Nothing is retried here; rotation is the
//! coordinator's job.

use crate::config::GithubConfig;
use crate::github::error::{ClientError, ClientResult};
use crate::github::types::{Entry, Repository, SearchPage};
use chrono::{DateTime, TimeZone, Utc};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, RETRY_AFTER};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::collections::VecDeque;
use std::time::Duration;
use url::Url;

/// The search endpoint never returns more than this many results per query
pub const SEARCH_RESULT_WINDOW: u64 = 1000;

const JSON_MEDIA_TYPE: &str = "application/vnd.github+json";
const RAW_MEDIA_TYPE: &str = "application/vnd.github.raw+json";
const API_VERSION: &str = "2022-11-28";

/// Builds an HTTP client bound to a single credential
///
/// # Arguments
///
/// * `config` - The API configuration (user agent, timeout)
/// * `token` - The credential sent as a bearer token on every request
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(ClientError)` - The credential is not header-safe or the client failed to build
pub fn build_http_client(config: &GithubConfig, token: &str) -> ClientResult<Client> {
    let mut headers = HeaderMap::new();
    let mut auth = HeaderValue::from_str(&format!("Bearer {}", token))
        .map_err(|_| ClientError::InvalidCredential)?;
    auth.set_sensitive(true);
    headers.insert(AUTHORIZATION, auth);
    headers.insert(ACCEPT, HeaderValue::from_static(JSON_MEDIA_TYPE));
    headers.insert(
        "x-github-api-version",
        HeaderValue::from_static(API_VERSION),
    );

    Client::builder()
        .user_agent(config.user_agent.clone())
        .default_headers(headers)
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
        .map_err(ClientError::Build)
}

/// API session bound to one credential
#[derive(Debug, Clone)]
pub struct GithubClient {
    http: Client,
    base_url: Url,
    per_page: u32,
}

impl GithubClient {
    /// Creates a client for `token`
    ///
    /// # Arguments
    ///
    /// * `config` - The API configuration
    /// * `token` - The credential this session is bound to
    /// * `per_page` - Results requested per search page
    pub fn new(config: &GithubConfig, token: &str, per_page: u32) -> ClientResult<Self> {
        let base_url = Url::parse(&config.api_url)?;
        let http = build_http_client(config, token)?;
        Ok(Self {
            http,
            base_url,
            per_page: per_page.max(1),
        })
    }

    /// Starts a lazy repository search
    ///
    /// No request is made until the first call to
    /// [`RepositorySearch::next`].
    pub fn search_repositories(&self, query: &str) -> RepositorySearch {
        RepositorySearch {
            client: self.clone(),
            query: query.to_string(),
            next_page: 1,
            buffer: VecDeque::new(),
            fetched: 0,
            finished: false,
        }
    }

    /// Lists one directory of a repository at its default branch
    ///
    /// An empty `path` lists the repository root.
    pub async fn list_tree(&self, repo: &Repository, path: &str) -> ClientResult<Vec<Entry>> {
        let url = self.contents_url(repo, path)?;
        let response = self.send(self.http.get(url)).await?;
        decode_json(response).await
    }

    /// Fetches the raw text of a file entry
    ///
    /// Content that is not valid UTF-8 is a [`ClientError::Decode`].
    pub async fn fetch_file_content(&self, repo: &Repository, entry: &Entry) -> ClientResult<String> {
        let url = self.contents_url(repo, &entry.path)?;
        let request = self.http.get(url.clone()).header(ACCEPT, RAW_MEDIA_TYPE);
        let response = self.send(request).await?;
        let body = response.bytes().await.map_err(ClientError::Unavailable)?;
        decode_text(body.to_vec(), url.as_str())
    }

    async fn search_page(&self, query: &str, page: u32) -> ClientResult<SearchPage> {
        let mut url = self.endpoint(&["search", "repositories"])?;
        url.query_pairs_mut()
            .append_pair("q", query)
            .append_pair("per_page", &self.per_page.to_string())
            .append_pair("page", &page.to_string());

        tracing::debug!("Fetching search page {} for query {:?}", page, query);
        let response = self.send(self.http.get(url)).await?;
        decode_json(response).await
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> ClientResult<Response> {
        let response = request.send().await.map_err(ClientError::Unavailable)?;
        check_response(response).await
    }

    fn contents_url(&self, repo: &Repository, path: &str) -> ClientResult<Url> {
        let (owner, name) = repo.owner_and_name();
        let mut segments = vec!["repos", owner, name, "contents"];
        segments.extend(path.split('/').filter(|s| !s.is_empty()));

        let mut url = self.endpoint(&segments)?;
        url.query_pairs_mut().append_pair("ref", &repo.default_branch);
        Ok(url)
    }

    fn endpoint(&self, segments: &[&str]) -> ClientResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::Url(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

/// Lazily paginated repository search results
///
/// Owns a clone of the session, so a worker can hold the search while
/// issuing other calls.
#[derive(Debug)]
pub struct RepositorySearch {
    client: GithubClient,
    query: String,
    next_page: u32,
    buffer: VecDeque<Repository>,
    fetched: u64,
    finished: bool,
}

impl RepositorySearch {
    /// Returns the next repository, fetching another page when the buffer is empty
    ///
    /// # Returns
    ///
    /// * `Ok(Some(Repository))` - The next search hit
    /// * `Ok(None)` - The search is exhausted
    /// * `Err(ClientError)` - Quota, transport, or HTTP failure while paging
    pub async fn next(&mut self) -> ClientResult<Option<Repository>> {
        loop {
            if let Some(repo) = self.buffer.pop_front() {
                return Ok(Some(repo));
            }

            if self.finished {
                return Ok(None);
            }

            let page = self.client.search_page(&self.query, self.next_page).await?;
            self.next_page += 1;

            let received = page.items.len() as u64;
            self.fetched += received;

            if page.incomplete_results {
                tracing::debug!("Search page {} reported incomplete results", self.next_page - 1);
            }

            if received < u64::from(self.client.per_page)
                || self.fetched >= page.total_count
                || self.fetched >= SEARCH_RESULT_WINDOW
            {
                self.finished = true;
            }

            self.buffer.extend(page.items);
        }
    }
}

/// Classifies a response, turning non-success statuses into errors
///
/// # Quota detection
///
/// | Condition | Result |
/// |-----------|--------|
/// | HTTP 429 | QuotaExceeded |
/// | HTTP 403 with `x-ratelimit-remaining: 0` | QuotaExceeded |
/// | HTTP 403 with `retry-after` | QuotaExceeded (secondary limit) |
/// | HTTP 403 whose message mentions a rate limit | QuotaExceeded |
/// | Any other non-success | Http |
pub async fn check_response(response: Response) -> ClientResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let url = response.url().to_string();
    let headers = response.headers().clone();
    let body = response.text().await.unwrap_or_default();

    if is_quota_response(status, &headers, &body) {
        let reset_at = parse_reset(&headers);
        tracing::debug!("Quota exhausted on {} (status {})", url, status);
        return Err(ClientError::QuotaExceeded { reset_at });
    }

    Err(ClientError::Http {
        status: status.as_u16(),
        url,
        message: error_message(&body),
    })
}

fn is_quota_response(status: StatusCode, headers: &HeaderMap, body: &str) -> bool {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return true;
    }

    if status != StatusCode::FORBIDDEN {
        return false;
    }

    let remaining_zero = headers
        .get("x-ratelimit-remaining")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim() == "0")
        .unwrap_or(false);

    remaining_zero
        || headers.contains_key(RETRY_AFTER)
        || body.to_ascii_lowercase().contains("rate limit")
}

fn parse_reset(headers: &HeaderMap) -> Option<DateTime<Utc>> {
    let epoch = headers
        .get("x-ratelimit-reset")?
        .to_str()
        .ok()?
        .trim()
        .parse::<i64>()
        .ok()?;
    Utc.timestamp_opt(epoch, 0).single()
}

fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.chars().take(200).collect())
}

async fn decode_json<T: DeserializeOwned>(response: Response) -> ClientResult<T> {
    let url = response.url().to_string();
    let body = response.text().await.map_err(ClientError::Unavailable)?;
    serde_json::from_str(&body).map_err(|e| ClientError::Decode {
        url,
        message: e.to_string(),
    })
}

fn decode_text(body: Vec<u8>, url: &str) -> ClientResult<String> {
    String::from_utf8(body).map_err(|e| ClientError::Decode {
        url: url.to_string(),
        message: e.to_string(),
    })
}
