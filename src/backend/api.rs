//! Remote service client. The gallery core only sees the `RemoteSource`
//! trait; `HttpSource` is the production implementation.

use crate::backend::error::{Error, Result};
use crate::backend::models::PageListing;

const MAX_ATTEMPTS: u32 = 3;

/// One typed request per remote listing operation.
#[derive(Debug, Clone)]
pub enum PageRequest {
    /// First page of an artist's posts.
    ArtistPage { artist_id: u64 },
    /// Any later page, via the continuation token of the previous one.
    NextPage { token: String },
    /// First page of the posts of everyone the user follows.
    FollowingFeed { publicity: Publicity },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Publicity {
    Public,
    Private,
}

impl Publicity {
    fn as_str(self) -> &'static str {
        match self {
            Publicity::Public => "public",
            Publicity::Private => "private",
        }
    }
}

pub trait RemoteSource {
    async fn fetch_page(&self, request: PageRequest) -> Result<PageListing>;
    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>>;
}

/// Retries transient remote failures up to three attempts, then surfaces
/// the last error. Non-transient errors return immediately.
pub async fn with_retries<T, F, Fut>(what: &str, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(v) => return Ok(v),
            Err(e) if e.is_transient() && attempt < MAX_ATTEMPTS => {
                log::warn!("{what} failed (attempt {attempt}/{MAX_ATTEMPTS}), retrying: {e}");
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

pub struct HttpSource {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpSource {
    pub fn new(base_url: &str, token: Option<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("gallery-tui/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request_url(&self, request: &PageRequest) -> String {
        match request {
            PageRequest::ArtistPage { artist_id } => {
                format!("{}/v1/users/{}/posts", self.base_url, artist_id)
            }
            PageRequest::FollowingFeed { publicity } => {
                format!(
                    "{}/v1/following/posts?restrict={}",
                    self.base_url,
                    publicity.as_str()
                )
            }
            PageRequest::NextPage { token } => self.rebase_token(token),
        }
    }

    /// Continuation tokens arrive as URLs from the service. Only their path
    /// and query are trusted; the host is always our configured one.
    fn rebase_token(&self, token: &str) -> String {
        let path_and_query = token
            .split_once("://")
            .and_then(|(_, rest)| rest.split_once('/'))
            .map(|(_, p)| format!("/{p}"))
            .unwrap_or_else(|| token.to_string());
        format!("{}{}", self.base_url, path_and_query)
    }

    fn get(&self, url: &str) -> reqwest::RequestBuilder {
        let mut req = self.client.get(url);
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }
        req
    }
}

impl RemoteSource for HttpSource {
    async fn fetch_page(&self, request: PageRequest) -> Result<PageListing> {
        if let PageRequest::NextPage { token } = &request {
            let offset = parse_query(token)
                .into_iter()
                .find(|(k, _)| k == "offset")
                .map(|(_, v)| v);
            log::info!("resolving continuation token (offset {offset:?})");
        }

        let url = self.request_url(&request);
        log::info!("fetching page listing from {url}");
        let response = check_status(self.get(&url).send().await?, &url)?;
        Ok(response.json::<PageListing>().await?)
    }

    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>> {
        let response = check_status(self.get(url).send().await?, url)?;
        Ok(response.bytes().await?.to_vec())
    }
}

fn check_status(response: reqwest::Response, what: &str) -> Result<reqwest::Response> {
    let status = response.status();
    if status == reqwest::StatusCode::NOT_FOUND {
        return Err(Error::SubjectNotFound(what.to_string()));
    }
    if status.is_server_error() || status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        return Err(Error::Remote(format!("{what}: HTTP {status}")));
    }
    Ok(response.error_for_status()?)
}

/// Percent-decoded key/value pairs of a URL's query string.
pub fn parse_query(url: &str) -> Vec<(String, String)> {
    let Some((_, query)) = url.split_once('?') else {
        return Vec::new();
    };
    query
        .split('&')
        .filter_map(|pair| {
            let (k, v) = pair.split_once('=')?;
            Some((
                urlencoding::decode(k).ok()?.into_owned(),
                urlencoding::decode(v).ok()?.into_owned(),
            ))
        })
        .collect()
}
