//! Page fetching for the video platform
//!
//! The extraction pipeline only ever asks for text by URL. [`PageFetcher`]
//! is that boundary; [`HttpFetcher`] is the reqwest-backed implementation
//! used by the binary, tests inject their own.

use crate::error::RytexError;
use async_trait::async_trait;
use reqwest::{Client, ClientBuilder};
use std::time::Duration;
use tracing::{debug, warn};

/// Default desktop browser user agent
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/135.0.0.0 Safari/537.36";

/// Retrieves raw text for a URL
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch `url` and return the response body as text
    async fn fetch(&self, url: &str) -> Result<String, RytexError>;
}

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Request timeout; `None` leaves requests unbounded
    pub timeout: Option<Duration>,
    /// User agent string
    pub user_agent: Option<String>,
    /// Proxy URL
    pub proxy_url: Option<String>,
    /// Accept-Language header value
    pub accept_language: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: None,
            user_agent: None,
            proxy_url: None,
            accept_language: "en-US,en;q=0.9".to_string(),
        }
    }
}

impl HttpClientConfig {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn with_proxy(mut self, proxy_url: impl Into<String>) -> Self {
        self.proxy_url = Some(proxy_url.into());
        self
    }

    pub fn with_accept_language(mut self, accept_language: impl Into<String>) -> Self {
        self.accept_language = accept_language.into();
        self
    }
}

/// Base URLs of the site endpoints the pipeline talks to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    /// Site origin, used to resolve relative player script paths
    pub origin: String,
    /// Watch page, the video id is appended as `v`
    pub watch: String,
    /// Embedded player page, the video id is appended as a path segment
    pub embed: String,
    /// Legacy video info endpoint
    pub video_info: String,
    /// Timed text (subtitle) service
    pub timedtext: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self::with_origin("https://www.youtube.com")
    }
}

impl Endpoints {
    /// Derive every endpoint from one origin, e.g. a local mirror
    pub fn with_origin(origin: &str) -> Self {
        let origin = origin.trim_end_matches('/');
        Self {
            origin: origin.to_string(),
            watch: format!("{}/watch", origin),
            embed: format!("{}/embed", origin),
            video_info: format!("{}/get_video_info", origin),
            timedtext: "https://video.google.com/timedtext".to_string(),
        }
    }

    pub fn with_timedtext(mut self, timedtext: &str) -> Self {
        self.timedtext = timedtext.to_string();
        self
    }

    pub fn watch_url(&self, video_id: &str) -> String {
        format!("{}?v={}", self.watch, video_id)
    }

    pub fn embed_url(&self, video_id: &str) -> String {
        format!("{}/{}", self.embed, video_id)
    }

    /// Legacy video info URL used by the age-restricted fallback
    pub fn video_info_url(&self, video_id: &str, sts: &str) -> String {
        let eurl = format!("https://youtube.googleapis.com/v/{}", video_id);
        format!(
            "{}?video_id={}&eurl={}&sts={}",
            self.video_info,
            video_id,
            urlencoding::encode(&eurl),
            sts
        )
    }

    pub fn subtitle_list_url(&self, video_id: &str) -> String {
        format!("{}?type=list&v={}", self.timedtext, video_id)
    }

    pub fn subtitle_track_url(&self, video_id: &str, lang: &str) -> String {
        format!(
            "{}?lang={}&v={}",
            self.timedtext,
            urlencoding::encode(lang),
            video_id
        )
    }

    /// Resolve a possibly relative player script path against the origin
    pub fn resolve(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else if let Some(rest) = path.strip_prefix("//") {
            format!("https://{}", rest)
        } else {
            format!("{}/{}", self.origin, path.trim_start_matches('/'))
        }
    }
}

/// reqwest-backed [`PageFetcher`]
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    config: HttpClientConfig,
}

impl HttpFetcher {
    /// Create a fetcher with default configuration
    pub fn new() -> Result<Self, RytexError> {
        Self::with_config(HttpClientConfig::default())
    }

    /// Create a fetcher with custom configuration
    pub fn with_config(config: HttpClientConfig) -> Result<Self, RytexError> {
        let mut builder = ClientBuilder::new()
            .gzip(true)
            .brotli(true)
            .cookie_store(true)
            .user_agent(
                config
                    .user_agent
                    .as_deref()
                    .unwrap_or(DEFAULT_USER_AGENT),
            );

        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        if let Some(proxy_url) = &config.proxy_url {
            match reqwest::Proxy::all(proxy_url) {
                Ok(proxy) => builder = builder.proxy(proxy),
                Err(e) => {
                    return Err(RytexError::InvalidInput(format!(
                        "invalid proxy url {}: {}",
                        proxy_url, e
                    )))
                }
            }
        }

        let client = builder
            .build()
            .map_err(|e| RytexError::InvalidInput(format!("HTTP client setup failed: {}", e)))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }

    /// Create a GET request with browser-like headers
    fn create_request(&self, url: &str) -> reqwest::RequestBuilder {
        self.client
            .get(url)
            .header(
                "Accept",
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            )
            .header("Accept-Language", self.config.accept_language.as_str())
            .header("Connection", "keep-alive")
            .header("Cache-Control", "no-cache")
            .header("DNT", "1")
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, RytexError> {
        debug!("GET {}", url);
        let response = self
            .create_request(url)
            .send()
            .await
            .map_err(|e| RytexError::network(url, e))?;

        let status = response.status();
        if !status.is_success() {
            warn!("GET {} returned {}", url, status);
            return Err(RytexError::network(url, format!("HTTP status {}", status)));
        }

        let body = response
            .text()
            .await
            .map_err(|e| RytexError::network(url, e))?;
        debug!("GET {} -> {} bytes", url, body.len());
        Ok(body)
    }
}
