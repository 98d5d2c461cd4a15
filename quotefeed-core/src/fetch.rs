//! Page fetching.
//!
//! [`PageFetcher`] is the seam between the merge loop and the network.
//! [`HttpFetcher`] is the production implementation; tests substitute an
//! in-memory map.

use crate::config::HttpConfig;
use crate::error::FeedError;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Fetches the body of a page by URL.
pub trait PageFetcher: Send + Sync {
    fn fetch(&self, url: &str) -> Result<String, FeedError>;
}

/// Blocking HTTP fetcher. `file://` URLs are read from disk.
///
/// One attempt per call: paging stops on the merge loop's failure threshold,
/// so there is no retry loop here.
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    pub fn new(config: &HttpConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.as_str())
            .build()?;
        Ok(Self { client })
    }

    fn read_file(url: &Url) -> Result<String, FeedError> {
        let network = |message: String| FeedError::Network {
            url: url.to_string(),
            message,
        };
        let path = url
            .to_file_path()
            .map_err(|()| network("not a local file path".to_string()))?;
        std::fs::read_to_string(&path).map_err(|e| network(e.to_string()))
    }
}

impl PageFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<String, FeedError> {
        let parsed = Url::parse(url).map_err(|e| FeedError::Network {
            url: url.to_string(),
            message: format!("invalid URL: {e}"),
        })?;

        if parsed.scheme() == "file" {
            return Self::read_file(&parsed);
        }

        debug!(url, "fetching page");
        let network = |e: reqwest::Error| FeedError::Network {
            url: url.to_string(),
            message: e.to_string(),
        };

        let resp = self.client.get(parsed).send().map_err(network)?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FeedError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        resp.text().map_err(network)
    }
}
