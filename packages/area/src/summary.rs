//! Encyclopedia page summaries for unserved areas.
//!
//! See <https://en.wikipedia.org/api/rest_v1/#/Page%20content/get_page_summary__title_>

use crate::AreaError;

/// Default base URL of the page summary endpoint.
pub const DEFAULT_SUMMARY_URL: &str = "https://en.wikipedia.org/api/rest_v1/page/summary";

/// Source of short encyclopedia summaries keyed by page title.
#[async_trait::async_trait]
pub trait SummaryClient: Send + Sync {
    /// Fetches the summary for `title`.
    ///
    /// Returns `Ok(None)` when the service answered with a non-success
    /// status (page missing, throttled, ...).
    ///
    /// # Errors
    ///
    /// Returns [`AreaError`] if the request could not be made or the body
    /// is not JSON.
    async fn summary(&self, title: &str) -> Result<Option<serde_json::Value>, AreaError>;
}

/// Wikipedia REST page summary client.
pub struct WikipediaClient {
    base_url: String,
    client: reqwest::Client,
}

impl WikipediaClient {
    /// Creates a client for the given summary endpoint base URL.
    ///
    /// # Errors
    ///
    /// Returns [`AreaError::Http`] if the HTTP client cannot be built.
    pub fn new(base_url: &str) -> Result<Self, AreaError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("area-insights/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Creates a client using `WIKI_SUMMARY_URL`, defaulting to Wikipedia.
    ///
    /// # Errors
    ///
    /// Returns [`AreaError::Http`] if the HTTP client cannot be built.
    pub fn from_env() -> Result<Self, AreaError> {
        let base_url =
            std::env::var("WIKI_SUMMARY_URL").unwrap_or_else(|_| DEFAULT_SUMMARY_URL.to_string());
        Self::new(&base_url)
    }

    /// Builds `<base>/<title>` with the title percent-encoded as a single
    /// path segment.
    fn page_url(&self, title: &str) -> Result<reqwest::Url, AreaError> {
        let mut url = reqwest::Url::parse(&self.base_url).map_err(|e| AreaError::InvalidUrl {
            message: format!("{}: {e}", self.base_url),
        })?;
        url.path_segments_mut()
            .map_err(|()| AreaError::InvalidUrl {
                message: format!("{} cannot be a base URL", self.base_url),
            })?
            .pop_if_empty()
            .push(title);
        Ok(url)
    }
}

#[async_trait::async_trait]
impl SummaryClient for WikipediaClient {
    async fn summary(&self, title: &str) -> Result<Option<serde_json::Value>, AreaError> {
        let url = self.page_url(title)?;
        log::debug!("Fetching page summary: {url}");

        let resp = self.client.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            log::warn!("Page summary for '{title}' returned HTTP {status}");
            return Ok(None);
        }

        Ok(Some(resp.json().await?))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tokio::io::{AsyncReadExt as _, AsyncWriteExt as _};
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;

    use super::*;

    /// Answers one request with `status` and `body`, returning the base URL
    /// and the request line the client sent.
    async fn serve_once(
        status: &'static str,
        body: &'static str,
    ) -> (String, oneshot::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = oneshot::channel();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut head = Vec::new();
            let mut buf = [0_u8; 1024];
            while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                head.extend_from_slice(&buf[..n]);
            }
            let request_line = String::from_utf8_lossy(&head)
                .lines()
                .next()
                .unwrap_or_default()
                .to_string();
            let _ = tx.send(request_line);
            let response = format!(
                "HTTP/1.1 {status}\r\ncontent-type: application/json\r\n\
                 content-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
        });
        (format!("http://{addr}/api/rest_v1/page/summary"), rx)
    }

    #[tokio::test]
    async fn missing_page_is_none() {
        let (base_url, request) = serve_once(
            "404 Not Found",
            r#"{"type":"https://mediawiki.org/wiki/HyperSwitch/errors/not_found"}"#,
        )
        .await;
        let client = WikipediaClient::new(&base_url).unwrap();

        assert_eq!(client.summary("Nowhere Nagar").await.unwrap(), None);
        assert_eq!(
            request.await.unwrap(),
            "GET /api/rest_v1/page/summary/Nowhere%20Nagar HTTP/1.1"
        );
    }

    #[tokio::test]
    async fn found_page_returns_its_json() {
        let (base_url, request) = serve_once(
            "200 OK",
            r#"{"title":"Yelahanka","extract":"Yelahanka is a suburb of Bengaluru."}"#,
        )
        .await;
        let client = WikipediaClient::new(&base_url).unwrap();

        assert_eq!(
            client.summary("Yelahanka").await.unwrap(),
            Some(json!({
                "title": "Yelahanka",
                "extract": "Yelahanka is a suburb of Bengaluru."
            }))
        );
        assert_eq!(
            request.await.unwrap(),
            "GET /api/rest_v1/page/summary/Yelahanka HTTP/1.1"
        );
    }

    #[test]
    fn encodes_title_as_single_segment() {
        let client = WikipediaClient::new("https://example.org/api/page/summary/").unwrap();
        let url = client.page_url("BTM Layout/2nd Stage").unwrap();
        assert_eq!(
            url.as_str(),
            "https://example.org/api/page/summary/BTM%20Layout%2F2nd%20Stage"
        );
    }

    #[test]
    fn rejects_unparseable_base_url() {
        let client = WikipediaClient::new("not a url").unwrap();
        assert!(matches!(
            client.page_url("Yelahanka"),
            Err(AreaError::InvalidUrl { .. })
        ));
    }
}
