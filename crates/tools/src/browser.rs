//! HTTP browser — fetches pages with `reqwest` and keeps the last one loaded.
//!
//! There is no rendering: the page content is the response body as text.
//! URLs without a scheme are fetched over plain `http://`.

use async_trait::async_trait;
use devpilot_core::error::ToolError;
use devpilot_core::tool::Browser;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, warn};

#[derive(Debug, Default, Clone)]
struct Page {
    url: String,
    content: String,
}

/// A headless browser backed by an HTTP client.
pub struct HttpBrowser {
    client: reqwest::Client,
    page: RwLock<Page>,
}

impl HttpBrowser {
    /// Create a browser whose page loads give up after `timeout_secs`.
    pub fn new(timeout_secs: u64) -> Result<Self, ToolError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(concat!("devpilot/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ToolError::ExecutionFailed {
                tool_name: "browser".into(),
                reason: format!("Failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            page: RwLock::new(Page::default()),
        })
    }

    fn normalize(url: &str) -> String {
        let url = url.trim();
        if url.contains("://") {
            url.to_string()
        } else {
            format!("http://{url}")
        }
    }
}

#[async_trait]
impl Browser for HttpBrowser {
    async fn navigate_to(&self, url: &str) -> Result<(), ToolError> {
        let target = Self::normalize(url);
        debug!(url = %target, "Navigating");

        let fail = |reason: String| ToolError::NavigationFailed {
            url: target.clone(),
            reason,
        };

        let response = self
            .client
            .get(&target)
            .send()
            .await
            .map_err(|e| fail(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            warn!(url = %target, status = status.as_u16(), "Page load returned error status");
        }

        let final_url = response.url().to_string();
        let content = response.text().await.map_err(|e| fail(e.to_string()))?;

        *self.page.write().await = Page {
            url: final_url,
            content,
        };
        Ok(())
    }

    async fn current_url(&self) -> Result<String, ToolError> {
        Ok(self.page.read().await.url.clone())
    }

    async fn page_content(&self) -> Result<String, ToolError> {
        Ok(self.page.read().await.content.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve one fixed HTML response on a local port.
    async fn serve_once(body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1024];
            let _ = socket.read(&mut buf).await;
            let response = format!(
                "HTTP/1.1 200 OK\r\ncontent-type: text/html\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
        });
        format!("{addr}/docs")
    }

    #[test]
    fn bare_host_gets_http_scheme() {
        assert_eq!(HttpBrowser::normalize("example.com"), "http://example.com");
        assert_eq!(
            HttpBrowser::normalize("https://example.com"),
            "https://example.com"
        );
    }

    #[tokio::test]
    async fn starts_blank() {
        let browser = HttpBrowser::new(5).unwrap();
        assert_eq!(browser.current_url().await.unwrap(), "");
        assert_eq!(browser.page_content().await.unwrap(), "");
    }

    #[tokio::test]
    async fn navigation_loads_page() {
        let address = serve_once("<h1>Docs</h1>").await;
        let browser = HttpBrowser::new(5).unwrap();

        browser.navigate_to(&address).await.unwrap();

        assert_eq!(
            browser.current_url().await.unwrap(),
            format!("http://{address}")
        );
        assert_eq!(browser.page_content().await.unwrap(), "<h1>Docs</h1>");
    }

    #[tokio::test]
    async fn unreachable_host_is_navigation_failure() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let browser = HttpBrowser::new(2).unwrap();
        let result = browser.navigate_to(&format!("http://{addr}/")).await;
        assert!(matches!(result, Err(ToolError::NavigationFailed { .. })));
    }
}
