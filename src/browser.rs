use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::{
    EventLifecycleEvent, SetLifecycleEventsEnabledParams,
};
use chromiumoxide::element::Element;
use chromiumoxide::error::CdpError;
use chromiumoxide::Page;
use futures::{Stream, StreamExt};
use scraper::{Html, Selector};
use serde_json::Value;
use tokio::task::JoinHandle;

use crate::config::ScraperConfig;

const USER_AGENT: &str = "unsplash-scraper/0.1";

// Lifecycle names Chromium reports for a frame's document.
const LIFECYCLE_INIT: &str = "init";
const NETWORK_ALMOST_IDLE: &str = "networkAlmostIdle";

// ── Error type ───────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum BrowserError {
    #[error("browser configuration rejected: {0}")]
    Config(String),
    #[error("DevTools protocol error: {0}")]
    Cdp(#[from] CdpError),
    #[error("invalid selector {0:?}")]
    Selector(String),
    #[error("no element at index {index} for {selector:?}")]
    Missing { selector: String, index: usize },
    #[error("results page request failed: {0}")]
    Request(#[from] reqwest::Error),
}

// ── Collaborator traits ──────────────────────────────────────────────────────

/// A rendered results page that can be queried by selector and index.
///
/// Element handles are never held across calls: a scroll may reflow the
/// page, so every operation re-resolves the element by its position.
#[async_trait]
pub trait ResultsPage: Send + Sync {
    /// Number of elements currently matching `selector`.
    async fn count(&self, selector: &str) -> Result<usize, BrowserError>;

    async fn scroll_into_view(&self, selector: &str, index: usize) -> Result<(), BrowserError>;

    /// Read a DOM property of the `index`-th match as JSON.
    async fn property(
        &self,
        selector: &str,
        index: usize,
        name: &str,
    ) -> Result<Option<Value>, BrowserError>;
}

/// Opens results pages.
#[async_trait]
pub trait PageLoader: Send + Sync {
    type Page: ResultsPage;

    async fn open(&self, url: &str) -> Result<Self::Page, BrowserError>;
}

// ── Chromium over CDP ────────────────────────────────────────────────────────

pub struct ChromeBrowser {
    browser: Browser,
    handler: JoinHandle<()>,
    idle_timeout: Duration,
    settle_delay: Duration,
}

impl ChromeBrowser {
    pub async fn launch(config: &ScraperConfig) -> Result<Self, BrowserError> {
        let mut builder = BrowserConfig::builder();
        if !config.headless {
            builder = builder.with_head();
        }
        if config.no_sandbox {
            builder = builder.no_sandbox();
        }
        let browser_config = builder.build().map_err(BrowserError::Config)?;

        let (browser, mut handler) = Browser::launch(browser_config).await?;
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!("browser handler stopped: {}", e);
                    break;
                }
            }
        });

        tracing::info!(headless = config.headless, "browser launched");
        Ok(Self {
            browser,
            handler,
            idle_timeout: config.idle_timeout,
            settle_delay: config.settle_delay,
        })
    }

    pub async fn close(mut self) -> Result<(), BrowserError> {
        self.browser.close().await?;
        if let Err(e) = self.browser.wait().await {
            tracing::warn!("browser process did not exit cleanly: {}", e);
        }
        if let Err(e) = self.handler.await {
            tracing::warn!("browser handler task failed: {}", e);
        }
        Ok(())
    }
}

#[async_trait]
impl PageLoader for ChromeBrowser {
    type Page = ChromePage;

    async fn open(&self, url: &str) -> Result<ChromePage, BrowserError> {
        let page = self.browser.new_page("about:blank").await?;
        page.execute(SetLifecycleEventsEnabledParams::new(true)).await?;
        let frame = page.mainframe().await?.map(|id| id.inner().clone());
        let events = page
            .event_listener::<EventLifecycleEvent>()
            .await?
            .map(|event| (event.frame_id.inner().clone(), event.name.clone()));

        page.goto(url).await?;

        let idle = network_almost_idle(events, frame.as_deref());
        match tokio::time::timeout(self.idle_timeout, idle).await {
            Ok(true) => tracing::debug!("network almost idle on {}", url),
            Ok(false) => tracing::warn!("lifecycle events ended before {} went idle", url),
            Err(_) => tracing::warn!(
                "{} still busy after {:?}, querying what has rendered",
                url,
                self.idle_timeout
            ),
        }
        if !self.settle_delay.is_zero() {
            tokio::time::sleep(self.settle_delay).await;
        }

        tracing::info!("loaded {}", url);
        Ok(ChromePage { page })
    }
}

/// Wait until `frame` commits a new document and then reports at most two
/// requests in flight (puppeteer's `networkidle2`). `None` accepts any frame.
///
/// Returns `false` if the event stream ends first.
async fn network_almost_idle<S>(events: S, frame: Option<&str>) -> bool
where
    S: Stream<Item = (String, String)>,
{
    futures::pin_mut!(events);
    let mut committed = false;
    while let Some((frame_id, name)) = events.next().await {
        if frame.is_some_and(|f| f != frame_id) {
            continue;
        }
        if name == LIFECYCLE_INIT {
            committed = true;
        } else if committed && name == NETWORK_ALMOST_IDLE {
            return true;
        }
    }
    false
}

pub struct ChromePage {
    page: Page,
}

impl ChromePage {
    async fn nth(&self, selector: &str, index: usize) -> Result<Element, BrowserError> {
        self.page
            .find_elements(selector)
            .await?
            .into_iter()
            .nth(index)
            .ok_or_else(|| BrowserError::Missing {
                selector: selector.to_string(),
                index,
            })
    }
}

#[async_trait]
impl ResultsPage for ChromePage {
    async fn count(&self, selector: &str) -> Result<usize, BrowserError> {
        Ok(self.page.find_elements(selector).await?.len())
    }

    async fn scroll_into_view(&self, selector: &str, index: usize) -> Result<(), BrowserError> {
        self.nth(selector, index).await?.scroll_into_view().await?;
        Ok(())
    }

    async fn property(
        &self,
        selector: &str,
        index: usize,
        name: &str,
    ) -> Result<Option<Value>, BrowserError> {
        Ok(self.nth(selector, index).await?.property(name).await?)
    }
}

// ── Server-rendered HTML ─────────────────────────────────────────────────────

/// Loader that fetches the results markup over plain HTTP.
pub struct HttpPageLoader {
    client: reqwest::Client,
}

impl HttpPageLoader {
    pub fn new(config: &ScraperConfig) -> Result<Self, BrowserError> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            ),
        );

        let mut builder = reqwest::ClientBuilder::new()
            .connect_timeout(Duration::from_secs(10))
            .redirect(reqwest::redirect::Policy::limited(10))
            .user_agent(USER_AGENT)
            .default_headers(headers);
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
        })
    }
}

#[async_trait]
impl PageLoader for HttpPageLoader {
    type Page = StaticPage;

    async fn open(&self, url: &str) -> Result<StaticPage, BrowserError> {
        let html = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        tracing::info!("fetched {} ({} bytes)", url, html.len());
        Ok(StaticPage::new(html))
    }
}

/// A page backed by a fixed HTML snapshot. Scrolling is a no-op.
pub struct StaticPage {
    html: String,
}

impl StaticPage {
    pub fn new(html: impl Into<String>) -> Self {
        Self { html: html.into() }
    }

    // `Html` is not `Send`, so the document is parsed per query and never
    // held across an await.
    fn with_nth<T>(
        &self,
        selector: &str,
        index: usize,
        f: impl FnOnce(scraper::ElementRef<'_>) -> T,
    ) -> Result<T, BrowserError> {
        let sel = parse_selector(selector)?;
        let document = Html::parse_document(&self.html);
        let el = document
            .select(&sel)
            .nth(index)
            .ok_or_else(|| BrowserError::Missing {
                selector: selector.to_string(),
                index,
            })?;
        Ok(f(el))
    }
}

fn parse_selector(selector: &str) -> Result<Selector, BrowserError> {
    Selector::parse(selector).map_err(|_| BrowserError::Selector(selector.to_string()))
}

#[async_trait]
impl ResultsPage for StaticPage {
    async fn count(&self, selector: &str) -> Result<usize, BrowserError> {
        let sel = parse_selector(selector)?;
        let document = Html::parse_document(&self.html);
        let count = document.select(&sel).count();
        Ok(count)
    }

    async fn scroll_into_view(&self, selector: &str, index: usize) -> Result<(), BrowserError> {
        self.with_nth(selector, index, |_| ())
    }

    async fn property(
        &self,
        selector: &str,
        index: usize,
        name: &str,
    ) -> Result<Option<Value>, BrowserError> {
        self.with_nth(selector, index, |el| {
            el.value().attr(name).map(|v| Value::String(v.to_string()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    fn lifecycle(events: &[(&str, &str)]) -> impl Stream<Item = (String, String)> {
        let owned: Vec<(String, String)> = events
            .iter()
            .map(|(f, n)| (f.to_string(), n.to_string()))
            .collect();
        stream::iter(owned)
    }

    #[tokio::test]
    async fn idle_waits_for_new_document() {
        // a late idle from the blank page must not count
        let events = lifecycle(&[
            ("main", "networkAlmostIdle"),
            ("main", "init"),
            ("main", "DOMContentLoaded"),
            ("main", "load"),
            ("main", "networkAlmostIdle"),
        ]);
        assert!(network_almost_idle(events, Some("main")).await);

        let events = lifecycle(&[("main", "networkAlmostIdle"), ("main", "init"), ("main", "load")]);
        assert!(!network_almost_idle(events, Some("main")).await);
    }

    #[tokio::test]
    async fn idle_ignores_other_frames() {
        let events = lifecycle(&[
            ("main", "init"),
            ("ad-frame", "init"),
            ("ad-frame", "networkAlmostIdle"),
        ]);
        assert!(!network_almost_idle(events, Some("main")).await);

        let events = lifecycle(&[("any", "init"), ("any", "networkAlmostIdle")]);
        assert!(network_almost_idle(events, None).await);
    }

    #[tokio::test]
    async fn idle_returns_when_it_arrives() {
        let events = lifecycle(&[("main", "init"), ("main", "networkAlmostIdle")])
            .chain(stream::pending());
        let waited = tokio::time::timeout(
            Duration::from_secs(5),
            network_almost_idle(events, Some("main")),
        )
        .await;
        assert_eq!(waited.ok(), Some(true));
    }

    const HTML: &str = r#"
        <html><body>
          <figure><a itemprop="contentUrl" href="/photos/a"><img srcset="https://images.example/photo-a?w=100 100w"></a></figure>
          <figure><a itemprop="contentUrl" href="/photos/b"><img src="https://images.example/photo-b"></a></figure>
          <figure><a href="/photos/c"><img srcset="https://images.example/photo-c?w=100 100w"></a></figure>
        </body></html>
    "#;

    const SELECTOR: &str = "a[itemprop='contentUrl'] img";

    #[tokio::test]
    async fn static_page_counts_matches() {
        let page = StaticPage::new(HTML);
        assert_eq!(page.count(SELECTOR).await.unwrap(), 2);
        assert_eq!(page.count("img").await.unwrap(), 3);
    }

    #[tokio::test]
    async fn static_page_reads_attributes_by_index() {
        let page = StaticPage::new(HTML);
        let first = page.property(SELECTOR, 0, "srcset").await.unwrap();
        assert_eq!(
            first,
            Some(Value::String("https://images.example/photo-a?w=100 100w".to_string()))
        );
        let second = page.property(SELECTOR, 1, "srcset").await.unwrap();
        assert_eq!(second, None);
    }

    #[tokio::test]
    async fn static_page_reports_missing_index() {
        let page = StaticPage::new(HTML);
        assert!(matches!(
            page.scroll_into_view(SELECTOR, 5).await,
            Err(BrowserError::Missing { index: 5, .. })
        ));
        assert!(page.scroll_into_view(SELECTOR, 1).await.is_ok());
    }

    #[tokio::test]
    async fn static_page_rejects_bad_selector() {
        let page = StaticPage::new(HTML);
        assert!(matches!(
            page.count("a[[").await,
            Err(BrowserError::Selector(_))
        ));
    }
}
