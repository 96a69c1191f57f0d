use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_LIBRARY: &str = "./unsplashimages";
pub const DEFAULT_SEARCH_BASE_URL: &str = "https://www.unsplash.com/search";
pub const DEFAULT_IMAGE_SELECTOR: &str = "a[itemprop='contentUrl'] img";

const LIBRARY_ENV: &str = "UNSPLASH_SCRAPER_LIBRARY";
const BASE_URL_ENV: &str = "UNSPLASH_SCRAPER_BASE_URL";
const CONCURRENCY_ENV: &str = "UNSPLASH_SCRAPER_CONCURRENCY";
const NO_SANDBOX_ENV: &str = "UNSPLASH_SCRAPER_NO_SANDBOX";

/// How the results page gets rendered before it is queried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    /// Drive a headless Chromium over the DevTools protocol.
    Browser,
    /// Plain HTTP fetch of the server-rendered markup.
    StaticHtml,
}

#[derive(Debug, Clone)]
pub struct ScraperConfig {
    pub library_path: PathBuf,
    pub search_base_url: String,
    pub image_selector: String,
    /// `None` launches every download at once.
    pub concurrency: Option<usize>,
    pub headless: bool,
    pub no_sandbox: bool,
    /// Longest wait for the results page to go network-idle before querying it anyway.
    pub idle_timeout: Duration,
    /// Optional pause after the page goes idle.
    pub settle_delay: Duration,
    pub request_timeout: Option<Duration>,
    pub render_mode: RenderMode,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            library_path: PathBuf::from(DEFAULT_LIBRARY),
            search_base_url: DEFAULT_SEARCH_BASE_URL.to_string(),
            image_selector: DEFAULT_IMAGE_SELECTOR.to_string(),
            concurrency: None,
            headless: true,
            no_sandbox: false,
            idle_timeout: Duration::from_secs(30),
            settle_delay: Duration::ZERO,
            request_timeout: None,
            render_mode: RenderMode::Browser,
        }
    }
}

impl ScraperConfig {
    /// Defaults with any `UNSPLASH_SCRAPER_*` environment overrides applied.
    pub fn from_env() -> Self {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(library) = lookup(LIBRARY_ENV).filter(|v| !v.trim().is_empty()) {
            self.library_path = PathBuf::from(library);
        }
        if let Some(base) = lookup(BASE_URL_ENV).filter(|v| !v.trim().is_empty()) {
            self.search_base_url = base;
        }
        if let Some(raw) = lookup(CONCURRENCY_ENV) {
            match raw.trim().parse::<usize>() {
                Ok(n) if n > 0 => self.concurrency = Some(n),
                _ => tracing::warn!("ignoring {}={:?}: expected a positive integer", CONCURRENCY_ENV, raw),
            }
        }
        if lookup(NO_SANDBOX_ENV).as_deref() == Some("1") {
            self.no_sandbox = true;
        }
        self
    }

    /// Full results-page URL for an already slugified term.
    pub fn search_url(&self, slug: &str) -> String {
        format!("{}/{}", self.search_base_url.trim_end_matches('/'), slug)
    }
}
