use std::io;

use crate::browser::{BrowserError, PageLoader};
use crate::config::ScraperConfig;
use crate::download::{Downloader, Fetcher};
use crate::extract::extract_image_urls;
use crate::models::{RunSummary, SearchRequest};
use crate::slug::slugify;

// ── Error type ───────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    #[error("could not open results page: {0}")]
    Page(#[from] BrowserError),
    #[error("could not prepare image folder: {0}")]
    Folder(#[from] io::Error),
}

// ── Scraper ──────────────────────────────────────────────────────────────────

/// Search → extract → download, for one request.
pub struct Scraper<'a, L: PageLoader, F: Fetcher> {
    config: &'a ScraperConfig,
    loader: &'a L,
    downloader: &'a Downloader<F>,
}

impl<'a, L: PageLoader, F: Fetcher> Scraper<'a, L, F> {
    pub fn new(config: &'a ScraperConfig, loader: &'a L, downloader: &'a Downloader<F>) -> Self {
        Self {
            config,
            loader,
            downloader,
        }
    }

    pub async fn run(&self, request: &SearchRequest) -> Result<RunSummary, ScrapeError> {
        let search_url = self.config.search_url(&slugify(&request.term));
        println!("\n  Obtaining results from {}\n", search_url);

        let page = self.loader.open(&search_url).await?;
        let image_urls =
            extract_image_urls(&page, &self.config.image_selector, request.count).await;

        let folder_path = self.downloader.folder_path(&request.folder);
        println!("\n  Downloading images to {}/\n", folder_path.display());

        let outcomes = self
            .downloader
            .download_all(&image_urls, &request.folder)
            .await?;

        Ok(RunSummary {
            request: request.clone(),
            search_url,
            folder_path,
            image_urls,
            outcomes,
        })
    }
}
