pub mod browser;
pub mod cli;
pub mod config;
pub mod download;
pub mod extract;
pub mod models;
pub mod pipeline;
pub mod prompt;
pub mod slug;

pub use browser::{ChromeBrowser, HttpPageLoader, PageLoader, ResultsPage, StaticPage};
pub use config::{RenderMode, ScraperConfig};
pub use download::{Downloader, Fetcher, ReqwestFetcher};
pub use models::{DownloadOutcome, DownloadTarget, RunSummary, SearchRequest};
pub use pipeline::{ScrapeError, Scraper};
pub use slug::slugify;
