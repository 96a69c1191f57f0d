use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, StreamExt};
use unsplash_scraper::browser::BrowserError;
use unsplash_scraper::download::{ByteStream, FetchError};
use unsplash_scraper::prompt::Prompter;
use unsplash_scraper::{
    Downloader, Fetcher, PageLoader, ScraperConfig, Scraper, SearchRequest, StaticPage,
};

/// Serves a fixed results page and remembers which URLs were opened.
struct FixtureLoader {
    html: String,
    opened: Mutex<Vec<String>>,
}

impl FixtureLoader {
    fn with_results(n: usize) -> Self {
        let figures: String = (0..n)
            .map(|i| {
                format!(
                    r#"<figure><a itemprop="contentUrl" href="/photos/{i}"><img srcset="https://images.example/photo-{i}?w=200&amp;q=60 200w, https://images.example/photo-{i}?w=400 400w"></a></figure>"#
                )
            })
            .collect();
        Self {
            html: format!("<html><body><div class=\"grid\">{figures}</div></body></html>"),
            opened: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl PageLoader for FixtureLoader {
    type Page = StaticPage;

    async fn open(&self, url: &str) -> Result<StaticPage, BrowserError> {
        self.opened.lock().unwrap().push(url.to_string());
        Ok(StaticPage::new(self.html.clone()))
    }
}

/// Answers every image request with a small body, except URLs containing `fail_on`.
struct ImageFetcher {
    fail_on: Option<&'static str>,
}

#[async_trait]
impl Fetcher for ImageFetcher {
    async fn fetch(&self, url: &str) -> Result<ByteStream, FetchError> {
        if self.fail_on.is_some_and(|needle| url.contains(needle)) {
            return Err(FetchError::Status(500));
        }
        let body = format!("bytes of {url}");
        Ok(stream::iter(vec![Ok(Bytes::from(body))]).boxed())
    }
}

fn config() -> ScraperConfig {
    ScraperConfig {
        search_base_url: "https://unsplash.test/search".to_string(),
        ..ScraperConfig::default()
    }
}

fn files_in(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[tokio::test]
async fn prompted_request_downloads_requested_count() {
    let dir = tempfile::tempdir().unwrap();
    let library = dir.path().join("unsplashimages");

    let mut prompter = Prompter::new("mountains\n3\nmtn-test\n".as_bytes(), Vec::new());
    let request = prompter.complete(None, None, None).unwrap();

    let config = config();
    let loader = FixtureLoader::with_results(5);
    let downloader = Downloader::with_fetcher(&library, ImageFetcher { fail_on: None });
    downloader.prepare().await.unwrap();

    let summary = Scraper::new(&config, &loader, &downloader)
        .run(&request)
        .await
        .unwrap();

    assert_eq!(
        *loader.opened.lock().unwrap(),
        vec!["https://unsplash.test/search/mountains".to_string()]
    );
    assert_eq!(summary.image_urls.len(), 3);
    assert_eq!(summary.succeeded(), 3);
    assert_eq!(summary.message(), "All 3 images downloaded");

    let folder = library.join("mtn-test");
    assert_eq!(summary.folder_path, folder);
    assert_eq!(
        files_in(&folder),
        vec!["photo-0.jpg", "photo-1.jpg", "photo-2.jpg"]
    );
    let body = std::fs::read_to_string(folder.join("photo-1.jpg")).unwrap();
    assert_eq!(body, "bytes of https://images.example/photo-1");
}

#[tokio::test]
async fn term_is_slugified_into_search_url() {
    let dir = tempfile::tempdir().unwrap();
    let config = config();
    let loader = FixtureLoader::with_results(1);
    let downloader = Downloader::with_fetcher(dir.path(), ImageFetcher { fail_on: None });

    let request = SearchRequest {
        term: "Red  Pandas".to_string(),
        count: 1,
        folder: "pandas".to_string(),
    };
    Scraper::new(&config, &loader, &downloader)
        .run(&request)
        .await
        .unwrap();

    assert_eq!(
        loader.opened.lock().unwrap()[0],
        "https://unsplash.test/search/red-pandas"
    );
}

#[tokio::test]
async fn partial_failure_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let config = config();
    let loader = FixtureLoader::with_results(5);
    let downloader = Downloader::with_fetcher(
        dir.path(),
        ImageFetcher {
            fail_on: Some("photo-2"),
        },
    );

    let request = SearchRequest {
        term: "lakes".to_string(),
        count: 5,
        folder: "water".to_string(),
    };
    let summary = Scraper::new(&config, &loader, &downloader)
        .run(&request)
        .await
        .unwrap();

    assert_eq!(summary.outcomes.len(), 5);
    assert_eq!(summary.failed(), 1);
    assert_eq!(summary.message(), "Downloaded 4 of 5 images (1 failed)");
    assert_eq!(files_in(&dir.path().join("water")).len(), 4);
}

#[tokio::test]
async fn more_requested_than_available() {
    let dir = tempfile::tempdir().unwrap();
    let config = config();
    let loader = FixtureLoader::with_results(2);
    let downloader = Downloader::with_fetcher(dir.path(), ImageFetcher { fail_on: None });

    let request = SearchRequest {
        term: "deserts".to_string(),
        count: 10,
        folder: "sand".to_string(),
    };
    let summary = Scraper::new(&config, &loader, &downloader)
        .run(&request)
        .await
        .unwrap();

    assert_eq!(summary.image_urls.len(), 2);
    assert_eq!(files_in(&dir.path().join("sand")).len(), 2);
}

#[tokio::test]
async fn empty_results_say_so() {
    let dir = tempfile::tempdir().unwrap();
    let config = config();
    let loader = FixtureLoader::with_results(0);
    let downloader = Downloader::with_fetcher(dir.path(), ImageFetcher { fail_on: None });

    let request = SearchRequest {
        term: "nothing".to_string(),
        count: 3,
        folder: "void".to_string(),
    };
    let summary = Scraper::new(&config, &loader, &downloader)
        .run(&request)
        .await
        .unwrap();

    assert!(summary.outcomes.is_empty());
    assert_eq!(summary.message(), "No images found for \"nothing\"");
    assert!(dir.path().join("void").is_dir());
}

#[tokio::test]
async fn zero_requested_downloads_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let config = config();
    let loader = FixtureLoader::with_results(5);
    let downloader = Downloader::with_fetcher(dir.path(), ImageFetcher { fail_on: None });

    let request = SearchRequest {
        term: "forests".to_string(),
        count: 0,
        folder: "trees".to_string(),
    };
    let summary = Scraper::new(&config, &loader, &downloader)
        .run(&request)
        .await
        .unwrap();

    assert!(summary.image_urls.is_empty());
    assert_eq!(summary.message(), "Nothing to download: 0 images requested");
    assert!(files_in(&dir.path().join("trees")).is_empty());
}
