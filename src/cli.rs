use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::config::{RenderMode, ScraperConfig};
use crate::prompt::{parse_count, parse_folder, parse_term};

#[derive(Parser, Debug)]
#[command(author, version, about = "Download the top Unsplash search results to a local folder")]
pub struct Cli {
    /// Search term(s); prompted for when omitted
    #[arg(long, value_parser = parse_term)]
    pub search: Option<String>,

    /// How many results to download; prompted for when omitted
    #[arg(long, value_parser = parse_count)]
    pub number: Option<usize>,

    /// Folder inside the library to save into; prompted for when omitted
    #[arg(long, value_parser = parse_folder)]
    pub folder: Option<String>,

    /// Root directory holding one folder per run
    #[arg(long)]
    pub library: Option<PathBuf>,

    /// Search page prefix the slugified term is appended to
    #[arg(long)]
    pub base_url: Option<String>,

    /// Maximum downloads in flight (unlimited by default)
    #[arg(long, value_parser = parse_limit)]
    pub concurrency: Option<usize>,

    /// Per-request timeout in seconds for image downloads
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Show the browser window
    #[arg(long)]
    pub headful: bool,

    /// Launch Chromium without its sandbox (needed in some containers)
    #[arg(long)]
    pub no_sandbox: bool,

    /// Query the server-rendered HTML instead of driving a browser
    #[arg(long)]
    pub static_html: bool,

    /// Print the run summary as JSON instead of the closing message
    #[arg(long)]
    pub json: bool,
}

fn parse_limit(raw: &str) -> Result<usize, String> {
    match raw.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(format!("expected a positive integer, got {:?}", raw)),
    }
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Layer the flags over an existing configuration.
    pub fn apply(&self, mut config: ScraperConfig) -> ScraperConfig {
        if let Some(library) = &self.library {
            config.library_path = library.clone();
        }
        if let Some(base_url) = &self.base_url {
            config.search_base_url = base_url.clone();
        }
        if self.concurrency.is_some() {
            config.concurrency = self.concurrency;
        }
        if let Some(secs) = self.timeout {
            config.request_timeout = Some(Duration::from_secs(secs));
        }
        if self.headful {
            config.headless = false;
        }
        if self.no_sandbox {
            config.no_sandbox = true;
        }
        if self.static_html {
            config.render_mode = RenderMode::StaticHtml;
        }
        config
    }
}
