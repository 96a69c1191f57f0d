use std::io;

use anyhow::{Context, Result};
use unsplash_scraper::cli::Cli;
use unsplash_scraper::prompt::Prompter;
use unsplash_scraper::{
    ChromeBrowser, DownloadOutcome, Downloader, HttpPageLoader, RenderMode, RunSummary,
    ScraperConfig, Scraper, SearchRequest,
};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(io::stderr)
        .init();

    let args = Cli::parse_args();
    let config = args.apply(ScraperConfig::from_env());

    let downloader = Downloader::new(&config.library_path, config.request_timeout)?
        .concurrency(config.concurrency);
    downloader
        .prepare()
        .await
        .with_context(|| format!("creating {}", config.library_path.display()))?;

    println!("\n  Welcome to the Unsplash image scraper, let's get some nice images! ...\n");

    let request = collect_request(&args).await?;
    println!(
        "\n  Now let's go download the top {} results from \"{}\" unsplash search...\n",
        request.count, request.term
    );

    let summary = match config.render_mode {
        RenderMode::Browser => {
            let browser = ChromeBrowser::launch(&config)
                .await
                .context("launching browser")?;
            let result = Scraper::new(&config, &browser, &downloader).run(&request).await;
            if let Err(e) = browser.close().await {
                tracing::warn!("closing browser failed: {}", e);
            }
            result?
        }
        RenderMode::StaticHtml => {
            let loader = HttpPageLoader::new(&config)?;
            Scraper::new(&config, &loader, &downloader).run(&request).await?
        }
    };

    if args.json {
        println!("{}", summary.to_json()?);
    } else {
        report(&summary);
    }
    Ok(())
}

async fn collect_request(args: &Cli) -> Result<SearchRequest> {
    let (search, number, folder) = (args.search.clone(), args.number, args.folder.clone());
    let request = tokio::task::spawn_blocking(move || {
        let stdin = io::stdin();
        let mut prompter = Prompter::new(stdin.lock(), io::stdout());
        prompter.complete(search, number, folder)
    })
    .await??;
    Ok(request)
}

fn report(summary: &RunSummary) {
    for outcome in &summary.outcomes {
        if let DownloadOutcome::Failed { url, reason, .. } = outcome {
            println!("  failed: {} ({})", url, reason);
        }
    }
    println!("\n  {}\n", summary.message());
}
