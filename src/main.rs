//! # Auto Blog
//!
//! A single-run batch job that posts one trending headline to a Blogger blog.
//! It is meant to be invoked periodically by an external scheduler such as
//! cron; overlapping runs are not guarded against.
//!
//! ## Usage
//!
//! ```sh
//! NEWS_API_KEY=... UNSPLASH_KEY=... BLOG_ID=... auto_blog
//! ```
//!
//! ## Architecture
//!
//! Each run walks a short fixed sequence:
//! 1. **Gate**: skip entirely outside the daytime window (Asia/Kolkata by default)
//! 2. **Jitter**: sleep a random 5–20 minutes so posts do not land on the cron tick
//! 3. **Fetch**: pull the top headlines from NewsAPI
//! 4. **Select**: take the first headline whose URL was never posted
//! 5. **Publish**: render the HTML, attach an Unsplash image, post to Blogger
//! 6. **Record**: append the URL to `posted_urls.json`

use chrono::Utc;
use clap::Parser;
use std::error::Error;
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod blogger;
mod cli;
mod config;
mod content;
mod dedup;
mod error;
mod models;
mod pipeline;
mod schedule;
mod sources;
#[cfg(test)]
mod testing;
mod utils;

use blogger::{Authenticator, Blogger, BloggerClient};
use cli::Cli;
use config::{BLOGGER_SCOPE, Config, HTTP_TIMEOUT};
use pipeline::{Pipeline, RunOutcome};
use sources::{NewsApiClient, UnsplashClient};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Secrets may live in a local .env next to the job; RUST_LOG too, so load it first.
    let dotenv = dotenvy::dotenv();

    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("auto_blog starting up");
    if let Some(e) = unusable_dotenv(&dotenv) {
        warn!(error = %e, "Could not load .env; continuing with the process environment");
    }

    // Parse CLI
    let args = Cli::parse();
    debug!(?args.posted_file, ?args.timezone, "Parsed CLI arguments");
    let config = Config::try_from(args)?;

    let http = reqwest::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()?;

    let news = NewsApiClient::new(http.clone(), &config.news_api_key, &config.country);
    let images = UnsplashClient::new(http.clone(), &config.unsplash_key);
    let publisher = Blogger::new(
        Authenticator::new(
            http.clone(),
            &config.token_file,
            &config.client_secret_file,
            BLOGGER_SCOPE,
        ),
        BloggerClient::new(http, &config.blog_id),
    );

    let outcome = Pipeline::new(&config, news, images, publisher)
        .run(Utc::now())
        .await?;

    match &outcome {
        RunOutcome::OutsideWindow { local_hour } => {
            info!(local_hour, "Night time in the posting zone; nothing posted")
        }
        RunOutcome::NothingNew { candidates } => {
            info!(candidates, "No unposted articles this run")
        }
        RunOutcome::Posted { title, url, post_url } => info!(
            %title,
            %url,
            post_url = post_url.as_deref().unwrap_or_default(),
            "Posted article"
        ),
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );
    Ok(())
}

/// A `.env` load error worth reporting; an absent file is not one.
fn unusable_dotenv<T>(result: &dotenvy::Result<T>) -> Option<&dotenvy::Error> {
    result.as_ref().err().filter(|e| !e.not_found())
}
