//! Run configuration.
//!
//! [`Config`] is built once from the parsed [`Cli`] and handed by reference to
//! every component. Constants that are not worth a flag live here too.

use crate::cli::Cli;
use crate::error::{Error, Result};
use crate::schedule::{DelayRange, PostingWindow};
use chrono_tz::Tz;
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

/// Headlines requested per run.
pub const NEWS_PAGE_SIZE: u32 = 10;
/// Image candidates requested per search.
pub const IMAGE_CANDIDATES: u32 = 5;
/// Timeout applied to every outbound HTTP call.
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(10);
/// OAuth scope needed to create posts.
pub const BLOGGER_SCOPE: &str = "https://www.googleapis.com/auth/blogger";
/// Longest pre-post delay accepted, in minutes (one day).
pub const MAX_DELAY_MINUTES: u64 = 24 * 60;

/// Validated settings for one run.
#[derive(Debug, Clone)]
pub struct Config {
    pub news_api_key: String,
    pub unsplash_key: String,
    pub blog_id: String,
    pub country: String,
    pub posted_file: PathBuf,
    pub token_file: PathBuf,
    pub client_secret_file: PathBuf,
    pub window: PostingWindow,
    pub delay: DelayRange,
}

impl TryFrom<Cli> for Config {
    type Error = Error;

    fn try_from(cli: Cli) -> Result<Self> {
        let tz: Tz = cli
            .timezone
            .parse()
            .map_err(|e| Error::Config(format!("unknown time zone {:?}: {e}", cli.timezone)))?;

        if cli.end_hour > 24 || cli.start_hour >= cli.end_hour {
            return Err(Error::Config(format!(
                "posting window [{}, {}) is empty or out of range",
                cli.start_hour, cli.end_hour
            )));
        }
        if cli.max_delay > MAX_DELAY_MINUTES {
            return Err(Error::Config(format!(
                "max delay {} exceeds {MAX_DELAY_MINUTES} minutes",
                cli.max_delay
            )));
        }
        if cli.min_delay > cli.max_delay {
            return Err(Error::Config(format!(
                "min delay {} exceeds max delay {}",
                cli.min_delay, cli.max_delay
            )));
        }

        Ok(Self {
            news_api_key: secret_or_empty(cli.news_api_key, "NEWS_API_KEY"),
            unsplash_key: secret_or_empty(cli.unsplash_key, "UNSPLASH_KEY"),
            blog_id: secret_or_empty(cli.blog_id, "BLOG_ID"),
            country: cli.country,
            posted_file: PathBuf::from(cli.posted_file),
            token_file: PathBuf::from(cli.token_file),
            client_secret_file: PathBuf::from(cli.client_secret_file),
            window: PostingWindow {
                tz,
                start_hour: cli.start_hour,
                end_hour: cli.end_hour,
            },
            delay: DelayRange {
                min_minutes: cli.min_delay,
                max_minutes: cli.max_delay,
            },
        })
    }
}

// A missing secret is not fatal here; the API that needs it will reject the call.
fn secret_or_empty(value: Option<String>, var: &str) -> String {
    match value {
        Some(v) if !v.is_empty() => v,
        _ => {
            warn!(var, "Secret not set; the corresponding API call will likely be rejected");
            String::new()
        }
    }
}
