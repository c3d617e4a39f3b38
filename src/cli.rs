//! Command-line interface definitions for Auto Blog.
//!
//! Every option can be given as a flag or through the environment. The three
//! API secrets are normally only set in the environment (or a `.env` file),
//! the rest fall back to the defaults the job was designed around.

use clap::Parser;

/// Command-line arguments for a single posting run.
///
/// # Examples
///
/// ```sh
/// # Typical cron invocation, secrets from the environment
/// NEWS_API_KEY=... UNSPLASH_KEY=... BLOG_ID=... auto_blog
///
/// # Different window and no jitter
/// auto_blog --start-hour 7 --end-hour 23 --min-delay 0 --max-delay 0
/// ```
#[derive(Parser, Debug, Clone)]
#[command(author, version, about)]
pub struct Cli {
    /// NewsAPI key
    #[arg(long, env = "NEWS_API_KEY", hide_env_values = true)]
    pub news_api_key: Option<String>,

    /// Unsplash access key, sent as `Client-ID`
    #[arg(long, env = "UNSPLASH_KEY", hide_env_values = true)]
    pub unsplash_key: Option<String>,

    /// Target Blogger blog id
    #[arg(long, env = "BLOG_ID")]
    pub blog_id: Option<String>,

    /// JSON file holding the URLs that were already posted
    #[arg(long, env = "POSTED_FILE", default_value = "posted_urls.json")]
    pub posted_file: String,

    /// Cached OAuth token for Blogger
    #[arg(long, env = "TOKEN_FILE", default_value = "token.json")]
    pub token_file: String,

    /// OAuth client secret downloaded from the Google console
    #[arg(long, env = "CLIENT_SECRET_FILE", default_value = "client_secret.json")]
    pub client_secret_file: String,

    /// Time zone the posting window is evaluated in
    #[arg(long, default_value = "Asia/Kolkata")]
    pub timezone: String,

    /// First local hour at which posting is allowed
    #[arg(long, default_value_t = 9)]
    pub start_hour: u32,

    /// Local hour at which posting stops (exclusive)
    #[arg(long, default_value_t = 20)]
    pub end_hour: u32,

    /// Minimum random delay before posting, in minutes
    #[arg(long, default_value_t = 5)]
    pub min_delay: u64,

    /// Maximum random delay before posting, in minutes
    #[arg(long, default_value_t = 20)]
    pub max_delay: u64,

    /// NewsAPI country filter for top headlines
    #[arg(long, default_value = "in")]
    pub country: String,
}
