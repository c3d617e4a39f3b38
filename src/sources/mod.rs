//! Upstream content sources.
//!
//! Each source is a trait so the pipeline can run against in-memory fakes;
//! the real clients talk to public HTTP APIs through one shared
//! `reqwest::Client` that carries the request timeout.
//!
//! | Source | Module | API |
//! |--------|--------|-----|
//! | Headlines | [`news`] | NewsAPI `v2/top-headlines` |
//! | Images | [`images`] | Unsplash `search/photos` |
//!
//! Neither client retries or paginates. A response without the expected
//! field yields an empty result rather than an error.

pub mod images;
pub mod news;

use crate::error::Result;
use crate::models::Article;

pub use images::UnsplashClient;
pub use news::NewsApiClient;

/// Something that can hand over the current batch of candidate articles.
pub trait NewsSource {
    /// Fetch the batch, in the order the source ranks it.
    async fn fetch_batch(&self) -> Result<Vec<Article>>;
}

/// Something that can find a representative image URL for a query.
pub trait ImageSource {
    /// URL of the best match, or `None` when the search came back empty.
    async fn fetch_image(&self, query: &str) -> Result<Option<String>>;
}
