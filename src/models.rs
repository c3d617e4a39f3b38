//! Data models for headlines, images and blog posts.
//!
//! External API payloads are treated as untrusted: every field is optional or
//! defaulted so a missing key never fails decoding. Only malformed JSON does.
//!
//! - [`HeadlinesResponse`] / [`Article`]: NewsAPI `top-headlines` payload
//! - [`PhotoSearchResponse`]: Unsplash `search/photos` payload
//! - [`GeneratedContent`]: title and HTML body derived from one article
//! - [`NewPost`] / [`PublishedPost`]: Blogger `posts.insert` request and response

use serde::{Deserialize, Serialize};

/// Envelope of a NewsAPI `top-headlines` response.
///
/// On failure NewsAPI still answers with JSON, setting `status` to `"error"`
/// and filling `code`/`message` instead of `articles`.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HeadlinesResponse {
    pub status: Option<String>,
    pub total_results: Option<u64>,
    pub code: Option<String>,
    pub message: Option<String>,
    pub articles: Vec<Article>,
}

/// One headline. Only `url` matters across runs; it is the dedup key.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Article {
    /// `null` in some NewsAPI payloads.
    pub source: Option<ArticleSource>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub published_at: Option<String>,
}

impl Article {
    /// The dedup key, treating an empty string the same as a missing one.
    pub fn key(&self) -> Option<&str> {
        self.url.as_deref().filter(|u| !u.is_empty())
    }

    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or_default()
    }

    pub fn source_name(&self) -> &str {
        self.source
            .as_ref()
            .and_then(|s| s.name.as_deref())
            .unwrap_or_default()
    }

    pub fn description(&self) -> &str {
        self.description.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ArticleSource {
    pub name: Option<String>,
}

/// Envelope of an Unsplash `search/photos` response, reduced to what is used.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PhotoSearchResponse {
    pub results: Vec<Photo>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Photo {
    pub urls: PhotoUrls,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PhotoUrls {
    pub regular: Option<String>,
}

impl PhotoSearchResponse {
    /// `regular` rendition of the first result, if there is one.
    pub fn first_regular(self) -> Option<String> {
        self.results
            .into_iter()
            .next()
            .and_then(|p| p.urls.regular)
            .filter(|u| !u.is_empty())
    }
}

/// Title and HTML body produced for one article.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedContent {
    pub title: String,
    pub html: String,
}

/// Body of a Blogger `posts.insert` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewPost {
    pub kind: String,
    pub title: String,
    pub content: String,
}

/// The parts of the created post worth logging.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PublishedPost {
    pub id: Option<String>,
    pub url: Option<String>,
}
