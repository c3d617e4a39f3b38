//! Blogger v3 `posts.insert`.

use crate::blogger::auth::BearerToken;
use crate::error::Result;
use crate::models::{NewPost, PublishedPost};
use reqwest::Client;
use tracing::{info, instrument};

const BLOGGER_API_BASE: &str = "https://www.googleapis.com/blogger/v3";

#[derive(Debug, Clone)]
pub struct BloggerClient {
    http: Client,
    api_base: String,
    blog_id: String,
}

impl BloggerClient {
    pub fn new(http: Client, blog_id: impl Into<String>) -> Self {
        Self {
            http,
            api_base: BLOGGER_API_BASE.to_string(),
            blog_id: blog_id.into(),
        }
    }

    #[cfg(test)]
    fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Create `post` as a live (non-draft) post. Any non-2xx answer is an error.
    #[instrument(level = "info", skip_all, fields(blog_id = %self.blog_id, title = %post.title))]
    pub async fn insert_post(&self, token: &BearerToken, post: &NewPost) -> Result<PublishedPost> {
        let endpoint = format!("{}/blogs/{}/posts", self.api_base, self.blog_id);
        let published = self
            .http
            .post(endpoint)
            .query(&[("isDraft", "false")])
            .bearer_auth(token.secret())
            .json(post)
            .send()
            .await?
            .error_for_status()?
            .json::<PublishedPost>()
            .await?;

        info!(
            id = published.id.as_deref().unwrap_or_default(),
            url = published.url.as_deref().unwrap_or_default(),
            "Blogger accepted post"
        );
        Ok(published)
    }
}
