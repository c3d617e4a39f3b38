//! Unsplash photo search client.

use crate::config::IMAGE_CANDIDATES;
use crate::error::Result;
use crate::models::PhotoSearchResponse;
use crate::sources::ImageSource;
use reqwest::Client;
use reqwest::header::AUTHORIZATION;
use tracing::{info, instrument, warn};

const SEARCH_PHOTOS_URL: &str = "https://api.unsplash.com/search/photos";

#[derive(Debug, Clone)]
pub struct UnsplashClient {
    http: Client,
    endpoint: String,
    access_key: String,
}

impl UnsplashClient {
    pub fn new(http: Client, access_key: impl Into<String>) -> Self {
        Self {
            http,
            endpoint: SEARCH_PHOTOS_URL.to_string(),
            access_key: access_key.into(),
        }
    }

    #[cfg(test)]
    fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

impl ImageSource for UnsplashClient {
    #[instrument(level = "info", skip(self))]
    async fn fetch_image(&self, query: &str) -> Result<Option<String>> {
        let per_page = IMAGE_CANDIDATES.to_string();
        let resp = self
            .http
            .get(&self.endpoint)
            .header(AUTHORIZATION, format!("Client-ID {}", self.access_key))
            .query(&[("query", query), ("per_page", per_page.as_str())])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            warn!(%status, "Unsplash search did not succeed");
        }

        let image = resp.json::<PhotoSearchResponse>().await?.first_regular();
        match &image {
            Some(url) => info!(%url, "Found image"),
            None => info!("No image found; posting without one"),
        }
        Ok(image)
    }
}
