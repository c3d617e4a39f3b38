//! NewsAPI top-headlines client.
//!
//! One GET per run, filtered by country and capped at [`NEWS_PAGE_SIZE`]
//! articles. NewsAPI reports failures as JSON bodies with `status: "error"`;
//! those are logged and produce an empty batch instead of an error.

use crate::config::NEWS_PAGE_SIZE;
use crate::error::Result;
use crate::models::{Article, HeadlinesResponse};
use crate::sources::NewsSource;
use crate::utils::truncate_for_log;
use reqwest::Client;
use tracing::{debug, info, instrument, warn};

const TOP_HEADLINES_URL: &str = "https://newsapi.org/v2/top-headlines";

#[derive(Debug, Clone)]
pub struct NewsApiClient {
    http: Client,
    endpoint: String,
    api_key: String,
    country: String,
}

impl NewsApiClient {
    pub fn new(http: Client, api_key: impl Into<String>, country: impl Into<String>) -> Self {
        Self {
            http,
            endpoint: TOP_HEADLINES_URL.to_string(),
            api_key: api_key.into(),
            country: country.into(),
        }
    }

    #[cfg(test)]
    fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

impl NewsSource for NewsApiClient {
    #[instrument(level = "info", skip_all, fields(country = %self.country))]
    async fn fetch_batch(&self) -> Result<Vec<Article>> {
        let page_size = NEWS_PAGE_SIZE.to_string();
        let resp = self
            .http
            .get(&self.endpoint)
            .query(&[
                ("country", self.country.as_str()),
                ("pageSize", page_size.as_str()),
                ("apiKey", self.api_key.as_str()),
            ])
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;
        let parsed: HeadlinesResponse = serde_json::from_str(&body)?;

        if !status.is_success() || parsed.status.as_deref() == Some("error") {
            warn!(
                %status,
                code = parsed.code.as_deref().unwrap_or_default(),
                message = parsed.message.as_deref().unwrap_or_default(),
                body_preview = %truncate_for_log(&body, 300),
                "NewsAPI did not return headlines cleanly"
            );
        }

        info!(
            count = parsed.articles.len(),
            total_results = parsed.total_results.unwrap_or_default(),
            "Fetched headline batch"
        );
        for article in &parsed.articles {
            debug!(
                title = article.title(),
                url = article.key().unwrap_or_default(),
                published_at = article.published_at.as_deref().unwrap_or_default(),
                "Candidate"
            );
        }
        Ok(parsed.articles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::testing::{http_client, serve_once};
    use reqwest::StatusCode;

    #[tokio::test]
    async fn test_fetch_batch_sends_filters_and_returns_articles() {
        let body = serde_json::json!({
            "status": "ok",
            "totalResults": 2,
            "articles": [
                {"source": {"name": "The Hindu"}, "title": "One", "url": "https://a"},
                {"source": {"name": "Mint"}, "title": "Two", "url": "https://b"}
            ]
        })
        .to_string();
        let (base, request) = serve_once(StatusCode::OK, body).await;

        let client = NewsApiClient::new(http_client(), "k3y", "in")
            .with_endpoint(format!("{base}/v2/top-headlines"));
        let articles = client.fetch_batch().await.unwrap();

        assert_eq!(articles.len(), 2);
        assert_eq!(articles[0].title(), "One");
        assert_eq!(articles[1].key(), Some("https://b"));

        let request = request.await.unwrap();
        assert_eq!(request.method, reqwest::Method::GET);
        assert_eq!(request.uri.path(), "/v2/top-headlines");
        assert_eq!(request.query_param("country").as_deref(), Some("in"));
        assert_eq!(request.query_param("pageSize").as_deref(), Some("10"));
        assert_eq!(request.query_param("apiKey").as_deref(), Some("k3y"));
    }

    #[tokio::test]
    async fn test_error_body_yields_empty_batch() {
        let body = r#"{"status":"error","code":"apiKeyInvalid","message":"Your API key is invalid."}"#;
        let (base, _request) = serve_once(StatusCode::UNAUTHORIZED, body.to_string()).await;

        let client = NewsApiClient::new(http_client(), "bad", "in").with_endpoint(base);
        assert!(client.fetch_batch().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_articles_field_yields_empty_batch() {
        let (base, _request) = serve_once(StatusCode::OK, r#"{"status":"ok"}"#.to_string()).await;

        let client = NewsApiClient::new(http_client(), "k", "in").with_endpoint(base);
        assert!(client.fetch_batch().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_non_json_body_is_error() {
        let (base, _request) = serve_once(StatusCode::BAD_GATEWAY, "<html>oops</html>".to_string()).await;

        let client = NewsApiClient::new(http_client(), "k", "in").with_endpoint(base);
        let err = client.fetch_batch().await.unwrap_err();
        assert!(matches!(err, Error::Serialization(_)));
    }
}
