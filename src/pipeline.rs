//! One posting run, start to finish.
//!
//! ```text
//! GateCheck ──outside window──────────────────────────────▶ Done
//!     │
//!   Delay ─▶ FetchNews ─▶ SelectArticle ──no candidate────▶ Done
//!                              │
//!        Generate ─▶ FetchImage ─▶ Authenticate ─▶ Publish ─▶ Record ─▶ Done
//! ```
//!
//! At most one article is posted per run: the first candidate, in the order
//! the news source returned them, whose URL is present and not yet recorded.

use crate::blogger::{Publisher, compose_post};
use crate::config::Config;
use crate::content::generate;
use crate::dedup::{self, DedupStore};
use crate::error::Result;
use crate::models::Article;
use crate::sources::{ImageSource, NewsSource};
use chrono::{DateTime, Utc};
use tracing::{info, instrument};

/// How a run ended, when it did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Local time was outside the posting window; nothing was touched.
    OutsideWindow { local_hour: u32 },
    /// Every candidate was already posted or had no URL.
    NothingNew { candidates: usize },
    /// One article was published and recorded.
    Posted {
        title: String,
        url: String,
        post_url: Option<String>,
    },
}

/// First candidate with a URL that is not in `posted`.
pub fn select_first_unposted<'a>(articles: &'a [Article], posted: &[String]) -> Option<&'a Article> {
    articles
        .iter()
        .find(|a| a.key().is_some_and(|url| !posted.iter().any(|p| p == url)))
}

/// One posting run over a news source, an image source and a publisher.
pub struct Pipeline<'a, N, I, P> {
    config: &'a Config,
    news: N,
    images: I,
    publisher: P,
    store: DedupStore,
}

impl<'a, N, I, P> Pipeline<'a, N, I, P>
where
    N: NewsSource,
    I: ImageSource,
    P: Publisher,
{
    pub fn new(config: &'a Config, news: N, images: I, publisher: P) -> Self {
        Self {
            config,
            news,
            images,
            publisher,
            store: DedupStore::new(&config.posted_file),
        }
    }

    /// Run once as of `now`.
    #[instrument(level = "info", skip_all, fields(%now))]
    pub async fn run(&self, now: DateTime<Utc>) -> Result<RunOutcome> {
        let window = &self.config.window;
        if !window.contains(now) {
            let local_hour = window.local_hour(now);
            info!(
                local_hour,
                tz = %window.tz,
                start = window.start_hour,
                end = window.end_hour,
                "Outside posting window; skipping"
            );
            return Ok(RunOutcome::OutsideWindow { local_hour });
        }

        let delay = self.config.delay.pick(&mut rand::rng());
        info!(minutes = delay.as_secs() / 60, "Waiting before posting");
        tokio::time::sleep(delay).await;

        let mut posted = self.store.load().await?;
        let articles = self.news.fetch_batch().await?;

        let Some(article) = select_first_unposted(&articles, &posted) else {
            info!(candidates = articles.len(), "No new articles to post");
            return Ok(RunOutcome::NothingNew {
                candidates: articles.len(),
            });
        };
        let url = article.key().unwrap_or_default().to_string();
        info!(%url, title = article.title(), "Selected article");

        let content = generate(article);
        let image = self.images.fetch_image(&content.title).await?;

        let session = self.publisher.authenticate().await?;
        let published = self
            .publisher
            .publish(&session, &compose_post(&content, image.as_deref()))
            .await?;

        dedup::record(&mut posted, &url);
        self.store.save(&posted).await?;
        info!(title = %content.title, record = %self.store.path().display(), "Posted and recorded");

        Ok(RunOutcome::Posted {
            title: content.title,
            url,
            post_url: published.url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::models::{ArticleSource, NewPost, PublishedPost};
    use crate::schedule::{DelayRange, PostingWindow};
    use chrono::TimeZone;
    use std::path::Path;
    use std::sync::Mutex;
    use tempfile::{TempDir, tempdir};

    fn article(url: Option<&str>, title: &str) -> Article {
        Article {
            source: Some(ArticleSource {
                name: Some("Wire".to_string()),
            }),
            title: Some(title.to_string()),
            description: Some(format!("About {title}")),
            url: url.map(str::to_string),
            ..Default::default()
        }
    }

    fn config(dir: &Path) -> Config {
        Config {
            news_api_key: "n".to_string(),
            unsplash_key: "u".to_string(),
            blog_id: "b".to_string(),
            country: "in".to_string(),
            posted_file: dir.join("posted_urls.json"),
            token_file: dir.join("token.json"),
            client_secret_file: dir.join("client_secret.json"),
            window: PostingWindow {
                tz: chrono_tz::Asia::Kolkata,
                start_hour: 9,
                end_hour: 20,
            },
            delay: DelayRange {
                min_minutes: 0,
                max_minutes: 0,
            },
        }
    }

    fn ist(hour: u32) -> DateTime<Utc> {
        chrono_tz::Asia::Kolkata
            .with_ymd_and_hms(2025, 6, 2, hour, 10, 0)
            .unwrap()
            .with_timezone(&Utc)
    }

    #[derive(Default)]
    struct FakeNews {
        batch: Vec<Article>,
        calls: Mutex<usize>,
    }

    impl NewsSource for FakeNews {
        async fn fetch_batch(&self) -> Result<Vec<Article>> {
            *self.calls.lock().unwrap() += 1;
            Ok(self.batch.clone())
        }
    }

    #[derive(Default)]
    struct FakeImages {
        image: Option<String>,
        queries: Mutex<Vec<String>>,
    }

    impl ImageSource for FakeImages {
        async fn fetch_image(&self, query: &str) -> Result<Option<String>> {
            self.queries.lock().unwrap().push(query.to_string());
            Ok(self.image.clone())
        }
    }

    #[derive(Default)]
    struct FakePublisher {
        fail: bool,
        auths: Mutex<usize>,
        posts: Mutex<Vec<NewPost>>,
    }

    impl Publisher for FakePublisher {
        type Session = ();

        async fn authenticate(&self) -> Result<()> {
            *self.auths.lock().unwrap() += 1;
            Ok(())
        }

        async fn publish(&self, _session: &(), post: &NewPost) -> Result<PublishedPost> {
            if self.fail {
                return Err(Error::Auth("quota exceeded".to_string()));
            }
            self.posts.lock().unwrap().push(post.clone());
            Ok(PublishedPost {
                id: Some("1".to_string()),
                url: Some("https://blog.example/p/1.html".to_string()),
            })
        }
    }

    async fn seed(dir: &TempDir, urls: &[&str]) -> DedupStore {
        let store = DedupStore::new(dir.path().join("posted_urls.json"));
        let urls: Vec<String> = urls.iter().map(|u| u.to_string()).collect();
        store.save(&urls).await.unwrap();
        store
    }

    #[test]
    fn test_select_skips_posted_and_missing_urls() {
        let batch = vec![
            article(Some("https://a"), "A"),
            article(Some("https://b"), "B"),
            article(None, "C"),
        ];
        let posted = vec!["https://a".to_string()];
        let chosen = select_first_unposted(&batch, &posted).unwrap();
        assert_eq!(chosen.key(), Some("https://b"));
    }

    #[test]
    fn test_select_prefers_input_order() {
        let batch = vec![
            article(None, "no url"),
            article(Some(""), "empty url"),
            article(Some("https://x"), "X"),
            article(Some("https://y"), "Y"),
        ];
        assert_eq!(select_first_unposted(&batch, &[]).unwrap().title(), "X");
    }

    #[test]
    fn test_select_none_when_everything_posted() {
        let batch = vec![article(Some("https://a"), "A"), article(None, "B")];
        assert!(select_first_unposted(&batch, &["https://a".to_string()]).is_none());
        assert!(select_first_unposted(&[], &[]).is_none());
    }

    #[tokio::test]
    async fn test_run_posts_first_new_article_and_records_it() {
        let dir = tempdir().unwrap();
        let store = seed(&dir, &["https://a"]).await;
        let config = config(dir.path());
        let news = FakeNews {
            batch: vec![
                article(Some("https://a"), "A"),
                article(Some("https://b"), "B"),
                article(None, "C"),
            ],
            ..Default::default()
        };
        let images = FakeImages {
            image: Some("https://img/b.jpg".to_string()),
            ..Default::default()
        };
        let pipeline = Pipeline::new(&config, news, images, FakePublisher::default());

        let outcome = pipeline.run(ist(11)).await.unwrap();
        assert_eq!(
            outcome,
            RunOutcome::Posted {
                title: "B".to_string(),
                url: "https://b".to_string(),
                post_url: Some("https://blog.example/p/1.html".to_string()),
            }
        );

        let posts = pipeline.publisher.posts.lock().unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].title, "B");
        assert!(posts[0].content.starts_with(r#"<img src="https://img/b.jpg" /><br/>"#));
        assert_eq!(*pipeline.images.queries.lock().unwrap(), vec!["B".to_string()]);
        assert_eq!(*pipeline.publisher.auths.lock().unwrap(), 1);

        assert_eq!(store.load().await.unwrap(), vec!["https://a", "https://b"]);
    }

    #[tokio::test]
    async fn test_run_without_image_still_posts() {
        let dir = tempdir().unwrap();
        let config = config(dir.path());
        let news = FakeNews {
            batch: vec![article(Some("https://n"), "N")],
            ..Default::default()
        };
        let pipeline = Pipeline::new(&config, news, FakeImages::default(), FakePublisher::default());

        let outcome = pipeline.run(ist(9)).await.unwrap();
        assert!(matches!(outcome, RunOutcome::Posted { .. }));

        let posts = pipeline.publisher.posts.lock().unwrap();
        assert_eq!(posts.len(), 1);
        assert!(!posts[0].content.contains("<img"));
        assert!(posts[0].content.contains("<h2>N</h2>"));
    }

    #[tokio::test]
    async fn test_run_outside_window_touches_nothing() {
        let dir = tempdir().unwrap();
        let store = seed(&dir, &["https://a"]).await;
        let before = std::fs::read_to_string(store.path()).unwrap();
        let config = config(dir.path());
        let news = FakeNews {
            batch: vec![article(Some("https://b"), "B")],
            ..Default::default()
        };
        let pipeline = Pipeline::new(&config, news, FakeImages::default(), FakePublisher::default());

        let outcome = pipeline.run(ist(22)).await.unwrap();
        assert_eq!(outcome, RunOutcome::OutsideWindow { local_hour: 22 });

        assert_eq!(*pipeline.news.calls.lock().unwrap(), 0);
        assert!(pipeline.images.queries.lock().unwrap().is_empty());
        assert_eq!(*pipeline.publisher.auths.lock().unwrap(), 0);
        assert!(pipeline.publisher.posts.lock().unwrap().is_empty());
        assert_eq!(std::fs::read_to_string(store.path()).unwrap(), before);
    }

    #[tokio::test]
    async fn test_run_end_hour_is_outside_window() {
        let dir = tempdir().unwrap();
        let config = config(dir.path());
        let pipeline = Pipeline::new(&config, FakeNews::default(), FakeImages::default(), FakePublisher::default());

        let outcome = pipeline.run(ist(20)).await.unwrap();
        assert_eq!(outcome, RunOutcome::OutsideWindow { local_hour: 20 });
        assert_eq!(*pipeline.news.calls.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_run_with_nothing_new_does_not_authenticate() {
        let dir = tempdir().unwrap();
        let store = seed(&dir, &["https://a"]).await;
        let config = config(dir.path());
        let news = FakeNews {
            batch: vec![article(Some("https://a"), "A"), article(None, "B")],
            ..Default::default()
        };
        let pipeline = Pipeline::new(&config, news, FakeImages::default(), FakePublisher::default());

        let outcome = pipeline.run(ist(12)).await.unwrap();
        assert_eq!(outcome, RunOutcome::NothingNew { candidates: 2 });
        assert_eq!(*pipeline.publisher.auths.lock().unwrap(), 0);
        assert_eq!(store.load().await.unwrap(), vec!["https://a"]);
    }

    #[tokio::test]
    async fn test_run_with_empty_batch() {
        let dir = tempdir().unwrap();
        let config = config(dir.path());
        let pipeline = Pipeline::new(&config, FakeNews::default(), FakeImages::default(), FakePublisher::default());

        let outcome = pipeline.run(ist(12)).await.unwrap();
        assert_eq!(outcome, RunOutcome::NothingNew { candidates: 0 });
        assert!(!config.posted_file.exists());
    }

    #[tokio::test]
    async fn test_failed_publish_leaves_record_unchanged() {
        let dir = tempdir().unwrap();
        let store = seed(&dir, &["https://a"]).await;
        let config = config(dir.path());
        let news = FakeNews {
            batch: vec![article(Some("https://b"), "B")],
            ..Default::default()
        };
        let publisher = FakePublisher {
            fail: true,
            ..Default::default()
        };
        let pipeline = Pipeline::new(&config, news, FakeImages::default(), publisher);

        assert!(pipeline.run(ist(12)).await.is_err());
        assert_eq!(store.load().await.unwrap(), vec!["https://a"]);
    }

    #[tokio::test]
    async fn test_consecutive_runs_post_different_articles() {
        let dir = tempdir().unwrap();
        let config = config(dir.path());
        let news = FakeNews {
            batch: vec![article(Some("https://a"), "A"), article(Some("https://b"), "B")],
            ..Default::default()
        };
        let pipeline = Pipeline::new(&config, news, FakeImages::default(), FakePublisher::default());

        pipeline.run(ist(10)).await.unwrap();
        pipeline.run(ist(11)).await.unwrap();
        let third = pipeline.run(ist(12)).await.unwrap();

        let titles: Vec<String> = pipeline
            .publisher
            .posts
            .lock()
            .unwrap()
            .iter()
            .map(|p| p.title.clone())
            .collect();
        assert_eq!(titles, vec!["A", "B"]);
        assert_eq!(third, RunOutcome::NothingNew { candidates: 2 });
        assert_eq!(
            DedupStore::new(&config.posted_file).load().await.unwrap(),
            vec!["https://a", "https://b"]
        );
    }
}
