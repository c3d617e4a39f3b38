//! Publishing to Blogger.
//!
//! - [`auth`]: obtains a bearer token (cached, refreshed or interactive consent)
//! - [`client`]: creates the post through the Blogger v3 API
//!
//! The pipeline only sees the [`Publisher`] trait; [`Blogger`] is the real
//! implementation that combines the two.

pub mod auth;
pub mod client;

use crate::error::Result;
use crate::models::{GeneratedContent, NewPost, PublishedPost};

pub use auth::{Authenticator, BearerToken};
pub use client::BloggerClient;

const POST_KIND: &str = "blogger#post";

/// Destination for generated posts.
pub trait Publisher {
    /// Authorization handle needed by [`Publisher::publish`].
    type Session;

    async fn authenticate(&self) -> Result<Self::Session>;

    /// Create `post` as an immediately public post.
    async fn publish(&self, session: &Self::Session, post: &NewPost) -> Result<PublishedPost>;
}

#[derive(Debug, Clone)]
pub struct Blogger {
    auth: Authenticator,
    client: BloggerClient,
}

impl Blogger {
    pub fn new(auth: Authenticator, client: BloggerClient) -> Self {
        Self { auth, client }
    }
}

impl Publisher for Blogger {
    type Session = BearerToken;

    async fn authenticate(&self) -> Result<BearerToken> {
        self.auth.authorize().await
    }

    async fn publish(&self, session: &BearerToken, post: &NewPost) -> Result<PublishedPost> {
        self.client.insert_post(session, post).await
    }
}

/// Build the post body, leading with the image when there is one.
pub fn compose_post(content: &GeneratedContent, image_url: Option<&str>) -> NewPost {
    let body = match image_url {
        Some(src) => format!(r#"<img src="{src}" /><br/>{}"#, content.html),
        None => content.html.clone(),
    };
    NewPost {
        kind: POST_KIND.to_string(),
        title: content.title.clone(),
        content: body,
    }
}
