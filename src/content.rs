//! HTML post body generation.
//!
//! The body is a fixed skeleton: the article's heading, source line and
//! description, followed by three boilerplate sections that read the same for
//! every article. Title and description are embedded verbatim, without HTML
//! escaping, because upstream headlines are trusted as-is.

use crate::models::{Article, GeneratedContent};

/// Render one article into a post title and HTML body.
pub fn generate(article: &Article) -> GeneratedContent {
    let title = article.title();
    let source = article.source_name();
    let description = article.description();

    let html = format!(
        r#"
<h2>{title}</h2>

<p><b>Source:</b> {source}</p>

<p>{description}</p>

<h3>Key Highlights</h3>
<ul>
  <li>This news is currently gaining attention across media.</li>
  <li>It may have a significant impact in the coming days.</li>
  <li>Experts are closely watching further developments.</li>
</ul>

<h3>Why This Matters</h3>
<p>
This update is important because it reflects ongoing trends and decisions
that can influence the public, businesses, or technology sector.
Staying informed helps readers understand the broader impact.
</p>

<h3>Final Thoughts</h3>
<p>
As more details emerge, the situation is expected to evolve.
Readers are encouraged to follow verified sources for updates.
</p>
"#
    );

    GeneratedContent {
        title: title.to_string(),
        html,
    }
}
