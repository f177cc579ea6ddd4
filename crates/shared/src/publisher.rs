use anyhow::{Context, Result};

use crate::models::Post;
use crate::telegraph::TelegraphClient;

/// Telegraph's effective page ceiling, and the smallest tail worth a page
/// of its own.
pub const PAGE_MAX_SIZE: usize = 35000;
pub const PAGE_MIN_TAIL: usize = 100;

pub struct Publisher<'a> {
    telegraph: &'a TelegraphClient,
}

impl<'a> Publisher<'a> {
    pub fn new(telegraph: &'a TelegraphClient) -> Self {
        Self { telegraph }
    }

    /// Publish the translated parts as cross-linked pages and return the
    /// URL of the first one. Pages are pre-created as stubs so every page
    /// can link to every other before any content is final. Failures are
    /// not retried; a partially stubbed translation is left behind.
    pub async fn publish(
        &self,
        post: &Post,
        translated_title: &str,
        parts: &[String],
    ) -> Result<String> {
        let mut stubs = Vec::with_capacity(parts.len());
        for _ in parts {
            let stub = self
                .telegraph
                .create_page(translated_title, "stub")
                .await
                .context("Failed to pre-create Telegraph page")?;
            stubs.push(stub);
        }

        let page_urls: Vec<String> = stubs.iter().map(|stub| stub.url.clone()).collect();

        for (i, (stub, part)) in stubs.iter().zip(parts).enumerate() {
            let body = compose_page_body(post, part, i, &page_urls);
            let title = page_title(translated_title, i, parts.len());
            println!("  Part {}, size {}", i, body.len());
            self.telegraph.edit_page(&stub.path, &title, &body).await?;
        }

        let first = stubs.first().context("No pages were published")?;
        Ok(first.url.clone())
    }
}

/// Page title, suffixed with the part position when there are several.
pub fn page_title(title: &str, index: usize, total: usize) -> String {
    if total > 1 {
        format!("{} {} / {}", title, index + 1, total)
    } else {
        title.to_string()
    }
}

/// Body of page `index`: attribution to the original, a navigation block
/// over the sibling pages when there are several, the chunk itself, and a
/// forward link on every page but the last.
pub fn compose_page_body(post: &Post, part: &str, index: usize, page_urls: &[String]) -> String {
    let total = page_urls.len();

    let mut body = format!(
        "<p>Оригинал: <a href=\"{}\">{}</a><br></p>",
        post.url,
        escape_html(&post.title)
    );

    if total > 1 {
        body.push_str(&format!("<p>Часть {} из {}. Остальные части:", index + 1, total));
        for (j, url) in page_urls.iter().enumerate() {
            if j != index {
                body.push_str(&format!(" <a href=\"{}\">{}</a>", url, j + 1));
            }
        }
        body.push_str("</p>");
    }

    body.push_str(part);

    if index + 1 < total {
        body.push_str(&format!(
            "<p><a href=\"{}\">Следующая часть перевода.</a></p>",
            page_urls[index + 1]
        ));
    }

    body
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post() -> Post {
        Post {
            url: "https://www.lesswrong.com/posts/x/y".to_string(),
            title: "Original & Title".to_string(),
            html: String::new(),
        }
    }

    fn urls(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("https://telegra.ph/page-{}", i)).collect()
    }

    #[test]
    fn test_single_page_has_no_navigation_or_forward_link() {
        let body = compose_page_body(&post(), "<p>chunk</p>", 0, &urls(1));
        assert!(body.contains("Оригинал"));
        assert!(body.contains("<p>chunk</p>"));
        assert!(!body.contains("Часть"));
        assert!(!body.contains("Следующая часть"));
    }

    #[test]
    fn test_middle_page_links_every_other_page_and_the_next_one() {
        let body = compose_page_body(&post(), "<p>chunk</p>", 1, &urls(3));
        assert!(body.contains("Часть 2 из 3"));
        assert!(body.contains("<a href=\"https://telegra.ph/page-0\">1</a>"));
        assert!(body.contains("<a href=\"https://telegra.ph/page-2\">3</a>"));
        assert!(!body.contains(">2</a>"));
        assert!(body.contains(
            "<p><a href=\"https://telegra.ph/page-2\">Следующая часть перевода.</a></p>"
        ));
    }

    #[test]
    fn test_last_page_has_no_forward_link() {
        let body = compose_page_body(&post(), "<p>chunk</p>", 2, &urls(3));
        assert!(body.contains("Часть 3 из 3"));
        assert!(!body.contains("Следующая часть"));
    }

    #[test]
    fn test_attribution_escapes_the_title() {
        let body = compose_page_body(&post(), "", 0, &urls(1));
        assert!(body.contains("Original &amp; Title"));
    }

    #[test]
    fn test_page_title_suffix_only_for_multi_page_output() {
        assert_eq!(page_title("Заголовок", 0, 1), "Заголовок");
        assert_eq!(page_title("Заголовок", 1, 3), "Заголовок 2 / 3");
    }
}
