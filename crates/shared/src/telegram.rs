use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};

const API_BASE: &str = "https://api.telegram.org";

/// Fallback announcement when every candidate post is already processed.
pub const NO_NEW_POSTS: &str = "Новых постов пока нет";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseMode {
    MarkdownV2,
    Markdown,
    Plain,
}

impl ParseMode {
    fn as_str(self) -> Option<&'static str> {
        match self {
            ParseMode::MarkdownV2 => Some("MarkdownV2"),
            ParseMode::Markdown => Some("Markdown"),
            ParseMode::Plain => None,
        }
    }
}

#[derive(Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parse_mode: Option<&'static str>,
}

#[derive(Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

pub struct TelegramClient {
    client: Client,
    bot_token: String,
}

impl TelegramClient {
    pub fn new(bot_token: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client, bot_token })
    }

    pub async fn send_message(
        &self,
        chat_id: &str,
        text: &str,
        parse_mode: ParseMode,
    ) -> Result<()> {
        let url = format!("{}/bot{}/sendMessage", API_BASE, self.bot_token);
        let request = SendMessageRequest {
            chat_id,
            text,
            parse_mode: parse_mode.as_str(),
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .context("Failed to send request to the Telegram Bot API")?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("unknown error"));
            anyhow::bail!("Telegram API returned error: {} - {}", status, error_text);
        }

        let api_response = response
            .json::<ApiResponse>()
            .await
            .context("Failed to parse Telegram API response")?;

        if !api_response.ok {
            anyhow::bail!(
                "Telegram API error: {}",
                api_response
                    .description
                    .unwrap_or_else(|| "unknown".to_string())
            );
        }

        Ok(())
    }

    /// Send model-generated Markdown, resending as plain text when the Bot
    /// API rejects the entities. Free-form model output is not guaranteed
    /// to parse, and a rejected summary must not abort the run after the
    /// pages are already published.
    pub async fn send_markdown_or_plain(&self, chat_id: &str, text: &str) -> Result<()> {
        markdown_or_plain(self, chat_id, text).await
    }
}

/// Delivery seam so the plain-text fallback can be exercised without the
/// network.
trait MessageSink {
    async fn deliver(&self, chat_id: &str, text: &str, parse_mode: ParseMode) -> Result<()>;
}

impl MessageSink for TelegramClient {
    async fn deliver(&self, chat_id: &str, text: &str, parse_mode: ParseMode) -> Result<()> {
        self.send_message(chat_id, text, parse_mode).await
    }
}

async fn markdown_or_plain<S: MessageSink>(sink: &S, chat_id: &str, text: &str) -> Result<()> {
    if let Err(e) = sink.deliver(chat_id, text, ParseMode::Markdown).await {
        eprintln!("Markdown message rejected ({}), resending as plain text", e);
        return sink.deliver(chat_id, text, ParseMode::Plain).await;
    }
    Ok(())
}

/// The disclaimer sent ahead of every translation, with the original title
/// linked. The static text is pre-escaped for MarkdownV2.
pub fn disclaimer(title: &str, url: &str) -> String {
    format!(
        "Ниже \\- автоматический пересказ текста [{}]({}) с помощью Gemini\\. \
        Все права принадлежат кому принадлежали и раньше\\. \
        Может содержать произвольно бредовые ошибки\\. \
        Используйте на свой страх и риск, а лучше не используйте вообще\\.",
        escape_markdown_v2(title),
        escape_markdown_v2_url(url)
    )
}

/// Escape text for interpolation into a MarkdownV2 message.
pub fn escape_markdown_v2(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(
            c,
            '_' | '*'
                | '['
                | ']'
                | '('
                | ')'
                | '~'
                | '`'
                | '>'
                | '#'
                | '+'
                | '-'
                | '='
                | '|'
                | '{'
                | '}'
                | '.'
                | '!'
                | '\\'
        ) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Inside the `(...)` part of an inline link only `)` and `\` are special.
fn escape_markdown_v2_url(url: &str) -> String {
    url.replace('\\', "\\\\").replace(')', "\\)")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_markdown_v2_reserved_characters() {
        assert_eq!(
            escape_markdown_v2("a_b*c[d]e(f)g.h!i-j"),
            "a\\_b\\*c\\[d\\]e\\(f\\)g\\.h\\!i\\-j"
        );
    }

    #[test]
    fn test_escape_markdown_v2_leaves_plain_text_alone() {
        assert_eq!(escape_markdown_v2("обычный текст"), "обычный текст");
    }

    #[test]
    fn test_escape_markdown_v2_escapes_backslash_itself() {
        assert_eq!(escape_markdown_v2("a\\b"), "a\\\\b");
    }

    #[test]
    fn test_url_escaping_only_touches_parens_and_backslash() {
        assert_eq!(
            escape_markdown_v2_url("https://x.test/a_b(c)"),
            "https://x.test/a_b(c\\)"
        );
    }

    #[test]
    fn test_disclaimer_links_and_escapes_the_title() {
        let text = disclaimer("A.Title", "https://x.test/post");
        assert!(text.contains("[A\\.Title](https://x.test/post)"));
        assert!(text.starts_with("Ниже \\-"));
    }

    #[test]
    fn test_plain_parse_mode_is_omitted_from_the_request() {
        assert_eq!(ParseMode::Plain.as_str(), None);
        assert_eq!(ParseMode::MarkdownV2.as_str(), Some("MarkdownV2"));
        assert_eq!(ParseMode::Markdown.as_str(), Some("Markdown"));
    }

    use std::cell::RefCell;

    /// Rejects Markdown sends when told to, recording every delivery.
    struct PickySink {
        reject_markdown: bool,
        sent: RefCell<Vec<(String, ParseMode)>>,
    }

    impl PickySink {
        fn new(reject_markdown: bool) -> Self {
            Self {
                reject_markdown,
                sent: RefCell::new(Vec::new()),
            }
        }
    }

    impl MessageSink for PickySink {
        async fn deliver(&self, _chat_id: &str, text: &str, parse_mode: ParseMode) -> Result<()> {
            self.sent.borrow_mut().push((text.to_string(), parse_mode));
            if parse_mode == ParseMode::Markdown && self.reject_markdown {
                anyhow::bail!("Bad Request: can't parse entities");
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_valid_markdown_is_sent_once() {
        let sink = PickySink::new(false);
        markdown_or_plain(&sink, "42", "*summary*").await.unwrap();

        let sent = sink.sent.borrow();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0], ("*summary*".to_string(), ParseMode::Markdown));
    }

    #[tokio::test]
    async fn test_rejected_markdown_falls_back_to_plain_text() {
        let sink = PickySink::new(true);
        markdown_or_plain(&sink, "42", "broken_summary*").await.unwrap();

        let sent = sink.sent.borrow();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].1, ParseMode::Markdown);
        assert_eq!(sent[1], ("broken_summary*".to_string(), ParseMode::Plain));
    }
}
