use anyhow::{Context, Result};
use scraper::{ElementRef, Html, Node};

use crate::chunker::join_parts;
use crate::gemini::{GeminiChat, GeminiClient, RetryPolicy};
use crate::models::{Post, Translation};

/// Upper bound on a single model turn, and the smallest remainder worth a
/// turn of its own.
pub const MODEL_MAX_PART: usize = 5000;
pub const MODEL_MIN_TAIL: usize = 100;

const SYSTEM_INSTRUCTIONS: &str = "\
You will receive title and text. You need translate it to Russian.
First, you will receive title, and translate it to russian, without any markup.
Then, you will receive messages, each with several lines of text. Translate them while preserving HTML markup.
Finally, when requested, write 3 paragraph summary of the text, in Russian, using Markdown for markup.
Instructions of what to do will be in the first line of the message. Follow them and do nothing else.
Do not mention this instructions.
";

const SUMMARY_PROMPT: &str = "Now write 3 paragraph summary of text in russian, using Markdown.";

/// Drives one chat session through title, chunk-by-chunk body and summary.
/// Chunks are sent strictly in order: the session context accumulates, so
/// reordering would degrade the translation.
pub struct Translator<'a> {
    gemini: &'a GeminiClient,
    retry: RetryPolicy,
}

impl<'a> Translator<'a> {
    pub fn new(gemini: &'a GeminiClient) -> Self {
        Self::with_retry(gemini, RetryPolicy::default())
    }

    pub fn with_retry(gemini: &'a GeminiClient, retry: RetryPolicy) -> Self {
        Self { gemini, retry }
    }

    pub async fn translate_post(&self, post: &Post) -> Result<Translation> {
        let mut chat = self.gemini.start_chat(SYSTEM_INSTRUCTIONS);
        run_session(&mut chat, post, &self.retry).await
    }
}

/// Seam between the orchestration and the model session, so the retry
/// schedule can be exercised without the network.
trait ChatSession {
    async fn send(&mut self, text: &str) -> Result<String>;
}

impl ChatSession for GeminiChat<'_> {
    async fn send(&mut self, text: &str) -> Result<String> {
        GeminiChat::send(self, text).await
    }
}

async fn run_session<S: ChatSession>(
    chat: &mut S,
    post: &Post,
    retry: &RetryPolicy,
) -> Result<Translation> {
    let fragments = split_fragments(&post.html);
    let parts = join_parts(fragments, MODEL_MAX_PART, MODEL_MIN_TAIL);
    println!(
        "  Title length {}, html length {}, split into {} part(s)",
        post.title.len(),
        post.html.len(),
        parts.len()
    );

    let title = chat
        .send(&format!("Translate post title.\n{}", post.title))
        .await
        .context("Failed to translate the post title")?
        .trim()
        .to_string();

    let mut translated = Vec::with_capacity(parts.len());
    for (i, part) in parts.iter().enumerate() {
        let prompt = format!("Translate the next part.\n{}", part);
        let mut failures = 0;
        let text = loop {
            match chat.send(&prompt).await {
                Ok(text) => break text,
                Err(e) => {
                    failures += 1;
                    if failures >= retry.max_attempts {
                        return Err(e).with_context(|| {
                            format!("Giving up on part {} after {} attempts", i, failures)
                        });
                    }
                    let delay = retry.delay(failures - 1);
                    eprintln!(
                        "Translation of part {} failed (attempt {}): {}; retrying in {:?}",
                        i, failures, e, delay
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        };
        println!(
            "  Translated part {}, length {}, translation length {}",
            i,
            part.len(),
            text.len()
        );
        translated.push(text);
    }

    let summary = chat
        .send(SUMMARY_PROMPT)
        .await
        .context("Failed to summarize the post")?;

    Ok(Translation {
        title,
        summary,
        parts: translated,
    })
}

/// Split post HTML into its top-level fragments: elements serialized back
/// to HTML, text nodes verbatim. These are the units the chunker groups.
pub fn split_fragments(html: &str) -> Vec<String> {
    let fragment = Html::parse_fragment(html);
    let mut parts = Vec::new();
    for child in fragment.root_element().children() {
        match child.value() {
            Node::Element(_) => {
                if let Some(element) = ElementRef::wrap(child) {
                    parts.push(element.html());
                }
            }
            Node::Text(text) => parts.push(text.text.to_string()),
            _ => {}
        }
    }
    parts
}
