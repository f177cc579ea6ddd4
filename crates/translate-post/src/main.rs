use anyhow::{Context, Result};
use clap::Parser;
use shared::{
    append_audit, count_unused, join_parts, pick_unused, telegram, Config, GeminiClient, Ledger,
    LesswrongClient, ParseMode, Publisher, RequestConfig, RetryPolicy, TelegramClient,
    TelegraphClient, Translator, PAGE_MAX_SIZE, PAGE_MIN_TAIL,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "translate-post")]
#[command(about = "Translate one unused LessWrong post to Russian and publish it to Telegraph")]
struct Args {
    /// Path to the .env file with API tokens
    #[arg(long, default_value = ".env")]
    tokens_path: PathBuf,

    /// Path to the LessWrong request config (headers + GraphQL body)
    #[arg(long, default_value = "lesswrong.json")]
    lesswrong_config: PathBuf,

    /// Path to the append-only ledger of processed post URLs
    #[arg(long, default_value = "used")]
    ledger: PathBuf,

    /// Path to the append-only audit log of published chunk groups
    #[arg(long, default_value = "translations.txt")]
    audit_log: PathBuf,

    /// Include posts without a contents field (published with an empty body)
    #[arg(long)]
    include_contentless: bool,

    /// Attempts per chunk before the run is aborted
    #[arg(long, default_value = "8")]
    max_attempts: u32,
}

/// First 100 characters, cut on a char boundary, for status lines.
fn preview(text: &str) -> &str {
    const LIMIT: usize = 100;
    if text.len() <= LIMIT {
        return text;
    }
    let mut end = LIMIT;
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = Config::from_env_file(&args.tokens_path)?;

    let ledger = Ledger::new(&args.ledger);
    let used = ledger.load()?;
    println!("Used urls: {}", used.len());

    println!("\n📚 Fetching recent posts from LessWrong...");
    let request = RequestConfig::load(&args.lesswrong_config)?;
    let lesswrong = LesswrongClient::new(request)?;
    let posts = lesswrong
        .fetch_recent_posts(args.include_contentless)
        .await
        .context("Failed to fetch posts")?;
    println!(
        "✓ Total posts: {}, unused: {}",
        posts.len(),
        count_unused(&posts, &used)
    );

    let telegram_client = TelegramClient::new(config.telegram_bot_token.clone())?;

    let Some(post) = pick_unused(posts, &used) else {
        println!("No unused posts");
        telegram_client
            .send_message(
                &config.telegram_chat_id,
                telegram::NO_NEW_POSTS,
                ParseMode::MarkdownV2,
            )
            .await?;
        return Ok(());
    };
    println!("✓ Chosen url: {}", post.url);

    println!("\n🤖 Translating with Gemini...");
    let gemini = GeminiClient::new(config.gemini_api_key.clone())?;
    let retry = RetryPolicy {
        max_attempts: args.max_attempts,
        ..RetryPolicy::default()
    };
    let translator = Translator::with_retry(&gemini, retry);
    let translation = translator.translate_post(&post).await?;
    println!("✓ Title: {}", preview(&translation.title));
    println!("✓ Summary: {}", preview(&translation.summary));

    let pages = join_parts(translation.parts.clone(), PAGE_MAX_SIZE, PAGE_MIN_TAIL);
    append_audit(&args.audit_log, &post.url, &pages)?;

    println!("\n📄 Publishing {} page(s) to Telegraph...", pages.len());
    let telegraph = TelegraphClient::new(config.telegraph_access_token.clone())?;
    let publisher = Publisher::new(&telegraph);
    let telegraph_url = publisher.publish(&post, &translation.title, &pages).await?;
    println!("✓ Telegraph url: {}", telegraph_url);

    println!("\n💬 Notifying Telegram channel...");
    telegram_client
        .send_message(
            &config.telegram_chat_id,
            &telegram::disclaimer(&post.title, &post.url),
            ParseMode::MarkdownV2,
        )
        .await?;
    telegram_client
        .send_markdown_or_plain(&config.telegram_chat_id, &translation.summary)
        .await?;
    telegram_client
        .send_message(
            &config.telegram_chat_id,
            &format!("Полный перевод: {}", telegraph_url),
            ParseMode::Plain,
        )
        .await?;

    ledger.append(&post.url)?;
    println!("\n✅ Done, ledger updated");

    Ok(())
}
