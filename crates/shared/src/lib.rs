// Public modules
pub mod chunker;
pub mod config;
pub mod gemini;
pub mod ledger;
pub mod lesswrong;
pub mod models;
pub mod publisher;
pub mod selector;
pub mod telegram;
pub mod telegraph;
pub mod translator;

// Re-export commonly used types
pub use chunker::join_parts;
pub use config::Config;
pub use gemini::{GeminiClient, RetryPolicy};
pub use ledger::{append_audit, Ledger};
pub use lesswrong::{LesswrongClient, RequestConfig};
pub use models::{Post, Translation};
pub use publisher::{Publisher, PAGE_MAX_SIZE, PAGE_MIN_TAIL};
pub use selector::{count_unused, pick_unused};
pub use telegram::{ParseMode, TelegramClient};
pub use telegraph::TelegraphClient;
pub use translator::Translator;
