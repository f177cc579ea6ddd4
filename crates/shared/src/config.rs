use anyhow::{Context, Result};
use std::env;
use std::path::Path;

#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_key: String,
    pub telegraph_access_token: String,
    pub telegram_bot_token: String,
    pub telegram_chat_id: String,
}

impl Config {
    /// Load credentials, reading `tokens_path` first if it exists, then
    /// falling back to the usual .env locations and the process
    /// environment.
    pub fn from_env_file(tokens_path: &Path) -> Result<Self> {
        if tokens_path.exists() {
            let _ = dotenvy::from_path(tokens_path);
        } else {
            Self::try_load_dotenv();
        }
        Self::from_env()
    }

    pub fn from_env() -> Result<Self> {
        let gemini_api_key = env::var("GEMINI_API_KEY").context(
            "GEMINI_API_KEY not found.\n\n\
            Create a .env file (or pass --tokens-path) with:\n  \
            GEMINI_API_KEY=your_key_here\n  \
            TELEGRAPH_ACCESS_TOKEN=your_token_here\n  \
            TELEGRAM_BOT_TOKEN=your_token_here\n  \
            TELEGRAM_CHAT_ID=your_channel_id_here\n\n\
            Get a Gemini API key from: https://aistudio.google.com/apikey",
        )?;

        let telegraph_access_token = env::var("TELEGRAPH_ACCESS_TOKEN").context(
            "TELEGRAPH_ACCESS_TOKEN not found.\n\n\
            Get a Telegraph token via https://api.telegra.ph/createAccount",
        )?;

        let telegram_bot_token = env::var("TELEGRAM_BOT_TOKEN")
            .context("TELEGRAM_BOT_TOKEN not found. Create a bot with @BotFather to get one")?;

        let telegram_chat_id = env::var("TELEGRAM_CHAT_ID")
            .context("TELEGRAM_CHAT_ID not found. Set it to the target channel or chat id")?;

        Ok(Self {
            gemini_api_key,
            telegraph_access_token,
            telegram_bot_token,
            telegram_chat_id,
        })
    }

    fn try_load_dotenv() {
        // Try locations in order of preference:

        // 1. Current directory (for development)
        if dotenvy::dotenv().is_ok() {
            return;
        }

        // 2. ~/.config/lesswrong-translator/.env (standard config location)
        if let Some(config_dir) = dirs::config_dir() {
            let config_path = config_dir.join("lesswrong-translator").join(".env");
            if config_path.exists() && dotenvy::from_path(&config_path).is_ok() {
                return;
            }
        }

        // 3. ~/.env (home directory)
        if let Some(home_dir) = dirs::home_dir() {
            let home_path = home_dir.join(".env");
            if home_path.exists() {
                let _ = dotenvy::from_path(&home_path);
            }
        }

        // If none found, that's okay - environment variables might be set system-wide
    }
}
