use once_cell::sync::Lazy;
use std::env;

pub static CONFIG: Lazy<Config> = Lazy::new(Config::new);

const DEFAULT_CODE_RUNNER_URL: &str = "https://emkc.org/api/v2/piston";
const DEFAULT_ASSISTANT_URL: &str = "https://api.openai.com/v1/chat/completions";

pub struct Config {
    pub bind_addr: String,
    pub allowed_origin: String,
    pub session_secret: String,
    pub code_runner_url: String,
    pub assistant_url: String,
    pub assistant_api_key: Option<String>,
    pub assistant_model: String,
}

impl Config {
    fn new() -> Self {
        let session_secret = env::var("SESSION_SECRET").unwrap_or_else(|_| {
            log::warn!("SESSION_SECRET is not set, using an insecure development secret");
            "dev-session-secret".to_string()
        });

        Self {
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string()),
            allowed_origin: env::var("ALLOWED_ORIGIN")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            session_secret,
            code_runner_url: env::var("CODE_RUNNER_URL")
                .unwrap_or_else(|_| DEFAULT_CODE_RUNNER_URL.to_string()),
            assistant_url: env::var("ASSISTANT_URL")
                .unwrap_or_else(|_| DEFAULT_ASSISTANT_URL.to_string()),
            assistant_api_key: env::var("ASSISTANT_API_KEY").ok().filter(|k| !k.is_empty()),
            assistant_model: env::var("ASSISTANT_MODEL")
                .unwrap_or_else(|_| "gpt-4o-mini".to_string()),
        }
    }
}
