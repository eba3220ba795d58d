// provider
pub const OPENAI_CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const PROVIDER_TIMEOUT_SECS: u64 = 60;
pub const MAX_PROVIDER_RETRIES: u32 = 3;
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

// ui
pub const MAX_FILES_TO_SHOW: usize = 10;
