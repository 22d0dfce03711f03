/// All configuration loaded from environment variables at startup.
/// Missing required variables cause an immediate panic with a clear message.
#[derive(Debug, Clone)]
pub struct Config {
    // LINE Messaging API credentials
    pub channel_access_token: String,
    pub channel_secret: String,

    /// Public base URL of this deployment, used to build chart image URLs
    /// (LINE fetches images over HTTPS from here).
    pub public_base_url: String,

    // Webhook server
    pub port: u16,

    /// Directory rendered chart PNGs are written to and served from.
    pub chart_dir: String,

    /// Seconds between alert evaluation sweeps.
    pub sweep_interval_secs: u64,
}

impl Config {
    /// Load all configuration from environment variables.
    /// Loads `.env` if present. Panics on any missing required variable.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv(); // ignore error if .env not present

        Config {
            channel_access_token: required_env("CHANNEL_ACCESS_TOKEN"),
            channel_secret: required_env("CHANNEL_SECRET"),
            public_base_url: required_env("PUBLIC_BASE_URL")
                .trim_end_matches('/')
                .to_string(),
            port: optional_env("PORT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(8080),
            chart_dir: optional_env("CHART_DIR").unwrap_or_else(|| "static/charts".to_string()),
            sweep_interval_secs: optional_env("SWEEP_INTERVAL_SECS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(300),
        }
    }
}

fn required_env(key: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| {
        panic!("Required environment variable '{key}' is not set. Check your .env file.")
    })
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}
