use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};

/// Polls faster than this are raised to it.
pub const MIN_POLL_INTERVAL_SECS: u64 = 5;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default = "default_livechat_config")]
    pub livechat: LiveChatConfig,
    #[serde(default = "default_server_config")]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct TelegramConfig {
    #[serde(default)]
    pub bot_token: String,
    /// Numeric chat id or `@channel` username
    #[serde(default)]
    pub chat_id: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LiveChatConfig {
    /// Shared secret expected in the webhook `key` query parameter
    #[serde(default)]
    pub webhook_key: String,
    #[serde(default)]
    pub account_id: String,
    /// Personal access token used together with `account_id` for basic auth
    #[serde(default)]
    pub access_token: String,
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// Restrict polling to these groups (empty = all groups)
    #[serde(default)]
    pub group_ids: Vec<u32>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_api_url() -> String {
    "https://api.livechatinc.com/v3.5".to_string()
}

fn default_poll_interval_secs() -> u64 {
    15
}

fn default_bind_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_livechat_config() -> LiveChatConfig {
    LiveChatConfig {
        webhook_key: String::new(),
        account_id: String::new(),
        access_token: String::new(),
        api_url: default_api_url(),
        poll_interval_secs: default_poll_interval_secs(),
        group_ids: Vec::new(),
    }
}

fn default_server_config() -> ServerConfig {
    ServerConfig {
        bind_addr: default_bind_addr(),
        port: default_port(),
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            telegram: TelegramConfig::default(),
            livechat: default_livechat_config(),
            server: default_server_config(),
        }
    }
}

/// Parse a comma separated list of LiveChat group ids, skipping blanks.
pub fn parse_group_ids(raw: &str) -> Result<Vec<u32>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<u32>()
                .with_context(|| format!("Invalid LiveChat group id: {:?}", s))
        })
        .collect()
}

impl Config {
    /// Telegram alerts are only sent when both the token and chat id are set.
    pub fn telegram_configured(&self) -> bool {
        !self.telegram.bot_token.is_empty() && !self.telegram.chat_id.is_empty()
    }

    /// The poller only runs with both LiveChat credentials present.
    pub fn polling_configured(&self) -> bool {
        !self.livechat.account_id.is_empty() && !self.livechat.access_token.is_empty()
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.livechat.poll_interval_secs)
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.server.bind_addr, self.server.port)
    }

    /// Load the optional TOML file at `path`, then apply environment overrides.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            toml::from_str::<Config>(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?
        } else {
            debug!("No config file at {}, using environment only", path.display());
            Config::default()
        };

        config.apply_env(|key| std::env::var(key).ok())?;
        config.enforce_limits();
        Ok(config)
    }

    /// Override fields from environment-style lookups. Empty values are ignored
    /// for the bind address, URL and numeric settings so `PORT=` does not fail
    /// startup.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let strings: [(&str, &mut String); 5] = [
            ("TELEGRAM_BOT_TOKEN", &mut self.telegram.bot_token),
            ("TELEGRAM_CHAT_ID", &mut self.telegram.chat_id),
            ("LIVECHAT_WEBHOOK_KEY", &mut self.livechat.webhook_key),
            ("LIVECHAT_ACCOUNT_ID", &mut self.livechat.account_id),
            ("LIVECHAT_PAT", &mut self.livechat.access_token),
        ];
        for (key, field) in strings {
            if let Some(value) = lookup(key) {
                *field = value.trim().to_string();
            }
        }

        if let Some(addr) = lookup("BIND_ADDR").filter(|v| !v.trim().is_empty()) {
            self.server.bind_addr = addr.trim().to_string();
        }

        if let Some(url) = lookup("LIVECHAT_API_URL").filter(|v| !v.trim().is_empty()) {
            self.livechat.api_url = url.trim().trim_end_matches('/').to_string();
        }

        if let Some(raw) = lookup("POLL_INTERVAL_SECONDS").filter(|v| !v.trim().is_empty()) {
            self.livechat.poll_interval_secs = raw
                .trim()
                .parse()
                .with_context(|| format!("Invalid POLL_INTERVAL_SECONDS: {:?}", raw))?;
        }

        if let Some(raw) = lookup("LIVECHAT_GROUP_IDS") {
            self.livechat.group_ids = parse_group_ids(&raw)?;
        }

        if let Some(raw) = lookup("PORT").filter(|v| !v.trim().is_empty()) {
            self.server.port = raw
                .trim()
                .parse()
                .with_context(|| format!("Invalid PORT: {:?}", raw))?;
        }

        Ok(())
    }

    fn enforce_limits(&mut self) {
        if self.livechat.poll_interval_secs < MIN_POLL_INTERVAL_SECS {
            warn!(
                "Poll interval {}s is below the {}s floor, using {}s",
                self.livechat.poll_interval_secs, MIN_POLL_INTERVAL_SECS, MIN_POLL_INTERVAL_SECS
            );
            self.livechat.poll_interval_secs = MIN_POLL_INTERVAL_SECS;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.livechat.api_url, "https://api.livechatinc.com/v3.5");
        assert_eq!(config.poll_interval(), Duration::from_secs(15));
        assert_eq!(config.listen_addr(), "0.0.0.0:8080");
        assert!(!config.telegram_configured());
        assert!(!config.polling_configured());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config
            .apply_env(env(&[
                ("TELEGRAM_BOT_TOKEN", "bot-token"),
                ("TELEGRAM_CHAT_ID", "-100123"),
                ("LIVECHAT_WEBHOOK_KEY", "secret"),
                ("LIVECHAT_ACCOUNT_ID", "acc"),
                ("LIVECHAT_PAT", "pat"),
                ("POLL_INTERVAL_SECONDS", "30"),
                ("LIVECHAT_GROUP_IDS", "1, 2,,7"),
                ("PORT", "9000"),
                ("BIND_ADDR", "127.0.0.1"),
            ]))
            .unwrap();

        assert!(config.telegram_configured());
        assert!(config.polling_configured());
        assert_eq!(config.livechat.webhook_key, "secret");
        assert_eq!(config.livechat.poll_interval_secs, 30);
        assert_eq!(config.livechat.group_ids, vec![1, 2, 7]);
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.listen_addr(), "127.0.0.1:9000");
    }

    #[test]
    fn test_polling_requires_both_credentials() {
        let mut config = Config::default();
        config.apply_env(env(&[("LIVECHAT_ACCOUNT_ID", "acc")])).unwrap();
        assert!(!config.polling_configured());
    }

    #[test]
    fn test_invalid_group_id_rejected() {
        let mut config = Config::default();
        let result = config.apply_env(env(&[("LIVECHAT_GROUP_IDS", "1,abc")]));
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_numeric_env_ignored() {
        let mut config = Config::default();
        config
            .apply_env(env(&[
                ("PORT", ""),
                ("POLL_INTERVAL_SECONDS", " "),
                ("BIND_ADDR", "  "),
            ]))
            .unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.listen_addr(), "0.0.0.0:8080");
        assert_eq!(config.livechat.poll_interval_secs, 15);
    }

    #[test]
    fn test_interval_floor() {
        let mut config = Config::default();
        config.livechat.poll_interval_secs = 1;
        config.enforce_limits();
        assert_eq!(config.poll_interval(), Duration::from_secs(MIN_POLL_INTERVAL_SECS));
    }

    #[test]
    fn test_toml_sections() {
        let config: Config = toml::from_str(
            r#"
[telegram]
bot_token = "t"
chat_id = "@alerts"

[livechat]
webhook_key = "k"
group_ids = [3]

[server]
port = 3000
"#,
        )
        .unwrap();
        assert!(config.telegram_configured());
        assert_eq!(config.livechat.group_ids, vec![3]);
        assert_eq!(config.livechat.poll_interval_secs, 15);
        assert_eq!(config.server.bind_addr, "0.0.0.0");
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = Config::load(Path::new("/nonexistent/livechat-alert.toml")).unwrap();
        assert!(config.poll_interval() >= Duration::from_secs(MIN_POLL_INTERVAL_SECS));
    }
}
