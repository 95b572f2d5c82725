use std::{env, net::SocketAddr, time::Duration};

use chrono::FixedOffset;
use thiserror::Error;

#[cfg(test)]
use once_cell::sync::Lazy;
#[cfg(test)]
pub(crate) static ENV_MUTEX: Lazy<std::sync::Mutex<()>> = Lazy::new(|| std::sync::Mutex::new(()));

const SECONDS_PER_HOUR: i32 = 3600;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    http_bind: SocketAddr,
    search_base_url: String,
    tribunal_alias: String,
    search_api_key: String,
    advocate_name: String,
    webhook_url: String,
    search_timeout: Duration,
    search_page_size: usize,
    search_max_pages: usize,
    relay_timeout: Duration,
    relay_max_attempts: usize,
    relay_backoff_step_ms: u64,
    relay_pacing: Duration,
    primary_hour: u32,
    primary_minute: u32,
    escalation_interval: Duration,
    cutoff_hour: u32,
    tz: FixedOffset,
    keepalive_url: Option<String>,
    keepalive_interval: Duration,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing environment variable: {0}")]
    Missing(&'static str),
    #[error("invalid value for {name}: {source}")]
    Invalid {
        name: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

impl Config {
    /// 環境変数から監視ワーカーの設定値を読み込み、検証する。
    ///
    /// 必須の環境変数が揃っていない場合や、数値のパースに失敗した場合は
    /// 起動前に致命的エラーとして返す。スケジューリング開始後に設定起因で
    /// 失敗することはない。
    ///
    /// # Errors
    /// `SEARCH_API_KEY` / `WEBHOOK_URL` / `ADVOCATE_NAME` が未設定、
    /// もしくは各種値のパースに失敗した場合は [`ConfigError`] を返す。
    pub fn from_env() -> Result<Self, ConfigError> {
        let search_api_key = env_var("SEARCH_API_KEY")?;
        let webhook_url = env_var("WEBHOOK_URL")?;
        let advocate_name = env_var("ADVOCATE_NAME")?;

        let http_bind = parse_socket_addr("DJE_WATCHER_HTTP_BIND", "0.0.0.0:9105")?;
        let search_base_url = env::var("SEARCH_API_BASE_URL")
            .unwrap_or_else(|_| "https://api-publica.datajud.cnj.jus.br".to_string());
        let tribunal_alias =
            env::var("TRIBUNAL_ALIAS").unwrap_or_else(|_| "api_publica_tjba".to_string());

        // Upstream pagination settings
        let search_timeout = parse_duration_ms("SEARCH_TIMEOUT_MS", 10_000)?;
        let search_page_size = parse_usize("SEARCH_PAGE_SIZE", 10)?;
        let search_max_pages = parse_usize("SEARCH_MAX_PAGES", 10)?;

        // Webhook relay settings (linear backoff + fixed pacing)
        let relay_timeout = parse_duration_ms("RELAY_TIMEOUT_MS", 10_000)?;
        let relay_max_attempts = parse_usize("RELAY_MAX_ATTEMPTS", 3)?;
        let relay_backoff_step_ms = parse_u64("RELAY_BACKOFF_STEP_MS", 2_000)?;
        let relay_pacing = parse_duration_ms("RELAY_PACING_MS", 5_000)?;

        // Schedule settings (local wall clock, business days)
        let primary_hour = parse_hour("PRIMARY_CHECK_HOUR", 8)?;
        let primary_minute = parse_minute("PRIMARY_CHECK_MINUTE", 0)?;
        let escalation_interval = parse_duration_minutes("ESCALATION_INTERVAL_MINUTES", 20)?;
        let cutoff_hour = parse_hour("ESCALATION_CUTOFF_HOUR", 17)?;
        let tz = parse_tz_offset("TZ_OFFSET_HOURS", -3)?;

        // Keepalive pinger (disabled unless a URL is provided)
        let keepalive_url = env::var("KEEPALIVE_URL").ok();
        let keepalive_interval = parse_duration_minutes("KEEPALIVE_INTERVAL_MINUTES", 14)?;

        Ok(Self {
            http_bind,
            search_base_url,
            tribunal_alias,
            search_api_key,
            advocate_name,
            webhook_url,
            search_timeout,
            search_page_size,
            search_max_pages,
            relay_timeout,
            relay_max_attempts,
            relay_backoff_step_ms,
            relay_pacing,
            primary_hour,
            primary_minute,
            escalation_interval,
            cutoff_hour,
            tz,
            keepalive_url,
            keepalive_interval,
        })
    }

    #[must_use]
    pub fn http_bind(&self) -> SocketAddr {
        self.http_bind
    }

    #[must_use]
    pub fn search_base_url(&self) -> &str {
        &self.search_base_url
    }

    #[must_use]
    pub fn tribunal_alias(&self) -> &str {
        &self.tribunal_alias
    }

    #[must_use]
    pub fn search_api_key(&self) -> &str {
        &self.search_api_key
    }

    #[must_use]
    pub fn advocate_name(&self) -> &str {
        &self.advocate_name
    }

    #[must_use]
    pub fn webhook_url(&self) -> &str {
        &self.webhook_url
    }

    #[must_use]
    pub fn search_timeout(&self) -> Duration {
        self.search_timeout
    }

    #[must_use]
    pub fn search_page_size(&self) -> usize {
        self.search_page_size
    }

    #[must_use]
    pub fn search_max_pages(&self) -> usize {
        self.search_max_pages
    }

    #[must_use]
    pub fn relay_timeout(&self) -> Duration {
        self.relay_timeout
    }

    #[must_use]
    pub fn relay_max_attempts(&self) -> usize {
        self.relay_max_attempts
    }

    #[must_use]
    pub fn relay_backoff_step_ms(&self) -> u64 {
        self.relay_backoff_step_ms
    }

    #[must_use]
    pub fn relay_pacing(&self) -> Duration {
        self.relay_pacing
    }

    #[must_use]
    pub fn primary_hour(&self) -> u32 {
        self.primary_hour
    }

    #[must_use]
    pub fn primary_minute(&self) -> u32 {
        self.primary_minute
    }

    #[must_use]
    pub fn escalation_interval(&self) -> Duration {
        self.escalation_interval
    }

    #[must_use]
    pub fn cutoff_hour(&self) -> u32 {
        self.cutoff_hour
    }

    #[must_use]
    pub fn timezone(&self) -> FixedOffset {
        self.tz
    }

    #[must_use]
    pub fn keepalive_url(&self) -> Option<&str> {
        self.keepalive_url.as_deref()
    }

    #[must_use]
    pub fn keepalive_interval(&self) -> Duration {
        self.keepalive_interval
    }
}

fn env_var(name: &'static str) -> Result<String, ConfigError> {
    env::var(name).map_err(|_| ConfigError::Missing(name))
}

fn parse_socket_addr(name: &'static str, default: &str) -> Result<SocketAddr, ConfigError> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());

    raw.parse().map_err(|error| ConfigError::Invalid {
        name,
        source: anyhow::Error::new(error),
    })
}

fn parse_usize(name: &'static str, default: usize) -> Result<usize, ConfigError> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    raw.parse::<usize>().map_err(|error| ConfigError::Invalid {
        name,
        source: anyhow::Error::new(error),
    })
}

fn parse_u32(name: &'static str, default: u32) -> Result<u32, ConfigError> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    raw.parse::<u32>().map_err(|error| ConfigError::Invalid {
        name,
        source: anyhow::Error::new(error),
    })
}

fn parse_u64(name: &'static str, default: u64) -> Result<u64, ConfigError> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    raw.parse::<u64>().map_err(|error| ConfigError::Invalid {
        name,
        source: anyhow::Error::new(error),
    })
}

fn parse_duration_ms(name: &'static str, default_ms: u64) -> Result<Duration, ConfigError> {
    let ms = parse_u64(name, default_ms)?;
    Ok(Duration::from_millis(ms))
}

fn parse_duration_minutes(name: &'static str, default_minutes: u64) -> Result<Duration, ConfigError> {
    let minutes = parse_u64(name, default_minutes)?;
    Ok(Duration::from_secs(minutes * 60))
}

fn parse_hour(name: &'static str, default: u32) -> Result<u32, ConfigError> {
    let hour = parse_u32(name, default)?;
    if hour >= 24 {
        return Err(ConfigError::Invalid {
            name,
            source: anyhow::anyhow!("hour must be between 0 and 23"),
        });
    }
    Ok(hour)
}

fn parse_minute(name: &'static str, default: u32) -> Result<u32, ConfigError> {
    let minute = parse_u32(name, default)?;
    if minute >= 60 {
        return Err(ConfigError::Invalid {
            name,
            source: anyhow::anyhow!("minute must be between 0 and 59"),
        });
    }
    Ok(minute)
}

fn parse_tz_offset(name: &'static str, default: i32) -> Result<FixedOffset, ConfigError> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    let hours = raw.parse::<i32>().map_err(|error| ConfigError::Invalid {
        name,
        source: anyhow::Error::new(error),
    })?;
    FixedOffset::east_opt(hours * SECONDS_PER_HOUR).ok_or_else(|| ConfigError::Invalid {
        name,
        source: anyhow::anyhow!("offset out of range: {hours} hours"),
    })
}
