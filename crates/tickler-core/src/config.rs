use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

pub const DEFAULT_TICK_SECS: u64 = 2;
pub const DEFAULT_ARMING_WINDOW_SECS: u64 = 1800; // 30 min before due
pub const DEFAULT_FOLLOW_UP_SECS: u64 = 1800; // nag every 30 min until done
pub const DEFAULT_CHANNEL_LINK_PREFIX: &str = "https://t.me/";
pub const DEFAULT_HEALTH_BIND: &str = "127.0.0.1";
pub const DEFAULT_HEALTH_PORT: u16 = 18790;

/// Top-level config (tickler.toml + TICKLER_* env overrides).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TicklerConfig {
    #[serde(default)]
    pub bot: BotConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub health: HealthConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    /// Telegram bot token. Required to start the adapter.
    #[serde(default)]
    pub token: Option<String>,
    /// Telegram user IDs allowed to manage the channel gating list.
    #[serde(default)]
    pub admin_ids: Vec<u64>,
    /// Free text starting with this prefix is treated as a channel link.
    #[serde(default = "default_channel_link_prefix")]
    pub channel_link_prefix: String,
    /// When true, a channel link from an admin is registered in any state:
    /// it interrupts a pending flow (including date entry) and is also taken
    /// from `Idle`. Each registered channel gates every non-admin user, so a
    /// link pasted into chat by an admin switches gating on. When false, links
    /// are only recognised while the admin is in the add-channel flow.
    #[serde(default = "bool_true")]
    pub link_override: bool,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            token: None,
            admin_ids: Vec::new(),
            channel_link_prefix: default_channel_link_prefix(),
            link_override: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Polling period of the scan loop.
    #[serde(default = "default_tick_secs")]
    pub tick_secs: u64,
    /// How far ahead of the due time a reminder gets armed. Must stay larger
    /// than `tick_secs` or reminders can slip through between two scans.
    #[serde(default = "default_arming_window_secs")]
    pub arming_window_secs: u64,
    /// Interval between follow-up notifications.
    #[serde(default = "default_follow_up_secs")]
    pub follow_up_secs: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_secs: DEFAULT_TICK_SECS,
            arming_window_secs: DEFAULT_ARMING_WINDOW_SECS,
            follow_up_secs: DEFAULT_FOLLOW_UP_SECS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Optional HTTP health endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_health_bind")]
    pub bind: String,
    #[serde(default = "default_health_port")]
    pub port: u16,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            bind: default_health_bind(),
            port: default_health_port(),
        }
    }
}

fn bool_true() -> bool {
    true
}
fn default_channel_link_prefix() -> String {
    DEFAULT_CHANNEL_LINK_PREFIX.to_string()
}
fn default_tick_secs() -> u64 {
    DEFAULT_TICK_SECS
}
fn default_arming_window_secs() -> u64 {
    DEFAULT_ARMING_WINDOW_SECS
}
fn default_follow_up_secs() -> u64 {
    DEFAULT_FOLLOW_UP_SECS
}
fn default_health_bind() -> String {
    DEFAULT_HEALTH_BIND.to_string()
}
fn default_health_port() -> u16 {
    DEFAULT_HEALTH_PORT
}
fn default_db_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.tickler/tickler.db", home)
}

impl TicklerConfig {
    /// Load config from a TOML file with TICKLER_* env var overrides.
    ///
    /// Nested keys use a double underscore: `TICKLER_BOT__TOKEN`,
    /// `TICKLER_SCHEDULER__TICK_SECS`.
    pub fn load(config_path: Option<&str>) -> crate::error::Result<Self> {
        let path = config_path
            .map(String::from)
            .unwrap_or_else(default_config_path);

        let config: TicklerConfig = Figment::new()
            .merge(Toml::file(&path))
            .merge(Env::prefixed("TICKLER_").split("__"))
            .extract()
            .map_err(|e| crate::error::TicklerError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Reject values the scheduler cannot work with.
    pub fn validate(&self) -> crate::error::Result<()> {
        let s = &self.scheduler;
        if s.tick_secs == 0 || s.follow_up_secs == 0 {
            return Err(crate::error::TicklerError::Config(
                "scheduler.tick_secs and scheduler.follow_up_secs must be positive".into(),
            ));
        }
        if s.arming_window_secs <= s.tick_secs {
            return Err(crate::error::TicklerError::Config(format!(
                "scheduler.arming_window_secs ({}) must exceed scheduler.tick_secs ({})",
                s.arming_window_secs, s.tick_secs
            )));
        }
        if self.bot.channel_link_prefix.is_empty() {
            return Err(crate::error::TicklerError::Config(
                "bot.channel_link_prefix must not be empty".into(),
            ));
        }
        Ok(())
    }
}

/// `~/.tickler/tickler.toml`, used when neither `--config` nor `TICKLER_CONFIG` is given.
pub fn default_config_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.tickler/tickler.toml", home)
}
