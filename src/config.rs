//! Configuration types.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;

/// Default delay between a declined payment and its reminder (7 days).
pub const DEFAULT_REMINDER_DELAY: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Default interval of the reminder ticker.
pub const DEFAULT_REMINDER_TICK: Duration = Duration::from_secs(30);

/// Bot configuration.
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Bot name for identification in logs.
    pub name: String,
    /// Path of the libSQL database file.
    pub db_path: PathBuf,
    /// Delay after a "нет" payment decision before the reminder check runs.
    pub reminder_delay: Duration,
    /// How often the reminder ticker looks for due jobs.
    pub reminder_tick: Duration,
    /// Telegram credentials. `None` runs the bot on the CLI channel.
    pub telegram: Option<TelegramConfig>,
    /// Directory for daily-rolling log files, if file logging is wanted.
    pub log_dir: Option<PathBuf>,
}

/// Telegram transport configuration.
#[derive(Debug, Clone)]
pub struct TelegramConfig {
    pub bot_token: SecretString,
    /// Usernames or numeric ids allowed to talk to the bot (`*` = everyone).
    pub allowed_users: Vec<String>,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            name: "course-bot".to_string(),
            db_path: PathBuf::from("./data/course-bot.db"),
            reminder_delay: DEFAULT_REMINDER_DELAY,
            reminder_tick: DEFAULT_REMINDER_TICK,
            telegram: None,
            log_dir: None,
        }
    }
}

impl BotConfig {
    /// Build the configuration from the process environment.
    ///
    /// A `.env` file in the working directory is loaded first when present.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                tracing::warn!("Failed to load .env file: {e}");
            }
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let db_path = lookup("COURSE_BOT_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.db_path);

        let reminder_delay = parse_secs(&lookup, "COURSE_BOT_REMINDER_DELAY_SECS")?
            .unwrap_or(defaults.reminder_delay);
        let reminder_tick = parse_secs(&lookup, "COURSE_BOT_REMINDER_TICK_SECS")?
            .unwrap_or(defaults.reminder_tick);

        let telegram = lookup("TELEGRAM_BOT_TOKEN")
            .filter(|t| !t.trim().is_empty())
            .map(|token| TelegramConfig {
                bot_token: SecretString::from(token),
                allowed_users: lookup("TELEGRAM_ALLOWED_USERS")
                    .unwrap_or_else(|| "*".to_string())
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
            });

        let log_dir = lookup("COURSE_BOT_LOG_DIR").map(PathBuf::from);

        Ok(Self {
            db_path,
            reminder_delay,
            reminder_tick,
            telegram,
            log_dir,
            ..defaults
        })
    }
}

/// Parse a positive number of seconds. Absent keys yield `None`.
fn parse_secs<F>(lookup: &F, key: &str) -> Result<Option<Duration>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };
    let secs: u64 = raw.trim().parse().map_err(|e| ConfigError::InvalidValue {
        key: key.to_string(),
        message: format!("{raw:?} is not a number of seconds: {e}"),
    })?;
    if secs == 0 {
        return Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: "must be greater than zero".to_string(),
        });
    }
    Ok(Some(Duration::from_secs(secs)))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_environment_empty() {
        let config = BotConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.db_path, PathBuf::from("./data/course-bot.db"));
        assert_eq!(config.reminder_delay, DEFAULT_REMINDER_DELAY);
        assert_eq!(config.reminder_tick, DEFAULT_REMINDER_TICK);
        assert!(config.telegram.is_none());
        assert!(config.log_dir.is_none());
    }

    #[test]
    fn reads_reminder_delay() {
        let config =
            BotConfig::from_lookup(lookup_from(&[("COURSE_BOT_REMINDER_DELAY_SECS", "60")]))
                .unwrap();
        assert_eq!(config.reminder_delay, Duration::from_secs(60));
    }

    #[test]
    fn rejects_non_numeric_delay() {
        let err =
            BotConfig::from_lookup(lookup_from(&[("COURSE_BOT_REMINDER_DELAY_SECS", "soon")]))
                .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "COURSE_BOT_REMINDER_DELAY_SECS"));
    }

    #[test]
    fn rejects_zero_tick() {
        let err = BotConfig::from_lookup(lookup_from(&[("COURSE_BOT_REMINDER_TICK_SECS", "0")]))
            .unwrap_err();
        assert!(err.to_string().contains("greater than zero"));
    }

    #[test]
    fn telegram_enabled_by_token() {
        let config = BotConfig::from_lookup(lookup_from(&[
            ("TELEGRAM_BOT_TOKEN", "123:ABC"),
            ("TELEGRAM_ALLOWED_USERS", "alice, 42 ,"),
        ]))
        .unwrap();
        let telegram = config.telegram.unwrap();
        assert_eq!(telegram.bot_token.expose_secret(), "123:ABC");
        assert_eq!(telegram.allowed_users, vec!["alice", "42"]);
    }

    #[test]
    fn blank_token_keeps_cli_transport() {
        let config =
            BotConfig::from_lookup(lookup_from(&[("TELEGRAM_BOT_TOKEN", "  ")])).unwrap();
        assert!(config.telegram.is_none());
    }

    #[test]
    fn allowed_users_default_to_everyone() {
        let config =
            BotConfig::from_lookup(lookup_from(&[("TELEGRAM_BOT_TOKEN", "t")])).unwrap();
        assert_eq!(config.telegram.unwrap().allowed_users, vec!["*"]);
    }
}
