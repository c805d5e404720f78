use chrono_tz::Tz;
use medtrack_domain::DEFAULT_TOLERANCE_MINUTES;
use medtrack_utils::create_random_secret;
use std::{fmt::Display, str::FromStr, time::Duration};
use tracing::{info, warn};

const DEFAULT_PORT: usize = 5000;
const DEFAULT_TIMEZONE: Tz = chrono_tz::Europe::London;
const DEFAULT_CHANNEL_TIMEOUT_SECS: u64 = 10;
const DEFAULT_ONESIGNAL_API_URL: &str = "https://onesignal.com/api/v1";

#[derive(Debug, Clone)]
pub struct OneSignalConfig {
    pub api_url: String,
    pub app_id: Option<String>,
    /// REST api key, sent with basic auth
    pub api_key: Option<String>,
}

#[derive(Debug, Clone)]
pub struct EmailConfig {
    /// Endpoint of a transactional email REST api accepting `{from, to, subject, html}`
    pub api_url: Option<String>,
    pub api_key: Option<String>,
    pub from: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Port for the application to run on when serving
    pub port: usize,
    /// Number of minutes a reminder tier stays due on each side of its
    /// offset from the scheduled dose time. Shared by all tiers.
    pub tolerance_minutes: i64,
    /// The timezone which decides what "today" is when looking for doses
    pub timezone: Tz,
    /// Upper bound for a single request to a push or email provider
    pub channel_timeout: Duration,
    pub onesignal: OneSignalConfig,
    pub email: EmailConfig,
    /// Secret that must be provided to trigger a reminder pass over http
    pub cron_secret: String,
}

impl Config {
    pub fn new() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the `Config` from the given variable lookup, falling back to
    /// defaults for missing or invalid values
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let cron_secret = match lookup("CRON_SECRET") {
            Some(secret) => secret,
            None => {
                info!("Did not find CRON_SECRET environment variable. Going to create one.");
                let secret = create_random_secret(32);
                info!(
                    "Secret for triggering reminder passes was generated and set to: {}",
                    secret
                );
                secret
            }
        };

        let port = parse_or_default(&lookup, "PORT", DEFAULT_PORT);
        let tolerance_minutes =
            parse_or_default(&lookup, "REMINDER_TOLERANCE_MINUTES", DEFAULT_TOLERANCE_MINUTES);
        let tolerance_minutes = if tolerance_minutes < 0 {
            warn!(
                "REMINDER_TOLERANCE_MINUTES cannot be negative, falling back to the default: {}.",
                DEFAULT_TOLERANCE_MINUTES
            );
            DEFAULT_TOLERANCE_MINUTES
        } else {
            tolerance_minutes
        };
        let timezone = parse_or_default(&lookup, "REMINDER_TIMEZONE", DEFAULT_TIMEZONE);
        let channel_timeout_secs =
            parse_or_default(&lookup, "CHANNEL_TIMEOUT_SECS", DEFAULT_CHANNEL_TIMEOUT_SECS);

        Self {
            port,
            tolerance_minutes,
            timezone,
            channel_timeout: Duration::from_secs(channel_timeout_secs),
            onesignal: OneSignalConfig {
                api_url: lookup("ONESIGNAL_API_URL")
                    .unwrap_or_else(|| DEFAULT_ONESIGNAL_API_URL.into()),
                app_id: lookup("ONESIGNAL_APP_ID"),
                api_key: lookup("ONESIGNAL_API_KEY"),
            },
            email: EmailConfig {
                api_url: lookup("EMAIL_API_URL"),
                api_key: lookup("EMAIL_API_KEY"),
                from: lookup("EMAIL_FROM"),
            },
            cron_secret,
        }
    }
}

fn parse_or_default<T, F>(lookup: &F, key: &str, default: T) -> T
where
    T: FromStr + Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => default,
        Some(value) => match value.trim().parse::<T>() {
            Ok(parsed) => parsed,
            Err(_) => {
                warn!(
                    "The given {}: {} is not valid, falling back to the default: {}.",
                    key, value, default
                );
                default
            }
        },
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
