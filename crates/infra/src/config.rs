use std::str::FromStr;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct Config {
    /// Seconds between two scheduling cycles
    pub poll_interval_secs: u64,
    /// Width in seconds of the one-shot fetch window. Always at least as
    /// large as the poll interval so consecutive windows leave no gap.
    pub fetch_window_secs: u64,
    /// Minimum alert code a reminder must carry to be a delivery candidate
    pub alert_threshold: i64,
    /// When enabled, reminder text is localized by the store read using the
    /// recipient's language tag
    pub localized_reminder_text: bool,
    /// Upper bound in seconds for a single push-provider or SMTP request
    pub provider_timeout_secs: u64,
    pub apns: ApnsConfig,
    pub fcm: FcmConfig,
    /// Operator bug-alert mail settings. `None` disables the email sink.
    pub smtp: Option<SmtpConfig>,
}

#[derive(Debug, Clone)]
pub struct ApnsConfig {
    pub endpoint: String,
    pub topic: String,
    pub auth_token: String,
}

#[derive(Debug, Clone)]
pub struct FcmConfig {
    pub endpoint: String,
    pub server_key: String,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub username: String,
    pub password: String,
    pub from: String,
    pub to: String,
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.into())
}

fn parse_env_or<T>(name: &str, default: T) -> T
where
    T: FromStr + std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => match raw.parse::<T>() {
            Ok(value) => value,
            Err(_) => {
                warn!(
                    "The given {}: {} is not valid, falling back to the default: {}.",
                    name, raw, default
                );
                default
            }
        },
        Err(_) => default,
    }
}

impl Config {
    pub fn new() -> Self {
        let poll_interval_secs = parse_env_or("POLL_INTERVAL_SECS", 60);
        let mut fetch_window_secs = parse_env_or("FETCH_WINDOW_SECS", poll_interval_secs);
        if fetch_window_secs < poll_interval_secs {
            warn!(
                "FETCH_WINDOW_SECS: {} is smaller than POLL_INTERVAL_SECS: {} and would leave \
                 gaps between cycles. Using the poll interval as window.",
                fetch_window_secs, poll_interval_secs
            );
            fetch_window_secs = poll_interval_secs;
        }

        let apns = ApnsConfig {
            endpoint: env_or("APNS_ENDPOINT", "https://api.push.apple.com"),
            topic: env_or("APNS_TOPIC", ""),
            auth_token: match std::env::var("APNS_AUTH_TOKEN") {
                Ok(token) => token,
                Err(_) => {
                    info!("Did not find APNS_AUTH_TOKEN environment variable. iOS deliveries will be rejected by the provider.");
                    String::new()
                }
            },
        };
        let fcm = FcmConfig {
            endpoint: env_or("FCM_ENDPOINT", "https://fcm.googleapis.com/fcm/send"),
            server_key: match std::env::var("FCM_SERVER_KEY") {
                Ok(key) => key,
                Err(_) => {
                    info!("Did not find FCM_SERVER_KEY environment variable. Android deliveries will be rejected by the provider.");
                    String::new()
                }
            },
        };

        let smtp = match (
            std::env::var("SMTP_HOST"),
            std::env::var("SMTP_USERNAME"),
            std::env::var("SMTP_PASSWORD"),
            std::env::var("ALERT_EMAIL_FROM"),
            std::env::var("ALERT_EMAIL_TO"),
        ) {
            (Ok(host), Ok(username), Ok(password), Ok(from), Ok(to)) => Some(SmtpConfig {
                host,
                username,
                password,
                from,
                to,
            }),
            _ => {
                info!("SMTP alerting is not fully configured. Failure reports go to the log only.");
                None
            }
        };

        Self {
            poll_interval_secs,
            fetch_window_secs,
            alert_threshold: parse_env_or("ALERT_THRESHOLD", 32),
            localized_reminder_text: parse_env_or("LOCALIZED_REMINDER_TEXT", false),
            provider_timeout_secs: parse_env_or("PROVIDER_TIMEOUT_SECS", 10),
            apns,
            fcm,
            smtp,
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn fetch_window_millis(&self) -> i64 {
        self.fetch_window_secs as i64 * 1000
    }

    pub fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.provider_timeout_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
