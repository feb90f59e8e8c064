// Runtime configuration read from the environment

use std::time::Duration;

use thiserror::Error;

/// Shortest accepted signing secret, in bytes
pub const MIN_JWT_SECRET_LEN: usize = 32;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_MAIL_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{var} is invalid: {reason}")]
    Invalid { var: &'static str, reason: String },
}

/// SMTP relay settings; present only when every SMTP variable is set
#[derive(Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from_address: String,
}

/// Account created at startup when no account with its email exists
#[derive(Clone)]
pub struct AdminSeed {
    pub username: String,
    pub phone: String,
    pub email: String,
    pub password: String,
}

/// Application configuration
///
/// Holds the signing secret, so it has no `Debug` impl.
#[derive(Clone)]
pub struct Config {
    pub jwt_secret: String,
    pub database_url: Option<String>,
    pub host: String,
    pub port: u16,
    pub smtp: Option<SmtpConfig>,
    pub mail_timeout: Duration,
    pub admin: Option<AdminSeed>,
}

impl Config {
    /// Read the configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the configuration through `lookup`; empty values count as unset
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let jwt_secret = get("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?;
        if jwt_secret.len() < MIN_JWT_SECRET_LEN {
            return Err(ConfigError::Invalid {
                var: "JWT_SECRET",
                reason: format!("must be at least {} bytes", MIN_JWT_SECRET_LEN),
            });
        }

        let port = match get("PORT") {
            Some(raw) => parse_number("PORT", &raw)?,
            None => DEFAULT_PORT,
        };

        let mail_timeout_secs = match get("MAIL_TIMEOUT_SECS") {
            Some(raw) => parse_number("MAIL_TIMEOUT_SECS", &raw)?,
            None => DEFAULT_MAIL_TIMEOUT_SECS,
        };

        let smtp = match (
            get("SMTP_HOST"),
            get("SMTP_PORT"),
            get("SMTP_USERNAME"),
            get("SMTP_PASSWORD"),
            get("MAIL_FROM"),
        ) {
            (Some(host), Some(port), Some(username), Some(password), Some(from_address)) => {
                Some(SmtpConfig {
                    host,
                    port: parse_number("SMTP_PORT", &port)?,
                    username,
                    password,
                    from_address,
                })
            }
            (None, None, None, None, None) => None,
            _ => {
                return Err(ConfigError::Invalid {
                    var: "SMTP_HOST",
                    reason: "SMTP_HOST, SMTP_PORT, SMTP_USERNAME, SMTP_PASSWORD and MAIL_FROM must be set together"
                        .to_string(),
                })
            }
        };

        let admin = match (
            get("ADMIN_USERNAME"),
            get("ADMIN_PHONE"),
            get("ADMIN_EMAIL"),
            get("ADMIN_PASSWORD"),
        ) {
            (Some(username), Some(phone), Some(email), Some(password)) => Some(AdminSeed {
                username,
                phone,
                email,
                password,
            }),
            (None, None, None, None) => None,
            _ => {
                return Err(ConfigError::Invalid {
                    var: "ADMIN_EMAIL",
                    reason: "ADMIN_USERNAME, ADMIN_PHONE, ADMIN_EMAIL and ADMIN_PASSWORD must be set together"
                        .to_string(),
                })
            }
        };

        Ok(Self {
            jwt_secret,
            database_url: get("DATABASE_URL"),
            host: get("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            smtp,
            mail_timeout: Duration::from_secs(mail_timeout_secs),
            admin,
        })
    }

    /// Address the server binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_number<T>(var: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        var,
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[("JWT_SECRET", SECRET)]).unwrap();

        assert_eq!(config.bind_address(), "0.0.0.0:8080");
        assert!(config.database_url.is_none());
        assert!(config.smtp.is_none());
        assert!(config.admin.is_none());
        assert_eq!(config.mail_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_secret_is_required_and_long_enough() {
        assert_eq!(load(&[]).err(), Some(ConfigError::Missing("JWT_SECRET")));
        assert!(matches!(
            load(&[("JWT_SECRET", "short")]),
            Err(ConfigError::Invalid { var: "JWT_SECRET", .. })
        ));
    }

    #[test]
    fn test_bad_port_is_invalid() {
        assert!(matches!(
            load(&[("JWT_SECRET", SECRET), ("PORT", "eighty")]),
            Err(ConfigError::Invalid { var: "PORT", .. })
        ));
    }

    #[test]
    fn test_partial_smtp_group_is_rejected() {
        assert!(load(&[("JWT_SECRET", SECRET), ("SMTP_HOST", "smtp.example.com")]).is_err());

        let config = load(&[
            ("JWT_SECRET", SECRET),
            ("SMTP_HOST", "smtp.example.com"),
            ("SMTP_PORT", "587"),
            ("SMTP_USERNAME", "mailer"),
            ("SMTP_PASSWORD", "pw"),
            ("MAIL_FROM", "noreply@example.com"),
        ])
        .unwrap();
        assert_eq!(config.smtp.map(|smtp| smtp.port), Some(587));
    }

    #[test]
    fn test_admin_seed() {
        let config = load(&[
            ("JWT_SECRET", SECRET),
            ("ADMIN_USERNAME", "root"),
            ("ADMIN_PHONE", "9999999999"),
            ("ADMIN_EMAIL", "admin@example.com"),
            ("ADMIN_PASSWORD", "change-me"),
        ])
        .unwrap();
        assert_eq!(config.admin.map(|seed| seed.email).as_deref(), Some("admin@example.com"));
    }
}
