//! Configuration module for environment variable parsing.
//!
//! Directories, the store path and SMTP settings come from the environment;
//! the CLI may override the paths afterwards.

use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::warn;

/// Default directory scanned for new emails.
pub const DEFAULT_INPUT_DIR: &str = "emails/input";

/// Default directory processed emails are moved into.
pub const DEFAULT_ARCHIVE_DIR: &str = "emails/archive";

/// Default location of the digest store.
pub const DEFAULT_DB_FILE: &str = "db/email_database.json";

/// Default SMTP relay (implicit TLS).
pub const DEFAULT_EMAIL_HOST: &str = "smtp.gmail.com";

/// Default SMTP port (implicit TLS).
pub const DEFAULT_EMAIL_PORT: u16 = 465;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory scanned for raw emails
    pub input_dir: PathBuf,

    /// Directory processed emails are archived into
    pub archive_dir: PathBuf,

    /// JSON digest store
    pub db_file: PathBuf,

    /// SMTP relay hostname
    pub email_host: String,

    /// SMTP relay port
    pub email_port: u16,

    /// Digest recipients
    pub subscribers: Option<Vec<String>>,

    /// SMTP login, also used as the From address
    pub smtp_username: Option<String>,

    /// SMTP password (app password)
    pub smtp_password: Option<String>,
}

/// Everything needed to open an SMTP session.
#[derive(Debug, Clone)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
}

impl Default for Config {
    /// Built-in defaults with no subscribers and no SMTP credentials.
    fn default() -> Self {
        Config {
            input_dir: DEFAULT_INPUT_DIR.into(),
            archive_dir: DEFAULT_ARCHIVE_DIR.into(),
            db_file: DEFAULT_DB_FILE.into(),
            email_host: DEFAULT_EMAIL_HOST.to_string(),
            email_port: DEFAULT_EMAIL_PORT,
            subscribers: None,
            smtp_username: None,
            smtp_password: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Config {
            input_dir: env::var("INPUT_DIR")
                .unwrap_or_else(|_| DEFAULT_INPUT_DIR.to_string())
                .into(),

            archive_dir: env::var("ARCHIVE_DIR")
                .unwrap_or_else(|_| DEFAULT_ARCHIVE_DIR.to_string())
                .into(),

            db_file: env::var("DB_FILE")
                .unwrap_or_else(|_| DEFAULT_DB_FILE.to_string())
                .into(),

            email_host: env::var("EMAIL_HOST").unwrap_or_else(|_| DEFAULT_EMAIL_HOST.to_string()),

            email_port: parse_port("EMAIL_PORT", DEFAULT_EMAIL_PORT),

            subscribers: parse_csv("DOMAINS_SUBSCRIBERS").filter(|list| !list.is_empty()),

            smtp_username: env::var("GMAIL_APP_USERNAME").ok(),

            smtp_password: env::var("GMAIL_APP_PASSWORD").ok(),
        }
    }

    /// SMTP settings, failing with the name of the first missing variable.
    pub fn smtp(&self) -> Result<SmtpSettings> {
        let username = self
            .smtp_username
            .clone()
            .context("GMAIL_APP_USERNAME environment variable not set")?;

        let password = self
            .smtp_password
            .clone()
            .context("GMAIL_APP_PASSWORD environment variable not set")?;

        Ok(SmtpSettings {
            host: self.email_host.clone(),
            port: self.email_port,
            username,
            password,
        })
    }
}

fn parse_port(name: &str, default: u16) -> u16 {
    let raw = match env::var(name) {
        Ok(v) => v,
        Err(_) => return default,
    };

    match raw.trim().parse::<u16>() {
        Ok(port) if port > 0 => port,
        _ => {
            warn!(env_var = name, value = %raw, "Invalid port, using default");
            default
        }
    }
}

/// Parse a comma-separated list of strings.
fn parse_csv(name: &str) -> Option<Vec<String>> {
    env::var(name).ok().map(|raw| {
        raw.split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    })
}
