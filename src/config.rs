use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::auth::validator::DEFAULT_MARGIN_SECS;

const DEFAULT_BASE_URL: &str = "https://test.adm.mazovia.edu.pl/api/v1/";

/// Mazovia verification client
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Base URL of the verification backend
    #[arg(long, env = "MAZOVIA_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Path to the credential database
    #[arg(long, env = "MAZOVIA_CREDENTIALS_FILE")]
    pub credentials_file: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "warn")]
    pub log_level: String,

    /// Seconds before nominal expiry at which a token counts as stale
    #[arg(long, env = "TOKEN_EXPIRY_MARGIN", default_value_t = DEFAULT_MARGIN_SECS)]
    pub expiry_margin: i64,

    /// HTTP connect timeout in seconds
    #[arg(long, env = "HTTP_CONNECT_TIMEOUT", default_value = "30")]
    pub connect_timeout: u64,

    /// HTTP request timeout in seconds
    #[arg(long, env = "HTTP_REQUEST_TIMEOUT", default_value = "30")]
    pub request_timeout: u64,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Log in and store the issued tokens
    Login {
        /// Account name; prompted for when omitted
        #[arg(long)]
        username: Option<String>,
    },
    /// Log out and clear stored credentials
    Logout,
    /// Show the authenticated account
    Whoami,
    /// List verification requests
    List {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 20)]
        page_size: u32,
        #[arg(long, default_value = "-created_at")]
        sort: String,
        /// Include finished requests, not only pending ones
        #[arg(long)]
        all: bool,
        /// Filter by status (with --all)
        #[arg(long)]
        status: Option<String>,
        /// Filter by request type (with --all)
        #[arg(long = "type")]
        kind: Option<String>,
    },
    /// Answer a verification request
    Verify {
        #[arg(long)]
        token: String,
        /// Request type, as reported by `list`
        #[arg(long = "type")]
        kind: String,
        /// Answer for challenge-style requests
        #[arg(long)]
        answer: Option<String>,
    },
    /// Show the state of a verification request
    Status {
        #[arg(long)]
        token: String,
    },
    /// Cancel a verification request
    Cancel {
        #[arg(long)]
        token: String,
    },
}

#[derive(Clone, Debug)]
pub struct Config {
    pub base_url: reqwest::Url,
    pub credentials_file: PathBuf,
    pub log_level: String,
    pub expiry_margin_secs: i64,
    pub http_connect_timeout: u64,
    pub http_request_timeout: u64,
}

impl Config {
    /// Build the runtime configuration from parsed arguments. Priority is
    /// CLI > ENV > defaults; clap resolves the env fallback per field.
    pub fn from_args(args: &CliArgs) -> Result<Self> {
        let base_url = reqwest::Url::parse(&args.base_url)
            .with_context(|| format!("Invalid base URL: {}", args.base_url))?;

        let credentials_file = match args.credentials_file.as_deref() {
            Some(path) => expand_tilde(path),
            None => default_credentials_file()?,
        };

        Ok(Self {
            base_url,
            credentials_file,
            log_level: args.log_level.clone(),
            expiry_margin_secs: args.expiry_margin,
            http_connect_timeout: args.connect_timeout,
            http_request_timeout: args.request_timeout,
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if !matches!(self.base_url.scheme(), "http" | "https") {
            anyhow::bail!("Base URL must be http or https: {}", self.base_url);
        }

        if self.expiry_margin_secs < 0 {
            anyhow::bail!("TOKEN_EXPIRY_MARGIN must not be negative");
        }

        Ok(())
    }
}

/// Default on-disk location of the credential database.
fn default_credentials_file() -> Result<PathBuf> {
    let dir = dirs::data_dir().context("Could not determine the user data directory")?;
    Ok(dir.join("mazovia-confirm").join("credentials.sqlite3"))
}

/// Expand tilde (~) in file paths to the user's home directory
fn expand_tilde(path: &str) -> PathBuf {
    if path.starts_with("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(&path[2..]);
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(base_url: &str) -> CliArgs {
        CliArgs {
            base_url: base_url.to_string(),
            credentials_file: Some("/tmp/creds.sqlite3".to_string()),
            log_level: "warn".to_string(),
            expiry_margin: DEFAULT_MARGIN_SECS,
            connect_timeout: 30,
            request_timeout: 30,
            command: Command::Whoami,
        }
    }

    #[test]
    fn test_expand_tilde() {
        let path = expand_tilde("~/mazovia/creds.sqlite3");
        assert!(path.to_string_lossy().contains("mazovia/creds.sqlite3"));
        assert!(!path.to_string_lossy().starts_with('~'));

        let path = expand_tilde("/absolute/path");
        assert_eq!(path, PathBuf::from("/absolute/path"));

        // Just "~" without slash does not expand.
        let path = expand_tilde("~");
        assert_eq!(path, PathBuf::from("~"));
    }

    #[test]
    fn test_config_from_args() {
        let config = Config::from_args(&args(DEFAULT_BASE_URL)).unwrap();
        assert_eq!(config.expiry_margin_secs, 60);
        assert_eq!(config.credentials_file, PathBuf::from("/tmp/creds.sqlite3"));
        config.validate().unwrap();
    }

    #[test]
    fn test_invalid_base_url_is_rejected() {
        assert!(Config::from_args(&args("not a url")).is_err());

        let config = Config::from_args(&args("ftp://example.com/")).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_negative_margin_is_rejected() {
        let mut args = args(DEFAULT_BASE_URL);
        args.expiry_margin = -1;
        let config = Config::from_args(&args).unwrap();
        assert!(config.validate().is_err());
    }
}
