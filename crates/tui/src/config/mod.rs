use std::{path::PathBuf, time::Duration};

use chrono_tz::Tz;
use clap::Parser;
use engine::wallet::OtpPolicy;
use serde::Deserialize;

use crate::error::{AppError, Result};

const DEFAULT_CONFIG_PATH: &str = "config/shamba_tui.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub base_url: String,
    /// JSON file holding the session and theme between runs.
    pub state_path: PathBuf,
    pub log_file: PathBuf,
    pub log_level: String,
    pub timezone: String,
    pub page_size: u32,
    pub search_debounce_ms: u64,
    pub request_timeout_secs: u64,
    /// Also ask for an OTP before transfers and payments.
    pub wallet_otp_for_all: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000/api".to_string(),
            state_path: PathBuf::from("config/shamba_state.json"),
            log_file: PathBuf::from("shamba_tui.log"),
            log_level: "info".to_string(),
            timezone: "Africa/Nairobi".to_string(),
            page_size: 10,
            search_debounce_ms: 500,
            request_timeout_secs: 15,
            wallet_otp_for_all: false,
        }
    }
}

impl AppConfig {
    pub fn timezone(&self) -> Result<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|_| AppError::Setting(format!("unknown timezone '{}'", self.timezone)))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }

    pub fn otp_policy(&self) -> OtpPolicy {
        OtpPolicy {
            gate_all: self.wallet_otp_for_all,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "shamba_tui", disable_version_flag = true)]
struct Args {
    /// Optional config file path (TOML).
    #[arg(long, env = "SHAMBA_TUI_CONFIG")]
    config: Option<String>,
    /// Override backend base URL (e.g. http://127.0.0.1:8000/api).
    #[arg(long)]
    base_url: Option<String>,
    /// Override the local state file.
    #[arg(long)]
    state_path: Option<PathBuf>,
    /// Override the log file.
    #[arg(long)]
    log_file: Option<PathBuf>,
    /// Override the log level (trace, debug, info, warn, error).
    #[arg(long)]
    log_level: Option<String>,
    /// Override timezone (IANA name).
    #[arg(long)]
    timezone: Option<String>,
}

pub fn load() -> Result<AppConfig> {
    let args = Args::parse();

    let config_path = args.config.as_deref().unwrap_or(DEFAULT_CONFIG_PATH);
    let mut settings = from_sources(config_path)?;

    if let Some(base_url) = args.base_url {
        settings.base_url = base_url;
    }
    if let Some(state_path) = args.state_path {
        settings.state_path = state_path;
    }
    if let Some(log_file) = args.log_file {
        settings.log_file = log_file;
    }
    if let Some(log_level) = args.log_level {
        settings.log_level = log_level;
    }
    if let Some(timezone) = args.timezone {
        settings.timezone = timezone;
    }

    settings.timezone()?;
    Ok(settings)
}

fn from_sources(config_path: &str) -> Result<AppConfig> {
    let builder = config::Config::builder()
        .add_source(config::File::with_name(config_path).required(false))
        .add_source(config::Environment::with_prefix("SHAMBA_TUI"));
    Ok(builder.build()?.try_deserialize()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent");
        let settings = from_sources(path.to_str().unwrap()).unwrap();
        assert_eq!(settings.page_size, 10);
        assert_eq!(settings.search_debounce(), Duration::from_millis(500));
        assert!(!settings.otp_policy().gate_all);
    }

    #[test]
    fn file_values_override_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tui.toml");
        std::fs::write(
            &path,
            "base_url = \"https://shamba.example/api\"\npage_size = 25\nwallet_otp_for_all = true\n",
        )
        .unwrap();
        let settings = from_sources(path.to_str().unwrap()).unwrap();
        assert_eq!(settings.base_url, "https://shamba.example/api");
        assert_eq!(settings.page_size, 25);
        assert!(settings.otp_policy().gate_all);
        assert_eq!(settings.timezone, "Africa/Nairobi");
    }

    #[test]
    fn unknown_timezone_is_rejected() {
        let settings = AppConfig {
            timezone: "Mars/Olympus".to_string(),
            ..AppConfig::default()
        };
        assert!(settings.timezone().is_err());
        assert!(AppConfig::default().timezone().is_ok());
    }
}
