use std::{fs::OpenOptions, sync::Mutex};

use tracing_subscriber::EnvFilter;

use crate::{
    config::AppConfig,
    error::{AppError, Result},
};

/// Logs go to a file; stdout belongs to the terminal UI.
///
/// `RUST_LOG` wins over the configured level when set.
pub fn init(config: &AppConfig) -> Result<()> {
    if let Some(parent) = config.log_file.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_file)?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directives(&config.log_level)))
        .map_err(|err| AppError::Logging(err.to_string()))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init()
        .map_err(|err| AppError::Logging(err.to_string()))
}

fn default_directives(level: &str) -> String {
    format!("shamba_tui={level},engine={level}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directives_cover_both_crates() {
        let filter = default_directives("debug");
        assert_eq!(filter, "shamba_tui=debug,engine=debug");
        assert!(EnvFilter::try_new(filter).is_ok());
    }
}
