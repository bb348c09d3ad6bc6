//! Structured logging for world generation.
//!
//! Console output with uptime timestamps and thread names (chunk workers are
//! named `chunk-gen-N`), optional JSON file logging, and filtering driven by
//! `RUST_LOG` or the world config's `debug.log_level`.

use std::path::PathBuf;

use nebula_config::WorldGenConfig;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used when neither `RUST_LOG` nor the config names a level.
pub const DEFAULT_FILTER: &str = "info,nebula_chunk=info,nebula_terrain=info";

/// File name of the JSON log inside the log directory.
pub const LOG_FILE_NAME: &str = "worldgen.log";

/// Where and how to log.
#[derive(Clone, Debug, Default)]
pub struct LogOptions {
    /// Directory for the JSON log file.
    pub log_dir: Option<PathBuf>,
    /// Write the JSON log file. Ignored without a `log_dir`.
    pub file_logging: bool,
}

impl LogOptions {
    /// Console-only logging.
    pub fn console() -> Self {
        Self::default()
    }

    /// Options taking file logging from the config's debug section.
    pub fn from_config(log_dir: Option<PathBuf>, config: &WorldGenConfig) -> Self {
        Self {
            log_dir,
            file_logging: config.debug.log_to_file,
        }
    }
}

/// Filter directives from the config, or [`DEFAULT_FILTER`].
pub fn filter_directives(config: Option<&WorldGenConfig>) -> String {
    match config {
        Some(config) if !config.debug.log_level.trim().is_empty() => config.debug.log_level.clone(),
        _ => DEFAULT_FILTER.to_string(),
    }
}

/// Create an `EnvFilter` with the default filter string.
pub fn default_env_filter() -> EnvFilter {
    EnvFilter::new(DEFAULT_FILTER)
}

/// Initialize the global tracing subscriber.
///
/// `RUST_LOG` wins over the config's log level. Returns `false` if a
/// subscriber was already installed, in which case nothing changes.
///
/// ```no_run
/// use nebula_config::WorldGenConfig;
/// use nebula_log::{LogOptions, init_logging};
///
/// let config = WorldGenConfig::default();
/// init_logging(&LogOptions::console(), Some(&config));
/// ```
pub fn init_logging(options: &LogOptions, config: Option<&WorldGenConfig>) -> bool {
    let directives = filter_directives(config);
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&directives));

    let console_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(true)
        .with_level(true)
        .with_timer(fmt::time::uptime());

    let file_layer = options
        .log_dir
        .as_deref()
        .filter(|_| options.file_logging)
        .filter(|dir| std::fs::create_dir_all(dir).is_ok())
        .and_then(|dir| std::fs::File::create(dir.join(LOG_FILE_NAME)).ok())
        .map(|log_file| {
            fmt::layer()
                .with_writer(log_file)
                .with_ansi(false)
                .with_target(true)
                .with_timer(fmt::time::uptime())
                .json()
        });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_log_level() {
        let filter_str = format!("{}", default_env_filter());
        assert!(filter_str.contains("nebula_chunk=info"));
        assert!(filter_str.contains("info"));
    }

    #[test]
    fn test_config_level_used() {
        let mut config = WorldGenConfig::default();
        config.debug.log_level = "debug,nebula_terrain=trace".to_string();
        assert_eq!(filter_directives(Some(&config)), "debug,nebula_terrain=trace");
    }

    #[test]
    fn test_empty_config_level_falls_back() {
        let mut config = WorldGenConfig::default();
        config.debug.log_level = "  ".to_string();
        assert_eq!(filter_directives(Some(&config)), DEFAULT_FILTER);
        assert_eq!(filter_directives(None), DEFAULT_FILTER);
    }

    #[test]
    fn test_env_filter_parsing() {
        for filter_str in ["info", "debug,nebula_chunk=trace", "warn,nebula_terrain=debug", DEFAULT_FILTER] {
            assert!(EnvFilter::try_new(filter_str).is_ok(), "Failed to parse filter: {filter_str}");
        }
    }

    #[test]
    fn test_log_options_from_config() {
        let mut config = WorldGenConfig::default();
        config.debug.log_to_file = true;
        let dir = tempfile::tempdir().unwrap();
        let options = LogOptions::from_config(Some(dir.path().to_path_buf()), &config);
        assert!(options.file_logging);
        assert_eq!(options.log_dir.as_deref(), Some(dir.path()));
        assert!(!LogOptions::console().file_logging);
    }

    #[test]
    fn test_second_init_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let options = LogOptions {
            log_dir: Some(dir.path().join("logs")),
            file_logging: true,
        };
        let first = init_logging(&options, None);
        let second = init_logging(&options, None);
        assert!(!second, "a second subscriber must not be installed");
        if first {
            assert!(dir.path().join("logs").join(LOG_FILE_NAME).exists());
        }
    }
}
