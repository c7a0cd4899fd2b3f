use std::fs;
use std::path::PathBuf;
use anyhow::{Result, Context};
use chrono::Utc;
use log::{debug, info, warn, error, LevelFilter};
use fern::Dispatch;

use crate::config::LoggingConfig;

const LOG_FILE_PREFIX: &str = "menubar_";

pub struct Logger {
    log_dir: PathBuf,
    max_size_mb: u64,
}

impl Logger {
    /// Prepare the log directory and prune old files over the size budget.
    pub fn new(config: &LoggingConfig) -> Result<Self> {
        let log_dir = PathBuf::from(&config.log_dir);

        if !log_dir.exists() {
            fs::create_dir_all(&log_dir)
                .with_context(|| format!("Failed to create log directory: {:?}", log_dir))?;
        }

        let logger = Logger {
            log_dir,
            max_size_mb: config.max_log_size_mb,
        };

        if config.file_output {
            logger.cleanup_old_logs()?;
        }

        Ok(logger)
    }

    /// Install the global logger. Falls back to `env_logger` when the
    /// configured dispatch cannot be built.
    pub fn init(config: &LoggingConfig) {
        if let Err(e) = Self::setup_logging(config) {
            eprintln!("Failed to setup menubar logging: {:#}", e);
            if env_logger::try_init().is_ok() {
                error!("Falling back to basic logging due to setup error: {:#}", e);
            }
        }
    }

    pub fn setup_logging(config: &LoggingConfig) -> Result<()> {
        let log_level = Self::parse_log_level(&config.level)?;

        let mut dispatch = Dispatch::new()
            .level(log_level)
            .format(|out, message, record| {
                out.finish(format_args!(
                    "[{}] [{}] [{}] {}",
                    Utc::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                    record.level(),
                    record.target(),
                    message
                ))
            });

        if config.console {
            dispatch = dispatch.chain(std::io::stdout());
        }

        let mut log_file_path = None;
        if config.file_output {
            let path = Self::create_log_file_path(&config.log_dir)?;
            dispatch = dispatch.chain(
                fern::log_file(&path)
                    .with_context(|| format!("Failed to create log file: {:?}", path))?
            );
            log_file_path = Some(path);
        }

        dispatch.apply()
            .with_context(|| "Failed to initialize logger")?;

        if let Some(path) = log_file_path {
            info!("Logging to file: {:?}", path);
        }
        info!("Logger initialized with level: {}", config.level);
        Ok(())
    }

    fn parse_log_level(level: &str) -> Result<LevelFilter> {
        match level.to_lowercase().as_str() {
            "off" => Ok(LevelFilter::Off),
            "error" => Ok(LevelFilter::Error),
            "warn" | "warning" => Ok(LevelFilter::Warn),
            "info" => Ok(LevelFilter::Info),
            "debug" => Ok(LevelFilter::Debug),
            "trace" => Ok(LevelFilter::Trace),
            _ => Err(anyhow::anyhow!("Invalid log level: {}", level)),
        }
    }

    fn create_log_file_path(log_dir: &str) -> Result<PathBuf> {
        let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
        let filename = format!("{}{}.log", LOG_FILE_PREFIX, timestamp);
        let log_dir_path = PathBuf::from(log_dir);

        if !log_dir_path.exists() {
            fs::create_dir_all(&log_dir_path)
                .with_context(|| format!("Failed to create log directory: {:?}", log_dir_path))?;
        }

        Ok(log_dir_path.join(filename))
    }

    fn is_log_file(path: &std::path::Path) -> bool {
        path.is_file()
            && path.extension().and_then(|s| s.to_str()) == Some("log")
            && path
                .file_name()
                .and_then(|s| s.to_str())
                .unwrap_or("")
                .starts_with(LOG_FILE_PREFIX)
    }

    /// Remove the oldest log files once their total size exceeds the budget.
    pub fn cleanup_old_logs(&self) -> Result<()> {
        debug!("Cleaning up old log files in {:?}", self.log_dir);

        let mut log_files = Vec::new();
        for path in self.get_log_files()? {
            let size = fs::metadata(&path)?.len();
            log_files.push((path, size));
        }

        let max_size_bytes = self.max_size_mb * 1024 * 1024;
        let mut current_size: u64 = 0;
        let mut files_to_remove = Vec::new();

        // newest first, so the oldest files are the ones dropped
        for (path, size) in log_files {
            if current_size + size > max_size_bytes {
                files_to_remove.push(path);
            } else {
                current_size += size;
            }
        }

        for path in files_to_remove {
            match fs::remove_file(&path) {
                Ok(_) => info!("Removed old log file: {:?}", path),
                Err(e) => warn!("Failed to remove old log file {:?}: {}", path, e),
            }
        }

        Ok(())
    }

    /// Menubar log files, newest first.
    pub fn get_log_files(&self) -> Result<Vec<PathBuf>> {
        if !self.log_dir.exists() {
            return Ok(Vec::new());
        }

        let mut log_files = Vec::new();

        for entry in fs::read_dir(&self.log_dir)? {
            let path = entry?.path();
            if Self::is_log_file(&path) {
                let modified = fs::metadata(&path)
                    .and_then(|m| m.modified())
                    .unwrap_or(std::time::SystemTime::UNIX_EPOCH);
                log_files.push((path, modified));
            }
        }

        // Ties on modification time fall back to the timestamped name
        log_files.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| b.0.cmp(&a.0)));

        Ok(log_files.into_iter().map(|(path, _)| path).collect())
    }
}
