use crate::env::*;
use crate::error::WriterError;
use std::path::PathBuf;
use std::str::FromStr;

/// Smallest queue capacity the writer accepts.
pub const MIN_CHANNEL_BUFFER: usize = 16;

/// Rotation thresholds and backup retention.
///
/// **Fields**
/// - `rotate_enabled`: keep the outgoing file as a backup. When `false`
///   a triggered rotation truncates the active file instead.
/// - `max_lines`: rotate once the active file holds this many lines
///   (`0` = unlimited).
/// - `max_size_bytes`: rotate once the active file holds this many bytes
///   (`0` = unlimited).
/// - `rotate_daily`: rotate when a record arrives on a different calendar
///   day than the one the active file was opened on.
/// - `max_backups`: number of backup slots (`path.1 ..= path.N`, or the
///   `.NNN` suffixes of a daily backup).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RotationConfig {
    pub rotate_enabled: bool,
    pub max_lines: u64,
    pub max_size_bytes: u64,
    pub rotate_daily: bool,
    pub max_backups: u32,
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            rotate_enabled: false,
            max_lines: 0,
            max_size_bytes: 0,
            rotate_daily: false,
            max_backups: 999,
        }
    }
}

impl RotationConfig {
    pub fn validate(&self) -> Result<(), WriterError> {
        if self.rotate_enabled && self.max_backups == 0 {
            return Err(WriterError::Config(
                "max_backups must be at least 1 when backups are kept".to_string(),
            ));
        }
        Ok(())
    }
}

/// Everything the writer needs before its worker starts.
#[derive(Clone, Debug)]
pub struct WriterConfig {
    pub path: PathBuf,
    pub rotation: RotationConfig,
    pub channel_buffer: usize,
}

impl WriterConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            rotation: RotationConfig::default(),
            channel_buffer: 1024,
        }
    }

    /// Build a configuration from the `LOG_SINK_*` environment variables
    /// (see [`crate::env`]). Missing variables fall back to defaults.
    pub fn from_env() -> Result<Self, WriterError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self, WriterError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = RotationConfig::default();
        let get = |key: &str, default: String| lookup(key).unwrap_or(default);

        let path = get(LOG_SINK_FILE_PATH_ENV, "logs/app.log".to_string());
        let rotation = RotationConfig {
            rotate_enabled: parse(LOG_SINK_ROTATE_ENV, &get(LOG_SINK_ROTATE_ENV, "false".into()))?,
            max_lines: parse(LOG_SINK_MAX_LINES_ENV, &get(LOG_SINK_MAX_LINES_ENV, "0".into()))?,
            max_size_bytes: parse(LOG_SINK_MAX_SIZE_ENV, &get(LOG_SINK_MAX_SIZE_ENV, "0".into()))?,
            rotate_daily: parse(
                LOG_SINK_ROTATE_DAILY_ENV,
                &get(LOG_SINK_ROTATE_DAILY_ENV, "false".into()),
            )?,
            max_backups: parse(
                LOG_SINK_MAX_BACKUPS_ENV,
                &get(LOG_SINK_MAX_BACKUPS_ENV, defaults.max_backups.to_string()),
            )?,
        };
        let channel_buffer = parse(
            LOG_SINK_CHANNEL_BUFFER_ENV,
            &get(LOG_SINK_CHANNEL_BUFFER_ENV, "1024".into()),
        )?;

        let config = Self {
            path: PathBuf::from(path),
            rotation,
            channel_buffer,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), WriterError> {
        if self.path.as_os_str().is_empty() {
            return Err(WriterError::Config("log file path is empty".to_string()));
        }
        self.rotation.validate()
    }
}

fn parse<T: FromStr>(key: &str, raw: &str) -> Result<T, WriterError> {
    raw.trim()
        .parse()
        .map_err(|_| WriterError::Config(format!("{key}: cannot parse {raw:?}")))
}
