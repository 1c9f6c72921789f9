/// Environment variable names used by this crate for convenient
/// configuration of the file writer from services.
///
/// These are purely helpers; the writer itself never reads the
/// environment unless [`WriterConfig::from_env`](crate::config::WriterConfig::from_env)
/// is called.

/// Path of the active log file, e.g. `logs/app.log`.
pub const LOG_SINK_FILE_PATH_ENV: &str = "LOG_SINK_FILE_PATH";

/// Keep rotated files as backups (`true`/`false`).
pub const LOG_SINK_ROTATE_ENV: &str = "LOG_SINK_ROTATE";

/// Rotate after this many lines, `0` disables the trigger.
pub const LOG_SINK_MAX_LINES_ENV: &str = "LOG_SINK_MAX_LINES";

/// Rotate after this many bytes, `0` disables the trigger.
pub const LOG_SINK_MAX_SIZE_ENV: &str = "LOG_SINK_MAX_SIZE";

/// Rotate when the calendar day changes (`true`/`false`).
pub const LOG_SINK_ROTATE_DAILY_ENV: &str = "LOG_SINK_ROTATE_DAILY";

/// Number of backup slots kept.
pub const LOG_SINK_MAX_BACKUPS_ENV: &str = "LOG_SINK_MAX_BACKUPS";

/// Capacity of the record queue.
pub const LOG_SINK_CHANNEL_BUFFER_ENV: &str = "LOG_SINK_CHANNEL_BUFFER";
