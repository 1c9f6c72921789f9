use crate::config::{WriterConfig, MIN_CHANNEL_BUFFER};
use crate::error::WriterError;
use crate::file::{ensure_parent_dir, ActiveFile};
use crate::policy::{Clock, SystemClock};
use crate::record::LogRecord;
use crate::sink::{ErrorSink, TracingErrorSink};
use crate::worker::{Event, Worker, WriterStatus};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;

/// Handle to an asynchronous, rotating JSON-lines file writer.
///
/// Records are handed to a bounded queue and written, in the order they
/// were accepted, by a single background task that owns the file. When the
/// queue is full [`write`](Self::write) waits for space; use
/// [`try_write`](Self::try_write) to drop the record instead.
///
/// The handle is cheap to clone. The worker stops after [`close`](Self::close)
/// or once every clone has been dropped, writing everything accepted before.
#[derive(Clone)]
pub struct FileWriter {
    sender: mpsc::Sender<Event>,
    status: watch::Receiver<WriterStatus>,
    dropped: Arc<AtomicU64>,
    worker: Arc<Mutex<Option<JoinHandle<()>>>>,
    path: Arc<PathBuf>,
}

impl FileWriter {
    /// Start configuring a writer for `path`. `rotate` controls whether
    /// rotated-out files are kept as backups.
    pub fn builder(path: impl Into<PathBuf>, rotate: bool) -> FileWriterBuilder {
        let mut config = WriterConfig::new(path);
        config.rotation.rotate_enabled = rotate;
        FileWriterBuilder::from_config(config)
    }

    /// Start from the `LOG_SINK_*` environment variables
    /// (see [`WriterConfig::from_env`]).
    pub fn from_env() -> Result<FileWriterBuilder, WriterError> {
        Ok(FileWriterBuilder::from_config(WriterConfig::from_env()?))
    }

    /// Path of the active file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn status(&self) -> WriterStatus {
        self.status.borrow().clone()
    }

    /// Records rejected by [`try_write`](Self::try_write) because the queue
    /// was full.
    pub fn dropped_records(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Enqueue a record, waiting for space if the queue is full.
    pub async fn write(&self, record: LogRecord) -> Result<(), WriterError> {
        self.ensure_running()?;
        self.sender
            .send(Event::Record(record))
            .await
            .map_err(|_| self.stopped())
    }

    /// Enqueue a record without waiting. A full queue drops the record,
    /// bumps [`dropped_records`](Self::dropped_records) and returns
    /// [`WriterError::QueueFull`].
    pub fn try_write(&self, record: LogRecord) -> Result<(), WriterError> {
        self.ensure_running()?;
        match self.sender.try_send(Event::Record(record)) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                Err(WriterError::QueueFull)
            }
            Err(TrySendError::Closed(_)) => Err(self.stopped()),
        }
    }

    /// Enqueue from a plain thread, blocking it while the queue is full.
    ///
    /// Panics if called from within an async runtime, like
    /// [`mpsc::Sender::blocking_send`].
    pub fn blocking_write(&self, record: LogRecord) -> Result<(), WriterError> {
        self.ensure_running()?;
        self.sender
            .blocking_send(Event::Record(record))
            .map_err(|_| self.stopped())
    }

    /// Ask the worker to rotate before it handles the next queued record.
    pub async fn rotate(&self) -> Result<(), WriterError> {
        self.ensure_running()?;
        self.sender
            .send(Event::Rotate)
            .await
            .map_err(|_| self.stopped())
    }

    /// Stop accepting records, wait until everything already queued is
    /// written and the file is closed.
    ///
    /// Calling it again (from any clone) returns the same outcome.
    pub async fn close(&self) -> Result<(), WriterError> {
        // A failed send means the worker is already gone.
        let _ = self.sender.send(Event::Close).await;

        let mut worker = self.worker.lock().await;
        if let Some(handle) = worker.take() {
            if let Err(err) = handle.await {
                return Err(WriterError::WorkerStopped(format!("worker task ended abnormally: {err}")));
            }
        }

        match self.status() {
            WriterStatus::Failed(message) => Err(WriterError::WorkerStopped(message)),
            _ => Ok(()),
        }
    }

    fn ensure_running(&self) -> Result<(), WriterError> {
        match &*self.status.borrow() {
            WriterStatus::Running => Ok(()),
            WriterStatus::Closed => Err(WriterError::Closed),
            WriterStatus::Failed(message) => Err(WriterError::WorkerStopped(message.clone())),
        }
    }

    fn stopped(&self) -> WriterError {
        match &*self.status.borrow() {
            WriterStatus::Failed(message) => WriterError::WorkerStopped(message.clone()),
            _ => WriterError::Closed,
        }
    }
}

/// Chainable configuration for a [`FileWriter`].
///
/// All settings are fixed once [`build`](Self::build) starts the worker;
/// the running writer exposes no way to change them.
pub struct FileWriterBuilder {
    config: WriterConfig,
    errors: Arc<dyn ErrorSink>,
    clock: Arc<dyn Clock>,
}

impl FileWriterBuilder {
    pub fn from_config(config: WriterConfig) -> Self {
        Self {
            config,
            errors: Arc::new(TracingErrorSink),
            clock: Arc::new(SystemClock),
        }
    }

    /// Rotate after `max_lines` lines (`0` = unlimited).
    pub fn max_lines(mut self, max_lines: u64) -> Self {
        self.config.rotation.max_lines = max_lines;
        self
    }

    /// Rotate after `max_size_bytes` bytes (`0` = unlimited).
    pub fn max_size(mut self, max_size_bytes: u64) -> Self {
        self.config.rotation.max_size_bytes = max_size_bytes;
        self
    }

    pub fn rotate_daily(mut self, daily: bool) -> Self {
        self.config.rotation.rotate_daily = daily;
        self
    }

    pub fn max_backups(mut self, max_backups: u32) -> Self {
        self.config.rotation.max_backups = max_backups;
        self
    }

    /// Keep rotated files (`true`) or truncate on rotation (`false`).
    pub fn rotate(mut self, rotate: bool) -> Self {
        self.config.rotation.rotate_enabled = rotate;
        self
    }

    /// Queue capacity; values below 16 are raised to 16.
    pub fn channel_buffer(mut self, capacity: usize) -> Self {
        self.config.channel_buffer = capacity;
        self
    }

    /// Where worker failures are reported. Defaults to [`TracingErrorSink`].
    pub fn error_sink(mut self, sink: impl ErrorSink + 'static) -> Self {
        self.errors = Arc::new(sink);
        self
    }

    /// Source of the current day. Defaults to [`SystemClock`].
    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Create the log directory if needed, open the active file and start
    /// the worker on the current Tokio runtime.
    ///
    /// **Returns**
    /// - `Ok(FileWriter)` once the file is open and the worker is running.
    /// - `Err(..)` for invalid settings or when the file cannot be opened;
    ///   no worker is started in that case.
    pub async fn build(self) -> Result<FileWriter, WriterError> {
        let FileWriterBuilder {
            config,
            errors,
            clock,
        } = self;
        config.validate()?;

        ensure_parent_dir(&config.path).await?;
        let file = ActiveFile::open(config.path.clone(), clock.today()).await?;

        let buffer = config.channel_buffer.max(MIN_CHANNEL_BUFFER);
        let (tx, rx) = mpsc::channel::<Event>(buffer);
        let (status_tx, status_rx) = watch::channel(WriterStatus::Running);

        let worker = Worker {
            file,
            config: config.rotation,
            clock,
            errors,
            status: status_tx,
        };
        let handle = tokio::spawn(worker.run(rx));

        Ok(FileWriter {
            sender: tx,
            status: status_rx,
            dropped: Arc::new(AtomicU64::new(0)),
            worker: Arc::new(Mutex::new(Some(handle))),
            path: Arc::new(config.path),
        })
    }
}
