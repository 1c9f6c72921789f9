use crate::config::RotationConfig;
use crate::error::WriterError;
use crate::file::ActiveFile;
use crate::policy::{rotation_due, Clock, RotationTrigger};
use crate::record::LogRecord;
use crate::sink::ErrorSink;
use chrono::NaiveDate;
use std::sync::Arc;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

/// Everything that travels through the record queue. Rotation requests
/// share the queue with records so they keep their place in line.
#[derive(Debug)]
pub(crate) enum Event {
    Record(LogRecord),
    Rotate,
    Close,
}

/// Lifecycle of the writer as seen from the outside.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WriterStatus {
    Running,
    Closed,
    /// The worker hit a fatal error; the message is the rendered error.
    Failed(String),
}

/// The single owner of the active file.
pub(crate) struct Worker {
    pub(crate) file: ActiveFile,
    pub(crate) config: RotationConfig,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) errors: Arc<dyn ErrorSink>,
    pub(crate) status: watch::Sender<WriterStatus>,
}

impl Worker {
    /// Process events until the queue is closed (or every sender is gone)
    /// or a fatal error occurs. The file is closed on every exit path.
    pub(crate) async fn run(mut self, mut rx: mpsc::Receiver<Event>) {
        let outcome = self.process(&mut rx).await;
        let closed = self.file.close().await;

        match outcome.and(closed) {
            Ok(()) => {
                debug!(path = %self.file.path().display(), "log writer closed");
                self.status.send_replace(WriterStatus::Closed);
            }
            Err(err) => {
                self.errors.report(&err);
                self.status.send_replace(WriterStatus::Failed(err.to_string()));

                rx.close();
                let mut lost = 0usize;
                while let Ok(event) = rx.try_recv() {
                    if matches!(event, Event::Record(_)) {
                        lost += 1;
                    }
                }
                if lost > 0 {
                    warn!(lost, "discarded queued log records after writer failure");
                }
            }
        }
    }

    async fn process(&mut self, rx: &mut mpsc::Receiver<Event>) -> Result<(), WriterError> {
        loop {
            let event = match rx.try_recv() {
                Ok(event) => event,
                Err(TryRecvError::Empty) => {
                    // Queue drained for now: push what we have to the OS
                    // before parking.
                    self.file.flush().await?;
                    match rx.recv().await {
                        Some(event) => event,
                        None => return Ok(()),
                    }
                }
                Err(TryRecvError::Disconnected) => return Ok(()),
            };

            match event {
                Event::Record(record) => self.write_record(&record).await?,
                Event::Rotate => {
                    let today = self.clock.today();
                    self.rotate(RotationTrigger::Requested, today).await?;
                }
                // Already queued events are still delivered after this.
                Event::Close => rx.close(),
            }
        }
    }

    async fn write_record(&mut self, record: &LogRecord) -> Result<(), WriterError> {
        let today = self.clock.today();
        if let Some(trigger) = rotation_due(self.file.counters(), today, &self.config) {
            self.rotate(trigger, today).await?;
        }

        let line = record.to_json_line().map_err(|source| WriterError::Serialize {
            path: self.file.path().to_path_buf(),
            source,
        })?;
        self.file.append_line(&line).await
    }

    async fn rotate(&mut self, trigger: RotationTrigger, today: NaiveDate) -> Result<(), WriterError> {
        let counters = *self.file.counters();
        let backup = self.file.rotate(&self.config, today).await?;
        info!(
            path = %self.file.path().display(),
            %trigger,
            lines = counters.lines,
            bytes = counters.bytes,
            backup = ?backup,
            "rotated log file"
        );
        Ok(())
    }
}
