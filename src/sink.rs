use crate::error::WriterError;
use tokio::sync::mpsc;

/// Side channel for failures that happen inside the writer worker.
///
/// The worker has no caller to return errors to, so anything that stops it
/// (a failed rotation, a failed write) is handed to the sink injected at
/// construction time before the worker exits.
///
/// **Parameters**
/// - `error`: the failure that terminated (or is about to terminate) the
///   worker.
///
/// Implementations are called from the worker task and must not block for
/// long.
pub trait ErrorSink: Send + Sync {
    fn report(&self, error: &WriterError);
}

/// Default sink: emits the error through `tracing::error!`.
#[derive(Clone, Debug, Default)]
pub struct TracingErrorSink;

impl ErrorSink for TracingErrorSink {
    fn report(&self, error: &WriterError) {
        tracing::error!(error = %error, "log writer failed");
    }
}

impl<F> ErrorSink for F
where
    F: Fn(&WriterError) + Send + Sync,
{
    fn report(&self, error: &WriterError) {
        self(error)
    }
}

/// Forwards rendered errors to a channel, e.g. to surface them in a
/// supervisor task.
#[derive(Clone, Debug)]
pub struct ChannelErrorSink(pub mpsc::UnboundedSender<String>);

impl ErrorSink for ChannelErrorSink {
    fn report(&self, error: &WriterError) {
        // Receiver gone means nobody is listening any more.
        let _ = self.0.send(error.to_string());
    }
}
