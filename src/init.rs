use crate::layer::FileLogLayer;
use crate::writer::FileWriter;
use tracing::subscriber::SetGlobalDefaultError;
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

/// Configuration of the tracing layer.
///
/// **Fields**
/// - `min_level`: least severe level written to the file.
/// - `enable_stdout`: if `true`, a `tracing_subscriber::fmt::Layer` is
///   added on top of [`FileLogLayer`] so events are also printed to the
///   console.
#[derive(Clone, Debug)]
pub struct LayerConfig {
    pub min_level: Level,
    pub enable_stdout: bool,
}

impl Default for LayerConfig {
    fn default() -> Self {
        Self {
            min_level: Level::INFO,
            enable_stdout: true,
        }
    }
}

/// Install a global `tracing` subscriber that writes events to `writer`.
///
/// **Parameters**
/// - `writer`: a started [`FileWriter`]; keep a clone to
///   [`close`](FileWriter::close) it on shutdown.
/// - `config`: [`LayerConfig`] controlling level and console output.
///
/// **Returns**
/// - `Err(..)` if a global subscriber was already installed.
pub fn init_tracing_with_config(
    writer: FileWriter,
    config: LayerConfig,
) -> Result<(), SetGlobalDefaultError> {
    let layer = FileLogLayer::new(writer, config.min_level);

    // The two branches build different subscriber types.
    if config.enable_stdout {
        let fmt_layer = tracing_subscriber::fmt::layer();
        let subscriber = Registry::default().with(layer).with(fmt_layer);
        tracing::subscriber::set_global_default(subscriber)
    } else {
        let subscriber = Registry::default().with(layer);
        tracing::subscriber::set_global_default(subscriber)
    }
}

/// Initialize tracing with [`LayerConfig::default`].
pub fn init_tracing(writer: FileWriter) -> Result<(), SetGlobalDefaultError> {
    init_tracing_with_config(writer, LayerConfig::default())
}
