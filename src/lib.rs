pub mod backup;
pub mod config;
pub mod env;
pub mod error;
pub mod file;
pub mod init;
pub mod layer;
pub mod policy;
pub mod record;
pub mod sink;
mod worker;
pub mod writer;

pub use config::{RotationConfig, WriterConfig};
pub use error::WriterError;
pub use record::LogRecord;
pub use worker::WriterStatus;
pub use writer::{FileWriter, FileWriterBuilder};
