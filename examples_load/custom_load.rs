use std::time::Instant;
use tracing::{error, Level};

use rotating_log_sink::init::{init_tracing_with_config, LayerConfig};
use rotating_log_sink::{FileWriter, LogRecord};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let writer = FileWriter::builder("logs/custom_load.log", true)
        .max_size(4 * 1024 * 1024)
        .max_lines(50_000)
        .rotate_daily(true)
        .max_backups(10)
        .channel_buffer(50_000)
        .build()
        .await?;

    let layer_config = LayerConfig {
        min_level: Level::ERROR,
        enable_stdout: false,
    };
    init_tracing_with_config(writer.clone(), layer_config)?;

    let n: u64 = 100_000;
    let start = Instant::now();

    for i in 0..n {
        error!(iteration = i, "custom load test error");
    }
    // Records can also be written directly, waiting for queue space.
    for i in 0..n {
        let record = LogRecord::new(Level::INFO, "custom_load")
            .with_field("iteration", i)
            .with_field("kind", "direct");
        writer.write(record).await?;
    }

    let elapsed = start.elapsed();
    println!("custom config: sent {} records in {:?} (~{:.0} rec/s)",
        2 * n,
        elapsed,
        (2 * n) as f64 / elapsed.as_secs_f64()
    );

    writer.close().await?;
    Ok(())
}
