use std::time::Instant;
use tracing::error;

use rotating_log_sink::init::init_tracing;
use rotating_log_sink::FileWriter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let writer = FileWriter::builder("logs/default_load.log", true)
        .build()
        .await?;
    init_tracing(writer.clone())?;

    let n: u64 = 100_000;
    let start = Instant::now();

    for i in 0..n {
        error!(iteration = i, "default load test error");
    }

    let elapsed = start.elapsed();
    println!("default config: sent {} events in {:?} (~{:.0} ev/s)",
        n,
        elapsed,
        n as f64 / elapsed.as_secs_f64()
    );

    // Drains whatever is still queued.
    writer.close().await?;
    println!("dropped while the queue was full: {}", writer.dropped_records());
    Ok(())
}
