use rotating_log_sink::layer::FileLogLayer;
use rotating_log_sink::FileWriter;
use std::sync::atomic::Ordering;
use tempfile::tempdir;
use tracing::{debug, error, info, Level};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

#[tokio::test]
async fn events_become_json_lines() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("events.log");
    let writer = FileWriter::builder(&path, true).build().await.expect("build");

    let layer = FileLogLayer::new(writer.clone(), Level::INFO);
    let total = layer.total_events.clone();
    let enqueued = layer.enqueued_events.clone();
    let dropped = layer.dropped_events.clone();

    let subscriber = Registry::default().with(layer);
    tracing::subscriber::with_default(subscriber, || {
        info!(username = "hhy", channel = 1u64, "user registered");
        debug!("too chatty, filtered out");
        error!(code = -7i64, ok = false, "payment failed");
    });

    writer.close().await.expect("close");

    assert_eq!(total.load(Ordering::Relaxed), 3);
    assert_eq!(enqueued.load(Ordering::Relaxed), 2);
    assert_eq!(dropped.load(Ordering::Relaxed), 0);

    let content = std::fs::read_to_string(&path).expect("read");
    let lines: Vec<serde_json::Value> = content
        .lines()
        .map(|line| serde_json::from_str(line).expect("json line"))
        .collect();
    assert_eq!(lines.len(), 2);

    assert_eq!(lines[0]["message"], "user registered");
    assert_eq!(lines[0]["level"], "INFO");
    assert_eq!(lines[0]["username"], "hhy");
    assert_eq!(lines[0]["channel"], 1);
    assert!(lines[0]["timestamp"].is_string());

    assert_eq!(lines[1]["message"], "payment failed");
    assert_eq!(lines[1]["level"], "ERROR");
    assert_eq!(lines[1]["code"], -7);
    assert_eq!(lines[1]["ok"], false);
}

#[tokio::test]
async fn events_after_close_are_counted_as_dropped() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("events.log");
    let writer = FileWriter::builder(&path, false).build().await.expect("build");
    writer.close().await.expect("close");

    let layer = FileLogLayer::new(writer, Level::TRACE);
    let dropped = layer.dropped_events.clone();
    let subscriber = Registry::default().with(layer);
    tracing::subscriber::with_default(subscriber, || {
        info!("nobody is listening");
    });

    assert_eq!(dropped.load(Ordering::Relaxed), 1);
}

#[tokio::test]
async fn metadata_keys_win_over_event_fields() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("events.log");
    let writer = FileWriter::builder(&path, true).build().await.expect("build");

    let subscriber = Registry::default().with(FileLogLayer::new(writer.clone(), Level::INFO));
    tracing::subscriber::with_default(subscriber, || {
        info!(level = "custom", user = "hhy", "shadowed");
    });
    writer.close().await.expect("close");

    let content = std::fs::read_to_string(&path).expect("read");
    let line: serde_json::Value =
        serde_json::from_str(content.lines().next().expect("one line")).expect("json line");
    assert_eq!(line["level"], "INFO");
    assert_eq!(line["target"], "layer");
    assert_eq!(line["user"], "hhy");
    assert_eq!(line["message"], "shadowed");
}
