use crate::backup::{plan_backup, BackupPlan};
use crate::config::RotationConfig;
use crate::error::WriterError;
use crate::policy::{self, FileCounters};
use chrono::NaiveDate;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs::{self, File, OpenOptions};
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::debug;

/// Create the parent directory of `path` (recursively) if it is missing.
pub async fn ensure_parent_dir(path: &Path) -> Result<(), WriterError> {
    let Some(dir) = path.parent() else {
        return Ok(());
    };
    if dir.as_os_str().is_empty() || fs::try_exists(dir).await.unwrap_or(false) {
        return Ok(());
    }
    fs::create_dir_all(dir)
        .await
        .map_err(|source| WriterError::CreateDir {
            path: dir.to_path_buf(),
            source,
        })?;
    debug!(dir = %dir.display(), "created log directory");
    Ok(())
}

/// lstat-style existence check; a dangling symlink counts as taken. Only
/// `NotFound` means free, any other failure is returned.
pub fn path_taken(path: &Path) -> io::Result<bool> {
    match std::fs::symlink_metadata(path) {
        Ok(_) => Ok(true),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(err) => Err(err),
    }
}

async fn open_append(path: &Path) -> Result<File, WriterError> {
    OpenOptions::new()
        .append(true)
        .create(true)
        .open(path)
        .await
        .map_err(|source| WriterError::Open {
            path: path.to_path_buf(),
            source,
        })
}

async fn open_truncate(path: &Path) -> Result<File, WriterError> {
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
        .await
        .map_err(|source| WriterError::Open {
            path: path.to_path_buf(),
            source,
        })
}

async fn rename(from: &Path, to: &Path) -> Result<(), WriterError> {
    fs::rename(from, to)
        .await
        .map_err(|source| WriterError::Rename {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
            source,
        })
}

/// The file currently being appended to, together with its counters.
///
/// Owned by the writer worker; nothing else holds the handle.
#[derive(Debug)]
pub struct ActiveFile {
    path: PathBuf,
    writer: Option<BufWriter<File>>,
    counters: FileCounters,
}

impl ActiveFile {
    /// Open (or create) `path` for appending. Existing content is kept and
    /// counters start at zero.
    pub async fn open(path: PathBuf, today: NaiveDate) -> Result<Self, WriterError> {
        let file = open_append(&path).await?;
        debug!(path = %path.display(), "opened log file");
        Ok(Self {
            path,
            writer: Some(BufWriter::new(file)),
            counters: FileCounters::fresh(today),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn counters(&self) -> &FileCounters {
        &self.counters
    }

    /// Append `line` followed by `\n` and account for it.
    pub async fn append_line(&mut self, line: &str) -> Result<(), WriterError> {
        let path = &self.path;
        let writer = self.writer.as_mut().ok_or_else(|| WriterError::Write {
            path: path.clone(),
            source: std::io::Error::new(std::io::ErrorKind::NotConnected, "log file is not open"),
        })?;

        let write_err = |source: std::io::Error| WriterError::Write {
            path: path.clone(),
            source,
        };
        writer.write_all(line.as_bytes()).await.map_err(write_err)?;
        writer.write_all(b"\n").await.map_err(write_err)?;

        self.counters.lines += 1;
        self.counters.bytes += line.len() as u64 + 1;
        Ok(())
    }

    /// Hand buffered bytes to the operating system.
    pub async fn flush(&mut self) -> Result<(), WriterError> {
        if let Some(writer) = self.writer.as_mut() {
            writer.flush().await.map_err(|source| WriterError::Write {
                path: self.path.clone(),
                source,
            })?;
        }
        Ok(())
    }

    /// Flush, fsync and release the handle. Safe to call more than once.
    pub async fn close(&mut self) -> Result<(), WriterError> {
        let Some(mut writer) = self.writer.take() else {
            return Ok(());
        };
        let close_err = |source: std::io::Error| WriterError::Write {
            path: self.path.clone(),
            source,
        };
        writer.flush().await.map_err(close_err)?;
        writer.into_inner().sync_all().await.map_err(close_err)?;
        Ok(())
    }

    /// Move the current file out of the way according to `config` and
    /// open a fresh one dated `today`.
    ///
    /// The backup destination is decided before anything on disk changes,
    /// so a "no free slot" failure leaves the active file as it was. If
    /// the final rename fails the old path is reopened for appending so a
    /// handle is still held.
    pub async fn rotate(
        &mut self,
        config: &RotationConfig,
        today: NaiveDate,
    ) -> Result<Option<PathBuf>, WriterError> {
        let day_changed = policy::day_changed(&self.counters, today, config);
        let plan = {
            let path = self.path.clone();
            let config = config.clone();
            // Candidate lookups are plain lstat calls; keep them off the
            // runtime threads.
            tokio::task::spawn_blocking(move || {
                plan_backup(&path, &config, day_changed, today, path_taken)
            })
            .await
            .map_err(|err| WriterError::Lookup {
                path: self.path.clone(),
                source: io::Error::other(err),
            })??
        };
        self.flush().await?;

        let mut backup = None;
        let file = match plan {
            BackupPlan::Discard => {
                self.close().await?;
                open_truncate(&self.path).await?
            }
            BackupPlan::Reopen => {
                self.close().await?;
                open_append(&self.path).await?
            }
            BackupPlan::Keep {
                evict,
                shifts,
                destination,
            } => {
                if let Some(oldest) = evict {
                    fs::remove_file(&oldest)
                        .await
                        .map_err(|source| WriterError::Remove {
                            path: oldest.clone(),
                            source,
                        })?;
                    debug!(backup = %oldest.display(), "discarded oldest backup");
                }
                for (from, to) in &shifts {
                    rename(from, to).await?;
                    debug!(from = %from.display(), to = %to.display(), "shifted backup");
                }

                self.move_to(&destination).await?;
                backup = Some(destination);
                open_append(&self.path).await?
            }
        };

        self.writer = Some(BufWriter::new(file));
        self.counters = FileCounters::fresh(today);
        Ok(backup)
    }

    /// Close the active file and rename it to `destination`. If the rename
    /// fails the active path is reopened for appending (counters untouched)
    /// before the error is returned.
    async fn move_to(&mut self, destination: &Path) -> Result<(), WriterError> {
        self.close().await?;
        if let Err(err) = rename(&self.path, destination).await {
            if let Ok(file) = open_append(&self.path).await {
                self.writer = Some(BufWriter::new(file));
            }
            return Err(err);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 10).expect("valid date")
    }

    #[tokio::test]
    async fn failed_rename_reopens_the_active_file() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("app.log");
        let mut active = ActiveFile::open(path.clone(), day()).await.expect("open");
        active.append_line("{\"seq\":0}").await.expect("append");

        let unreachable = dir.path().join("missing").join("app.log.1");
        let err = active.move_to(&unreachable).await.expect_err("rename into missing dir");
        assert!(matches!(err, WriterError::Rename { .. }));

        // Handle is back and the counters still describe the old content.
        active.append_line("{\"seq\":1}").await.expect("append after failure");
        assert_eq!(active.counters().lines, 2);
        active.close().await.expect("close");

        let content = std::fs::read_to_string(&path).expect("read");
        assert_eq!(content, "{\"seq\":0}\n{\"seq\":1}\n");
        assert!(!unreachable.exists());
    }

    #[test]
    fn missing_path_is_free_and_existing_path_is_taken() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("app.log");
        assert!(!path_taken(&path).expect("lookup"));
        std::fs::write(&path, "").expect("create");
        assert!(path_taken(&path).expect("lookup"));
    }

    #[test]
    fn overlong_name_is_an_error_not_a_free_slot() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("x".repeat(300));
        let err = path_taken(&path).expect_err("name too long");
        assert_ne!(err.kind(), io::ErrorKind::NotFound);
    }
}
