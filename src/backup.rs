use crate::config::RotationConfig;
use crate::error::WriterError;
use chrono::NaiveDate;
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};

/// What has to happen to the outgoing file during a rotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackupPlan {
    /// Backups are off: the active file is reopened truncated.
    Discard,
    /// There is no file on disk to keep; just open the path again.
    Reopen,
    /// Move the active file to `destination`. `evict` (the oldest
    /// sequential slot) is removed first, then every `(from, to)` in
    /// `shifts` is renamed in order.
    Keep {
        evict: Option<PathBuf>,
        shifts: Vec<(PathBuf, PathBuf)>,
        destination: PathBuf,
    },
}

/// Work out where the active file at `path` goes.
///
/// `day_changed` selects the dated scheme (`path.YYYY-MM-DD[.NNN]`, named
/// after the day before `today`); otherwise slots `path.1 ..= path.N` are
/// shifted up by one. `exists` is consulted for every candidate so the
/// plan never targets an occupied name, apart from the oldest sequential
/// slot which is evicted on purpose. A candidate whose existence cannot be
/// determined fails the plan with [`WriterError::Lookup`].
pub fn plan_backup<F>(
    path: &Path,
    config: &RotationConfig,
    day_changed: bool,
    today: NaiveDate,
    exists: F,
) -> Result<BackupPlan, WriterError>
where
    F: Fn(&Path) -> io::Result<bool>,
{
    let taken = |candidate: &Path| {
        exists(candidate).map_err(|source| WriterError::Lookup {
            path: candidate.to_path_buf(),
            source,
        })
    };

    if !config.rotate_enabled {
        return Ok(BackupPlan::Discard);
    }
    if !taken(path)? {
        return Ok(BackupPlan::Reopen);
    }

    if day_changed {
        let yesterday = today.pred_opt().unwrap_or(today);
        let destination = dated_slot(path, yesterday, &taken, config.max_backups)?
            .ok_or_else(|| WriterError::NoFreeBackupSlot {
                path: path.to_path_buf(),
            })?;
        return Ok(BackupPlan::Keep {
            evict: None,
            shifts: Vec::new(),
            destination,
        });
    }

    let max = config.max_backups;
    let oldest = numbered(path, max);
    let evict = if taken(&oldest)? { Some(oldest) } else { None };

    let mut shifts = Vec::new();
    for num in (1..max).rev() {
        let from = numbered(path, num);
        if taken(&from)? {
            shifts.push((from, numbered(path, num + 1)));
        }
    }

    Ok(BackupPlan::Keep {
        evict,
        shifts,
        destination: numbered(path, 1),
    })
}

fn dated_slot<F>(
    path: &Path,
    day: NaiveDate,
    taken: &F,
    max_backups: u32,
) -> Result<Option<PathBuf>, WriterError>
where
    F: Fn(&Path) -> Result<bool, WriterError>,
{
    let date = day.format("%Y-%m-%d").to_string();
    let base = with_suffix(path, &date);
    if !taken(&base)? {
        return Ok(Some(base));
    }
    for num in 1..=max_backups {
        let candidate = with_suffix(path, &format!("{date}.{num:03}"));
        if !taken(&candidate)? {
            return Ok(Some(candidate));
        }
    }
    Ok(None)
}

/// `path.N`
pub fn numbered(path: &Path, num: u32) -> PathBuf {
    with_suffix(path, &num.to_string())
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".");
    name.push(suffix);
    PathBuf::from(name)
}
