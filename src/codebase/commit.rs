//! Atomic application of a change plan to disk.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::codebase::types::{CommitSummary, FileChange};
use crate::error::{ConsolidateError, Result};

const TMP_SUFFIX: &str = ".barrel-fold.tmp";
const BACKUP_SUFFIX: &str = ".barrel-fold.bak";

/// A step already applied under the root, undone in reverse on failure.
#[derive(Debug)]
enum Applied {
    /// `dest` did not exist before
    Created(PathBuf),
    /// The previous `dest` is parked at `backup`
    Displaced { dest: PathBuf, backup: PathBuf },
}

/// Writes `changes` below `root`.
///
/// New contents go to temporary siblings first; nothing under `root` is
/// replaced until every temporary file is written. Replaced and removed files
/// are parked next to themselves until the whole plan is applied, so a
/// failure at any point puts the tree back as it was.
pub fn write_changes(root: &Path, changes: &[FileChange]) -> Result<CommitSummary> {
    let mut staged: Vec<(PathBuf, PathBuf)> = Vec::new();

    for change in changes {
        let Some(contents) = change.contents() else {
            continue;
        };
        let dest = root.join(change.path());
        let tmp = sibling(&dest, TMP_SUFFIX);
        if let Err(e) = stage(&tmp, contents) {
            let _ = fs::remove_file(&tmp);
            discard(&staged);
            return Err(ConsolidateError::Commit(format!(
                "failed to stage {}: {}",
                change.path(),
                e
            )));
        }
        debug!("Staged {}", tmp.display());
        staged.push((tmp, dest));
    }

    let mut applied: Vec<Applied> = Vec::new();
    for (idx, (tmp, dest)) in staged.iter().enumerate() {
        if let Err(e) = move_into_place(tmp, dest, &mut applied) {
            discard(&staged[idx..]);
            rollback(applied);
            return Err(ConsolidateError::Commit(format!(
                "failed to move {} into place: {}",
                dest.display(),
                e
            )));
        }
    }

    for change in changes {
        if let FileChange::Remove { path } = change {
            let dest = root.join(path);
            let backup = sibling(&dest, BACKUP_SUFFIX);
            match fs::rename(&dest, &backup) {
                Ok(()) => {
                    debug!("Removed {}", path);
                    applied.push(Applied::Displaced { dest, backup });
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    warn!("{} was already gone", path)
                }
                Err(e) => {
                    rollback(applied);
                    return Err(ConsolidateError::Commit(format!(
                        "failed to remove {}: {}",
                        path, e
                    )));
                }
            }
        }
    }

    for step in &applied {
        if let Applied::Displaced { backup, .. } = step {
            if let Err(e) = fs::remove_file(backup) {
                warn!("Could not delete {}: {}", backup.display(), e);
            }
        }
    }

    Ok(CommitSummary::from_changes(changes))
}

fn sibling(dest: &Path, suffix: &str) -> PathBuf {
    let mut name = dest.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(suffix);
    dest.with_file_name(name)
}

fn stage(tmp: &Path, contents: &str) -> io::Result<()> {
    if let Some(parent) = tmp.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(tmp, contents)
}

fn move_into_place(tmp: &Path, dest: &Path, applied: &mut Vec<Applied>) -> io::Result<()> {
    if !dest.is_file() {
        fs::rename(tmp, dest)?;
        applied.push(Applied::Created(dest.to_path_buf()));
        return Ok(());
    }

    let backup = sibling(dest, BACKUP_SUFFIX);
    fs::rename(dest, &backup)?;
    if let Err(e) = fs::rename(tmp, dest) {
        let _ = fs::rename(&backup, dest);
        return Err(e);
    }
    applied.push(Applied::Displaced {
        dest: dest.to_path_buf(),
        backup,
    });
    Ok(())
}

fn rollback(applied: Vec<Applied>) {
    for step in applied.into_iter().rev() {
        let restored = match &step {
            Applied::Created(dest) => fs::remove_file(dest),
            Applied::Displaced { dest, backup } => fs::rename(backup, dest),
        };
        match restored {
            Ok(()) => debug!("Rolled back {:?}", step),
            Err(e) => warn!("Could not roll back {:?}: {}", step, e),
        }
    }
}

fn discard(staged: &[(PathBuf, PathBuf)]) {
    for (tmp, _) in staged {
        let _ = fs::remove_file(tmp);
    }
}
