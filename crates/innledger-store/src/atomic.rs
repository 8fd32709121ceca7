//! Atomic whole-file replacement.
//!
//! Writers never touch a target in place: bytes go to a temp file in the same
//! directory, the temp file is synced, and a rename swaps it in. A crash at
//! any point leaves either the old content or the new content, never a mix.

use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::debug;

use innledger_error::{LedgerError, Result};

/// Process-wide counter making concurrent temp names distinct.
static TEMP_SEQ: AtomicU64 = AtomicU64::new(0);

/// Replace `path` with `bytes` via temp-file-then-rename.
///
/// The temp file lives next to the target (rename is only atomic within one
/// filesystem) and is removed on any failure. The parent directory sync after
/// the rename is best-effort; some platforms refuse to open directories.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let seq = TEMP_SEQ.fetch_add(1, Ordering::Relaxed);
    let mut temp_name = path.file_name().map_or_else(
        || std::ffi::OsString::from("innledger"),
        std::ffi::OsStr::to_os_string,
    );
    temp_name.push(format!(".tmp{seq}"));
    let temp_path = path.with_file_name(temp_name);

    let result = (|| {
        let mut file = std::fs::File::create(&temp_path)
            .map_err(|err| LedgerError::io("create", &temp_path, err))?;
        file.write_all(bytes)
            .map_err(|err| LedgerError::io("write", &temp_path, err))?;
        file.sync_all()
            .map_err(|err| LedgerError::io("sync", &temp_path, err))?;
        drop(file);
        std::fs::rename(&temp_path, path).map_err(|err| LedgerError::io("rename", path, err))
    })();

    if result.is_err() {
        let _ = std::fs::remove_file(&temp_path);
        return result;
    }

    sync_parent_dir(path);
    Ok(())
}

/// Copy `src` over `dst` atomically (read fully, then [`write_atomic`]).
pub fn copy_atomic(src: &Path, dst: &Path) -> Result<()> {
    let bytes = std::fs::read(src).map_err(|err| LedgerError::io("read", src, err))?;
    write_atomic(dst, &bytes)
}

/// Remove a file, treating "already gone" as success.
pub fn remove_if_exists(path: &Path) -> Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(LedgerError::io("remove", path, err)),
    }
}

fn sync_parent_dir(path: &Path) {
    let Some(parent) = path.parent() else {
        return;
    };
    match std::fs::File::open(parent) {
        Ok(dir) => {
            if let Err(err) = dir.sync_all() {
                debug!(dir = %parent.display(), %err, "directory sync failed");
            }
        }
        Err(err) => {
            debug!(dir = %parent.display(), %err, "directory open for sync failed");
        }
    }
}
