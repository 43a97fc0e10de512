//! Store locking
//!
//! One session per store directory at a time:
//! - threads of this process queue on an in-process registry and wait up
//!   to `lock_timeout` for the holder to release;
//! - a thread that already holds the directory fails fast instead of
//!   waiting on itself;
//! - other processes are kept out with a non-blocking advisory `flock` on
//!   the `LOCK` file (unix only).

use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::thread::{self, ThreadId};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::error::{CabinetError, Result};

const LOCK_FILENAME: &str = "LOCK";

/// Directories with an open session in this process, and who holds them
static HELD: Mutex<BTreeMap<PathBuf, ThreadId>> = parking_lot::const_mutex(BTreeMap::new());

/// Signalled whenever an entry leaves `HELD`
static RELEASED: Condvar = Condvar::new();

/// Exclusive claim on a store directory, released on drop
#[derive(Debug)]
pub(crate) struct StoreLock {
    /// Canonical directory, the registry key
    dir: PathBuf,

    /// Holds the `flock`; closed before the registry entry is dropped
    file: Option<File>,
}

impl StoreLock {
    /// Claim `dir`, which must already exist
    pub(crate) fn acquire(dir: &Path, timeout: Duration) -> Result<Self> {
        let dir = dir.canonicalize()?;
        register(&dir, timeout)?;

        match lock_file(&dir) {
            Ok(file) => Ok(Self {
                dir,
                file: Some(file),
            }),
            Err(e) => {
                unregister(&dir);
                let reason = if e.kind() == io::ErrorKind::WouldBlock {
                    "locked by another process".to_string()
                } else {
                    format!("cannot lock: {}", e)
                };
                Err(CabinetError::StorageUnavailable { path: dir, reason })
            }
        }
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        // Give up the flock first so the next thread in line can take it
        drop(self.file.take());
        unregister(&self.dir);
    }
}

fn register(dir: &Path, timeout: Duration) -> Result<()> {
    let me = thread::current().id();
    let deadline = Instant::now() + timeout;
    let mut held = HELD.lock();

    loop {
        match held.get(dir).copied() {
            None => break,
            Some(holder) if holder == me => {
                return Err(CabinetError::StorageUnavailable {
                    path: dir.to_path_buf(),
                    reason: "already open in this thread (nested session)".to_string(),
                });
            }
            Some(_) => {
                if RELEASED.wait_until(&mut held, deadline).timed_out()
                    && held.contains_key(dir)
                {
                    return Err(CabinetError::StorageUnavailable {
                        path: dir.to_path_buf(),
                        reason: format!(
                            "timed out after {:?} waiting for another thread",
                            timeout
                        ),
                    });
                }
            }
        }
    }

    held.insert(dir.to_path_buf(), me);
    Ok(())
}

fn unregister(dir: &Path) {
    HELD.lock().remove(dir);
    RELEASED.notify_all();
}

/// Open `LOCK`, take the advisory lock, and record our pid in it
fn lock_file(dir: &Path) -> io::Result<File> {
    let mut file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(false)
        .open(dir.join(LOCK_FILENAME))?;

    try_lock(&file)?;

    file.set_len(0)?;
    writeln!(file, "{}", std::process::id())?;
    file.flush()?;
    Ok(file)
}

#[cfg(unix)]
fn try_lock(file: &File) -> io::Result<()> {
    use std::os::unix::io::AsRawFd;

    let result = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX | libc::LOCK_NB) };
    if result != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

// No cross-process exclusion here; in-process serialization still applies.
#[cfg(not(unix))]
fn try_lock(_file: &File) -> io::Result<()> {
    Ok(())
}
