use crate::error::WormError;
use camino::{Utf8Path, Utf8PathBuf};
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::thread;
use std::time::Duration;

const DEFAULT_ATTEMPTS: u32 = 200;
const DEFAULT_DELAY: Duration = Duration::from_millis(25);

/// Cross-process writer lock: a sibling file created with `create_new`, removed on drop.
#[derive(Debug)]
pub struct LockFile {
    path: Utf8PathBuf,
}

impl LockFile {
    /// `<log>.lock` for the given log path.
    pub fn path_for(log: &Utf8Path) -> Utf8PathBuf {
        Utf8PathBuf::from(format!("{log}.lock"))
    }

    pub fn acquire(path: &Utf8Path) -> Result<Self, WormError> {
        Self::acquire_with(path, DEFAULT_ATTEMPTS, DEFAULT_DELAY)
    }

    /// Acquire `path`, retrying up to `attempts` times.
    ///
    /// A lock whose recorded owner process has exited is reclaimed. Liveness is only known
    /// where `/proc` exists; elsewhere a leftover lock must be removed by hand.
    pub fn acquire_with(path: &Utf8Path, attempts: u32, delay: Duration) -> Result<Self, WormError> {
        let attempts = attempts.max(1);
        for attempt in 1..=attempts {
            if let Some(lock) = Self::try_create(path)? {
                return Ok(lock);
            }
            if reclaim_stale(path)
                && let Some(lock) = Self::try_create(path)?
            {
                return Ok(lock);
            }
            if attempt == 1 {
                log::debug!("waiting for audit lock {path}");
            }
            if attempt < attempts {
                thread::sleep(delay);
            }
        }
        log::warn!("audit lock {path} still held after {attempts} attempts");
        Err(WormError::LockTimeout {
            path: path.to_string(),
            attempts,
        })
    }

    fn try_create(path: &Utf8Path) -> Result<Option<Self>, WormError> {
        match OpenOptions::new().write(true).create_new(true).open(path) {
            Ok(mut file) => {
                // Dropping `lock` removes the file if the PID write fails.
                let lock = Self {
                    path: path.to_path_buf(),
                };
                writeln!(file, "{}", std::process::id()).map_err(|e| WormError::io(path, e))?;
                Ok(Some(lock))
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(None),
            Err(e) => Err(WormError::io(path, e)),
        }
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }
}

impl Drop for LockFile {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            log::warn!("failed to remove audit lock {}: {e}", self.path);
        }
    }
}

/// PID recorded in a lock file. `None` while the owner is still writing it.
fn owner_pid(path: &Utf8Path) -> Option<u32> {
    fs::read_to_string(path).ok()?.trim().parse().ok()
}

#[cfg(target_os = "linux")]
fn owner_alive(pid: u32) -> Option<bool> {
    Some(Utf8Path::new(&format!("/proc/{pid}")).exists())
}

#[cfg(not(target_os = "linux"))]
fn owner_alive(_pid: u32) -> Option<bool> {
    None
}

/// Remove the lock at `path` if its owner has exited. Returns whether it was removed.
///
/// The lock is first renamed aside so that two reclaimers cannot both delete it. If the
/// renamed file turns out to name a different owner, it is linked back in place.
fn reclaim_stale(path: &Utf8Path) -> bool {
    let Some(pid) = owner_pid(path) else {
        return false;
    };
    if owner_alive(pid) != Some(false) {
        return false;
    }

    let aside = Utf8PathBuf::from(format!("{path}.stale-{}", std::process::id()));
    if fs::rename(path, &aside).is_err() {
        return false;
    }
    let reclaimed = owner_pid(&aside) == Some(pid);
    if reclaimed {
        log::warn!("reclaimed audit lock {path} left by exited process {pid}");
    } else if let Err(e) = fs::hard_link(&aside, path) {
        log::error!(
            "audit lock {path} changed owner while being reclaimed and could not be restored: {e}"
        );
    }
    if let Err(e) = fs::remove_file(&aside) {
        log::warn!("failed to remove {aside}: {e}");
    }
    reclaimed
}
