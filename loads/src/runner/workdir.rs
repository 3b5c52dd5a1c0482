use std::env;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, error};

/// The working directory is process-wide. Every run holds this lock while its workers are
/// active: shared when it stays put, exclusive when it moves the directory.
fn workdir_lock() -> &'static RwLock<()> {
    static LOCK: OnceLock<RwLock<()>> = OnceLock::new();
    LOCK.get_or_init(|| RwLock::new(()))
}

enum Guard {
    Shared(#[allow(unused)] RwLockReadGuard<'static, ()>),
    Exclusive(#[allow(unused)] RwLockWriteGuard<'static, ()>),
}

/// Working directory of a run, held for the whole run.
///
/// An exclusive guard may [`enter`](WorkDir::enter) a directory; the previous one is restored on
/// drop, before the lock is released.
pub(crate) struct WorkDir {
    previous: Option<PathBuf>,
    guard: Guard,
}

impl WorkDir {
    /// Keep the current directory, waiting for any run that moved it.
    pub async fn shared() -> Self {
        Self {
            previous: None,
            guard: Guard::Shared(workdir_lock().read().await),
        }
    }

    /// Wait until no other run is active.
    pub async fn exclusive() -> Self {
        Self {
            previous: None,
            guard: Guard::Exclusive(workdir_lock().write().await),
        }
    }

    pub fn enter(&mut self, dir: &Path) -> io::Result<()> {
        if let Guard::Shared(_) = self.guard {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "working directory is shared with other runs",
            ));
        }

        let previous = env::current_dir()?;
        debug!("chdir {}", dir.display());
        env::set_current_dir(dir)?;
        self.previous.get_or_insert(previous);
        Ok(())
    }
}

impl Drop for WorkDir {
    fn drop(&mut self) {
        let Some(previous) = &self.previous else {
            return;
        };
        if let Err(err) = env::set_current_dir(previous) {
            error!(
                "Unable to restore working directory {}: {err}",
                previous.display()
            );
        }
    }
}
