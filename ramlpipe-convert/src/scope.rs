//! Process working-directory scope for renderers that resolve includes
//! against the current directory.
//!
//! The working directory is process-wide. Every change goes through
//! [`DirectoryScope`], which holds one global async mutex from the moment the
//! directory is saved until it is restored, so concurrent conversions on a
//! multi-threaded runtime never observe each other's directory.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use tokio::sync::{Mutex, MutexGuard};

fn cwd_lock() -> &'static Mutex<()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(()))
}

/// Hold the working-directory lock without changing directory, e.g. to
/// resolve a relative path against a directory nobody is swapping.
pub async fn working_directory_lock() -> MutexGuard<'static, ()> {
    cwd_lock().lock().await
}

/// Saved working directory plus the lock, restored on [`restore`] or drop.
///
/// [`restore`]: DirectoryScope::restore
#[derive(Debug)]
pub struct DirectoryScope {
    saved: PathBuf,
    entered: PathBuf,
    restored: bool,
    _guard: MutexGuard<'static, ()>,
}

impl DirectoryScope {
    /// Wait for the lock, save the current directory, and change to `dir`.
    ///
    /// A relative `dir` is taken relative to the saved directory.
    pub async fn enter(dir: &Path) -> io::Result<Self> {
        let guard = cwd_lock().lock().await;
        let saved = std::env::current_dir()?;
        let entered = saved.join(dir);
        std::env::set_current_dir(&entered)?;
        tracing::trace!(from = %saved.display(), to = %entered.display(), "entered directory scope");
        Ok(DirectoryScope {
            saved,
            entered,
            restored: false,
            _guard: guard,
        })
    }

    /// Directory in effect before the scope was entered.
    pub fn saved(&self) -> &Path {
        &self.saved
    }

    /// Directory the scope switched to.
    pub fn entered(&self) -> &Path {
        &self.entered
    }

    /// Restore the saved directory and release the lock.
    pub fn restore(mut self) -> io::Result<()> {
        self.restore_saved()
    }

    fn restore_saved(&mut self) -> io::Result<()> {
        if self.restored {
            return Ok(());
        }
        self.restored = true;
        std::env::set_current_dir(&self.saved)
    }
}

impl Drop for DirectoryScope {
    fn drop(&mut self) {
        if let Err(err) = self.restore_saved() {
            tracing::warn!(
                dir = %self.saved.display(),
                error = %err,
                "failed to restore working directory",
            );
        }
    }
}
