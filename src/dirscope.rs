//! Scoped changes of the process working directory
//!
//! [`DirGuard`] behaves like `pushd`: it changes into a directory on
//! creation and changes back to the previous directory when dropped, so the
//! previous directory is restored on early returns, `?` propagation and
//! panics alike.

use crate::error::Result;
use std::env;
use std::path::{Path, PathBuf};

/// Restores the previous working directory when dropped
#[derive(Debug)]
pub struct DirGuard {
    previous: PathBuf,
}

impl DirGuard {
    /// Change into `path`, remembering the current directory.
    ///
    /// Relative paths are resolved against the current directory before
    /// the change.
    pub fn push(path: &Path) -> Result<Self> {
        let previous = env::current_dir()?;
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            previous.join(path)
        };

        tracing::info!("$ pushd \"{}\"", absolute.display());
        env::set_current_dir(&absolute)?;

        Ok(DirGuard { previous })
    }

    /// The directory that will be restored on drop
    pub fn previous(&self) -> &Path {
        &self.previous
    }
}

impl Drop for DirGuard {
    fn drop(&mut self) {
        tracing::info!("$ popd");
        if let Err(e) = env::set_current_dir(&self.previous) {
            tracing::error!(
                "Failed to restore working directory {}: {}",
                self.previous.display(),
                e
            );
        }
    }
}

/// Run `body` with the working directory set to `path`, if one is given.
///
/// With `None` the body runs in place and nothing is logged.
pub fn with_directory<T, F>(path: Option<&Path>, body: F) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    match path {
        Some(path) => {
            let _guard = DirGuard::push(path)?;
            body()
        }
        None => body(),
    }
}

/// Serialises tests that change the process working directory.
#[cfg(test)]
pub(crate) fn cwd_lock() -> std::sync::MutexGuard<'static, ()> {
    use std::sync::Mutex;

    static CWD_LOCK: Mutex<()> = Mutex::new(());
    CWD_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
