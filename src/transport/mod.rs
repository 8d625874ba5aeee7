use crate::Result;
use std::io::{Read, Write};
use std::ops::{Deref, DerefMut};
use tracing::warn;

pub mod ssh;

/// A live, stateful connection to a remote file server.
///
/// Remote paths are plain slash-delimited strings, resolved against the
/// session's current directory unless absolute. The session owns that current
/// directory; anything that changes it temporarily must go through
/// [`DirectoryGuard`].
pub trait Session {
    /// Raw listing lines (`ls -l` style) for `path`.
    fn list_entries(&mut self, path: &str) -> Result<Vec<String>>;
    /// Fails with [`crate::FtpTreeError::Directory`] when `path` cannot be entered.
    fn change_directory(&mut self, path: &str) -> Result<()>;
    fn current_directory(&mut self) -> Result<String>;
    fn make_directory(&mut self, path: &str) -> Result<()>;
    fn remove_directory(&mut self, path: &str) -> Result<()>;
    /// Stream `source` into the remote file, returning the bytes written.
    fn store(&mut self, remote: &str, source: &mut dyn Read) -> Result<u64>;
    /// Stream the remote file into `sink`, returning the bytes read.
    fn retrieve(&mut self, remote: &str, sink: &mut dyn Write) -> Result<u64>;
    fn delete(&mut self, remote: &str) -> Result<()>;
    /// Polite shutdown.
    fn quit(&mut self) -> Result<()>;
    /// Hard shutdown.
    fn close(&mut self) -> Result<()>;
}

/// Restores the session's current directory when dropped.
pub struct DirectoryGuard<'s, S: Session + ?Sized> {
    session: &'s mut S,
    saved: String,
    restored: bool,
}

impl<'s, S: Session + ?Sized> DirectoryGuard<'s, S> {
    pub fn new(session: &'s mut S) -> Result<Self> {
        let saved = session.current_directory()?;
        Ok(Self { session, saved, restored: false })
    }

    pub fn saved(&self) -> &str {
        &self.saved
    }

    /// Restore now and surface the error, instead of only logging it on drop.
    pub fn restore(mut self) -> Result<()> {
        self.restored = true;
        let saved = std::mem::take(&mut self.saved);
        self.session.change_directory(&saved)
    }
}

impl<S: Session + ?Sized> Deref for DirectoryGuard<'_, S> {
    type Target = S;

    fn deref(&self) -> &S {
        &*self.session
    }
}

impl<S: Session + ?Sized> DerefMut for DirectoryGuard<'_, S> {
    fn deref_mut(&mut self) -> &mut S {
        &mut *self.session
    }
}

impl<S: Session + ?Sized> Drop for DirectoryGuard<'_, S> {
    fn drop(&mut self) {
        if self.restored {
            return;
        }
        if let Err(e) = self.session.change_directory(&self.saved) {
            warn!("Failed to restore working directory {}: {}", self.saved, e);
        }
    }
}
