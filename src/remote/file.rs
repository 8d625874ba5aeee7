use crate::transport::Session;
use crate::{FtpTreeError, Result};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tracing::debug;

/// A single remote file bound to the session that acts on it.
pub struct RemoteFile<'s, S: Session + ?Sized> {
    session: &'s mut S,
    path: String,
}

impl<'s, S: Session + ?Sized> RemoteFile<'s, S> {
    pub fn new(session: &'s mut S, path: impl Into<String>) -> Self {
        Self { session, path: path.into() }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn upload(&mut self, source: &mut dyn Read) -> Result<u64> {
        self.session.store(&self.path, source)
    }

    /// Upload from a local file, which is closed again when this returns.
    pub fn upload_from(&mut self, local: &Path) -> Result<u64> {
        let mut file = File::open(local)
            .map_err(|source| FtpTreeError::Local { path: local.to_path_buf(), source })?;
        let n = self.upload(&mut file)?;
        debug!("Uploaded {:?} -> {} ({} bytes)", local, self.path, n);
        Ok(n)
    }

    pub fn download(&mut self, sink: &mut dyn Write) -> Result<u64> {
        self.session.retrieve(&self.path, sink)
    }

    /// Download into a local file, created or truncated.
    pub fn download_to(&mut self, local: &Path) -> Result<u64> {
        let mut file = File::create(local)
            .map_err(|source| FtpTreeError::Local { path: local.to_path_buf(), source })?;
        let n = self.download(&mut file)?;
        file.flush()?;
        debug!("Downloaded {} -> {:?} ({} bytes)", self.path, local, n);
        Ok(n)
    }

    pub fn delete(self) -> Result<()> {
        self.session.delete(&self.path)
    }
}
