use crate::remote::{join, split};
use crate::transport::{DirectoryGuard, Session};
use crate::{FtpTreeError, Result};
use tracing::{debug, info, warn};

/// Result of one best-effort directory creation.
#[derive(Debug)]
pub enum DirOutcome {
    Created,
    /// Creation failed but the directory can be entered.
    AlreadyExisted,
    Failed(FtpTreeError),
}

impl DirOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, DirOutcome::Failed(_))
    }
}

/// Every creation attempt made by [`ensure_directory`], shallowest first.
#[derive(Debug, Default)]
pub struct MkdirsReport {
    pub attempts: Vec<(String, DirOutcome)>,
}

impl MkdirsReport {
    pub fn created(&self) -> usize {
        self.attempts.iter().filter(|(_, o)| matches!(o, DirOutcome::Created)).count()
    }

    pub fn is_complete(&self) -> bool {
        !self.attempts.iter().any(|(_, o)| o.is_failed())
    }

    /// Treat the first failed segment as an error.
    pub fn into_result(mut self) -> Result<Self> {
        if let Some(pos) = self.attempts.iter().position(|(_, o)| o.is_failed()) {
            if let DirOutcome::Failed(e) = std::mem::replace(&mut self.attempts[pos].1, DirOutcome::AlreadyExisted) {
                return Err(e);
            }
        }
        Ok(self)
    }
}

/// Segments of `target` below its deepest existing ancestor, shallowest first.
///
/// Probes by changing into `target`, then each parent in turn, until one can be
/// entered. The session's working directory is restored before returning.
pub fn remaining_directory<S: Session + ?Sized>(session: &mut S, target: &str) -> Result<Vec<String>> {
    let mut guard = DirectoryGuard::new(session)?;
    let mut remaining = Vec::new();
    let mut candidate = target;

    // An empty candidate means a relative target ran out of segments: the
    // working directory itself is the deepest existing ancestor.
    while !candidate.is_empty() {
        match guard.change_directory(candidate) {
            Ok(()) => break,
            Err(e) if e.is_directory_failure() => {}
            Err(e) => return Err(e),
        }
        let (head, name) = split(candidate);
        if name.is_empty() {
            break;
        }
        remaining.push(name.to_string());
        candidate = head;
    }

    guard.restore()?;
    remaining.reverse();
    Ok(remaining)
}

/// Create one directory without failing on "already exists".
///
/// Hard transport errors still propagate.
pub fn create_directory<S: Session + ?Sized>(session: &mut S, path: &str) -> Result<DirOutcome> {
    let err = match session.make_directory(path) {
        Ok(()) => {
            debug!("Created remote directory {}", path);
            return Ok(DirOutcome::Created);
        }
        Err(e) if e.is_directory_failure() => e,
        Err(e) => return Err(e),
    };

    let mut guard = DirectoryGuard::new(session)?;
    let exists = match guard.change_directory(path) {
        Ok(()) => true,
        Err(e) if e.is_directory_failure() => false,
        Err(e) => return Err(e),
    };
    guard.restore()?;

    if exists {
        debug!("Remote directory {} already exists", path);
        Ok(DirOutcome::AlreadyExisted)
    } else {
        warn!("Failed to create remote directory {}: {}", path, err);
        Ok(DirOutcome::Failed(err))
    }
}

/// Make `target` and every missing ancestor exist, top-down.
///
/// Per-segment failures are recorded in the report rather than returned, so a
/// caller that needs the directory to exist should check
/// [`MkdirsReport::is_complete`] or use [`MkdirsReport::into_result`].
pub fn ensure_directory<S: Session + ?Sized>(session: &mut S, target: &str) -> Result<MkdirsReport> {
    let remaining = remaining_directory(&mut *session, target)?;
    let mut report = MkdirsReport::default();
    if remaining.is_empty() {
        return Ok(report);
    }

    let mut base = target;
    for _ in &remaining {
        base = split(base).0;
    }

    let mut directory = base.to_string();
    for name in &remaining {
        directory = join(&directory, name);
        let outcome = create_directory(&mut *session, &directory)?;
        report.attempts.push((directory.clone(), outcome));
    }

    info!("Materialized {} ({} created)", target, report.created());
    Ok(report)
}
