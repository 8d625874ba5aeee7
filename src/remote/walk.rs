use crate::listing::{EntryKind, Listing};
use crate::remote::{is_child_name, join};
use crate::transport::{DirectoryGuard, Session};
use crate::{FtpTreeError, Result};
use tracing::{debug, warn};

/// One visited directory: its path plus the names of its immediate
/// subdirectories and files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkEntry {
    pub path: String,
    pub dirs: Vec<String>,
    pub files: Vec<String>,
}

/// List one remote directory as `(dirs, files)`.
pub fn list_dir<S: Session + ?Sized>(session: &mut S, path: &str) -> Result<(Vec<String>, Vec<String>)> {
    let lines = session.list_entries(path)?;
    let mut listing = Listing::from_lines(&[EntryKind::Directory, EntryKind::File], lines)?;
    let dirs = child_names(path, listing.take(EntryKind::Directory));
    Ok((dirs, child_names(path, listing.take(EntryKind::File))))
}

/// Drop `.`, `..` and any name that would leave `path` when joined to it.
fn child_names(path: &str, mut names: Vec<String>) -> Vec<String> {
    names.retain(|name| {
        let keep = is_child_name(name);
        if !keep && !matches!(name.trim_end_matches('/'), "." | "..") {
            warn!("Ignoring entry {:?} listed in {}", name, path);
        }
        keep
    });
    names
}

enum Frame {
    Visit(String),
    Yield(WalkEntry),
}

type ErrorCallback<'s> = Box<dyn FnMut(&FtpTreeError) + 's>;
type EntryFilter<'s> = Box<dyn FnMut(&str) -> bool + 's>;

/// Lazy depth-first walk of a remote tree, in the manner of `os.walk`.
///
/// A directory is listed only when the iterator reaches it, so stopping early
/// leaves the rest of the tree untouched. A directory whose listing fails is
/// reported through [`Walk::on_error`] and its subtree is skipped.
pub struct Walk<'s, S: Session + ?Sized> {
    session: &'s mut S,
    stack: Vec<Frame>,
    top_down: bool,
    follow_links: bool,
    on_error: Option<ErrorCallback<'s>>,
    filter: Option<EntryFilter<'s>>,
}

impl<'s, S: Session + ?Sized> Walk<'s, S> {
    pub fn new(session: &'s mut S, root: impl Into<String>) -> Self {
        Self {
            session,
            stack: vec![Frame::Visit(root.into())],
            top_down: true,
            follow_links: false,
            on_error: None,
            filter: None,
        }
    }

    /// Yield a directory before (true, the default) or after its descendants.
    pub fn top_down(mut self, top_down: bool) -> Self {
        self.top_down = top_down;
        self
    }

    /// Treat symlinks that can be entered as subdirectories.
    pub fn follow_links(mut self, follow: bool) -> Self {
        self.follow_links = follow;
        self
    }

    pub fn on_error<F>(mut self, callback: F) -> Self
    where
        F: FnMut(&FtpTreeError) + 's,
    {
        self.on_error = Some(Box::new(callback));
        self
    }

    /// Only descend into subdirectories whose full path passes `predicate`.
    /// Rejected names are also dropped from the parent's `dirs`.
    pub fn filter_entry<F>(mut self, predicate: F) -> Self
    where
        F: FnMut(&str) -> bool + 's,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    /// The underlying session, for acting on entries between steps.
    pub fn session(&mut self) -> &mut S {
        &mut *self.session
    }

    fn read(&mut self, path: &str) -> Result<(Vec<String>, Vec<String>)> {
        if !self.follow_links {
            return list_dir(&mut *self.session, path);
        }

        let lines = self.session.list_entries(path)?;
        let kinds = [EntryKind::Directory, EntryKind::File, EntryKind::Symlink];
        let mut listing = Listing::from_lines(&kinds, lines)?;
        let mut dirs = child_names(path, listing.take(EntryKind::Directory));
        for link in child_names(path, listing.take(EntryKind::Symlink)) {
            if self.enters(&join(path, &link))? {
                dirs.push(link);
            }
        }
        Ok((dirs, child_names(path, listing.take(EntryKind::File))))
    }

    fn enters(&mut self, path: &str) -> Result<bool> {
        let mut guard = DirectoryGuard::new(&mut *self.session)?;
        match guard.change_directory(path) {
            Ok(()) => Ok(true),
            Err(e) if e.is_directory_failure() => Ok(false),
            Err(e) => Err(e),
        }
    }
}

impl<S: Session + ?Sized> Iterator for Walk<'_, S> {
    type Item = WalkEntry;

    fn next(&mut self) -> Option<WalkEntry> {
        while let Some(frame) = self.stack.pop() {
            let path = match frame {
                Frame::Yield(entry) => return Some(entry),
                Frame::Visit(path) => path,
            };

            let (mut dirs, files) = match self.read(&path) {
                Ok(listing) => listing,
                Err(e) => {
                    let err = FtpTreeError::Listing { path, source: Box::new(e) };
                    warn!("Skipping subtree: {}", err);
                    if let Some(callback) = self.on_error.as_mut() {
                        callback(&err);
                    }
                    continue;
                }
            };
            if let Some(filter) = self.filter.as_mut() {
                dirs.retain(|d| filter(&join(&path, d)));
            }
            debug!("Listed {}: {} dirs, {} files", path, dirs.len(), files.len());

            // Reversed so the first subdirectory is popped first.
            let children: Vec<Frame> = dirs.iter().rev().map(|d| Frame::Visit(join(&path, d))).collect();
            let entry = WalkEntry { path, dirs, files };

            if self.top_down {
                self.stack.extend(children);
                return Some(entry);
            }
            self.stack.push(Frame::Yield(entry));
            self.stack.extend(children);
        }
        None
    }
}
