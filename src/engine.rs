use crate::remote::{create_directory, ensure_directory, is_child_name, join, DirOutcome, RemoteFile, Walk};
use crate::scanner::local::relative_path;
use crate::scanner::{walk_local, Excludes};
use crate::transport::Session;
use crate::{FtpTreeError, Result};
use indicatif::ProgressBar;
use std::cell::Cell;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Create the destination root before transferring.
    pub auto_create_root: bool,
    /// Fail on a remote directory that could not be created, instead of
    /// leaving it to the file transfers below it to fail.
    pub strict_directories: bool,
    pub excludes: Excludes,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            auto_create_root: true,
            strict_directories: false,
            excludes: Excludes::none(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncSummary {
    pub directories_created: usize,
    pub files_transferred: usize,
    pub bytes_transferred: u64,
    /// Remote directories whose listing failed and were skipped.
    pub directories_skipped: usize,
}

/// `source_path` with `source_root` stripped, leading `/` trimmed.
pub fn relative<'a>(source_root: &str, source_path: &'a str) -> &'a str {
    source_path
        .strip_prefix(source_root)
        .unwrap_or(source_path)
        .trim_start_matches('/')
}

/// Map a path under `source_root` onto `destination_root`.
pub fn map_path(source_root: &str, source_path: &str, destination_root: &str) -> String {
    join(destination_root, relative(source_root, source_path))
}

fn local_path(root: &Path, relative: &str) -> PathBuf {
    relative
        .split('/')
        .filter(|segment| !segment.is_empty())
        .fold(root.to_path_buf(), |path, segment| path.join(segment))
}

/// `name` joined onto `dir`, or `None` if the name would land outside `dir`.
fn local_child(dir: &Path, name: &str) -> Option<PathBuf> {
    if is_child_name(name) {
        Some(dir.join(name.trim_end_matches('/')))
    } else {
        warn!("Refusing to write {:?} outside {:?}", name, dir);
        None
    }
}

/// Directories `create_dir_all(path)` would have to make.
fn missing_ancestors(path: &Path) -> usize {
    path.ancestors()
        .take_while(|p| !p.as_os_str().is_empty() && !p.exists())
        .count()
}

fn tick(progress: Option<&ProgressBar>, message: String) {
    if let Some(pb) = progress {
        pb.set_message(message);
        pb.inc(1);
    }
}

/// Recursive upload and download over one session. Strictly sequential;
/// nothing is rolled back when a transfer fails partway.
pub struct SyncEngine<'s, S: Session + ?Sized> {
    session: &'s mut S,
    options: SyncOptions,
    progress: Option<ProgressBar>,
}

impl<'s, S: Session + ?Sized> SyncEngine<'s, S> {
    pub fn new(session: &'s mut S) -> Self {
        Self { session, options: SyncOptions::default(), progress: None }
    }

    pub fn with_options(mut self, options: SyncOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn session(&mut self) -> &mut S {
        &mut *self.session
    }

    /// A file relative to the session's current directory.
    pub fn file(&mut self, name: &str) -> Result<RemoteFile<'_, S>> {
        let cwd = self.session.current_directory()?;
        Ok(RemoteFile::new(&mut *self.session, join(&cwd, name)))
    }

    pub fn download_directory(&mut self, remote_root: &str, local_root: &Path) -> Result<SyncSummary> {
        let mut summary = SyncSummary::default();
        info!("Downloading {} -> {:?}", remote_root, local_root);

        if self.options.auto_create_root && !local_root.is_dir() {
            let missing = missing_ancestors(local_root);
            fs::create_dir_all(local_root)
                .map_err(|source| FtpTreeError::Local { path: local_root.to_path_buf(), source })?;
            summary.directories_created += missing;
        }

        let skipped = Rc::new(Cell::new(0usize));
        let counter = Rc::clone(&skipped);
        let excludes = self.options.excludes.clone();
        let root = remote_root.to_string();

        let mut walk = Walk::new(&mut *self.session, remote_root)
            .on_error(move |_| counter.set(counter.get() + 1))
            .filter_entry(move |path| !excludes.is_excluded(relative(&root, path)));

        while let Some(entry) = walk.next() {
            let rel = relative(remote_root, &entry.path);
            let target_dir = local_path(local_root, rel);

            for name in &entry.dirs {
                let Some(dir) = local_child(&target_dir, name) else { continue };
                if !dir.exists() {
                    fs::create_dir(&dir)
                        .map_err(|source| FtpTreeError::Local { path: dir.clone(), source })?;
                    summary.directories_created += 1;
                }
            }

            for name in &entry.files {
                let source = join(&entry.path, name);
                if self.options.excludes.is_excluded(relative(remote_root, &source)) {
                    debug!("Excluded {}", source);
                    continue;
                }
                let Some(target) = local_child(&target_dir, name) else { continue };
                let n = RemoteFile::new(walk.session(), source.as_str()).download_to(&target)?;
                summary.files_transferred += 1;
                summary.bytes_transferred += n;
                tick(self.progress.as_ref(), format!("Downloading {}", source));
            }
        }
        drop(walk);

        summary.directories_skipped = skipped.get();
        if summary.directories_skipped > 0 {
            warn!("{} remote directories could not be listed", summary.directories_skipped);
        }
        info!(
            "Downloaded {} files ({} bytes), created {} directories",
            summary.files_transferred, summary.bytes_transferred, summary.directories_created
        );
        Ok(summary)
    }

    pub fn upload_directory(&mut self, local_root: &Path, remote_root: &str) -> Result<SyncSummary> {
        let mut summary = SyncSummary::default();
        info!("Uploading {:?} -> {}", local_root, remote_root);

        let tree = walk_local(local_root, &self.options.excludes)?;

        if self.options.auto_create_root {
            let report = ensure_directory(&mut *self.session, remote_root)?;
            let report = if self.options.strict_directories { report.into_result()? } else { report };
            summary.directories_created += report.created();
        }

        for dir in tree {
            let target_dir = join(remote_root, &relative_path(local_root, &dir.path));

            for name in &dir.dirs {
                let remote_dir = join(&target_dir, name);
                match create_directory(&mut *self.session, &remote_dir)? {
                    DirOutcome::Created => summary.directories_created += 1,
                    DirOutcome::AlreadyExisted => {}
                    DirOutcome::Failed(e) if self.options.strict_directories => return Err(e),
                    DirOutcome::Failed(_) => {}
                }
            }

            for name in &dir.files {
                let target = join(&target_dir, name);
                let n = RemoteFile::new(&mut *self.session, target.as_str()).upload_from(&dir.path.join(name))?;
                summary.files_transferred += 1;
                summary.bytes_transferred += n;
                tick(self.progress.as_ref(), format!("Uploading {}", target));
            }
        }

        info!(
            "Uploaded {} files ({} bytes), created {} directories",
            summary.files_transferred, summary.bytes_transferred, summary.directories_created
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_path() {
        assert_eq!(map_path("/a/b", "/a/b/c/d.txt", "/x"), "/x/c/d.txt");
        assert_eq!(map_path("/a/b", "/a/b", "/x"), "/x");
        assert_eq!(map_path("/a/b/", "/a/b/c", "x"), "x/c");
    }

    #[test]
    fn test_local_path() {
        let p = local_path(Path::new("/tmp/out"), "c/d");
        assert_eq!(p, Path::new("/tmp/out").join("c").join("d"));
        assert_eq!(local_path(Path::new("/tmp/out"), ""), Path::new("/tmp/out"));
    }

    #[test]
    fn test_local_child_stays_inside() {
        let dir = Path::new("/tmp/out");
        assert_eq!(local_child(dir, "dir/"), Some(dir.join("dir")));
        assert_eq!(local_child(dir, "f.txt"), Some(dir.join("f.txt")));
        assert_eq!(local_child(dir, "../escape.txt"), None);
        assert_eq!(local_child(dir, "/etc/passwd"), None);
        assert_eq!(local_child(dir, ".."), None);
    }

    #[test]
    fn test_missing_ancestors() {
        let tmp = tempfile::tempdir().unwrap();
        assert_eq!(missing_ancestors(tmp.path()), 0);
        assert_eq!(missing_ancestors(&tmp.path().join("a/b/c")), 3);
    }
}
