use crate::scanner::Excludes;
use crate::{FtpTreeError, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// One local directory with the names of its immediate subdirectories and files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalDir {
    pub path: PathBuf,
    pub dirs: Vec<String>,
    pub files: Vec<String>,
}

/// `/`-separated path of `path` below `root`, empty for the root itself.
pub fn relative_path(root: &Path, path: &Path) -> String {
    match path.strip_prefix(root) {
        Ok(rp) => rp.to_string_lossy().replace('\\', "/"),
        Err(_) => String::new(),
    }
}

/// Walk a local tree top-down, one [`LocalDir`] per directory.
///
/// Symlinks are not followed: a link to a directory is reported among `dirs`
/// but not descended into, a link to a file is reported among `files`.
/// Unreadable entries are logged and skipped.
pub fn walk_local(root: &Path, excludes: &Excludes) -> Result<Vec<LocalDir>> {
    if !root.is_dir() {
        return Err(FtpTreeError::Local {
            path: root.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not a directory"),
        });
    }

    let mut dirs: Vec<LocalDir> = Vec::new();
    let mut index: HashMap<PathBuf, usize> = HashMap::new();

    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !excludes.is_excluded(&relative_path(root, e.path())));

    for result in walker {
        let entry = match result {
            Ok(entry) => entry,
            Err(err) => {
                tracing::warn!("Scan error: {}", err);
                continue;
            }
        };
        let path = entry.path();
        let file_type = entry.file_type();

        let (is_dir, is_file) = if file_type.is_symlink() {
            (path.is_dir(), path.is_file())
        } else {
            (file_type.is_dir(), file_type.is_file())
        };

        if file_type.is_dir() {
            index.insert(path.to_path_buf(), dirs.len());
            dirs.push(LocalDir { path: path.to_path_buf(), dirs: Vec::new(), files: Vec::new() });
        }
        if entry.depth() == 0 {
            continue;
        }

        let name = entry.file_name().to_string_lossy().to_string();
        let parent = path.parent().and_then(|p| index.get(p)).copied();
        if let Some(i) = parent {
            if is_dir {
                dirs[i].dirs.push(name);
            } else if is_file {
                dirs[i].files.push(name);
            }
        }
    }

    Ok(dirs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_walk_local_shape() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        fs::write(root.join("f1.txt"), b"one").unwrap();
        fs::create_dir(root.join("sub")).unwrap();
        fs::write(root.join("sub/f2.txt"), b"two").unwrap();
        fs::create_dir(root.join("empty")).unwrap();

        let walked = walk_local(root, &Excludes::none()).unwrap();
        assert_eq!(walked.len(), 3);
        assert_eq!(walked[0].path, root);
        assert_eq!(walked[0].dirs, vec!["empty".to_string(), "sub".to_string()]);
        assert_eq!(walked[0].files, vec!["f1.txt".to_string()]);

        let sub = walked.iter().find(|d| d.path == root.join("sub")).unwrap();
        assert_eq!(sub.files, vec!["f2.txt".to_string()]);

        let empty = walked.iter().find(|d| d.path == root.join("empty")).unwrap();
        assert!(empty.dirs.is_empty() && empty.files.is_empty());
    }

    #[test]
    fn test_walk_local_excludes() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        fs::write(root.join("keep.txt"), b"k").unwrap();
        fs::write(root.join("skip.tmp"), b"s").unwrap();
        fs::create_dir(root.join("build")).unwrap();
        fs::write(root.join("build/out.bin"), b"o").unwrap();

        let ex = Excludes::new(["*.tmp", "build"]).unwrap();
        let walked = walk_local(root, &ex).unwrap();
        assert_eq!(walked.len(), 1);
        assert_eq!(walked[0].files, vec!["keep.txt".to_string()]);
        assert!(walked[0].dirs.is_empty());
    }

    #[test]
    fn test_walk_local_missing_root() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(walk_local(&tmp.path().join("nope"), &Excludes::none()).is_err());
    }

    #[test]
    fn test_relative_path() {
        assert_eq!(relative_path(Path::new("/a/b"), Path::new("/a/b/c/d.txt")), "c/d.txt");
        assert_eq!(relative_path(Path::new("/a/b"), Path::new("/a/b")), "");
    }
}
