pub mod file;
pub mod mkdirs;
pub mod walk;

pub use file::RemoteFile;
pub use mkdirs::{create_directory, ensure_directory, remaining_directory, DirOutcome, MkdirsReport};
pub use walk::{list_dir, Walk, WalkEntry};

/// Join two remote path fragments with `/`. An absolute `name` replaces `base`.
pub fn join(base: &str, name: &str) -> String {
    if base.is_empty() || name.starts_with('/') {
        name.to_string()
    } else if name.is_empty() {
        base.to_string()
    } else if base.ends_with('/') {
        format!("{}{}", base, name)
    } else {
        format!("{}/{}", base, name)
    }
}

/// Split off the last segment: `"/a/b"` -> `("/a", "b")`, `"/a"` -> `("/", "a")`,
/// `"a"` -> `("", "a")`. Trailing slashes are ignored.
pub fn split(path: &str) -> (&str, &str) {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        // "/" or ""
        return (&path[..path.len().min(1)], "");
    }
    match trimmed.rfind('/') {
        Some(0) => ("/", &trimmed[1..]),
        Some(i) => (&trimmed[..i], &trimmed[i + 1..]),
        None => ("", trimmed),
    }
}

/// Whether a listed name names exactly one entry inside its directory. The
/// trailing `/` some servers append to directories is allowed; `.`, `..`,
/// absolute names and names with an inner `/` are not.
pub fn is_child_name(name: &str) -> bool {
    let name = name.trim_end_matches('/');
    !name.is_empty() && name != "." && name != ".." && !name.contains('/')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join() {
        assert_eq!(join("/a", "b"), "/a/b");
        assert_eq!(join("/a/", "b"), "/a/b");
        assert_eq!(join("", "b"), "b");
        assert_eq!(join("/a", "/x"), "/x");
        assert_eq!(join("/a", ""), "/a");
    }

    #[test]
    fn test_split() {
        assert_eq!(split("/a/b/c"), ("/a/b", "c"));
        assert_eq!(split("/a/b/"), ("/a", "b"));
        assert_eq!(split("/a"), ("/", "a"));
        assert_eq!(split("a"), ("", "a"));
        assert_eq!(split("a/b"), ("a", "b"));
        assert_eq!(split("/"), ("/", ""));
        assert_eq!(split(""), ("", ""));
    }

    #[test]
    fn test_is_child_name() {
        assert!(is_child_name("file.py"));
        assert!(is_child_name("dir/"));
        assert!(is_child_name("my notes.txt"));
        assert!(!is_child_name("."));
        assert!(!is_child_name("../"));
        assert!(!is_child_name("../escape.txt"));
        assert!(!is_child_name("/etc/passwd"));
        assert!(!is_child_name("a/b"));
        assert!(!is_child_name("/"));
        assert!(!is_child_name(""));
    }
}
