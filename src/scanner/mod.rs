use crate::Result;
use globset::{Glob, GlobSet, GlobSetBuilder};

pub mod local;

pub use local::{walk_local, LocalDir};

/// Exclude patterns, matched against root-relative `/`-separated paths.
///
/// A pattern without a `/` also matches the last path segment anywhere in the
/// tree, the way `.gitignore` patterns do.
#[derive(Debug, Clone)]
pub struct Excludes {
    set: GlobSet,
    empty: bool,
}

impl Excludes {
    pub fn new<I, P>(patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<str>,
    {
        let mut builder = GlobSetBuilder::new();
        let mut empty = true;
        for pattern in patterns {
            builder.add(Glob::new(pattern.as_ref().trim_end_matches('/'))?);
            empty = false;
        }
        Ok(Self { set: builder.build()?, empty })
    }

    pub fn none() -> Self {
        Self { set: GlobSet::empty(), empty: true }
    }

    pub fn is_excluded(&self, relative: &str) -> bool {
        if self.empty || relative.is_empty() {
            return false;
        }
        let relative = relative.trim_end_matches('/');
        let name = relative.rsplit('/').next().unwrap_or(relative);
        self.set.is_match(relative) || self.set.is_match(name)
    }
}

impl Default for Excludes {
    fn default() -> Self {
        Self::none()
    }
}
