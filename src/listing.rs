//! Parsing of `ls -l` style directory listing lines.
//!
//! ```text
//! drw-r-----    1 user     user            5 May 23 07:00 dir/
//! -rw-r-----    1 user     user            5 May 23 07:00 file.py
//! ```
//!
//! Field 0 is the mode string, its first character selects the entry kind.
//! Everything after the eighth field is the name. Device lines carry a
//! `major, minor` pair in place of the size, which shifts the name one field.

use crate::{FtpTreeError, Result};

/// Minimum number of whitespace-delimited fields in a listing line.
const LISTING_FIELDS: usize = 9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    Directory,
    File,
    Symlink,
    Fifo,
    Socket,
    Device,
}

impl EntryKind {
    pub const ALL: [EntryKind; 6] = [
        EntryKind::Directory,
        EntryKind::File,
        EntryKind::Symlink,
        EntryKind::Fifo,
        EntryKind::Socket,
        EntryKind::Device,
    ];

    fn from_mode(mode: &str) -> Option<Self> {
        match mode.chars().next()? {
            'd' => Some(EntryKind::Directory),
            '-' => Some(EntryKind::File),
            'l' => Some(EntryKind::Symlink),
            'p' => Some(EntryKind::Fifo),
            's' => Some(EntryKind::Socket),
            'c' | 'b' => Some(EntryKind::Device),
            _ => None,
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub name: String,
    pub kind: EntryKind,
}

/// The first whitespace-delimited field of `s` and what follows it.
fn next_field(s: &str) -> Option<(&str, &str)> {
    let end = s.find(char::is_whitespace)?;
    Some((&s[..end], s[end..].trim_start()))
}

/// Classify one listing line.
pub fn parse_line(line: &str) -> Result<DirectoryEntry> {
    let malformed = || FtpTreeError::MalformedListing(line.to_string());

    let mut rest = line.trim();
    let mut fields = Vec::with_capacity(LISTING_FIELDS);
    while fields.len() < LISTING_FIELDS - 1 {
        let (field, tail) = next_field(rest).ok_or_else(malformed)?;
        fields.push(field);
        rest = tail;
    }
    let kind = EntryKind::from_mode(fields[0]).ok_or_else(malformed)?;

    // crw-rw-rw- 1 root root 1, 3 May 23 07:00 null
    if kind == EntryKind::Device && fields[4].ends_with(',') {
        rest = next_field(rest).ok_or_else(malformed)?.1;
    }
    if rest.is_empty() {
        return Err(malformed());
    }

    let name = match kind {
        EntryKind::Symlink => rest.split_once(" -> ").map_or(rest, |(name, _)| name),
        _ => rest,
    };

    Ok(DirectoryEntry { name: name.to_string(), kind })
}

/// Names from a listing, bucketed by kind. Only requested kinds are kept.
#[derive(Debug, Clone)]
pub struct Listing {
    requested: [bool; 6],
    buckets: [Vec<String>; 6],
}

impl Listing {
    pub fn new(kinds: &[EntryKind]) -> Self {
        let mut requested = [false; 6];
        for kind in kinds {
            requested[kind.index()] = true;
        }
        Self { requested, buckets: Default::default() }
    }

    /// Directories and files only, which is all the walker needs.
    pub fn dirs_and_files() -> Self {
        Self::new(&[EntryKind::Directory, EntryKind::File])
    }

    /// Returns whether the entry landed in a bucket. Unrecognized lines are an
    /// error even if nothing would have been kept.
    pub fn push_line(&mut self, line: &str) -> Result<bool> {
        let entry = parse_line(line)?;
        Ok(self.push(entry))
    }

    pub fn push(&mut self, entry: DirectoryEntry) -> bool {
        let i = entry.kind.index();
        if self.requested[i] {
            self.buckets[i].push(entry.name);
            true
        } else {
            false
        }
    }

    /// Parse a whole listing; the first malformed line aborts it.
    pub fn from_lines<I, L>(kinds: &[EntryKind], lines: I) -> Result<Self>
    where
        I: IntoIterator<Item = L>,
        L: AsRef<str>,
    {
        let mut listing = Self::new(kinds);
        for line in lines {
            listing.push_line(line.as_ref())?;
        }
        Ok(listing)
    }

    pub fn is_requested(&self, kind: EntryKind) -> bool {
        self.requested[kind.index()]
    }

    pub fn names(&self, kind: EntryKind) -> &[String] {
        &self.buckets[kind.index()]
    }

    pub fn take(&mut self, kind: EntryKind) -> Vec<String> {
        std::mem::take(&mut self.buckets[kind.index()])
    }
}
