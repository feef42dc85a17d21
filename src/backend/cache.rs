//! Session-scoped page cache and the on-disk image cache layout.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::backend::error::Result;
use crate::backend::models::PageListing;

/// In-memory map of page number (1-based) to its listing, living for one
/// gallery session. Grows monotonically as the user pages forward; no
/// eviction. Realistic sessions see a handful of pages.
#[derive(Debug, Default)]
pub struct PageCache {
    pages: HashMap<u32, PageListing>,
}

impl PageCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, page: u32) -> Option<&PageListing> {
        self.pages.get(&page)
    }

    pub fn put(&mut self, page: u32, listing: PageListing) {
        self.pages.insert(page, listing);
    }

    pub fn contains(&self, page: u32) -> bool {
        self.pages.contains_key(&page)
    }

    /// True iff page `page` is cached and carries a continuation token.
    pub fn has_next(&self, page: u32) -> bool {
        self.get(page).is_some_and(PageListing::has_next)
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn clear(&mut self) {
        self.pages.clear();
    }
}

/// Paths into the on-disk cache: `{root}/{subject}/{page}/` holds one page's
/// preview images, with `large/` underneath for upgraded-resolution images.
/// Presence of a page directory is trusted as "fully downloaded in a prior
/// session" unless the staleness check says otherwise.
#[derive(Debug, Clone)]
pub struct DiskCache {
    root: PathBuf,
}

impl DiskCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn default_root() -> PathBuf {
        dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("gallery-tui")
    }

    pub fn subject_dir(&self, subject: &str) -> PathBuf {
        self.root.join(subject)
    }

    pub fn page_dir(&self, subject: &str, page: u32) -> PathBuf {
        self.subject_dir(subject).join(page.to_string())
    }

    pub fn large_dir(&self, subject: &str, page: u32) -> PathBuf {
        self.page_dir(subject, page).join("large")
    }

    pub fn remove_subject(&self, subject: &str) -> Result<()> {
        let dir = self.subject_dir(subject);
        if dir.is_dir() {
            fs::remove_dir_all(&dir)?;
        }
        Ok(())
    }
}

/// First regular file of a directory in sorted order, the anchor for the
/// staleness check.
pub fn first_entry(dir: &Path) -> Option<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .ok()?
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_file())
        .filter_map(|e| e.file_name().into_string().ok())
        .collect();
    names.sort();
    names.into_iter().next()
}

/// A previously downloaded page is stale when its first file on disk is not
/// the file the fresh listing expects, meaning the feed has shifted since
/// the page was cached.
pub fn is_stale(dir: &Path, expected_first: &str) -> bool {
    match first_entry(dir) {
        Some(actual) => actual != expected_first,
        // Directory exists but holds no files; redownload.
        None => true,
    }
}
