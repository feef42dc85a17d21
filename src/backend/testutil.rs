//! Shared fakes for module tests: a scriptable remote source and a
//! renderer that records what it was asked to show.

use std::collections::HashMap;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::backend::api::{PageRequest, RemoteSource};
use crate::backend::error::{Error, Result};
use crate::backend::models::{ImageUrls, PageListing, Post};
use crate::ui::render::Renderer;

pub fn request_key(request: &PageRequest) -> String {
    match request {
        PageRequest::ArtistPage { artist_id } => format!("artist:{artist_id}"),
        PageRequest::NextPage { token } => format!("next:{token}"),
        PageRequest::FollowingFeed { publicity } => format!("following:{publicity:?}"),
    }
}

#[derive(Default)]
pub struct MockSource {
    listings: Mutex<HashMap<String, PageListing>>,
    bodies: Mutex<HashMap<String, Vec<u8>>>,
    fail_remaining: Mutex<HashMap<String, usize>>,
    fail_pages: Mutex<HashMap<String, usize>>,
    pub page_calls: AtomicUsize,
    pub byte_calls: AtomicUsize,
}

impl MockSource {
    /// Registers the listing served for `request`.
    pub fn serve(&self, request: &PageRequest, listing: PageListing) {
        self.listings
            .lock()
            .unwrap()
            .insert(request_key(request), listing);
    }

    /// Makes the next `times` fetches of `url` fail with a transient error.
    pub fn fail_url(&self, url: &str, times: usize) {
        self.fail_remaining
            .lock()
            .unwrap()
            .insert(url.to_string(), times);
    }

    /// Makes the next `times` listing fetches for `request` fail with a
    /// transient error.
    pub fn fail_page(&self, request: &PageRequest, times: usize) {
        self.fail_pages
            .lock()
            .unwrap()
            .insert(request_key(request), times);
    }

    pub fn set_body_for(&self, url: &str, bytes: Vec<u8>) {
        self.bodies.lock().unwrap().insert(url.to_string(), bytes);
    }
}

impl RemoteSource for MockSource {
    async fn fetch_page(&self, request: PageRequest) -> Result<PageListing> {
        self.page_calls.fetch_add(1, Ordering::SeqCst);
        let key = request_key(&request);
        if let Some(remaining) = self.fail_pages.lock().unwrap().get_mut(&key) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(Error::Remote(format!("scripted failure for {key}")));
            }
        }
        self.listings
            .lock()
            .unwrap()
            .get(&key)
            .cloned()
            .ok_or(Error::SubjectNotFound(key))
    }

    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>> {
        self.byte_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(remaining) = self.fail_remaining.lock().unwrap().get_mut(url) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(Error::Remote(format!("scripted failure for {url}")));
            }
        }
        Ok(self
            .bodies
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .unwrap_or_else(|| b"imagebytes".to_vec()))
    }
}

/// Renderer that records every directory and file it is asked to display.
#[derive(Default)]
pub struct RecordingRenderer {
    pub pages: Mutex<Vec<PathBuf>>,
    pub singles: Mutex<Vec<PathBuf>>,
}

impl Renderer for RecordingRenderer {
    fn show_page(&self, dir: &Path) -> Result<()> {
        self.pages.lock().unwrap().push(dir.to_path_buf());
        Ok(())
    }

    fn show_single(&self, path: &Path) -> Result<()> {
        self.singles.lock().unwrap().push(path.to_path_buf());
        Ok(())
    }
}

pub fn post(id: u64, title: &str) -> Post {
    Post {
        id,
        title: title.to_string(),
        artist_id: 123,
        page_count: 1,
        urls: ImageUrls {
            preview: format!("https://img.test/{id}_p0.jpg"),
            full: format!("https://img.test/full/{id}.jpg"),
        },
        pages: Vec::new(),
    }
}

/// A listing of posts with ids in `ids`, titled `title{id}`.
pub fn listing(ids: std::ops::Range<u64>, next_url: Option<&str>) -> PageListing {
    PageListing {
        posts: ids.map(|i| post(i, &format!("title{i}"))).collect(),
        next_url: next_url.map(String::from),
    }
}

/// Smallest valid PNG, for tests that exercise image verification.
pub fn tiny_png() -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(image::RgbImage::new(1, 1))
        .write_to(&mut buf, image::ImageFormat::Png)
        .unwrap();
    buf.into_inner()
}
