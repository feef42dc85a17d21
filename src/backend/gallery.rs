//! Gallery controller: disk-first page display, prefetching of the next
//! page, and navigation over one subject's feed.

use std::fs;
use std::path::PathBuf;

use indicatif::ProgressBar;

use crate::backend::api::{PageRequest, Publicity, RemoteSource, with_retries};
use crate::backend::cache::{self, DiskCache, PageCache};
use crate::backend::download;
use crate::backend::error::{Error, Result};
use crate::backend::models::{PageListing, Post};
use crate::backend::naming;
use crate::backend::viewer::ImageViewer;
use crate::ui::render::Renderer;

/// What one gallery session browses: a single artist's posts, or the feed
/// of everyone the user follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subject {
    Artist(u64),
    Following(Publicity),
}

impl Subject {
    pub fn dir_name(&self) -> String {
        match self {
            Subject::Artist(id) => id.to_string(),
            Subject::Following(_) => "following".to_string(),
        }
    }

    pub fn first_request(&self) -> PageRequest {
        match self {
            Subject::Artist(id) => PageRequest::ArtistPage { artist_id: *id },
            Subject::Following(publicity) => PageRequest::FollowingFeed {
                publicity: *publicity,
            },
        }
    }
}

/// One browsing session over one subject. The session cache and the
/// subject's on-disk tree are only ever touched from here; operations are
/// strictly sequential.
pub struct GallerySession<'a, S, R> {
    source: &'a S,
    renderer: &'a R,
    disk: DiskCache,
    subject: Subject,
    pages: PageCache,
    current: u32,
    show_progress: bool,
}

impl<'a, S: RemoteSource, R: Renderer> GallerySession<'a, S, R> {
    pub fn new(source: &'a S, renderer: &'a R, disk: DiskCache, subject: Subject) -> Self {
        Self {
            source,
            renderer,
            disk,
            subject,
            pages: PageCache::new(),
            current: 1,
            show_progress: true,
        }
    }

    pub fn hide_progress(&mut self) {
        self.show_progress = false;
    }

    pub fn current_page(&self) -> u32 {
        self.current
    }

    pub fn cached_pages(&self) -> usize {
        self.pages.len()
    }

    pub fn current_listing(&self) -> Option<&PageListing> {
        self.pages.get(self.current)
    }

    /// Post `number` of the page currently shown.
    pub fn post(&self, number: usize) -> Option<&Post> {
        self.current_listing().and_then(|l| l.posts.get(number))
    }

    fn page_dir(&self, page: u32) -> PathBuf {
        self.disk.page_dir(&self.subject.dir_name(), page)
    }

    async fn fetch_listing(&self, what: &str, request: PageRequest) -> Result<PageListing> {
        let source = self.source;
        with_retries(what, move || {
            let request = request.clone();
            async move { source.fetch_page(request).await }
        })
        .await
    }

    /// Starts the session on page 1. A page directory left over from a
    /// prior session is rendered immediately, before the fresh listing
    /// arrives; the listing is then reconciled against the directory and a
    /// stale directory is deleted and re-downloaded.
    pub async fn enter(&mut self) -> Result<()> {
        self.current = 1;
        let dir = self.page_dir(1);

        let mut shown = false;
        if dir.is_dir() {
            if cache::first_entry(&dir).is_some() {
                self.renderer.show_page(&dir)?;
                shown = true;
            } else {
                // An empty directory is a broken "already downloaded" signal.
                let _ = fs::remove_dir(&dir);
            }
        }

        let listing = self
            .fetch_listing("first page listing", self.subject.first_request())
            .await?;

        if !dir.is_dir() {
            self.download_page(1, &listing).await?;
        } else if let Some(first) = listing.posts.first() {
            let expected = naming::prefix_filename(&first.urls.preview, &first.title, 0);
            if cache::is_stale(&dir, &expected) {
                println!("Cache is outdated, reloading...");
                fs::remove_dir_all(&dir)?;
                self.download_page(1, &listing).await?;
                shown = false;
            }
        }

        self.pages.put(1, listing);
        if !shown {
            self.renderer.show_page(&dir)?;
        }
        self.announce_page();

        // Page 2 is prepared before the user can possibly ask for it.
        self.prefetch_quietly().await
    }

    /// Shows page n+1 from disk, then makes sure the page after it is being
    /// prepared. When the next page's directory is missing the controller
    /// treats the feed as exhausted and stays put.
    pub async fn next_page(&mut self) -> Result<()> {
        let dir = self.page_dir(self.current + 1);
        let advanced = dir.is_dir();
        if advanced {
            self.renderer.show_page(&dir)?;
            self.current += 1;
            self.announce_page();
        } else {
            println!("This is the last page!");
        }

        // next -> prev -> next must not refetch metadata already cached.
        if !self.pages.contains(self.current + 1) {
            match self.prefetch_next_page().await {
                Ok(()) => {}
                Err(Error::LastPage) => {
                    // When navigation already stayed put the message has
                    // been printed once; do not repeat it.
                    if advanced {
                        println!("This is the last page!");
                    }
                }
                Err(e) if e.is_transient() => {
                    // Exhausted retries here usually mean the feed really
                    // ended; degrade instead of aborting the session.
                    log::warn!("prefetch of page {} failed: {e}", self.current + 1);
                    if advanced {
                        println!("This is the last page!");
                    }
                }
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    /// Shows page n-1, always from the session cache and disk; a previous
    /// page was necessarily visited or prefetched already.
    pub fn previous_page(&mut self) -> Result<()> {
        if self.current <= 1 {
            println!("This is the first page!");
            return Ok(());
        }
        let prev = self.current - 1;
        if !self.pages.contains(prev) {
            return Err(Error::State(format!(
                "page {prev} was never cached this session"
            )));
        }
        self.renderer.show_page(&self.page_dir(prev))?;
        self.current = prev;
        self.announce_page();
        Ok(())
    }

    /// Fetches and downloads the page after the current one so forward
    /// navigation is served from disk. Returns `Err(LastPage)` without any
    /// network call when the current page has no continuation token.
    pub async fn prefetch_next_page(&mut self) -> Result<()> {
        let token = self
            .pages
            .get(self.current)
            .ok_or_else(|| {
                Error::State(format!("page {} missing from session cache", self.current))
            })?
            .next_url
            .clone()
            .filter(|t| !t.is_empty())
            .ok_or(Error::LastPage)?;

        let next = self.current + 1;
        let listing = self
            .fetch_listing("next page listing", PageRequest::NextPage { token })
            .await?;
        self.pages.put(next, listing.clone());

        // Images already on disk from a prior session are not re-fetched.
        let dir = self.page_dir(next);
        if !dir.is_dir() {
            self.download_page(next, &listing).await?;
        }
        Ok(())
    }

    async fn prefetch_quietly(&mut self) -> Result<()> {
        match self.prefetch_next_page().await {
            Ok(()) | Err(Error::LastPage) => Ok(()),
            Err(e) if e.is_transient() => {
                log::warn!("prefetch of page {} failed: {e}", self.current + 1);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Deletes everything downloaded for this subject and starts over.
    /// Confirmation happens at the prompt layer before this is called.
    pub async fn reload(&mut self) -> Result<()> {
        self.disk.remove_subject(&self.subject.dir_name())?;
        self.pages.clear();
        self.enter().await
    }

    /// Re-renders the current page, e.g. after backing out of a detail view.
    pub fn redisplay(&self) -> Result<()> {
        self.renderer.show_page(&self.page_dir(self.current))?;
        self.announce_page();
        Ok(())
    }

    /// Opens post `number` of the current page in the detail view, with its
    /// full-resolution images stored under the page's `large/` directory.
    pub async fn view_post(&self, number: usize) -> Result<ImageViewer<'a, S, R>> {
        let post = self
            .post(number)
            .ok_or_else(|| Error::State(format!("no post #{number} on this page")))?;
        let large = self.disk.large_dir(&self.subject.dir_name(), self.current);
        ImageViewer::open(self.source, self.renderer, large, post).await
    }

    /// Verified full-resolution download of post `number` into the user's
    /// download directory.
    pub async fn download_post(&self, number: usize) -> Result<PathBuf> {
        let post = self
            .post(number)
            .ok_or_else(|| Error::State(format!("no post #{number} on this page")))?;
        let url = post
            .full_urls()
            .into_iter()
            .next()
            .ok_or_else(|| Error::State(format!("post #{number} has no images")))?;
        let dest = dirs::download_dir().unwrap_or_else(|| PathBuf::from("."));
        download::download_full_verified(self.source, &dest, &url).await
    }

    async fn download_page(&self, page: u32, listing: &PageListing) -> Result<()> {
        let dir = self.page_dir(page);
        let items = download::page_items(&listing.posts);
        let progress = if self.show_progress {
            ProgressBar::new(items.len() as u64)
        } else {
            ProgressBar::hidden()
        };
        let result = download::download_batch(self.source, &dir, &items, Some(&progress)).await;
        progress.finish_and_clear();
        result
    }

    fn announce_page(&self) {
        if let Some(listing) = self.pages.get(self.current) {
            let notes: Vec<String> = listing
                .posts
                .iter()
                .enumerate()
                .filter(|(_, p)| p.page_count > 1)
                .map(|(i, p)| format!("#{i} has {} pages", p.page_count))
                .collect();
            if !notes.is_empty() {
                println!("{}", notes.join(", "));
            }
        }
        println!("Page {}", self.current);
    }
}
