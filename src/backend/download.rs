//! Concurrent batch downloads with skip-if-exists semantics and bounded
//! retries. Each batch spins up its own worker pool and is awaited to
//! completion before returning; there is no persistent background pool.

use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use futures::StreamExt;
use futures::stream;
use indicatif::ProgressBar;

use crate::backend::api::{RemoteSource, with_retries};
use crate::backend::error::{Error, Result};
use crate::backend::models::Post;
use crate::backend::naming;

/// Ceiling on parallel downloads within one batch.
const MAX_PARALLEL: usize = 30;

/// One file to fetch: the as-downloaded name and, for batch renames, the
/// final name derived from the post title.
#[derive(Debug, Clone)]
pub struct DownloadItem {
    pub url: String,
    pub name: String,
    pub rename_to: Option<String>,
}

impl DownloadItem {
    pub fn plain(url: &str) -> Self {
        Self {
            url: url.to_string(),
            name: naming::filename_from_url(url),
            rename_to: None,
        }
    }

    pub fn renamed(url: &str, title: &str, ordinal: usize) -> Self {
        Self {
            url: url.to_string(),
            name: naming::filename_from_url(url),
            rename_to: Some(naming::prefix_filename(url, title, ordinal)),
        }
    }

    /// The name whose presence on disk makes this item a no-op.
    pub fn final_name(&self) -> &str {
        self.rename_to.as_deref().unwrap_or(&self.name)
    }
}

/// Items for one gallery page: every post's preview image, renamed after
/// its title so filename sort order matches listing order.
pub fn page_items(posts: &[Post]) -> Vec<DownloadItem> {
    posts
        .iter()
        .enumerate()
        .map(|(i, post)| DownloadItem::renamed(&post.urls.preview, &post.title, i))
        .collect()
}

/// Downloads every item whose final name is not already present in `dir`.
///
/// Items are fetched in parallel up to `MAX_PARALLEL` at a time and all
/// tasks are joined before this returns. A single file failing (after its
/// retries) does not cancel the rest of the batch; the first error is
/// reported once everything has settled. The progress bar is bumped once
/// per successfully written file.
pub async fn download_batch<S: RemoteSource>(
    source: &S,
    dir: &Path,
    items: &[DownloadItem],
    progress: Option<&ProgressBar>,
) -> Result<()> {
    fs::create_dir_all(dir)?;

    let pending: Vec<&DownloadItem> = items
        .iter()
        .filter(|item| !dir.join(item.final_name()).exists())
        .collect();
    if pending.is_empty() {
        log::info!("all {} files already cached in {}", items.len(), dir.display());
        return Ok(());
    }
    log::info!(
        "downloading {} of {} files into {}",
        pending.len(),
        items.len(),
        dir.display()
    );

    let workers = pending.len().min(MAX_PARALLEL);
    let mut tasks = stream::iter(pending.into_iter().map(|item| async move {
        let outcome = download_one(source, dir, item).await;
        match &outcome {
            Ok(()) => {
                if let Some(pb) = progress {
                    pb.inc(1);
                }
            }
            Err(e) => log::warn!("download of {} failed: {e}", item.url),
        }
        outcome
    }))
    .buffer_unordered(workers);

    let mut first_error = None;
    while let Some(result) = tasks.next().await {
        if let Err(e) = result {
            if first_error.is_none() {
                first_error = Some(e);
            }
        }
    }
    match first_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

/// Fetches a single URL into `dir` under its remote filename, skipping the
/// network entirely when the file already exists.
pub async fn download_single<S: RemoteSource>(
    source: &S,
    dir: &Path,
    url: &str,
) -> Result<PathBuf> {
    let item = DownloadItem::plain(url);
    let path = dir.join(&item.name);
    fs::create_dir_all(dir)?;
    if !path.exists() {
        download_one(source, dir, &item).await?;
    }
    Ok(path)
}

/// One file: retried fetch into a `.part` file, then an atomic rename to
/// the final name. A failed download never leaves a partial or renamed
/// file behind.
async fn download_one<S: RemoteSource>(source: &S, dir: &Path, item: &DownloadItem) -> Result<()> {
    let final_path = dir.join(item.final_name());
    let part_path = dir.join(format!("{}.part", item.name));

    let part = part_path.as_path();
    let url = item.url.as_str();
    let fetched = with_retries(url, move || async move {
        let bytes = source.fetch_bytes(url).await?;
        fs::write(part, &bytes)?;
        Ok(())
    })
    .await;

    if let Err(e) = fetched {
        let _ = fs::remove_file(&part_path);
        return Err(e);
    }
    fs::rename(&part_path, &final_path)?;
    Ok(())
}

/// Downloads a full-resolution image and verifies that the bytes decode.
/// If they do not, the file is dropped and the `.png` variant of the URL is
/// tried once; some services store originals as PNG behind a JPG-named URL.
pub async fn download_full_verified<S: RemoteSource>(
    source: &S,
    dest_dir: &Path,
    url: &str,
) -> Result<PathBuf> {
    match download_verified_once(source, dest_dir, url).await {
        Err(Error::CorruptImage(_)) => {
            let png_url = swap_extension_to_png(url);
            log::warn!("image did not verify, retrying as png: {png_url}");
            download_verified_once(source, dest_dir, &png_url).await
        }
        other => other,
    }
}

async fn download_verified_once<S: RemoteSource>(
    source: &S,
    dest_dir: &Path,
    url: &str,
) -> Result<PathBuf> {
    let path = download_single(source, dest_dir, url).await?;
    verify_image(&path)?;
    Ok(path)
}

fn verify_image(path: &Path) -> Result<()> {
    let bytes = fs::read(path)?;
    let decoded = image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()?
        .decode();
    if decoded.is_err() {
        let _ = fs::remove_file(path);
        return Err(Error::CorruptImage(path.to_path_buf()));
    }
    Ok(())
}

fn swap_extension_to_png(url: &str) -> String {
    match url.rsplit_once('.') {
        Some((stem, _)) => format!("{stem}.png"),
        None => format!("{url}.png"),
    }
}
