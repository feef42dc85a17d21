//! Detail view of one post: full-resolution images shown one at a time,
//! with the image after the shown one downloaded ahead of the keypress
//! that will ask for it.

use std::path::PathBuf;

use crate::backend::api::RemoteSource;
use crate::backend::download;
use crate::backend::error::{Error, Result};
use crate::backend::models::Post;
use crate::ui::render::Renderer;

pub struct ImageViewer<'a, S, R> {
    source: &'a S,
    renderer: &'a R,
    dir: PathBuf,
    urls: Vec<String>,
    index: usize,
}

impl<'a, S: RemoteSource, R: Renderer> ImageViewer<'a, S, R> {
    /// Downloads and shows the post's first full-resolution image, then
    /// preloads the second one of a multi-image post.
    pub async fn open(source: &'a S, renderer: &'a R, dir: PathBuf, post: &Post) -> Result<Self> {
        let urls = post.full_urls();
        // A post can claim several pages but list none of them; the wire
        // data is not trusted to keep `page_count` and `pages` consistent.
        if urls.is_empty() {
            return Err(Error::State(format!("post {} lists no images", post.id)));
        }
        let viewer = Self {
            source,
            renderer,
            dir,
            urls,
            index: 0,
        };
        viewer.show_current().await?;
        viewer.preload_following().await;
        Ok(viewer)
    }

    pub fn image_count(&self) -> usize {
        self.urls.len()
    }

    pub fn current_image(&self) -> usize {
        self.index
    }

    async fn show_current(&self) -> Result<()> {
        let path = download::download_single(self.source, &self.dir, &self.urls[self.index]).await?;
        self.renderer.show_single(&path)?;
        if self.urls.len() > 1 {
            println!("Image {}/{}", self.index + 1, self.urls.len());
        }
        Ok(())
    }

    /// Best-effort download of the next image so the next keypress is
    /// served from disk. Failures only log; the shown image is unaffected.
    async fn preload_following(&self) {
        if let Some(url) = self.urls.get(self.index + 1) {
            if let Err(e) = download::download_single(self.source, &self.dir, url).await {
                log::warn!("preload of the next image failed: {e}");
            }
        }
    }

    pub async fn next_image(&mut self) -> Result<()> {
        if self.index + 1 >= self.urls.len() {
            println!("This is the last image!");
            return Ok(());
        }
        self.index += 1;
        self.show_current().await?;
        self.preload_following().await;
        Ok(())
    }

    pub async fn previous_image(&mut self) -> Result<()> {
        if self.index == 0 {
            println!("This is the first image!");
            return Ok(());
        }
        self.index -= 1;
        self.show_current().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::models::ImageUrls;
    use crate::backend::testutil::{MockSource, RecordingRenderer};
    use std::sync::atomic::Ordering;

    fn multi_image_post(images: usize) -> Post {
        Post {
            id: 9,
            title: "set".into(),
            artist_id: 123,
            page_count: images,
            urls: ImageUrls {
                preview: "https://img.test/9_p0.jpg".into(),
                full: "https://img.test/full/9_p0.jpg".into(),
            },
            pages: (0..images)
                .map(|i| ImageUrls {
                    preview: format!("https://img.test/9_p{i}.jpg"),
                    full: format!("https://img.test/full/9_p{i}.jpg"),
                })
                .collect(),
        }
    }

    #[tokio::test]
    async fn opening_shows_the_first_image_and_preloads_the_second() {
        let source = MockSource::default();
        let renderer = RecordingRenderer::default();
        let dir = tempfile::tempdir().unwrap();

        let mut viewer = ImageViewer::open(
            &source,
            &renderer,
            dir.path().to_path_buf(),
            &multi_image_post(3),
        )
        .await
        .unwrap();

        assert_eq!(viewer.image_count(), 3);
        assert_eq!(source.byte_calls.load(Ordering::SeqCst), 2);
        assert!(dir.path().join("9_p0.jpg").exists());
        assert!(dir.path().join("9_p1.jpg").exists());

        // The second image comes from disk; only the third is new traffic.
        viewer.next_image().await.unwrap();
        assert_eq!(viewer.current_image(), 1);
        assert_eq!(source.byte_calls.load(Ordering::SeqCst), 3);

        viewer.next_image().await.unwrap();
        assert_eq!(source.byte_calls.load(Ordering::SeqCst), 3);

        // Past the end: stay on the last image.
        viewer.next_image().await.unwrap();
        assert_eq!(viewer.current_image(), 2);

        viewer.previous_image().await.unwrap();
        assert_eq!(viewer.current_image(), 1);
        assert_eq!(source.byte_calls.load(Ordering::SeqCst), 3);
        assert_eq!(renderer.singles.lock().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn post_claiming_pages_but_listing_none_is_an_error_not_a_panic() {
        let source = MockSource::default();
        let renderer = RecordingRenderer::default();
        let dir = tempfile::tempdir().unwrap();

        let post = Post {
            pages: Vec::new(),
            ..multi_image_post(2)
        };
        let result = ImageViewer::open(&source, &renderer, dir.path().to_path_buf(), &post).await;
        assert!(matches!(result, Err(Error::State(_))));
        assert_eq!(source.byte_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn single_image_posts_fetch_exactly_one_file() {
        let source = MockSource::default();
        let renderer = RecordingRenderer::default();
        let dir = tempfile::tempdir().unwrap();

        let post = Post {
            pages: Vec::new(),
            page_count: 1,
            ..multi_image_post(1)
        };
        ImageViewer::open(&source, &renderer, dir.path().to_path_buf(), &post)
            .await
            .unwrap();
        assert_eq!(source.byte_calls.load(Ordering::SeqCst), 1);
    }
}
