use serde::Deserialize;

/// URLs for one image at the resolutions the service serves.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImageUrls {
    pub preview: String,
    pub full: String,
}

/// One post in a listing. Multi-image posts carry one `ImageUrls` per
/// image in `pages`; single-image posts leave it empty and use `urls`.
#[derive(Debug, Clone, Deserialize)]
pub struct Post {
    pub id: u64,
    pub title: String,
    pub artist_id: u64,
    pub page_count: usize,
    pub urls: ImageUrls,
    #[serde(default)]
    pub pages: Vec<ImageUrls>,
}

impl Post {
    /// Full-resolution URL for each image of the post, in order.
    pub fn full_urls(&self) -> Vec<String> {
        if self.page_count > 1 {
            self.pages.iter().map(|p| p.full.clone()).collect()
        } else {
            vec![self.urls.full.clone()]
        }
    }

    /// The service's public web page for this post.
    pub fn web_url(&self, base: &str) -> String {
        format!("{}/posts/{}", base.trim_end_matches('/'), self.id)
    }
}

/// One page of a paginated feed, immutable once fetched. `next_url` is the
/// opaque continuation token; `None` means end of feed.
#[derive(Debug, Clone, Deserialize)]
pub struct PageListing {
    pub posts: Vec<Post>,
    pub next_url: Option<String>,
}

impl PageListing {
    pub fn has_next(&self) -> bool {
        self.next_url.as_deref().is_some_and(|u| !u.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_continuation_token_means_last_page() {
        let page = PageListing {
            posts: Vec::new(),
            next_url: Some(String::new()),
        };
        assert!(!page.has_next());

        let page = PageListing {
            posts: Vec::new(),
            next_url: Some("https://example.net/v1/users/1/posts?offset=30".into()),
        };
        assert!(page.has_next());
    }

    #[test]
    fn full_urls_prefers_pages_for_multi_image_posts() {
        let post = Post {
            id: 1,
            title: "t".into(),
            artist_id: 2,
            page_count: 2,
            urls: ImageUrls {
                preview: "p".into(),
                full: "f".into(),
            },
            pages: vec![
                ImageUrls {
                    preview: "p0".into(),
                    full: "f0".into(),
                },
                ImageUrls {
                    preview: "p1".into(),
                    full: "f1".into(),
                },
            ],
        };
        assert_eq!(post.full_urls(), vec!["f0", "f1"]);
    }
}
