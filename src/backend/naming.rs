//! Deterministic on-disk names for remote images. Pure functions only.

/// Last path segment of a URL, i.e. the remote filename with extension.
pub fn filename_from_url(url: &str) -> String {
    url.rsplit('/').next().unwrap_or(url).to_string()
}

/// Destination name for the `ordinal`-th image of a batch, renamed after its
/// post title: `{ordinal:02}_{title}.{ext}`.
///
/// Zero-padding is two digits, so filename sort order matches batch order for
/// up to 99 items; larger ordinals widen and still produce unique names.
/// Titles are untrusted free text and must never escape the target
/// directory, so path separators are stripped.
pub fn prefix_filename(url: &str, title: &str, ordinal: usize) -> String {
    let old_name = filename_from_url(url);
    let ext = old_name.rsplit('.').next().unwrap_or("jpg");
    format!("{:02}_{}.{}", ordinal, sanitize_title(title), ext)
}

fn sanitize_title(title: &str) -> String {
    title
        .chars()
        .filter(|c| !matches!(c, '/' | '\\' | '\0'))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filename_is_last_url_segment() {
        assert_eq!(
            filename_from_url("https://img.example.net/2026/08/123_p0.jpg"),
            "123_p0.jpg"
        );
        assert_eq!(filename_from_url("plain.png"), "plain.png");
    }

    #[test]
    fn prefix_is_deterministic_and_two_digits() {
        let url = "https://img.example.net/a/456_p0.jpg";
        for ordinal in 0..10 {
            let name = prefix_filename(url, "flowers", ordinal);
            assert_eq!(name, format!("0{}_flowers.jpg", ordinal));
            assert_eq!(name, prefix_filename(url, "flowers", ordinal));
        }
        assert_eq!(prefix_filename(url, "flowers", 29), "29_flowers.jpg");
    }

    #[test]
    fn large_ordinals_widen_without_panicking() {
        let name = prefix_filename("x/a.png", "t", 123);
        assert_eq!(name, "123_t.png");
    }

    #[test]
    fn path_separators_are_stripped_from_titles() {
        let name = prefix_filename("x/a.jpg", "../../etc/passwd", 0);
        assert_eq!(name, "00_....etcpasswd.jpg");
        let name = prefix_filename("x/a.jpg", "a\\b/c", 1);
        assert_eq!(name, "01_abc.jpg");
    }

    #[test]
    fn extension_follows_the_url_not_the_title() {
        assert_eq!(prefix_filename("x/a.png", "pic.jpg", 0), "00_pic.jpg.png");
    }
}
