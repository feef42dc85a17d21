//! Line-based command prompts for the gallery and the detail view.

use std::io::{self, Write};

use crate::backend::api::RemoteSource;
use crate::backend::gallery::GallerySession;
use crate::backend::viewer::ImageViewer;
use crate::backend::error::Result;
use crate::ui::render::Renderer;

const GALLERY_HELP: &str = "\
Gallery commands:
  n          view the next page
  p          view the previous page
  v <num>    view image <num> in full resolution
  d <num>    download image <num> in full resolution to your downloads folder
  o <num>    open the post in a browser
  r          delete all cached images, re-download and reload the view
  h          show this help
  b / q      go back to the main menu
";

pub fn read_line(prompt_text: &str) -> Result<String> {
    print!("{prompt_text}");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

pub async fn gallery_prompt<S: RemoteSource, R: Renderer>(
    session: &mut GallerySession<'_, S, R>,
    web_base: &str,
) -> Result<()> {
    loop {
        let line = read_line("Enter a gallery command (h for help): ")?;
        let mut parts = line.split_whitespace();
        let command = parts.next().unwrap_or("");
        let number = parts.next().and_then(|n| n.parse::<usize>().ok());

        match command {
            "" => {}
            "n" => session.next_page().await?,
            "p" => session.previous_page()?,
            "r" => {
                let answer =
                    read_line("This will delete cached images and redownload them. Proceed? [Y/n] ")?;
                if answer.is_empty() || answer.eq_ignore_ascii_case("y") {
                    session.reload().await?;
                }
            }
            "v" => match number {
                Some(n) if session.post(n).is_some() => {
                    let viewer = session.view_post(n).await?;
                    image_prompt(viewer).await?;
                    session.redisplay()?;
                }
                _ => println!("Invalid number!"),
            },
            "d" => match number {
                Some(n) if session.post(n).is_some() => match session.download_post(n).await {
                    Ok(path) => println!("Image downloaded at {}", path.display()),
                    Err(e) => println!("Download failed: {e}"),
                },
                _ => println!("Invalid number!"),
            },
            "o" => match number.and_then(|n| session.post(n)) {
                Some(post) => {
                    let link = post.web_url(web_base);
                    webbrowser::open(&link)?;
                    println!("Opened {link}!");
                }
                None => println!("Invalid number!"),
            },
            "h" | "m" => println!("{GALLERY_HELP}"),
            "b" | "q" => return Ok(()),
            _ => println!("Invalid command! Press h to show help"),
        }
    }
}

async fn image_prompt<S: RemoteSource, R: Renderer>(
    mut viewer: ImageViewer<'_, S, R>,
) -> Result<()> {
    loop {
        let line = read_line("Image command (n/p/b): ")?;
        match line.as_str() {
            "n" => viewer.next_image().await?,
            "p" => viewer.previous_image().await?,
            "h" => println!("n: next image, p: previous image, b: back to the gallery"),
            "b" | "q" | "" => return Ok(()),
            _ => println!("Invalid command!"),
        }
    }
}
