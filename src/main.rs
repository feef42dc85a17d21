mod backend;
mod ui;

use backend::api::{HttpSource, Publicity, RemoteSource};
use backend::cache::DiskCache;
use backend::config::Config;
use backend::error::Result;
use backend::gallery::{GallerySession, Subject};
use ui::prompt::{self, gallery_prompt};
use ui::render::{IcatRenderer, Renderer};

const MENU: &str = "\
Welcome to gallery-tui!

  [1] browse an artist's gallery (by artist id)
  [2] browse posts from artists you follow
  [q] quit
";

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let config = Config::load()?;
    let source = match config.api_url() {
        Ok(url) => HttpSource::new(url, config.token.clone())?,
        Err(e) => {
            eprintln!("{e}");
            return Ok(());
        }
    };
    let web_base = config
        .web_url
        .clone()
        .unwrap_or_else(|| source.base_url().to_string());
    let disk = DiskCache::new(
        config
            .cache_dir
            .clone()
            .unwrap_or_else(DiskCache::default_root),
    );
    let renderer = IcatRenderer;

    // A CLI argument jumps straight into a mode, once.
    let mut preset = std::env::args().nth(1);

    loop {
        let Some(subject) = select_subject(preset.take())? else {
            break;
        };
        if let Err(e) = run_gallery(&source, &renderer, &disk, subject, &web_base).await {
            // A failed session drops back to the menu instead of crashing.
            log::error!("gallery session failed: {e}");
            println!("Error: {e}");
        }
    }
    Ok(())
}

fn select_subject(mut preset: Option<String>) -> Result<Option<Subject>> {
    loop {
        let input = match preset.take() {
            Some(input) => input,
            None => {
                println!("{MENU}");
                prompt::read_line("Select a mode: ")?
            }
        };
        match input.as_str() {
            "1" => {
                let id = prompt::read_line("Enter the artist id: ")?;
                match id.parse() {
                    Ok(id) => return Ok(Some(Subject::Artist(id))),
                    Err(_) => println!("Invalid artist id!"),
                }
            }
            "2" => {
                let answer = prompt::read_line("Include private follows? [y/N] ")?;
                let publicity = if answer.eq_ignore_ascii_case("y") {
                    Publicity::Private
                } else {
                    Publicity::Public
                };
                return Ok(Some(Subject::Following(publicity)));
            }
            "q" => {
                let answer = prompt::read_line("Are you sure you want to exit? [Y/n] ")?;
                if answer.is_empty() || answer.eq_ignore_ascii_case("y") {
                    return Ok(None);
                }
            }
            "" => {}
            other => match other.parse() {
                // A bare artist id is a shortcut, mainly for the CLI.
                Ok(id) => return Ok(Some(Subject::Artist(id))),
                Err(_) => println!("Invalid command!"),
            },
        }
    }
}

async fn run_gallery<S: RemoteSource, R: Renderer>(
    source: &S,
    renderer: &R,
    disk: &DiskCache,
    subject: Subject,
    web_base: &str,
) -> Result<()> {
    let mut session = GallerySession::new(source, renderer, disk.clone(), subject);
    session.enter().await?;
    gallery_prompt(&mut session, web_base).await
}
