//! Terminal display of downloaded images. The gallery core only depends on
//! the `Renderer` trait; layout is the display tool's business.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use crossterm::cursor::MoveTo;
use crossterm::execute;
use crossterm::terminal::{Clear, ClearType};

use crate::backend::error::Result;

pub trait Renderer {
    /// Displays every image in `dir`, in filename order.
    fn show_page(&self, dir: &Path) -> Result<()>;
    /// Displays a single image file.
    fn show_single(&self, path: &Path) -> Result<()>;
}

/// Renders images inline through kitty's icat kitten.
pub struct IcatRenderer;

impl IcatRenderer {
    fn clear_screen(&self) -> Result<()> {
        execute!(io::stdout(), Clear(ClearType::All), MoveTo(0, 0))?;
        Ok(())
    }

    fn icat(&self, paths: &[PathBuf]) -> Result<()> {
        let status = Command::new("kitty")
            .args(["+kitten", "icat", "--silent"])
            .args(paths)
            .status()?;
        if !status.success() {
            log::warn!("icat exited with {status}");
        }
        Ok(())
    }
}

impl Renderer for IcatRenderer {
    fn show_page(&self, dir: &Path) -> Result<()> {
        let mut files: Vec<PathBuf> = fs::read_dir(dir)?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_file())
            .collect();
        files.sort();
        if files.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no images in {}", dir.display()),
            )
            .into());
        }
        self.clear_screen()?;
        self.icat(&files)
    }

    fn show_single(&self, path: &Path) -> Result<()> {
        self.clear_screen()?;
        self.icat(&[path.to_path_buf()])
    }
}
