//! Menu source backed by a directory of text files.

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::PathBuf;

use glutenscout_core::{Restaurant, SourceType};
use glutenscout_runtime::{MenuFetch, MenuSource, SourceError};

/// Reads `<dir>/<place_id>.txt` as a restaurant's website menu.
///
/// Restaurants without a place id or without a file have no website.
pub struct DirectoryMenuSource {
    dir: PathBuf,
}

impl DirectoryMenuSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn menu_path(&self, place_id: &str) -> Option<PathBuf> {
        // Place ids come from input files; never let one escape the directory.
        if place_id.is_empty() || place_id.contains(['/', '\\']) || place_id.starts_with('.') {
            return None;
        }
        Some(self.dir.join(format!("{}.txt", place_id)))
    }
}

#[async_trait]
impl MenuSource for DirectoryMenuSource {
    async fn fetch_menu(&self, restaurant: &Restaurant) -> Result<MenuFetch, SourceError> {
        let Some(path) = restaurant
            .place_id
            .as_deref()
            .and_then(|id| self.menu_path(id))
        else {
            return Ok(MenuFetch::NoWebsite);
        };

        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(MenuFetch::Text {
                text: String::from_utf8_lossy(&bytes).into_owned(),
                source: SourceType::Website,
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(MenuFetch::NoWebsite),
            Err(e) => Err(SourceError::Fetch(format!("{}: {}", path.display(), e))),
        }
    }

    fn name(&self) -> &str {
        "directory"
    }
}
