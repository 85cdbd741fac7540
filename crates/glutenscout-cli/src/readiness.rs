//! Readiness backed by a resource directory on disk.

use std::path::PathBuf;

use glutenscout_core::ResourceReadiness;

/// Ready once `path` exists as a directory.
///
/// Deployments that ship analysis resources (translation models and the
/// like) point `--resources` at the directory they are installed into.
pub struct ResourceDirReadiness {
    path: PathBuf,
    name: String,
}

impl ResourceDirReadiness {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = format!("resource directory {}", path.display());
        Self { path, name }
    }
}

impl ResourceReadiness for ResourceDirReadiness {
    fn is_ready(&self) -> bool {
        self.path.is_dir()
    }

    fn resource_name(&self) -> &str {
        &self.name
    }
}
