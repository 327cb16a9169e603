use log::{error, info, warn};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::errors::CoreError;
use crate::models::holding::Holding;

use super::format;

const MAX_CORRUPT_COPIES: u32 = 100;

/// Reads and writes the holdings file on disk.
///
/// Saves go through a sibling temp file that is fsynced and then renamed
/// over the target, so a crash leaves either the old or the new file,
/// never a truncated one.
#[derive(Debug, Clone)]
pub struct StorageManager {
    path: PathBuf,
}

impl StorageManager {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load holdings, never failing.
    ///
    /// - Missing file → empty list.
    /// - Unreadable or corrupt file → logged, moved aside to `<file>.corrupt`
    ///   so a later save can't overwrite it, empty list.
    pub fn load(&self) -> Vec<Holding> {
        match self.try_load() {
            Ok(Some(holdings)) => {
                info!("Loaded {} holdings from {}", holdings.len(), self.path.display());
                holdings
            }
            Ok(None) => {
                info!("No holdings file at {}, starting empty", self.path.display());
                Vec::new()
            }
            Err(e) => {
                error!("Failed to load holdings from {}: {e}", self.path.display());
                self.quarantine();
                Vec::new()
            }
        }
    }

    /// Strict load: `Ok(None)` when the file does not exist.
    pub fn try_load(&self) -> Result<Option<Vec<Holding>>, CoreError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        format::read_holdings(&bytes).map(Some)
    }

    /// Atomically replace the holdings file.
    pub fn save(&self, holdings: &[Holding]) -> Result<(), CoreError> {
        let bytes = format::write_holdings(holdings)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let tmp = self.temp_path();
        let written = (|| -> std::io::Result<()> {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(&bytes)?;
            file.sync_all()?;
            fs::rename(&tmp, &self.path)
        })();

        if let Err(e) = written {
            let _ = fs::remove_file(&tmp);
            return Err(CoreError::FileIO(format!(
                "Failed to write {}: {e}",
                self.path.display()
            )));
        }
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        sibling_with_suffix(&self.path, ".tmp")
    }

    /// Path the first corrupt holdings file is moved to. Later ones go to
    /// `<file>.corrupt.1`, `<file>.corrupt.2`, ...
    pub fn corrupt_path(&self) -> PathBuf {
        sibling_with_suffix(&self.path, ".corrupt")
    }

    /// First quarantine path not already taken by an earlier corrupt file.
    fn free_corrupt_path(&self) -> Option<PathBuf> {
        let first = self.corrupt_path();
        if !first.exists() {
            return Some(first);
        }
        (1..=MAX_CORRUPT_COPIES)
            .map(|n| sibling_with_suffix(&self.path, &format!(".corrupt.{n}")))
            .find(|candidate| !candidate.exists())
    }

    fn quarantine(&self) {
        if !self.path.exists() {
            return;
        }
        let Some(target) = self.free_corrupt_path() else {
            warn!(
                "Leaving unreadable {} in place: too many earlier corrupt copies",
                self.path.display()
            );
            return;
        };
        match fs::rename(&self.path, &target) {
            Ok(()) => warn!("Moved unreadable holdings file to {}", target.display()),
            Err(e) => warn!("Could not move aside {}: {e}", self.path.display()),
        }
    }
}

fn sibling_with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}
