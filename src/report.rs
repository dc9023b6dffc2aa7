//! Plain-text report files

use crate::error::Result;
use std::fs;
use std::path::{Path, PathBuf};

/// Write `text` to `<dir>/<stem>_<YYYYMMDD_HHMMSS>.txt`, creating `dir` if needed.
pub fn save_report(dir: &Path, stem: &str, text: &str) -> Result<PathBuf> {
    if !dir.exists() {
        fs::create_dir_all(dir)?;
    }

    let ts = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let path = dir.join(format!("{}_{}.txt", stem, ts));
    fs::write(&path, text)?;

    tracing::info!(path = %path.display(), "report saved");
    Ok(path)
}

/// Write `text` to an explicit path
pub fn save_to(path: &Path, text: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, text)?;
    Ok(())
}
