use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy)]
pub struct FileFilter {
    pub name: &'static str,
    pub extensions: &'static [&'static str],
}

pub const IMPORT_FILE_FILTERS: &[FileFilter] = &[FileFilter {
    name: "Spreadsheets",
    extensions: &["csv", "xlsx", "xls"],
}];

/// Host-platform file access. The app shell supplies the dialog-backed
/// implementation; `NativeFileHost` covers headless and test use.
pub trait FileHost: Send + Sync {
    fn read_text(&self, path: &Path) -> Result<String, String>;
    fn read_binary(&self, path: &Path) -> Result<Vec<u8>, String>;
    /// `Ok(None)` means the user cancelled the picker.
    fn pick_file(&self, filters: &[FileFilter]) -> Result<Option<PathBuf>, String>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NativeFileHost;

impl FileHost for NativeFileHost {
    fn read_text(&self, path: &Path) -> Result<String, String> {
        fs::read_to_string(path).map_err(|e| format!("failed to read {}: {e}", path.display()))
    }

    fn read_binary(&self, path: &Path) -> Result<Vec<u8>, String> {
        fs::read(path).map_err(|e| format!("failed to read {}: {e}", path.display()))
    }

    fn pick_file(&self, _filters: &[FileFilter]) -> Result<Option<PathBuf>, String> {
        Err("no file picker available in this environment".to_string())
    }
}

/// Open the host picker constrained to the importable spreadsheet formats.
pub fn pick_import_file(host: &dyn FileHost) -> Result<Option<PathBuf>, String> {
    host.pick_file(IMPORT_FILE_FILTERS)
}
