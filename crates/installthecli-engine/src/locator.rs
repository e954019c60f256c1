//! Executable lookup on the search path plus known install directories

use std::path::{Path, PathBuf};

use installthecli_core::get_home_dir;

/// Finds executables by name
pub trait ToolLocator: Send + Sync {
    /// Locate `name`, searching `extra_dirs` before everything else
    fn locate_in(&self, name: &str, extra_dirs: &[PathBuf]) -> Option<PathBuf>;

    /// Locate `name` on the default search path
    fn locate(&self, name: &str) -> Option<PathBuf> {
        self.locate_in(name, &[])
    }

    /// First of `names` that resolves, with its path
    fn locate_first(&self, names: &[String], extra_dirs: &[PathBuf]) -> Option<PathBuf> {
        names.iter().find_map(|n| self.locate_in(n, extra_dirs))
    }
}

/// Locator backed by `which`, searching PATH and then known install directories
#[derive(Debug, Clone)]
pub struct PathLocator {
    known_dirs: Vec<PathBuf>,
}

impl Default for PathLocator {
    fn default() -> Self {
        Self::new()
    }
}

impl PathLocator {
    /// Locator with the platform's known install directories
    pub fn new() -> Self {
        Self {
            known_dirs: known_install_dirs(),
        }
    }

    /// Locator with an explicit list of fallback directories
    pub fn with_dirs(known_dirs: Vec<PathBuf>) -> Self {
        Self { known_dirs }
    }

    /// Fallback directories searched after PATH
    pub fn known_dirs(&self) -> &[PathBuf] {
        &self.known_dirs
    }
}

impl ToolLocator for PathLocator {
    fn locate_in(&self, name: &str, extra_dirs: &[PathBuf]) -> Option<PathBuf> {
        let inherited = std::env::var_os("PATH").unwrap_or_default();
        let dirs: Vec<PathBuf> = extra_dirs
            .iter()
            .cloned()
            .chain(std::env::split_paths(&inherited))
            .chain(self.known_dirs.iter().cloned())
            .collect();
        let search = std::env::join_paths(dirs).ok()?;
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        which::which_in(name, Some(search), cwd).ok()
    }
}

/// Directories where the catalog's tools commonly land but which may not be on PATH yet
pub fn known_install_dirs() -> Vec<PathBuf> {
    let mut dirs = Vec::new();

    if cfg!(windows) {
        if let Some(appdata) = std::env::var_os("AppData") {
            let appdata = PathBuf::from(appdata);
            dirs.push(appdata.join("npm"));
            dirs.push(appdata.join("Python").join("Python314").join("Scripts"));
        }
        let program_files =
            std::env::var_os("ProgramFiles").unwrap_or_else(|| "C:\\Program Files".into());
        dirs.push(Path::new(&program_files).join("nodejs"));
        if let Some(local) = std::env::var_os("LocalAppData") {
            let local = PathBuf::from(local);
            dirs.push(local.join("Programs").join("Ollama"));
            dirs.push(
                local
                    .join("Programs")
                    .join("Python")
                    .join("Python314")
                    .join("Scripts"),
            );
        }
        dirs.push(Path::new(&program_files).join("Ollama"));
    } else {
        if let Some(home) = get_home_dir() {
            dirs.push(home.join(".local").join("bin"));
        }
        dirs.push(PathBuf::from("/usr/local/bin"));
        dirs.push(PathBuf::from("/usr/bin"));
    }

    dirs
}
