use directories::ProjectDirs;
use std::env;
use std::path::{Path, PathBuf};

const APP_NAME: &str = "fretlog";
const DB_FILE: &str = "fretlog.db";

/// Where the practice database lives.
pub struct AppDirs;

impl AppDirs {
    /// The `--db` path when given, else the default location, else
    /// `fretlog.db` in the working directory.
    pub fn resolve_db_path(explicit: Option<PathBuf>) -> PathBuf {
        explicit
            .or_else(|| Self::state_dir().map(|dir| dir.join(DB_FILE)))
            .unwrap_or_else(|| PathBuf::from(DB_FILE))
    }

    /// `$HOME/.local/state/fretlog`, or the platform's local data dir when
    /// HOME is unset.
    pub fn state_dir() -> Option<PathBuf> {
        match env::var_os("HOME") {
            Some(home) if !home.is_empty() => Some(state_dir_under(Path::new(&home))),
            _ => ProjectDirs::from("", "", APP_NAME).map(|p| p.data_local_dir().to_path_buf()),
        }
    }
}

fn state_dir_under(home: &Path) -> PathBuf {
    home.join(".local").join("state").join(APP_NAME)
}
