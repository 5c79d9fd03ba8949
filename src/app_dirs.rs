use crate::config::Backend;
use crate::store::{FileStateStore, SqliteStateStore, StateStore};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    pub fn state_dir() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            Some(
                PathBuf::from(home)
                    .join(".local")
                    .join("state")
                    .join("swipe-stats"),
            )
        } else {
            ProjectDirs::from("", "", "swipe-stats")
                .map(|proj_dirs| proj_dirs.data_local_dir().to_path_buf())
        }
    }

    pub fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "swipe-stats").map(|pd| pd.config_dir().join("config.json"))
    }

    pub fn db_path(state_dir: &Path) -> PathBuf {
        state_dir.join("stats.db")
    }

    pub fn stats_dir(state_dir: &Path) -> PathBuf {
        state_dir.join("stats")
    }

    /// Opens the state store for `backend` rooted at `state_dir`.
    pub fn open_store(backend: Backend, state_dir: &Path) -> crate::Result<Box<dyn StateStore>> {
        Ok(match backend {
            Backend::File => Box::new(FileStateStore::new(Self::stats_dir(state_dir))),
            Backend::Sqlite => Box::new(SqliteStateStore::open(Self::db_path(state_dir))?),
        })
    }
}
