use crate::constants::{PROFILES_FILE_NAME, PROFILES_PATH_ENV};
use directories::ProjectDirs;
use std::fs;
use std::path::{Path, PathBuf};

pub struct AppPaths {
    pub data: PathBuf,
    pub profiles: PathBuf,
}

impl AppPaths {
    /// Resolves the profile file: the environment override first, then the
    /// platform data directory, then the working directory.
    pub fn resolve() -> Self {
        let override_path = std::env::var_os(PROFILES_PATH_ENV).map(PathBuf::from);
        Self::from_parts(override_path, Self::project_data_dir())
    }

    fn project_data_dir() -> Option<PathBuf> {
        ProjectDirs::from("com", "deskpins", "DeskPins").map(|dirs| dirs.data_dir().to_path_buf())
    }

    fn from_parts(override_path: Option<PathBuf>, data_dir: Option<PathBuf>) -> Self {
        match (override_path, data_dir) {
            (Some(profiles), _) => Self {
                data: parent_or_current(&profiles),
                profiles,
            },
            (None, Some(data)) => Self {
                profiles: data.join(PROFILES_FILE_NAME),
                data,
            },
            (None, None) => Self {
                data: PathBuf::from("."),
                profiles: PathBuf::from(PROFILES_FILE_NAME),
            },
        }
    }

    pub fn ensure_dirs_exist(&self) -> std::io::Result<()> {
        fs::create_dir_all(&self.data)
    }
}

fn parent_or_current(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_override_wins() {
        let paths = AppPaths::from_parts(
            Some(PathBuf::from("/tmp/pins/custom.json")),
            Some(PathBuf::from("/home/u/.local/share/deskpins")),
        );
        assert_eq!(paths.profiles, PathBuf::from("/tmp/pins/custom.json"));
        assert_eq!(paths.data, PathBuf::from("/tmp/pins"));
    }

    #[test]
    fn test_data_dir_used_without_override() {
        let paths = AppPaths::from_parts(None, Some(PathBuf::from("/data")));
        assert_eq!(paths.profiles, PathBuf::from("/data").join(PROFILES_FILE_NAME));
    }

    #[test]
    fn test_falls_back_to_working_directory() {
        let paths = AppPaths::from_parts(None, None);
        assert_eq!(paths.profiles, PathBuf::from(PROFILES_FILE_NAME));
        assert_eq!(paths.data, PathBuf::from("."));

        let bare = AppPaths::from_parts(Some(PathBuf::from("pins.json")), None);
        assert_eq!(bare.data, PathBuf::from("."));
    }
}
