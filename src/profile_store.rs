//! JSON persistence of the profile list.
//!
//! The whole list is rewritten on every save. A missing or unreadable file loads as
//! an empty list; the caller only sees a diagnostic.

use crate::error::ProfileStoreError;
use crate::profile::Profiles;
use std::fs::File;
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

pub struct ProfileStore {
    path: PathBuf,
}

impl ProfileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the profile list, substituting an empty list for any failure.
    pub fn load(&self) -> Profiles {
        match self.try_load() {
            Ok(mut profiles) => {
                let dropped = profiles.dedup_names();
                if dropped > 0 {
                    log::warn!(
                        "Ignoring {dropped} duplicate profile name(s) in {}",
                        self.path.display()
                    );
                }
                profiles
            }
            Err(ProfileStoreError::Io { source, .. }) if source.kind() == ErrorKind::NotFound => {
                log::info!(
                    "No profile file at {}, starting with no profiles",
                    self.path.display()
                );
                Profiles::default()
            }
            Err(err) => {
                log::warn!("{err}; starting with no profiles");
                Profiles::default()
            }
        }
    }

    pub fn try_load(&self) -> Result<Profiles, ProfileStoreError> {
        let file = File::open(&self.path).map_err(|source| ProfileStoreError::Io {
            path: self.path.clone(),
            source,
        })?;
        serde_json::from_reader(BufReader::new(file)).map_err(|source| ProfileStoreError::Json {
            path: self.path.clone(),
            source,
        })
    }

    /// Overwrites the file with the full list, pretty-printed.
    pub fn save(&self, profiles: &Profiles) -> Result<(), ProfileStoreError> {
        let io_err = |source| ProfileStoreError::Io {
            path: self.path.clone(),
            source,
        };
        let file = File::create(&self.path).map_err(io_err)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, profiles).map_err(|source| {
            ProfileStoreError::Json {
                path: self.path.clone(),
                source,
            }
        })?;
        writer.flush().map_err(io_err)?;
        log::debug!(
            "Saved {} profile(s) to {}",
            profiles.len(),
            self.path.display()
        );
        Ok(())
    }
}
