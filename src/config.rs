//! Optional on-disk defaults for strip count, fuzz window, and root
//! directory, loaded from a TOML file the way the teacher persists
//! settings (`internal::ai::hooks::config::HookConfig`), via `toml` +
//! `serde` rather than a hand-rolled parser. CLI flags always take
//! precedence over a loaded config; a config supplies defaults only.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// The file name looked up in a target directory by [`PatchworkConfig::load_or_default`].
pub const FILE_NAME: &str = ".patchworkrc.toml";

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct PatchworkConfig {
    #[serde(default)]
    pub strip: Option<usize>,
    #[serde(default)]
    pub fuzz: Option<usize>,
    #[serde(default)]
    pub root: Option<PathBuf>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

impl PatchworkConfig {
    /// Load and parse a config file at an explicit path.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let cfg: PatchworkConfig = toml::from_str(&text)?;
        Ok(cfg)
    }

    /// Look for `.patchworkrc.toml` directly inside `dir`. Returns the
    /// default (all-`None`) config if the file is absent; a malformed file
    /// is logged and treated the same as absent, since config is a
    /// convenience layer, not a correctness requirement.
    pub fn load_or_default(dir: &Path) -> Self {
        let candidate = dir.join(FILE_NAME);
        if !candidate.is_file() {
            return Self::default();
        }
        match Self::load(&candidate) {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::warn!(path = %candidate.display(), error = %e, "ignoring malformed config file");
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn loads_present_values() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join(FILE_NAME), "strip = 1\nfuzz = 2\n").unwrap();
        let cfg = PatchworkConfig::load_or_default(dir.path());
        assert_eq!(cfg.strip, Some(1));
        assert_eq!(cfg.fuzz, Some(2));
        assert_eq!(cfg.root, None);
    }

    #[test]
    fn absent_file_yields_default() {
        let dir = tempdir().unwrap();
        let cfg = PatchworkConfig::load_or_default(dir.path());
        assert_eq!(cfg, PatchworkConfig::default());
    }

    #[test]
    fn malformed_file_yields_default_instead_of_panicking() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join(FILE_NAME), "not valid toml {{{").unwrap();
        let cfg = PatchworkConfig::load_or_default(dir.path());
        assert_eq!(cfg, PatchworkConfig::default());
    }
}
