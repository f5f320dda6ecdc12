//! Temporary deps directories.

use anyhow::Result;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::config::{Endpoints, Settings};
use crate::constants::GEN_SUBDIR;

/// A deps directory with `deps.jsonc`, `build_deps.jsonc` and `gen/`, removed
/// on drop.
pub struct DepsDir {
    temp: TempDir,
}

impl DepsDir {
    /// Create the directory with both lists empty.
    pub fn new() -> Result<Self> {
        let dir = Self {
            temp: TempDir::new()?,
        };
        dir.write_deps(r#"{"repositories": []}"#)?;
        dir.write_build_deps(r#"{"repositories": []}"#)?;
        Ok(dir)
    }

    /// Deps directory path.
    pub fn path(&self) -> &Path {
        self.temp.path()
    }

    /// Generated output directory.
    pub fn gen_dir(&self) -> PathBuf {
        self.temp.path().join(GEN_SUBDIR)
    }

    /// Replace `deps.jsonc`.
    pub fn write_deps(&self, content: &str) -> Result<()> {
        std::fs::write(self.temp.path().join("deps.jsonc"), content)?;
        Ok(())
    }

    /// Replace `build_deps.jsonc`.
    pub fn write_build_deps(&self, content: &str) -> Result<()> {
        std::fs::write(self.temp.path().join("build_deps.jsonc"), content)?;
        Ok(())
    }

    /// Read a generated file by name, e.g. `dep_foo.bzl`.
    pub fn read_gen(&self, name: &str) -> Result<String> {
        Ok(std::fs::read_to_string(self.gen_dir().join(name))?)
    }

    /// Whether a generated file exists.
    pub fn gen_exists(&self, name: &str) -> bool {
        self.gen_dir().join(name).exists()
    }

    /// Settings pointing every endpoint at `base`, without a token.
    pub fn settings(&self, base: &str) -> Settings {
        Settings::new(self.path()).with_endpoints(Endpoints::single_host(base))
    }
}
