//! Writing generated fragments to the `gen/` directory.
//!
//! Layout after a run:
//!
//! ```text
//! build/deps/gen/
//! ├── deps.bzl              # aggregate for deps.jsonc
//! ├── build_deps.bzl        # aggregate for build_deps.jsonc
//! ├── dep_capnp_cpp.bzl     # one fragment per dependency
//! └── ...
//! ```
//!
//! Fragments carry their resolved reference as a `COMMIT`, `TAG_NAME` or
//! `VERSION` constant. [`read_provenance`] reads those back without touching
//! the network.

use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tokio::fs;
use tracing::{debug, warn};

use crate::constants::AUTOGENERATED_MARKER;
use crate::core::PinError;
use crate::resolver::{Reference, ResolvedDependency};
use crate::templating::FragmentRenderer;

static PROVENANCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^(COMMIT|TAG_NAME|VERSION) = "([^"\n]*)"$"#).expect("provenance regex is valid")
});

/// Writes fragments for one `gen/` directory.
#[derive(Debug)]
pub struct Emitter {
    gen_dir: PathBuf,
    renderer: FragmentRenderer,
    dry_run: bool,
}

impl Emitter {
    /// Create an emitter. With `dry_run`, everything is rendered but nothing is
    /// written or deleted.
    pub fn new(gen_dir: impl Into<PathBuf>, dry_run: bool) -> Result<Self, PinError> {
        Ok(Self {
            gen_dir: gen_dir.into(),
            renderer: FragmentRenderer::new()?,
            dry_run,
        })
    }

    /// Output directory.
    #[must_use]
    pub fn gen_dir(&self) -> &Path {
        &self.gen_dir
    }

    /// Path of the fragment defining `macro_name`.
    #[must_use]
    pub fn fragment_path(&self, macro_name: &str) -> PathBuf {
        self.gen_dir.join(format!("{macro_name}.bzl"))
    }

    /// Delete every previously generated `.bzl` file, aggregates included.
    /// Returns how many files were removed.
    pub async fn clean_stale(&self) -> Result<usize, PinError> {
        let files = bzl_files(&self.gen_dir)?;
        if self.dry_run {
            debug!(count = files.len(), "dry run: keeping stale fragments");
            return Ok(0);
        }
        for file in &files {
            fs::remove_file(file).await.map_err(|e| PinError::io("removing", file, &e))?;
        }
        debug!(count = files.len(), dir = %self.gen_dir.display(), "removed stale fragments");
        Ok(files.len())
    }

    /// Render and write the fragment of one dependency.
    pub async fn write_fragment(&self, dep: &ResolvedDependency) -> Result<PathBuf, PinError> {
        let content = self.renderer.render_dependency(dep)?;
        let path = self.fragment_path(&dep.macro_name);
        self.write(&path, &content).await?;
        Ok(path)
    }

    /// Render and write the aggregate of one list.
    ///
    /// `macro_names` are every declared dependency of the list in declaration
    /// order, whether or not this run regenerated them. Entries without a
    /// fragment on disk are reported but still listed.
    pub async fn write_aggregate(&self, output: &str, macro_names: &[String]) -> Result<PathBuf, PinError> {
        if !self.dry_run {
            for name in macro_names {
                if !self.fragment_path(name).exists() {
                    warn!("{output} loads {name}.bzl, which does not exist; run without a filter to regenerate it");
                }
            }
        }

        let content = self.renderer.render_aggregate(macro_names)?;
        let path = self.gen_dir.join(output);
        self.write(&path, &content).await?;
        Ok(path)
    }

    async fn write(&self, path: &Path, content: &str) -> Result<(), PinError> {
        if self.dry_run {
            debug!(path = %path.display(), bytes = content.len(), "dry run: not writing");
            return Ok(());
        }
        fs::create_dir_all(&self.gen_dir)
            .await
            .map_err(|e| PinError::io("creating directory", &self.gen_dir, &e))?;
        fs::write(path, content).await.map_err(|e| PinError::io("writing", path, &e))?;
        debug!(path = %path.display(), "wrote fragment");
        Ok(())
    }
}

fn bzl_files(dir: &Path) -> Result<Vec<PathBuf>, PinError> {
    let pattern = format!("{}/*.bzl", glob::Pattern::escape(&dir.to_string_lossy()));
    let paths = glob::glob(&pattern).map_err(|e| PinError::Other {
        message: format!("invalid glob pattern {pattern}: {e}"),
    })?;
    let mut files = Vec::new();
    for entry in paths {
        let path = entry.map_err(|e| PinError::io("listing", e.path(), e.error()))?;
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// What one fragment on disk says it was resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Provenance {
    /// Macro name, taken from the file name
    pub macro_name: String,
    /// Resolved reference
    pub reference: Reference,
}

/// Parse the provenance constant out of fragment text.
///
/// Only generated files are considered. Fragments carry a single provenance
/// constant; the first one found is used.
#[must_use]
pub fn parse_provenance(text: &str) -> Option<Reference> {
    if !text.starts_with(AUTOGENERATED_MARKER) {
        return None;
    }
    let caps = PROVENANCE.captures(text)?;
    let value = caps[2].to_string();
    Some(match &caps[1] {
        "COMMIT" => Reference::Commit(value),
        "TAG_NAME" => Reference::Tag(value),
        _ => Reference::Version(value),
    })
}

/// Read back every fragment in `gen_dir`, sorted by macro name. Aggregates and
/// hand-written files are skipped. A missing directory yields an empty list.
pub async fn read_provenance(gen_dir: &Path) -> Result<Vec<Provenance>, PinError> {
    let mut out = Vec::new();
    for path in bzl_files(gen_dir)? {
        let text = fs::read_to_string(&path).await.map_err(|e| PinError::io("reading", &path, &e))?;
        let Some(reference) = parse_provenance(&text) else {
            continue;
        };
        let macro_name =
            path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
        out.push(Provenance {
            macro_name,
            reference,
        });
    }
    Ok(out)
}
