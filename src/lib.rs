//! deps-pin - pin external build dependencies
//!
//! Resolves each dependency declared in a relaxed-JSON list to an immutable
//! reference (commit, release tag or package version) plus a checksum, and
//! writes one Starlark fragment per dependency and one aggregate per list for
//! the build orchestrator to load.
//!
//! # Pipeline
//!
//! ```text
//! deps.jsonc ──▶ manifest ──▶ resolver ──▶ templating ──▶ emitter ──▶ gen/*.bzl
//!                               │
//!                 github / registry / git / archive
//! ```
//!
//! Resolution strategies, selected by the record's `type`:
//!
//! - `github_tarball` - source tarball of a branch head
//! - `github_release` - one asset of a release
//! - `git_clone` - branch head of any git remote, checked out by the orchestrator
//! - `crate` - newest version of a crates.io package
//!
//! # Modules
//!
//! - [`manifest`] - list loading, comment stripping, [`manifest::DependencySpec`]
//! - [`resolver`] - [`resolver::Resolver`] and the four strategies
//! - [`templating`] - Starlark rendering with centralized escaping
//! - [`emitter`] - fragment files, stale cleanup, provenance read-back
//! - [`updater`] - the end-to-end pipeline
//! - [`github`], [`registry`], [`git`], [`net`], [`archive`] - upstream access
//! - [`config`], [`core`], [`constants`], [`cli`] - plumbing
//!
//! # Example dependency list
//!
//! ```text
//! {
//!   "repositories": [
//!     { "name": "zlib", "type": "github_tarball", "owner": "madler", "repo": "zlib",
//!       "branch": "develop", "build_file": "//build/deps:BUILD.zlib" },
//!     { "name": "cxxbridge-cmd", "type": "crate" }
//!   ]
//! }
//! ```

pub mod archive;
pub mod cli;
pub mod config;
pub mod constants;
pub mod core;
pub mod emitter;
pub mod git;
pub mod github;
pub mod manifest;
pub mod net;
pub mod registry;
pub mod resolver;
pub mod templating;
pub mod updater;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
