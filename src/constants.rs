//! Global constants used throughout the deps-pin codebase.
//!
//! Endpoint defaults, the generated-file marker and the names of the files
//! the tool reads and writes live here so that the resolver, emitter and CLI
//! agree on them.

/// First line of every generated fragment.
///
/// Tooling that scans the output directory relies on this exact text to tell
/// generated files apart from hand-written ones.
pub const AUTOGENERATED_MARKER: &str =
    "# WARNING: THIS FILE IS AUTOGENERATED BY update-deps DO NOT EDIT";

/// Branch used when a dependency does not name one.
pub const DEFAULT_BRANCH: &str = "master";

/// Prefix applied to every derived macro name.
pub const MACRO_PREFIX: &str = "dep_";

/// Name of the entry point defined by each aggregate fragment.
pub const AGGREGATE_ENTRY_POINT: &str = "deps_gen";

/// Default code-forge REST API root.
pub const DEFAULT_GITHUB_API: &str = "https://api.github.com";

/// Default code-forge web root (source tarball downloads).
pub const DEFAULT_GITHUB_WEB: &str = "https://github.com";

/// Default package registry root.
pub const DEFAULT_CRATES_IO: &str = "https://crates.io";

/// Environment variable set by `bazel run` pointing at the workspace root.
pub const WORKSPACE_DIR_ENV: &str = "BUILD_WORKSPACE_DIRECTORY";

/// Location of the deps directory relative to the workspace root.
pub const DEPS_SUBDIR: &str = "build/deps";

/// Subdirectory of the deps directory receiving generated fragments.
pub const GEN_SUBDIR: &str = "gen";

/// Optional configuration file looked up inside the deps directory.
pub const CONFIG_FILE_NAME: &str = "update-deps.toml";

/// Response header carrying the epoch second at which the rate limit resets.
pub const RATE_LIMIT_RESET_HEADER: &str = "x-ratelimit-reset";

/// Number of characters of a commit hash shown in human-readable output.
pub const SHORT_COMMIT_LEN: usize = 7;

/// Patch arguments forced whenever a dependency declares patches.
pub const PATCH_ARGS: &[&str] = &["-p1"];

/// User agent sent with every HTTP request. Both the forge API and the
/// registry reject requests without one.
pub const USER_AGENT: &str = concat!("update-deps/", env!("CARGO_PKG_VERSION"));
