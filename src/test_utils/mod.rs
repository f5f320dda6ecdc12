//! Test utilities for deps-pin
//!
//! Available to unit tests and, through the `test-utils` feature, to the
//! integration suite:
//!
//! - [`init_test_logging`] - route `tracing` output to the test harness
//! - [`archives`] - in-memory tar/zip builders for release downloads
//! - [`DepsDir`] - a temporary deps directory with spec files
//! - [`TestGit`] - a local repository usable as a `git_clone` remote
//!
//! # Example
//!
//! ```rust,no_run
//! use deps_pin::test_utils::{DepsDir, archives};
//!
//! let deps = DepsDir::new().unwrap();
//! deps.write_deps(r#"{"repositories": [{"name": "foo", "type": "crate"}]}"#).unwrap();
//! let tgz = archives::tar_gz(&[("foo-1.0/README", b"hi")]);
//! assert!(!tgz.is_empty());
//! ```

pub mod archives;
pub mod fixtures;
pub mod git_helper;

pub use fixtures::DepsDir;
pub use git_helper::TestGit;

use std::sync::Once;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Only the first call has an effect. Uses `level` when given, otherwise
/// `RUST_LOG`; with neither, tests stay silent.
///
/// ```bash
/// RUST_LOG=deps_pin=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .try_init();
    });
}
