//! The update pipeline.
//!
//! For each configured list, in order:
//!
//! 1. load and comment-strip the spec file
//! 2. for each declared dependency, in order: skip it if it does not match the
//!    name filter, otherwise parse, resolve and write its fragment
//! 3. write the list's aggregate fragment
//!
//! An unfiltered run first deletes every generated `.bzl` file so fragments of
//! removed dependencies do not linger. Filtered runs leave other fragments
//! alone, and their aggregates still list every declared dependency.
//!
//! Processing is strictly sequential and stops at the first failure; fragments
//! written before it stay on disk.

use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::{debug, info};

use crate::config::{ListConfig, Settings};
use crate::emitter::Emitter;
use crate::manifest::DependencyList;
use crate::resolver::{Resolver, ResolvedDependency};

/// Knobs of one run.
#[derive(Debug, Clone, Default)]
pub struct UpdateOptions {
    /// Only dependencies whose name starts with this prefix are resolved.
    pub filter: Option<String>,
    /// Resolve and render but write nothing.
    pub dry_run: bool,
}

impl UpdateOptions {
    /// Whether every dependency is processed.
    #[must_use]
    pub fn is_unfiltered(&self) -> bool {
        self.filter.is_none()
    }

    fn selects(&self, name: &str) -> bool {
        self.filter.as_deref().is_none_or(|prefix| name.starts_with(prefix))
    }
}

/// Progress notifications, in the order they happen.
#[derive(Debug, Clone)]
pub enum UpdateEvent {
    /// Previously generated files were deleted.
    StaleRemoved {
        /// Number of files
        count: usize,
    },
    /// A spec file is about to be processed.
    ListStarted {
        /// Spec file path
        spec: PathBuf,
        /// Declared dependencies
        count: usize,
    },
    /// A dependency is about to be looked at.
    Checking {
        /// Dependency name
        name: String,
    },
    /// The dependency did not match the filter.
    Skipped {
        /// Dependency name
        name: String,
    },
    /// The dependency was resolved and its fragment written.
    Resolved {
        /// Resolution result, including any drift
        dependency: Box<ResolvedDependency>,
        /// Fragment path
        path: PathBuf,
    },
    /// A list's aggregate was written.
    AggregateWritten {
        /// Aggregate path
        path: PathBuf,
    },
}

/// Counters for the end-of-run summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateSummary {
    /// Dependencies resolved
    pub resolved: usize,
    /// Dependencies skipped by the filter
    pub skipped: usize,
    /// Resolved dependencies whose pin lags behind upstream
    pub drifted: usize,
}

/// Runs the pipeline over every configured list.
#[derive(Debug)]
pub struct Updater {
    deps_dir: PathBuf,
    lists: Vec<ListConfig>,
    resolver: Resolver,
    emitter: Emitter,
    options: UpdateOptions,
}

impl Updater {
    /// Build an updater from run settings.
    pub fn new(settings: &Settings, options: UpdateOptions) -> Result<Self> {
        let resolver = Resolver::new(settings).context("Failed to set up the resolver")?;
        let emitter = Emitter::new(settings.gen_dir(), options.dry_run)?;
        Ok(Self {
            deps_dir: settings.deps_dir.clone(),
            lists: settings.tool.lists.clone(),
            resolver,
            emitter,
            options,
        })
    }

    /// Process every list, reporting progress through `on_event`.
    pub async fn run<F>(&self, mut on_event: F) -> Result<UpdateSummary>
    where
        F: FnMut(&UpdateEvent),
    {
        let mut summary = UpdateSummary::default();

        if self.options.is_unfiltered() {
            let count = self.emitter.clean_stale().await?;
            on_event(&UpdateEvent::StaleRemoved {
                count,
            });
        } else {
            debug!(filter = ?self.options.filter, "filtered run, keeping existing fragments");
        }

        for list in &self.lists {
            self.process_list(list, &mut summary, &mut on_event).await?;
        }

        Ok(summary)
    }

    async fn process_list<F>(
        &self,
        list: &ListConfig,
        summary: &mut UpdateSummary,
        on_event: &mut F,
    ) -> Result<()>
    where
        F: FnMut(&UpdateEvent),
    {
        let spec_path = self.deps_dir.join(&list.spec);
        let deps = DependencyList::load(&spec_path)
            .await
            .with_context(|| format!("Failed to load dependency list {}", spec_path.display()))?;
        on_event(&UpdateEvent::ListStarted {
            spec: spec_path.clone(),
            count: deps.repositories.len(),
        });

        for raw in &deps.repositories {
            on_event(&UpdateEvent::Checking {
                name: raw.name.clone(),
            });

            if !self.options.selects(&raw.name) {
                summary.skipped += 1;
                on_event(&UpdateEvent::Skipped {
                    name: raw.name.clone(),
                });
                continue;
            }

            let spec = raw.parse().with_context(|| format!("Failed to update '{}'", raw.name))?;
            let resolved = self
                .resolver
                .resolve(&spec)
                .await
                .with_context(|| format!("Failed to update '{}'", raw.name))?;
            let path = self.emitter.write_fragment(&resolved).await?;

            summary.resolved += 1;
            if let Some(drift) = &resolved.drift {
                summary.drifted += 1;
                info!(name = %resolved.name, "{drift}");
            }
            on_event(&UpdateEvent::Resolved {
                dependency: Box::new(resolved),
                path,
            });
        }

        let path = self.emitter.write_aggregate(&list.output, &deps.macro_names()).await?;
        on_event(&UpdateEvent::AggregateWritten {
            path,
        });
        Ok(())
    }
}
