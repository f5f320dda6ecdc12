//! Error handling for deps-pin
//!
//! Two layers, as in the rest of the codebase:
//! - [`PinError`] - strongly-typed failures raised while loading, resolving and
//!   emitting dependencies
//! - [`ErrorContext`] - a display wrapper adding details and an actionable
//!   suggestion for CLI users
//!
//! Library code returns `Result<T, PinError>` where the failure kind matters to
//! callers (rate limiting, asset selection, unsupported strategies) and
//! `anyhow::Result` for plumbing. [`user_friendly_error`] turns either into an
//! [`ErrorContext`] at the top of `main`.
//!
//! Drift between a pinned reference and upstream is never an error; see
//! [`crate::resolver::Drift`].

use chrono::{DateTime, Local, Utc};
use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// Why release-asset selection could not produce exactly one candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetProblem {
    /// Nothing matched and the release carries no source tarball.
    NoneFound {
        /// Tag of the release that was inspected.
        tag: String,
        /// `file_regex` the assets were filtered with, if any.
        file_regex: Option<String>,
    },
    /// More than one asset matched.
    Ambiguous {
        /// Names of every matching asset, in release order.
        candidates: Vec<String>,
    },
}

impl fmt::Display for AssetProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoneFound {
                tag,
                file_regex,
            } => {
                write!(f, "no assets found in release {tag}")?;
                match file_regex {
                    Some(pattern) => write!(f, " matching file_regex '{pattern}'"),
                    None => Ok(()),
                }
            }
            Self::Ambiguous {
                candidates,
            } => {
                write!(f, "too many assets, use more specific file_regex: [{}]", candidates.join(", "))
            }
        }
    }
}

/// The main error type for dependency resolution.
///
/// The first three variants are the classified failures callers are expected to
/// match on. Everything after [`PinError::UnsupportedStrategy`] is transport,
/// parsing or filesystem plumbing that propagates as-is.
#[derive(Error, Debug, Clone)]
pub enum PinError {
    /// The forge API throttled us (403 carrying a rate-limit reset header).
    #[error("{}", rate_limit_message(.reset_at, .authenticated))]
    RateLimited {
        /// Instant at which requests are accepted again.
        reset_at: DateTime<Utc>,
        /// Whether the throttled request carried an access token.
        authenticated: bool,
    },

    /// A release did not yield exactly one downloadable artifact.
    #[error("Cannot select a release asset for '{name}': {problem}")]
    AmbiguousOrMissingAssets {
        /// Dependency being resolved
        name: String,
        /// What went wrong
        problem: AssetProblem,
    },

    /// Unknown `type` or `file_type` value.
    #[error("Unsupported {field} '{value}' for dependency '{name}'")]
    UnsupportedStrategy {
        /// Dependency being resolved
        name: String,
        /// Field carrying the value (`type` or `file_type`)
        field: String,
        /// Offending value
        value: String,
    },

    /// `freeze_version` names a version the registry does not list.
    #[error("Frozen version '{version}' of '{name}' is not published")]
    FrozenVersionNotFound {
        /// Dependency being resolved
        name: String,
        /// Version that was requested
        version: String,
    },

    /// A branch does not exist on the remote.
    #[error("Branch '{branch}' not found on remote {url}")]
    RefNotFound {
        /// Remote URL
        url: String,
        /// Branch that was looked up
        branch: String,
    },

    /// Upstream answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    HttpStatus {
        /// Requested URL
        url: String,
        /// Response status code
        status: u16,
    },

    /// The request never produced a response.
    #[error("Network error while fetching {url}: {message}")]
    Network {
        /// Requested URL
        url: String,
        /// Transport error text
        message: String,
    },

    /// A response body could not be decoded.
    #[error("Invalid response from {url}: {reason}")]
    InvalidResponse {
        /// Requested URL
        url: String,
        /// Decoding error
        reason: String,
    },

    /// A git subprocess failed.
    #[error("Git operation failed: {operation}")]
    GitCommandError {
        /// The git operation that failed (e.g. "ls-remote")
        operation: String,
        /// The error output from the git command
        stderr: String,
    },

    /// A downloaded archive could not be listed.
    #[error("Cannot read archive downloaded from {url}: {reason}")]
    Archive {
        /// Download URL
        url: String,
        /// Underlying error
        reason: String,
    },

    /// A dependency record is structurally invalid.
    #[error("Invalid dependency specification for '{name}': {reason}")]
    InvalidSpec {
        /// Dependency name (or `<unnamed>`)
        name: String,
        /// What is wrong with it
        reason: String,
    },

    /// A dependency list file is not valid relaxed JSON.
    #[error("Invalid dependency list {file}: {reason}")]
    SpecParse {
        /// File that failed to parse
        file: String,
        /// Parser message
        reason: String,
    },

    /// A fragment template failed to render.
    #[error("Failed to render {template}: {reason}")]
    Template {
        /// Template name
        template: String,
        /// Tera error with its causes
        reason: String,
    },

    /// Filesystem failure while reading specs or writing fragments.
    #[error("File system error: {operation} {path}: {message}")]
    Io {
        /// What we were doing
        operation: String,
        /// Path involved
        path: String,
        /// OS error text
        message: String,
    },

    /// Anything not classified above.
    #[error("{message}")]
    Other {
        /// Full message including the cause chain
        message: String,
    },
}

impl PinError {
    /// Whether this is an upstream "not found" answer.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::HttpStatus {
                status: 404,
                ..
            }
        )
    }

    /// Whether this is one of the asset selection failures.
    #[must_use]
    pub const fn is_asset_selection(&self) -> bool {
        matches!(self, Self::AmbiguousOrMissingAssets { .. })
    }

    pub(crate) fn io(operation: &str, path: &std::path::Path, err: &std::io::Error) -> Self {
        Self::Io {
            operation: operation.to_string(),
            path: path.display().to_string(),
            message: err.to_string(),
        }
    }
}

fn rate_limit_message(reset_at: &DateTime<Utc>, authenticated: &bool) -> String {
    let utc = reset_at.format("%Y-%m-%d %H:%M:%S");
    let local = reset_at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S");
    let mut message = format!(
        "We have been rate-limited by GitHub. We can make API calls again at:\n  {utc} UTC ({local} local time)."
    );
    if !authenticated {
        message.push_str(
            "\nYou can try re-running and specifying an access token since authenticated\n\
             GitHub API requests have a higher rate limit.",
        );
    }
    message
}

/// User-facing wrapper around a [`PinError`].
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error
    pub error: PinError,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context with no suggestion or details.
    #[must_use]
    pub const fn new(error: PinError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add additional details explaining the error.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Print the error to stderr: message in red, details in yellow, suggestion in green.
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error to a user-friendly [`ErrorContext`].
///
/// Recognises [`PinError`] anywhere in the chain and attaches a tailored
/// suggestion. Anything else is rendered with its full cause chain.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    if let Some(pin_error) = error.chain().find_map(|cause| cause.downcast_ref::<PinError>()) {
        let mut ctx = create_error_context(pin_error.clone());
        if error.downcast_ref::<PinError>().is_none() {
            // Surface the outer context ("while resolving foo") as details.
            ctx = ctx.with_details(error.to_string());
        }
        return ctx;
    }

    let mut message = error.to_string();
    let chain: Vec<String> =
        error.chain().skip(1).map(std::string::ToString::to_string).collect();

    if !chain.is_empty() {
        message.push_str("\n\nCaused by:");
        for (i, cause) in chain.iter().enumerate() {
            message.push_str(&format!("\n  {}: {}", i + 1, cause));
        }
    }

    ErrorContext::new(PinError::Other {
        message,
    })
}

fn create_error_context(error: PinError) -> ErrorContext {
    match &error {
        PinError::RateLimited {
            authenticated: false,
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Re-run with --token or set GITHUB_TOKEN"),
        PinError::RateLimited {
            ..
        } => ErrorContext::new(error).with_suggestion("Wait for the reset time and re-run"),
        PinError::AmbiguousOrMissingAssets {
            problem: AssetProblem::Ambiguous {
                ..
            },
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Add or narrow \"file_regex\" so exactly one asset matches"),
        PinError::AmbiguousOrMissingAssets {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Check \"file_regex\" against the asset names of the release"),
        PinError::UnsupportedStrategy {
            field,
            ..
        } if field == "type" => ErrorContext::new(error).with_suggestion(
            "Supported types are github_tarball, github_release, git_clone and crate",
        ),
        PinError::UnsupportedStrategy {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Supported file types are \"archive\" and \"executable\""),
        PinError::FrozenVersionNotFound {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Check \"freeze_version\" against the versions listed by the registry"),
        PinError::HttpStatus {
            status: 404,
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Check owner/repo/name spelling; repositories with only pre-releases need \"freeze_version\""),
        PinError::GitCommandError {
            stderr,
            ..
        } => {
            let details = stderr.trim().to_string();
            ErrorContext::new(error)
                .with_details(details)
                .with_suggestion("Ensure git is installed and the remote URL is reachable")
        }
        _ => ErrorContext::new(error),
    }
}
