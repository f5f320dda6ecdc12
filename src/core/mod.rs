//! Core types shared by every stage of the pipeline.
//!
//! Currently this is the error model: [`PinError`] for typed failures and
//! [`ErrorContext`] / [`user_friendly_error`] for presenting them.

pub mod error;

pub use error::{AssetProblem, ErrorContext, PinError, user_friendly_error};
