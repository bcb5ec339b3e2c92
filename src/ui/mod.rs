//! UI module for consistent CLI output
//!
//! Uses `cliclack` styling in interactive terminals with automatic
//! fallback to plain prefixed lines in CI/non-interactive environments.

mod output;

pub use output::{UiContext, intro, remark, step_error_detail, step_ok, step_ok_detail, step_warn_hint};
