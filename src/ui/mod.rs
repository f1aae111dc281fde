//! UI module for consistent CLI output
//!
//! Spinners and styled step lines in interactive terminals, with
//! automatic fallback to plain `[OK]`/`[FAIL]` lines in CI.

mod context;
mod output;
mod progress;

pub use context::UiContext;
pub use output::{
    key_value, section, step_error, step_info, step_ok, step_ok_detail, step_warn, step_warn_hint,
};
pub use progress::TaskSpinner;
