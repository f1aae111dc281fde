//! Output functions for consistent CLI formatting

use super::context::UiContext;
use console::style;

/// Display a section header
pub fn section(ctx: &UiContext, title: &str) {
    println!();
    if ctx.use_fancy_output() {
        println!("{}", style(title).bold().cyan());
    } else {
        println!("{}", style(title).bold());
    }
}

/// Display a success step
pub fn step_ok(ctx: &UiContext, message: &str) {
    if ctx.use_fancy_output() {
        println!("  {} {}", style("✓").green(), message);
    } else {
        println!("  {} {}", style("[OK]").green(), message);
    }
}

/// Display a success step with detail
pub fn step_ok_detail(ctx: &UiContext, message: &str, detail: &str) {
    if ctx.use_fancy_output() {
        println!("  {} {} ({})", style("✓").green(), message, style(detail).dim());
    } else {
        println!("  {} {} ({})", style("[OK]").green(), message, detail);
    }
}

/// Display a warning step
pub fn step_warn(ctx: &UiContext, message: &str) {
    if ctx.use_fancy_output() {
        println!("  {} {}", style("!").yellow(), message);
    } else {
        println!("  {} {}", style("[WARN]").yellow(), message);
    }
}

/// Display a warning step with hint
pub fn step_warn_hint(ctx: &UiContext, message: &str, hint: &str) {
    if ctx.use_fancy_output() {
        println!("  {} {} - {}", style("!").yellow(), message, style(hint).dim());
    } else {
        println!("  {} {} - {}", style("[WARN]").yellow(), message, hint);
    }
}

/// Display an error step
pub fn step_error(ctx: &UiContext, message: &str) {
    if ctx.use_fancy_output() {
        println!("  {} {}", style("✗").red(), message);
    } else {
        println!("  {} {}", style("[FAIL]").red(), message);
    }
}

/// Display an info step
pub fn step_info(ctx: &UiContext, message: &str) {
    if ctx.use_fancy_output() {
        println!("  {} {}", style("•").cyan(), message);
    } else {
        println!("  {} {}", style("[INFO]").cyan(), message);
    }
}

/// Print styled key-value pair
pub fn key_value(ctx: &UiContext, key: &str, value: &str) {
    if ctx.use_fancy_output() {
        println!("  {}: {}", style(key).dim(), value);
    } else {
        println!("  {}: {}", key, value);
    }
}
