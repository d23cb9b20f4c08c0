//! Terminal output for depfetch
//!
//! Status lines go to stdout, warnings and errors to stderr. Build systems
//! that only want failures can silence everything else with `set_quiet`.

use owo_colors::OwoColorize;
use std::sync::atomic::{AtomicBool, Ordering};

static QUIET: AtomicBool = AtomicBool::new(false);

/// Suppress everything except warnings and errors.
pub fn set_quiet(quiet: bool) {
    QUIET.store(quiet, Ordering::Relaxed);
}

pub fn is_quiet() -> bool {
    QUIET.load(Ordering::Relaxed)
}

macro_rules! status {
    ($($arg:tt)*) => {
        if !is_quiet() {
            println!($($arg)*);
        }
    };
}

/// Run banner.
/// Example: "==> Fetching components as custom GitHub assets..."
pub fn banner(message: &str) {
    status!("{} {}", "==>".blue().bold(), message.bold());
}

/// Header line for one component.
/// Example: "(1/3) foo (acme/foo v1.2)"
pub fn component(current: usize, total: usize, name: &str, repo: &str, version: &str) {
    status!(
        "{} {} {}",
        format!("({}/{})", current, total).cyan(),
        name.bold(),
        format!("({} {})", repo, version).dimmed()
    );
}

/// Step within a component.
/// Example: "  -> \"foo\" not found locally or different from required"
pub fn step(message: &str) {
    status!("  {} {}", "->".cyan(), message);
}

pub fn detail(message: &str) {
    status!("     {}", message.dimmed());
}

/// Example: "==> foo downloaded"
pub fn success(message: &str) {
    status!("{} {}", "==>".green().bold(), message.green());
}

/// Example: "==> foo already satisfied"
pub fn satisfied(name: &str) {
    status!(
        "{} {}",
        "==>".dimmed(),
        format!("{} already satisfied", name).dimmed()
    );
}

pub fn info(message: &str) {
    status!("{} {}", "::".cyan(), message);
}

pub fn warning(message: &str) {
    eprintln!("{} {}", "warning:".yellow().bold(), message.yellow());
}

pub fn error(message: &str) {
    eprintln!("{} {}", "error:".red().bold(), message.red());
}
