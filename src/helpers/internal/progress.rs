//! Download and extraction progress
//!
//! indicatif draws to stderr and hides itself when stderr is not a terminal,
//! which is the common case under a build system. Quiet runs never draw.

use crate::core::output;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

const SPINNER_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";
const TICK_INTERVAL: Duration = Duration::from_millis(80);

/// Progress indicator that is cleared when dropped, error paths included.
pub struct Progress {
    bar: ProgressBar,
}

impl Progress {
    /// Indeterminate spinner with a message.
    pub fn spinner(message: &str) -> Self {
        let bar = if output::is_quiet() {
            ProgressBar::hidden()
        } else {
            let bar = ProgressBar::new_spinner();
            bar.set_style(
                ProgressStyle::default_spinner()
                    .template("     {spinner:.cyan} {msg}")
                    .unwrap()
                    .tick_chars(SPINNER_CHARS),
            );
            bar.enable_steady_tick(TICK_INTERVAL);
            bar
        };
        bar.set_message(message.to_string());
        Self { bar }
    }

    /// Switch to a byte bar once the archive size is known.
    pub fn set_total_bytes(&self, total: u64) {
        self.bar.set_length(total);
        if !output::is_quiet() {
            self.bar.set_style(
                ProgressStyle::default_bar()
                    .template("     {spinner:.cyan} {msg} [{bar:30.cyan/dim}] {bytes}/{total_bytes} ({eta})")
                    .unwrap()
                    .progress_chars("━╸━"),
            );
        }
    }

    pub fn set_position(&self, bytes: u64) {
        self.bar.set_position(bytes);
    }

    pub fn position(&self) -> u64 {
        self.bar.position()
    }

    pub fn total(&self) -> Option<u64> {
        self.bar.length()
    }
}

impl Drop for Progress {
    fn drop(&mut self) {
        self.bar.finish_and_clear();
    }
}

/// Run `f` under a spinner.
pub fn with_spinner<T, E>(message: &str, f: impl FnOnce() -> Result<T, E>) -> Result<T, E> {
    let _progress = Progress::spinner(message);
    f()
}
