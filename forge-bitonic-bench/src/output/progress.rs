//! Progress spinner using indicatif.

use indicatif::{ProgressBar, ProgressStyle};

/// Spinner shown while a size is being measured.
pub struct BenchProgress {
    bar: ProgressBar,
}

impl BenchProgress {
    pub fn new() -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} [{elapsed}] {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.enable_steady_tick(std::time::Duration::from_millis(100));
        Self { bar }
    }

    /// Hide the spinner while `f` writes to the terminal.
    pub fn suspend<R>(&self, f: impl FnOnce() -> R) -> R {
        self.bar.suspend(f)
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }

    /// Callback for [`crate::harness::run_size`].
    pub fn callback(&self) -> impl Fn(&str) + '_ {
        move |msg: &str| self.bar.set_message(msg.to_string())
    }
}
