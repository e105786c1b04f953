//! Progress spinner driven by walk events

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use unpackr_core::observer::{WalkEvent, WalkObserver};

/// Spinner that counts archives as the walker finds them
pub struct ProgressObserver {
    spinner: ProgressBar,
}

impl ProgressObserver {
    pub fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {pos} archives {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.enable_steady_tick(Duration::from_millis(100));
        Self { spinner }
    }

    pub fn finish(&self) {
        self.spinner.finish_and_clear();
    }
}

impl Default for ProgressObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl WalkObserver for ProgressObserver {
    fn on_event(&self, event: &WalkEvent) {
        match event {
            WalkEvent::ArchiveFound { archive } => {
                self.spinner.inc(1);
                let name = archive
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                self.spinner.set_message(name);
            }
            WalkEvent::DirectoryEntered { path, .. } => {
                self.spinner.set_message(path.display().to_string());
            }
            _ => {}
        }
    }
}

impl Drop for ProgressObserver {
    fn drop(&mut self) {
        if !self.spinner.is_finished() {
            self.spinner.finish_and_clear();
        }
    }
}
