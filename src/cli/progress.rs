//! CLI-specific progress handling for butterfly-trip
//!
//! Provides the leg-fetch progress bar for the command-line interface.

use butterfly_trip::LegProgress;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;

/// Creates a progress bar counting fetched legs
pub fn create_progress_bar(total_legs: u64) -> ProgressBar {
    let pb = ProgressBar::new(total_legs);
    let style = ProgressStyle::default_bar()
        .template(
            "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} legs ({percent}%)",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
    pb.set_style(style);
    pb
}

/// Progress manager for route assembly
pub struct ProgressManager {
    pub pb: ProgressBar,
}

impl ProgressManager {
    /// Create a new progress manager
    pub fn new(total_legs: u64, message: &str) -> Self {
        let pb = create_progress_bar(total_legs);

        // Print initial message to stderr
        eprintln!("{message}");

        Self { pb }
    }

    /// Callback for [`butterfly_trip::AssembleOptions::progress`]
    ///
    /// The leg total is only known once the tour is solved, so the bar length
    /// is taken from the first report.
    pub fn callback(&self) -> LegProgress {
        let pb = self.pb.clone();
        Arc::new(move |done: usize, total: usize| {
            let (done, total) = (done as u64, total as u64);
            if pb.length().unwrap_or(0) != total {
                pb.set_length(total);
            }
            pb.set_position(done);
            if done >= total {
                pb.finish_with_message("✅ All legs fetched");
            }
        })
    }
}
