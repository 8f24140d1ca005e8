//! Progress bar adapter using indicatif.

use fakescan_media::{AnalysisProgress, ProgressCallback};
use indicatif::{ProgressBar as IndicatifBar, ProgressStyle};

/// Progress bar adapter for CLI output.
pub struct ProgressBar {
    bar: Option<IndicatifBar>,
}

impl ProgressBar {
    /// Creates a new progress bar; a spinner when `total` is unknown.
    #[must_use]
    pub fn new(total: Option<u64>, quiet: bool) -> Self {
        if quiet {
            return Self { bar: None };
        }

        let bar = total.map_or_else(IndicatifBar::new_spinner, IndicatifBar::new);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")
        {
            bar.set_style(style.progress_chars("#>-"));
        }

        Self { bar: Some(bar) }
    }

    pub fn inc(&self) {
        if let Some(bar) = &self.bar {
            bar.inc(1);
        }
    }

    /// Per-item callback for the batch tools.
    pub fn item_callback(&self) -> impl Fn() + Send + Sync + 'static {
        let bar = self.bar.clone();
        move || {
            if let Some(bar) = &bar {
                bar.inc(1);
            }
        }
    }

    /// Frame progress callback for the voting pipeline.
    pub fn video_callback(&self) -> ProgressCallback {
        let bar = self.bar.clone();
        Box::new(move |progress: AnalysisProgress| {
            let Some(bar) = &bar else {
                return;
            };
            if let Some(total) = progress.total_frames_hint {
                bar.set_length(total);
            }
            bar.set_position(progress.frames_read);
            bar.set_message(format!(
                "{} sampled, {} REAL / {} FAKE",
                progress.frames_sampled, progress.real_votes, progress.fake_votes
            ));
        })
    }

    pub fn finish(&self, message: impl Into<String>) {
        if let Some(bar) = &self.bar {
            bar.finish_with_message(message.into());
        }
    }

    pub fn abandon(&self) {
        if let Some(bar) = &self.bar {
            bar.abandon();
        }
    }
}
