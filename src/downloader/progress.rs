//! Per-video progress display.
//!
//! A [`ProgressReporter`] turns the cumulative byte counts reported by the
//! extraction client into increments of an indicatif bar. The bar only ever
//! moves forward.

use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use tracing::{debug, info};

use super::models::ProgressEvent;
use super::traits::ProgressSink;

const BAR_TEMPLATE: &str =
    "{spinner:.cyan} [{bar:40.cyan/blue}] {bytes}/{total_bytes} @ {bytes_per_sec} ETA {eta} - {msg}";

enum ReporterState {
    Uninitialized,
    Reporting { bar: ProgressBar, last_bytes: u64 },
    Finished,
}

/// Progress display for a single download
pub struct ProgressReporter {
    title: String,
    multi: Option<MultiProgress>,
    hidden: bool,
    state: ReporterState,
    delivered: u64,
}

impl ProgressReporter {
    /// Reporter whose bar is drawn through a shared [`MultiProgress`]
    pub fn new(title: impl Into<String>, multi: MultiProgress) -> Self {
        Self {
            title: title.into(),
            multi: Some(multi),
            hidden: false,
            state: ReporterState::Uninitialized,
            delivered: 0,
        }
    }

    /// Reporter that tracks progress without drawing anything
    pub fn hidden(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            multi: None,
            hidden: true,
            state: ReporterState::Uninitialized,
            delivered: 0,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Sum of all increments applied to the bar
    pub fn delivered_bytes(&self) -> u64 {
        self.delivered
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.state, ReporterState::Finished)
    }

    fn make_bar(&self, total: u64) -> ProgressBar {
        let bar = if self.hidden {
            ProgressBar::with_draw_target(Some(total), ProgressDrawTarget::hidden())
        } else {
            ProgressBar::new(total)
        };
        let bar = match &self.multi {
            Some(multi) => multi.add(bar),
            None => bar,
        };
        let style = ProgressStyle::with_template(BAR_TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("━━╌");
        bar.set_style(style);
        bar.set_message(format!("Downloading: {}", self.title));
        bar
    }

    fn on_downloading(
        &mut self,
        downloaded_bytes: u64,
        total_bytes: Option<u64>,
        total_bytes_estimate: Option<u64>,
    ) {
        if matches!(self.state, ReporterState::Uninitialized) {
            let total = total_bytes.or(total_bytes_estimate).unwrap_or(0);
            debug!("Starting progress for {} ({} bytes expected)", self.title, total);
            self.state = ReporterState::Reporting {
                bar: self.make_bar(total),
                last_bytes: 0,
            };
        }

        let ReporterState::Reporting { bar, last_bytes } = &mut self.state else {
            return;
        };

        if let Some(total) = total_bytes {
            if bar.length() != Some(total) && total >= bar.position() {
                bar.set_length(total);
            }
        }

        if downloaded_bytes > *last_bytes {
            let delta = downloaded_bytes - *last_bytes;
            // Estimates can be exceeded; grow the bar instead of overflowing it
            if let Some(len) = bar.length() {
                if bar.position() + delta > len {
                    bar.set_length(bar.position() + delta);
                }
            }
            bar.inc(delta);
            self.delivered += delta;
            *last_bytes = downloaded_bytes;
        }
    }

    fn on_finished(&mut self) {
        match std::mem::replace(&mut self.state, ReporterState::Finished) {
            ReporterState::Reporting { bar, .. } => {
                bar.finish_and_clear();
                if let Some(multi) = &self.multi {
                    multi.remove(&bar);
                }
                info!("Finished downloading: {}", self.title);
            }
            ReporterState::Uninitialized => {
                info!("Finished downloading: {}", self.title);
            }
            ReporterState::Finished => {}
        }
    }
}

impl ProgressSink for ProgressReporter {
    fn on_progress(&mut self, event: ProgressEvent) {
        match event {
            ProgressEvent::Downloading {
                downloaded_bytes,
                total_bytes,
                total_bytes_estimate,
            } => self.on_downloading(downloaded_bytes, total_bytes, total_bytes_estimate),
            ProgressEvent::Finished => self.on_finished(),
        }
    }
}
