//! Transfer progress accounting and rendering.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

/// Width of the rendered bar, in cells. A cell is filled per whole
/// percentage point, so the bar is always exactly 100 cells wide.
pub const BAR_WIDTH: u64 = 100;

/// Byte counters for one download: bytes received so far and the total
/// the server declared, if it declared one. Created when the transfer
/// starts, discarded when it completes.
#[derive(Debug)]
pub struct DownloadProgress {
    received: u64,
    total: Option<u64>,
}

impl DownloadProgress {
    pub fn new(total: Option<u64>) -> Self {
        Self { received: 0, total }
    }

    pub fn advance(&mut self, bytes: u64) {
        self.received += bytes;
    }

    pub fn received(&self) -> u64 {
        self.received
    }

    pub fn total(&self) -> Option<u64> {
        self.total
    }

    /// Completion percentage in `[0, 100]`, or `None` when the server
    /// did not declare a length. A zero-length resource is complete.
    pub fn percentage(&self) -> Option<f64> {
        let total = self.total?;
        if total == 0 {
            return Some(100.0);
        }
        Some((self.received as f64 / total as f64 * 100.0).min(100.0))
    }

    /// Number of filled cells in a [`BAR_WIDTH`]-cell bar: `floor(percentage)`.
    pub fn filled_cells(&self) -> Option<u64> {
        self.percentage().map(|p| p.floor() as u64)
    }

    /// Whether every declared byte has arrived. Trivially true when no
    /// length was declared, since EOF is then the only completion signal.
    pub fn is_complete(&self) -> bool {
        self.total.is_none_or(|t| self.received >= t)
    }
}

/// Build the progress bar for a transfer.
///
/// With a known total this is a percentage readout plus the 100-cell
/// block bar, continuously overwritten on one line. Without one, nothing
/// is rendered. indicatif suppresses drawing when stderr is not a
/// terminal, so piped runs stay clean either way.
pub fn transfer_bar(total: Option<u64>) -> ProgressBar {
    match total {
        Some(len) => {
            let bar = ProgressBar::new(len);
            bar.set_style(
                ProgressStyle::with_template("{percent:>3}% [{bar:100}]")
                    .expect("valid progress template")
                    .progress_chars("\u{2588}\u{2588} "),
            );
            bar
        }
        None => ProgressBar::with_draw_target(None, ProgressDrawTarget::hidden()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentage_is_monotonic_and_reaches_100() {
        let mut progress = DownloadProgress::new(Some(1000));
        let mut last = 0.0;
        for _ in 0..125 {
            progress.advance(8);
            let pct = progress.percentage().unwrap();
            assert!(pct >= last);
            last = pct;
        }
        assert_eq!(last, 100.0);
        assert!(progress.is_complete());
    }

    #[test]
    fn filled_cells_truncate_to_whole_percent() {
        let mut progress = DownloadProgress::new(Some(1000));
        progress.advance(999);
        assert!((progress.percentage().unwrap() - 99.9).abs() < 1e-9);
        assert_eq!(progress.filled_cells().unwrap(), 99);
    }

    #[test]
    fn bar_cells_always_sum_to_width() {
        for received in [0u64, 1, 9, 10, 499, 500, 999, 1000] {
            let mut progress = DownloadProgress::new(Some(1000));
            progress.advance(received);
            let filled = progress.filled_cells().unwrap();
            let blank = BAR_WIDTH - filled;
            assert_eq!(filled + blank, BAR_WIDTH);
            assert_eq!(filled, progress.percentage().unwrap().floor() as u64);
        }
    }

    #[test]
    fn overshoot_is_clamped() {
        // Servers occasionally send more than Content-Length promised.
        let mut progress = DownloadProgress::new(Some(100));
        progress.advance(150);
        assert_eq!(progress.percentage().unwrap(), 100.0);
        assert_eq!(progress.filled_cells().unwrap(), BAR_WIDTH);
    }

    #[test]
    fn unknown_total_renders_nothing() {
        let progress = DownloadProgress::new(None);
        assert_eq!(progress.percentage(), None);
        assert_eq!(progress.filled_cells(), None);
        assert!(progress.is_complete());
        assert!(transfer_bar(None).is_hidden());
    }

    #[test]
    fn zero_length_resource_is_complete() {
        let progress = DownloadProgress::new(Some(0));
        assert_eq!(progress.percentage(), Some(100.0));
        assert!(progress.is_complete());
    }
}
