//! Stage timing helpers.

use std::time::{Duration, Instant};

use tracing::info;

/// Format a duration as `H:MM:SS`, `MM:SS` or `SS sec`.
pub fn format_duration(duration: Duration) -> String {
    let total = duration.as_secs();
    let (mins, secs) = (total / 60, total % 60);
    let (hours, mins) = (mins / 60, mins % 60);

    if hours > 0 {
        format!("{hours}:{mins:02}:{secs:02}")
    } else if mins > 0 {
        format!("{mins:02}:{secs:02}")
    } else {
        format!("{secs:02} sec")
    }
}

/// Logs start and completion of a labelled block.
///
/// The completion line is written when the timer is dropped.
pub struct Timer {
    label: String,
    start: Instant,
}

impl Timer {
    /// Start timing `label`.
    pub fn start(label: impl Into<String>) -> Self {
        let label = label.into();
        info!("[Timer] Start: {}", label);
        Self {
            label,
            start: Instant::now(),
        }
    }

    /// Time elapsed since the timer started.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        let elapsed = self.elapsed();
        info!(
            "[Timer] Finished: {} in {} ({:.3}s)",
            self.label,
            format_duration(elapsed),
            elapsed.as_secs_f64()
        );
    }
}
