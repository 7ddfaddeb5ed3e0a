//! Progress pacing for scan submissions.
//!
//! The scanning service gives no progress of its own, so a pacer publishes
//! fixed percentage steps at a fixed interval while the request runs.

use allergen_core::PacingConfig;
use std::time::Duration;
use tokio::sync::watch;

/// Publishes paced progress steps on a watch channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressPacer {
    steps: Vec<u8>,
    interval: Duration,
    settle: Duration,
}

impl ProgressPacer {
    /// Create a pacer from explicit steps and delays.
    #[must_use]
    pub fn new(steps: Vec<u8>, interval: Duration, settle: Duration) -> Self {
        Self {
            steps,
            interval,
            settle,
        }
    }

    /// Create a pacer from the pacing section of the configuration.
    #[must_use]
    pub fn from_config(config: &PacingConfig) -> Self {
        Self::new(config.steps.clone(), config.interval(), config.settle())
    }

    /// Pacer that jumps straight to 100 without waiting.
    #[must_use]
    pub fn immediate() -> Self {
        Self::new(vec![100], Duration::ZERO, Duration::ZERO)
    }

    /// Percentage steps, in order.
    #[must_use]
    pub fn steps(&self) -> &[u8] {
        &self.steps
    }

    /// Minimum time a submission takes, excluding the settle delay.
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.interval * u32::try_from(self.steps.len()).unwrap_or(u32::MAX)
    }

    /// Publish each step after one interval. Progress never moves backwards.
    pub async fn run(&self, progress: &watch::Sender<u8>) {
        self.run_while(progress, || true).await;
    }

    /// Like [`ProgressPacer::run`], but stop publishing once `active` turns false.
    ///
    /// The pacing still takes its full duration so callers waiting on it are
    /// not released early.
    pub async fn run_while<F>(&self, progress: &watch::Sender<u8>, active: F)
    where
        F: Fn() -> bool,
    {
        for &step in &self.steps {
            if !self.interval.is_zero() {
                tokio::time::sleep(self.interval).await;
            }
            if active() {
                advance(progress, step);
            }
        }
    }

    /// Wait the settle delay that follows a successful response.
    pub async fn settle(&self) {
        if !self.settle.is_zero() {
            tokio::time::sleep(self.settle).await;
        }
    }
}

impl Default for ProgressPacer {
    fn default() -> Self {
        Self::from_config(&PacingConfig::default())
    }
}

/// Raise the published progress to `step` if it is higher.
pub(crate) fn advance(progress: &watch::Sender<u8>, step: u8) {
    let step = step.min(100);
    progress.send_if_modified(|current| {
        if step > *current {
            *current = step;
            true
        } else {
            false
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_steps_published_at_interval() {
        let pacer = ProgressPacer::default();
        let (tx, rx) = watch::channel(0u8);

        let started = tokio::time::Instant::now();
        let run = pacer.run(&tx);
        tokio::pin!(run);

        let mut seen = Vec::new();
        loop {
            tokio::select! {
                () = &mut run => break,
                () = tokio::time::sleep(Duration::from_millis(100)) => seen.push(*rx.borrow()),
            }
        }
        seen.push(*rx.borrow());
        seen.dedup();

        assert_eq!(seen, vec![0, 25, 50, 75, 100]);
        assert_eq!(started.elapsed(), Duration::from_millis(1600));
    }

    #[test]
    fn test_progress_is_monotonic() {
        let (tx, rx) = watch::channel(0u8);
        advance(&tx, 50);
        advance(&tx, 25);
        assert_eq!(*rx.borrow(), 50);
        advance(&tx, 250);
        assert_eq!(*rx.borrow(), 100);
    }

    #[test]
    fn test_duration() {
        assert_eq!(
            ProgressPacer::default().duration(),
            Duration::from_millis(1600)
        );
        assert_eq!(ProgressPacer::immediate().duration(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_inactive_pacer_publishes_nothing() {
        let (tx, rx) = watch::channel(0u8);
        let started = tokio::time::Instant::now();
        ProgressPacer::default().run_while(&tx, || false).await;
        assert_eq!(*rx.borrow(), 0);
        assert_eq!(started.elapsed(), Duration::from_millis(1600));
    }

    #[tokio::test]
    async fn test_immediate_pacer() {
        let (tx, rx) = watch::channel(0u8);
        ProgressPacer::immediate().run(&tx).await;
        assert_eq!(*rx.borrow(), 100);
    }
}
