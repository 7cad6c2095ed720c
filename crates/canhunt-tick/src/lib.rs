//! Fixed-timestep frame clock for Canhunt.
//!
//! A room simulates its game at a steady frame rate (1–128 Hz, 60 by
//! default). [`FrameClock::wait_for_frame`] sleeps until the next frame is
//! due and hands back the delta time to simulate, so the game never reads
//! the wall clock itself.
//!
//! # Integration
//!
//! The clock sits inside a room actor's `tokio::select!` loop:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         Some(cmd) = cmd_rx.recv() => { /* join, input, pause... */ }
//!         frame = clock.wait_for_frame() => {
//!             let msgs = G::tick(&mut state, frame.dt);
//!             clock.record_frame_end();
//!         }
//!     }
//! }
//! ```

use std::time::{Duration, Instant};

use rand::Rng;
use tokio::time::{self, Instant as TokioInstant};
use tracing::{debug, trace, warn};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// What to do when the room falls behind its frame schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FramePolicy {
    /// Forget the missed frames and resume from now. Simulation time
    /// falls behind wall time, which is invisible to a single player.
    #[default]
    Skip,
    /// Fire up to `max_catchup` late frames back to back, then skip.
    CatchUp { max_catchup: u32 },
    /// Fire one frame whose `dt` covers all the time that passed, capped
    /// at `max_dt`. This is what a browser game loop does with a variable
    /// frame delta.
    Stretch { max_dt: Duration },
}

/// Full configuration for the frame clock.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Frames per second. Clamped to `1..=MAX_FRAME_RATE_HZ`.
    pub frame_rate_hz: u32,
    pub policy: FramePolicy,
    /// Fraction of the frame budget (0.0–1.0) above which a warning is
    /// logged after a frame.
    pub budget_warn_threshold: f64,
    /// Fraction of the frame budget above which the warning is critical.
    pub budget_critical_threshold: f64,
    /// Collect average and max frame times.
    pub metrics_enabled: bool,
    /// Random delay (0–max µs) before the first frame so rooms created
    /// together do not all wake on the same instant.
    pub initial_jitter_us: u64,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            frame_rate_hz: Self::DEFAULT_FRAME_RATE_HZ,
            policy: FramePolicy::default(),
            budget_warn_threshold: 0.80,
            budget_critical_threshold: 1.0,
            metrics_enabled: true,
            initial_jitter_us: 2_000,
        }
    }
}

impl FrameConfig {
    pub const DEFAULT_FRAME_RATE_HZ: u32 = 60;
    pub const MAX_FRAME_RATE_HZ: u32 = 128;

    pub fn with_rate(frame_rate_hz: u32) -> Self {
        Self {
            frame_rate_hz,
            ..Default::default()
        }
    }

    /// Clamps out-of-range values. Called by [`FrameClock::new`].
    ///
    /// - `frame_rate_hz == 0` falls back to the default rate.
    /// - `frame_rate_hz` above the maximum is capped.
    /// - Thresholds are clamped to `0.0..=1.0`, warn ≤ critical.
    pub fn validated(mut self) -> Self {
        if self.frame_rate_hz == 0 {
            warn!(
                default = Self::DEFAULT_FRAME_RATE_HZ,
                "frame_rate_hz is 0, using default"
            );
            self.frame_rate_hz = Self::DEFAULT_FRAME_RATE_HZ;
        } else if self.frame_rate_hz > Self::MAX_FRAME_RATE_HZ {
            warn!(
                rate = self.frame_rate_hz,
                max = Self::MAX_FRAME_RATE_HZ,
                "frame_rate_hz exceeds maximum, clamping"
            );
            self.frame_rate_hz = Self::MAX_FRAME_RATE_HZ;
        }
        self.budget_warn_threshold = self.budget_warn_threshold.clamp(0.0, 1.0);
        self.budget_critical_threshold = self.budget_critical_threshold.clamp(0.0, 1.0);
        if self.budget_warn_threshold > self.budget_critical_threshold {
            self.budget_warn_threshold = self.budget_critical_threshold;
        }
        self
    }

    pub fn frame_duration(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.frame_rate_hz.max(1)))
    }
}

// ---------------------------------------------------------------------------
// Frame info
// ---------------------------------------------------------------------------

/// Returned by [`FrameClock::wait_for_frame`].
#[derive(Debug, Clone)]
pub struct FrameInfo {
    /// Frame number, starting at 1.
    pub frame: u64,
    /// Simulation time to advance by. Equal to the frame duration except
    /// under [`FramePolicy::Stretch`].
    pub dt: Duration,
    /// The frame fired more than 10% of a frame late.
    pub overrun: bool,
    /// Frames dropped to get back on schedule.
    pub frames_skipped: u64,
}

// ---------------------------------------------------------------------------
// Metrics
// ---------------------------------------------------------------------------

/// Frame timing statistics. Times measure the game work between
/// `wait_for_frame` and [`FrameClock::record_frame_end`].
#[derive(Debug, Clone, Default)]
pub struct FrameMetrics {
    pub total_frames: u64,
    pub total_overruns: u64,
    pub total_skipped: u64,
    /// Exponential moving average (α = 0.1).
    pub avg_frame_time: Duration,
    pub max_frame_time: Duration,
    /// Last frame's work time over the budget. >1.0 means overrun.
    pub budget_utilization: f64,
}

// ---------------------------------------------------------------------------
// Clock
// ---------------------------------------------------------------------------

/// Drives one room's game loop.
pub struct FrameClock {
    config: FrameConfig,
    frame_duration: Duration,
    frame_count: u64,
    next_frame: TokioInstant,
    /// Wall-clock start of the current frame's game work.
    work_start: Option<Instant>,
    paused: bool,
    metrics: FrameMetrics,
}

impl FrameClock {
    pub fn new(config: FrameConfig) -> Self {
        let config = config.validated();
        let frame_duration = config.frame_duration();

        let jitter = if config.initial_jitter_us > 0 {
            Duration::from_micros(rand::rng().random_range(0..config.initial_jitter_us))
        } else {
            Duration::ZERO
        };

        debug!(
            rate_hz = config.frame_rate_hz,
            budget_ms = frame_duration.as_secs_f64() * 1000.0,
            policy = ?config.policy,
            "frame clock created"
        );

        Self {
            next_frame: TokioInstant::now() + frame_duration + jitter,
            config,
            frame_duration,
            frame_count: 0,
            work_start: None,
            paused: false,
            metrics: FrameMetrics::default(),
        }
    }

    pub fn with_rate(frame_rate_hz: u32) -> Self {
        Self::new(FrameConfig::with_rate(frame_rate_hz))
    }

    /// Waits until the next frame is due.
    ///
    /// While paused this future never resolves; `tokio::select!` keeps
    /// serving its other branches.
    pub async fn wait_for_frame(&mut self) -> FrameInfo {
        if self.paused {
            std::future::pending::<()>().await;
        }

        let due = self.next_frame;
        time::sleep_until(due).await;

        let now = TokioInstant::now();
        let step = self.frame_duration;
        self.frame_count += 1;
        self.work_start = Some(Instant::now());

        let late_by = now.saturating_duration_since(due);
        let overrun = late_by > step / 10;
        let behind = (late_by.as_nanos() / step.as_nanos()) as u64;
        let mut frames_skipped = 0u64;
        let mut dt = step;

        self.next_frame = match self.config.policy {
            FramePolicy::Skip => {
                frames_skipped = behind;
                if overrun && behind > 0 {
                    warn!(
                        frame = self.frame_count,
                        skipped = behind,
                        late_ms = late_by.as_secs_f64() * 1000.0,
                        "frame overrun, skipping ahead"
                    );
                }
                now + step
            }
            FramePolicy::CatchUp { max_catchup } => {
                let max_catchup = u64::from(max_catchup);
                if behind == 0 {
                    due + step
                } else if behind <= max_catchup {
                    debug!(frame = self.frame_count, behind, "catching up");
                    due + step
                } else {
                    frames_skipped = behind - max_catchup;
                    warn!(
                        frame = self.frame_count,
                        behind,
                        skipped = frames_skipped,
                        "frame overrun beyond catch-up cap"
                    );
                    now + step
                }
            }
            FramePolicy::Stretch { max_dt } => {
                let wanted = step + late_by;
                dt = wanted.min(max_dt.max(step));
                if wanted > dt {
                    frames_skipped = ((wanted - dt).as_nanos() / step.as_nanos()) as u64;
                    warn!(
                        frame = self.frame_count,
                        dt_ms = dt.as_secs_f64() * 1000.0,
                        lost_ms = (wanted - dt).as_secs_f64() * 1000.0,
                        "frame delta capped"
                    );
                }
                now + step
            }
        };

        if overrun {
            self.metrics.total_overruns += 1;
        }
        self.metrics.total_skipped += frames_skipped;
        self.metrics.total_frames += 1;

        trace!(frame = self.frame_count, overrun, "frame fired");

        FrameInfo {
            frame: self.frame_count,
            dt,
            overrun,
            frames_skipped,
        }
    }

    /// Marks the end of the current frame's game work and updates budget
    /// tracking. Does nothing if no frame is in progress.
    pub fn record_frame_end(&mut self) {
        let Some(start) = self.work_start.take() else {
            return;
        };
        let elapsed = start.elapsed();
        let utilization = elapsed.as_secs_f64() / self.frame_duration.as_secs_f64();
        self.metrics.budget_utilization = utilization;

        if utilization >= self.config.budget_critical_threshold {
            warn!(
                frame = self.frame_count,
                elapsed_ms = elapsed.as_secs_f64() * 1000.0,
                utilization_pct = format!("{:.1}", utilization * 100.0),
                "CRITICAL: frame exceeded budget"
            );
        } else if utilization >= self.config.budget_warn_threshold {
            warn!(
                frame = self.frame_count,
                elapsed_ms = elapsed.as_secs_f64() * 1000.0,
                utilization_pct = format!("{:.1}", utilization * 100.0),
                "frame approaching budget limit"
            );
        }

        if self.config.metrics_enabled {
            self.metrics.max_frame_time = self.metrics.max_frame_time.max(elapsed);
            let alpha = 0.1;
            let prev = self.metrics.avg_frame_time.as_secs_f64();
            self.metrics.avg_frame_time =
                Duration::from_secs_f64(prev * (1.0 - alpha) + elapsed.as_secs_f64() * alpha);
        }
    }

    /// Stops frames until [`resume`](Self::resume). Idempotent.
    pub fn pause(&mut self) {
        if !self.paused {
            self.paused = true;
            debug!(frame = self.frame_count, "frame clock paused");
        }
    }

    /// Restarts frames one frame duration from now, so the time spent
    /// paused is not replayed.
    pub fn resume(&mut self) {
        if self.paused {
            self.paused = false;
            self.next_frame = TokioInstant::now() + self.frame_duration;
            debug!(frame = self.frame_count, "frame clock resumed");
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn frame_rate_hz(&self) -> u32 {
        self.config.frame_rate_hz
    }

    pub fn frame_duration(&self) -> Duration {
        self.frame_duration
    }

    pub fn metrics(&self) -> &FrameMetrics {
        &self.metrics
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_rate_falls_back_to_default() {
        let cfg = FrameConfig::with_rate(0).validated();
        assert_eq!(cfg.frame_rate_hz, FrameConfig::DEFAULT_FRAME_RATE_HZ);
    }

    #[test]
    fn test_rate_above_max_is_clamped() {
        let cfg = FrameConfig::with_rate(500).validated();
        assert_eq!(cfg.frame_rate_hz, FrameConfig::MAX_FRAME_RATE_HZ);
    }

    #[test]
    fn test_thresholds_clamped_and_ordered() {
        let cfg = FrameConfig {
            budget_warn_threshold: 1.7,
            budget_critical_threshold: 0.5,
            ..FrameConfig::default()
        }
        .validated();
        assert_eq!(cfg.budget_critical_threshold, 0.5);
        assert_eq!(cfg.budget_warn_threshold, 0.5);
    }
}
