//! Frame timing and the cancellable frame loop handle.

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
    time::{Duration, Instant},
};

/// Interval between presented frames, for the FPS readout.
///
/// Animation is stepped per frame by [`RenderSession::update`], so this
/// never feeds the scene.
///
/// [`RenderSession::update`]: crate::RenderSession::update
#[derive(Debug, Clone, Default)]
pub struct FrameClock {
    last_present: Option<Instant>,
}

impl FrameClock {
    /// Longest interval reported; a stalled window counts as one slow frame.
    pub const MAX_INTERVAL: Duration = Duration::from_millis(250);

    pub fn new() -> Self {
        Self::default()
    }

    /// Forget the previous frame; the next lap reports zero.
    pub fn restart(&mut self) {
        self.last_present = None;
    }

    /// Seconds since the previous lap, capped at [`MAX_INTERVAL`](Self::MAX_INTERVAL).
    pub fn lap(&mut self) -> f32 {
        self.lap_at(Instant::now())
    }

    fn lap_at(&mut self, now: Instant) -> f32 {
        let interval = self.last_present.map_or(Duration::ZERO, |last| {
            now.saturating_duration_since(last).min(Self::MAX_INTERVAL)
        });
        self.last_present = Some(now);
        interval.as_secs_f32()
    }
}

/// Registration of a per-tick handler that can be stopped.
///
/// Clones share state: cancelling any clone stops the loop. The driver calls
/// [`tick`](Self::tick) after each frame that reached the screen and
/// schedules the next one only while it returns `true`. Dropped or skipped
/// frames are not counted, so `with_max_frames(n)` means `n` presented frames.
#[derive(Debug, Clone, Default)]
pub struct FrameLoop {
    cancelled: Arc<AtomicBool>,
    frames: Arc<AtomicU64>,
    max_frames: Option<u64>,
}

impl FrameLoop {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop after `max` completed frames. Zero means no frame runs at all.
    pub fn with_max_frames(mut self, max: u64) -> Self {
        self.max_frames = Some(max);
        if max == 0 {
            self.cancel();
        }
        self
    }

    pub fn cancel(&self) {
        if !self.cancelled.swap(true, Ordering::AcqRel) {
            log::debug!("frame loop cancelled after {} frames", self.frames());
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Presented frames so far; also the index of the next frame.
    pub fn frames(&self) -> u64 {
        self.frames.load(Ordering::Acquire)
    }

    /// Record one presented frame; returns whether another should follow.
    pub fn tick(&self) -> bool {
        let done = self.frames.fetch_add(1, Ordering::AcqRel) + 1;
        if self.max_frames.is_some_and(|max| done >= max) {
            self.cancel();
        }
        !self.is_cancelled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_laps_between_presents() {
        let start = Instant::now();
        let mut clock = FrameClock::new();
        assert_eq!(clock.lap_at(start), 0.0);
        assert!((clock.lap_at(start + Duration::from_millis(20)) - 0.02).abs() < 1e-6);
        // a stall is reported as one capped interval
        assert_eq!(clock.lap_at(start + Duration::from_secs(3)), 0.25);

        clock.restart();
        assert_eq!(clock.lap_at(start + Duration::from_secs(4)), 0.0);
    }

    #[test]
    fn frame_loop_stops_at_limit() {
        let frames = FrameLoop::new().with_max_frames(3);
        assert!(frames.tick());
        assert!(frames.tick());
        assert!(!frames.tick());
        assert!(frames.is_cancelled());
        assert_eq!(frames.frames(), 3);
    }

    #[test]
    fn zero_limit_is_cancelled_up_front() {
        assert!(FrameLoop::new().with_max_frames(0).is_cancelled());
    }

    #[test]
    fn cancel_is_shared_between_clones() {
        let frames = FrameLoop::new();
        let handle = frames.clone();
        assert!(frames.tick());
        handle.cancel();
        assert!(frames.is_cancelled());
        assert!(!frames.tick());
    }
}
