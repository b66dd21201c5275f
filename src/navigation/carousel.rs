//! Auto-advancing carousel with a seamless forward loop.
//!
//! The display sequence is the real slides followed by a clone of the first,
//! so index `real_count` shows the same content as index 0. Reaching the clone
//! is followed by a three-phase snap driven by host callbacks:
//!
//! 1. `on_transition_end`: animations are disabled.
//! 2. first `on_frame`: index jumps to 0 with no animation.
//! 3. second `on_frame`: animations are re-enabled.
//!
//! The timer is a deadline polled by the host, so teardown leaves nothing
//! behind that could fire later.

use std::time::{Duration, Instant};

use tracing::{debug, trace};

use crate::config::CarouselConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapStep {
    /// Animations are off; the next frame resets the index.
    ResetIndex,
    /// Index is back at 0; the next frame turns animations on again.
    Reenable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CarouselGuard {
    Ready,
    /// A slide animation is running. Manual triggers are dropped.
    Sliding,
    Snapping(SnapStep),
    TornDown,
}

#[derive(Debug, Clone)]
pub struct CarouselAutoplay {
    real_count: usize,
    index: usize,
    animating: bool,
    guard: CarouselGuard,
    deadline: Option<Instant>,
    interval: Duration,
}

impl CarouselAutoplay {
    pub fn new(real_count: usize, config: &CarouselConfig, now: Instant) -> Self {
        let mut carousel = Self {
            real_count,
            index: 0,
            animating: true,
            guard: CarouselGuard::Ready,
            deadline: None,
            interval: config.interval(),
        };
        carousel.arm(now);
        carousel
    }

    /// Number of display slots, clone included.
    pub fn display_len(&self) -> usize {
        if self.real_count == 0 {
            0
        } else {
            self.real_count + 1
        }
    }

    pub fn real_count(&self) -> usize {
        self.real_count
    }

    /// Displayed index, always in `0..=real_count`.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Real slide the displayed index shows.
    pub fn active_dot(&self) -> usize {
        if self.real_count == 0 {
            0
        } else {
            self.index % self.real_count
        }
    }

    /// Whether slide changes should currently animate.
    pub fn is_animating(&self) -> bool {
        self.animating
    }

    pub fn guard(&self) -> CarouselGuard {
        self.guard
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Drives the autoplay timer. Returns `true` when the carousel advanced.
    pub fn poll(&mut self, now: Instant) -> bool {
        let Some(deadline) = self.deadline else {
            return false;
        };
        if now < deadline {
            return false;
        }
        self.deadline = Some(now + self.interval);

        if self.guard != CarouselGuard::Ready {
            trace!("Autoplay tick skipped mid-transition");
            return false;
        }
        self.slide_to(self.index + 1);
        true
    }

    /// The running slide animation finished.
    pub fn on_transition_end(&mut self) {
        if self.guard != CarouselGuard::Sliding {
            return;
        }
        if self.index == self.real_count {
            self.animating = false;
            self.guard = CarouselGuard::Snapping(SnapStep::ResetIndex);
        } else {
            self.guard = CarouselGuard::Ready;
        }
    }

    /// Animation-frame callback. Returns `true` if the snap sequence moved on.
    pub fn on_frame(&mut self) -> bool {
        match self.guard {
            CarouselGuard::Snapping(SnapStep::ResetIndex) => {
                self.index = 0;
                self.guard = CarouselGuard::Snapping(SnapStep::Reenable);
                true
            }
            CarouselGuard::Snapping(SnapStep::Reenable) => {
                self.animating = true;
                self.guard = CarouselGuard::Ready;
                true
            }
            _ => false,
        }
    }

    pub fn next(&mut self, now: Instant) -> bool {
        let target = self.index + 1;
        self.manual(now, target)
    }

    pub fn prev(&mut self, now: Instant) -> bool {
        let target = if self.index == 0 {
            self.real_count.saturating_sub(1)
        } else {
            self.index - 1
        };
        self.manual(now, target)
    }

    /// Indicator-dot navigation. No-op if `index` is the active dot.
    pub fn jump_to(&mut self, index: usize, now: Instant) -> bool {
        if self.real_count == 0 {
            return false;
        }
        let target = index % self.real_count;
        if target == self.active_dot() {
            return false;
        }
        self.manual(now, target)
    }

    /// Stops the timer and refuses all further input.
    pub fn teardown(&mut self) {
        self.guard = CarouselGuard::TornDown;
        self.deadline = None;
    }

    pub fn is_torn_down(&self) -> bool {
        self.guard == CarouselGuard::TornDown
    }

    fn manual(&mut self, now: Instant, target: usize) -> bool {
        if self.guard != CarouselGuard::Ready {
            debug!("Dropping carousel trigger: {:?}", self.guard);
            return false;
        }
        if self.real_count < 2 || target > self.real_count {
            return false;
        }
        self.deadline = None;
        self.slide_to(target);
        self.arm(now);
        true
    }

    fn slide_to(&mut self, target: usize) {
        self.index = target;
        self.animating = true;
        self.guard = CarouselGuard::Sliding;
    }

    fn arm(&mut self, now: Instant) {
        self.deadline = if self.real_count > 1 && !self.interval.is_zero() {
            Some(now + self.interval)
        } else {
            None
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn carousel(count: usize) -> (CarouselAutoplay, Instant) {
        let now = Instant::now();
        (
            CarouselAutoplay::new(count, &CarouselConfig::default(), now),
            now,
        )
    }

    fn secs(s: u64) -> Duration {
        Duration::from_secs(s)
    }

    #[test]
    fn test_autoplay_advances_on_interval() {
        let (mut c, t0) = carousel(3);
        assert!(!c.poll(t0 + secs(3)));
        assert!(c.poll(t0 + secs(4)));
        assert_eq!(c.index(), 1);
        assert_eq!(c.guard(), CarouselGuard::Sliding);

        // Mid-slide tick is skipped but re-arms.
        assert!(!c.poll(t0 + secs(8)));
        assert_eq!(c.index(), 1);
        c.on_transition_end();
        assert!(c.poll(t0 + secs(12)));
        assert_eq!(c.index(), 2);
    }

    #[test]
    fn test_seamless_loop_flag_sequence() {
        let (mut c, t0) = carousel(2);
        assert!(c.poll(t0 + secs(4)));
        c.on_transition_end();
        assert!(c.poll(t0 + secs(8)));
        assert_eq!(c.index(), 2);
        assert_eq!(c.active_dot(), 0);
        assert!(c.is_animating());

        c.on_transition_end();
        assert!(!c.is_animating());
        assert_eq!(c.index(), 2);

        assert!(c.on_frame());
        assert_eq!(c.index(), 0);
        assert!(!c.is_animating());

        assert!(c.on_frame());
        assert!(c.is_animating());
        assert_eq!(c.guard(), CarouselGuard::Ready);
        assert!(!c.on_frame());
    }

    #[test]
    fn test_index_stays_in_display_range() {
        let (mut c, t0) = carousel(3);
        for tick in 1..=20 {
            c.poll(t0 + secs(4 * tick));
            c.on_transition_end();
            c.on_frame();
            c.on_frame();
            assert!(c.index() <= c.real_count());
            assert!(c.active_dot() < c.real_count());
        }
    }

    #[test]
    fn test_manual_dropped_while_sliding() {
        let (mut c, t0) = carousel(4);
        assert!(c.next(t0));
        assert!(!c.next(t0));
        assert!(!c.jump_to(3, t0));
        assert_eq!(c.index(), 1);
        c.on_transition_end();
        assert!(c.jump_to(3, t0));
        assert_eq!(c.index(), 3);
    }

    #[test]
    fn test_manual_restarts_timer() {
        let (mut c, t0) = carousel(3);
        let t1 = t0 + secs(3);
        assert!(c.next(t1));
        assert_eq!(c.next_deadline(), Some(t1 + secs(4)));
        c.on_transition_end();
        assert!(!c.poll(t0 + secs(4)));
        assert!(c.poll(t1 + secs(4)));
    }

    #[test]
    fn test_prev_from_first_wraps_to_last_real() {
        let (mut c, t0) = carousel(3);
        assert!(c.prev(t0));
        assert_eq!(c.index(), 2);
        assert_eq!(c.active_dot(), 2);
    }

    #[test]
    fn test_jump_to_active_dot_is_noop() {
        let (mut c, t0) = carousel(3);
        assert!(!c.jump_to(0, t0));
        assert!(!c.jump_to(3, t0));
        assert_eq!(c.guard(), CarouselGuard::Ready);
    }

    #[test]
    fn test_single_slide_never_moves() {
        let (mut c, t0) = carousel(1);
        assert_eq!(c.next_deadline(), None);
        assert!(!c.poll(t0 + secs(100)));
        assert!(!c.next(t0));
        assert!(!c.prev(t0));
        assert_eq!(c.display_len(), 2);
    }

    #[test]
    fn test_teardown_stops_everything() {
        let (mut c, t0) = carousel(3);
        c.teardown();
        assert!(c.is_torn_down());
        assert!(!c.poll(t0 + secs(4)));
        assert!(!c.next(t0));
        c.on_transition_end();
        assert!(!c.on_frame());
        assert_eq!(c.index(), 0);
    }
}
