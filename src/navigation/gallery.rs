//! Lightbox state machine.
//!
//! The navigator reads the resolver's slot array and keeps a cursor into it by
//! origin index. It never mutates item data. Timed guards (the transition
//! window after a move, the debounce before fullscreen may open) are checked
//! against an `Instant` supplied by the host, so the machine itself holds no
//! timers that could fire after teardown.

use std::sync::Arc;
use std::time::Instant;

use tracing::debug;

use crate::config::GalleryConfig;
use crate::models::{DisplaySource, MediaItem};
use crate::resolver::MediaSlots;

use super::dismissal::{DismissalStack, NoHistory, OverlayEntry};
use super::input::{action_for_key, Gesture, Key, NavAction, SwipeTracker};

/// Distraction-free view layered on top of an open gallery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FullscreenView {
    /// `true` when the image is fitted to the viewport width instead of
    /// being contained.
    pub fit_width: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigatorState {
    Closed,
    Open {
        index: usize,
        fullscreen: Option<FullscreenView>,
    },
}

/// What a back signal did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackOutcome {
    ClosedFullscreen,
    ClosedGallery,
    /// No overlay entry was pushed; the signal belongs to someone else.
    Ignored,
}

#[derive(Debug, Clone, Copy)]
enum TransitionGuard {
    Idle,
    Until(Instant),
}

pub struct GalleryNavigator<H: DismissalStack = NoHistory> {
    slots: Arc<MediaSlots>,
    state: NavigatorState,
    guard: TransitionGuard,
    opened_at: Option<Instant>,
    history: H,
    // Entries this navigator pushed and has not yet seen consumed.
    pushed: Vec<OverlayEntry>,
    swipe: SwipeTracker,
    config: GalleryConfig,
}

impl GalleryNavigator<NoHistory> {
    pub fn new(slots: Arc<MediaSlots>, config: GalleryConfig) -> Self {
        Self::with_history(slots, config, NoHistory)
    }
}

impl<H: DismissalStack> GalleryNavigator<H> {
    pub fn with_history(slots: Arc<MediaSlots>, config: GalleryConfig, history: H) -> Self {
        let swipe = SwipeTracker::new(config.swipe_threshold_px);
        Self {
            slots,
            state: NavigatorState::Closed,
            guard: TransitionGuard::Idle,
            opened_at: None,
            history,
            pushed: Vec::new(),
            swipe,
            config,
        }
    }

    /// Swaps in a new reference-list generation. An open gallery is closed
    /// because its cursor no longer means anything.
    pub fn set_slots(&mut self, slots: Arc<MediaSlots>) {
        if self.is_open() {
            self.close();
        }
        self.slots = slots;
    }

    pub fn slots(&self) -> &Arc<MediaSlots> {
        &self.slots
    }

    pub fn state(&self) -> NavigatorState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, NavigatorState::Open { .. })
    }

    pub fn is_fullscreen(&self) -> bool {
        matches!(
            self.state,
            NavigatorState::Open {
                fullscreen: Some(_),
                ..
            }
        )
    }

    pub fn current_index(&self) -> Option<usize> {
        match self.state {
            NavigatorState::Open { index, .. } => Some(index),
            NavigatorState::Closed => None,
        }
    }

    pub fn current_item(&self) -> Option<MediaItem> {
        self.current_index().and_then(|i| self.slots.get(i))
    }

    pub fn is_transitioning(&self, now: Instant) -> bool {
        match self.guard {
            TransitionGuard::Idle => false,
            TransitionGuard::Until(until) => now < until,
        }
    }

    /// Ends the transition window early (for hosts with animation-end callbacks).
    pub fn finish_transition(&mut self) {
        self.guard = TransitionGuard::Idle;
    }

    pub fn history(&self) -> &H {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut H {
        &mut self.history
    }

    /// Opens the gallery at `index`. Returns `false` if already open or the
    /// slot is not resolved.
    pub fn open(&mut self, index: usize, now: Instant) -> bool {
        if self.is_open() {
            return false;
        }
        if !self.slots.is_resolved(index) {
            debug!("Ignoring open of unresolved slot {}", index);
            return false;
        }

        self.state = NavigatorState::Open {
            index,
            fullscreen: None,
        };
        self.opened_at = Some(now);
        self.guard = TransitionGuard::Idle;
        self.push_entry(OverlayEntry::Gallery);
        true
    }

    pub fn next(&mut self, now: Instant) -> bool {
        self.step(true, now)
    }

    pub fn prev(&mut self, now: Instant) -> bool {
        self.step(false, now)
    }

    /// Jumps to `index` (indicator dots). No-op if it names the current item.
    pub fn jump_to(&mut self, index: usize, now: Instant) -> bool {
        let Some(current) = self.current_index() else {
            return false;
        };
        let total = self.slots.len();
        if total == 0 || self.is_transitioning(now) {
            return false;
        }
        let target = index % total;
        if target == current % total || !self.slots.is_resolved(target) {
            return false;
        }
        self.move_to(target, now);
        true
    }

    /// Closes the gallery through UI controls, reconciling every entry this
    /// navigator pushed.
    pub fn close(&mut self) {
        if !self.is_open() {
            return;
        }
        while let Some(entry) = self.pushed.pop() {
            self.history.reconcile(entry);
        }
        self.reset();
    }

    /// Closes fullscreen through UI controls, staying on the same item.
    pub fn close_fullscreen(&mut self) -> bool {
        match &mut self.state {
            NavigatorState::Open { fullscreen, .. } if fullscreen.is_some() => *fullscreen = None,
            _ => return false,
        }
        if self.pushed.last() == Some(&OverlayEntry::Fullscreen) {
            self.pushed.pop();
            self.history.reconcile(OverlayEntry::Fullscreen);
        }
        true
    }

    /// Enters fullscreen from the open gallery. Dropped during the debounce
    /// window right after opening.
    pub fn open_fullscreen(&mut self, now: Instant) -> bool {
        let Some(opened_at) = self.opened_at else {
            return false;
        };
        if now.saturating_duration_since(opened_at) < self.config.fullscreen_debounce() {
            debug!("Ignoring fullscreen request inside open debounce");
            return false;
        }
        match &mut self.state {
            NavigatorState::Open { fullscreen, .. } if fullscreen.is_none() => {
                *fullscreen = Some(FullscreenView { fit_width: false });
            }
            _ => return false,
        }
        self.push_entry(OverlayEntry::Fullscreen);
        true
    }

    pub fn toggle_fit(&mut self) -> bool {
        match &mut self.state {
            NavigatorState::Open {
                fullscreen: Some(view),
                ..
            } => {
                view.fit_width = !view.fit_width;
                true
            }
            _ => false,
        }
    }

    /// Image tap or click: toggles fit inside fullscreen, otherwise tries to
    /// enter fullscreen.
    pub fn tap(&mut self, now: Instant) -> bool {
        if self.is_fullscreen() {
            self.toggle_fit()
        } else {
            self.open_fullscreen(now)
        }
    }

    /// System back action. The top-most overlay closes; the entry has already
    /// been consumed by the host so nothing is reconciled.
    pub fn on_back(&mut self) -> BackOutcome {
        match self.pushed.pop() {
            None => {
                debug!("Back signal without a pushed entry; ignoring");
                BackOutcome::Ignored
            }
            Some(OverlayEntry::Fullscreen) => {
                if let NavigatorState::Open { fullscreen, .. } = &mut self.state {
                    *fullscreen = None;
                }
                BackOutcome::ClosedFullscreen
            }
            Some(OverlayEntry::Gallery) => {
                self.reset();
                BackOutcome::ClosedGallery
            }
        }
    }

    pub fn handle_key(&mut self, key: Key, now: Instant) -> bool {
        if !self.is_open() {
            return false;
        }
        match action_for_key(key) {
            Some(action) => self.apply(action, now),
            None => false,
        }
    }

    pub fn touch_start(&mut self, x: f64, y: f64) {
        if self.is_open() {
            self.swipe.begin(x, y);
        }
    }

    pub fn touch_move(&mut self, x: f64, y: f64) {
        self.swipe.update(x, y);
    }

    /// Finishes a touch and applies the resulting gesture.
    pub fn touch_end(&mut self, now: Instant) -> Option<Gesture> {
        let gesture = self.swipe.end()?;
        match gesture {
            Gesture::Swipe(action) => {
                self.apply(action, now);
            }
            Gesture::Tap => {
                self.tap(now);
            }
            Gesture::Ignored => {}
        }
        Some(gesture)
    }

    /// Display sources worth warming: the current item and its nearest
    /// resolved neighbours in both directions.
    pub fn preload_targets(&self) -> Vec<DisplaySource> {
        let Some(current) = self.current_index() else {
            return Vec::new();
        };
        let mut indices = vec![current];
        for forward in [true, false] {
            if let Some(j) = self.neighbour(current, forward) {
                if !indices.contains(&j) {
                    indices.push(j);
                }
            }
        }
        indices
            .into_iter()
            .filter_map(|i| self.slots.get(i))
            .map(|item| item.display)
            .collect()
    }

    fn apply(&mut self, action: NavAction, now: Instant) -> bool {
        match action {
            NavAction::Next => self.next(now),
            NavAction::Prev => self.prev(now),
            NavAction::Close => {
                if self.is_fullscreen() {
                    self.close_fullscreen()
                } else {
                    self.close();
                    true
                }
            }
        }
    }

    fn step(&mut self, forward: bool, now: Instant) -> bool {
        let Some(current) = self.current_index() else {
            return false;
        };
        if self.is_transitioning(now) {
            debug!("Navigation dropped during transition");
            return false;
        }
        match self.neighbour(current, forward) {
            Some(target) => {
                self.move_to(target, now);
                true
            }
            None => false,
        }
    }

    fn neighbour(&self, from: usize, forward: bool) -> Option<usize> {
        let total = self.slots.len();
        (1..total)
            .map(|step| {
                if forward {
                    (from + step) % total
                } else {
                    (from + total - step) % total
                }
            })
            .find(|&j| self.slots.is_resolved(j))
    }

    fn move_to(&mut self, target: usize, now: Instant) {
        if let NavigatorState::Open { index, .. } = &mut self.state {
            *index = target;
        }
        let window = self.config.transition();
        self.guard = if window.is_zero() {
            TransitionGuard::Idle
        } else {
            TransitionGuard::Until(now + window)
        };
    }

    fn push_entry(&mut self, entry: OverlayEntry) {
        self.history.push(entry);
        self.pushed.push(entry);
    }

    fn reset(&mut self) {
        self.state = NavigatorState::Closed;
        self.guard = TransitionGuard::Idle;
        self.opened_at = None;
        self.swipe.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MediaRef;
    use crate::navigation::dismissal::MemoryHistory;
    use std::time::Duration;

    fn slots(mask: &[bool]) -> Arc<MediaSlots> {
        let items = mask
            .iter()
            .enumerate()
            .map(|(i, &resolved)| {
                resolved.then(|| {
                    MediaItem::loaded(&MediaRef::new(format!("{i}.jpg")), i, 300, 200)
                })
            })
            .collect();
        Arc::new(MediaSlots::from_items(items, 1))
    }

    fn instant_config() -> GalleryConfig {
        GalleryConfig {
            transition_ms: 0,
            ..GalleryConfig::default()
        }
    }

    #[test]
    fn test_wraparound_visits_each_resolved_once() {
        let mask = [true, false, true, true, false, true];
        let resolved = mask.iter().filter(|r| **r).count();
        let mut nav = GalleryNavigator::new(slots(&mask), instant_config());
        let now = Instant::now();
        assert!(nav.open(2, now));

        let mut seen = Vec::new();
        for _ in 0..resolved {
            assert!(nav.next(now));
            seen.push(nav.current_index().unwrap());
        }
        assert_eq!(seen, vec![3, 5, 0, 2]);
        assert_eq!(nav.current_index(), Some(2));
    }

    #[test]
    fn test_prev_wraps_backward() {
        let mut nav = GalleryNavigator::new(slots(&[true, false, true]), instant_config());
        let now = Instant::now();
        nav.open(0, now);
        assert!(nav.prev(now));
        assert_eq!(nav.current_index(), Some(2));
        assert!(nav.prev(now));
        assert_eq!(nav.current_index(), Some(0));
    }

    #[test]
    fn test_single_resolved_item_is_noop() {
        let mut nav = GalleryNavigator::new(slots(&[false, true, false]), instant_config());
        let now = Instant::now();
        nav.open(1, now);
        assert!(!nav.next(now));
        assert!(!nav.prev(now));
        assert_eq!(nav.current_index(), Some(1));
    }

    #[test]
    fn test_open_unresolved_rejected() {
        let mut nav = GalleryNavigator::new(slots(&[true, false]), instant_config());
        assert!(!nav.open(1, Instant::now()));
        assert!(!nav.open(9, Instant::now()));
        assert_eq!(nav.state(), NavigatorState::Closed);
    }

    #[test]
    fn test_navigation_requires_open() {
        let mut nav = GalleryNavigator::new(slots(&[true, true]), instant_config());
        let now = Instant::now();
        assert!(!nav.next(now));
        assert!(!nav.jump_to(1, now));
        assert!(!nav.handle_key(Key::ArrowRight, now));
    }

    #[test]
    fn test_transition_window_drops_requests() {
        let mut nav = GalleryNavigator::new(slots(&[true, true, true]), GalleryConfig::default());
        let t0 = Instant::now();
        nav.open(0, t0);
        assert!(nav.next(t0));
        assert!(nav.is_transitioning(t0));
        assert!(!nav.next(t0 + Duration::from_millis(100)));
        assert_eq!(nav.current_index(), Some(1));

        assert!(nav.next(t0 + Duration::from_millis(250)));
        assert_eq!(nav.current_index(), Some(2));

        nav.finish_transition();
        assert!(nav.prev(t0 + Duration::from_millis(251)));
    }

    #[test]
    fn test_jump_to_same_index_modulo_is_noop() {
        let mut nav = GalleryNavigator::new(slots(&[true, true, true]), instant_config());
        let now = Instant::now();
        nav.open(1, now);
        assert!(!nav.jump_to(4, now));
        assert!(nav.jump_to(5, now));
        assert_eq!(nav.current_index(), Some(2));
    }

    #[test]
    fn test_keyboard_bindings() {
        let mut nav = GalleryNavigator::new(slots(&[true, true, true]), instant_config());
        let now = Instant::now();
        nav.open(0, now);
        assert!(nav.handle_key(Key::ArrowRight, now));
        assert_eq!(nav.current_index(), Some(1));
        assert!(nav.handle_key(Key::ArrowLeft, now));
        assert_eq!(nav.current_index(), Some(0));
        assert!(!nav.handle_key(Key::Other, now));
        assert!(nav.handle_key(Key::Escape, now));
        assert!(!nav.is_open());
    }

    #[test]
    fn test_open_close_cycles_do_not_accumulate_entries() {
        let mut nav = GalleryNavigator::with_history(
            slots(&[true, true, true]),
            instant_config(),
            MemoryHistory::new(),
        );
        let now = Instant::now();
        for cycle in 1..=2 {
            assert!(nav.open(2, now));
            assert_eq!(nav.history().overlay_entries(), 1);
            nav.close();
            assert_eq!(nav.history().pushes(), cycle);
            assert_eq!(nav.history().reconciles(), cycle);
            assert_eq!(nav.history().overlay_entries(), 0);
        }
    }

    #[test]
    fn test_fullscreen_cycles_do_not_accumulate_entries() {
        let mut nav = GalleryNavigator::with_history(
            slots(&[true, true, true]),
            instant_config(),
            MemoryHistory::new(),
        );
        let t0 = Instant::now();
        for cycle in 1..=3u64 {
            let now = t0 + Duration::from_secs(cycle * 10);
            assert!(nav.open(2, now));
            assert!(nav.open_fullscreen(now + Duration::from_secs(1)));
            assert_eq!(nav.history().overlay_entries(), 2);

            assert!(nav.handle_key(Key::Escape, now));
            assert_eq!(nav.history().overlay_entries(), 1);
            assert!(nav.handle_key(Key::Escape, now));
            assert!(!nav.is_open());
            assert_eq!(nav.history().overlay_entries(), 0);
        }
        assert_eq!(nav.history().pushes(), 6);
        assert_eq!(nav.history().reconciles(), 6);
    }

    #[test]
    fn test_close_from_fullscreen_reconciles_both_entries() {
        let mut nav = GalleryNavigator::with_history(
            slots(&[true, true]),
            instant_config(),
            MemoryHistory::new(),
        );
        let t0 = Instant::now();
        for _ in 0..2 {
            nav.open(0, t0);
            assert!(nav.open_fullscreen(t0 + Duration::from_secs(1)));
            nav.close();
            assert!(!nav.is_open());
            assert_eq!(nav.history().overlay_entries(), 0);
            assert_eq!(nav.on_back(), BackOutcome::Ignored);
        }

        nav.open(1, t0);
        nav.open_fullscreen(t0 + Duration::from_secs(1));
        nav.set_slots(slots(&[true]));
        assert!(!nav.is_open());
        assert_eq!(nav.history().overlay_entries(), 0);
    }

    #[test]
    fn test_back_closes_fullscreen_first() {
        let mut nav = GalleryNavigator::with_history(
            slots(&[true, true]),
            instant_config(),
            MemoryHistory::new(),
        );
        let t0 = Instant::now();
        nav.open(1, t0);
        assert!(nav.open_fullscreen(t0 + Duration::from_millis(400)));

        nav.history_mut().back();
        assert_eq!(nav.on_back(), BackOutcome::ClosedFullscreen);
        assert_eq!(
            nav.state(),
            NavigatorState::Open {
                index: 1,
                fullscreen: None
            }
        );

        nav.history_mut().back();
        assert_eq!(nav.on_back(), BackOutcome::ClosedGallery);
        assert!(!nav.is_open());
        assert_eq!(nav.history().reconciles(), 0);
    }

    #[test]
    fn test_back_without_pushed_entry_ignored() {
        let mut nav = GalleryNavigator::new(slots(&[true]), instant_config());
        assert_eq!(nav.on_back(), BackOutcome::Ignored);

        nav.open(0, Instant::now());
        nav.close();
        assert_eq!(nav.on_back(), BackOutcome::Ignored);
    }

    #[test]
    fn test_fullscreen_debounce_after_open() {
        let mut nav = GalleryNavigator::new(slots(&[true, true]), instant_config());
        let t0 = Instant::now();
        nav.open(0, t0);
        assert!(!nav.tap(t0 + Duration::from_millis(50)));
        assert!(!nav.is_fullscreen());
        assert!(nav.tap(t0 + Duration::from_millis(300)));
        assert!(nav.is_fullscreen());
    }

    #[test]
    fn test_fullscreen_tap_toggles_fit_and_escape_returns_to_open() {
        let mut nav = GalleryNavigator::with_history(
            slots(&[true, true]),
            instant_config(),
            MemoryHistory::new(),
        );
        let t0 = Instant::now();
        let later = t0 + Duration::from_secs(1);
        nav.open(0, t0);
        nav.open_fullscreen(later);

        assert!(nav.tap(later));
        assert_eq!(
            nav.state(),
            NavigatorState::Open {
                index: 0,
                fullscreen: Some(FullscreenView { fit_width: true })
            }
        );

        // Swipes inside fullscreen forward to the same cursor.
        nav.touch_start(300.0, 100.0);
        nav.touch_move(150.0, 100.0);
        assert_eq!(nav.touch_end(later), Some(Gesture::Swipe(NavAction::Next)));
        assert_eq!(nav.current_index(), Some(1));
        assert!(nav.is_fullscreen());

        assert!(nav.handle_key(Key::Escape, later));
        assert!(nav.is_open());
        assert!(!nav.is_fullscreen());
        assert_eq!(nav.current_index(), Some(1));
        assert_eq!(nav.history().overlay_entries(), 1);
    }

    #[test]
    fn test_swipe_suppresses_tap() {
        let mut nav = GalleryNavigator::new(slots(&[true, true]), instant_config());
        let t0 = Instant::now();
        let later = t0 + Duration::from_secs(1);
        nav.open(0, t0);

        nav.touch_start(100.0, 100.0);
        nav.touch_move(100.0, 200.0);
        assert_eq!(nav.touch_end(later), Some(Gesture::Ignored));
        assert!(!nav.is_fullscreen());

        nav.touch_start(100.0, 100.0);
        assert_eq!(nav.touch_end(later), Some(Gesture::Tap));
        assert!(nav.is_fullscreen());
    }

    #[test]
    fn test_preload_targets() {
        let mut nav = GalleryNavigator::new(slots(&[true, false, true, true]), instant_config());
        assert!(nav.preload_targets().is_empty());
        nav.open(0, Instant::now());
        let locators: Vec<String> = nav
            .preload_targets()
            .iter()
            .filter_map(|d| d.locator().map(str::to_string))
            .collect();
        assert_eq!(locators, vec!["0.jpg", "2.jpg", "3.jpg"]);
    }

    #[test]
    fn test_set_slots_closes() {
        let mut nav = GalleryNavigator::new(slots(&[true, true]), instant_config());
        nav.open(1, Instant::now());
        nav.set_slots(slots(&[true]));
        assert!(!nav.is_open());
        assert_eq!(nav.slots().len(), 1);
    }
}
