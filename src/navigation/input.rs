// Input bindings for the gallery overlay
// Maps host keyboard and touch streams onto navigator actions
//
// Keybindings (while open):
// - Escape: Close the top-most overlay
// - ArrowRight: Next item
// - ArrowLeft: Previous item
//
// Touch:
// - Horizontal drag past the threshold: leftward = next, rightward = prev
// - Short tap: toggle (enter fullscreen / toggle fit inside fullscreen)

/// Keys the gallery reacts to. Hosts map their native key events onto these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Escape,
    ArrowLeft,
    ArrowRight,
    Other,
}

impl Key {
    /// Parses DOM-style key names (`KeyboardEvent.key`).
    pub fn from_name(name: &str) -> Self {
        match name {
            "Escape" | "Esc" => Self::Escape,
            "ArrowLeft" | "Left" => Self::ArrowLeft,
            "ArrowRight" | "Right" => Self::ArrowRight,
            _ => Self::Other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavAction {
    Next,
    Prev,
    Close,
}

pub fn action_for_key(key: Key) -> Option<NavAction> {
    match key {
        Key::Escape => Some(NavAction::Close),
        Key::ArrowRight => Some(NavAction::Next),
        Key::ArrowLeft => Some(NavAction::Prev),
        Key::Other => None,
    }
}

/// Outcome of a finished touch interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gesture {
    /// Horizontal swipe mapped to `Next` or `Prev`.
    Swipe(NavAction),
    Tap,
    /// The pointer moved too far to count as a tap but did not form a swipe.
    Ignored,
}

/// Tracks a single touch from start to end.
#[derive(Debug, Clone)]
pub struct SwipeTracker {
    threshold: f64,
    start: Option<(f64, f64)>,
    last: (f64, f64),
    crossed: bool,
}

impl SwipeTracker {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            start: None,
            last: (0.0, 0.0),
            crossed: false,
        }
    }

    pub fn begin(&mut self, x: f64, y: f64) {
        self.start = Some((x, y));
        self.last = (x, y);
        self.crossed = false;
    }

    pub fn update(&mut self, x: f64, y: f64) {
        let Some((x0, y0)) = self.start else {
            return;
        };
        self.last = (x, y);
        if (x - x0).abs() > self.threshold || (y - y0).abs() > self.threshold {
            // Once a drag crosses the threshold, the interaction is never a tap.
            self.crossed = true;
        }
    }

    /// Ends the interaction. `None` if no touch was in progress.
    pub fn end(&mut self) -> Option<Gesture> {
        let (x0, y0) = self.start.take()?;
        let dx = self.last.0 - x0;
        let dy = self.last.1 - y0;

        let gesture = if dx.abs() > self.threshold && dx.abs() > dy.abs() {
            if dx > 0.0 {
                Gesture::Swipe(NavAction::Prev)
            } else {
                Gesture::Swipe(NavAction::Next)
            }
        } else if self.crossed {
            Gesture::Ignored
        } else {
            Gesture::Tap
        };
        self.crossed = false;
        Some(gesture)
    }

    pub fn cancel(&mut self) {
        self.start = None;
        self.crossed = false;
    }

    pub fn is_tracking(&self) -> bool {
        self.start.is_some()
    }
}
